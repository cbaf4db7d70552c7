use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::io;

use anyhow::{Context, Result};

use crate::receipts::read_install_receipts;
use crate::{InstallReason, InstallReceipt, PrefixLayout};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UninstallStatus {
    NotInstalled,
    Uninstalled,
    /// Still required by at least one requested package.
    BlockedByDependents,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UninstallResult {
    pub name: String,
    pub version: Option<String>,
    pub status: UninstallStatus,
    /// Dependencies removed because nothing else needs them any more.
    pub pruned_dependencies: Vec<String>,
    pub blocked_by_roots: Vec<String>,
}

impl UninstallResult {
    fn new(name: &str, version: Option<String>, status: UninstallStatus) -> Self {
        Self {
            name: name.to_string(),
            version,
            status,
            pruned_dependencies: Vec::new(),
            blocked_by_roots: Vec::new(),
        }
    }
}

/// Removes `name` and every dependency left without a requesting package.
pub fn uninstall_package(layout: &PrefixLayout, name: &str) -> Result<UninstallResult> {
    let receipts = read_install_receipts(layout)?
        .into_iter()
        .map(|receipt| (receipt.name.clone(), receipt))
        .collect::<BTreeMap<_, _>>();
    let Some(target) = receipts.get(name) else {
        return Ok(UninstallResult::new(name, None, UninstallStatus::NotInstalled));
    };

    let other_roots = receipts
        .values()
        .filter(|receipt| receipt.name != name && receipt.install_reason == InstallReason::Root)
        .map(|receipt| receipt.name.as_str())
        .collect::<Vec<_>>();

    let blocked_by_roots = other_roots
        .iter()
        .filter(|root| closure(&receipts, [**root]).contains(name))
        .map(|root| root.to_string())
        .collect::<Vec<_>>();
    if !blocked_by_roots.is_empty() {
        return Ok(UninstallResult {
            blocked_by_roots,
            ..UninstallResult::new(
                name,
                Some(target.version.clone()),
                UninstallStatus::BlockedByDependents,
            )
        });
    }

    let still_needed = closure(&receipts, other_roots.iter().copied());
    let pruned_dependencies = closure(&receipts, [name])
        .into_iter()
        .filter(|entry| entry != name && !still_needed.contains(entry))
        .collect::<Vec<_>>();

    for removed in std::iter::once(name).chain(pruned_dependencies.iter().map(String::as_str)) {
        if let Some(receipt) = receipts.get(removed) {
            remove_installed(layout, receipt)?;
        }
    }

    Ok(UninstallResult {
        pruned_dependencies,
        ..UninstallResult::new(name, Some(target.version.clone()), UninstallStatus::Uninstalled)
    })
}

/// Installed packages reachable from `starts` through receipt dependencies.
fn closure<'a>(
    receipts: &BTreeMap<String, InstallReceipt>,
    starts: impl IntoIterator<Item = &'a str>,
) -> BTreeSet<String> {
    let mut seen = BTreeSet::new();
    let mut pending = starts.into_iter().map(str::to_string).collect::<Vec<_>>();
    while let Some(next) = pending.pop() {
        let Some(receipt) = receipts.get(&next) else {
            continue;
        };
        if seen.insert(next) {
            pending.extend(
                receipt
                    .dependencies
                    .iter()
                    .map(|dependency| dependency.name.clone()),
            );
        }
    }
    seen
}

fn remove_installed(layout: &PrefixLayout, receipt: &InstallReceipt) -> Result<()> {
    let package_dir = layout.package_dir(&receipt.name, &receipt.version);
    match fs::remove_dir_all(&package_dir) {
        Ok(()) => {}
        Err(err) if err.kind() == io::ErrorKind::NotFound => {}
        Err(err) => {
            return Err(err)
                .with_context(|| format!("failed to remove {}", package_dir.display()))
        }
    }

    let versions_dir = layout.package_versions_dir(&receipt.name);
    if fs::read_dir(&versions_dir).is_ok_and(|mut entries| entries.next().is_none()) {
        fs::remove_dir(&versions_dir)
            .with_context(|| format!("failed to remove {}", versions_dir.display()))?;
    }

    let receipt_path = layout.receipt_path(&receipt.name);
    fs::remove_file(&receipt_path)
        .with_context(|| format!("failed to remove receipt: {}", receipt_path.display()))
}
