use std::fs;
use std::time::{SystemTime, UNIX_EPOCH};

use anyhow::{Context, Result};
use crosspack_core::PackageManifest;

use crate::receipts::read_install_receipts;
use crate::{
    write_install_receipt, InstallReason, InstallReceipt, InstalledDependency, PrefixLayout,
};

/// Materializes `manifest` under the prefix and records a receipt for it.
///
/// Every dependency must already be installed; the receipt pins the version
/// that satisfied it.
pub fn install_package(
    layout: &PrefixLayout,
    manifest: &PackageManifest,
    install_reason: InstallReason,
    source: Option<&str>,
    installed_at_unix: u64,
) -> Result<InstallReceipt> {
    layout.create_dirs()?;
    let existing = read_install_receipts(layout)?;

    let dependencies = manifest
        .dependencies
        .keys()
        .map(|dependency| {
            existing
                .iter()
                .find(|receipt| &receipt.name == dependency)
                .map(|receipt| InstalledDependency {
                    name: receipt.name.clone(),
                    version: receipt.version.clone(),
                })
                .with_context(|| {
                    format!(
                        "cannot install '{}': dependency '{dependency}' is not installed",
                        manifest.name
                    )
                })
        })
        .collect::<Result<Vec<_>>>()?;

    let version = manifest.version.to_string();
    let package_dir = layout.package_dir(&manifest.name, &version);
    fs::create_dir_all(&package_dir)
        .with_context(|| format!("failed to create package dir: {}", package_dir.display()))?;
    let definition_path = layout.installed_definition_path(&manifest.name, &version);
    fs::write(&definition_path, manifest.to_toml_string()?)
        .with_context(|| format!("failed to write {}", definition_path.display()))?;

    // Reinstalling a requested package as a dependency keeps it requested.
    let was_root = existing
        .iter()
        .any(|receipt| receipt.name == manifest.name && receipt.install_reason == InstallReason::Root);
    let receipt = InstallReceipt {
        name: manifest.name.clone(),
        version,
        install_reason: if was_root {
            InstallReason::Root
        } else {
            install_reason
        },
        dependencies,
        source: source.map(ToOwned::to_owned),
        url: manifest.url.clone(),
        installed_at_unix,
    };
    write_install_receipt(layout, &receipt)?;
    Ok(receipt)
}

pub fn installed_receipt(layout: &PrefixLayout, name: &str) -> Result<Option<InstallReceipt>> {
    Ok(read_install_receipts(layout)?
        .into_iter()
        .find(|receipt| receipt.name == name))
}

pub fn current_unix_timestamp() -> Result<u64> {
    Ok(SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .context("system clock is before unix epoch")?
        .as_secs())
}
