use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::PrefixLayout;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InstallReason {
    /// Requested by name.
    Root,
    /// Pulled in by another package.
    Dependency,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InstalledDependency {
    pub name: String,
    pub version: String,
}

/// Record of one installed package, one JSON file per package.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InstallReceipt {
    pub name: String,
    pub version: String,
    pub install_reason: InstallReason,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub dependencies: Vec<InstalledDependency>,
    /// Tap the definition came from; `None` for the core registry.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    pub installed_at_unix: u64,
}

pub fn write_install_receipt(layout: &PrefixLayout, receipt: &InstallReceipt) -> Result<PathBuf> {
    let path = layout.receipt_path(&receipt.name);
    let payload = serde_json::to_string_pretty(receipt)
        .with_context(|| format!("failed to serialize receipt for '{}'", receipt.name))?;
    fs::write(&path, payload)
        .with_context(|| format!("failed to write install receipt: {}", path.display()))?;
    Ok(path)
}

/// All receipts under the prefix, sorted by package name.
pub fn read_install_receipts(layout: &PrefixLayout) -> Result<Vec<InstallReceipt>> {
    let dir = layout.receipts_dir();
    let entries = match fs::read_dir(&dir) {
        Ok(entries) => entries,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
        Err(err) => {
            return Err(err)
                .with_context(|| format!("failed to read receipts directory: {}", dir.display()))
        }
    };

    let mut receipts = Vec::new();
    for entry in entries {
        let path = entry?.path();
        if path.extension().and_then(|ext| ext.to_str()) != Some("json") {
            continue;
        }
        let raw = fs::read_to_string(&path)
            .with_context(|| format!("failed to read install receipt: {}", path.display()))?;
        receipts.push(parse_receipt(&raw).with_context(|| {
            format!("failed to parse install receipt: {}", path.display())
        })?);
    }

    receipts.sort_by(|left, right| left.name.cmp(&right.name));
    Ok(receipts)
}

pub(crate) fn parse_receipt(raw: &str) -> Result<InstallReceipt> {
    Ok(serde_json::from_str(raw)?)
}
