use std::collections::{BTreeMap, HashSet};
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

pub const RENAMES_FILE_NAME: &str = "renames.json";

pub fn read_renames(registry_root: &Path) -> Result<BTreeMap<String, String>> {
    let path = registry_root.join(RENAMES_FILE_NAME);
    let raw = match fs::read_to_string(&path) {
        Ok(raw) => raw,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(BTreeMap::new()),
        Err(err) => {
            return Err(err)
                .with_context(|| format!("failed reading rename mapping: {}", path.display()))
        }
    };

    serde_json::from_str(&raw)
        .with_context(|| format!("failed parsing rename mapping: {}", path.display()))
}

pub fn write_renames(registry_root: &Path, renames: &BTreeMap<String, String>) -> Result<PathBuf> {
    let path = registry_root.join(RENAMES_FILE_NAME);
    let payload = serde_json::to_string(renames).context("failed to serialize rename mapping")?;
    fs::write(&path, payload)
        .with_context(|| format!("failed writing rename mapping: {}", path.display()))?;
    Ok(path)
}

/// Follows rename entries until a name with no further rename is reached.
pub fn resolve_renamed_name(renames: &BTreeMap<String, String>, name: &str) -> Result<String> {
    let mut current = name.to_string();
    let mut seen = HashSet::new();
    while let Some(next) = renames.get(&current) {
        if !seen.insert(current.clone()) {
            anyhow::bail!("rename mapping contains a cycle through '{current}'");
        }
        current = next.clone();
    }
    Ok(current)
}
