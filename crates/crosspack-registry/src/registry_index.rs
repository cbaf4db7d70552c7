use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use crosspack_core::PackageManifest;

/// Definitions laid out as `<root>/index/<name>/<version>.toml`.
///
/// The same layout backs the core registry and every installed tap.
#[derive(Debug, Clone)]
pub struct RegistryIndex {
    root: PathBuf,
}

impl RegistryIndex {
    pub fn open(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn index_dir(&self) -> PathBuf {
        self.root.join("index")
    }

    pub fn package_dir(&self, package: &str) -> PathBuf {
        self.index_dir().join(package)
    }

    pub fn definition_path(&self, package: &str, version: &str) -> PathBuf {
        self.package_dir(package).join(format!("{version}.toml"))
    }

    /// Names containing `needle` that have at least one definition, sorted.
    pub fn search_names(&self, needle: &str) -> Result<Vec<String>> {
        let mut names = Vec::new();
        for path in list_dir(&self.index_dir())? {
            let Some(name) = path.file_name().and_then(|name| name.to_str()) else {
                continue;
            };
            if path.is_dir() && name.contains(needle) && self.latest(name)?.is_some() {
                names.push(name.to_string());
            }
        }
        names.sort();
        Ok(names)
    }

    /// Every definition of `package`, newest version first.
    pub fn package_versions(&self, package: &str) -> Result<Vec<PackageManifest>> {
        let mut manifests = Vec::new();
        for path in list_dir(&self.package_dir(package))? {
            if !path.is_file() || path.extension().and_then(|ext| ext.to_str()) != Some("toml") {
                continue;
            }
            let manifest = read_definition(&path)?;
            if manifest.name != package {
                anyhow::bail!(
                    "definition {} is named '{}', expected '{package}'",
                    path.display(),
                    manifest.name
                );
            }
            manifests.push(manifest);
        }
        manifests.sort_by(|left, right| right.version.cmp(&left.version));
        Ok(manifests)
    }

    pub fn latest(&self, package: &str) -> Result<Option<PackageManifest>> {
        Ok(self.package_versions(package)?.into_iter().next())
    }
}

fn read_definition(path: &Path) -> Result<PackageManifest> {
    let raw = fs::read_to_string(path)
        .with_context(|| format!("failed to read package definition: {}", path.display()))?;
    PackageManifest::from_toml_str(&raw)
        .with_context(|| format!("invalid package definition: {}", path.display()))
}

/// Entries of `dir`; a missing directory is empty.
fn list_dir(dir: &Path) -> Result<Vec<PathBuf>> {
    let entries = match fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
        Err(err) => {
            return Err(err).with_context(|| format!("failed to read {}", dir.display()));
        }
    };
    entries
        .map(|entry| Ok(entry?.path()))
        .collect::<Result<Vec<_>>>()
        .with_context(|| format!("failed to list {}", dir.display()))
}
