use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

/// Where installed packages and their receipts live under one prefix.
///
/// ```text
/// <prefix>/pkgs/<name>/<version>/definition.toml
/// <prefix>/var/receipts/<name>.json
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PrefixLayout {
    prefix: PathBuf,
}

impl PrefixLayout {
    pub fn new(prefix: impl Into<PathBuf>) -> Self {
        Self {
            prefix: prefix.into(),
        }
    }

    pub fn prefix(&self) -> &Path {
        &self.prefix
    }

    pub fn packages_dir(&self) -> PathBuf {
        self.prefix.join("pkgs")
    }

    pub fn package_versions_dir(&self, name: &str) -> PathBuf {
        self.packages_dir().join(name)
    }

    pub fn package_dir(&self, name: &str, version: &str) -> PathBuf {
        self.package_versions_dir(name).join(version)
    }

    pub fn installed_definition_path(&self, name: &str, version: &str) -> PathBuf {
        self.package_dir(name, version).join("definition.toml")
    }

    pub fn receipts_dir(&self) -> PathBuf {
        self.prefix.join("var").join("receipts")
    }

    pub fn receipt_path(&self, name: &str) -> PathBuf {
        self.receipts_dir().join(format!("{name}.json"))
    }

    pub fn create_dirs(&self) -> Result<()> {
        for dir in [self.packages_dir(), self.receipts_dir()] {
            fs::create_dir_all(&dir)
                .with_context(|| format!("failed to create {}", dir.display()))?;
        }
        Ok(())
    }
}

/// `$HOME/.crosspack`, or `%USERPROFILE%\.crosspack` when `HOME` is unset.
pub fn default_user_prefix() -> Result<PathBuf> {
    let home = std::env::var_os("HOME")
        .or_else(|| std::env::var_os("USERPROFILE"))
        .context("neither HOME nor USERPROFILE is set; pass --prefix")?;
    Ok(PathBuf::from(home).join(".crosspack"))
}
