use std::collections::{BTreeMap, HashSet};

use anyhow::{anyhow, Context};
use semver::{Version, VersionReq};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PackageManifest {
    pub name: String,
    pub version: Version,
    pub description: Option<String>,
    pub homepage: Option<String>,
    pub url: Option<String>,
    pub sha256: Option<String>,
    #[serde(default)]
    pub options: Vec<PackageOption>,
    #[serde(default)]
    pub dependencies: BTreeMap<String, VersionReq>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PackageOption {
    pub name: String,
    pub description: String,
}

impl PackageManifest {
    pub fn from_toml_str(input: &str) -> anyhow::Result<Self> {
        let manifest: Self =
            toml::from_str(input).context("failed to parse crosspack package definition")?;
        validate_package_name(&manifest.name)?;
        if manifest.dependencies.contains_key(&manifest.name) {
            return Err(anyhow!("package '{}' depends on itself", manifest.name));
        }
        let mut seen_options = HashSet::new();
        for option in &manifest.options {
            if !option.name.starts_with("with-") && !option.name.starts_with("without-") {
                return Err(anyhow!(
                    "option '{}' for package '{}' must start with 'with-' or 'without-'",
                    option.name,
                    manifest.name
                ));
            }
            if !seen_options.insert(option.name.as_str()) {
                return Err(anyhow!(
                    "duplicate option '{}' for package '{}'",
                    option.name,
                    manifest.name
                ));
            }
        }
        Ok(manifest)
    }

    pub fn to_toml_string(&self) -> anyhow::Result<String> {
        toml::to_string(self).with_context(|| {
            format!("failed to serialize package definition '{}'", self.name)
        })
    }
}

fn validate_package_name(name: &str) -> anyhow::Result<()> {
    let mut chars = name.chars();
    let Some(first) = chars.next() else {
        return Err(anyhow!("package name must not be empty"));
    };
    if !(first.is_ascii_lowercase() || first.is_ascii_digit()) {
        return Err(anyhow!(
            "package name must start with a lowercase letter or digit: {name}"
        ));
    }
    if chars.any(|ch| {
        !(ch.is_ascii_lowercase() || ch.is_ascii_digit() || ch == '-' || ch == '_' || ch == '.' || ch == '@')
    }) {
        return Err(anyhow!("package name contains invalid character(s): {name}"));
    }

    Ok(())
}
