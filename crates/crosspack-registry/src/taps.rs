use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

use crate::RegistryIndex;

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct TapName {
    pub user: String,
    pub repo: String,
}

impl TapName {
    pub fn parse(value: &str) -> Result<Self> {
        let Some((user, repo)) = value.split_once('/') else {
            anyhow::bail!("invalid tap name: '{value}' (expected user/repo)");
        };
        validate_tap_segment(value, user)?;
        validate_tap_segment(value, repo)?;
        Ok(Self {
            user: user.to_string(),
            repo: repo.to_string(),
        })
    }
}

impl fmt::Display for TapName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.user, self.repo)
    }
}

fn validate_tap_segment(full: &str, segment: &str) -> Result<()> {
    let mut chars = segment.chars();
    let Some(first) = chars.next() else {
        anyhow::bail!("invalid tap name: '{full}'");
    };

    let first_is_valid = first.is_ascii_lowercase() || first.is_ascii_digit();
    let rest_is_valid =
        chars.all(|ch| ch.is_ascii_lowercase() || ch.is_ascii_digit() || ch == '-' || ch == '_');
    if !first_is_valid || !rest_is_valid {
        anyhow::bail!("invalid tap name: '{full}'");
    }

    Ok(())
}

/// A package request, optionally qualified with the tap it lives in.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PackageRef {
    Core(String),
    Tapped { tap: TapName, name: String },
}

impl PackageRef {
    pub fn parse(value: &str) -> Result<Self> {
        let segments = value.split('/').collect::<Vec<_>>();
        match segments.as_slice() {
            [name] => Ok(Self::Core((*name).to_string())),
            [user, repo, name] => Ok(Self::Tapped {
                tap: TapName::parse(&format!("{user}/{repo}"))?,
                name: (*name).to_string(),
            }),
            _ => anyhow::bail!("invalid package reference: '{value}'"),
        }
    }

    pub fn name(&self) -> &str {
        match self {
            Self::Core(name) => name,
            Self::Tapped { name, .. } => name,
        }
    }
}

#[derive(Debug, Clone)]
pub struct TapStore {
    root: PathBuf,
}

impl TapStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn tap_path(&self, tap: &TapName) -> PathBuf {
        self.root.join(&tap.user).join(&tap.repo)
    }

    pub fn is_installed(&self, tap: &TapName) -> bool {
        self.tap_path(tap).join("index").is_dir()
    }

    pub fn index(&self, tap: &TapName) -> RegistryIndex {
        RegistryIndex::open(self.tap_path(tap))
    }

    pub fn installed_taps(&self) -> Result<Vec<TapName>> {
        if !self.root.exists() {
            return Ok(Vec::new());
        }

        let mut taps = Vec::new();
        for user_entry in fs::read_dir(&self.root)
            .with_context(|| format!("failed to read taps directory: {}", self.root.display()))?
        {
            let user_entry = user_entry?;
            if !user_entry.file_type()?.is_dir() {
                continue;
            }
            for repo_entry in fs::read_dir(user_entry.path())? {
                let repo_entry = repo_entry?;
                if !repo_entry.file_type()?.is_dir() {
                    continue;
                }
                let candidate = format!(
                    "{}/{}",
                    user_entry.file_name().to_string_lossy(),
                    repo_entry.file_name().to_string_lossy()
                );
                let Ok(tap) = TapName::parse(&candidate) else {
                    continue;
                };
                if self.is_installed(&tap) {
                    taps.push(tap);
                }
            }
        }

        taps.sort();
        Ok(taps)
    }
}
