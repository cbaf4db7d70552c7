use std::collections::BTreeMap;
use std::ffi::OsString;
use std::path::{Path, PathBuf};

use crosspack_core::env_vars::{
    BIN_FILE_ENV, DEVELOPER_ENV, INTEGRATION_TEST_ENV, PREFIX_ENV, REGISTRY_ROOT_ENV,
    TEST_TMPDIR_ENV,
};

/// Environment handed to one child process, on top of the spawn context.
pub type EnvironmentMap = BTreeMap<String, String>;

pub const LLVM_PROFILE_FILE_ENV: &str = "LLVM_PROFILE_FILE";

/// Caller-supplied environment overrides for a single invocation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EnvOverrides {
    vars: BTreeMap<String, String>,
}

impl EnvOverrides {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.insert(name, value);
        self
    }

    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.vars.insert(name.into(), value.into());
    }

    pub fn is_empty(&self) -> bool {
        self.vars.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.vars
            .iter()
            .map(|(name, value)| (name.as_str(), value.as_str()))
    }
}

impl<K, V> FromIterator<(K, V)> for EnvOverrides
where
    K: Into<String>,
    V: Into<String>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut overrides = Self::new();
        for (name, value) in iter {
            overrides.insert(name, value);
        }
        overrides
    }
}

/// Entries the harness always injects, winning over any override.
///
/// The prefix and registry roots are the exception: they default to
/// `<tmp_root>/prefix` and `<tmp_root>/registry` and only an override can
/// move them. A root exported by the parent shell never reaches the child.
#[derive(Debug, Clone, Copy)]
pub struct RequiredEnv<'a> {
    pub bin_file: &'a Path,
    pub command_id: &'a str,
    pub tmp_root: &'a Path,
    /// Developer flag captured from the parent environment.
    pub developer: Option<&'a str>,
    pub coverage_profile: Option<&'a Path>,
}

pub fn build_environment(overrides: &EnvOverrides, required: &RequiredEnv<'_>) -> EnvironmentMap {
    let mut env: EnvironmentMap = overrides
        .iter()
        .map(|(name, value)| (name.to_string(), value.to_string()))
        .collect();

    env.insert(BIN_FILE_ENV.to_string(), path_value(required.bin_file));
    env.insert(
        INTEGRATION_TEST_ENV.to_string(),
        required.command_id.to_string(),
    );
    env.insert(TEST_TMPDIR_ENV.to_string(), path_value(required.tmp_root));
    env.entry(PREFIX_ENV.to_string())
        .or_insert_with(|| path_value(&required.tmp_root.join("prefix")));
    env.entry(REGISTRY_ROOT_ENV.to_string())
        .or_insert_with(|| path_value(&required.tmp_root.join("registry")));
    match required.developer {
        Some(developer) => {
            env.insert(DEVELOPER_ENV.to_string(), developer.to_string());
        }
        None => {
            env.remove(DEVELOPER_ENV);
        }
    }
    if let Some(profile) = required.coverage_profile {
        env.insert(LLVM_PROFILE_FILE_ENV.to_string(), path_value(profile));
    }

    env
}

/// Profile path for one invocation; `%p` keeps forked children apart.
pub fn coverage_profile_path(coverage_dir: &Path, command_id: &str) -> PathBuf {
    let stem = command_id
        .chars()
        .map(|ch| {
            if ch.is_ascii_alphanumeric() || ch == '-' || ch == '.' {
                ch
            } else {
                '_'
            }
        })
        .collect::<String>();
    coverage_dir.join(format!("{stem}-%p.profraw"))
}

fn path_value(path: &Path) -> String {
    path.to_string_lossy().into_owned()
}

/// Variables an outer test-bundling layer injects into the test process.
///
/// They are suspended for each spawn so the child sees the original parent
/// environment plus its [`EnvironmentMap`]. The test process environment is
/// never mutated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnvSandbox {
    prefixes: Vec<String>,
    names: Vec<String>,
}

impl EnvSandbox {
    /// Nothing is suspended.
    pub fn none() -> Self {
        Self {
            prefixes: Vec::new(),
            names: Vec::new(),
        }
    }

    /// Variables `cargo test` sets for the running test binary.
    pub fn cargo_test() -> Self {
        Self {
            prefixes: [
                "CARGO_PKG_",
                "CARGO_BIN_EXE_",
                "CARGO_MANIFEST_",
                "CARGO_CRATE_",
                "CARGO_TARGET_TMPDIR",
                "CARGO_PRIMARY_PACKAGE",
                "__CARGO_",
            ]
            .into_iter()
            .map(ToOwned::to_owned)
            .collect(),
            names: ["CARGO", "OUT_DIR", "RUST_TEST_THREADS"]
                .into_iter()
                .map(ToOwned::to_owned)
                .collect(),
        }
    }

    pub fn with_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.prefixes.push(prefix.into());
        self
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.names.push(name.into());
        self
    }

    pub fn is_suspended(&self, name: &str) -> bool {
        self.names.iter().any(|candidate| candidate == name)
            || self
                .prefixes
                .iter()
                .any(|prefix| name.starts_with(prefix.as_str()))
    }

    /// This sandbox plus every required key that must be absent in the child.
    ///
    /// A map can only add variables on top of the spawn context, so an unset
    /// developer flag has to be suspended to hide the parent's value.
    pub fn for_required(&self, required: &RequiredEnv<'_>) -> Self {
        let sandbox = self.clone();
        match required.developer {
            Some(_) => sandbox,
            None => sandbox.with_name(DEVELOPER_ENV),
        }
    }

    /// Names from `vars` that must be removed from a child's spawn context.
    pub fn suspended_names<I>(&self, vars: I) -> Vec<OsString>
    where
        I: IntoIterator<Item = (OsString, OsString)>,
    {
        vars.into_iter()
            .map(|(name, _)| name)
            .filter(|name| name.to_str().is_some_and(|name| self.is_suspended(name)))
            .collect()
    }
}

impl Default for EnvSandbox {
    fn default() -> Self {
        Self::cargo_test()
    }
}
