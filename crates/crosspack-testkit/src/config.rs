use std::path::{Path, PathBuf};

use crosspack_core::env_vars::{COVERAGE_DIR_ENV, DEVELOPER_ENV, TESTS_COVERAGE_ENV};

use crate::environment::EnvSandbox;
use crate::invoker::Runner;

/// Settings shared by every invocation in a run.
///
/// Parent-environment reads happen once, in [`HarnessConfig::new`]; the
/// builders below override them explicitly.
#[derive(Debug, Clone)]
pub struct HarnessConfig {
    runner: Runner,
    program_name: String,
    suite_root: String,
    developer: Option<String>,
    coverage_dir: Option<PathBuf>,
    fixture_dir: Option<PathBuf>,
    sandbox: EnvSandbox,
}

impl HarnessConfig {
    pub fn new(runner: Runner) -> Self {
        let developer = std::env::var(DEVELOPER_ENV).ok();
        let coverage_dir = std::env::var_os(TESTS_COVERAGE_ENV).map(|_| {
            std::env::var_os(COVERAGE_DIR_ENV)
                .map(PathBuf::from)
                .unwrap_or_else(|| std::env::temp_dir().join("crosspack-coverage"))
        });

        Self {
            runner,
            program_name: "crosspack".to_string(),
            suite_root: String::new(),
            developer,
            coverage_dir,
            fixture_dir: None,
            sandbox: EnvSandbox::default(),
        }
    }

    /// Program name rendered into invocation identifiers.
    pub fn with_program_name(mut self, program_name: impl Into<String>) -> Self {
        self.program_name = program_name.into();
        self
    }

    /// Path prefix trimmed from call sites so identifiers are repo-relative.
    pub fn with_suite_root(mut self, suite_root: impl Into<String>) -> Self {
        self.suite_root = suite_root.into();
        self
    }

    pub fn with_developer(mut self, developer: Option<String>) -> Self {
        self.developer = developer;
        self
    }

    pub fn with_coverage_dir(mut self, coverage_dir: Option<PathBuf>) -> Self {
        self.coverage_dir = coverage_dir;
        self
    }

    /// Suite directory holding `tarballs/`; without it `testball` definitions
    /// carry no source URL.
    pub fn with_fixture_dir(mut self, fixture_dir: Option<PathBuf>) -> Self {
        self.fixture_dir = fixture_dir;
        self
    }

    pub fn with_sandbox(mut self, sandbox: EnvSandbox) -> Self {
        self.sandbox = sandbox;
        self
    }

    pub fn runner(&self) -> &Runner {
        &self.runner
    }

    pub fn program_name(&self) -> &str {
        &self.program_name
    }

    pub fn suite_root(&self) -> &str {
        &self.suite_root
    }

    pub fn developer(&self) -> Option<&str> {
        self.developer.as_deref()
    }

    pub fn coverage_enabled(&self) -> bool {
        self.coverage_dir.is_some()
    }

    pub fn coverage_dir(&self) -> Option<&Path> {
        self.coverage_dir.as_deref()
    }

    pub fn fixture_dir(&self) -> Option<&Path> {
        self.fixture_dir.as_deref()
    }

    pub fn sandbox(&self) -> &EnvSandbox {
        &self.sandbox
    }
}
