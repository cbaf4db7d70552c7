use std::panic::Location;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};

use crate::command_id::{command_id, CallCounter, CallSite, TempRoot};
use crate::config::HarnessConfig;
use crate::environment::{build_environment, coverage_profile_path, EnvOverrides, RequiredEnv};
use crate::invoker::{invoke, InvocationRequest, InvocationResult};

/// Runs `crosspack` commands against one isolated temp root.
#[derive(Debug, Clone)]
pub struct Harness {
    config: Arc<HarnessConfig>,
    counter: Arc<CallCounter>,
    tmp_root: PathBuf,
    masked_root: TempRoot,
    bin_file: PathBuf,
}

impl Harness {
    pub fn new(
        config: Arc<HarnessConfig>,
        counter: Arc<CallCounter>,
        tmp_root: impl Into<PathBuf>,
        bin_file: impl Into<PathBuf>,
    ) -> Self {
        let tmp_root = tmp_root.into();
        Self {
            config,
            counter,
            masked_root: TempRoot::resolve(&tmp_root),
            tmp_root,
            bin_file: bin_file.into(),
        }
    }

    pub fn config(&self) -> &HarnessConfig {
        &self.config
    }

    pub fn counter(&self) -> &CallCounter {
        &self.counter
    }

    pub fn tmp_root(&self) -> &Path {
        &self.tmp_root
    }

    pub fn bin_file(&self) -> &Path {
        &self.bin_file
    }

    /// Runs `crosspack <args>` and returns its result; a non-zero exit is
    /// not an error.
    #[track_caller]
    pub fn crosspack<I, S>(&self, args: I) -> Result<InvocationResult>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.run_at(
            Location::caller(),
            collect_args(args),
            &EnvOverrides::default(),
        )
    }

    #[track_caller]
    pub fn crosspack_with_env<I, S>(
        &self,
        args: I,
        overrides: &EnvOverrides,
    ) -> Result<InvocationResult>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.run_at(Location::caller(), collect_args(args), overrides)
    }

    /// Allocates the next identifier for `args` as if invoked from the caller.
    #[cfg(test)]
    #[track_caller]
    pub(crate) fn next_command_id(&self, args: &[String]) -> String {
        self.command_id_at(Location::caller(), args)
    }

    pub(crate) fn run_at(
        &self,
        location: &Location<'_>,
        args: Vec<String>,
        overrides: &EnvOverrides,
    ) -> Result<InvocationResult> {
        let command_id = self.command_id_at(location, &args);
        let coverage_profile = self
            .config
            .coverage_dir()
            .map(|dir| coverage_profile_path(dir, &command_id));
        if let Some(dir) = self.config.coverage_dir() {
            std::fs::create_dir_all(dir)
                .with_context(|| format!("failed to create coverage dir: {}", dir.display()))?;
        }

        let required = RequiredEnv {
            bin_file: &self.bin_file,
            command_id: &command_id,
            tmp_root: &self.tmp_root,
            developer: self.config.developer(),
            coverage_profile: coverage_profile.as_deref(),
        };
        let env = build_environment(overrides, &required);

        let sandbox = self.config.sandbox().for_required(&required);

        invoke(InvocationRequest {
            runner: self.config.runner(),
            coverage: self.config.coverage_enabled(),
            args: &args,
            env: &env,
            sandbox: &sandbox,
            command_id: &command_id,
        })
    }

    fn command_id_at(&self, location: &Location<'_>, args: &[String]) -> String {
        command_id(
            CallSite::from(location),
            self.config.program_name(),
            args,
            &self.masked_root,
            self.config.suite_root(),
            self.counter.next(),
        )
    }
}

fn collect_args<I, S>(args: I) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    args.into_iter().map(Into::into).collect()
}
