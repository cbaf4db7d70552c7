//! Harness for running the `crosspack` binary as a subprocess from tests.
//!
//! A [`Scenario`] owns an isolated temp root and a placeholder bin file for
//! one test. Its [`Harness`] tags every invocation with a unique identifier,
//! builds the child environment and returns an [`InvocationResult`] that the
//! matchers in [`matcher`] assert on.

mod capture;
mod command_id;
mod config;
mod environment;
mod fixtures;
mod git;
mod harness;
mod invoker;
pub mod matcher;
mod scenario;

pub use capture::{capture_active, capture_output, CapturedOutput};
pub use command_id::{command_id, CallCounter, CallSite, TempRoot, TMPDIR_PLACEHOLDER};
pub use config::HarnessConfig;
pub use environment::{
    build_environment, coverage_profile_path, EnvOverrides, EnvSandbox, EnvironmentMap,
    RequiredEnv, LLVM_PROFILE_FILE_ENV,
};
pub use fixtures::{Fixtures, TapFixture, TESTBALL_SHA256};
pub use git::git_available;
pub use harness::Harness;
pub use invoker::{invoke, InvocationRequest, InvocationResult, Outcome, Runner};
pub use matcher::{
    be_a_failure, be_a_success, expect_block, expect_output, Check, Deferred, SuccessMatcher,
    Verdict,
};
pub use scenario::{run_scenario, Scenario};

#[cfg(test)]
mod tests;
