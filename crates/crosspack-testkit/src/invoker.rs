use std::borrow::Cow;
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::process::{Command, ExitStatus, Stdio};

use anyhow::{Context, Result};
use tracing::{debug, trace};

use crate::capture::echo_output;
use crate::environment::{EnvSandbox, EnvironmentMap};

/// How the executable under test is launched, constant for a run.
///
/// The child argv is `<program> <flags> [<coverage flags>] [<script>] <args>`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Runner {
    program: PathBuf,
    flags: Vec<OsString>,
    coverage_flags: Vec<OsString>,
    script: Option<PathBuf>,
}

impl Runner {
    /// Runs a compiled binary with no runner flags.
    pub fn direct(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
            flags: Vec::new(),
            coverage_flags: Vec::new(),
            script: None,
        }
    }

    /// Runs `script` through an interpreter or wrapper `program`.
    pub fn interpreted(program: impl Into<PathBuf>, script: impl Into<PathBuf>) -> Self {
        Self {
            script: Some(script.into()),
            ..Self::direct(program)
        }
    }

    pub fn with_flags<I, S>(mut self, flags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<OsString>,
    {
        self.flags.extend(flags.into_iter().map(Into::into));
        self
    }

    /// Flags appended after the regular flags only when coverage is enabled.
    pub fn with_coverage_flags<I, S>(mut self, flags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<OsString>,
    {
        self.coverage_flags
            .extend(flags.into_iter().map(Into::into));
        self
    }

    pub fn program(&self) -> &Path {
        &self.program
    }

    pub fn script(&self) -> Option<&Path> {
        self.script.as_deref()
    }

    /// Arguments following the program name.
    pub fn argv(&self, coverage: bool, args: &[String]) -> Vec<OsString> {
        let mut argv = self.flags.clone();
        if coverage {
            argv.extend(self.coverage_flags.iter().cloned());
        }
        if let Some(script) = &self.script {
            argv.push(script.clone().into_os_string());
        }
        argv.extend(args.iter().map(OsString::from));
        argv
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Success,
    /// `code` is `None` when the child was terminated by a signal.
    Failure { code: Option<i32> },
}

impl Outcome {
    pub fn is_success(self) -> bool {
        matches!(self, Self::Success)
    }

    pub fn code(self) -> Option<i32> {
        match self {
            Self::Success => Some(0),
            Self::Failure { code } => code,
        }
    }
}

impl From<ExitStatus> for Outcome {
    fn from(status: ExitStatus) -> Self {
        if status.success() {
            Self::Success
        } else {
            Self::Failure {
                code: status.code(),
            }
        }
    }
}

impl std::fmt::Display for Outcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Success => write!(f, "exited with code 0"),
            Self::Failure { code: Some(code) } => write!(f, "exited with code {code}"),
            Self::Failure { code: None } => write!(f, "was terminated by a signal"),
        }
    }
}

/// What one invocation produced. Immutable once built.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvocationResult {
    outcome: Outcome,
    stdout: Vec<u8>,
    stderr: Vec<u8>,
    command_id: String,
}

impl InvocationResult {
    pub fn new(
        outcome: Outcome,
        stdout: impl Into<Vec<u8>>,
        stderr: impl Into<Vec<u8>>,
        command_id: impl Into<String>,
    ) -> Self {
        Self {
            outcome,
            stdout: stdout.into(),
            stderr: stderr.into(),
            command_id: command_id.into(),
        }
    }

    pub fn outcome(&self) -> Outcome {
        self.outcome
    }

    pub fn success(&self) -> bool {
        self.outcome.is_success()
    }

    pub fn exit_code(&self) -> Option<i32> {
        self.outcome.code()
    }

    pub fn stdout(&self) -> &[u8] {
        &self.stdout
    }

    pub fn stderr(&self) -> &[u8] {
        &self.stderr
    }

    pub fn stdout_str(&self) -> Cow<'_, str> {
        String::from_utf8_lossy(&self.stdout)
    }

    pub fn stderr_str(&self) -> Cow<'_, str> {
        String::from_utf8_lossy(&self.stderr)
    }

    pub fn command_id(&self) -> &str {
        &self.command_id
    }
}

#[derive(Debug, Clone, Copy)]
pub struct InvocationRequest<'a> {
    pub runner: &'a Runner,
    pub coverage: bool,
    pub args: &'a [String],
    pub env: &'a EnvironmentMap,
    pub sandbox: &'a EnvSandbox,
    pub command_id: &'a str,
}

/// Spawns the child, blocks until it exits and echoes its captured output.
///
/// A non-zero exit is reported through the returned [`Outcome`]; only a
/// failure to launch the child is an error.
pub fn invoke(request: InvocationRequest<'_>) -> Result<InvocationResult> {
    let program = request.runner.program();
    let mut command = Command::new(program);
    command
        .args(request.runner.argv(request.coverage, request.args))
        .stdin(Stdio::null());

    for name in request.sandbox.suspended_names(std::env::vars_os()) {
        trace!(name = ?name, "suspending bundling variable for spawn");
        command.env_remove(name);
    }
    command.envs(request.env);

    let output = command.output().with_context(|| {
        format!(
            "failed to launch {} for invocation {}",
            program.display(),
            request.command_id
        )
    })?;

    echo_output(&output.stdout, &output.stderr);

    let outcome = Outcome::from(output.status);
    debug!(
        command_id = request.command_id,
        program = %program.display(),
        outcome = %outcome,
        "invocation finished"
    );

    Ok(InvocationResult::new(
        outcome,
        output.stdout,
        output.stderr,
        request.command_id,
    ))
}
