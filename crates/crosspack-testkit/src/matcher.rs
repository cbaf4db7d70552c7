//! Success and failure assertions over invocation results.
//!
//! A [`SuccessMatcher`] accepts either a finished [`InvocationResult`] or a
//! [`Deferred`] thunk that produces one. Thunks are run exactly once, when
//! the matcher is evaluated; evaluation consumes the thunk, so a second
//! evaluation does not compile.
//!
//! Block expectations compose in one direction only:
//!
//! ```ignore
//! expect_output(expect_block(|| harness.crosspack(["list"])).to(be_a_success()))
//!     .to_stdout(predicates::str::contains("foo 1.0.0"))
//!     .assert();
//! ```
//!
//! The output expectation is the outer block: it opens its capture scope
//! and only then drives the inner [`Check`]. The reverse nesting does not
//! type-check, because an [`OutputExpectation`] is not a thunk producing an
//! [`InvocationResult`].

use anyhow::Result;
use predicates::prelude::*;
use predicates::BoxPredicate;

use crate::capture::capture_output;
use crate::invoker::{InvocationResult, Outcome};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Expectation {
    Success,
    Failure,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SuccessMatcher {
    expectation: Expectation,
}

pub fn be_a_success() -> SuccessMatcher {
    SuccessMatcher {
        expectation: Expectation::Success,
    }
}

pub fn be_a_failure() -> SuccessMatcher {
    be_a_success().negate()
}

/// A zero-argument producer of an invocation result.
pub struct Deferred<'a> {
    thunk: Box<dyn FnOnce() -> Result<InvocationResult> + 'a>,
}

impl<'a> Deferred<'a> {
    pub fn new<F>(thunk: F) -> Self
    where
        F: FnOnce() -> Result<InvocationResult> + 'a,
    {
        Self {
            thunk: Box::new(thunk),
        }
    }

    pub fn resolve(self) -> Result<InvocationResult> {
        (self.thunk)()
    }
}

impl std::fmt::Debug for Deferred<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("Deferred { .. }")
    }
}

/// The two input shapes a matcher accepts.
#[derive(Debug)]
pub enum Actual<'a> {
    Status(&'a InvocationResult),
    Deferred(Deferred<'a>),
}

impl<'a> From<&'a InvocationResult> for Actual<'a> {
    fn from(result: &'a InvocationResult) -> Self {
        Self::Status(result)
    }
}

impl<'a> From<Deferred<'a>> for Actual<'a> {
    fn from(deferred: Deferred<'a>) -> Self {
        Self::Deferred(deferred)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Verdict {
    pub matched: bool,
    pub outcome: Outcome,
    pub command_id: String,
    pub message: String,
}

impl SuccessMatcher {
    pub fn expectation(self) -> Expectation {
        self.expectation
    }

    pub fn negate(self) -> Self {
        let expectation = match self.expectation {
            Expectation::Success => Expectation::Failure,
            Expectation::Failure => Expectation::Success,
        };
        Self { expectation }
    }

    pub fn matches(self, result: &InvocationResult) -> bool {
        result.success() == (self.expectation == Expectation::Success)
    }

    pub fn verdict(self, result: &InvocationResult) -> Verdict {
        let matched = self.matches(result);
        let wanted = match self.expectation {
            Expectation::Success => "a success",
            Expectation::Failure => "a failure",
        };
        let message = if matched {
            format!("`{}` was {wanted}", result.command_id())
        } else {
            format!(
                "expected `{}` to be {wanted}, but it {}\n----- stdout -----\n{}\n----- stderr -----\n{}",
                result.command_id(),
                result.outcome(),
                result.stdout_str(),
                result.stderr_str()
            )
        };
        Verdict {
            matched,
            outcome: result.outcome(),
            command_id: result.command_id().to_string(),
            message,
        }
    }

    /// Resolves `actual`, running a deferred thunk exactly once.
    ///
    /// Errors only when a deferred invocation fails to launch.
    pub fn evaluate<'a>(self, actual: impl Into<Actual<'a>>) -> Result<Verdict> {
        match actual.into() {
            Actual::Status(result) => Ok(self.verdict(result)),
            Actual::Deferred(deferred) => {
                let result = deferred.resolve()?;
                Ok(self.verdict(&result))
            }
        }
    }
}

/// Starts a block expectation around `thunk`.
pub fn expect_block<'a, F>(thunk: F) -> Block<'a>
where
    F: FnOnce() -> Result<InvocationResult> + 'a,
{
    Block {
        deferred: Deferred::new(thunk),
    }
}

#[derive(Debug)]
pub struct Block<'a> {
    deferred: Deferred<'a>,
}

impl<'a> Block<'a> {
    pub fn to(self, matcher: SuccessMatcher) -> Check<'a> {
        Check {
            deferred: self.deferred,
            matcher,
        }
    }

    pub fn not_to(self, matcher: SuccessMatcher) -> Check<'a> {
        self.to(matcher.negate())
    }
}

/// A lazy success check. Nothing runs until it is evaluated or asserted.
#[must_use = "a check does nothing until it is evaluated or asserted"]
#[derive(Debug)]
pub struct Check<'a> {
    deferred: Deferred<'a>,
    matcher: SuccessMatcher,
}

impl Check<'_> {
    pub fn evaluate(self) -> Result<Verdict> {
        self.matcher.evaluate(self.deferred)
    }

    /// Panics when the invocation cannot be launched or does not match.
    #[track_caller]
    pub fn assert(self) -> Verdict {
        let verdict = match self.evaluate() {
            Ok(verdict) => verdict,
            Err(err) => panic!("invocation failed to launch: {err:#}"),
        };
        assert!(verdict.matched, "{}", verdict.message);
        verdict
    }
}

/// Wraps `check` in an output-capturing block expectation.
pub fn expect_output(check: Check<'_>) -> OutputExpectation<'_> {
    OutputExpectation {
        check,
        stdout: Vec::new(),
        stderr: Vec::new(),
    }
}

#[must_use = "an output expectation does nothing until it is evaluated or asserted"]
pub struct OutputExpectation<'a> {
    check: Check<'a>,
    stdout: Vec<BoxPredicate<str>>,
    stderr: Vec<BoxPredicate<str>>,
}

impl<'a> OutputExpectation<'a> {
    pub fn to_stdout<P>(mut self, predicate: P) -> Self
    where
        P: Predicate<str> + Send + Sync + 'static,
    {
        self.stdout.push(predicate.boxed());
        self
    }

    pub fn to_stderr<P>(mut self, predicate: P) -> Self
    where
        P: Predicate<str> + Send + Sync + 'static,
    {
        self.stderr.push(predicate.boxed());
        self
    }

    pub fn evaluate(self) -> Result<OutputVerdict> {
        let check = self.check;
        let captured = capture_output(move || check.evaluate());
        let stdout = captured.stdout_str().into_owned();
        let stderr = captured.stderr_str().into_owned();
        let verdict = captured.value?;

        let mut failures = Vec::new();
        if !verdict.matched {
            failures.push(verdict.message.clone());
        }
        failures.extend(unmet_predicates("stdout", &self.stdout, &stdout));
        failures.extend(unmet_predicates("stderr", &self.stderr, &stderr));

        Ok(OutputVerdict {
            verdict,
            stdout,
            stderr,
            failures,
        })
    }

    #[track_caller]
    pub fn assert(self) -> OutputVerdict {
        let output = match self.evaluate() {
            Ok(output) => output,
            Err(err) => panic!("invocation failed to launch: {err:#}"),
        };
        assert!(output.failures.is_empty(), "{}", output.failures.join("\n"));
        output
    }
}

impl std::fmt::Debug for OutputExpectation<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OutputExpectation")
            .field("check", &self.check)
            .field("stdout_predicates", &self.stdout.len())
            .field("stderr_predicates", &self.stderr.len())
            .finish()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputVerdict {
    pub verdict: Verdict,
    pub stdout: String,
    pub stderr: String,
    pub failures: Vec<String>,
}

impl OutputVerdict {
    pub fn passed(&self) -> bool {
        self.failures.is_empty()
    }
}

fn unmet_predicates(stream: &str, predicates: &[BoxPredicate<str>], output: &str) -> Vec<String> {
    predicates
        .iter()
        .filter(|predicate| !predicate.eval(output))
        .map(|predicate| format!("expected {stream} to satisfy `{predicate}`, got:\n{output}"))
        .collect()
}
