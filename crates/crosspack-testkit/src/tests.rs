use std::cell::Cell;
use std::collections::HashSet;
use std::ffi::OsString;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crosspack_core::env_vars::{
    BIN_FILE_ENV, DEVELOPER_ENV, INTEGRATION_TEST_ENV, PREFIX_ENV, REGISTRY_ROOT_ENV,
    TEST_TMPDIR_ENV,
};
use crosspack_core::PackageManifest;
use predicates::str::contains;

use super::*;
use crate::capture::echo_output;
use crate::matcher::Expectation;

fn test_config() -> HarnessConfig {
    HarnessConfig::new(Runner::direct("crosspack"))
        .with_developer(None)
        .with_coverage_dir(None)
}

fn test_harness(tmp_root: &Path, suite_root: &str) -> Harness {
    Harness::new(
        Arc::new(test_config().with_suite_root(suite_root)),
        Arc::new(CallCounter::new()),
        tmp_root,
        tmp_root.join("prefix").join("bin").join("crosspack"),
    )
}

fn args(values: &[&str]) -> Vec<String> {
    values.iter().map(|value| value.to_string()).collect()
}

fn result_with(outcome: Outcome) -> InvocationResult {
    InvocationResult::new(outcome, "out\n", "err\n", "tests.rs:1:crosspack list:1")
}

#[test]
fn command_id_joins_call_site_program_args_and_sequence() {
    let id = command_id(
        CallSite {
            file: "crates/crosspack-cli/tests/install.rs",
            line: 12,
        },
        "crosspack",
        &args(&["install", "foo"]),
        &TempRoot::from_parts(Path::new("/nonexistent/crosspack-run"), None),
        "crates/crosspack-cli/tests/",
        3,
    );
    assert_eq!(id, "install.rs:12:crosspack install foo:3");
}

#[test]
fn command_id_keeps_call_site_outside_suite_root() {
    let id = command_id(
        CallSite {
            file: "src/elsewhere.rs",
            line: 4,
        },
        "crosspack",
        &args(&["list"]),
        &TempRoot::from_parts(Path::new("/nonexistent/crosspack-run"), None),
        "crates/crosspack-cli/tests/",
        1,
    );
    assert_eq!(id, "src/elsewhere.rs:4:crosspack list:1");
}

#[test]
fn command_id_replaces_temp_root_with_placeholder() {
    let tmp = tempfile::tempdir().expect("must create temp dir");
    let literal = format!("--prefix={}", tmp.path().join("prefix").display());
    let canonical = format!(
        "--registry-root={}",
        tmp.path()
            .canonicalize()
            .expect("must canonicalize")
            .join("registry")
            .display()
    );

    let id = command_id(
        CallSite {
            file: "tests.rs",
            line: 1,
        },
        "crosspack",
        &[literal, canonical, "doctor".to_string()],
        &TempRoot::resolve(tmp.path()),
        "",
        7,
    );

    let expected_prefix = Path::new(TMPDIR_PLACEHOLDER).join("prefix");
    let expected_registry = Path::new(TMPDIR_PLACEHOLDER).join("registry");
    assert_eq!(
        id,
        format!(
            "tests.rs:1:crosspack --prefix={} --registry-root={} doctor:7",
            expected_prefix.display(),
            expected_registry.display()
        )
    );
}

#[test]
fn command_id_masks_both_root_spellings_without_touching_the_filesystem() {
    let root = TempRoot::from_parts(
        Path::new("/nonexistent/tmp/run"),
        Some("/nonexistent/private/tmp/run".to_string()),
    );

    let id = command_id(
        CallSite {
            file: "tests.rs",
            line: 2,
        },
        "crosspack",
        &args(&["/nonexistent/private/tmp/run/a", "/nonexistent/tmp/run/b"]),
        &root,
        "",
        1,
    );

    assert_eq!(id, "tests.rs:2:crosspack @TMPDIR@/a @TMPDIR@/b:1");
    assert_eq!(
        TempRoot::resolve(Path::new("/nonexistent/crosspack-run")),
        TempRoot::from_parts(Path::new("/nonexistent/crosspack-run"), None)
    );
}

#[test]
fn call_counter_returns_post_increment_values() {
    let counter = CallCounter::new();
    assert_eq!(counter.current(), 0);
    assert_eq!(counter.next(), 1);
    assert_eq!(counter.next(), 2);
    assert_eq!(counter.current(), 2);
}

#[test]
fn call_counter_is_unique_across_threads() {
    let counter = Arc::new(CallCounter::new());
    let handles = (0..8)
        .map(|_| {
            let counter = Arc::clone(&counter);
            std::thread::spawn(move || (0..100).map(|_| counter.next()).collect::<Vec<_>>())
        })
        .collect::<Vec<_>>();

    let mut seen = HashSet::new();
    for handle in handles {
        for value in handle.join().expect("worker must not panic") {
            assert!(seen.insert(value), "duplicate sequence number {value}");
        }
    }
    assert_eq!(seen.len(), 800);
    assert_eq!(counter.current(), 800);
}

#[test]
fn repeated_call_site_gets_increasing_sequence_numbers() {
    let tmp = tempfile::tempdir().expect("must create temp dir");
    let harness = test_harness(tmp.path(), "");
    let list = args(&["list"]);

    let mut ids = Vec::new();
    for _ in 0..2 {
        ids.push(harness.next_command_id(&list));
    }
    let line = line!() - 2;

    let site = format!("{}:{line}:crosspack list", file!());
    assert_eq!(ids, vec![format!("{site}:1"), format!("{site}:2")]);
    assert_eq!(harness.counter().current(), 2);
}

#[test]
fn harness_trims_suite_root_from_call_site() {
    let tmp = tempfile::tempdir().expect("must create temp dir");
    let harness = test_harness(tmp.path(), "crosspack-testkit");

    let id = harness.next_command_id(&args(&["doctor"]));

    let file = file!();
    let start = file.find("crosspack-testkit").expect("file path names the crate");
    let trimmed = &file[start + "crosspack-testkit".len()..];
    assert!(
        id.starts_with(&format!("{trimmed}:")),
        "unexpected identifier: {id}"
    );
    assert!(id.ends_with(":crosspack doctor:1"));
}

#[test]
fn env_overrides_later_assignment_wins() {
    let overrides = EnvOverrides::new().set("FOO", "one").set("FOO", "two");
    assert_eq!(overrides.iter().collect::<Vec<_>>(), vec![("FOO", "two")]);

    let collected: EnvOverrides = [("A", "1"), ("A", "2")].into_iter().collect();
    assert_eq!(collected.iter().collect::<Vec<_>>(), vec![("A", "2")]);
}

#[test]
fn build_environment_required_entries_win_over_overrides() {
    let overrides = EnvOverrides::new()
        .set(INTEGRATION_TEST_ENV, "bogus")
        .set(BIN_FILE_ENV, "/bogus")
        .set(DEVELOPER_ENV, "1")
        .set("EXTRA_VAR", "kept");
    let required = RequiredEnv {
        bin_file: Path::new("/run/prefix/bin/crosspack"),
        command_id: "install.rs:3:crosspack list:1",
        tmp_root: Path::new("/run"),
        developer: None,
        coverage_profile: None,
    };

    let env = build_environment(&overrides, &required);

    assert_eq!(
        env.get(INTEGRATION_TEST_ENV).map(String::as_str),
        Some("install.rs:3:crosspack list:1")
    );
    assert_eq!(
        env.get(BIN_FILE_ENV).map(String::as_str),
        Some("/run/prefix/bin/crosspack")
    );
    assert_eq!(env.get(TEST_TMPDIR_ENV).map(String::as_str), Some("/run"));
    assert_eq!(env.get("EXTRA_VAR").map(String::as_str), Some("kept"));
    assert!(!env.contains_key(DEVELOPER_ENV));
    assert!(!env.contains_key(LLVM_PROFILE_FILE_ENV));
}

#[test]
fn build_environment_pins_roots_under_temp_root_unless_overridden() {
    let tmp_root = PathBuf::from("/run");
    let required = RequiredEnv {
        bin_file: Path::new("/run/prefix/bin/crosspack"),
        command_id: "id",
        tmp_root: &tmp_root,
        developer: None,
        coverage_profile: None,
    };

    let env = build_environment(&EnvOverrides::new(), &required);
    assert_eq!(
        env.get(PREFIX_ENV),
        Some(&tmp_root.join("prefix").display().to_string())
    );
    assert_eq!(
        env.get(REGISTRY_ROOT_ENV),
        Some(&tmp_root.join("registry").display().to_string())
    );

    let overrides = EnvOverrides::new().set(PREFIX_ENV, "/chosen");
    let env = build_environment(&overrides, &required);
    assert_eq!(env.get(PREFIX_ENV).map(String::as_str), Some("/chosen"));
}

#[test]
fn sandbox_suspends_developer_flag_only_when_unset() {
    let unset = RequiredEnv {
        bin_file: Path::new("/run/prefix/bin/crosspack"),
        command_id: "id",
        tmp_root: Path::new("/run"),
        developer: None,
        coverage_profile: None,
    };
    let set = RequiredEnv {
        developer: Some("1"),
        ..unset
    };
    let base = EnvSandbox::cargo_test();

    assert!(base.for_required(&unset).is_suspended(DEVELOPER_ENV));
    assert!(base.for_required(&unset).is_suspended("CARGO_PKG_NAME"));
    assert!(!base.for_required(&set).is_suspended(DEVELOPER_ENV));
    assert_eq!(base.for_required(&set), base);
}

#[test]
fn build_environment_propagates_developer_and_coverage_profile() {
    let profile = PathBuf::from("/cov/id-%p.profraw");
    let required = RequiredEnv {
        bin_file: Path::new("/run/prefix/bin/crosspack"),
        command_id: "id",
        tmp_root: Path::new("/run"),
        developer: Some("1"),
        coverage_profile: Some(&profile),
    };

    let env = build_environment(&EnvOverrides::new(), &required);

    assert_eq!(env.get(DEVELOPER_ENV).map(String::as_str), Some("1"));
    assert_eq!(
        env.get(LLVM_PROFILE_FILE_ENV).map(String::as_str),
        Some("/cov/id-%p.profraw")
    );
}

#[test]
fn coverage_profile_path_sanitizes_identifier() {
    let path = coverage_profile_path(Path::new("/cov"), "tests/a.rs:1:crosspack list:2");
    assert_eq!(
        path,
        Path::new("/cov").join("tests_a.rs_1_crosspack_list_2-%p.profraw")
    );
}

#[test]
fn cargo_test_sandbox_suspends_only_bundling_variables() {
    let sandbox = EnvSandbox::cargo_test();
    assert!(sandbox.is_suspended("CARGO_MANIFEST_DIR"));
    assert!(sandbox.is_suspended("CARGO_PKG_NAME"));
    assert!(sandbox.is_suspended("CARGO_BIN_EXE_crosspack"));
    assert!(sandbox.is_suspended("CARGO"));
    assert!(!sandbox.is_suspended("CARGO_HOME"));
    assert!(!sandbox.is_suspended("PATH"));

    let vars = [("PATH", "/bin"), ("CARGO_PKG_NAME", "x"), ("HOME", "/root")]
        .into_iter()
        .map(|(name, value)| (OsString::from(name), OsString::from(value)));
    assert_eq!(sandbox.suspended_names(vars), vec!["CARGO_PKG_NAME"]);

    let custom = EnvSandbox::none().with_prefix("BUNDLE_").with_name("RUBYOPT");
    assert!(custom.is_suspended("BUNDLE_GEMFILE"));
    assert!(custom.is_suspended("RUBYOPT"));
    assert!(!custom.is_suspended("CARGO_PKG_NAME"));
}

#[test]
fn runner_argv_places_coverage_flags_before_script() {
    let runner = Runner::interpreted("ruby", "bin/crosspack")
        .with_flags(["-W0"])
        .with_coverage_flags(["-rcoverage"]);
    let user_args = args(&["install", "foo"]);

    assert_eq!(
        runner.argv(true, &user_args),
        vec!["-W0", "-rcoverage", "bin/crosspack", "install", "foo"]
    );
    assert_eq!(
        runner.argv(false, &user_args),
        vec!["-W0", "bin/crosspack", "install", "foo"]
    );
    assert_eq!(Runner::direct("crosspack").argv(true, &user_args), vec!["install", "foo"]);
}

#[cfg(unix)]
fn run_shell(script: &str, env: &EnvironmentMap) -> anyhow::Result<InvocationResult> {
    invoke(InvocationRequest {
        runner: &Runner::direct("sh"),
        coverage: false,
        args: &args(&["-c", script]),
        env,
        sandbox: &EnvSandbox::cargo_test(),
        command_id: "tests.rs:1:sh:1",
    })
}

#[cfg(unix)]
#[test]
fn invoke_reports_exit_code_and_captures_both_streams() {
    let captured = capture_output(|| {
        run_shell("echo out; echo err >&2; exit 3", &EnvironmentMap::new())
    });
    let result = captured.value.expect("sh must launch");

    assert!(!result.success());
    assert_eq!(result.outcome(), Outcome::Failure { code: Some(3) });
    assert_eq!(result.exit_code(), Some(3));
    assert_eq!(result.stdout_str(), "out\n");
    assert_eq!(result.stderr_str(), "err\n");
    assert_eq!(result.command_id(), "tests.rs:1:sh:1");
    assert_eq!(captured.stdout, b"out\n");
    assert_eq!(captured.stderr, b"err\n");
}

#[cfg(unix)]
#[test]
fn invoke_passes_built_environment_and_suspends_bundling_variables() {
    let mut env = EnvironmentMap::new();
    env.insert(INTEGRATION_TEST_ENV.to_string(), "abc:1".to_string());

    let result = run_shell(
        "printf '%s|%s' \"$CROSSPACK_INTEGRATION_TEST\" \"${CARGO_MANIFEST_DIR-unset}\"",
        &env,
    )
    .expect("sh must launch");

    assert!(result.success());
    assert_eq!(result.stdout_str(), "abc:1|unset");
}

#[test]
fn invoke_fails_when_program_cannot_launch() {
    let err = invoke(InvocationRequest {
        runner: &Runner::direct("/nonexistent/crosspack-missing"),
        coverage: false,
        args: &[],
        env: &EnvironmentMap::new(),
        sandbox: &EnvSandbox::none(),
        command_id: "tests.rs:1:crosspack:1",
    })
    .expect_err("launch must fail");
    assert!(
        format!("{err:#}").contains("failed to launch /nonexistent/crosspack-missing"),
        "unexpected error: {err:#}"
    );
}

#[test]
fn failure_matcher_is_the_complement_of_success() {
    assert_eq!(be_a_success().expectation(), Expectation::Success);
    assert_eq!(be_a_failure().expectation(), Expectation::Failure);
    assert_eq!(be_a_failure().negate(), be_a_success());

    for outcome in [
        Outcome::Success,
        Outcome::Failure { code: Some(1) },
        Outcome::Failure { code: None },
    ] {
        let result = result_with(outcome);
        assert_eq!(be_a_success().matches(&result), outcome.is_success());
        assert_ne!(
            be_a_success().matches(&result),
            be_a_failure().matches(&result)
        );
    }
}

#[test]
fn verdict_describes_mismatch_with_identifier_and_output() {
    let result = result_with(Outcome::Failure { code: Some(1) });
    let verdict = be_a_success()
        .evaluate(&result)
        .expect("status input never errors");

    assert!(!verdict.matched);
    assert_eq!(verdict.command_id, "tests.rs:1:crosspack list:1");
    assert!(verdict
        .message
        .contains("expected `tests.rs:1:crosspack list:1` to be a success, but it exited with code 1"));
    assert!(verdict.message.contains("out\n"));
}

#[test]
fn block_expectation_runs_thunk_once_and_only_when_evaluated() {
    let calls = Cell::new(0);
    let check = expect_block(|| {
        calls.set(calls.get() + 1);
        Ok(result_with(Outcome::Success))
    })
    .to(be_a_success());
    assert_eq!(calls.get(), 0);

    let verdict = check.evaluate().expect("thunk must run");
    assert!(verdict.matched);
    assert_eq!(calls.get(), 1);
}

#[test]
fn block_expectation_supports_negation() {
    let verdict = expect_block(|| Ok(result_with(Outcome::Failure { code: None })))
        .not_to(be_a_success())
        .assert();
    assert_eq!(verdict.outcome, Outcome::Failure { code: None });
}

#[test]
#[should_panic(expected = "to be a success")]
fn block_expectation_assert_panics_on_mismatch() {
    let _ = expect_block(|| Ok(result_with(Outcome::Failure { code: Some(2) })))
        .to(be_a_success())
        .assert();
}

#[test]
fn block_expectation_propagates_launch_errors() {
    let err = expect_block(|| Err(anyhow::anyhow!("spawn failed")))
        .to(be_a_failure())
        .evaluate()
        .expect_err("launch error must surface");
    assert_eq!(err.to_string(), "spawn failed");
}

#[test]
fn deferred_input_is_accepted_by_matcher_directly() {
    let deferred = Deferred::new(|| Ok(result_with(Outcome::Success)));
    let verdict = be_a_success()
        .evaluate(deferred)
        .expect("thunk must run");
    assert!(verdict.matched);
}

#[test]
fn output_expectation_drives_inner_check_inside_capture_scope() {
    let calls = Cell::new(0);
    let check = expect_block(|| {
        calls.set(calls.get() + 1);
        assert!(capture_active());
        echo_output(b"foo 1.0.0\n", b"warning: stale\n");
        Ok(result_with(Outcome::Success))
    })
    .to(be_a_success());

    let output = expect_output(check)
        .to_stdout(contains("foo 1.0.0"))
        .to_stderr(contains("stale"))
        .assert();

    assert!(output.passed());
    assert!(output.verdict.matched);
    assert_eq!(output.stdout, "foo 1.0.0\n");
    assert_eq!(calls.get(), 1);
    assert!(!capture_active());
}

#[test]
fn output_expectation_collects_every_failure() {
    let check = expect_block(|| {
        echo_output(b"nothing useful\n", b"");
        Ok(result_with(Outcome::Failure { code: Some(1) }))
    })
    .to(be_a_success());

    let output = expect_output(check)
        .to_stdout(contains("foo 1.0.0"))
        .evaluate()
        .expect("thunk must run");

    assert!(!output.passed());
    assert_eq!(output.failures.len(), 2);
    assert!(output.failures[0].contains("to be a success"));
    assert!(output.failures[1].contains("expected stdout to satisfy"));
}

#[test]
fn capture_scopes_nest_and_collect_innermost_output() {
    let outer = capture_output(|| {
        echo_output(b"outer\n", b"");
        let inner = capture_output(|| echo_output(b"inner\n", b"inner-err\n"));
        echo_output(b"", b"outer-err\n");
        inner
    });

    assert_eq!(outer.stdout_str(), "outer\n");
    assert_eq!(outer.stderr_str(), "outer-err\n");
    assert_eq!(outer.value.stdout_str(), "inner\n");
    assert_eq!(outer.value.stderr_str(), "inner-err\n");
    assert!(!capture_active());
}

#[test]
fn capture_scope_is_closed_when_body_panics() {
    let outcome = catch_unwind(|| capture_output(|| panic!("body failed")));
    assert!(outcome.is_err());
    assert!(!capture_active());
}

#[test]
fn scenario_creates_placeholder_and_removes_it_on_drop() {
    let root = tempfile::tempdir().expect("must create temp dir");
    let scenario_root = root.path().join("scenario");

    let scenario = Scenario::begin_in(&scenario_root, test_config(), Arc::new(CallCounter::new()))
        .expect("before hook must succeed");
    let bin_file = scenario.bin_file().to_path_buf();
    assert_eq!(bin_file, scenario_root.join("prefix").join("bin").join("crosspack"));
    assert_eq!(scenario.prefix(), scenario_root.join("prefix"));
    assert_eq!(scenario.registry_root(), scenario_root.join("registry"));
    assert_eq!(scenario.taps_root(), scenario_root.join("taps"));
    assert_eq!(scenario.harness().bin_file(), bin_file);
    assert_eq!(
        std::fs::metadata(&bin_file).expect("placeholder exists").len(),
        0
    );

    drop(scenario);

    assert!(!bin_file.exists());
    assert!(!scenario_root.join("prefix").join("bin").exists());
    assert!(scenario_root.join("prefix").is_dir());
}

#[test]
fn scenario_after_hook_runs_when_body_panics() {
    let root = tempfile::tempdir().expect("must create temp dir");
    let scenario_root = root.path().join("scenario");
    let bin_dir = scenario_root.join("prefix").join("bin");

    let outcome = catch_unwind(AssertUnwindSafe(|| {
        let scenario =
            Scenario::begin_in(&scenario_root, test_config(), Arc::new(CallCounter::new()))
                .expect("before hook must succeed");
        assert!(scenario.bin_file().is_file());
        panic!("test body failed");
    }));

    assert!(outcome.is_err());
    assert!(!bin_dir.exists());
}

#[test]
fn run_scenario_owns_and_releases_temp_root() {
    let (tmp_root, bin_file) = run_scenario(test_config(), Arc::new(CallCounter::new()), |s| {
        assert!(s.bin_file().is_file());
        (s.tmp_root().to_path_buf(), s.bin_file().to_path_buf())
    })
    .expect("scenario must start");

    assert!(!bin_file.exists());
    assert!(!tmp_root.exists());
}

#[test]
fn setup_package_definition_writes_testball_template() {
    let scenario =
        Scenario::begin(test_config(), Arc::new(CallCounter::new())).expect("must begin");

    let path = scenario
        .fixtures()
        .setup_package_definition("testball", None)
        .expect("must write definition");

    assert_eq!(
        path,
        scenario
            .registry_root()
            .join("index")
            .join("testball")
            .join("0.1.0.toml")
    );
    let manifest = PackageManifest::from_toml_str(
        &std::fs::read_to_string(&path).expect("must read definition"),
    )
    .expect("must parse definition");
    assert_eq!(manifest.description.as_deref(), Some("Some test"));
    assert_eq!(
        manifest.homepage.as_deref(),
        Some("https://example.com/testball")
    );
    assert_eq!(manifest.sha256.as_deref(), Some(TESTBALL_SHA256));
    assert_eq!(manifest.options.len(), 1);
    assert_eq!(manifest.options[0].name, "with-foo");
}

#[test]
fn testball_url_follows_configured_fixture_dir() {
    let fixture_dir = PathBuf::from("/suite/fixtures");
    let config = test_config().with_fixture_dir(Some(fixture_dir.clone()));
    let scenario = Scenario::begin(config, Arc::new(CallCounter::new())).expect("must begin");
    let fixtures = scenario.fixtures();

    let tarball = fixtures.testball_tarball().expect("fixture dir is configured");
    assert_eq!(
        tarball,
        fixture_dir.join("tarballs").join("testball-0.1.tbz")
    );
    fixtures
        .setup_package_definition("testball", None)
        .expect("must write definition");
    let manifest = fixtures
        .registry()
        .latest("testball")
        .expect("must read testball")
        .expect("testball exists");
    assert_eq!(
        manifest.url,
        Some(format!("file://{}", tarball.display()).replace('\\', "/"))
    );
}

#[test]
fn testball_has_no_url_without_fixture_dir() {
    let scenario =
        Scenario::begin(test_config(), Arc::new(CallCounter::new())).expect("must begin");
    let fixtures = scenario.fixtures();

    assert_eq!(fixtures.testball_tarball(), None);
    fixtures
        .setup_package_definition("testball", None)
        .expect("must write definition");
    let manifest = fixtures
        .registry()
        .latest("testball")
        .expect("must read testball")
        .expect("testball exists");
    assert_eq!(manifest.url, None);
}

#[test]
fn setup_package_definition_templates_dependencies_and_bodies() {
    let scenario =
        Scenario::begin(test_config(), Arc::new(CallCounter::new())).expect("must begin");
    let fixtures = scenario.fixtures();

    fixtures
        .setup_package_definition("bar", None)
        .expect("must write bar");
    let bar = fixtures
        .registry()
        .latest("bar")
        .expect("must read bar")
        .expect("bar exists");
    assert!(bar.dependencies.contains_key("foo"));
    assert_eq!(bar.url.as_deref(), Some("https://example.com/bar-1.0"));

    fixtures
        .setup_package_definition("baz", Some("description = \"Custom\""))
        .expect("must write baz");
    let baz = fixtures
        .registry()
        .latest("baz")
        .expect("must read baz")
        .expect("baz exists");
    assert_eq!(baz.version.to_string(), "1.0.0");
    assert_eq!(baz.description.as_deref(), Some("Custom"));

    let err = fixtures
        .setup_package_definition("qux", Some("version = \"2.0.0\""))
        .expect_err("duplicate key must be rejected");
    assert!(err.to_string().contains("fixture definition for 'qux' is invalid"));
}

#[test]
fn ensure_tap_is_idempotent() {
    let scenario =
        Scenario::begin(test_config(), Arc::new(CallCounter::new())).expect("must begin");
    let fixtures = scenario.fixtures();

    let first = fixtures.ensure_tap("user/repo").expect("must install tap");
    assert!(first.newly_installed);
    assert_eq!(first.path, scenario.taps_root().join("user").join("repo"));
    assert!(first.path.join("index").is_dir());

    let second = fixtures.ensure_tap("user/repo").expect("must reuse tap");
    assert!(!second.newly_installed);
    assert_eq!(second.name, first.name);

    assert!(fixtures.ensure_tap("not-a-tap").is_err());
}
