//! Environment variables shared between the `crosspack` binary and the
//! integration-test harness that drives it.

/// Path of the `crosspack` executable the current process was launched as.
pub const BIN_FILE_ENV: &str = "CROSSPACK_BIN_FILE";
/// Per-invocation identifier assigned by the integration-test harness.
pub const INTEGRATION_TEST_ENV: &str = "CROSSPACK_INTEGRATION_TEST";
/// Temp root of the current test run; prefix and registry live under it.
pub const TEST_TMPDIR_ENV: &str = "CROSSPACK_TEST_TMPDIR";
pub const DEVELOPER_ENV: &str = "CROSSPACK_DEVELOPER";
pub const TESTS_COVERAGE_ENV: &str = "CROSSPACK_TESTS_COVERAGE";
pub const COVERAGE_DIR_ENV: &str = "CROSSPACK_COVERAGE_DIR";
pub const PREFIX_ENV: &str = "CROSSPACK_PREFIX";
pub const REGISTRY_ROOT_ENV: &str = "CROSSPACK_REGISTRY_ROOT";
pub const LOG_ENV: &str = "CROSSPACK_LOG";
