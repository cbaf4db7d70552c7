use std::sync::{Arc, OnceLock};

use crosspack_testkit::{CallCounter, HarnessConfig, Runner, Scenario};

/// Call sites in identifiers are reported relative to this directory.
pub const SUITE_ROOT: &str = "crates/crosspack-cli/tests/";

pub fn config() -> Arc<HarnessConfig> {
    static CONFIG: OnceLock<Arc<HarnessConfig>> = OnceLock::new();
    Arc::clone(CONFIG.get_or_init(|| {
        Arc::new(
            HarnessConfig::new(Runner::direct(env!("CARGO_BIN_EXE_crosspack")))
                .with_suite_root(SUITE_ROOT),
        )
    }))
}

/// Counter shared by every scenario in this test binary.
pub fn run_counter() -> Arc<CallCounter> {
    static COUNTER: OnceLock<Arc<CallCounter>> = OnceLock::new();
    Arc::clone(COUNTER.get_or_init(|| Arc::new(CallCounter::new())))
}

pub fn scenario() -> Scenario {
    Scenario::begin(config(), run_counter()).expect("scenario must begin")
}
