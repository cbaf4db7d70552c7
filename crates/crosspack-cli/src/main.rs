use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use crosspack_core::env_vars::{
    DEVELOPER_ENV, INTEGRATION_TEST_ENV, LOG_ENV, PREFIX_ENV, REGISTRY_ROOT_ENV,
};
use tracing_subscriber::EnvFilter;

mod dispatch;
mod render;
mod roots;

use dispatch::run_cli;

#[derive(Parser, Debug)]
#[command(name = "crosspack")]
#[command(about = "Native cross-platform package manager", long_about = None)]
struct Cli {
    #[arg(long, env = PREFIX_ENV)]
    prefix: Option<PathBuf>,
    #[arg(long, env = REGISTRY_ROOT_ENV)]
    registry_root: Option<PathBuf>,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    Search {
        query: String,
    },
    Info {
        name: String,
    },
    Install {
        #[arg(required = true)]
        names: Vec<String>,
    },
    Uninstall {
        name: String,
    },
    List,
    Doctor,
}

fn main() -> Result<()> {
    init_tracing();
    if let Ok(command_id) = std::env::var(INTEGRATION_TEST_ENV) {
        tracing::debug!(command_id = %command_id, "running under integration test harness");
    }

    let cli = Cli::parse();
    run_cli(cli)
}

fn init_tracing() {
    let default_filter = if std::env::var_os(DEVELOPER_ENV).is_some() {
        "debug"
    } else {
        "warn"
    };
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_env_filter(
            EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new(default_filter)),
        )
        .init();
}
