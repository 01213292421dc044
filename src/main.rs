//! revwatch CLI entrypoint: watches GitHub for pull requests awaiting review.

use std::io::{self, Write};
use std::process::ExitCode;

use ortho_config::OrthoConfig;
use revwatch::{OperationMode, RevwatchConfig, RevwatchError};
use tracing_subscriber::EnvFilter;

mod cli;

#[tokio::main]
async fn main() -> ExitCode {
    init_tracing();
    match run().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(error) => {
            if writeln!(io::stderr().lock(), "{error}").is_err() {
                return ExitCode::FAILURE;
            }
            ExitCode::FAILURE
        }
    }
}

async fn run() -> Result<(), RevwatchError> {
    let config = load_config()?;
    config.validate()?;

    match config.operation_mode() {
        OperationMode::Login => cli::account::login(&config).await,
        OperationMode::Logout => cli::account::logout(&config),
        OperationMode::Dismiss(id) => cli::dismissal::run(&config, id, true),
        OperationMode::Restore(id) => cli::dismissal::run(&config, id, false),
        OperationMode::CheckOnce => cli::check::once(&config).await,
        OperationMode::Watch => cli::check::watch(&config).await,
    }
}

/// Logs to stderr, filtered by `RUST_LOG` (default `info`).
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(io::stderr)
        .init();
}

/// Loads configuration from CLI, environment, and files.
///
/// # Errors
///
/// Returns [`RevwatchError::Configuration`] when ortho-config fails to parse
/// arguments or load configuration files.
fn load_config() -> Result<RevwatchConfig, RevwatchError> {
    RevwatchConfig::load().map_err(|error| RevwatchError::Configuration {
        message: error.to_string(),
    })
}
