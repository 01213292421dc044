//! CLI operation mode handlers.
//!
//! This module contains the implementations for the operation modes:
//! - [`account`]: Device-flow sign-in and sign-out
//! - [`check`]: One-off checks and the scheduled watch loop
//! - [`dismissal`]: Offline dismiss and restore
//!
//! Output formatting utilities are in [`output`].

use camino::Utf8PathBuf;
use revwatch::auth::FileSecretStore;
use revwatch::{RevwatchConfig, RevwatchError};

pub mod account;
pub mod check;
pub mod dismissal;
pub mod output;

/// Opens the credential store inside the configured state directory.
fn open_secret_store(config: &RevwatchConfig) -> Result<FileSecretStore, RevwatchError> {
    let dir: Utf8PathBuf = config.state_dir_path()?;
    Ok(FileSecretStore::open(&dir)?)
}
