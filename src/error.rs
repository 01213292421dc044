//! Top-level error type for the `revwatch` binary and its mode handlers.
//!
//! Check cycles never fail as a whole; their problems are collected as
//! [`CheckError`]s inside a result. [`RevwatchError`] covers everything that
//! stops a command before or outside a cycle.

use thiserror::Error;

use crate::auth::{DeviceFlowError, SecretStoreError};
use crate::github::{CheckError, LocatorError};
use crate::persistence::PersistenceError;

/// Errors that end a `revwatch` invocation.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum RevwatchError {
    /// Configuration could not be loaded or is inconsistent.
    #[error("configuration error: {message}")]
    Configuration {
        /// What is wrong.
        message: String,
    },

    /// No token was found in configuration, the secret store, or the
    /// environment.
    #[error(
        "no GitHub token available: run with --login, pass --token, or set \
         REVWATCH_TOKEN or GITHUB_TOKEN"
    )]
    MissingToken,

    /// A repository name, token, or base URL is malformed.
    #[error(transparent)]
    Locator(#[from] LocatorError),

    /// A GitHub request failed outside a check cycle.
    #[error(transparent)]
    Check(#[from] CheckError),

    /// Local state could not be read or written.
    #[error(transparent)]
    Persistence(#[from] PersistenceError),

    /// The device flow could not start.
    #[error(transparent)]
    DeviceFlow(#[from] DeviceFlowError),

    /// Stored credentials could not be read or written.
    #[error(transparent)]
    SecretStore(#[from] SecretStoreError),

    /// Sign-in ended without a token.
    #[error("sign-in did not complete: {message}")]
    SignIn {
        /// Why the flow ended.
        message: String,
    },

    /// The requested pull request is not in the expected list of the last
    /// check result.
    #[error("pull request {id} is not {list} in the last check result")]
    UnknownPullRequest {
        /// Pull request id as given on the command line.
        id: u64,
        /// `active` or `dismissed`.
        list: &'static str,
    },

    /// A one-off check finished with errors.
    #[error("check finished with {count} error(s)")]
    CheckFailed {
        /// Number of errors in the result.
        count: usize,
    },

    /// Writing command output failed.
    #[error("failed to write output: {message}")]
    Io {
        /// Error detail from the writer.
        message: String,
    },
}

impl RevwatchError {
    /// Creates a [`RevwatchError::Configuration`] error.
    #[must_use]
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }
}

impl From<std::io::Error> for RevwatchError {
    fn from(error: std::io::Error) -> Self {
        Self::Io {
            message: error.to_string(),
        }
    }
}
