//! Error types for authentication and credential storage.

use thiserror::Error;

/// Failures before device-flow polling starts.
///
/// Failures while polling are reported as [`super::DeviceFlowOutcome`]s.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum DeviceFlowError {
    /// The flow is missing settings such as the OAuth client id.
    #[error("device flow is not configured: {message}")]
    Configuration {
        /// What is missing.
        message: String,
    },

    /// The code request could not be sent.
    #[error("device code request failed: {message}")]
    Network {
        /// Error detail from the HTTP client.
        message: String,
    },

    /// GitHub refused to issue a device code.
    #[error("GitHub refused the device code request ({status}): {message}")]
    Rejected {
        /// HTTP status code.
        status: u16,
        /// Error description from GitHub.
        message: String,
    },

    /// The code response could not be decoded.
    #[error("device code response could not be decoded: {message}")]
    Decode {
        /// Error detail from serde.
        message: String,
    },

    /// The flow was cancelled before the request was sent.
    #[error("device flow was cancelled")]
    Cancelled,
}

/// Errors returned by secret stores.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum SecretStoreError {
    /// The credential directory could not be created or opened.
    #[error("failed to open credential directory '{path}': {message}")]
    OpenDirectory {
        /// Directory path.
        path: String,
        /// Error detail from the filesystem.
        message: String,
    },

    /// Reading or writing the credential file failed.
    #[error("failed to {action} credentials at '{path}': {message}")]
    Io {
        /// What was being attempted.
        action: &'static str,
        /// File path.
        path: String,
        /// Error detail from the filesystem.
        message: String,
    },

    /// The credential file does not hold valid credentials.
    #[error("credential file '{path}' is invalid: {message}")]
    Corrupt {
        /// File path.
        path: String,
        /// Error detail.
        message: String,
    },

    /// A writer panicked while holding the store lock.
    #[error("credential store lock is poisoned")]
    LockPoisoned,
}
