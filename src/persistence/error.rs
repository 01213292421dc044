//! Error types for local persistence operations.

use thiserror::Error;

/// Errors returned while reading or writing persisted state.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum PersistenceError {
    /// The state directory could not be created or opened.
    #[error("failed to open state directory '{path}': {message}")]
    OpenDirectory {
        /// Directory path.
        path: String,
        /// Error detail from the filesystem.
        message: String,
    },

    /// Reading or writing the state file failed.
    #[error("failed to {action} '{path}': {message}")]
    Io {
        /// What was being attempted (`read`, `write`, ...).
        action: &'static str,
        /// File path.
        path: String,
        /// Error detail from the filesystem.
        message: String,
    },

    /// The state file exists but does not hold valid state.
    #[error("failed to parse '{path}': {message}")]
    Corrupt {
        /// File path.
        path: String,
        /// Error detail from serde.
        message: String,
    },

    /// State could not be serialised.
    #[error("failed to serialise state: {message}")]
    Serialise {
        /// Error detail from serde.
        message: String,
    },

    /// A writer panicked while holding the store lock.
    #[error("state store lock is poisoned")]
    LockPoisoned,

    /// The blocking task performing the store operation did not complete.
    #[error("state store task failed: {message}")]
    TaskFailed {
        /// Error detail from the runtime.
        message: String,
    },
}
