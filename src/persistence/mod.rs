//! Persisted checker state.
//!
//! The checker is the only writer. Stores serialise writers internally and
//! [`JsonFileStateStore`] replaces its file atomically, so a crash mid-write
//! leaves the previous state intact.

mod atomic;
mod error;
mod json_file;

use std::collections::BTreeSet;
use std::sync::Mutex;

use serde::{Deserialize, Serialize};

use crate::github::error::CheckError;
use crate::reconcile::PrCheckResult;

pub(crate) use atomic::write_atomically;
pub use error::PersistenceError;
pub use json_file::{JsonFileStateStore, STATE_FILE_NAME};

/// Everything persisted between runs.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PersistedState {
    /// Pull requests the user dismissed.
    pub dismissed_ids: BTreeSet<u64>,
    /// Pull requests the user was notified about.
    pub notified_ids: BTreeSet<u64>,
    /// Snapshot of the last completed cycle.
    pub last_result: Option<PrCheckResult>,
    /// Errors from the last completed cycle.
    pub last_errors: Vec<CheckError>,
}

/// Storage for [`PersistedState`].
///
/// Implementations must serialise concurrent `update` calls.
pub trait StateStore: Send + Sync {
    /// Reads the current state; a store that was never written yields the
    /// default state.
    ///
    /// # Errors
    ///
    /// Returns [`PersistenceError`] when the state cannot be read.
    fn load(&self) -> Result<PersistedState, PersistenceError>;

    /// Applies `apply` to the current state and writes the result back,
    /// returning the stored state.
    ///
    /// # Errors
    ///
    /// Returns [`PersistenceError`] when the state cannot be read or written.
    fn update(
        &self,
        apply: &mut dyn FnMut(&mut PersistedState),
    ) -> Result<PersistedState, PersistenceError>;

    /// Reads the dismissed identifiers.
    ///
    /// # Errors
    ///
    /// Returns [`PersistenceError`] when the state cannot be read.
    fn dismissed_ids(&self) -> Result<BTreeSet<u64>, PersistenceError> {
        self.load().map(|state| state.dismissed_ids)
    }

    /// Replaces the dismissed identifiers.
    ///
    /// # Errors
    ///
    /// Returns [`PersistenceError`] when the state cannot be written.
    fn set_dismissed_ids(&self, ids: BTreeSet<u64>) -> Result<(), PersistenceError> {
        let mut ids = Some(ids);
        self.update(&mut |state| {
            if let Some(ids) = ids.take() {
                state.dismissed_ids = ids;
            }
        })
        .map(|_| ())
    }

    /// Reads the notified identifiers.
    ///
    /// # Errors
    ///
    /// Returns [`PersistenceError`] when the state cannot be read.
    fn notified_ids(&self) -> Result<BTreeSet<u64>, PersistenceError> {
        self.load().map(|state| state.notified_ids)
    }

    /// Replaces the notified identifiers.
    ///
    /// # Errors
    ///
    /// Returns [`PersistenceError`] when the state cannot be written.
    fn set_notified_ids(&self, ids: BTreeSet<u64>) -> Result<(), PersistenceError> {
        let mut ids = Some(ids);
        self.update(&mut |state| {
            if let Some(ids) = ids.take() {
                state.notified_ids = ids;
            }
        })
        .map(|_| ())
    }

    /// Reads the last result snapshot.
    ///
    /// # Errors
    ///
    /// Returns [`PersistenceError`] when the state cannot be read.
    fn last_result(&self) -> Result<Option<PrCheckResult>, PersistenceError> {
        self.load().map(|state| state.last_result)
    }

    /// Replaces the last result snapshot.
    ///
    /// # Errors
    ///
    /// Returns [`PersistenceError`] when the state cannot be written.
    fn set_last_result(&self, result: Option<PrCheckResult>) -> Result<(), PersistenceError> {
        let mut result = Some(result);
        self.update(&mut |state| {
            if let Some(result) = result.take() {
                state.last_result = result;
            }
        })
        .map(|_| ())
    }

    /// Reads the errors of the last cycle.
    ///
    /// # Errors
    ///
    /// Returns [`PersistenceError`] when the state cannot be read.
    fn last_errors(&self) -> Result<Vec<CheckError>, PersistenceError> {
        self.load().map(|state| state.last_errors)
    }

    /// Replaces the errors of the last cycle.
    ///
    /// # Errors
    ///
    /// Returns [`PersistenceError`] when the state cannot be written.
    fn set_last_errors(&self, errors: Vec<CheckError>) -> Result<(), PersistenceError> {
        let mut errors = Some(errors);
        self.update(&mut |state| {
            if let Some(errors) = errors.take() {
                state.last_errors = errors;
            }
        })
        .map(|_| ())
    }
}

/// In-memory store, used in tests and when no state directory is wanted.
#[derive(Debug, Default)]
pub struct MemoryStateStore {
    state: Mutex<PersistedState>,
}

impl MemoryStateStore {
    /// Creates a store seeded with `state`.
    #[must_use]
    pub fn with_state(state: PersistedState) -> Self {
        Self {
            state: Mutex::new(state),
        }
    }
}

impl StateStore for MemoryStateStore {
    fn load(&self) -> Result<PersistedState, PersistenceError> {
        self.state
            .lock()
            .map(|state| state.clone())
            .map_err(|_| PersistenceError::LockPoisoned)
    }

    fn update(
        &self,
        apply: &mut dyn FnMut(&mut PersistedState),
    ) -> Result<PersistedState, PersistenceError> {
        let mut state = self
            .state
            .lock()
            .map_err(|_| PersistenceError::LockPoisoned)?;
        apply(&mut state);
        Ok(state.clone())
    }
}
