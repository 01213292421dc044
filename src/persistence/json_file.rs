//! JSON file-backed state store.

use std::io::ErrorKind;
use std::sync::Mutex;

use camino::{Utf8Path, Utf8PathBuf};
use cap_std::ambient_authority;
use cap_std::fs_utf8::Dir;
use tracing::debug;

use super::atomic::write_atomically;
use super::{PersistedState, PersistenceError, StateStore};

/// File name of the state document inside the state directory.
pub const STATE_FILE_NAME: &str = "state.json";

/// Stores [`PersistedState`] as pretty-printed JSON in a directory.
#[derive(Debug)]
pub struct JsonFileStateStore {
    dir: Dir,
    path: Utf8PathBuf,
    lock: Mutex<()>,
}

impl JsonFileStateStore {
    /// Opens the store in `state_dir`, creating the directory when needed.
    ///
    /// # Errors
    ///
    /// Returns [`PersistenceError::OpenDirectory`] when the directory cannot
    /// be created or opened.
    pub fn open(state_dir: &Utf8Path) -> Result<Self, PersistenceError> {
        let open_error = |error: std::io::Error| PersistenceError::OpenDirectory {
            path: state_dir.to_string(),
            message: error.to_string(),
        };
        Dir::create_ambient_dir_all(state_dir, ambient_authority()).map_err(open_error)?;
        let dir = Dir::open_ambient_dir(state_dir, ambient_authority()).map_err(open_error)?;
        Ok(Self {
            dir,
            path: state_dir.join(STATE_FILE_NAME),
            lock: Mutex::new(()),
        })
    }

    /// Path of the state document.
    #[must_use]
    pub fn path(&self) -> &Utf8Path {
        &self.path
    }

    fn read(&self) -> Result<PersistedState, PersistenceError> {
        let content = match self.dir.read_to_string(STATE_FILE_NAME) {
            Ok(content) => content,
            Err(error) if error.kind() == ErrorKind::NotFound => {
                return Ok(PersistedState::default());
            }
            Err(error) => {
                return Err(PersistenceError::Io {
                    action: "read",
                    path: self.path.to_string(),
                    message: error.to_string(),
                });
            }
        };
        serde_json::from_str(&content).map_err(|error| PersistenceError::Corrupt {
            path: self.path.to_string(),
            message: error.to_string(),
        })
    }
}

impl StateStore for JsonFileStateStore {
    fn load(&self) -> Result<PersistedState, PersistenceError> {
        let _guard = self.lock.lock().map_err(|_| PersistenceError::LockPoisoned)?;
        self.read()
    }

    fn update(
        &self,
        apply: &mut dyn FnMut(&mut PersistedState),
    ) -> Result<PersistedState, PersistenceError> {
        let _guard = self.lock.lock().map_err(|_| PersistenceError::LockPoisoned)?;
        let mut state = self.read()?;
        apply(&mut state);

        let json = serde_json::to_vec_pretty(&state).map_err(|error| {
            PersistenceError::Serialise {
                message: error.to_string(),
            }
        })?;
        write_atomically(&self.dir, STATE_FILE_NAME, &json, false).map_err(|error| {
            PersistenceError::Io {
                action: "write",
                path: self.path.to_string(),
                message: error.to_string(),
            }
        })?;
        debug!(path = %self.path, "persisted checker state");
        Ok(state)
    }
}
