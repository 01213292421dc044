//! Bearer-token storage keyed by how the token was obtained.

use std::collections::BTreeMap;
use std::io::ErrorKind;
use std::sync::Mutex;

use camino::{Utf8Path, Utf8PathBuf};
use cap_std::ambient_authority;
use cap_std::fs_utf8::Dir;
use serde::{Deserialize, Serialize};

use super::error::SecretStoreError;
use crate::github::locator::BearerToken;
use crate::persistence::write_atomically;

/// File name of the credential document.
pub const CREDENTIALS_FILE_NAME: &str = "credentials.json";

/// How a stored token was obtained.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuthMethod {
    /// A personal access token supplied by the user.
    PersonalAccessToken,
    /// A token issued by the OAuth device flow.
    DeviceFlow,
}

impl AuthMethod {
    /// Lookup order when any stored token will do.
    pub const PREFERENCE: [Self; 2] = [Self::DeviceFlow, Self::PersonalAccessToken];

    /// Returns the `snake_case` name of this method.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::PersonalAccessToken => "personal_access_token",
            Self::DeviceFlow => "device_flow",
        }
    }
}

/// Storage for bearer tokens.
pub trait SecretStore: Send + Sync {
    /// Reads the token stored for `method`.
    ///
    /// # Errors
    ///
    /// Returns [`SecretStoreError`] when the store cannot be read.
    fn get(&self, method: AuthMethod) -> Result<Option<BearerToken>, SecretStoreError>;

    /// Stores `token` for `method`, replacing any previous token.
    ///
    /// # Errors
    ///
    /// Returns [`SecretStoreError`] when the store cannot be written.
    fn set(&self, method: AuthMethod, token: &BearerToken) -> Result<(), SecretStoreError>;

    /// Removes the token for `method`, returning whether one was stored.
    ///
    /// # Errors
    ///
    /// Returns [`SecretStoreError`] when the store cannot be written.
    fn delete(&self, method: AuthMethod) -> Result<bool, SecretStoreError>;

    /// Returns the first stored token in [`AuthMethod::PREFERENCE`] order.
    ///
    /// # Errors
    ///
    /// Returns [`SecretStoreError`] when the store cannot be read.
    fn preferred(&self) -> Result<Option<(AuthMethod, BearerToken)>, SecretStoreError> {
        for method in AuthMethod::PREFERENCE {
            if let Some(token) = self.get(method)? {
                return Ok(Some((method, token)));
            }
        }
        Ok(None)
    }
}

type TokenMap = BTreeMap<AuthMethod, String>;

/// Stores tokens in an owner-only JSON file.
#[derive(Debug)]
pub struct FileSecretStore {
    dir: Dir,
    path: Utf8PathBuf,
    lock: Mutex<()>,
}

impl FileSecretStore {
    /// Opens the store in `dir_path`, creating the directory when needed.
    ///
    /// # Errors
    ///
    /// Returns [`SecretStoreError::OpenDirectory`] when the directory cannot
    /// be created or opened.
    pub fn open(dir_path: &Utf8Path) -> Result<Self, SecretStoreError> {
        let open_error = |error: std::io::Error| SecretStoreError::OpenDirectory {
            path: dir_path.to_string(),
            message: error.to_string(),
        };
        Dir::create_ambient_dir_all(dir_path, ambient_authority()).map_err(open_error)?;
        let dir = Dir::open_ambient_dir(dir_path, ambient_authority()).map_err(open_error)?;
        Ok(Self {
            dir,
            path: dir_path.join(CREDENTIALS_FILE_NAME),
            lock: Mutex::new(()),
        })
    }

    fn read(&self) -> Result<TokenMap, SecretStoreError> {
        match self.dir.read_to_string(CREDENTIALS_FILE_NAME) {
            Ok(content) => {
                serde_json::from_str(&content).map_err(|error| SecretStoreError::Corrupt {
                    path: self.path.to_string(),
                    message: error.to_string(),
                })
            }
            Err(error) if error.kind() == ErrorKind::NotFound => Ok(TokenMap::new()),
            Err(error) => Err(SecretStoreError::Io {
                action: "read",
                path: self.path.to_string(),
                message: error.to_string(),
            }),
        }
    }

    fn write(&self, tokens: &TokenMap) -> Result<(), SecretStoreError> {
        let json = serde_json::to_vec_pretty(tokens).map_err(|error| SecretStoreError::Corrupt {
            path: self.path.to_string(),
            message: error.to_string(),
        })?;
        write_atomically(&self.dir, CREDENTIALS_FILE_NAME, &json, true).map_err(|error| {
            SecretStoreError::Io {
                action: "write",
                path: self.path.to_string(),
                message: error.to_string(),
            }
        })
    }
}

impl SecretStore for FileSecretStore {
    fn get(&self, method: AuthMethod) -> Result<Option<BearerToken>, SecretStoreError> {
        let _guard = self.lock.lock().map_err(|_| SecretStoreError::LockPoisoned)?;
        let tokens = self.read()?;
        tokens
            .get(&method)
            .map(|value| {
                BearerToken::new(value).map_err(|error| SecretStoreError::Corrupt {
                    path: self.path.to_string(),
                    message: format!("{}: {error}", method.as_str()),
                })
            })
            .transpose()
    }

    fn set(&self, method: AuthMethod, token: &BearerToken) -> Result<(), SecretStoreError> {
        let _guard = self.lock.lock().map_err(|_| SecretStoreError::LockPoisoned)?;
        let mut tokens = self.read()?;
        tokens.insert(method, token.value().to_owned());
        self.write(&tokens)
    }

    fn delete(&self, method: AuthMethod) -> Result<bool, SecretStoreError> {
        let _guard = self.lock.lock().map_err(|_| SecretStoreError::LockPoisoned)?;
        let mut tokens = self.read()?;
        if tokens.remove(&method).is_none() {
            return Ok(false);
        }
        self.write(&tokens)?;
        Ok(true)
    }
}

/// Keeps tokens in memory only.
#[derive(Debug, Default)]
pub struct MemorySecretStore {
    tokens: Mutex<BTreeMap<AuthMethod, BearerToken>>,
}

impl SecretStore for MemorySecretStore {
    fn get(&self, method: AuthMethod) -> Result<Option<BearerToken>, SecretStoreError> {
        self.tokens
            .lock()
            .map(|tokens| tokens.get(&method).cloned())
            .map_err(|_| SecretStoreError::LockPoisoned)
    }

    fn set(&self, method: AuthMethod, token: &BearerToken) -> Result<(), SecretStoreError> {
        self.tokens
            .lock()
            .map(|mut tokens| {
                tokens.insert(method, token.clone());
            })
            .map_err(|_| SecretStoreError::LockPoisoned)
    }

    fn delete(&self, method: AuthMethod) -> Result<bool, SecretStoreError> {
        self.tokens
            .lock()
            .map(|mut tokens| tokens.remove(&method).is_some())
            .map_err(|_| SecretStoreError::LockPoisoned)
    }
}

#[cfg(test)]
mod tests {
    use camino::Utf8PathBuf;
    use rstest::rstest;
    use tempfile::TempDir;

    use super::{AuthMethod, FileSecretStore, MemorySecretStore, SecretStore};
    use crate::github::locator::BearerToken;

    fn token(value: &str) -> BearerToken {
        BearerToken::new(value).expect("token should be valid")
    }

    fn exercise(store: &dyn SecretStore) {
        assert_eq!(store.preferred().expect("read"), None);

        store
            .set(AuthMethod::PersonalAccessToken, &token("pat"))
            .expect("set pat");
        store
            .set(AuthMethod::DeviceFlow, &token("oauth"))
            .expect("set device");

        let (method, preferred) = store.preferred().expect("read").expect("token stored");
        assert_eq!(method, AuthMethod::DeviceFlow);
        assert_eq!(preferred.value(), "oauth");

        assert!(store.delete(AuthMethod::DeviceFlow).expect("delete"));
        assert!(!store.delete(AuthMethod::DeviceFlow).expect("second delete"));
        assert_eq!(
            store
                .get(AuthMethod::PersonalAccessToken)
                .expect("read")
                .map(|stored| stored.value().to_owned()),
            Some("pat".to_owned())
        );
    }

    #[rstest]
    fn memory_store_round_trip() {
        exercise(&MemorySecretStore::default());
    }

    #[rstest]
    fn file_store_round_trip_and_reopen() {
        let temp = TempDir::new().expect("temp dir");
        let dir = Utf8PathBuf::from_path_buf(temp.path().join("creds")).expect("utf-8 path");

        exercise(&FileSecretStore::open(&dir).expect("open store"));

        let reopened = FileSecretStore::open(&dir).expect("reopen store");
        assert!(
            reopened
                .get(AuthMethod::PersonalAccessToken)
                .expect("read")
                .is_some()
        );
        assert!(reopened.get(AuthMethod::DeviceFlow).expect("read").is_none());
    }
}
