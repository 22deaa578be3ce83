//! Durable key-value storage for the bearer token and user record.
//!
//! The store is deliberately dumb: get, set, remove. [`TokenStore`] layers the
//! two fixed keys on top and is the only type the rest of the client touches.

use std::collections::BTreeMap;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::{Arc, RwLock};

use secrecy::{ExposeSecret, SecretString};
use thiserror::Error;
use tracing::debug;

use crate::models::User;

/// Storage keys.
pub mod keys {
    /// Bearer token issued at login/register.
    pub const ACCESS_TOKEN: &str = "accessToken";
    /// JSON-serialized [`crate::models::User`].
    pub const USER: &str = "user";
}

/// Errors raised by a [`KeyValueStore`].
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("stored value for {key} is corrupt: {message}")]
    Corrupt { key: String, message: String },
    #[error("store lock poisoned")]
    Poisoned,
}

/// A durable string-to-string map.
pub trait KeyValueStore: Send + Sync {
    /// Read a value.
    ///
    /// # Errors
    ///
    /// Returns `StoreError` if the backing storage cannot be read.
    fn get(&self, key: &str) -> Result<Option<String>, StoreError>;

    /// Write a value, replacing any previous one.
    ///
    /// # Errors
    ///
    /// Returns `StoreError` if the backing storage cannot be written.
    fn set(&self, key: &str, value: &str) -> Result<(), StoreError>;

    /// Remove a value. Removing a missing key is not an error.
    ///
    /// # Errors
    ///
    /// Returns `StoreError` if the backing storage cannot be written.
    fn remove(&self, key: &str) -> Result<(), StoreError>;
}

/// Process-local store. Nothing survives a restart.
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: RwLock<BTreeMap<String, String>>,
}

impl MemoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        let entries = self.entries.read().map_err(|_| StoreError::Poisoned)?;
        Ok(entries.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StoreError> {
        self.entries
            .write()
            .map_err(|_| StoreError::Poisoned)?
            .insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), StoreError> {
        self.entries
            .write()
            .map_err(|_| StoreError::Poisoned)?
            .remove(key);
        Ok(())
    }
}

/// Store backed by a single JSON object on disk.
///
/// The whole map is rewritten on every change; parent directories are created
/// on first write.
#[derive(Debug)]
pub struct FileStore {
    path: PathBuf,
    entries: RwLock<BTreeMap<String, String>>,
}

impl FileStore {
    /// Open the store at `path`, loading existing entries. A missing file is
    /// an empty store.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::Io` if the file exists but cannot be read, or
    /// `StoreError::Corrupt` if it is not a JSON object of strings.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let path = path.into();
        let entries = match fs::read_to_string(&path) {
            Ok(contents) if contents.trim().is_empty() => BTreeMap::new(),
            Ok(contents) => serde_json::from_str(&contents).map_err(|e| StoreError::Corrupt {
                key: path.display().to_string(),
                message: e.to_string(),
            })?,
            Err(e) if e.kind() == ErrorKind::NotFound => BTreeMap::new(),
            Err(source) => return Err(StoreError::Io { path, source }),
        };
        debug!(path = %path.display(), keys = entries.len(), "Opened session file");

        Ok(Self {
            path,
            entries: RwLock::new(entries),
        })
    }

    /// Location of the backing file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn flush(&self, entries: &BTreeMap<String, String>) -> Result<(), StoreError> {
        let io_err = |source| StoreError::Io {
            path: self.path.clone(),
            source,
        };
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(io_err)?;
        }
        let contents = serde_json::to_string_pretty(entries).map_err(|e| StoreError::Corrupt {
            key: self.path.display().to_string(),
            message: e.to_string(),
        })?;
        fs::write(&self.path, contents).map_err(io_err)
    }
}

impl KeyValueStore for FileStore {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        let entries = self.entries.read().map_err(|_| StoreError::Poisoned)?;
        Ok(entries.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StoreError> {
        let mut entries = self.entries.write().map_err(|_| StoreError::Poisoned)?;
        entries.insert(key.to_string(), value.to_string());
        self.flush(&entries)
    }

    fn remove(&self, key: &str) -> Result<(), StoreError> {
        let mut entries = self.entries.write().map_err(|_| StoreError::Poisoned)?;
        if entries.remove(key).is_some() {
            self.flush(&entries)?;
        }
        Ok(())
    }
}

/// Typed view over a [`KeyValueStore`] holding the session token and user.
///
/// Cheap to clone; clones share the same backing store.
#[derive(Clone)]
pub struct TokenStore {
    inner: Arc<dyn KeyValueStore>,
}

impl std::fmt::Debug for TokenStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenStore").finish_non_exhaustive()
    }
}

impl TokenStore {
    pub fn new(store: impl KeyValueStore + 'static) -> Self {
        Self {
            inner: Arc::new(store),
        }
    }

    /// Wrap a store that is also held elsewhere.
    #[must_use]
    pub fn from_shared(store: Arc<dyn KeyValueStore>) -> Self {
        Self { inner: store }
    }

    /// A store that forgets everything when dropped.
    #[must_use]
    pub fn in_memory() -> Self {
        Self::new(MemoryStore::new())
    }

    /// The stored bearer token, if any.
    ///
    /// # Errors
    ///
    /// Returns `StoreError` if the backing store fails.
    pub fn token(&self) -> Result<Option<SecretString>, StoreError> {
        Ok(self
            .inner
            .get(keys::ACCESS_TOKEN)?
            .filter(|t| !t.is_empty())
            .map(SecretString::from))
    }

    /// The stored user record, if any.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::Corrupt` if the stored record does not parse.
    pub fn user(&self) -> Result<Option<User>, StoreError> {
        self.inner
            .get(keys::USER)?
            .map(|raw| {
                serde_json::from_str(&raw).map_err(|e| StoreError::Corrupt {
                    key: keys::USER.to_string(),
                    message: e.to_string(),
                })
            })
            .transpose()
    }

    /// Persist a freshly issued token together with its user.
    ///
    /// # Errors
    ///
    /// Returns `StoreError` if either write fails; a failed write leaves
    /// neither key behind.
    pub fn save(&self, token: &SecretString, user: &User) -> Result<(), StoreError> {
        let user_json = serde_json::to_string(user).map_err(|e| StoreError::Corrupt {
            key: keys::USER.to_string(),
            message: e.to_string(),
        })?;
        let written = self
            .inner
            .set(keys::ACCESS_TOKEN, token.expose_secret())
            .and_then(|()| self.inner.set(keys::USER, &user_json));
        if written.is_err() {
            let _ = self.clear();
        }
        written
    }

    /// Remove both keys.
    ///
    /// # Errors
    ///
    /// Returns `StoreError` if the backing store fails. Both removals are
    /// attempted regardless.
    pub fn clear(&self) -> Result<(), StoreError> {
        let token = self.inner.remove(keys::ACCESS_TOKEN);
        let user = self.inner.remove(keys::USER);
        token.and(user)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use secrecy::ExposeSecret;

    use super::*;
    use crate::testing::customer;

    #[test]
    fn test_memory_store_roundtrip() {
        let store = MemoryStore::new();
        assert_eq!(store.get("k").unwrap(), None);
        store.set("k", "v").unwrap();
        assert_eq!(store.get("k").unwrap().as_deref(), Some("v"));
        store.remove("k").unwrap();
        store.remove("k").unwrap();
        assert_eq!(store.get("k").unwrap(), None);
    }

    #[test]
    fn test_file_store_persists_across_opens() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("session.json");

        let store = FileStore::open(&path).unwrap();
        store.set(keys::ACCESS_TOKEN, "tok").unwrap();
        drop(store);

        let reopened = FileStore::open(&path).unwrap();
        assert_eq!(
            reopened.get(keys::ACCESS_TOKEN).unwrap().as_deref(),
            Some("tok")
        );
        reopened.remove(keys::ACCESS_TOKEN).unwrap();
        assert_eq!(FileStore::open(&path).unwrap().get(keys::ACCESS_TOKEN).unwrap(), None);
    }

    #[test]
    fn test_file_store_rejects_garbage() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("session.json");
        fs::write(&path, "not json").unwrap();
        assert!(matches!(FileStore::open(&path), Err(StoreError::Corrupt { .. })));
    }

    #[test]
    fn test_token_store_uses_fixed_keys() {
        let backing = Arc::new(MemoryStore::new());
        let store = TokenStore::from_shared(backing.clone());
        let user = customer(7);
        store.save(&SecretString::from("abc"), &user).unwrap();

        assert_eq!(backing.get("accessToken").unwrap().as_deref(), Some("abc"));
        assert!(backing.get("user").unwrap().unwrap().contains("\"username\""));
        assert_eq!(store.token().unwrap().unwrap().expose_secret(), "abc");
        assert_eq!(store.user().unwrap(), Some(user));

        store.clear().unwrap();
        assert!(store.token().unwrap().is_none());
        assert!(store.user().unwrap().is_none());
    }

    #[test]
    fn test_corrupt_user_is_reported() {
        let store = TokenStore::in_memory();
        store.inner.set(keys::USER, "{").unwrap();
        assert!(matches!(store.user(), Err(StoreError::Corrupt { .. })));
    }
}
