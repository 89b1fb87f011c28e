//! Access token persistence.
//!
//! The token store holds the single OAuth access token that survives page
//! loads. It is backed by a JSON file written atomically, cached in memory
//! for synchronous reads, and broadcasts every change on a watch channel so
//! other live instances (other tabs, widgets) observe token changes through
//! an explicit event channel instead of ambient storage signaling.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::RwLock;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::watch;
use tracing::{debug, info};

use crate::error::{AuthError, AuthResult};

/// The persisted token record.
///
/// The token itself is opaque: it is never interpreted, only forwarded as a
/// bearer credential. `stored_at` exists for diagnostics only.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoredToken {
    /// The access token for downstream API requests.
    pub access_token: String,

    /// When the token was persisted.
    pub stored_at: DateTime<Utc>,
}

impl StoredToken {
    /// Creates a record for a freshly issued token.
    pub fn new(access_token: impl Into<String>) -> Self {
        Self {
            access_token: access_token.into(),
            stored_at: Utc::now(),
        }
    }
}

/// Durable single-token storage with a change broadcast.
///
/// Reads are synchronous and side-effect-free (in-memory cache); writes
/// persist to disk first and then publish the new value to subscribers.
#[derive(Debug)]
pub struct TokenStore {
    /// Path to the token file.
    path: PathBuf,

    /// In-memory cache of the current token.
    token: RwLock<Option<StoredToken>>,

    /// Broadcasts the current access token to subscribers on every change.
    changes: watch::Sender<Option<String>>,
}

impl TokenStore {
    /// Creates a new token store at the given path.
    ///
    /// The file is not read until [`load`](Self::load) is called.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        let (changes, _) = watch::channel(None);
        Self {
            path: path.into(),
            token: RwLock::new(None),
            changes,
        }
    }

    /// Loads the token from disk into memory.
    ///
    /// Returns Ok(true) if a token was loaded, Ok(false) if none exists.
    pub fn load(&self) -> AuthResult<bool> {
        if !self.path.exists() {
            debug!("no token file at {:?}", self.path);
            return Ok(false);
        }

        let content = fs::read_to_string(&self.path)
            .map_err(|e| AuthError::storage(format!("failed to read token file: {}", e)))?;

        let token: StoredToken = serde_json::from_str(&content)
            .map_err(|e| AuthError::storage(format!("failed to parse token file: {}", e)))?;

        info!("restored access token from {:?}", self.path);
        let value = token.access_token.clone();
        *self.token.write().unwrap() = Some(token);
        self.changes.send_replace(Some(value));
        Ok(true)
    }

    /// Returns the current access token, if any.
    pub fn get(&self) -> Option<String> {
        self.token
            .read()
            .unwrap()
            .as_ref()
            .map(|t| t.access_token.clone())
    }

    /// Persists a new access token and notifies subscribers.
    pub fn set(&self, access_token: impl Into<String>) -> AuthResult<()> {
        let record = StoredToken::new(access_token);
        let value = record.access_token.clone();
        *self.token.write().unwrap() = Some(record);
        self.save()?;
        self.changes.send_replace(Some(value));
        Ok(())
    }

    /// Clears the stored token (both in memory and on disk) and notifies
    /// subscribers.
    pub fn clear(&self) -> AuthResult<()> {
        *self.token.write().unwrap() = None;
        if self.path.exists() {
            fs::remove_file(&self.path)
                .map_err(|e| AuthError::storage(format!("failed to remove token file: {}", e)))?;
            info!("cleared access token at {:?}", self.path);
        }
        self.changes.send_replace(None);
        Ok(())
    }

    /// Subscribes to token changes.
    ///
    /// The receiver's current value is the access token at subscription
    /// time; every subsequent `set`/`clear` publishes a new value.
    pub fn subscribe(&self) -> watch::Receiver<Option<String>> {
        self.changes.subscribe()
    }

    /// Returns the token storage path.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Saves the current token to disk.
    fn save(&self) -> AuthResult<()> {
        let token = self.token.read().unwrap();
        let token = token
            .as_ref()
            .ok_or_else(|| AuthError::internal("no token to save"))?;

        // Ensure parent directory exists
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).map_err(|e| {
                AuthError::storage(format!("failed to create token directory: {}", e))
            })?;
        }

        // Write to temp file first, then rename for atomicity
        let temp_path = self.path.with_extension("json.tmp");
        let content = serde_json::to_string_pretty(token)
            .map_err(|e| AuthError::internal(format!("failed to serialize token: {}", e)))?;

        fs::write(&temp_path, &content)
            .map_err(|e| AuthError::storage(format!("failed to write token file: {}", e)))?;

        fs::rename(&temp_path, &self.path)
            .map_err(|e| AuthError::storage(format!("failed to rename token file: {}", e)))?;

        // Set restrictive permissions on Unix
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let perms = fs::Permissions::from_mode(0o600);
            let _ = fs::set_permissions(&self.path, perms);
        }

        debug!("saved access token to {:?}", self.path);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_store() -> (tempfile::TempDir, TokenStore) {
        let dir = tempfile::tempdir().unwrap();
        let store = TokenStore::new(dir.path().join("token.json"));
        (dir, store)
    }

    #[test]
    fn set_and_get() {
        let (_dir, store) = temp_store();
        store.set("tok123").unwrap();
        assert_eq!(store.get(), Some("tok123".to_string()));
        assert!(store.path().exists());
    }

    #[test]
    fn load_restores_persisted_token() {
        let (_dir, store) = temp_store();
        store.set("tok123").unwrap();

        let store2 = TokenStore::new(store.path());
        assert!(store2.load().unwrap());
        assert_eq!(store2.get(), Some("tok123".to_string()));
    }

    #[test]
    fn clear_removes_file_and_cache() {
        let (_dir, store) = temp_store();
        store.set("tok123").unwrap();
        assert!(store.path().exists());

        store.clear().unwrap();
        assert!(!store.path().exists());
        assert!(store.get().is_none());
    }

    #[test]
    fn clear_without_file_is_ok() {
        let (_dir, store) = temp_store();
        store.clear().unwrap();
        assert!(store.get().is_none());
    }

    #[test]
    fn load_without_file_returns_false() {
        let (_dir, store) = temp_store();
        assert!(!store.load().unwrap());
        assert!(store.get().is_none());
    }

    #[test]
    fn load_rejects_malformed_file() {
        let (_dir, store) = temp_store();
        fs::write(store.path(), "not json").unwrap();
        assert!(store.load().is_err());
    }

    #[test]
    fn subscribers_observe_changes() {
        let (_dir, store) = temp_store();
        let mut rx = store.subscribe();
        assert_eq!(*rx.borrow(), None);

        store.set("tok123").unwrap();
        assert!(rx.has_changed().unwrap());
        assert_eq!(*rx.borrow_and_update(), Some("tok123".to_string()));

        store.clear().unwrap();
        assert!(rx.has_changed().unwrap());
        assert_eq!(*rx.borrow_and_update(), None);
    }

    #[cfg(unix)]
    #[test]
    fn token_file_is_private() {
        use std::os::unix::fs::PermissionsExt;

        let (_dir, store) = temp_store();
        store.set("tok123").unwrap();

        let mode = fs::metadata(store.path()).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o600);
    }
}
