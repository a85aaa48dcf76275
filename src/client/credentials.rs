//! Persisted session credential directory.
//!
//! The Session Client owns the format of what it stores here. The manager
//! only ever creates the root and wipes the session directory on logout.
//!
//! # Layout
//!
//! ```text
//! <root>/
//! └── session-<client_id>/   ← written by the Session Client, wiped by logout
//! ```

// ============================================================================
// Imports
// ============================================================================

use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use tempfile::TempDir;
use tracing::{debug, info};

use crate::error::{Error, Result};

// ============================================================================
// CredentialStore
// ============================================================================

/// A credential directory on durable storage.
///
/// Created with [`CredentialStore::from_path`] for persistent sessions or
/// [`CredentialStore::temporary`] for throwaway ones (deleted on drop).
pub struct CredentialStore {
    /// Optional temporary directory handle (keeps temp dir alive).
    _temp_dir: Option<TempDir>,

    /// Root directory.
    root: PathBuf,

    /// Session name inside the root.
    client_id: String,
}

impl fmt::Debug for CredentialStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CredentialStore")
            .field("root", &self.root)
            .field("client_id", &self.client_id)
            .field("temporary", &self._temp_dir.is_some())
            .finish()
    }
}

// ============================================================================
// CredentialStore - Constructors
// ============================================================================

impl CredentialStore {
    /// Uses a persistent root directory, creating it if missing.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Credentials`] if the directory cannot be created.
    pub fn from_path(root: impl Into<PathBuf>, client_id: impl Into<String>) -> Result<Self> {
        let root = root.into();

        if !root.exists() {
            fs::create_dir_all(&root).map_err(|e| Error::credentials(&root, &e))?;
            debug!(path = %root.display(), "Created credential directory");
        } else {
            debug!(path = %root.display(), "Using existing credential directory");
        }

        Ok(Self {
            _temp_dir: None,
            root,
            client_id: client_id.into(),
        })
    }

    /// Creates a temporary store, deleted when dropped.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Credentials`] if the temporary directory cannot be
    /// created.
    pub fn temporary(client_id: impl Into<String>) -> Result<Self> {
        let temp_dir = TempDir::with_prefix("session-lifecycle-")
            .map_err(|e| Error::credentials(std::env::temp_dir(), &e))?;

        let root = temp_dir.path().to_path_buf();
        debug!(path = %root.display(), "Created temporary credential directory");

        Ok(Self {
            _temp_dir: Some(temp_dir),
            root,
            client_id: client_id.into(),
        })
    }
}

// ============================================================================
// CredentialStore - Accessors
// ============================================================================

impl CredentialStore {
    /// Returns the root directory.
    #[inline]
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Returns the session name.
    #[inline]
    #[must_use]
    pub fn client_id(&self) -> &str {
        &self.client_id
    }

    /// Returns the directory holding this session's credentials.
    #[must_use]
    pub fn session_dir(&self) -> PathBuf {
        self.root.join(format!("session-{}", self.client_id))
    }

    /// Returns `true` if persisted credentials exist.
    #[must_use]
    pub fn has_session(&self) -> bool {
        self.session_dir().exists()
    }
}

// ============================================================================
// CredentialStore - Wipe
// ============================================================================

impl CredentialStore {
    /// Deletes the session directory and everything in it.
    ///
    /// A missing directory is not an error.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Credentials`] if the directory exists but cannot be
    /// removed.
    pub fn wipe(&self) -> Result<()> {
        let dir = self.session_dir();

        match fs::remove_dir_all(&dir) {
            Ok(()) => {
                info!(path = %dir.display(), "Session credentials wiped");
                Ok(())
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!(path = %dir.display(), "No session credentials to wipe");
                Ok(())
            }
            Err(e) => Err(Error::credentials(dir, &e)),
        }
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::CredentialStore;

    use std::fs;

    #[test]
    fn test_temporary_creates_directory() {
        let store = CredentialStore::temporary("test").expect("create store");
        assert!(store.root().is_dir());
        assert!(!store.has_session());
    }

    #[test]
    fn test_temporary_cleanup_on_drop() {
        let root = {
            let store = CredentialStore::temporary("test").expect("create store");
            store.root().to_path_buf()
        };
        assert!(!root.exists());
    }

    #[test]
    fn test_from_path_creates_directory() {
        let temp = tempfile::tempdir().expect("create temp dir");
        let root = temp.path().join("auth");

        assert!(!root.exists());
        let store = CredentialStore::from_path(&root, "shop").expect("create store");
        assert!(store.root().exists());
        assert_eq!(store.session_dir(), root.join("session-shop"));
    }

    #[test]
    fn test_wipe_removes_session_only() {
        let store = CredentialStore::temporary("shop").expect("create store");
        let session = store.session_dir();
        fs::create_dir_all(session.join("Default")).expect("mkdir");
        fs::write(session.join("Default").join("keys"), b"secret").expect("write");
        fs::write(store.root().join("other.txt"), b"keep").expect("write");

        assert!(store.has_session());
        store.wipe().expect("wipe");

        assert!(!store.has_session());
        assert!(store.root().join("other.txt").exists());
    }

    #[test]
    fn test_wipe_missing_session_is_ok() {
        let store = CredentialStore::temporary("shop").expect("create store");
        assert!(store.wipe().is_ok());
    }
}
