use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use crate::error::StorageError;

// 1. TokenStorage Contract
/// TokenStorage
///
/// Abstract contract for the one durable value the client keeps: the session
/// token under a single key. Absence means an anonymous session.
///
/// Only `SessionStore::set_token` writes through this trait, which keeps the
/// in-memory token and the persisted one from drifting apart.
pub trait TokenStorage: Send + Sync {
    /// Returns the persisted token, or `None` when nothing is stored.
    fn load(&self) -> Result<Option<String>, StorageError>;

    /// Persists `token`, replacing any previous value.
    fn store(&self, token: &str) -> Result<(), StorageError>;

    /// Removes the persisted token. Removing an absent token is not an error.
    fn clear(&self) -> Result<(), StorageError>;
}

// 2. The Real Implementation (file on disk)
/// FileTokenStorage
///
/// Keeps the token as the sole contents of one file. Parent directories are
/// created on first write.
#[derive(Clone, Debug)]
pub struct FileTokenStorage {
    path: PathBuf,
}

impl FileTokenStorage {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl TokenStorage for FileTokenStorage {
    fn load(&self) -> Result<Option<String>, StorageError> {
        match fs::read_to_string(&self.path) {
            Ok(contents) => {
                let token = contents.trim();
                Ok((!token.is_empty()).then(|| token.to_string()))
            }
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn store(&self, token: &str) -> Result<(), StorageError> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        fs::write(&self.path, token)?;
        Ok(())
    }

    fn clear(&self) -> Result<(), StorageError> {
        match fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

// 3. The Mock Implementation (For Tests)
/// MockTokenStorage
///
/// In-memory stand-in for `FileTokenStorage`. Counts writes so tests can check
/// that every token change went through storage exactly once.
#[derive(Default)]
pub struct MockTokenStorage {
    token: Mutex<Option<String>>,
    writes: Mutex<usize>,
    /// When true, every operation returns a simulated failure.
    pub should_fail: bool,
}

impl MockTokenStorage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_token(token: &str) -> Self {
        Self {
            token: Mutex::new(Some(token.to_string())),
            ..Self::default()
        }
    }

    pub fn new_failing() -> Self {
        Self {
            should_fail: true,
            ..Self::default()
        }
    }

    /// Current persisted value, bypassing the failure switch.
    pub fn peek(&self) -> Option<String> {
        self.token.lock().map(|t| t.clone()).unwrap_or(None)
    }

    /// Number of `store`/`clear` calls that reached this storage.
    pub fn write_count(&self) -> usize {
        self.writes.lock().map(|w| *w).unwrap_or(0)
    }

    fn fail_if_requested(&self) -> Result<(), StorageError> {
        if self.should_fail {
            return Err(StorageError::Unavailable(
                "Mock Storage Error: Simulation requested".to_string(),
            ));
        }
        Ok(())
    }

    fn write(&self, value: Option<String>) -> Result<(), StorageError> {
        if let Ok(mut writes) = self.writes.lock() {
            *writes += 1;
        }
        self.fail_if_requested()?;
        let mut slot = self
            .token
            .lock()
            .map_err(|_| StorageError::Unavailable("mock storage poisoned".to_string()))?;
        *slot = value;
        Ok(())
    }
}

impl TokenStorage for MockTokenStorage {
    fn load(&self) -> Result<Option<String>, StorageError> {
        self.fail_if_requested()?;
        Ok(self.peek())
    }

    fn store(&self, token: &str) -> Result<(), StorageError> {
        self.write(Some(token.to_string()))
    }

    fn clear(&self) -> Result<(), StorageError> {
        self.write(None)
    }
}

/// TokenStore
///
/// The concrete type used to share token persistence across components.
pub type TokenStore = Arc<dyn TokenStorage>;
