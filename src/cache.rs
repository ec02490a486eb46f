//! Persisted key-value storage and the project info cache built on it.
//!
//! The launcher host gives each invocation a fresh process, so anything worth
//! remembering between queries goes through a [`Storage`]. The production
//! store is a single JSON document on disk; tests use [`MemoryStorage`].
//!
//! [`ProjectInfoCache`] memoizes the derived metadata of every directory the
//! launcher has listed. It is loaded once per process, filled on misses and
//! written back once after the fills. There is no eviction and no expiry;
//! `source-launcher cache clear` is the only way to forget an entry.

use std::{
    collections::BTreeMap,
    io::ErrorKind,
    path::{Path, PathBuf},
};

use serde::de::DeserializeOwned;
use serde_json::{Map, Value};
use thiserror::Error;
use tracing::{debug, warn};

use crate::project::ProjectInfo;

/// Storage key holding the project info cache.
pub const PROJECTS_INFO_KEY: &str = "projectsInfo";

/// Errors raised while persisting storage.
#[derive(Error, Debug)]
pub enum StorageError {
    #[error("Failed to write storage file {}: {source}", .path.display())]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to serialize storage value: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// A persisted key-value store holding JSON values.
pub trait Storage {
    /// Fetch the value stored under `key`.
    fn get(&self, key: &str) -> Option<&Value>;

    /// Store `value` under `key` and persist it.
    ///
    /// # Errors
    ///
    /// Returns an error if the store cannot be persisted.
    fn set(&mut self, key: &str, value: Value) -> Result<(), StorageError>;

    /// Store several values and persist them together.
    ///
    /// # Errors
    ///
    /// Returns an error if the store cannot be persisted.
    fn set_many(&mut self, entries: Vec<(&str, Value)>) -> Result<(), StorageError> {
        for (key, value) in entries {
            self.set(key, value)?;
        }
        Ok(())
    }
}

/// Fetch and decode a typed value, treating undecodable data as absent.
pub fn get_typed<T: DeserializeOwned>(storage: &dyn Storage, key: &str) -> Option<T> {
    let value = storage.get(key)?;
    match serde_json::from_value(value.clone()) {
        Ok(decoded) => Some(decoded),
        Err(e) => {
            warn!("ignoring unreadable storage entry '{key}': {e}");
            None
        }
    }
}

/// In-memory [`Storage`], shared by reference between "invocations" in tests.
#[derive(Debug, Default, Clone)]
pub struct MemoryStorage {
    values: Map<String, Value>,
}

impl MemoryStorage {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl Storage for MemoryStorage {
    fn get(&self, key: &str) -> Option<&Value> {
        self.values.get(key)
    }

    fn set(&mut self, key: &str, value: Value) -> Result<(), StorageError> {
        self.values.insert(key.to_string(), value);
        Ok(())
    }
}

/// [`Storage`] backed by a single JSON object on disk.
///
/// The whole document is read when opened and rewritten on every `set`.
#[derive(Debug)]
pub struct JsonFileStorage {
    path: PathBuf,
    values: Map<String, Value>,
}

impl JsonFileStorage {
    /// Default storage location: `<cache_dir>/source-launcher/storage.json`.
    ///
    /// # Returns
    ///
    /// `None` if the platform cache directory cannot be determined.
    #[must_use]
    pub fn default_path() -> Option<PathBuf> {
        dirs::cache_dir().map(|p| p.join("source-launcher").join("storage.json"))
    }

    /// Open the store at `path`.
    ///
    /// A missing or corrupt file starts an empty store; the latter is logged
    /// and overwritten on the next write.
    #[must_use]
    pub fn open(path: &Path) -> Self {
        let values = match std::fs::read_to_string(path) {
            Ok(content) => serde_json::from_str(&content).unwrap_or_else(|e| {
                warn!("discarding corrupt storage file {}: {e}", path.display());
                Map::new()
            }),
            Err(e) if e.kind() == ErrorKind::NotFound => Map::new(),
            Err(e) => {
                warn!("cannot read storage file {}: {e}", path.display());
                Map::new()
            }
        };

        Self {
            path: path.to_path_buf(),
            values,
        }
    }

    fn persist(&self) -> Result<(), StorageError> {
        let write_err = |source| StorageError::Write {
            path: self.path.clone(),
            source,
        };

        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent).map_err(write_err)?;
        }
        let content = serde_json::to_string(&self.values)?;
        std::fs::write(&self.path, content).map_err(write_err)
    }
}

impl Storage for JsonFileStorage {
    fn get(&self, key: &str) -> Option<&Value> {
        self.values.get(key)
    }

    fn set(&mut self, key: &str, value: Value) -> Result<(), StorageError> {
        self.values.insert(key.to_string(), value);
        self.persist()
    }

    fn set_many(&mut self, entries: Vec<(&str, Value)>) -> Result<(), StorageError> {
        for (key, value) in entries {
            self.values.insert(key.to_string(), value);
        }
        self.persist()
    }
}

/// Memo of derived project metadata keyed by project path.
#[derive(Debug, Default)]
pub struct ProjectInfoCache {
    entries: BTreeMap<String, ProjectInfo>,
    dirty: bool,
}

impl ProjectInfoCache {
    /// Load the cache from storage; absent or unreadable data starts empty.
    #[must_use]
    pub fn load(storage: &dyn Storage) -> Self {
        let entries = get_typed(storage, PROJECTS_INFO_KEY).unwrap_or_default();
        Self {
            entries,
            dirty: false,
        }
    }

    /// Cached info for `path`, if any.
    #[must_use]
    pub fn get(&self, path: &Path) -> Option<&ProjectInfo> {
        self.entries.get(&Self::key(path))
    }

    /// Record the info derived for `path`.
    pub fn put(&mut self, path: &Path, info: ProjectInfo) {
        self.entries.insert(Self::key(path), info);
        self.dirty = true;
    }

    /// Number of cached paths.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Encode the cache for writing under [`PROJECTS_INFO_KEY`] if anything
    /// was added since loading, and mark it clean.
    ///
    /// # Errors
    ///
    /// Returns an error if the entries cannot be serialized.
    pub fn take_pending(&mut self) -> Result<Option<Value>, StorageError> {
        if !self.dirty {
            return Ok(None);
        }
        debug!(entries = self.entries.len(), "saving project info cache");
        let value = serde_json::to_value(&self.entries)?;
        self.dirty = false;
        Ok(Some(value))
    }

    fn key(path: &Path) -> String {
        path.to_string_lossy().into_owned()
    }
}
