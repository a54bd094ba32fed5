//! Typed JSON adapter over the key-value table
//!
//! Reads never fail: a missing or corrupt entry yields the caller's default.
//! Writes never fail either: errors are logged and reported as `false`.

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::database::Database;
use crate::error::StorageError;
use crate::Result;

/// Total budget for all entries, matching a typical browser local store.
pub const DEFAULT_QUOTA_BYTES: usize = 5 * 1024 * 1024;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StoreKey {
    Bookmarks,
    Folders,
    Settings,
    Session,
}

impl StoreKey {
    pub const ALL: [StoreKey; 4] = [
        StoreKey::Bookmarks,
        StoreKey::Folders,
        StoreKey::Settings,
        StoreKey::Session,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            StoreKey::Bookmarks => "bookmarks",
            StoreKey::Folders => "folders",
            StoreKey::Settings => "settings",
            StoreKey::Session => "session",
        }
    }
}

impl std::fmt::Display for StoreKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Clone)]
pub struct Store {
    db: Database,
    quota_bytes: Option<usize>,
}

impl Store {
    pub fn new(db: Database) -> Self {
        Self {
            db,
            quota_bytes: Some(DEFAULT_QUOTA_BYTES),
        }
    }

    /// Override the total size budget; `None` disables the check.
    pub fn with_quota(mut self, quota_bytes: Option<usize>) -> Self {
        self.quota_bytes = quota_bytes;
        self
    }

    pub fn open_in_memory() -> Result<Self> {
        Ok(Self::new(Database::open_in_memory()?))
    }

    pub fn database(&self) -> &Database {
        &self.db
    }

    /// Read and parse an entry. Absent, unreadable, or corrupt entries yield `None`.
    pub fn load<T: DeserializeOwned>(&self, key: StoreKey) -> Option<T> {
        let raw = match self.db.get_value(key.as_str()) {
            Ok(Some(raw)) => raw,
            Ok(None) => return None,
            Err(e) => {
                tracing::warn!(key = %key, error = %e, "Failed to read stored entry");
                return None;
            }
        };

        match serde_json::from_str(&raw) {
            Ok(value) => Some(value),
            Err(e) => {
                tracing::warn!(key = %key, error = %e, "Discarding corrupt stored entry");
                None
            }
        }
    }

    pub fn load_or_default<T: DeserializeOwned + Default>(&self, key: StoreKey) -> T {
        self.load(key).unwrap_or_default()
    }

    pub fn load_or_else<T, F>(&self, key: StoreKey, default: F) -> T
    where
        T: DeserializeOwned,
        F: FnOnce() -> T,
    {
        self.load(key).unwrap_or_else(default)
    }

    /// Serialize and write an entry. Returns whether the write landed.
    pub fn save<T: Serialize + ?Sized>(&self, key: StoreKey, value: &T) -> bool {
        match self.try_save(key, value) {
            Ok(()) => true,
            Err(e) => {
                tracing::error!(key = %key, error = %e, "Failed to persist entry");
                false
            }
        }
    }

    fn try_save<T: Serialize + ?Sized>(&self, key: StoreKey, value: &T) -> Result<()> {
        let serialized = serde_json::to_string(value)?;

        if let Some(quota) = self.quota_bytes {
            let requested = self.db.size_excluding(key.as_str())?
                + key.as_str().len()
                + serialized.len();
            if requested > quota {
                return Err(StorageError::QuotaExceeded { requested, quota });
            }
        }

        self.db.set_value(key.as_str(), &serialized)
    }

    pub fn remove(&self, key: StoreKey) -> bool {
        match self.db.remove_value(key.as_str()) {
            Ok(()) => true,
            Err(e) => {
                tracing::error!(key = %key, error = %e, "Failed to remove entry");
                false
            }
        }
    }

    /// Drop every known key.
    pub fn clear_all(&self) -> bool {
        let keys: Vec<&str> = StoreKey::ALL.iter().map(StoreKey::as_str).collect();
        match self.db.remove_values(&keys) {
            Ok(()) => true,
            Err(e) => {
                tracing::error!(error = %e, "Failed to clear storage");
                false
            }
        }
    }

    /// Drop browsing traces (the saved session). Bookmarks, folders and
    /// settings are kept.
    pub fn clear_browsing_data(&self) -> bool {
        self.remove(StoreKey::Session)
    }
}
