//! Flat key-value persistence of JSON-encoded values.
//!
//! Every entity lives under its own key and is written independently. There
//! is no cross-key atomicity: a crash between two related writes (say,
//! challenges then points) can leave them out of step.

use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;

use meteoros_core::{RusqliteErrorExt, StorageError};
use parking_lot::Mutex;
use rusqlite::{params, Connection, OptionalExtension};
use serde::de::DeserializeOwned;
use serde::Serialize;

/// Keys under which each entity is stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StorageKey {
    Settings,
    SavedLocations,
    Challenges,
    TotalPoints,
    Notes,
    OnboardingCompleted,
    LastSearchedCity,
}

impl StorageKey {
    pub const ALL: [StorageKey; 7] = [
        StorageKey::Settings,
        StorageKey::SavedLocations,
        StorageKey::Challenges,
        StorageKey::TotalPoints,
        StorageKey::Notes,
        StorageKey::OnboardingCompleted,
        StorageKey::LastSearchedCity,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            StorageKey::Settings => "appSettings",
            StorageKey::SavedLocations => "savedLocations",
            StorageKey::Challenges => "weatherChallenges",
            StorageKey::TotalPoints => "totalPoints",
            StorageKey::Notes => "weatherNotes",
            StorageKey::OnboardingCompleted => "hasCompletedOnboarding",
            StorageKey::LastSearchedCity => "lastSearchedCity",
        }
    }
}

/// Raw string-to-string storage backend.
pub trait KeyValueStore: Send + Sync {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError>;

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError>;

    /// Removing a missing key is not an error.
    fn remove(&self, key: &str) -> Result<(), StorageError>;
}

/// SQLite-backed store: one `kv` table.
pub struct SqliteKvStore {
    conn: Mutex<Connection>,
}

impl SqliteKvStore {
    /// Open (or create) the store at `path`, creating parent directories.
    pub fn new<P: AsRef<Path>>(path: P) -> Result<Self, StorageError> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .map_err(|e| StorageError::Open(format!("{}: {}", parent.display(), e)))?;
        }

        let conn = Connection::open(path).map_err(RusqliteErrorExt::into_storage_error)?;
        let store = Self {
            conn: Mutex::new(conn),
        };
        store.init_schema()?;
        tracing::debug!("Opened key-value store at {}", path.display());
        Ok(store)
    }

    /// Create an in-memory store (for testing).
    #[cfg(test)]
    pub fn in_memory() -> Result<Self, StorageError> {
        let conn = Connection::open_in_memory().map_err(RusqliteErrorExt::into_storage_error)?;
        let store = Self {
            conn: Mutex::new(conn),
        };
        store.init_schema()?;
        Ok(store)
    }

    fn init_schema(&self) -> Result<(), StorageError> {
        self.conn
            .lock()
            .execute_batch(
                r#"
                CREATE TABLE IF NOT EXISTS kv (
                    key TEXT PRIMARY KEY,
                    value TEXT NOT NULL
                );
                "#,
            )
            .map_err(RusqliteErrorExt::into_storage_error)
    }
}

impl KeyValueStore for SqliteKvStore {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        self.conn
            .lock()
            .query_row("SELECT value FROM kv WHERE key = ?1", params![key], |row| {
                row.get(0)
            })
            .optional()
            .map_err(RusqliteErrorExt::into_storage_error)
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        self.conn
            .lock()
            .execute(
                "INSERT OR REPLACE INTO kv (key, value) VALUES (?1, ?2)",
                params![key, value],
            )
            .map_err(RusqliteErrorExt::into_storage_error)?;
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), StorageError> {
        self.conn
            .lock()
            .execute("DELETE FROM kv WHERE key = ?1", params![key])
            .map_err(RusqliteErrorExt::into_storage_error)?;
        Ok(())
    }
}

/// Process-local store, used by tests and headless runs.
#[derive(Default)]
pub struct MemoryKvStore {
    entries: Mutex<HashMap<String, String>>,
}

impl MemoryKvStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyValueStore for MemoryKvStore {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        Ok(self.entries.lock().get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        self.entries.lock().insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), StorageError> {
        self.entries.lock().remove(key);
        Ok(())
    }
}

/// Memory store whose next `n` reads fail.
#[cfg(test)]
#[derive(Default)]
pub(crate) struct FlakyKvStore {
    inner: MemoryKvStore,
    failing_reads: std::sync::atomic::AtomicUsize,
}

#[cfg(test)]
impl FlakyKvStore {
    pub(crate) fn fail_next_reads(&self, n: usize) {
        self.failing_reads
            .store(n, std::sync::atomic::Ordering::SeqCst);
    }
}

#[cfg(test)]
impl KeyValueStore for FlakyKvStore {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        use std::sync::atomic::Ordering;
        let failing = self
            .failing_reads
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok();
        if failing {
            return Err(StorageError::Query("database is locked".to_string()));
        }
        self.inner.get(key)
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        self.inner.set(key, value)
    }

    fn remove(&self, key: &str) -> Result<(), StorageError> {
        self.inner.remove(key)
    }
}

/// Where a loaded value came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadSource {
    /// Decoded from the store.
    Stored,
    /// Key absent; default substituted.
    Missing,
    /// Value present but undecodable; default substituted.
    Corrupt,
    /// Backend read failed; default substituted.
    Unavailable,
}

/// A loaded value plus whether it had to be defaulted.
#[derive(Debug, Clone, PartialEq)]
pub struct Loaded<T> {
    pub value: T,
    pub source: LoadSource,
}

impl<T> Loaded<T> {
    pub fn was_default(&self) -> bool {
        self.source != LoadSource::Stored
    }

    /// The backend could not be read, so whatever is stored may still be intact.
    /// Writing the substituted default back would overwrite it.
    pub fn read_failed(&self) -> bool {
        self.source == LoadSource::Unavailable
    }

    pub fn into_inner(self) -> T {
        self.value
    }
}

/// Typed JSON access over a `KeyValueStore`.
#[derive(Clone)]
pub struct JsonStore {
    backend: Arc<dyn KeyValueStore>,
}

impl JsonStore {
    pub fn new(backend: Arc<dyn KeyValueStore>) -> Self {
        Self { backend }
    }

    /// Store with a fresh `MemoryKvStore` behind it.
    pub fn in_memory() -> Self {
        Self::new(Arc::new(MemoryKvStore::new()))
    }

    /// Load `key`, substituting `T::default()` when missing or undecodable.
    pub fn load_or_default<T: DeserializeOwned + Default>(&self, key: StorageKey) -> Loaded<T> {
        self.load_or_else(key, T::default)
    }

    /// Load `key`, substituting `fallback()` when missing or undecodable.
    /// Never fails.
    pub fn load_or_else<T, F>(&self, key: StorageKey, fallback: F) -> Loaded<T>
    where
        T: DeserializeOwned,
        F: FnOnce() -> T,
    {
        let raw = match self.backend.get(key.as_str()) {
            Ok(Some(raw)) => raw,
            Ok(None) => {
                return Loaded {
                    value: fallback(),
                    source: LoadSource::Missing,
                }
            }
            Err(e) => {
                tracing::warn!("Failed to read {}: {}", key.as_str(), e);
                return Loaded {
                    value: fallback(),
                    source: LoadSource::Unavailable,
                };
            }
        };

        match serde_json::from_str(&raw) {
            Ok(value) => Loaded {
                value,
                source: LoadSource::Stored,
            },
            Err(e) => {
                tracing::warn!("Discarding undecodable {}: {}", key.as_str(), e);
                Loaded {
                    value: fallback(),
                    source: LoadSource::Corrupt,
                }
            }
        }
    }

    pub fn save<T: Serialize + ?Sized>(&self, key: StorageKey, value: &T) -> Result<(), StorageError> {
        let encoded = serde_json::to_string(value).map_err(|e| StorageError::Encode {
            key: key.as_str().to_string(),
            message: e.to_string(),
        })?;
        self.backend.set(key.as_str(), &encoded)
    }

    /// Save and log on failure; callers never react to persistence errors.
    pub fn persist<T: Serialize + ?Sized>(&self, key: StorageKey, value: &T) {
        if let Err(e) = self.save(key, value) {
            tracing::warn!("Failed to persist {}: {}", key.as_str(), e);
        }
    }

    pub fn remove(&self, key: StorageKey) -> Result<(), StorageError> {
        self.backend.remove(key.as_str())
    }

    /// Remove every known key. Failures are logged and skipped.
    pub fn clear_all(&self) {
        for key in StorageKey::ALL {
            if let Err(e) = self.remove(key) {
                tracing::warn!("Failed to remove {}: {}", key.as_str(), e);
            }
        }
        tracing::info!("Cleared all persisted data");
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used)]
    use super::*;
    use serde::Deserialize;

    #[derive(Debug, Default, PartialEq, Serialize, Deserialize)]
    struct Sample {
        name: String,
        count: u32,
    }

    #[test]
    fn test_sqlite_get_set_remove() {
        let store = SqliteKvStore::in_memory().unwrap();

        assert_eq!(store.get("a").unwrap(), None);
        store.set("a", "1").unwrap();
        assert_eq!(store.get("a").unwrap().as_deref(), Some("1"));

        store.set("a", "2").unwrap();
        assert_eq!(store.get("a").unwrap().as_deref(), Some("2"));

        store.remove("a").unwrap();
        assert_eq!(store.get("a").unwrap(), None);
        store.remove("a").unwrap();
    }

    #[test]
    fn test_sqlite_persists_across_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("data").join("meteoros.db");

        {
            let store = SqliteKvStore::new(&path).unwrap();
            store.set(StorageKey::LastSearchedCity.as_str(), "\"Paris\"").unwrap();
        }

        let reopened = SqliteKvStore::new(&path).unwrap();
        assert_eq!(
            reopened.get(StorageKey::LastSearchedCity.as_str()).unwrap().as_deref(),
            Some("\"Paris\"")
        );
    }

    #[test]
    fn test_load_distinguishes_missing_and_corrupt() {
        let store = JsonStore::in_memory();

        let missing: Loaded<Sample> = store.load_or_default(StorageKey::Settings);
        assert_eq!(missing.source, LoadSource::Missing);
        assert!(missing.was_default());

        store.backend.set(StorageKey::Settings.as_str(), "{not json").unwrap();
        let corrupt: Loaded<Sample> = store.load_or_default(StorageKey::Settings);
        assert_eq!(corrupt.source, LoadSource::Corrupt);
        assert_eq!(corrupt.value, Sample::default());
    }

    #[test]
    fn test_save_then_load() {
        let store = JsonStore::in_memory();
        let sample = Sample {
            name: "x".into(),
            count: 3,
        };

        store.save(StorageKey::Settings, &sample).unwrap();
        let loaded: Loaded<Sample> = store.load_or_default(StorageKey::Settings);
        assert_eq!(loaded.source, LoadSource::Stored);
        assert_eq!(loaded.into_inner(), sample);
    }

    #[test]
    fn test_load_or_else_uses_fallback() {
        let store = JsonStore::in_memory();
        let loaded: Loaded<Vec<u32>> = store.load_or_else(StorageKey::Challenges, || vec![1, 2]);
        assert_eq!(loaded.value, vec![1, 2]);
    }

    #[test]
    fn test_clear_all_removes_every_key() {
        let store = JsonStore::in_memory();
        for key in StorageKey::ALL {
            store.save(key, &1u32).unwrap();
        }

        store.clear_all();

        for key in StorageKey::ALL {
            let loaded: Loaded<u32> = store.load_or_default(key);
            assert_eq!(loaded.source, LoadSource::Missing, "{:?}", key);
        }
    }
}
