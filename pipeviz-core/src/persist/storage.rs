//! Durable key-value storage.
//!
//! The sync layer only needs string values under string keys, read once at
//! startup and overwritten on every change. Last writer wins.

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};

use dashmap::DashMap;

use crate::error::StorageError;

/// A string key-value store.
pub trait Storage: Send + Sync {
    /// Read the value under `key`. A missing key is `Ok(None)`.
    fn read(&self, key: &str) -> Result<Option<String>, StorageError>;

    /// Store `value` under `key`, replacing any previous value.
    fn write(&self, key: &str, value: &str) -> Result<(), StorageError>;
}

/// In-process storage with an optional byte quota.
#[derive(Debug, Default)]
pub struct MemoryStorage {
    entries: DashMap<String, String>,
    quota: Option<usize>,
    unavailable: AtomicBool,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Storage refusing writes that would take keys plus values past
    /// `bytes`.
    pub fn with_quota(bytes: usize) -> Self {
        Self {
            quota: Some(bytes),
            ..Self::default()
        }
    }

    /// Make every read and write fail with [`StorageError::Unavailable`].
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn used_bytes_excluding(&self, key: &str) -> usize {
        self.entries
            .iter()
            .filter(|entry| entry.key() != key)
            .map(|entry| entry.key().len() + entry.value().len())
            .sum()
    }

    fn check_available(&self) -> Result<(), StorageError> {
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(StorageError::Unavailable("memory storage disabled".into()));
        }
        Ok(())
    }
}

impl Storage for MemoryStorage {
    fn read(&self, key: &str) -> Result<Option<String>, StorageError> {
        self.check_available()?;
        Ok(self.entries.get(key).map(|value| value.clone()))
    }

    fn write(&self, key: &str, value: &str) -> Result<(), StorageError> {
        self.check_available()?;
        if let Some(limit) = self.quota {
            let needed = self.used_bytes_excluding(key) + key.len() + value.len();
            if needed > limit {
                return Err(StorageError::QuotaExceeded {
                    key: key.to_string(),
                    needed,
                    limit,
                });
            }
        }
        self.entries.insert(key.to_string(), value.to_string());
        Ok(())
    }
}

/// One JSON file per key inside a directory.
///
/// Writes go to a temporary file first and are renamed into place, so a
/// reader never sees a half-written value.
#[derive(Debug, Clone)]
pub struct FileStorage {
    dir: PathBuf,
}

impl FileStorage {
    /// Use `dir`, creating it if needed.
    pub fn new(dir: impl Into<PathBuf>) -> Result<Self, StorageError> {
        let dir = dir.into();
        fs::create_dir_all(&dir)?;
        Ok(Self { dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// File holding `key`.
    ///
    /// Bytes outside `[A-Za-z0-9_-]` are percent-encoded, so distinct keys
    /// never share a file and no key can name a path outside `dir`.
    pub fn path_for(&self, key: &str) -> PathBuf {
        let mut name = String::with_capacity(key.len());
        for byte in key.bytes() {
            if byte.is_ascii_alphanumeric() || byte == b'-' || byte == b'_' {
                name.push(char::from(byte));
            } else {
                name.push_str(&format!("%{byte:02X}"));
            }
        }
        self.dir.join(format!("{name}.json"))
    }
}

impl Storage for FileStorage {
    fn read(&self, key: &str) -> Result<Option<String>, StorageError> {
        match fs::read_to_string(self.path_for(key)) {
            Ok(value) => Ok(Some(value)),
            Err(err) if err.kind() == ErrorKind::NotFound => Ok(None),
            Err(err) => Err(err.into()),
        }
    }

    fn write(&self, key: &str, value: &str) -> Result<(), StorageError> {
        let path = self.path_for(key);
        let tmp = path.with_extension("json.tmp");
        fs::write(&tmp, value)?;
        fs::rename(&tmp, &path)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn memory_read_missing_is_none() {
        let storage = MemoryStorage::new();
        assert!(storage.read("nothing").unwrap().is_none());
    }

    #[test]
    fn memory_write_overwrites() {
        let storage = MemoryStorage::new();
        storage.write("k", "one").unwrap();
        storage.write("k", "two").unwrap();
        assert_eq!(storage.read("k").unwrap().as_deref(), Some("two"));
        assert_eq!(storage.len(), 1);
    }

    #[test]
    fn memory_quota_counts_replaced_value_once() {
        let storage = MemoryStorage::with_quota(10);
        storage.write("k", "12345").unwrap();
        // Replacing the value does not double count the old one.
        storage.write("k", "123456789").unwrap();

        let err = storage.write("k", "1234567890").unwrap_err();
        assert!(matches!(
            err,
            StorageError::QuotaExceeded {
                needed: 11,
                limit: 10,
                ..
            }
        ));
        assert_eq!(storage.read("k").unwrap().as_deref(), Some("123456789"));
    }

    #[test]
    fn memory_unavailable_fails_both_ways() {
        let storage = MemoryStorage::new();
        storage.set_unavailable(true);
        assert!(matches!(storage.read("k"), Err(StorageError::Unavailable(_))));
        assert!(matches!(storage.write("k", "v"), Err(StorageError::Unavailable(_))));
    }

    #[test]
    fn file_storage_round_trips_and_encodes_keys() {
        let dir = tempfile::tempdir().unwrap();
        let storage = FileStorage::new(dir.path().join("state")).unwrap();

        assert!(storage.read("Pipeline Viz").unwrap().is_none());
        storage.write("Pipeline Viz", r#"{"theme":"light"}"#).unwrap();

        assert_eq!(
            storage.path_for("Pipeline Viz"),
            dir.path().join("state").join("Pipeline%20Viz.json")
        );
        assert_eq!(
            storage.read("Pipeline Viz").unwrap().as_deref(),
            Some(r#"{"theme":"light"}"#)
        );
        assert!(!storage.path_for("Pipeline Viz").with_extension("json.tmp").exists());
    }

    #[test]
    fn file_storage_keeps_similar_keys_apart() {
        let dir = tempfile::tempdir().unwrap();
        let storage = FileStorage::new(dir.path()).unwrap();

        storage.write("a b", "spaced").unwrap();
        storage.write("a_b", "underscored").unwrap();
        storage.write("../a", "escaped").unwrap();

        assert_eq!(storage.read("a b").unwrap().as_deref(), Some("spaced"));
        assert_eq!(storage.read("a_b").unwrap().as_deref(), Some("underscored"));
        assert_eq!(storage.path_for("../a"), dir.path().join("%2E%2E%2Fa.json"));
        assert!(storage.path_for("../a").exists());
    }
}
