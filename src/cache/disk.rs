//! A persisted string-keyed map with one JSON file per entry.

use std::fmt;
use std::io;
use std::marker::PhantomData;
use std::path::{Path, PathBuf};

use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use super::CacheError;
use crate::persistence::{remove_durable, write_atomic};

/// One stored entry.
///
/// The logical key is stored alongside the value so a file that ended up
/// under the wrong name is detected instead of served.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheEntry<V> {
    pub key: String,
    pub value: V,
    /// Remote modification time of the value, for caches that validate
    /// entries against the remote side.
    #[serde(default)]
    pub last_updated_at: Option<DateTime<Utc>>,
}

impl<V> CacheEntry<V> {
    pub fn new(key: impl Into<String>, value: V) -> Self {
        CacheEntry {
            key: key.into(),
            value,
            last_updated_at: None,
        }
    }

    pub fn updated_at(mut self, at: DateTime<Utc>) -> Self {
        self.last_updated_at = Some(at);
        self
    }
}

/// A directory of cache entries holding values of type `V`.
///
/// Reads never fail: a missing, unreadable or corrupt entry is a miss.
/// Writes and removals report I/O errors, since a failed eviction must not
/// be mistaken for a successful one.
pub struct DiskKeyValueCache<V> {
    dir: PathBuf,
    _value: PhantomData<fn() -> V>,
}

impl<V> fmt::Debug for DiskKeyValueCache<V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DiskKeyValueCache")
            .field("dir", &self.dir)
            .finish()
    }
}

/// The file name for `key`. Safe as a single path segment.
pub fn encode_key(key: &str) -> String {
    URL_SAFE_NO_PAD.encode(key.as_bytes())
}

impl<V: Serialize + DeserializeOwned> DiskKeyValueCache<V> {
    /// Opens the cache in `dir`, creating the directory if necessary.
    pub fn open(dir: impl Into<PathBuf>) -> Result<Self, CacheError> {
        let dir = dir.into();
        std::fs::create_dir_all(&dir).map_err(|source| CacheError::Io {
            path: dir.clone(),
            source,
        })?;
        Ok(DiskKeyValueCache {
            dir,
            _value: PhantomData,
        })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn entry_path(&self, key: &str) -> PathBuf {
        self.dir.join(encode_key(key))
    }

    /// The stored entry for `key`, including its metadata.
    pub fn get_entry(&self, key: &str) -> Option<CacheEntry<V>> {
        if key.is_empty() {
            return None;
        }
        let path = self.entry_path(key);
        let bytes = match std::fs::read(&path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return None,
            Err(e) => {
                warn!(key, path = %path.display(), error = %e, "unreadable cache entry, treating as miss");
                return None;
            }
        };

        match serde_json::from_slice::<CacheEntry<V>>(&bytes) {
            Ok(entry) if entry.key == key => Some(entry),
            Ok(entry) => {
                warn!(key, stored_key = %entry.key, "cache entry stored under foreign key, treating as miss");
                None
            }
            Err(e) => {
                warn!(key, path = %path.display(), error = %e, "corrupt cache entry, treating as miss");
                None
            }
        }
    }

    pub fn get(&self, key: &str) -> Option<V> {
        self.get_entry(key).map(|entry| entry.value)
    }

    /// Stores `value` under `key`, replacing any previous entry.
    pub fn put(&self, key: &str, value: V) -> Result<(), CacheError> {
        self.put_entry(&CacheEntry::new(key, value))
    }

    pub fn put_entry(&self, entry: &CacheEntry<V>) -> Result<(), CacheError> {
        if entry.key.is_empty() {
            return Err(CacheError::EmptyKey);
        }
        let bytes = serde_json::to_vec(entry)?;
        let path = self.entry_path(&entry.key);
        write_atomic(&path, &bytes).map_err(|source| CacheError::Io { path, source })?;
        debug!(key = %entry.key, "stored cache entry");
        Ok(())
    }

    /// Deletes the entry for `key`. Returns whether there was one.
    pub fn remove(&self, key: &str) -> Result<bool, CacheError> {
        if key.is_empty() {
            return Ok(false);
        }
        let path = self.entry_path(key);
        let existed = remove_durable(&path).map_err(|source| CacheError::Io { path, source })?;
        if existed {
            debug!(key, "evicted cache entry");
        }
        Ok(existed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use proptest::prelude::*;
    use tempfile::tempdir;

    fn components(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn put_then_get_returns_value() {
        let dir = tempdir().unwrap();
        let cache = DiskKeyValueCache::<Vec<String>>::open(dir.path()).unwrap();

        cache
            .put("FLINK-12345", components(&["Runtime / Network"]))
            .unwrap();

        assert_eq!(
            cache.get("FLINK-12345"),
            Some(components(&["Runtime / Network"]))
        );
    }

    #[test]
    fn remove_then_get_is_empty() {
        let dir = tempdir().unwrap();
        let cache = DiskKeyValueCache::<Vec<String>>::open(dir.path()).unwrap();
        cache.put("FLINK-1", components(&["API"])).unwrap();

        assert!(cache.remove("FLINK-1").unwrap());
        assert_eq!(cache.get("FLINK-1"), None);
    }

    #[test]
    fn removing_absent_key_is_false() {
        let dir = tempdir().unwrap();
        let cache = DiskKeyValueCache::<Vec<String>>::open(dir.path()).unwrap();
        assert!(!cache.remove("FLINK-404").unwrap());
    }

    #[test]
    fn put_overwrites() {
        let dir = tempdir().unwrap();
        let cache = DiskKeyValueCache::<Vec<String>>::open(dir.path()).unwrap();
        cache.put("FLINK-1", components(&["A"])).unwrap();
        cache.put("FLINK-1", components(&["B", "C"])).unwrap();
        assert_eq!(cache.get("FLINK-1"), Some(components(&["B", "C"])));
    }

    #[test]
    fn corrupt_entry_is_a_miss() {
        let dir = tempdir().unwrap();
        let cache = DiskKeyValueCache::<Vec<String>>::open(dir.path()).unwrap();
        std::fs::write(dir.path().join(encode_key("FLINK-1")), b"{ not json").unwrap();

        assert_eq!(cache.get("FLINK-1"), None);
        cache.put("FLINK-1", components(&["A"])).unwrap();
        assert_eq!(cache.get("FLINK-1"), Some(components(&["A"])));
    }

    #[test]
    fn entry_under_wrong_name_is_a_miss() {
        let dir = tempdir().unwrap();
        let cache = DiskKeyValueCache::<Vec<String>>::open(dir.path()).unwrap();
        cache.put("FLINK-1", components(&["A"])).unwrap();
        std::fs::rename(
            dir.path().join(encode_key("FLINK-1")),
            dir.path().join(encode_key("FLINK-2")),
        )
        .unwrap();

        assert_eq!(cache.get("FLINK-2"), None);
    }

    #[test]
    fn empty_key_is_rejected_on_write() {
        let dir = tempdir().unwrap();
        let cache = DiskKeyValueCache::<Vec<String>>::open(dir.path()).unwrap();
        assert!(matches!(cache.put("", vec![]), Err(CacheError::EmptyKey)));
        assert_eq!(cache.get(""), None);
        assert!(!cache.remove("").unwrap());
    }

    #[test]
    fn entries_survive_reopening() {
        let dir = tempdir().unwrap();
        let at = Utc.with_ymd_and_hms(2019, 6, 1, 12, 0, 0).unwrap();
        {
            let cache = DiskKeyValueCache::<Vec<String>>::open(dir.path()).unwrap();
            cache
                .put_entry(&CacheEntry::new("1234", components(&["bug"])).updated_at(at))
                .unwrap();
        }
        let cache = DiskKeyValueCache::<Vec<String>>::open(dir.path()).unwrap();
        let entry = cache.get_entry("1234").unwrap();
        assert_eq!(entry.value, components(&["bug"]));
        assert_eq!(entry.last_updated_at, Some(at));
    }

    #[test]
    fn encoded_keys_are_single_segments() {
        assert_eq!(encode_key("a/b"), "YS9i");
        assert!(!encode_key("??>>").contains('/'));
    }

    proptest! {
        #[test]
        fn key_encoding_is_injective(a in "\\PC{1,20}", b in "\\PC{1,20}") {
            prop_assume!(a != b);
            prop_assert_ne!(encode_key(&a), encode_key(&b));
        }

        #[test]
        fn key_encoding_is_path_safe(key in "\\PC{1,40}") {
            let encoded = encode_key(&key);
            prop_assert!(encoded
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_'));
        }

        #[test]
        fn stored_values_are_read_back(
            key in "[A-Z]{2,6}-[0-9]{1,6}",
            value in prop::collection::vec("\\PC{0,12}", 0..5),
        ) {
            let dir = tempdir().unwrap();
            let cache = DiskKeyValueCache::<Vec<String>>::open(dir.path()).unwrap();
            cache.put(&key, value.clone()).unwrap();
            prop_assert_eq!(cache.get(&key), Some(value));
        }
    }
}
