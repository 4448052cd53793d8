//! Persisted cache file
//!
//! All caches are written into one bincode blob stamped with
//! [`CACHE_FORMAT_VERSION`]. A file that is missing, version-mismatched or
//! undecodable is treated as "no cache": mismatched and corrupt files are
//! deleted and every target cache is left empty.
//!
//! Each cache's initialized flag travels with its state, so a file written
//! after lazy queries alone loads back as populated but not initialized.

use crate::cache::traits::Cache;
use crate::error::{Error, IoError, IoOperation, Result, StorageError};
use bincode::Options;
use log::{debug, info, warn};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Bump whenever the shape of any cache's state changes
pub const CACHE_FORMAT_VERSION: u32 = 4;

/// Upper bound for a single decode, guards against garbage length prefixes
const MAX_DECODE_BYTES: u64 = 1 << 30;

/// Bincode options shared by the file framing and per-cache payloads
pub(crate) fn codec() -> impl Options {
    bincode::DefaultOptions::new().with_limit(MAX_DECODE_BYTES)
}

#[derive(Serialize, Deserialize)]
struct StoredCache {
    name: String,
    initialized: bool,
    data: Vec<u8>,
}

#[derive(Serialize, Deserialize)]
struct StoredCaches {
    version: u32,
    caches: Vec<StoredCache>,
}

/// Reads and writes the cache file at a fixed path
#[derive(Debug, Clone)]
pub struct CacheStorage {
    path: PathBuf,
}

impl CacheStorage {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn exists(&self) -> bool {
        self.path.is_file()
    }

    /// Write every cache to the file; failures are logged, never raised
    pub fn save(&self, caches: &[Arc<dyn Cache>]) -> bool {
        let tmp_path = self.path.with_extension("tmp");
        match self.write_file(caches, &tmp_path) {
            Ok(bytes) => {
                info!(
                    "Saved {} cache(s) ({bytes} bytes) to {}",
                    caches.len(),
                    self.path.display()
                );
                true
            }
            Err(e) => {
                warn!("Failed to save cache file {}: {e}", self.path.display());
                if tmp_path.exists()
                    && let Err(e) = fs::remove_file(&tmp_path)
                {
                    warn!("Failed to remove {}: {e}", tmp_path.display());
                }
                false
            }
        }
    }

    /// Replace every cache's state and initialized flag with the file's
    /// contents
    ///
    /// Returns false when there is no usable file. On a version mismatch or
    /// a decode failure all `caches` are invalidated, which also clears
    /// their initialized flags, and the file is deleted.
    pub fn load(&self, caches: &[Arc<dyn Cache>]) -> bool {
        if !self.exists() {
            debug!("No cache file at {}", self.path.display());
            return false;
        }

        match self.read_file(caches) {
            Ok(()) => {
                info!(
                    "Loaded {} cache(s) from {}",
                    caches.len(),
                    self.path.display()
                );
                true
            }
            Err(e) => {
                warn!(
                    "Discarding cache file {}: {e}",
                    self.path.display()
                );
                for cache in caches {
                    cache.invalidate();
                }
                self.delete();
                false
            }
        }
    }

    /// Remove the file if present; failures are logged
    pub fn delete(&self) {
        match fs::remove_file(&self.path) {
            Ok(()) => debug!("Deleted cache file {}", self.path.display()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => warn!("Failed to delete cache file {}: {e}", self.path.display()),
        }
    }

    fn write_file(&self, caches: &[Arc<dyn Cache>], tmp_path: &Path) -> Result<usize> {
        let mut stored = StoredCaches {
            version: CACHE_FORMAT_VERSION,
            caches: Vec::with_capacity(caches.len()),
        };
        for cache in caches {
            stored.caches.push(StoredCache {
                name: cache.name().to_string(),
                initialized: cache.is_initialized(),
                data: cache.export()?,
            });
        }
        let bytes = codec().serialize(&stored)?;

        if let Some(parent) = self.path.parent()
            && !parent.as_os_str().is_empty()
        {
            fs::create_dir_all(parent)
                .map_err(|e| IoError::new(IoOperation::CreateDir, parent, e))?;
        }
        fs::write(tmp_path, &bytes).map_err(|e| IoError::new(IoOperation::Write, tmp_path, e))?;
        fs::rename(tmp_path, &self.path)
            .map_err(|e| IoError::new(IoOperation::Rename, &self.path, e))?;
        Ok(bytes.len())
    }

    fn read_file(&self, caches: &[Arc<dyn Cache>]) -> Result<()> {
        let bytes =
            fs::read(&self.path).map_err(|e| IoError::new(IoOperation::Read, &self.path, e))?;
        let stored: StoredCaches = codec().deserialize(&bytes)?;
        if stored.version != CACHE_FORMAT_VERSION {
            return Err(StorageError::version_mismatch(stored.version, CACHE_FORMAT_VERSION).into());
        }

        for cache in caches {
            let entry = stored
                .caches
                .iter()
                .find(|entry| entry.name == cache.name())
                .ok_or_else(|| Error::from(StorageError::missing_cache(cache.name())))?;
            cache.import(&entry.data)?;
            cache.set_initialized(entry.initialized);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::lock::CacheLock;
    use crate::types::NoteId;
    use std::collections::HashMap;

    #[derive(Default)]
    struct CounterCache {
        name: &'static str,
        lock: CacheLock<HashMap<String, u64>>,
    }

    impl CounterCache {
        fn named(name: &'static str) -> Arc<Self> {
            Arc::new(Self {
                name,
                lock: CacheLock::default(),
            })
        }

        fn put(&self, key: &str, value: u64) {
            self.lock.write(|map| map.insert(key.to_string(), value));
        }
    }

    impl Cache for CounterCache {
        fn name(&self) -> &'static str {
            self.name
        }

        fn invalidate(&self) {
            self.lock.reset();
        }

        fn cache_size(&self) -> usize {
            self.lock.read(|map| map.len())
        }

        fn is_initialized(&self) -> bool {
            self.lock.is_initialized()
        }

        fn set_initialized(&self, initialized: bool) {
            self.lock.set_initialized(initialized);
        }

        fn evict_note(&self, _note_id: NoteId) {}

        fn export(&self) -> Result<Vec<u8>> {
            self.lock.export_state()
        }

        fn import(&self, data: &[u8]) -> Result<()> {
            self.lock.import_state(data)
        }
    }

    fn as_dyn(caches: &[Arc<CounterCache>]) -> Vec<Arc<dyn Cache>> {
        caches
            .iter()
            .map(|cache| Arc::clone(cache) as Arc<dyn Cache>)
            .collect()
    }

    #[test]
    fn test_load_without_file_returns_false() {
        let dir = tempfile::tempdir().unwrap();
        let storage = CacheStorage::new(dir.path().join("cache.bin"));
        let cache = CounterCache::named("counter");
        assert!(!storage.load(&as_dyn(&[cache])));
    }

    #[test]
    fn test_save_then_load_restores_state() {
        let dir = tempfile::tempdir().unwrap();
        let storage = CacheStorage::new(dir.path().join("nested").join("cache.bin"));

        let first = CounterCache::named("first");
        let second = CounterCache::named("second");
        first.put("a", 1);
        second.put("b", 2);
        second.put("c", 3);
        assert!(storage.save(&as_dyn(&[first, second])));
        assert!(storage.exists());
        assert!(!storage.path().with_extension("tmp").exists());

        let first = CounterCache::named("first");
        let second = CounterCache::named("second");
        assert!(storage.load(&as_dyn(&[Arc::clone(&first), Arc::clone(&second)])));
        assert_eq!(first.cache_size(), 1);
        assert_eq!(second.cache_size(), 2);
    }

    #[test]
    fn test_initialized_flag_travels_with_each_cache() {
        let dir = tempfile::tempdir().unwrap();
        let storage = CacheStorage::new(dir.path().join("cache.bin"));

        let warmed = CounterCache::named("warmed");
        let lazy = CounterCache::named("lazy");
        warmed.put("a", 1);
        warmed.set_initialized(true);
        lazy.put("b", 2);
        assert!(storage.save(&as_dyn(&[warmed, lazy])));

        let warmed = CounterCache::named("warmed");
        let lazy = CounterCache::named("lazy");
        lazy.set_initialized(true);
        assert!(storage.load(&as_dyn(&[Arc::clone(&warmed), Arc::clone(&lazy)])));
        assert!(warmed.is_initialized());
        assert!(!lazy.is_initialized());
        assert_eq!(lazy.cache_size(), 1);
    }

    #[test]
    fn test_version_mismatch_discards_file() {
        let dir = tempfile::tempdir().unwrap();
        let storage = CacheStorage::new(dir.path().join("cache.bin"));
        let stale = StoredCaches {
            version: CACHE_FORMAT_VERSION + 1,
            caches: Vec::new(),
        };
        fs::write(storage.path(), codec().serialize(&stale).unwrap()).unwrap();

        let cache = CounterCache::named("counter");
        cache.put("left over", 9);
        cache.set_initialized(true);
        assert!(!storage.load(&as_dyn(&[Arc::clone(&cache)])));
        assert!(!storage.exists());
        assert_eq!(cache.cache_size(), 0);
        assert!(!cache.is_initialized());
    }

    #[test]
    fn test_missing_entry_invalidates_all_targets() {
        let dir = tempfile::tempdir().unwrap();
        let storage = CacheStorage::new(dir.path().join("cache.bin"));
        let only = CounterCache::named("only");
        only.put("x", 1);
        assert!(storage.save(&as_dyn(&[only])));

        let only = CounterCache::named("only");
        let absent = CounterCache::named("absent");
        assert!(!storage.load(&as_dyn(&[Arc::clone(&only), Arc::clone(&absent)])));
        assert_eq!(only.cache_size(), 0);
        assert!(!storage.exists());
    }

    #[test]
    fn test_save_into_unwritable_location_returns_false() {
        let dir = tempfile::tempdir().unwrap();
        let blocker = dir.path().join("blocker");
        fs::write(&blocker, b"file, not a directory").unwrap();
        let storage = CacheStorage::new(blocker.join("cache.bin"));

        assert!(!storage.save(&as_dyn(&[CounterCache::named("counter")])));
        assert!(!storage.exists());
    }

    #[test]
    fn test_delete_missing_file_is_noop() {
        let dir = tempfile::tempdir().unwrap();
        let storage = CacheStorage::new(dir.path().join("never-written.bin"));
        storage.delete();
        assert!(!storage.exists());
    }
}
