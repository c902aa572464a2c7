//! Durable string-to-string maps backing the knowledge base and the prediction cache.
//!
//! A store is a JSON object of strings on disk. Every mutation is a single
//! read-modify-write: the file is locked, re-read, edited, written to a
//! sibling temp file and renamed over the original. Readers therefore never
//! observe a partially written file, and concurrent writers (threads or
//! processes) are serialized by the lock instead of losing updates.

use crate::error::StoreError;
use fs2::FileExt;
use indexmap::IndexMap;
use parking_lot::Mutex;
use std::ffi::OsString;
use std::fs::{self, File, OpenOptions};
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Insertion-ordered map as persisted
pub type StoreMap = IndexMap<String, String>;

/// A persisted map with whole-map load and atomic edit
pub trait MapStore: Send + Sync {
    /// Read the current contents
    fn load(&self) -> Result<StoreMap, StoreError>;

    /// Apply `edit` to the current contents as one read-modify-write.
    /// `edit` returns whether it changed anything; unchanged maps are not rewritten.
    /// Returns the map as it stands after the edit.
    fn modify(&self, edit: &mut dyn FnMut(&mut StoreMap) -> bool) -> Result<StoreMap, StoreError>;

    /// Human-readable location, for logs
    fn describe(&self) -> String;
}

/// JSON file store with atomic replace and an advisory lock file
#[derive(Debug)]
pub struct JsonFileStore {
    path: PathBuf,
    guard: Mutex<()>,
}

impl JsonFileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            guard: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn sibling(&self, suffix: &str) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_else(|| OsString::from("store"));
        name.push(suffix);
        self.path.with_file_name(name)
    }

    fn ensure_parent(&self) -> Result<(), StoreError> {
        match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => fs::create_dir_all(parent)
                .map_err(|e| StoreError::io("create directory", parent, e)),
            _ => Ok(()),
        }
    }

    fn read_map(&self) -> Result<StoreMap, StoreError> {
        let text = match fs::read_to_string(&self.path) {
            Ok(text) => text,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(StoreMap::new()),
            Err(e) => return Err(StoreError::io("read", &self.path, e)),
        };

        if text.trim().is_empty() {
            return Ok(StoreMap::new());
        }

        serde_json::from_str(&text).map_err(|source| StoreError::Corrupt {
            path: self.path.clone(),
            source,
        })
    }

    fn write_map(&self, map: &StoreMap) -> Result<(), StoreError> {
        let data = serde_json::to_string_pretty(map).map_err(|source| StoreError::Encode {
            path: self.path.clone(),
            source,
        })?;

        let temp_path = self.sibling(".tmp");
        let mut file = File::create(&temp_path).map_err(|e| StoreError::io("create", &temp_path, e))?;
        file.write_all(data.as_bytes())
            .map_err(|e| StoreError::io("write", &temp_path, e))?;
        file.sync_all().map_err(|e| StoreError::io("sync", &temp_path, e))?;
        drop(file);

        fs::rename(&temp_path, &self.path).map_err(|e| StoreError::io("rename", &self.path, e))
    }

    fn lock(&self) -> Result<File, StoreError> {
        let lock_path = self.sibling(".lock");
        let lock_file = OpenOptions::new()
            .create(true)
            .truncate(false)
            .write(true)
            .open(&lock_path)
            .map_err(|e| StoreError::io("open lock", &lock_path, e))?;
        lock_file
            .lock_exclusive()
            .map_err(|e| StoreError::io("lock", &lock_path, e))?;
        Ok(lock_file)
    }
}

impl MapStore for JsonFileStore {
    fn load(&self) -> Result<StoreMap, StoreError> {
        self.read_map()
    }

    fn modify(&self, edit: &mut dyn FnMut(&mut StoreMap) -> bool) -> Result<StoreMap, StoreError> {
        let _guard = self.guard.lock();
        self.ensure_parent()?;
        // Released when the handle is dropped at the end of this call
        let _lock_file = self.lock()?;

        let mut map = match self.read_map() {
            Ok(map) => map,
            Err(e @ StoreError::Corrupt { .. }) => {
                warn!(error = %e, "replacing corrupt store with an empty map");
                StoreMap::new()
            }
            Err(e) => return Err(e),
        };

        if edit(&mut map) {
            self.write_map(&map)?;
            debug!(path = %self.path.display(), entries = map.len(), "store rewritten");
        }

        Ok(map)
    }

    fn describe(&self) -> String {
        self.path.display().to_string()
    }
}

/// Process-local store for tests and for running without persistence
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: Mutex<StoreMap>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_entries(entries: StoreMap) -> Self {
        Self {
            entries: Mutex::new(entries),
        }
    }
}

impl MapStore for MemoryStore {
    fn load(&self) -> Result<StoreMap, StoreError> {
        Ok(self.entries.lock().clone())
    }

    fn modify(&self, edit: &mut dyn FnMut(&mut StoreMap) -> bool) -> Result<StoreMap, StoreError> {
        let mut entries = self.entries.lock();
        edit(&mut entries);
        Ok(entries.clone())
    }

    fn describe(&self) -> String {
        "memory".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::thread;
    use tempfile::TempDir;

    fn insert(key: &str, value: &str) -> impl FnMut(&mut StoreMap) -> bool {
        let key = key.to_string();
        let value = value.to_string();
        move |map: &mut StoreMap| {
            map.insert(key.clone(), value.clone());
            true
        }
    }

    #[test]
    fn test_missing_file_loads_empty() {
        let dir = TempDir::new().unwrap();
        let store = JsonFileStore::new(dir.path().join("absent.json"));
        assert!(store.load().unwrap().is_empty());
    }

    #[test]
    fn test_modify_persists_pretty_json_in_insertion_order() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested").join("solutions.json");
        let store = JsonFileStore::new(&path);

        store.modify(&mut insert("zeta", "last letter")).unwrap();
        store.modify(&mut insert("alpha", "first letter")).unwrap();

        let text = fs::read_to_string(&path).unwrap();
        assert!(text.contains("\n  \"zeta\": \"last letter\""));
        let reloaded = JsonFileStore::new(&path).load().unwrap();
        let keys: Vec<&String> = reloaded.keys().collect();
        assert_eq!(keys, vec!["zeta", "alpha"]);

        // No temp file left behind after the rename
        assert!(!dir.path().join("nested").join("solutions.json.tmp").exists());
    }

    #[test]
    fn test_unchanged_edit_does_not_create_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("cache.json");
        let store = JsonFileStore::new(&path);

        let result = store.modify(&mut |_map: &mut StoreMap| false).unwrap();
        assert!(result.is_empty());
        assert!(!path.exists());
    }

    #[test]
    fn test_corrupt_file_is_reported_on_load_and_replaced_on_modify() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("cache.json");
        fs::write(&path, "{ not json").unwrap();
        let store = JsonFileStore::new(&path);

        assert!(matches!(store.load(), Err(StoreError::Corrupt { .. })));

        let map = store.modify(&mut insert("message", "network")).unwrap();
        assert_eq!(map.len(), 1);
        assert_eq!(store.load().unwrap().get("message").map(String::as_str), Some("network"));
    }

    #[test]
    fn test_modify_rereads_changes_from_other_handles() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("shared.json");
        let first = JsonFileStore::new(&path);
        let second = JsonFileStore::new(&path);

        first.modify(&mut insert("a", "1")).unwrap();
        second.modify(&mut insert("b", "2")).unwrap();
        let map = first.modify(&mut insert("c", "3")).unwrap();

        assert_eq!(map.len(), 3);
    }

    #[test]
    fn test_concurrent_writers_do_not_lose_updates() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("concurrent.json");

        let handles: Vec<_> = (0..8)
            .map(|worker| {
                let store = Arc::new(JsonFileStore::new(&path));
                thread::spawn(move || {
                    for i in 0..10 {
                        store.modify(&mut insert(&format!("w{}-{}", worker, i), "x")).unwrap();
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        assert_eq!(JsonFileStore::new(&path).load().unwrap().len(), 80);
    }

    #[test]
    fn test_memory_store_round_trip() {
        let store = MemoryStore::new();
        store.modify(&mut insert("k", "v")).unwrap();
        assert_eq!(store.load().unwrap().get("k").map(String::as_str), Some("v"));
        assert_eq!(store.describe(), "memory");
    }
}
