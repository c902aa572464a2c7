use crate::error::StoreError;
use crate::store::{MapStore, MemoryStore, StoreMap};
use parking_lot::RwLock;
use std::collections::HashMap;
use tracing::{debug, warn};

/// Exact message → classifier category, persisted on every write.
///
/// Memory is updated before the store so that a failed write still spares
/// the classifier for the rest of the run.
pub struct PredictionCache {
    entries: RwLock<HashMap<String, String>>,
    store: Box<dyn MapStore>,
}

impl PredictionCache {
    /// Load the cache from `store`; an unreadable store starts empty
    pub fn open(store: Box<dyn MapStore>) -> Self {
        let entries = match store.load() {
            Ok(map) => map.into_iter().collect(),
            Err(e) => {
                warn!(store = %store.describe(), error = %e, "prediction cache unreadable, starting empty");
                HashMap::new()
            }
        };
        Self {
            entries: RwLock::new(entries),
            store,
        }
    }

    pub fn in_memory() -> Self {
        Self::open(Box::new(MemoryStore::new()))
    }

    pub fn get(&self, message: &str) -> Option<String> {
        self.entries.read().get(message).cloned()
    }

    /// Remember `category` for `message` and persist it
    pub fn record(&self, message: &str, category: &str) -> Result<(), StoreError> {
        {
            let mut entries = self.entries.write();
            if entries.get(message).map(String::as_str) == Some(category) {
                return Ok(());
            }
            entries.insert(message.to_string(), category.to_string());
        }

        self.store.modify(&mut |map: &mut StoreMap| {
            map.insert(message.to_string(), category.to_string());
            true
        })?;
        debug!(category = %category, "prediction cached");
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::JsonFileStore;
    use tempfile::TempDir;

    #[test]
    fn test_record_and_get_exact_message() {
        let cache = PredictionCache::in_memory();
        cache.record("Socket closed by peer", "network").unwrap();
        assert_eq!(cache.get("Socket closed by peer").as_deref(), Some("network"));
        assert!(cache.get("socket closed by peer").is_none());
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_cache_survives_restart() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("ai_predictions.json");

        let cache = PredictionCache::open(Box::new(JsonFileStore::new(&path)));
        cache.record("login rejected", "authentication").unwrap();
        cache.record("query took 40s", "timeout").unwrap();
        drop(cache);

        let reopened = PredictionCache::open(Box::new(JsonFileStore::new(&path)));
        assert_eq!(reopened.get("login rejected").as_deref(), Some("authentication"));
        assert_eq!(reopened.len(), 2);
    }

    #[test]
    fn test_failed_write_keeps_memory() {
        let dir = TempDir::new().unwrap();
        // A directory where the store expects a file makes every write fail
        let path = dir.path().join("occupied");
        std::fs::create_dir_all(path.join("child")).unwrap();

        let cache = PredictionCache::open(Box::new(JsonFileStore::new(&path)));
        assert!(cache.record("disk quota exceeded", "file").is_err());
        assert_eq!(cache.get("disk quota exceeded").as_deref(), Some("file"));
    }
}
