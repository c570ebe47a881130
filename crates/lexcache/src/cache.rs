//! ExpiringCache: time-bound lookup cache over a key-value medium

use std::marker::PhantomData;

use chrono::Utc;
use lexstore::SharedStore;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::{debug, error};

use crate::stats::{CacheStats, ReadOutcome};

/// Namespace prefix for every cache key in the medium
pub const CACHE_PREFIX: &str = "@dictionary:cache:";

/// Entries older than this many milliseconds are treated as absent
pub const EXPIRATION_MS: i64 = 24 * 60 * 60 * 1000;

/// Persisted shape of one entry
#[derive(Serialize, Deserialize)]
struct CacheItem<T> {
    data: T,
    timestamp: i64,
}

#[derive(Serialize)]
struct CacheItemRef<'a, T> {
    data: &'a T,
    timestamp: i64,
}

/// Lookup cache whose entries expire 24 hours after being written
///
/// Every call reads the medium directly. Medium failures never reach the
/// caller: reads degrade to a miss and writes are dropped, both logged.
pub struct ExpiringCache<T> {
    /// Shared durable medium
    store: SharedStore,

    /// Cache statistics
    stats: CacheStats,

    _payload: PhantomData<fn() -> T>,
}

impl<T> ExpiringCache<T>
where
    T: Serialize + DeserializeOwned,
{
    /// Create a cache over the given medium
    pub fn new(store: SharedStore) -> Self {
        Self {
            store,
            stats: CacheStats::default(),
            _payload: PhantomData,
        }
    }

    /// Get a fresh payload, deleting the entry if it has gone stale
    pub fn get(&self, key: &str) -> Option<T> {
        let storage_key = storage_key(key);

        let raw = match self.store.get_item(&storage_key) {
            Ok(Some(raw)) => raw,
            Ok(None) => {
                self.stats.record_read(ReadOutcome::Absent);
                return None;
            }
            Err(e) => {
                error!(key, error = %e, "Error getting from cache");
                self.stats.record_read(ReadOutcome::StorageError);
                return None;
            }
        };

        let item: CacheItem<T> = match serde_json::from_str(&raw) {
            Ok(item) => item,
            Err(e) => {
                error!(key, error = %e, "Malformed cache entry");
                self.stats.record_read(ReadOutcome::Malformed);
                return None;
            }
        };

        let age = Utc::now().timestamp_millis() - item.timestamp;
        if age > EXPIRATION_MS {
            debug!(key, age_ms = age, "cache entry expired");
            self.stats.record_read(ReadOutcome::Expired);
            self.remove(key);
            return None;
        }

        self.stats.record_read(ReadOutcome::Hit);
        Some(item.data)
    }

    /// Store a payload stamped with the current time, replacing any entry
    pub fn set(&self, key: &str, payload: &T) {
        let item = CacheItemRef {
            data: payload,
            timestamp: Utc::now().timestamp_millis(),
        };

        let raw = match serde_json::to_string(&item) {
            Ok(raw) => raw,
            Err(e) => {
                error!(key, error = %e, "Error encoding cache entry");
                self.stats.record_write(false);
                return;
            }
        };

        match self.store.set_item(&storage_key(key), &raw) {
            Ok(()) => self.stats.record_write(true),
            Err(e) => {
                error!(key, error = %e, "Error setting cache");
                self.stats.record_write(false);
            }
        }
    }

    /// Remove an entry; no-op if absent
    pub fn remove(&self, key: &str) {
        if let Err(e) = self.store.remove_item(&storage_key(key)) {
            error!(key, error = %e, "Error removing from cache");
        }
    }

    /// Remove every entry in the cache namespace, leaving other keys alone
    pub fn clear(&self) {
        let keys = match self.store.all_keys() {
            Ok(keys) => keys,
            Err(e) => {
                error!(error = %e, "Error clearing cache");
                return;
            }
        };

        let cache_keys: Vec<String> = keys
            .into_iter()
            .filter(|key| key.starts_with(CACHE_PREFIX))
            .collect();

        match self.store.multi_remove(&cache_keys) {
            Ok(()) => debug!(removed = cache_keys.len(), "cache cleared"),
            Err(e) => error!(error = %e, "Error clearing cache"),
        }
    }

    /// Read and write outcome counters
    pub fn stats(&self) -> &CacheStats {
        &self.stats
    }
}

fn storage_key(key: &str) -> String {
    format!("{}{}", CACHE_PREFIX, key)
}

#[cfg(test)]
mod tests {
    use super::*;
    use lexstore::{KeyValueStore, LexStore, MemoryStore};
    use serde_json::json;
    use std::sync::Arc;
    use tempfile::TempDir;

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    struct Entry {
        word: String,
        meanings: Vec<String>,
    }

    fn hello() -> Entry {
        Entry {
            word: "hello".to_string(),
            meanings: vec!["A greeting".to_string()],
        }
    }

    fn memory_cache() -> (Arc<MemoryStore>, ExpiringCache<Entry>) {
        let store = Arc::new(MemoryStore::new());
        let cache = ExpiringCache::new(store.clone());
        (store, cache)
    }

    fn seed(store: &MemoryStore, key: &str, age_ms: i64) {
        let raw = json!({
            "data": hello(),
            "timestamp": Utc::now().timestamp_millis() - age_ms,
        });
        store
            .set_item(&format!("{}{}", CACHE_PREFIX, key), &raw.to_string())
            .unwrap();
    }

    #[test]
    fn test_empty_cache_misses() {
        let (_, cache) = memory_cache();

        assert_eq!(cache.get("hello"), None);
        assert_eq!(cache.stats().snapshot().absent, 1);
    }

    #[test]
    fn test_set_then_get() {
        let (_, cache) = memory_cache();

        cache.set("hello", &hello());

        assert_eq!(cache.get("hello"), Some(hello()));
        let stats = cache.stats().snapshot();
        assert_eq!(stats.hits, 1);
        assert_eq!(stats.writes, 1);
    }

    #[test]
    fn test_expired_entry_is_absent_and_deleted() {
        let (store, cache) = memory_cache();
        seed(&store, "hello", 25 * 60 * 60 * 1000);

        assert_eq!(cache.get("hello"), None);
        assert_eq!(store.get_item("@dictionary:cache:hello").unwrap(), None);
        let stats = cache.stats().snapshot();
        assert_eq!(stats.expired, 1);
        assert_eq!(stats.misses(), 1);
    }

    #[test]
    fn test_entry_inside_window_is_fresh() {
        let (store, cache) = memory_cache();
        seed(&store, "hello", EXPIRATION_MS - 60_000);

        assert_eq!(cache.get("hello"), Some(hello()));
    }

    #[test]
    fn test_set_overwrites_stale_entry() {
        let (store, cache) = memory_cache();
        seed(&store, "hello", 25 * 60 * 60 * 1000);

        cache.set("hello", &hello());

        assert_eq!(cache.get("hello"), Some(hello()));
    }

    #[test]
    fn test_remove() {
        let (_, cache) = memory_cache();

        cache.set("hello", &hello());
        cache.remove("hello");
        cache.remove("never-cached");

        assert_eq!(cache.get("hello"), None);
    }

    #[test]
    fn test_clear_only_touches_cache_namespace() {
        let (store, cache) = memory_cache();
        store.set_item("@dictionary:favorites", "[]").unwrap();

        cache.set("hello", &hello());
        cache.set("world", &hello());
        cache.clear();

        assert_eq!(cache.get("hello"), None);
        assert_eq!(cache.get("world"), None);
        assert_eq!(
            store.all_keys().unwrap(),
            vec!["@dictionary:favorites".to_string()]
        );
    }

    #[test]
    fn test_storage_failures_are_swallowed() {
        let (store, cache) = memory_cache();
        cache.set("hello", &hello());

        store.set_failing(true);
        assert_eq!(cache.get("hello"), None);
        cache.set("world", &hello());
        cache.remove("hello");
        cache.clear();

        store.set_failing(false);
        assert_eq!(cache.get("hello"), Some(hello()));
        assert_eq!(cache.get("world"), None);

        let stats = cache.stats().snapshot();
        assert_eq!(stats.read_errors, 1);
        assert_eq!(stats.write_errors, 1);
        assert_eq!(stats.writes, 1);
    }

    #[test]
    fn test_malformed_entry_is_a_miss() {
        let (store, cache) = memory_cache();
        store
            .set_item("@dictionary:cache:hello", "not json")
            .unwrap();

        assert_eq!(cache.get("hello"), None);
        assert_eq!(cache.stats().snapshot().malformed, 1);
    }

    #[test]
    fn test_file_backed_cache_survives_reopen() {
        let dir = TempDir::new().unwrap();

        {
            let store = Arc::new(LexStore::open(dir.path()).unwrap());
            let cache: ExpiringCache<Entry> = ExpiringCache::new(store);
            cache.set("hello", &hello());
        }

        let store = Arc::new(LexStore::open(dir.path()).unwrap());
        let cache: ExpiringCache<Entry> = ExpiringCache::new(store);
        assert_eq!(cache.get("hello"), Some(hello()));
    }
}
