//! Cache-then-fetch word lookup

use std::sync::Arc;

use async_trait::async_trait;
use lexcache::ExpiringCache;
use tracing::debug;

use crate::error::LookupError;
use crate::model::Word;

/// Where lexical entries come from on a cache miss
#[async_trait]
pub trait WordSource: Send + Sync {
    /// Fetch the entry for an already normalized word
    async fn fetch(&self, word: &str) -> Result<Word, LookupError>;
}

/// Cache key for a user-supplied word: trimmed and lowercased
pub fn normalize_word(word: &str) -> Option<String> {
    let trimmed = word.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_lowercase())
    }
}

/// Word lookups through the expiring cache
///
/// Hits are served from the cache; misses go to the [`WordSource`] and the
/// result is written back. Source errors reach the caller unchanged.
pub struct WordLookup {
    cache: ExpiringCache<Word>,
    source: Arc<dyn WordSource>,
}

impl WordLookup {
    /// Create a lookup over a cache and a source
    pub fn new(cache: ExpiringCache<Word>, source: Arc<dyn WordSource>) -> Self {
        Self { cache, source }
    }

    /// Look up `word`
    pub async fn lookup(&self, word: &str) -> Result<Word, LookupError> {
        let key = normalize_word(word).ok_or(LookupError::EmptyWord)?;

        if let Some(entry) = self.cache.get(&key) {
            debug!(word = %key, "cache hit");
            return Ok(entry);
        }

        debug!(word = %key, "cache miss, fetching");
        let entry = self.source.fetch(&key).await?;
        self.cache.set(&key, &entry);
        Ok(entry)
    }

    /// Drop the cached entry for `word`
    pub fn invalidate(&self, word: &str) {
        if let Some(key) = normalize_word(word) {
            self.cache.remove(&key);
        }
    }

    /// Drop every cached entry
    pub fn clear_cache(&self) {
        self.cache.clear();
    }

    /// Underlying cache
    pub fn cache(&self) -> &ExpiringCache<Word> {
        &self.cache
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lexstore::{KeyValueStore, MemoryStore};
    use reqwest::StatusCode;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct CountingSource {
        calls: AtomicUsize,
    }

    impl CountingSource {
        fn new() -> Arc<Self> {
            Arc::new(Self {
                calls: AtomicUsize::new(0),
            })
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl WordSource for CountingSource {
        async fn fetch(&self, word: &str) -> Result<Word, LookupError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            match word {
                "asdfqwer" => Err(LookupError::NotFound {
                    word: word.to_string(),
                }),
                "down" => Err(LookupError::Http {
                    status: StatusCode::BAD_GATEWAY,
                }),
                _ => Ok(Word {
                    word: word.to_string(),
                    phonetic: None,
                    phonetics: Vec::new(),
                    meanings: Vec::new(),
                    origin: None,
                }),
            }
        }
    }

    fn lookup_with(source: Arc<CountingSource>) -> (Arc<MemoryStore>, WordLookup) {
        let store = Arc::new(MemoryStore::new());
        let lookup = WordLookup::new(ExpiringCache::new(store.clone()), source);
        (store, lookup)
    }

    #[test]
    fn test_normalize_word() {
        assert_eq!(normalize_word("  Hello "), Some("hello".to_string()));
        assert_eq!(normalize_word("   "), None);
    }

    #[tokio::test]
    async fn test_miss_fetches_and_writes_back() {
        let source = CountingSource::new();
        let (store, lookup) = lookup_with(source.clone());

        let word = lookup.lookup("Hello").await.unwrap();

        assert_eq!(word.word, "hello");
        assert_eq!(source.calls(), 1);
        assert!(store.get_item("@dictionary:cache:hello").unwrap().is_some());
    }

    #[tokio::test]
    async fn test_hit_skips_source() {
        let source = CountingSource::new();
        let (_, lookup) = lookup_with(source.clone());

        lookup.lookup("hello").await.unwrap();
        lookup.lookup(" HELLO").await.unwrap();

        assert_eq!(source.calls(), 1);
        assert_eq!(lookup.cache().stats().snapshot().hits, 1);
    }

    #[tokio::test]
    async fn test_errors_propagate_and_are_not_cached() {
        let source = CountingSource::new();
        let (store, lookup) = lookup_with(source.clone());

        let err = lookup.lookup("asdfqwer").await.unwrap_err();
        assert!(matches!(err, LookupError::NotFound { .. }));

        let err = lookup.lookup("down").await.unwrap_err();
        assert!(err.is_retryable());

        assert!(store.is_empty());
    }

    #[tokio::test]
    async fn test_empty_word_is_rejected() {
        let source = CountingSource::new();
        let (_, lookup) = lookup_with(source.clone());

        assert!(matches!(lookup.lookup("  ").await, Err(LookupError::EmptyWord)));
        assert_eq!(source.calls(), 0);
    }

    #[tokio::test]
    async fn test_invalidate_forces_refetch() {
        let source = CountingSource::new();
        let (_, lookup) = lookup_with(source.clone());

        lookup.lookup("hello").await.unwrap();
        lookup.invalidate("Hello");
        lookup.lookup("hello").await.unwrap();

        assert_eq!(source.calls(), 2);
    }

    #[tokio::test]
    async fn test_broken_cache_still_serves_from_source() {
        let source = CountingSource::new();
        let (store, lookup) = lookup_with(source.clone());
        store.set_failing(true);

        assert_eq!(lookup.lookup("hello").await.unwrap().word, "hello");
        assert_eq!(lookup.lookup("hello").await.unwrap().word, "hello");
        assert_eq!(source.calls(), 2);
    }
}
