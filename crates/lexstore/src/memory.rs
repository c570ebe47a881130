//! In-memory key-value medium

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use ahash::RandomState;
use parking_lot::RwLock;

use crate::error::{Error, Result};
use crate::kv::KeyValueStore;

/// Volatile [`KeyValueStore`] with fault injection
///
/// Used for ephemeral sessions and to exercise the failure policy of the
/// layers above the medium.
#[derive(Default)]
pub struct MemoryStore {
    items: RwLock<HashMap<String, String, RandomState>>,
    failing: AtomicBool,
    fail_budget: AtomicUsize,
}

impl MemoryStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every operation fail until switched back
    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    /// Make the next `count` operations fail
    pub fn fail_next(&self, count: usize) {
        self.fail_budget.store(count, Ordering::SeqCst);
    }

    /// Number of held keys
    pub fn len(&self) -> usize {
        self.items.read().len()
    }

    /// Check if the store is empty
    pub fn is_empty(&self) -> bool {
        self.items.read().is_empty()
    }

    fn check(&self) -> Result<()> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(Error::Unavailable("store is failing".to_string()));
        }
        let consumed = self
            .fail_budget
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1));
        if consumed.is_ok() {
            return Err(Error::Unavailable("injected failure".to_string()));
        }
        Ok(())
    }
}

impl KeyValueStore for MemoryStore {
    fn get_item(&self, key: &str) -> Result<Option<String>> {
        self.check()?;
        Ok(self.items.read().get(key).cloned())
    }

    fn set_item(&self, key: &str, value: &str) -> Result<()> {
        self.check()?;
        self.items.write().insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove_item(&self, key: &str) -> Result<()> {
        self.check()?;
        self.items.write().remove(key);
        Ok(())
    }

    fn all_keys(&self) -> Result<Vec<String>> {
        self.check()?;
        let mut keys: Vec<String> = self.items.read().keys().cloned().collect();
        keys.sort();
        Ok(keys)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_basic_operations() {
        let store = MemoryStore::new();

        store.set_item("a", "1").unwrap();
        store.set_item("b", "2").unwrap();
        assert_eq!(store.get_item("a").unwrap().as_deref(), Some("1"));

        store.multi_remove(&["a".to_string(), "missing".to_string()]).unwrap();
        assert_eq!(store.all_keys().unwrap(), vec!["b".to_string()]);
    }

    #[test]
    fn test_fail_next() {
        let store = MemoryStore::new();
        store.fail_next(2);

        assert!(store.set_item("a", "1").is_err());
        assert!(store.get_item("a").is_err());
        assert!(store.set_item("a", "1").is_ok());
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_set_failing() {
        let store = MemoryStore::new();
        store.set_failing(true);
        assert!(matches!(store.all_keys(), Err(Error::Unavailable(_))));

        store.set_failing(false);
        assert!(store.all_keys().unwrap().is_empty());
    }
}
