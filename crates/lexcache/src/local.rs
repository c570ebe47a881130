//! Favorites and history persisted on the device

use lexstore::SharedStore;
use parking_lot::Mutex;
use serde::de::DeserializeOwned;
use serde::Serialize;
use thiserror::Error;
use tracing::{debug, error, warn};

use crate::records::{FavoriteRecord, HistoryRecord};

/// Key holding the whole favorites list
pub const FAVORITES_KEY: &str = "@dictionary:favorites";

/// Key holding the whole history list
pub const HISTORY_KEY: &str = "@dictionary:history";

/// Maximum number of history records kept
pub const HISTORY_LIMIT: usize = 100;

/// Local durable store for favorites and history
///
/// Best-effort: medium failures are logged and the operation behaves as a
/// no-op (writes) or returns an empty list (reads). Read-modify-write
/// operations are serialized so concurrent adds cannot lose updates.
pub struct LocalStore {
    store: SharedStore,
    write_lock: Mutex<()>,
}

impl LocalStore {
    /// Create a store over the given medium
    pub fn new(store: SharedStore) -> Self {
        Self {
            store,
            write_lock: Mutex::new(()),
        }
    }

    /// Favorites in insertion order
    pub fn get_favorites(&self) -> Vec<FavoriteRecord> {
        self.read_list(FAVORITES_KEY).unwrap_or_else(|e| {
            error!(error = %e, "Error getting favorites");
            Vec::new()
        })
    }

    /// Replace the favorites list wholesale
    pub fn set_favorites(&self, favorites: &[FavoriteRecord]) {
        let _guard = self.write_lock.lock();
        if let Err(e) = self.write_list(FAVORITES_KEY, favorites) {
            error!(error = %e, "Error setting favorites");
        }
    }

    /// Append a favorite unless the word is already present
    pub fn add_favorite(&self, word: &str) {
        let _guard = self.write_lock.lock();
        let result = self.read_list::<FavoriteRecord>(FAVORITES_KEY).and_then(|mut favorites| {
            if favorites.iter().any(|fav| fav.word == word) {
                return Ok(());
            }
            favorites.push(FavoriteRecord::now(word));
            self.write_list(FAVORITES_KEY, &favorites)
        });

        if let Err(e) = result {
            error!(word, error = %e, "Error adding favorite");
        }
    }

    /// Remove the favorite with exactly this word
    pub fn remove_favorite(&self, word: &str) {
        let _guard = self.write_lock.lock();
        let result = self.read_list::<FavoriteRecord>(FAVORITES_KEY).and_then(|mut favorites| {
            favorites.retain(|fav| fav.word != word);
            self.write_list(FAVORITES_KEY, &favorites)
        });

        if let Err(e) = result {
            error!(word, error = %e, "Error removing favorite");
        }
    }

    /// History, most recent first
    pub fn get_history(&self) -> Vec<HistoryRecord> {
        self.read_list(HISTORY_KEY).unwrap_or_else(|e| {
            error!(error = %e, "Error getting history");
            Vec::new()
        })
    }

    /// Replace the history list wholesale
    pub fn set_history(&self, history: &[HistoryRecord]) {
        let _guard = self.write_lock.lock();
        if let Err(e) = self.write_list(HISTORY_KEY, history) {
            error!(error = %e, "Error setting history");
        }
    }

    /// Move `word` to the front of the history, capping the list
    pub fn add_to_history(&self, word: &str) {
        let _guard = self.write_lock.lock();
        let result = self.read_list::<HistoryRecord>(HISTORY_KEY).and_then(|history| {
            let mut updated = Vec::with_capacity(history.len() + 1);
            updated.push(HistoryRecord::now(word));
            updated.extend(history.into_iter().filter(|item| item.word != word));
            updated.truncate(HISTORY_LIMIT);
            self.write_list(HISTORY_KEY, &updated)
        });

        if let Err(e) = result {
            error!(word, error = %e, "Error adding to history");
        }
    }

    /// Delete the whole history collection
    pub fn clear_history(&self) {
        let _guard = self.write_lock.lock();
        match self.store.remove_item(HISTORY_KEY) {
            Ok(()) => debug!("history cleared"),
            Err(e) => error!(error = %e, "Error clearing history"),
        }
    }

    fn read_list<R: DeserializeOwned>(&self, key: &str) -> Result<Vec<R>, StoreError> {
        let raw = match self.store.get_item(key)? {
            Some(raw) => raw,
            None => return Ok(Vec::new()),
        };

        match serde_json::from_str(&raw) {
            Ok(list) => Ok(list),
            Err(e) => {
                warn!(key, error = %e, "discarding malformed list");
                Ok(Vec::new())
            }
        }
    }

    fn write_list<R: Serialize>(&self, key: &str, list: &[R]) -> Result<(), StoreError> {
        let raw = serde_json::to_string(list)?;
        self.store.set_item(key, &raw)?;
        Ok(())
    }
}

/// Internal failure of a list operation, always logged and swallowed
#[derive(Debug, Error)]
enum StoreError {
    #[error(transparent)]
    Medium(#[from] lexstore::Error),
    #[error("encode failed: {0}")]
    Encode(#[from] serde_json::Error),
}
