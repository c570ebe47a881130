//! The key-value medium contract shared by every persistence layer

use std::sync::Arc;

use crate::error::Result;

/// String-keyed, string-valued durable medium
///
/// Implementations are process-wide shared handles; callers hold them
/// behind [`SharedStore`] and never assume exclusive access.
pub trait KeyValueStore: Send + Sync {
    /// Read the value for `key`, `None` when absent
    fn get_item(&self, key: &str) -> Result<Option<String>>;

    /// Write `value` under `key`, replacing any previous value
    fn set_item(&self, key: &str, value: &str) -> Result<()>;

    /// Delete `key`; absent keys are not an error
    fn remove_item(&self, key: &str) -> Result<()>;

    /// Every key currently held by the medium
    fn all_keys(&self) -> Result<Vec<String>>;

    /// Delete several keys, stopping at the first failure
    fn multi_remove(&self, keys: &[String]) -> Result<()> {
        for key in keys {
            self.remove_item(key)?;
        }
        Ok(())
    }
}

/// Shared handle to a key-value medium
pub type SharedStore = Arc<dyn KeyValueStore>;
