//! # lexcache
//!
//! Client-side persistence layers built on a [`lexstore::KeyValueStore`].
//!
//! ## Architecture
//! - **ExpiringCache**: lookup results keyed by word, evicted on read after 24h
//! - **LocalStore**: favorites and history lists, one JSON document per list
//! - **Failure policy**: medium errors are logged and degrade to absent/no-op
//!
//! Nothing is shadowed in memory; every read goes to the medium.

#![warn(missing_docs)]

mod cache;
mod local;
mod records;
mod stats;

pub use cache::{ExpiringCache, CACHE_PREFIX, EXPIRATION_MS};
pub use local::{LocalStore, FAVORITES_KEY, HISTORY_KEY, HISTORY_LIMIT};
pub use records::{FavoriteRecord, HistoryRecord};
pub use stats::{CacheStats, CacheStatsSnapshot, ReadOutcome};
