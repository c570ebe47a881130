//! # lexdict
//!
//! Dictionary core: word lookups through an expiring cache, a remote synced
//! store for signed-in users, and the controller that keeps favorites and
//! history consistent with whichever store is authoritative.
//!
//! ## Architecture
//! - **WordLookup**: cache first, remote lexical API on a miss, write back
//! - **RemoteStore**: favorites/history collections scoped to a [`Session`]
//! - **DictionaryController**: owns the in-memory projections and routes
//!   every mutation to the local or remote store
//! - **Dictionary**: assembles the object graph once at startup

#![warn(missing_docs)]

pub mod api;
pub mod app;
pub mod auth;
pub mod config;
pub mod controller;
pub mod error;
pub mod lookup;
pub mod model;
pub mod postgrest;
pub mod remote;
pub mod words;

#[cfg(test)]
pub(crate) mod test_support;

pub use api::DictionaryApi;
pub use app::Dictionary;
pub use auth::{AuthState, Session};
pub use config::{DictionaryConfig, RemoteConfig};
pub use controller::{DictionaryController, DictionarySnapshot, SyncOutcome};
pub use error::{DictionaryError, LookupError, SyncError};
pub use lookup::{normalize_word, WordLookup, WordSource};
pub use model::{Definition, FavoriteRecord, HistoryRecord, Meaning, Phonetic, Word, WordItem};
pub use remote::{PostgrestStore, RemoteFavorite, RemoteHistory, RemoteStore};
pub use words::{WordsPage, WordsService, DEFAULT_SEARCH_LIMIT, WORDS_PER_PAGE};
