//! # lexstore
//!
//! Embedded key-value medium backing the dictionary client.
//!
//! ## Design
//! - String keys, string values (JSON documents in practice)
//! - Append-only log file, replayed on open
//! - In-memory index of key -> value location; values stay on disk
//! - Basic operations: GET, SET, REMOVE, KEYS, COMPACT
//! - 1 MB max value

#![warn(missing_docs)]

mod error;
mod kv;
mod memory;
mod parser;
mod storage;

pub use error::{Error, Result};
pub use kv::{KeyValueStore, SharedStore};
pub use memory::MemoryStore;
pub use storage::LexStore;
