//! Error types for the dictionary core

use reqwest::StatusCode;
use thiserror::Error;

/// Failure of a word lookup; always reaches the caller
#[derive(Debug, Error)]
pub enum LookupError {
    /// Nothing to look up after normalization
    #[error("word is empty")]
    EmptyWord,

    /// The lexical API has no entry for the word
    #[error("word '{word}' not found")]
    NotFound {
        /// Normalized word that was requested
        word: String,
    },

    /// Non-success status other than 404
    #[error("lookup failed with HTTP {status}")]
    Http {
        /// Response status
        status: StatusCode,
    },

    /// Transport failure before a response arrived
    #[error("network error: {message}")]
    Network {
        /// Transport error description
        message: String,
    },

    /// Response body was not the expected JSON shape
    #[error("malformed lookup response: {message}")]
    Decode {
        /// Decoder error description
        message: String,
    },
}

impl LookupError {
    /// Whether asking again later may succeed
    pub fn is_retryable(&self) -> bool {
        match self {
            LookupError::Network { .. } => true,
            LookupError::Http { status } => status.is_server_error(),
            _ => false,
        }
    }
}

/// Failure talking to the remote synced store
#[derive(Debug, Error)]
pub enum SyncError {
    /// No remote store was configured
    #[error("remote store is not configured")]
    NotConfigured,

    /// Transport failure
    #[error("remote request failed: {message}")]
    Request {
        /// Transport error description
        message: String,
    },

    /// Non-success response
    #[error("remote store returned HTTP {status}: {body}")]
    Http {
        /// Response status
        status: StatusCode,
        /// Response body, `<empty>` when blank
        body: String,
    },

    /// Response body was not the expected JSON shape
    #[error("malformed remote response: {message}")]
    Decode {
        /// Decoder error description
        message: String,
    },
}

/// Top-level error for dictionary operations
#[derive(Debug, Error)]
pub enum DictionaryError {
    /// Word lookup failed
    #[error(transparent)]
    Lookup(#[from] LookupError),

    /// Remote synced store failed
    #[error(transparent)]
    Sync(#[from] SyncError),

    /// Local medium could not be opened
    #[error("storage error: {0}")]
    Storage(#[from] lexstore::Error),

    /// Configuration is unusable
    #[error("invalid configuration: {0}")]
    Config(String),
}
