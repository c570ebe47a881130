//! Error types for lexstore

use std::io;

use thiserror::Error;

/// Result type alias for lexstore operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error types for storage operations
#[derive(Debug, Error)]
pub enum Error {
    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// Parse error
    #[error("Parse error: {0}")]
    Parse(String),

    /// Value too large (max 1 MB)
    #[error("Value too large: {0} bytes (max 1 MB)")]
    ValueTooLarge(usize),

    /// Store is closed
    #[error("Store is closed")]
    Closed,

    /// Medium refused the operation
    #[error("Storage unavailable: {0}")]
    Unavailable(String),
}

impl From<nom::Err<nom::error::Error<&[u8]>>> for Error {
    fn from(err: nom::Err<nom::error::Error<&[u8]>>) -> Self {
        Error::Parse(format!("{:?}", err))
    }
}
