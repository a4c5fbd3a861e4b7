//! Error types for the opal bid engine.
//!
//! A scan that finds no bid is not an error; see [`crate::ScanResult`].
//! Only configuration mistakes, oversize input under the reject policy, and
//! persistence failures surface here.

use thiserror::Error;

/// Result type alias using our Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for the opal bid engine.
#[derive(Error, Debug)]
pub enum Error {
    /// Invalid engine options.
    #[error("Malformed options: {0}")]
    MalformedOptions(String),

    /// Document exceeds the configured size bound.
    #[error("Input too large: {size} bytes exceeds the limit of {limit} bytes")]
    InputTooLarge { size: usize, limit: usize },

    /// Seen-set persistence error.
    #[error("Storage error: {0}")]
    Storage(String),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Generic error with message.
    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Create a malformed options error.
    pub fn malformed_options(msg: impl Into<String>) -> Self {
        Error::MalformedOptions(msg.into())
    }

    /// Create an input too large error.
    pub fn input_too_large(size: usize, limit: usize) -> Self {
        Error::InputTooLarge { size, limit }
    }

    /// Create a storage error.
    pub fn storage(msg: impl Into<String>) -> Self {
        Error::Storage(msg.into())
    }

    /// Create a generic error.
    pub fn other(msg: impl Into<String>) -> Self {
        Error::Other(msg.into())
    }
}
