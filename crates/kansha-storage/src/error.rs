//! Error types for kansha-storage

use thiserror::Error;

/// Errors that can occur in key-value storage operations
#[derive(Debug, Error)]
pub enum StorageError {
    /// I/O error during a storage operation
    #[error("I/O error: {0}")]
    Io(String),

    /// Key contains characters the backend cannot represent
    #[error("Invalid key: {0}")]
    InvalidKey(String),
}

impl From<std::io::Error> for StorageError {
    fn from(err: std::io::Error) -> Self {
        StorageError::Io(err.to_string())
    }
}

impl StorageError {
    /// Create an I/O error with a message
    pub fn io(message: impl Into<String>) -> Self {
        StorageError::Io(message.into())
    }

    /// Create an invalid-key error naming the offending key
    pub fn invalid_key(key: impl Into<String>) -> Self {
        StorageError::InvalidKey(key.into())
    }
}
