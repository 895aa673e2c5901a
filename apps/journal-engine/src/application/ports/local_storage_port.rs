//! Local Storage Port (Driven Port)
//!
//! Durable key/value documents on the local device. Writes are synchronous so
//! that a successful `put` on a store means the data is on disk.

use thiserror::Error;

/// Local storage error.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StorageError {
    /// Reading or writing failed.
    #[error("Storage I/O error for '{key}': {message}")]
    Io {
        /// Document key.
        key: String,
        /// Error details.
        message: String,
    },

    /// A stored document could not be parsed.
    #[error("Corrupt document '{key}': {message}")]
    Corrupt {
        /// Document key.
        key: String,
        /// Error details.
        message: String,
    },

    /// A value could not be serialized.
    #[error("Serialization error: {message}")]
    Serialize {
        /// Error details.
        message: String,
    },
}

/// Port for local document storage.
pub trait LocalStoragePort: Send + Sync {
    /// Read a document, `None` when it has never been written.
    fn read(&self, key: &str) -> Result<Option<String>, StorageError>;

    /// Replace a document.
    fn write(&self, key: &str, contents: &str) -> Result<(), StorageError>;
}
