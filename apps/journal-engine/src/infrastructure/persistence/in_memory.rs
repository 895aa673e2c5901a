//! In-memory document storage for testing.

use std::collections::HashMap;

use parking_lot::RwLock;

use crate::application::ports::{LocalStoragePort, StorageError};

/// In-memory implementation of `LocalStoragePort`.
///
/// Suitable for testing and development. Nothing survives the process.
#[derive(Debug, Default)]
pub struct InMemoryStorage {
    documents: RwLock<HashMap<String, String>>,
}

impl InMemoryStorage {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored documents.
    #[must_use]
    pub fn len(&self) -> usize {
        self.documents.read().len()
    }

    /// Whether nothing has been written.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.documents.read().is_empty()
    }
}

impl LocalStoragePort for InMemoryStorage {
    fn read(&self, key: &str) -> Result<Option<String>, StorageError> {
        Ok(self.documents.read().get(key).cloned())
    }

    fn write(&self, key: &str, contents: &str) -> Result<(), StorageError> {
        self.documents
            .write()
            .insert(key.to_string(), contents.to_string());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn read_missing_is_none() {
        let storage = InMemoryStorage::new();
        assert_eq!(storage.read("nothing").unwrap(), None);
        assert!(storage.is_empty());
    }

    #[test]
    fn write_replaces() {
        let storage = InMemoryStorage::new();
        storage.write("k", "1").unwrap();
        storage.write("k", "2").unwrap();
        assert_eq!(storage.read("k").unwrap().as_deref(), Some("2"));
        assert_eq!(storage.len(), 1);
    }
}
