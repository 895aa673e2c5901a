//! Persistence Adapters
//!
//! Implementations of `LocalStoragePort`.

pub mod file_storage;
pub mod in_memory;

pub use file_storage::FileStorage;
pub use in_memory::InMemoryStorage;
