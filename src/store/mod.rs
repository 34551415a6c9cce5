//! Synchronous string-keyed storage shared by the embed cache and auth state.
//!
//! Every call may fail; callers decide whether a failure is fatal. The embed
//! cache swallows them, auth state propagates them.

mod file;
mod memory;

pub use file::FileStore;
pub use memory::MemoryStore;

use std::sync::Arc;

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("storage unavailable: {0}")]
    Unavailable(String),
    #[error("storage quota exceeded ({used} of {limit} bytes)")]
    QuotaExceeded { used: usize, limit: usize },
    #[error("storage I/O failed")]
    Io(#[from] std::io::Error),
    #[error("storage file is corrupt")]
    Corrupt(#[source] serde_json::Error),
}

/// A persistent store in the shape of browser `localStorage`.
pub trait KeyValueStore: Send + Sync {
    /// Retrieve a value by key, or `None` if not present.
    fn get_item(&self, key: &str) -> Result<Option<String>, StoreError>;

    /// Insert or overwrite a key-value pair.
    fn set_item(&self, key: &str, value: &str) -> Result<(), StoreError>;

    /// Remove a key. Removing an absent key succeeds.
    fn remove_item(&self, key: &str) -> Result<(), StoreError>;

    /// Enumerate every key currently in the store.
    fn keys(&self) -> Result<Vec<String>, StoreError>;
}

impl<T: KeyValueStore + ?Sized> KeyValueStore for Arc<T> {
    fn get_item(&self, key: &str) -> Result<Option<String>, StoreError> {
        (**self).get_item(key)
    }

    fn set_item(&self, key: &str, value: &str) -> Result<(), StoreError> {
        (**self).set_item(key, value)
    }

    fn remove_item(&self, key: &str) -> Result<(), StoreError> {
        (**self).remove_item(key)
    }

    fn keys(&self) -> Result<Vec<String>, StoreError> {
        (**self).keys()
    }
}
