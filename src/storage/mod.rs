//! Durable Storage Module
//!
//! The slow tier of the cache: an asynchronous string key/value store that
//! survives process restarts. The cache treats stored values as opaque
//! JSON blobs.

mod file;
mod memory;

use async_trait::async_trait;

use crate::error::StorageError;

pub use file::FileStore;
pub use memory::MemoryStore;

/// Convenience Result type for durable store operations.
pub type StorageResult<T> = std::result::Result<T, StorageError>;

// == Durable Store ==
/// Asynchronous key/value store backing the persistent cache tier.
#[async_trait]
pub trait DurableStore: Send + Sync {
    /// Returns the stored string, or `None` if the key is absent.
    async fn get_item(&self, key: &str) -> StorageResult<Option<String>>;

    /// Stores a string, replacing any previous value.
    async fn set_item(&self, key: &str, value: &str) -> StorageResult<()>;

    /// Removes a key. Removing an absent key is not an error.
    async fn remove_item(&self, key: &str) -> StorageResult<()>;

    /// Lists every key in the store, including keys owned by other
    /// subsystems.
    async fn get_all_keys(&self) -> StorageResult<Vec<String>>;

    /// Removes several keys in one operation.
    async fn multi_remove(&self, keys: &[String]) -> StorageResult<()>;
}
