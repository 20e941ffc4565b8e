//! In-process durable store stand-in.

use std::collections::HashMap;
use std::io;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;

use super::{DurableStore, StorageResult};
use crate::error::StorageError;

// == Memory Store ==
/// A [`DurableStore`] kept in a process-local map.
///
/// Used by tests and as a fallback when no cache directory is usable. Call
/// counters and failure switches let callers observe and disturb how the
/// cache talks to its durable tier.
#[derive(Debug, Default)]
pub struct MemoryStore {
    items: Mutex<HashMap<String, String>>,
    get_item_calls: AtomicUsize,
    remove_item_calls: AtomicUsize,
    multi_remove_calls: AtomicUsize,
    fail_reads: AtomicBool,
    fail_writes: AtomicBool,
}

impl MemoryStore {
    // == Constructor ==
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of `get_item` calls so far.
    pub fn get_item_calls(&self) -> usize {
        self.get_item_calls.load(Ordering::SeqCst)
    }

    /// Number of `remove_item` calls so far.
    pub fn remove_item_calls(&self) -> usize {
        self.remove_item_calls.load(Ordering::SeqCst)
    }

    /// Number of `multi_remove` calls so far.
    pub fn multi_remove_calls(&self) -> usize {
        self.multi_remove_calls.load(Ordering::SeqCst)
    }

    /// Makes every subsequent read fail with an I/O error.
    pub fn set_fail_reads(&self, fail: bool) {
        self.fail_reads.store(fail, Ordering::SeqCst);
    }

    /// Makes every subsequent write or removal fail with an I/O error.
    pub fn set_fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    /// Returns the raw stored string without counting a read.
    pub fn raw(&self, key: &str) -> Option<String> {
        self.lock().get(key).cloned()
    }

    /// Number of stored keys.
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    /// Returns true if nothing is stored.
    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<String, String>> {
        // A poisoned map is still a usable map.
        self.items.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn check(&self, flag: &AtomicBool, op: &str) -> StorageResult<()> {
        if flag.load(Ordering::SeqCst) {
            return Err(StorageError::Io(io::Error::new(
                io::ErrorKind::Other,
                format!("injected {op} failure"),
            )));
        }
        Ok(())
    }
}

#[async_trait]
impl DurableStore for MemoryStore {
    async fn get_item(&self, key: &str) -> StorageResult<Option<String>> {
        self.get_item_calls.fetch_add(1, Ordering::SeqCst);
        self.check(&self.fail_reads, "read")?;
        Ok(self.lock().get(key).cloned())
    }

    async fn set_item(&self, key: &str, value: &str) -> StorageResult<()> {
        self.check(&self.fail_writes, "write")?;
        self.lock().insert(key.to_string(), value.to_string());
        Ok(())
    }

    async fn remove_item(&self, key: &str) -> StorageResult<()> {
        self.remove_item_calls.fetch_add(1, Ordering::SeqCst);
        self.check(&self.fail_writes, "remove")?;
        self.lock().remove(key);
        Ok(())
    }

    async fn get_all_keys(&self) -> StorageResult<Vec<String>> {
        self.check(&self.fail_reads, "list")?;
        Ok(self.lock().keys().cloned().collect())
    }

    async fn multi_remove(&self, keys: &[String]) -> StorageResult<()> {
        self.multi_remove_calls.fetch_add(1, Ordering::SeqCst);
        self.check(&self.fail_writes, "remove")?;
        let mut items = self.lock();
        for key in keys {
            items.remove(key);
        }
        Ok(())
    }
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_set_get_remove() {
        let store = MemoryStore::new();

        store.set_item("k", "v").await.unwrap();
        assert_eq!(store.get_item("k").await.unwrap().as_deref(), Some("v"));

        store.remove_item("k").await.unwrap();
        assert_eq!(store.get_item("k").await.unwrap(), None);

        // Absent key removal is fine
        store.remove_item("k").await.unwrap();
        assert_eq!(store.remove_item_calls(), 2);
    }

    #[tokio::test]
    async fn test_multi_remove_counts_one_call() {
        let store = MemoryStore::new();
        for key in ["a", "b", "c"] {
            store.set_item(key, "1").await.unwrap();
        }

        store
            .multi_remove(&["a".to_string(), "b".to_string(), "zz".to_string()])
            .await
            .unwrap();

        assert_eq!(store.multi_remove_calls(), 1);
        assert_eq!(store.get_all_keys().await.unwrap(), vec!["c".to_string()]);
    }

    #[tokio::test]
    async fn test_injected_failures() {
        let store = MemoryStore::new();
        store.set_fail_writes(true);
        assert!(store.set_item("k", "v").await.is_err());
        assert!(store.is_empty());

        store.set_fail_writes(false);
        store.set_item("k", "v").await.unwrap();
        store.set_fail_reads(true);
        assert!(store.get_item("k").await.is_err());
        assert_eq!(store.raw("k").as_deref(), Some("v"));
    }
}
