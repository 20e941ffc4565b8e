//! Tiered Cache Store Module
//!
//! Main cache engine: a fast in-process map in front of a durable store,
//! both governed by the same absolute expiry instants.

use std::collections::HashMap;
use std::future::Future;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use tracing::{debug, warn};

use crate::cache::keys::is_cache_key;
use crate::cache::stats::LookupCounters;
use crate::cache::{ttl, CacheEntry, CacheStats};
use crate::storage::DurableStore;

// == Memory Tier ==
#[derive(Debug, Default)]
struct MemoryTier {
    entries: HashMap<String, CacheEntry<Value>>,
    counters: LookupCounters,
}

// == Tiered Cache ==
/// Two-tier cache with TTL semantics.
///
/// Reads go memory first, then the durable store; a durable hit is copied
/// back into memory with the same expiry instant. Durable-store failures
/// are logged and degrade to a miss (read) or a memory-only write.
///
/// Expired entries are evicted lazily by the read that finds them. There is
/// no background sweep.
pub struct TieredCache {
    /// Fast tier, never held across an await
    memory: Mutex<MemoryTier>,
    /// Slow tier
    store: Arc<dyn DurableStore>,
    /// TTL used by callers that do not pass one
    default_ttl: Duration,
}

impl std::fmt::Debug for TieredCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TieredCache")
            .field("memory_size", &self.memory().entries.len())
            .field("default_ttl", &self.default_ttl)
            .finish_non_exhaustive()
    }
}

impl TieredCache {
    // == Constructor ==
    /// Creates a cache over `store` with the MEDIUM default TTL.
    pub fn new(store: Arc<dyn DurableStore>) -> Self {
        Self::with_default_ttl(store, ttl::MEDIUM)
    }

    /// Creates a cache over `store` with an explicit default TTL.
    pub fn with_default_ttl(store: Arc<dyn DurableStore>, default_ttl: Duration) -> Self {
        Self {
            memory: Mutex::new(MemoryTier::default()),
            store,
            default_ttl,
        }
    }

    /// TTL applied when the caller does not specify one.
    pub fn default_ttl(&self) -> Duration {
        self.default_ttl
    }

    fn memory(&self) -> MutexGuard<'_, MemoryTier> {
        self.memory.lock().unwrap_or_else(|e| e.into_inner())
    }

    // == Memory Tier ==
    /// Reads `key` from the memory tier.
    ///
    /// An expired entry is removed and reported as absent. A value that does
    /// not decode as `T` is also absent.
    pub fn get_memory<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        let data = {
            let mut memory = self.memory();
            let entry = memory.entries.get(key)?;
            if entry.is_expired() {
                memory.entries.remove(key);
                debug!(key, "memory entry expired");
                return None;
            }
            entry.data.clone()
        };

        let value = decode(key, data)?;
        self.memory().counters.memory_hits += 1;
        Some(value)
    }

    /// Stores `value` in the memory tier for `ttl`. Last write wins.
    pub fn set_memory<T: Serialize + ?Sized>(&self, key: &str, value: &T, ttl: Duration) {
        match serde_json::to_value(value) {
            Ok(data) => self.insert_memory(key, CacheEntry::new(data, ttl)),
            Err(e) => warn!(key, error = %e, "cannot serialize value for memory cache"),
        }
    }

    fn insert_memory(&self, key: &str, entry: CacheEntry<Value>) {
        self.memory().entries.insert(key.to_string(), entry);
    }

    /// Empties the memory tier only. The durable tier is untouched.
    pub fn clear_memory(&self) {
        self.memory().entries.clear();
    }

    // == Persistent Tier ==
    /// Reads `key` from the durable tier.
    ///
    /// On a hit the entry is copied into memory keeping its original
    /// expiry instant, so the memory copy lives only for the remaining TTL.
    /// An expired entry is removed from both tiers. I/O and decode failures
    /// are logged and reported as absent.
    pub async fn get_persistent<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        let raw = match self.store.get_item(key).await {
            Ok(Some(raw)) => raw,
            Ok(None) => {
                self.record_miss(key);
                return None;
            }
            Err(e) => {
                warn!(key, error = %e, "durable cache read failed");
                self.record_miss(key);
                return None;
            }
        };

        let entry: CacheEntry<Value> = match serde_json::from_str(&raw) {
            Ok(entry) => entry,
            Err(e) => {
                warn!(key, error = %e, "durable cache entry is corrupt");
                self.record_miss(key);
                return None;
            }
        };

        if entry.is_expired() {
            debug!(key, "durable entry expired");
            self.invalidate(key).await;
            self.record_miss(key);
            return None;
        }

        let Some(value) = decode(key, entry.data.clone()) else {
            self.record_miss(key);
            return None;
        };
        {
            let mut memory = self.memory();
            memory.entries.insert(key.to_string(), entry);
            memory.counters.persistent_hits += 1;
        }
        Some(value)
    }

    /// Writes `value` to the durable tier for `ttl`, then to memory.
    ///
    /// The memory tier is updated even when the durable write fails.
    pub async fn set_persistent<T: Serialize + ?Sized>(&self, key: &str, value: &T, ttl: Duration) {
        let data = match serde_json::to_value(value) {
            Ok(data) => data,
            Err(e) => {
                warn!(key, error = %e, "cannot serialize value for cache");
                return;
            }
        };
        let entry = CacheEntry::new(data, ttl);

        match serde_json::to_string(&entry) {
            Ok(raw) => {
                if let Err(e) = self.store.set_item(key, &raw).await {
                    warn!(key, error = %e, "durable cache write failed");
                }
            }
            Err(e) => warn!(key, error = %e, "cannot encode cache entry"),
        }

        self.insert_memory(key, entry);
    }

    fn record_miss(&self, key: &str) {
        debug!(key, "cache miss");
        self.memory().counters.misses += 1;
    }

    // == Cache First ==
    /// Returns the cached value for `key`, or runs `fetcher` and caches its
    /// result in both tiers.
    ///
    /// With `force_refresh` both tiers are skipped and overwritten with the
    /// fresh value. A fetcher error is returned unchanged and nothing is
    /// stored.
    pub async fn get_cache_first<T, E, F, Fut>(
        &self,
        key: &str,
        fetcher: F,
        ttl: Duration,
        force_refresh: bool,
    ) -> Result<T, E>
    where
        T: Serialize + DeserializeOwned,
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        self.get_cache_first_if(key, fetcher, ttl, force_refresh, |_| true)
            .await
    }

    /// Same as [`get_cache_first`](Self::get_cache_first), but a fetched
    /// value is only stored when `should_store` accepts it.
    pub async fn get_cache_first_if<T, E, F, Fut, P>(
        &self,
        key: &str,
        fetcher: F,
        ttl: Duration,
        force_refresh: bool,
        should_store: P,
    ) -> Result<T, E>
    where
        T: Serialize + DeserializeOwned,
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, E>>,
        P: FnOnce(&T) -> bool,
    {
        if force_refresh {
            debug!(key, "cache bypassed by force refresh");
        } else {
            if let Some(value) = self.get_memory(key) {
                debug!(key, "memory cache hit");
                return Ok(value);
            }
            if let Some(value) = self.get_persistent(key).await {
                debug!(key, "durable cache hit");
                return Ok(value);
            }
        }

        let value = fetcher().await?;
        if should_store(&value) {
            self.set_persistent(key, &value, ttl).await;
        } else {
            debug!(key, "fetched value not cached");
        }
        Ok(value)
    }

    // == Invalidation ==
    /// Removes `key` from both tiers. Absent keys are a no-op.
    pub async fn invalidate(&self, key: &str) {
        self.memory().entries.remove(key);
        if let Err(e) = self.store.remove_item(key).await {
            warn!(key, error = %e, "durable cache removal failed");
        }
    }

    /// Removes every key starting with `prefix` from both tiers.
    ///
    /// Matching durable keys are removed with a single bulk call.
    pub async fn invalidate_by_prefix(&self, prefix: &str) {
        let dropped = {
            let mut memory = self.memory();
            let before = memory.entries.len();
            memory.entries.retain(|key, _| !key.starts_with(prefix));
            before - memory.entries.len()
        };

        let removed = self.bulk_remove_where(|key| key.starts_with(prefix)).await;
        debug!(prefix, memory = dropped, durable = removed, "invalidated by prefix");
    }

    /// Empties memory and removes every durable key in the cache namespace.
    ///
    /// Durable data outside the namespace (auth tokens, settings of other
    /// subsystems) is left alone.
    pub async fn clear_all(&self) {
        self.clear_memory();
        let removed = self.bulk_remove_where(is_cache_key).await;
        debug!(durable = removed, "cache cleared");
    }

    async fn bulk_remove_where(&self, matches: impl Fn(&str) -> bool) -> usize {
        let keys = match self.store.get_all_keys().await {
            Ok(keys) => keys,
            Err(e) => {
                warn!(error = %e, "cannot list durable cache keys");
                return 0;
            }
        };

        let doomed: Vec<String> = keys.into_iter().filter(|key| matches(key.as_str())).collect();
        if doomed.is_empty() {
            return 0;
        }

        match self.store.multi_remove(&doomed).await {
            Ok(()) => doomed.len(),
            Err(e) => {
                warn!(error = %e, count = doomed.len(), "durable bulk removal failed");
                0
            }
        }
    }

    // == Stats ==
    /// Returns the memory tier size, its keys and the lookup counters.
    pub fn stats(&self) -> CacheStats {
        let memory = self.memory();
        let mut keys: Vec<String> = memory.entries.keys().cloned().collect();
        keys.sort();

        CacheStats {
            memory_size: memory.entries.len(),
            keys,
            memory_hits: memory.counters.memory_hits,
            persistent_hits: memory.counters.persistent_hits,
            misses: memory.counters.misses,
        }
    }
}

fn decode<T: DeserializeOwned>(key: &str, data: Value) -> Option<T> {
    match serde_json::from_value(data) {
        Ok(value) => Some(value),
        Err(e) => {
            warn!(key, error = %e, "cached value has unexpected shape");
            None
        }
    }
}
