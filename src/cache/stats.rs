//! Cache Statistics Module
//!
//! Introspection snapshot of the memory tier plus lookup counters.

use serde::Serialize;

// == Cache Stats ==
/// Snapshot returned by [`TieredCache::stats`](super::TieredCache::stats).
///
/// `memory_size` is the raw map count. Entries that are logically expired
/// but not yet touched by a read are still counted.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CacheStats {
    /// Number of entries currently held by the memory tier
    pub memory_size: usize,
    /// Keys currently held by the memory tier, sorted
    pub keys: Vec<String>,
    /// Lookups answered by the memory tier
    pub memory_hits: u64,
    /// Lookups answered by the durable tier
    pub persistent_hits: u64,
    /// Lookups that found nothing in either tier
    pub misses: u64,
}

impl CacheStats {
    // == Hit Rate ==
    /// Returns hits / (hits + misses), or 0.0 if no lookups were made.
    pub fn hit_rate(&self) -> f64 {
        let hits = self.memory_hits + self.persistent_hits;
        let total = hits + self.misses;
        if total == 0 {
            0.0
        } else {
            hits as f64 / total as f64
        }
    }
}

// == Lookup Counters ==
/// Running counters kept next to the memory map.
#[derive(Debug, Clone, Copy, Default)]
pub(crate) struct LookupCounters {
    pub memory_hits: u64,
    pub persistent_hits: u64,
    pub misses: u64,
}
