//! Cache Module
//!
//! Two-tier caching (process memory in front of a durable store) with TTL
//! expiration and key/prefix invalidation.

mod entry;
pub mod keys;
mod stats;
mod store;


// Re-export public types
pub use entry::{current_timestamp_ms, CacheEntry};
pub use keys::CACHE_PREFIX;
pub use stats::CacheStats;
pub use store::TieredCache;

// == TTL Tiers ==
/// Named cache lifetimes.
pub mod ttl {
    use std::time::Duration;

    /// One minute
    pub const SHORT: Duration = Duration::from_millis(60_000);
    /// Five minutes
    pub const MEDIUM: Duration = Duration::from_millis(300_000);
    /// Thirty minutes
    pub const LONG: Duration = Duration::from_millis(1_800_000);
    /// One day
    pub const VERY_LONG: Duration = Duration::from_millis(86_400_000);
}
