//! Cache Entry Module
//!
//! Defines the structure for individual cache entries with TTL support.

use std::time::Duration;

use serde::{Deserialize, Serialize};

// == Cache Entry ==
/// A cached payload with its creation and absolute expiry instants.
///
/// The same structure is kept in memory and serialized to the durable
/// store, so both tiers agree on when an entry dies.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CacheEntry<T> {
    /// The cached payload
    pub data: T,
    /// Creation timestamp (Unix milliseconds)
    pub created_at: u64,
    /// Expiration timestamp (Unix milliseconds)
    pub expires_at: u64,
}

impl<T> CacheEntry<T> {
    // == Constructor ==
    /// Creates an entry that expires `ttl` from now.
    pub fn new(data: T, ttl: Duration) -> Self {
        let now = current_timestamp_ms();
        let ttl_ms = u64::try_from(ttl.as_millis()).unwrap_or(u64::MAX);

        Self {
            data,
            created_at: now,
            expires_at: now.saturating_add(ttl_ms),
        }
    }

    // == Is Expired ==
    /// Checks if the entry has expired.
    ///
    /// An entry is still alive at exactly `expires_at`; it is expired once
    /// the current time is strictly past it.
    pub fn is_expired(&self) -> bool {
        self.is_expired_at(current_timestamp_ms())
    }

    /// Expiry check against an explicit instant.
    pub fn is_expired_at(&self, now_ms: u64) -> bool {
        now_ms > self.expires_at
    }

    // == Time To Live ==
    /// Returns the time left before expiry, zero once expired.
    pub fn ttl_remaining(&self) -> Duration {
        Duration::from_millis(self.expires_at.saturating_sub(current_timestamp_ms()))
    }
}

// == Utility Functions ==
/// Returns current Unix timestamp in milliseconds.
pub fn current_timestamp_ms() -> u64 {
    u64::try_from(chrono::Utc::now().timestamp_millis()).unwrap_or(0)
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;
    use std::thread::sleep;

    #[test]
    fn test_entry_creation() {
        let entry = CacheEntry::new("test_value".to_string(), Duration::from_secs(60));

        assert_eq!(entry.data, "test_value");
        assert_eq!(entry.expires_at - entry.created_at, 60_000);
        assert!(!entry.is_expired());
    }

    #[test]
    fn test_entry_expiration() {
        let entry = CacheEntry::new(1, Duration::from_millis(1));

        sleep(Duration::from_millis(10));

        assert!(entry.is_expired());
        assert_eq!(entry.ttl_remaining(), Duration::ZERO);
    }

    #[test]
    fn test_ttl_remaining() {
        let entry = CacheEntry::new((), Duration::from_secs(10));

        let remaining = entry.ttl_remaining();
        assert!(remaining <= Duration::from_secs(10));
        assert!(remaining >= Duration::from_secs(9));
    }

    #[test]
    fn test_expiration_boundary_condition() {
        let now = current_timestamp_ms();
        let entry = CacheEntry {
            data: "test",
            created_at: now,
            expires_at: now,
        };

        assert!(!entry.is_expired_at(now), "Entry is alive at its expiry instant");
        assert!(entry.is_expired_at(now + 1));
    }

    #[test]
    fn test_entry_json_layout() {
        let entry = CacheEntry {
            data: serde_json::json!({"id": 7}),
            created_at: 1_000,
            expires_at: 61_000,
        };

        let json = serde_json::to_value(&entry).unwrap();
        assert_eq!(json["data"]["id"], 7);
        assert_eq!(json["createdAt"], 1_000);
        assert_eq!(json["expiresAt"], 61_000);

        let back: CacheEntry<serde_json::Value> = serde_json::from_value(json).unwrap();
        assert_eq!(back, entry);
    }

    #[test]
    fn test_huge_ttl_saturates() {
        let entry = CacheEntry::new(0u8, Duration::MAX);
        assert_eq!(entry.expires_at, u64::MAX);
        assert!(!entry.is_expired());
    }
}
