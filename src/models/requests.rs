//! Per-call options for the API client verbs.

use std::time::Duration;

use crate::cache::ttl;

/// Options for [`ApiClient::get`](crate::client::ApiClient::get)
///
/// # Fields
/// - `cache_key`: cache and deduplicate under this key; without it the
///   response is never cached and requests are deduplicated per endpoint
/// - `cache_duration`: TTL of the cached response
/// - `force_refresh`: skip both cache tiers and overwrite them
/// - `require_auth`: attach the bearer token when one is available
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GetOptions {
    pub cache_key: Option<String>,
    pub cache_duration: Duration,
    pub force_refresh: bool,
    pub require_auth: bool,
}

impl Default for GetOptions {
    fn default() -> Self {
        Self {
            cache_key: None,
            cache_duration: ttl::MEDIUM,
            force_refresh: false,
            require_auth: true,
        }
    }
}

impl GetOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Options caching the response under `key`.
    pub fn cached(key: impl Into<String>) -> Self {
        Self::default().cache_key(key)
    }

    pub fn cache_key(mut self, key: impl Into<String>) -> Self {
        self.cache_key = Some(key.into());
        self
    }

    pub fn cache_duration(mut self, duration: Duration) -> Self {
        self.cache_duration = duration;
        self
    }

    pub fn force_refresh(mut self, force: bool) -> Self {
        self.force_refresh = force;
        self
    }

    pub fn require_auth(mut self, require: bool) -> Self {
        self.require_auth = require;
        self
    }
}

/// Options for `post`, `put` and `delete`
///
/// # Fields
/// - `require_auth`: attach the bearer token when one is available
/// - `invalidate_cache_keys`: removed from the cache once the server
///   confirms the mutation with `success: true`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MutationOptions {
    pub require_auth: bool,
    pub invalidate_cache_keys: Vec<String>,
}

impl Default for MutationOptions {
    fn default() -> Self {
        Self {
            require_auth: true,
            invalidate_cache_keys: Vec::new(),
        }
    }
}

impl MutationOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a key to invalidate on success.
    pub fn invalidate(mut self, key: impl Into<String>) -> Self {
        self.invalidate_cache_keys.push(key.into());
        self
    }

    pub fn require_auth(mut self, require: bool) -> Self {
        self.require_auth = require;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_get_options_defaults() {
        let options = GetOptions::default();
        assert_eq!(options.cache_key, None);
        assert_eq!(options.cache_duration, ttl::MEDIUM);
        assert!(!options.force_refresh);
        assert!(options.require_auth);
    }

    #[test]
    fn test_get_options_builder() {
        let options = GetOptions::cached("cache_teachers_1")
            .cache_duration(ttl::LONG)
            .force_refresh(true)
            .require_auth(false);

        assert_eq!(options.cache_key.as_deref(), Some("cache_teachers_1"));
        assert_eq!(options.cache_duration, ttl::LONG);
        assert!(options.force_refresh);
        assert!(!options.require_auth);
    }

    #[test]
    fn test_mutation_options_builder() {
        let options = MutationOptions::new().invalidate("a").invalidate("b");
        assert_eq!(options.invalidate_cache_keys, vec!["a", "b"]);
        assert!(options.require_auth);
    }
}
