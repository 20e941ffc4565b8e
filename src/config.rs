//! Configuration Module
//!
//! Handles loading client configuration from environment variables.

use std::env;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use crate::cache::ttl;
use crate::fetch::RetryPolicy;

/// Client configuration parameters.
///
/// All values can be configured via environment variables with sensible defaults.
#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    /// Base URL every endpoint is appended to
    pub api_base_url: String,
    /// Directory of the durable cache tier
    pub cache_dir: PathBuf,
    /// TTL for cached responses when the caller gives none
    pub default_cache_ttl: Duration,
    /// Retry policy for network calls
    pub retry: RetryPolicy,
    /// Fixed bearer token; when absent the token stored by sign-in is used
    pub auth_token: Option<String>,
}

impl Config {
    /// Creates a new Config by loading values from environment variables.
    ///
    /// # Environment Variables
    /// - `API_BASE_URL` - API root (default: http://localhost:3000/api)
    /// - `CACHE_DIR` - Durable cache directory (default: .api_cache)
    /// - `DEFAULT_CACHE_TTL_MS` - Default cache TTL (default: 300000)
    /// - `MAX_RETRIES` - Retries after the first attempt (default: 3)
    /// - `RETRY_BASE_DELAY_MS` - First backoff delay (default: 1000)
    /// - `RETRY_MAX_DELAY_MS` - Backoff cap (default: 10000)
    /// - `RETRY_MAX_JITTER_MS` - Random offset bound (default: 1000)
    /// - `AUTH_TOKEN` - Fixed bearer token (default: unset)
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            api_base_url: env::var("API_BASE_URL").unwrap_or(defaults.api_base_url),
            cache_dir: env::var("CACHE_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.cache_dir),
            default_cache_ttl: env_millis("DEFAULT_CACHE_TTL_MS", defaults.default_cache_ttl),
            retry: RetryPolicy {
                max_retries: env_parse("MAX_RETRIES", defaults.retry.max_retries),
                base_delay: env_millis("RETRY_BASE_DELAY_MS", defaults.retry.base_delay),
                max_delay: env_millis("RETRY_MAX_DELAY_MS", defaults.retry.max_delay),
                max_jitter: env_millis("RETRY_MAX_JITTER_MS", defaults.retry.max_jitter),
            },
            auth_token: env::var("AUTH_TOKEN").ok().filter(|t| !t.is_empty()),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_base_url: "http://localhost:3000/api".to_string(),
            cache_dir: PathBuf::from(".api_cache"),
            default_cache_ttl: ttl::MEDIUM,
            retry: RetryPolicy::default(),
            auth_token: None,
        }
    }
}

fn env_parse<T: FromStr>(name: &str, default: T) -> T {
    env::var(name)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

fn env_millis(name: &str, default: Duration) -> Duration {
    env::var(name)
        .ok()
        .and_then(|v| v.parse().ok())
        .map(Duration::from_millis)
        .unwrap_or(default)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_default() {
        let config = Config::default();
        assert_eq!(config.api_base_url, "http://localhost:3000/api");
        assert_eq!(config.cache_dir, PathBuf::from(".api_cache"));
        assert_eq!(config.default_cache_ttl, Duration::from_millis(300_000));
        assert_eq!(config.retry, RetryPolicy::default());
        assert_eq!(config.auth_token, None);
    }

    #[test]
    fn test_config_from_env_defaults() {
        // Clear any existing env vars to test defaults
        for name in [
            "API_BASE_URL",
            "CACHE_DIR",
            "DEFAULT_CACHE_TTL_MS",
            "MAX_RETRIES",
            "RETRY_BASE_DELAY_MS",
            "RETRY_MAX_DELAY_MS",
            "RETRY_MAX_JITTER_MS",
            "AUTH_TOKEN",
        ] {
            env::remove_var(name);
        }

        assert_eq!(Config::from_env(), Config::default());
    }

    #[test]
    fn test_unparsable_values_fall_back() {
        assert_eq!(env_parse("API_CACHE_TEST_UNSET_VAR", 7u32), 7);
        env::set_var("API_CACHE_TEST_BAD_MS", "soon");
        assert_eq!(
            env_millis("API_CACHE_TEST_BAD_MS", Duration::from_secs(1)),
            Duration::from_secs(1)
        );
        env::set_var("API_CACHE_TEST_GOOD_MS", "250");
        assert_eq!(
            env_millis("API_CACHE_TEST_GOOD_MS", Duration::ZERO),
            Duration::from_millis(250)
        );
    }
}
