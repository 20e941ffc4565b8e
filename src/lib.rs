//! API Cache - client-side caching and request coordination
//!
//! A two-tier (memory + durable) cache with TTL expiration, a retrying
//! fetcher with exponential backoff, and an API client that serves reads
//! cache-first, deduplicates concurrent requests and invalidates cached
//! entries after successful mutations.

pub mod auth;
pub mod cache;
pub mod client;
pub mod config;
pub mod error;
pub mod fetch;
pub mod models;
pub mod storage;

pub use cache::TieredCache;
pub use client::ApiClient;
pub use config::Config;
pub use error::{ApiError, Result};
pub use models::{ApiResponse, GetOptions, MutationOptions};
