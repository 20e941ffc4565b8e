//! Client Module
//!
//! The request coordinator used by the application's data hooks: cache-first
//! reads, in-flight deduplication and cache invalidation after mutations.

mod api;
mod coalesce;

pub use api::{request_key, ApiClient};
pub use coalesce::{RequestCoalescer, SharedRequest};
