//! Fetch Module
//!
//! Outbound network calls: the [`Transport`] seam, the retry policy and the
//! [`Fetcher`] that combines them. Nothing here knows about caching.

mod fetcher;
mod retry;
mod transport;

pub use fetcher::Fetcher;
pub use retry::{
    BackoffPolicy, RetryPolicy, DEFAULT_BASE_DELAY, DEFAULT_MAX_DELAY, DEFAULT_MAX_JITTER,
    DEFAULT_MAX_RETRIES,
};
pub use transport::{HttpRequest, HttpResponse, Method, ReqwestTransport, Transport};
