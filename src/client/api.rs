//! API client: cache-first reads, deduplicated fetches, invalidating
//! mutations.

use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use tracing::debug;

use super::coalesce::{RequestCoalescer, SharedRequest};
use crate::auth::TokenProvider;
use crate::cache::TieredCache;
use crate::error::{ApiError, Result};
use crate::fetch::{Fetcher, HttpRequest, Method};
use crate::models::{ApiResponse, GetOptions, MutationOptions};

// == Api Client ==
/// Single entry point for remote resources.
///
/// Reads go through the [`TieredCache`] and the [`RequestCoalescer`];
/// mutations go straight to the [`Fetcher`] and invalidate cache keys once
/// the server confirms them.
#[derive(Clone)]
pub struct ApiClient {
    base_url: String,
    cache: Arc<TieredCache>,
    fetcher: Fetcher,
    tokens: Arc<dyn TokenProvider>,
    coalescer: RequestCoalescer,
}

impl ApiClient {
    // == Constructor ==
    pub fn new(
        base_url: impl Into<String>,
        cache: Arc<TieredCache>,
        fetcher: Fetcher,
        tokens: Arc<dyn TokenProvider>,
    ) -> Self {
        Self {
            base_url: base_url.into(),
            cache,
            fetcher,
            tokens,
            coalescer: RequestCoalescer::new(),
        }
    }

    /// The cache shared by every read.
    pub fn cache(&self) -> &Arc<TieredCache> {
        &self.cache
    }

    /// The registry of in-flight reads.
    pub fn coalescer(&self) -> &RequestCoalescer {
        &self.coalescer
    }

    // == Get ==
    /// Reads `endpoint`.
    ///
    /// With a cache key the response is served cache-first and stored for
    /// `cache_duration`; `force_refresh` skips and overwrites the cache.
    /// Without a cache key nothing is cached. Concurrent reads with the same
    /// cache key (or, without one, the same endpoint) share one network call.
    /// `success: false` responses are returned but never cached.
    pub async fn get<T>(&self, endpoint: &str, options: GetOptions) -> Result<ApiResponse<T>>
    where
        T: Serialize + DeserializeOwned,
    {
        let request = self
            .build_request(Method::Get, endpoint, None, options.require_auth)
            .await;
        let request_key = request_key(endpoint, options.cache_key.as_deref());

        let Some(cache_key) = options.cache_key.as_deref() else {
            let value = self.fetch_shared(&request_key, request).await?;
            return decode_envelope(value);
        };

        self.cache
            .get_cache_first_if(
                cache_key,
                || async {
                    let value = self.fetch_shared(&request_key, request).await?;
                    decode_envelope::<T>(value)
                },
                options.cache_duration,
                options.force_refresh,
                ApiResponse::is_success,
            )
            .await
    }

    fn fetch_shared(&self, key: &str, request: HttpRequest) -> SharedRequest {
        let fetcher = self.fetcher.clone();
        self.coalescer
            .run(key, move || async move { fetcher.fetch(&request).await })
    }

    // == Mutations ==
    /// Sends `body` to `endpoint` with POST.
    pub async fn post<T, B>(
        &self,
        endpoint: &str,
        body: &B,
        options: MutationOptions,
    ) -> Result<ApiResponse<T>>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        let body = encode_body(body)?;
        self.mutate(Method::Post, endpoint, Some(body), options).await
    }

    /// Sends `body` to `endpoint` with PUT.
    pub async fn put<T, B>(
        &self,
        endpoint: &str,
        body: &B,
        options: MutationOptions,
    ) -> Result<ApiResponse<T>>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        let body = encode_body(body)?;
        self.mutate(Method::Put, endpoint, Some(body), options).await
    }

    /// Sends DELETE to `endpoint`.
    pub async fn delete<T>(&self, endpoint: &str, options: MutationOptions) -> Result<ApiResponse<T>>
    where
        T: DeserializeOwned,
    {
        self.mutate(Method::Delete, endpoint, None, options).await
    }

    /// One resilient call, never deduplicated. Cache keys are invalidated
    /// only after a `success: true` response.
    async fn mutate<T: DeserializeOwned>(
        &self,
        method: Method,
        endpoint: &str,
        body: Option<Value>,
        options: MutationOptions,
    ) -> Result<ApiResponse<T>> {
        let request = self
            .build_request(method, endpoint, body, options.require_auth)
            .await;
        let value = self.fetcher.fetch(&request).await?;
        let response: ApiResponse<T> = decode_envelope(value)?;

        if response.success {
            for key in &options.invalidate_cache_keys {
                self.cache.invalidate(key).await;
            }
            debug!(
                %method,
                endpoint,
                invalidated = options.invalidate_cache_keys.len(),
                "mutation confirmed"
            );
        } else {
            debug!(%method, endpoint, "mutation rejected, cache untouched");
        }
        Ok(response)
    }

    // == Imperative Invalidation ==
    /// Removes one key from both cache tiers.
    pub async fn invalidate_cache(&self, key: &str) {
        self.cache.invalidate(key).await;
    }

    /// Removes every key starting with `prefix` from both cache tiers.
    pub async fn invalidate_cache_by_prefix(&self, prefix: &str) {
        self.cache.invalidate_by_prefix(prefix).await;
    }

    /// Removes every cache entry, leaving other durable data alone.
    pub async fn clear_cache(&self) {
        self.cache.clear_all().await;
    }

    // == Request Building ==
    async fn build_request(
        &self,
        method: Method,
        endpoint: &str,
        body: Option<Value>,
        require_auth: bool,
    ) -> HttpRequest {
        let mut request = HttpRequest::new(method, join_url(&self.base_url, endpoint));
        if require_auth {
            match self.tokens.token().await {
                Some(token) => request = request.with_bearer(&token),
                None => debug!(endpoint, "no auth token available"),
            }
        }
        if let Some(body) = body {
            request = request.with_json(body);
        }
        request
    }
}

impl std::fmt::Debug for ApiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiClient")
            .field("base_url", &self.base_url)
            .field("cache", &self.cache)
            .field("coalescer", &self.coalescer)
            .finish_non_exhaustive()
    }
}

/// Deduplication key: the cache key when given, else `get_<endpoint>`.
pub fn request_key(endpoint: &str, cache_key: Option<&str>) -> String {
    match cache_key {
        Some(key) => key.to_string(),
        None => format!("get_{endpoint}"),
    }
}

fn join_url(base: &str, endpoint: &str) -> String {
    if endpoint.starts_with("http://") || endpoint.starts_with("https://") {
        return endpoint.to_string();
    }
    let base = base.trim_end_matches('/');
    if endpoint.starts_with('/') {
        format!("{base}{endpoint}")
    } else {
        format!("{base}/{endpoint}")
    }
}

fn encode_body<B: Serialize + ?Sized>(body: &B) -> Result<Value> {
    serde_json::to_value(body).map_err(|e| ApiError::InvalidRequest(e.to_string()))
}

fn decode_envelope<T: DeserializeOwned>(value: Value) -> Result<ApiResponse<T>> {
    serde_json::from_value(value).map_err(|e| ApiError::Decode(e.to_string()))
}
