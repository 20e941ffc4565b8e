//! Resilient fetcher: one logical call, bounded automatic retry.

use std::sync::Arc;

use serde_json::Value;
use tracing::{debug, error, warn};

use super::retry::{BackoffPolicy, RetryPolicy};
use super::transport::{HttpRequest, HttpResponse, Transport};
use crate::error::{ApiError, Result};

// == Fetcher ==
/// Wraps a [`Transport`] with retryable-error detection and backoff.
///
/// Connectivity failures, 429 and 5xx responses are retried. Other
/// non-success statuses and malformed requests fail on the first attempt.
/// Once started, a fetch runs until success or retry exhaustion.
#[derive(Clone)]
pub struct Fetcher {
    transport: Arc<dyn Transport>,
    policy: RetryPolicy,
}

impl Fetcher {
    pub fn new(transport: Arc<dyn Transport>, policy: RetryPolicy) -> Self {
        Self { transport, policy }
    }

    /// Fetches with the policy's default retry count.
    pub async fn fetch(&self, request: &HttpRequest) -> Result<Value> {
        self.fetch_with_retry(request, self.policy.max_retries).await
    }

    /// Performs `request`, retrying transient failures up to `max_retries`
    /// additional times, and returns the decoded JSON body.
    ///
    /// After exhaustion the last error is returned.
    pub async fn fetch_with_retry(&self, request: &HttpRequest, max_retries: u32) -> Result<Value> {
        let mut attempt = 0;
        loop {
            debug!(method = %request.method, url = %request.url, attempt, "sending request");

            let err = match self.attempt(request).await {
                Ok(value) => return Ok(value),
                Err(err) => err,
            };

            if !err.is_retryable() {
                debug!(url = %request.url, error = %err, "request failed, not retryable");
                return Err(err);
            }
            if attempt >= max_retries {
                error!(url = %request.url, attempts = attempt + 1, error = %err, "retries exhausted");
                return Err(err);
            }

            let delay = self.policy.delay_for_attempt(attempt);
            warn!(
                url = %request.url,
                attempt,
                delay_ms = delay.as_millis() as u64,
                error = %err,
                "request failed, retrying"
            );
            tokio::time::sleep(delay).await;
            attempt += 1;
        }
    }

    async fn attempt(&self, request: &HttpRequest) -> Result<Value> {
        let response = self.transport.send(request).await?;
        if !response.is_success() {
            return Err(http_error(&response));
        }
        decode_body(&response.body)
    }
}

impl std::fmt::Debug for Fetcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Fetcher")
            .field("policy", &self.policy)
            .finish_non_exhaustive()
    }
}

/// Builds the error for a non-success response, preferring the server's
/// own `message` (or `error`) field.
fn http_error(response: &HttpResponse) -> ApiError {
    let from_body = serde_json::from_str::<Value>(&response.body)
        .ok()
        .and_then(|body| {
            ["message", "error"]
                .iter()
                .find_map(|field| body.get(field)?.as_str().map(str::to_string))
        })
        .filter(|message| !message.is_empty());

    ApiError::Http {
        status: response.status,
        message: from_body.unwrap_or_else(|| format!("HTTP error {}", response.status)),
    }
}

fn decode_body(body: &str) -> Result<Value> {
    if body.trim().is_empty() {
        return Ok(Value::Null);
    }
    serde_json::from_str(body).map_err(|e| ApiError::Decode(e.to_string()))
}
