//! In-flight request deduplication.

use std::collections::HashMap;
use std::future::Future;
use std::sync::{Arc, Mutex, MutexGuard};

use futures::channel::oneshot;
use futures::future::{BoxFuture, FutureExt, Shared};
use serde_json::Value;
use tracing::debug;

use crate::error::{ApiError, Result};

/// A deduplicated request. Every clone resolves to the same outcome.
pub type SharedRequest = Shared<BoxFuture<'static, Result<Value>>>;

type InflightMap = Arc<Mutex<HashMap<String, SharedRequest>>>;

fn lock(inflight: &InflightMap) -> MutexGuard<'_, HashMap<String, SharedRequest>> {
    inflight.lock().unwrap_or_else(|e| e.into_inner())
}

// == Request Coalescer ==
/// Ensures at most one in-flight operation per request key.
///
/// Operations are spawned onto the runtime, so they run to completion even
/// when every caller has gone away. A key is released the moment its
/// operation settles, before the result is handed out; the coalescer never
/// replays a finished result.
#[derive(Clone, Default)]
pub struct RequestCoalescer {
    inflight: InflightMap,
}

impl RequestCoalescer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Joins the operation in flight under `key`, or starts one with
    /// `operation`.
    ///
    /// Not `async`: the lookup and the claim happen in one critical section
    /// and the operation is spawned eagerly, even if the returned future is
    /// never awaited. The task is spawned after the lock is released, since
    /// a runtime that is shutting down drops it on the spot.
    pub fn run<F, Fut>(&self, key: &str, operation: F) -> SharedRequest
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<Value>> + Send + 'static,
    {
        let (request, task) = {
            let mut inflight = lock(&self.inflight);
            if let Some(existing) = inflight.get(key) {
                debug!(key, "joining in-flight request");
                return existing.clone();
            }

            debug!(key, "starting request");
            let (request, task) = self.prepare(key.to_string(), operation());
            inflight.insert(key.to_string(), request.clone());
            (request, task)
        };

        tokio::spawn(task);
        request
    }

    fn prepare<Fut>(
        &self,
        key: String,
        operation: Fut,
    ) -> (SharedRequest, impl Future<Output = ()> + Send + 'static)
    where
        Fut: Future<Output = Result<Value>> + Send + 'static,
    {
        let (sender, receiver) = oneshot::channel();
        let release = ReleaseOnDrop {
            inflight: self.inflight.clone(),
            key,
        };

        let task = async move {
            let result = operation.await;
            // Release first: callers either get this result or start afresh.
            drop(release);
            sender.send(result).ok();
        };

        let request = receiver
            .map(|received| {
                received.unwrap_or_else(|_| {
                    Err(ApiError::Interrupted(
                        "request task ended without a result".to_string(),
                    ))
                })
            })
            .boxed()
            .shared();
        (request, task)
    }

    /// Number of keys with an operation in flight.
    pub fn in_flight(&self) -> usize {
        lock(&self.inflight).len()
    }

    /// Returns true if an operation is in flight under `key`.
    pub fn is_in_flight(&self, key: &str) -> bool {
        lock(&self.inflight).contains_key(key)
    }
}

impl std::fmt::Debug for RequestCoalescer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RequestCoalescer")
            .field("in_flight", &self.in_flight())
            .finish()
    }
}

/// Frees a key when its operation finishes, panics included.
struct ReleaseOnDrop {
    inflight: InflightMap,
    key: String,
}

impl Drop for ReleaseOnDrop {
    fn drop(&mut self) {
        lock(&self.inflight).remove(&self.key);
    }
}
