//! Bearer token sources.
//!
//! Session management lives elsewhere; the API client only needs a token
//! when a request requires authentication.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::warn;

use crate::storage::DurableStore;

/// Durable-store key holding the session token. Outside the cache
/// namespace, so clearing the cache never logs the user out.
pub const AUTH_TOKEN_KEY: &str = "auth_token";

// == Token Provider ==
#[async_trait]
pub trait TokenProvider: Send + Sync {
    /// Current bearer token, if the user is signed in.
    async fn token(&self) -> Option<String>;
}

/// No session: requests go out without an `Authorization` header.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoAuth;

#[async_trait]
impl TokenProvider for NoAuth {
    async fn token(&self) -> Option<String> {
        None
    }
}

/// A fixed token.
#[derive(Debug, Clone)]
pub struct StaticToken(String);

impl StaticToken {
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }
}

#[async_trait]
impl TokenProvider for StaticToken {
    async fn token(&self) -> Option<String> {
        Some(self.0.clone())
    }
}

/// Reads the token that the sign-in flow left in the durable store.
#[derive(Clone)]
pub struct StoredToken {
    store: Arc<dyn DurableStore>,
}

impl StoredToken {
    pub fn new(store: Arc<dyn DurableStore>) -> Self {
        Self { store }
    }
}

#[async_trait]
impl TokenProvider for StoredToken {
    async fn token(&self) -> Option<String> {
        match self.store.get_item(AUTH_TOKEN_KEY).await {
            Ok(token) => token.filter(|t| !t.is_empty()),
            Err(e) => {
                warn!(error = %e, "cannot read auth token");
                None
            }
        }
    }
}
