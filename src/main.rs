//! API Cache - command-line front end
//!
//! Builds the process-wide cache and client from the environment and drives
//! them by hand: fetch a resource, invalidate entries, inspect the cache.

use std::sync::Arc;

use anyhow::Context;
use clap::{Parser, Subcommand};
use serde_json::Value;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use api_cache::auth::{StaticToken, StoredToken, TokenProvider};
use api_cache::fetch::{Fetcher, ReqwestTransport};
use api_cache::storage::{DurableStore, FileStore};
use api_cache::{ApiClient, Config, GetOptions, TieredCache};

#[derive(Debug, Parser)]
#[command(name = "api_cache", about = "Cached, deduplicated access to the app API")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Fetch an endpoint, cache-first when a cache key is given
    Get {
        /// Endpoint path relative to API_BASE_URL
        endpoint: String,
        /// Cache the response under this key
        #[arg(long)]
        cache_key: Option<String>,
        /// Skip the cache and overwrite it
        #[arg(long)]
        force_refresh: bool,
        /// Send the request without a bearer token
        #[arg(long)]
        no_auth: bool,
    },
    /// Remove one cache entry
    Invalidate { key: String },
    /// Remove every cache entry starting with a prefix
    InvalidatePrefix { prefix: String },
    /// Remove every cache entry
    Clear,
    /// Print the durable cache keys
    Stats,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Defaults to "info" level, can be overridden with RUST_LOG env var
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "api_cache=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();
    let config = Config::from_env();
    info!(
        "Configuration loaded: base_url={}, cache_dir={}, max_retries={}",
        config.api_base_url,
        config.cache_dir.display(),
        config.retry.max_retries
    );

    // Process-wide instances live here and nowhere else.
    let store: Arc<dyn DurableStore> = Arc::new(FileStore::new(config.cache_dir.clone()));
    let cache = Arc::new(TieredCache::with_default_ttl(
        store.clone(),
        config.default_cache_ttl,
    ));
    let tokens: Arc<dyn TokenProvider> = match &config.auth_token {
        Some(token) => Arc::new(StaticToken::new(token.clone())),
        None => Arc::new(StoredToken::new(store.clone())),
    };
    let fetcher = Fetcher::new(Arc::new(ReqwestTransport::new()), config.retry.clone());
    let client = ApiClient::new(config.api_base_url.clone(), cache.clone(), fetcher, tokens);

    match cli.command {
        Command::Get {
            endpoint,
            cache_key,
            force_refresh,
            no_auth,
        } => {
            let mut options = GetOptions::new()
                .cache_duration(cache.default_ttl())
                .force_refresh(force_refresh)
                .require_auth(!no_auth);
            if let Some(key) = cache_key {
                options = options.cache_key(key);
            }

            let response = client
                .get::<Value>(&endpoint, options)
                .await
                .with_context(|| format!("GET {endpoint} failed"))?;
            println!("{}", serde_json::to_string_pretty(&response)?);
        }
        Command::Invalidate { key } => {
            client.invalidate_cache(&key).await;
            info!("Invalidated {}", key);
        }
        Command::InvalidatePrefix { prefix } => {
            client.invalidate_cache_by_prefix(&prefix).await;
            info!("Invalidated prefix {}", prefix);
        }
        Command::Clear => {
            client.clear_cache().await;
            info!("Cache cleared");
        }
        Command::Stats => {
            let mut keys: Vec<String> = store
                .get_all_keys()
                .await
                .context("cannot list cache directory")?
                .into_iter()
                .filter(|key| api_cache::cache::keys::is_cache_key(key))
                .collect();
            keys.sort();
            let stats = serde_json::json!({
                "durableSize": keys.len(),
                "keys": keys,
                "memory": cache.stats(),
            });
            println!("{}", serde_json::to_string_pretty(&stats)?);
        }
    }

    Ok(())
}
