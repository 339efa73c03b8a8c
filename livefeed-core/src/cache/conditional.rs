//! Conditional fetches
//!
//! HTTP GETs that carry the cached version tag as `If-None-Match` and
//! answer `304 Not Modified` from the cache.

use std::sync::Arc;

use reqwest::header::{ETAG, IF_NONE_MATCH};
use reqwest::{Client, StatusCode};
use serde_json::Value;
use thiserror::Error;
use tokio::task;
use tracing::{debug, warn};

use super::store::CacheStore;
use super::types::CacheEntry;

/// Outcome of a conditional fetch.
#[derive(Debug, Clone, PartialEq)]
pub enum Fetched {
    /// Server sent a new body.
    Fresh(Value),
    /// Server answered 304; this is the cached payload.
    Unchanged(Value),
}

impl Fetched {
    /// The payload, whichever way it was obtained.
    pub fn into_payload(self) -> Value {
        match self {
            Fetched::Fresh(payload) | Fetched::Unchanged(payload) => payload,
        }
    }

    /// Whether the payload came from the cache.
    pub fn is_unchanged(&self) -> bool {
        matches!(self, Fetched::Unchanged(_))
    }
}

/// HTTP client in front of a [`CacheStore`].
pub struct ConditionalCache {
    client: Client,
    store: Arc<dyn CacheStore>,
}

impl ConditionalCache {
    /// Creates a cache with a default HTTP client.
    pub fn new(store: Arc<dyn CacheStore>) -> Result<Self, FetchError> {
        let client = Client::builder()
            .user_agent(format!(
                "livefeed/{}",
                option_env!("CARGO_PKG_VERSION").unwrap_or("0.1.0")
            ))
            .build()?;
        Ok(Self::with_client(client, store))
    }

    /// Creates a cache with a caller-supplied client.
    pub fn with_client(client: Client, store: Arc<dyn CacheStore>) -> Self {
        ConditionalCache { client, store }
    }

    /// The backing store.
    pub fn store(&self) -> &Arc<dyn CacheStore> {
        &self.store
    }

    /// Fetches `url`, returning the fresh or cached payload for `key`.
    pub async fn fetch_with_cache(&self, key: &str, url: &str) -> Result<Value, FetchError> {
        Ok(self.fetch_conditional(key, url).await?.into_payload())
    }

    /// Fetches `url` conditionally, reporting whether the cache answered.
    ///
    /// The stored entry is replaced only after a successful response that
    /// carries an `ETag`; errors never touch the store. Store access runs on
    /// the blocking pool.
    pub async fn fetch_conditional(&self, key: &str, url: &str) -> Result<Fetched, FetchError> {
        let cached = self.load(key).await;

        let mut request = self.client.get(url);
        if let Some(entry) = &cached {
            request = request.header(IF_NONE_MATCH, entry.version_tag.as_str());
        }
        let response = request.send().await?;
        let status = response.status();

        if status == StatusCode::NOT_MODIFIED {
            return match cached {
                Some(entry) => {
                    debug!(key, tag = %entry.version_tag, "not modified");
                    Ok(Fetched::Unchanged(entry.payload))
                }
                None => Err(FetchError::NotModifiedWithoutCache(key.to_string())),
            };
        }
        if !status.is_success() {
            return Err(FetchError::HttpError(status.as_u16()));
        }

        let tag = response
            .headers()
            .get(ETAG)
            .and_then(|v| v.to_str().ok())
            .map(str::to_owned);
        let body = response.bytes().await?;
        let payload: Value = serde_json::from_slice(&body)?;

        match tag {
            Some(tag) => {
                debug!(key, tag = %tag, "caching fresh payload");
                self.save(CacheEntry::new(key, tag, payload.clone())).await;
            }
            None => debug!(key, "response has no version tag, cache untouched"),
        }
        Ok(Fetched::Fresh(payload))
    }

    async fn load(&self, key: &str) -> Option<CacheEntry> {
        let store = Arc::clone(&self.store);
        let owned = key.to_string();
        match task::spawn_blocking(move || store.get(&owned)).await {
            Ok(Ok(entry)) => entry,
            Ok(Err(err)) => {
                warn!(key, error = %err, "unreadable cache entry, fetching unconditionally");
                None
            }
            Err(err) => {
                warn!(key, error = %err, "cache read task failed");
                None
            }
        }
    }

    async fn save(&self, entry: CacheEntry) {
        let store = Arc::clone(&self.store);
        let key = entry.key.clone();
        match task::spawn_blocking(move || store.put(&entry)).await {
            Ok(Ok(())) => {}
            Ok(Err(err)) => warn!(key = %key, error = %err, "failed to persist cache entry"),
            Err(err) => warn!(key = %key, error = %err, "cache write task failed"),
        }
    }
}

/// Errors that can occur during conditional fetching
#[derive(Debug, Error)]
pub enum FetchError {
    /// HTTP error with status code
    #[error("HTTP error: {0}")]
    HttpError(u16),

    /// Network/request error
    #[error("Network error: {0}")]
    NetworkError(#[from] reqwest::Error),

    /// JSON parsing error
    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),

    /// Server answered 304 but nothing is cached for the key
    #[error("Not modified, but no cached entry for {0:?}")]
    NotModifiedWithoutCache(String),
}
