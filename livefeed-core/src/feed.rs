// SPDX-FileCopyrightText: 2026 Mattia Egloff <mattia.egloff@pm.me>
//
// SPDX-License-Identifier: GPL-3.0-or-later

//! Feed facade
//!
//! Wires configuration, transport and the conditional cache together so a
//! caller only supplies a topic and a subscriber.

use std::sync::Arc;

use serde_json::Value;
use tracing::debug;

use crate::cache::{CacheStore, ConditionalCache};
use crate::config::{FeedConfig, Topic};
use crate::error::FeedResult;
use crate::network::{ConnectionManager, Transport, WebSocketTransport};
use crate::polling::ResourceFetcher;
use crate::subscriber::Subscription;

/// Entry point for subscribing to live topics.
///
/// Construct one per process and share it; the cache store it holds is the
/// only state shared between subscriptions.
///
/// # Example
///
/// ```ignore
/// use livefeed_core::{FeedConfig, FileCacheStore, LiveFeed, Subscription, Topic};
///
/// let store = Arc::new(FileCacheStore::open(&data_dir)?);
/// let feed = LiveFeed::new(FeedConfig::from_env(), store)?;
/// let manager = feed.subscribe(Subscription::new(Topic::Graph, subscriber)).await?;
/// ```
pub struct LiveFeed {
    config: FeedConfig,
    transport: Arc<dyn Transport>,
    cache: Arc<ConditionalCache>,
}

impl LiveFeed {
    /// Creates a feed using WebSockets and the given cache store.
    pub fn new(config: FeedConfig, store: Arc<dyn CacheStore>) -> FeedResult<Self> {
        let cache = Arc::new(ConditionalCache::new(store)?);
        Ok(Self::with_parts(
            config,
            Arc::new(WebSocketTransport::new()),
            cache,
        ))
    }

    /// Creates a feed from explicit parts.
    pub fn with_parts(
        config: FeedConfig,
        transport: Arc<dyn Transport>,
        cache: Arc<ConditionalCache>,
    ) -> Self {
        LiveFeed {
            config,
            transport,
            cache,
        }
    }

    /// Feed configuration.
    pub fn config(&self) -> &FeedConfig {
        &self.config
    }

    /// Shared conditional cache.
    pub fn cache(&self) -> &Arc<ConditionalCache> {
        &self.cache
    }

    /// Opens a live channel for the subscription's topic.
    ///
    /// The returned manager is already connecting; its polling fallback
    /// fetches the topic's resource through the shared cache.
    pub async fn subscribe(&self, subscription: Subscription) -> FeedResult<ConnectionManager> {
        let topic = subscription.topic;
        let url = self.config.channel_url(topic)?;
        let resource = topic.poll_resource();
        let resource_url = self.config.resource_url(resource.path)?;
        debug!(%topic, %url, %resource_url, "subscribing");

        let fetcher = Arc::new(ResourceFetcher::new(Arc::clone(&self.cache), resource_url));
        let manager = ConnectionManager::builder(url, subscription.subscriber)
            .transport(Arc::clone(&self.transport))
            .reconnect(self.config.reconnect.clone())
            .polling(self.config.polling.clone())
            .fallback(resource.key, fetcher)
            .spawn();
        manager.connect().await?;
        Ok(manager)
    }

    /// Fetches a topic's resource once through the cache.
    pub async fn fetch(&self, topic: Topic) -> FeedResult<Value> {
        let resource = topic.poll_resource();
        let url = self.config.resource_url(resource.path)?;
        Ok(self
            .cache
            .fetch_with_cache(resource.key, url.as_str())
            .await?)
    }
}
