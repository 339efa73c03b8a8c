// SPDX-FileCopyrightText: 2026 Mattia Egloff <mattia.egloff@pm.me>
//
// SPDX-License-Identifier: GPL-3.0-or-later

//! Polling Fallback
//!
//! Periodically fetches a resource when the live channel is unavailable.
//! Successful polls run at the nominal interval; each failure doubles the
//! retry delay up to a cap, and a single success restores the interval.

use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;
use serde_json::Value;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};
use url::Url;

use crate::backoff::Backoff;
use crate::cache::{ConditionalCache, FetchError};
use crate::config::PollingConfig;
use crate::error::FeedError;
use crate::router::MessageRouter;

/// Produces the current payload of a polled resource.
#[async_trait]
pub trait Fetcher: Send + Sync {
    /// Fetches the resource identified by `key`.
    async fn fetch(&self, key: &str) -> Result<Value, FetchError>;
}

/// Fetches one URL through the conditional cache.
#[derive(Clone)]
pub struct ResourceFetcher {
    cache: Arc<ConditionalCache>,
    url: Url,
}

impl ResourceFetcher {
    /// Creates a fetcher for the given URL.
    pub fn new(cache: Arc<ConditionalCache>, url: Url) -> Self {
        ResourceFetcher { cache, url }
    }

    /// URL this fetcher polls.
    pub fn url(&self) -> &Url {
        &self.url
    }
}

#[async_trait]
impl Fetcher for ResourceFetcher {
    async fn fetch(&self, key: &str) -> Result<Value, FetchError> {
        self.cache.fetch_with_cache(key, self.url.as_str()).await
    }
}

struct Running {
    key: String,
    // Cleared under the lock by `stop`; deliveries check it under the same lock.
    live: Arc<Mutex<bool>>,
    task: JoinHandle<()>,
}

/// Timer-driven polling loop for one resource.
///
/// Must be started from within a Tokio runtime.
pub struct PollingFallback {
    config: PollingConfig,
    router: Arc<MessageRouter>,
    running: Option<Running>,
}

impl PollingFallback {
    /// Creates a stopped fallback delivering through `router`.
    pub fn new(config: PollingConfig, router: Arc<MessageRouter>) -> Self {
        PollingFallback {
            config,
            router,
            running: None,
        }
    }

    /// Starts polling `key`: one immediate fetch, then repeated fetches.
    ///
    /// Restarts from scratch if already running.
    pub fn start(&mut self, key: impl Into<String>, fetcher: Arc<dyn Fetcher>) {
        self.stop();

        let key = key.into();
        let live = Arc::new(Mutex::new(true));
        info!(key = %key, interval_ms = self.config.interval.as_millis() as u64, "polling fallback started");

        let task = tokio::spawn(poll_loop(
            key.clone(),
            fetcher,
            Arc::clone(&self.router),
            Arc::clone(&live),
            Backoff::new(self.config.policy()),
        ));
        self.running = Some(Running { key, live, task });
    }

    /// Cancels all pending polls. No delivery happens after this returns.
    ///
    /// Safe to call when not running.
    pub fn stop(&mut self) {
        if let Some(running) = self.running.take() {
            *running.live.lock() = false;
            running.task.abort();
            info!(key = %running.key, "polling fallback stopped");
        }
    }

    /// Whether a polling loop is active.
    pub fn is_running(&self) -> bool {
        self.running.is_some()
    }

    /// Key being polled, if running.
    pub fn key(&self) -> Option<&str> {
        self.running.as_ref().map(|r| r.key.as_str())
    }
}

impl Drop for PollingFallback {
    fn drop(&mut self) {
        self.stop();
    }
}

async fn poll_loop(
    key: String,
    fetcher: Arc<dyn Fetcher>,
    router: Arc<MessageRouter>,
    live: Arc<Mutex<bool>>,
    mut backoff: Backoff,
) {
    loop {
        let result = fetcher.fetch(&key).await;
        let delay = {
            let live = live.lock();
            if !*live {
                return;
            }
            match result {
                Ok(payload) => {
                    backoff.reset();
                    router.route_payload(payload);
                }
                Err(err) => {
                    backoff.record_failure();
                    warn!(
                        key = %key,
                        error = %err,
                        retry_in_ms = backoff.current_delay().as_millis() as u64,
                        "poll failed"
                    );
                    router.report_error(&FeedError::Fetch(err));
                }
            }
            backoff.current_delay()
        };
        debug!(key = %key, delay_ms = delay.as_millis() as u64, "next poll scheduled");
        tokio::time::sleep(delay).await;
    }
}
