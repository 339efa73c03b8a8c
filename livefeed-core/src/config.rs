// SPDX-FileCopyrightText: 2026 Mattia Egloff <mattia.egloff@pm.me>
//
// SPDX-License-Identifier: GPL-3.0-or-later

//! Configuration for the update feed
//!
//! One environment setting supplies the base API URL; every numeric policy
//! constant has a fixed default that callers may override per instance.

use std::str::FromStr;
use std::time::Duration;

use thiserror::Error;
use url::Url;

use crate::backoff::{BackoffPolicy, DEFAULT_INITIAL_DELAY, DEFAULT_MAX_DELAY};

/// Environment variable holding the base API URL.
pub const API_URL_ENV: &str = "LIVEFEED_API_URL";

/// Base API URL used when the environment does not set one.
pub const DEFAULT_API_URL: &str = "http://localhost:8000";

/// Reconnect attempts before the channel is declared failed.
pub const DEFAULT_MAX_ATTEMPTS: u32 = 10;

/// Nominal polling cadence.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(30_000);

/// Cap on the polling retry delay.
pub const DEFAULT_MAX_POLL_DELAY: Duration = Duration::from_millis(300_000);

/// Live channel reconnect policy.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReconnectConfig {
    /// Delay before the first reconnect.
    pub initial_delay: Duration,
    /// Longest delay between reconnects.
    pub max_delay: Duration,
    /// Consecutive failures before giving up and polling instead.
    pub max_attempts: u32,
}

impl Default for ReconnectConfig {
    fn default() -> Self {
        Self {
            initial_delay: DEFAULT_INITIAL_DELAY,
            max_delay: DEFAULT_MAX_DELAY,
            max_attempts: DEFAULT_MAX_ATTEMPTS,
        }
    }
}

impl ReconnectConfig {
    /// Backoff policy for reconnect delays.
    pub fn policy(&self) -> BackoffPolicy {
        BackoffPolicy::new(self.initial_delay, self.max_delay)
    }
}

/// Polling fallback cadence.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PollingConfig {
    /// Delay between successful polls.
    pub interval: Duration,
    /// Longest delay after repeated failures.
    pub max_retry_delay: Duration,
}

impl Default for PollingConfig {
    fn default() -> Self {
        Self {
            interval: DEFAULT_POLL_INTERVAL,
            max_retry_delay: DEFAULT_MAX_POLL_DELAY,
        }
    }
}

impl PollingConfig {
    /// Backoff policy whose attempt 0 is the nominal interval.
    pub fn policy(&self) -> BackoffPolicy {
        BackoffPolicy::new(self.interval, self.max_retry_delay)
    }
}

/// Configuration for the feed as a whole.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeedConfig {
    /// Base HTTP API URL (e.g. "https://dashboard.example.com").
    pub api_url: String,
    /// Reconnect policy for live channels.
    pub reconnect: ReconnectConfig,
    /// Polling fallback policy.
    pub polling: PollingConfig,
}

impl Default for FeedConfig {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_API_URL.to_string(),
            reconnect: ReconnectConfig::default(),
            polling: PollingConfig::default(),
        }
    }
}

impl FeedConfig {
    /// Reads the base API URL from [`API_URL_ENV`], falling back to
    /// [`DEFAULT_API_URL`].
    pub fn from_env() -> Self {
        let api_url = std::env::var(API_URL_ENV)
            .ok()
            .filter(|v| !v.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_API_URL.to_string());
        Self::default().with_api_url(api_url)
    }

    /// Sets the base API URL.
    pub fn with_api_url(mut self, api_url: impl Into<String>) -> Self {
        self.api_url = api_url.into();
        self
    }

    /// Sets the reconnect policy.
    pub fn with_reconnect(mut self, reconnect: ReconnectConfig) -> Self {
        self.reconnect = reconnect;
        self
    }

    /// Sets the polling policy.
    pub fn with_polling(mut self, polling: PollingConfig) -> Self {
        self.polling = polling;
        self
    }

    /// Live channel URL for a topic: `<ws-base>/ws?channel=<name>`.
    pub fn channel_url(&self, topic: Topic) -> Result<Url, ConfigError> {
        let mut url = self.base_url()?;
        let scheme = match url.scheme() {
            "http" | "ws" => "ws",
            "https" | "wss" => "wss",
            other => return Err(ConfigError::UnsupportedScheme(other.to_string())),
        };
        url.set_scheme(scheme)
            .map_err(|()| ConfigError::UnsupportedScheme(scheme.to_string()))?;

        let path = format!("{}/ws", url.path().trim_end_matches('/'));
        url.set_path(&path);
        url.set_query(None);
        url.query_pairs_mut().append_pair("channel", topic.as_str());
        Ok(url)
    }

    /// HTTP URL for a resource path under the API URL.
    pub fn resource_url(&self, path: &str) -> Result<Url, ConfigError> {
        let base = self.base_url()?;
        let joined = format!(
            "{}/{}",
            base.as_str().trim_end_matches('/'),
            path.trim_start_matches('/')
        );
        Url::parse(&joined).map_err(|e| ConfigError::InvalidUrl(format!("{}: {}", joined, e)))
    }

    fn base_url(&self) -> Result<Url, ConfigError> {
        Url::parse(&self.api_url)
            .map_err(|e| ConfigError::InvalidUrl(format!("{}: {}", self.api_url, e)))
    }
}

/// Live channel names served by the dashboard backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Topic {
    /// Graph structure changes.
    Graph,
    /// Metric updates.
    Metrics,
    /// Intervention changes.
    Interventions,
    /// Alerts.
    Alerts,
}

/// HTTP resource polled when a topic's live channel is unavailable.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollResource {
    /// Cache key for conditional fetches.
    pub key: &'static str,
    /// Path under the API URL.
    pub path: &'static str,
}

impl Topic {
    /// All topics.
    pub const ALL: [Topic; 4] = [Topic::Graph, Topic::Metrics, Topic::Interventions, Topic::Alerts];

    /// Channel name used in the `channel=` query parameter.
    pub fn as_str(&self) -> &'static str {
        match self {
            Topic::Graph => "graph",
            Topic::Metrics => "metrics",
            Topic::Interventions => "interventions",
            Topic::Alerts => "alerts",
        }
    }

    /// Polling resource for this topic.
    pub fn poll_resource(&self) -> PollResource {
        match self {
            Topic::Graph => PollResource {
                key: "graph_stats",
                path: "/api/graph/stats",
            },
            Topic::Metrics => PollResource {
                key: "metrics_summary",
                path: "/api/metrics/summary",
            },
            Topic::Interventions => PollResource {
                key: "interventions",
                path: "/api/interventions",
            },
            Topic::Alerts => PollResource {
                key: "alerts",
                path: "/api/alerts",
            },
        }
    }
}

impl std::fmt::Display for Topic {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Topic {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Topic::ALL
            .into_iter()
            .find(|t| t.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| ConfigError::UnknownTopic(s.to_string()))
    }
}

/// Configuration errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    /// The API URL could not be parsed.
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    /// The API URL scheme has no WebSocket counterpart.
    #[error("Unsupported URL scheme: {0}")]
    UnsupportedScheme(String),

    /// Not one of the known channel names.
    #[error("Unknown topic: {0}")]
    UnknownTopic(String),
}
