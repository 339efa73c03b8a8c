//! CLI Configuration

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Result;
use livefeed_core::{FeedConfig, FileCacheStore, LiveFeed};

/// CLI configuration.
#[derive(Debug, Clone)]
pub struct CliConfig {
    /// Data directory for cached responses.
    pub data_dir: PathBuf,
    /// Dashboard API base URL.
    pub api_url: String,
}

impl CliConfig {
    /// Feed configuration with this CLI's API URL and default policies.
    pub fn feed_config(&self) -> FeedConfig {
        FeedConfig::default().with_api_url(&self.api_url)
    }

    /// Opens the on-disk cache store, creating it if needed.
    pub fn open_store(&self) -> Result<FileCacheStore> {
        Ok(FileCacheStore::open(&self.data_dir)?)
    }

    /// Builds a feed backed by the on-disk cache.
    pub fn open_feed(&self) -> Result<LiveFeed> {
        let store = Arc::new(self.open_store()?);
        Ok(LiveFeed::new(self.feed_config(), store)?)
    }
}
