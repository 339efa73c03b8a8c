//! Cache entry type

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Last known version of one polled resource.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CacheEntry {
    /// Logical resource name (e.g. "graph_stats").
    pub key: String,
    /// Opaque version tag from the server's `ETag` header.
    pub version_tag: String,
    /// Parsed response body.
    pub payload: Value,
    /// When this entry was written.
    pub stored_at: DateTime<Utc>,
}

impl CacheEntry {
    /// Creates an entry stamped now.
    pub fn new(key: impl Into<String>, version_tag: impl Into<String>, payload: Value) -> Self {
        CacheEntry {
            key: key.into(),
            version_tag: version_tag.into(),
            payload,
            stored_at: Utc::now(),
        }
    }
}
