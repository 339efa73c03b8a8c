//! Livefeed Core Library
//!
//! Resilient real-time update delivery for dashboards: a live channel per
//! topic with exponential-backoff reconnects, a polling fallback once
//! reconnects are exhausted, and a conditional cache that keeps polling
//! cheap.

pub mod backoff;
pub mod cache;
pub mod config;
pub mod error;
pub mod feed;
pub mod message;
pub mod network;
pub mod polling;
pub mod router;
pub mod subscriber;

pub use backoff::{Backoff, BackoffPolicy};
pub use cache::{
    CacheEntry, CacheError, CacheStore, ConditionalCache, FetchError, Fetched, FileCacheStore,
    MemoryCacheStore,
};
pub use config::{
    ConfigError, FeedConfig, PollResource, PollingConfig, ReconnectConfig, Topic, API_URL_ENV,
    DEFAULT_API_URL,
};
pub use error::{FeedError, FeedResult};
pub use feed::LiveFeed;
pub use message::{Message, MessageType};
pub use network::{
    ConnectionManager, ConnectionState, ConnectionStatus, MockTransport, NetworkError, Transport,
    WebSocketTransport,
};
pub use polling::{Fetcher, PollingFallback, ResourceFetcher};
pub use router::MessageRouter;
pub use subscriber::{CallbackSubscriber, Subscriber, Subscription};
