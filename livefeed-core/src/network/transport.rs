//! Transport Trait
//!
//! Platform-agnostic abstraction for the live channel.

use async_trait::async_trait;
use url::Url;

use super::error::NetworkError;

/// Result type for transport operations.
pub type TransportResult<T> = Result<T, NetworkError>;

/// Connection state of a live channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ConnectionState {
    /// Opening the channel.
    Connecting,
    /// Channel open, frames flowing.
    Connected,
    /// No channel; a reconnect may be scheduled.
    Disconnected,
    /// Reconnects exhausted; updates come from polling.
    Failed,
}

impl ConnectionState {
    /// Lowercase name of the state.
    pub fn as_str(&self) -> &'static str {
        match self {
            ConnectionState::Connecting => "connecting",
            ConnectionState::Connected => "connected",
            ConnectionState::Disconnected => "disconnected",
            ConnectionState::Failed => "failed",
        }
    }
}

impl std::fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Snapshot of a connection manager.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConnectionStatus {
    /// Current state.
    pub state: ConnectionState,
    /// Consecutive failures since the last successful open.
    pub attempt: u32,
    /// Whether the polling fallback is running.
    pub polling: bool,
}

impl Default for ConnectionStatus {
    fn default() -> Self {
        ConnectionStatus {
            state: ConnectionState::Disconnected,
            attempt: 0,
            polling: false,
        }
    }
}

/// Opens live channels.
///
/// Implementations only establish the channel; reconnects, backoff and
/// fallback are handled by [`ConnectionManager`](super::ConnectionManager).
#[async_trait]
pub trait Transport: Send + Sync {
    /// Opens a channel to the given URL.
    async fn open(&self, url: &Url) -> TransportResult<Box<dyn Channel>>;
}

/// An open live channel.
#[async_trait]
pub trait Channel: Send {
    /// Waits for the next text frame.
    ///
    /// Returns `Ok(None)` once the peer has closed the channel. Must be
    /// cancel safe: dropping the future loses no frame.
    async fn recv(&mut self) -> TransportResult<Option<String>>;

    /// Closes the channel. Safe to call more than once.
    async fn close(&mut self);
}
