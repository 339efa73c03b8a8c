//! Live Channel Layer
//!
//! Keeps one live channel per topic open, reconnecting with exponential
//! backoff and handing over to the polling fallback when reconnects run out.
//!
//! # Architecture
//!
//! The network layer consists of:
//! - **Transport trait**: interface for opening channels (WebSocket, mock)
//! - **Reconnect machine**: pure `(state, input) -> effects` transition logic
//! - **Connection manager**: driver task executing the machine's effects
//!
//! # Example
//!
//! ```ignore
//! use livefeed_core::network::{ConnectionManager, MockTransport};
//!
//! let transport = MockTransport::new();
//! let channel = transport.accept_next();
//! let manager = ConnectionManager::builder(url, subscriber)
//!     .transport(Arc::new(transport))
//!     .spawn();
//!
//! manager.connect().await?;
//! channel.send_text(r#"{"type":"heartbeat","timestamp":"2024-01-01T00:00:00Z"}"#);
//! ```

mod connection;
mod error;
mod machine;
mod mock;
mod transport;
mod websocket;

// Error types
pub use error::NetworkError;

// Transport abstraction
pub use transport::{Channel, ConnectionState, ConnectionStatus, Transport, TransportResult};

// Mock transport for testing
pub use mock::{MockChannelHandle, MockTransport};

// WebSocket transport for production
pub use websocket::WebSocketTransport;

// Reconnect state machine
pub use machine::{Effect, Input, Notice, ReconnectMachine};

// Connection management
pub use connection::{ConnectionManager, ConnectionManagerBuilder};
