// SPDX-FileCopyrightText: 2026 Mattia Egloff <mattia.egloff@pm.me>
//
// SPDX-License-Identifier: GPL-3.0-or-later

//! WebSocket Transport
//!
//! Real transport implementation using tokio-tungstenite. Supports both
//! ws:// (plaintext) and wss:// (rustls) connections.

use async_trait::async_trait;
use futures_util::{SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio_tungstenite::tungstenite::{self, Message};
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream};
use tracing::{debug, trace, warn};
use url::Url;

use super::error::NetworkError;
use super::transport::{Channel, Transport, TransportResult};

/// WebSocket transport for live channels.
///
/// # Example
///
/// ```ignore
/// use livefeed_core::network::{Transport, WebSocketTransport};
///
/// let transport = WebSocketTransport::new();
/// let url = url::Url::parse("ws://localhost:8000/ws?channel=graph")?;
/// let mut channel = transport.open(&url).await?;
/// while let Some(frame) = channel.recv().await? {
///     println!("{frame}");
/// }
/// ```
#[derive(Debug, Clone, Default)]
pub struct WebSocketTransport {
    _private: (),
}

impl WebSocketTransport {
    /// Creates a new WebSocket transport.
    pub fn new() -> Self {
        Self::default()
    }

    fn check_scheme(url: &Url) -> TransportResult<()> {
        match url.scheme() {
            "ws" | "wss" => Ok(()),
            other => Err(NetworkError::InvalidUrl(format!(
                "Invalid URL scheme {:?} (expected ws:// or wss://)",
                other
            ))),
        }
    }
}

#[async_trait]
impl Transport for WebSocketTransport {
    async fn open(&self, url: &Url) -> TransportResult<Box<dyn Channel>> {
        Self::check_scheme(url)?;

        debug!(%url, "opening websocket");
        let (socket, response) = tokio_tungstenite::connect_async(url.as_str())
            .await
            .map_err(|e| {
                NetworkError::ConnectionFailed(format!("WebSocket handshake failed: {}", e))
            })?;
        debug!(status = %response.status(), "websocket open");

        Ok(Box::new(WebSocketChannel {
            socket,
            closed: false,
        }))
    }
}

struct WebSocketChannel {
    socket: WebSocketStream<MaybeTlsStream<TcpStream>>,
    closed: bool,
}

#[async_trait]
impl Channel for WebSocketChannel {
    async fn recv(&mut self) -> TransportResult<Option<String>> {
        if self.closed {
            return Ok(None);
        }
        loop {
            match self.socket.next().await {
                Some(Ok(Message::Text(text))) => return Ok(Some(text)),
                Some(Ok(Message::Binary(data))) => match String::from_utf8(data) {
                    Ok(text) => return Ok(Some(text)),
                    Err(_) => warn!("dropping non-UTF-8 binary frame"),
                },
                // tungstenite answers pings itself.
                Some(Ok(Message::Ping(_) | Message::Pong(_) | Message::Frame(_))) => {
                    trace!("control frame");
                }
                Some(Ok(Message::Close(frame))) => {
                    debug!(?frame, "peer closed websocket");
                    self.closed = true;
                    return Ok(None);
                }
                Some(Err(
                    tungstenite::Error::ConnectionClosed | tungstenite::Error::AlreadyClosed,
                ))
                | None => {
                    self.closed = true;
                    return Ok(None);
                }
                Some(Err(e)) => {
                    self.closed = true;
                    return Err(NetworkError::ReceiveFailed(e.to_string()));
                }
            }
        }
    }

    async fn close(&mut self) {
        if self.closed {
            return;
        }
        self.closed = true;
        // Ignore errors on close
        let _ = self.socket.close(None).await;
        let _ = self.socket.flush().await;
    }
}
