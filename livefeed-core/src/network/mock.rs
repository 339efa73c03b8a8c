//! Mock Transport
//!
//! Scriptable in-memory transport for tests. Opens are refused unless a
//! channel was queued with [`MockTransport::accept_next`]; accepted channels
//! receive whatever the returned [`MockChannelHandle`] pushes into them.

use std::collections::VecDeque;
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;
use tokio::sync::mpsc;
use url::Url;

use super::error::NetworkError;
use super::transport::{Channel, Transport, TransportResult};

enum Scripted {
    Refuse(String),
    Accept(mpsc::UnboundedReceiver<MockFrame>),
}

#[derive(Debug)]
enum MockFrame {
    Text(String),
    Error(String),
    Close,
}

#[derive(Default)]
struct MockState {
    script: VecDeque<Scripted>,
    opened: Vec<Url>,
    closed: usize,
    // Keeps channels open even if the test drops its handle.
    senders: Vec<mpsc::UnboundedSender<MockFrame>>,
}

/// Mock transport for testing.
///
/// Clones share the same script and counters.
#[derive(Clone, Default)]
pub struct MockTransport {
    state: Arc<Mutex<MockState>>,
}

impl MockTransport {
    /// Creates a transport that refuses every open.
    pub fn new() -> Self {
        Self::default()
    }

    /// Queues a successful open and returns the handle feeding that channel.
    pub fn accept_next(&self) -> MockChannelHandle {
        let (tx, rx) = mpsc::unbounded_channel();
        let mut state = self.state.lock();
        state.script.push_back(Scripted::Accept(rx));
        state.senders.push(tx.clone());
        MockChannelHandle { tx }
    }

    /// Queues a refused open with the given reason.
    pub fn refuse_next(&self, reason: impl Into<String>) {
        self.state
            .lock()
            .script
            .push_back(Scripted::Refuse(reason.into()));
    }

    /// Number of open attempts so far.
    pub fn open_count(&self) -> usize {
        self.state.lock().opened.len()
    }

    /// URLs of all open attempts, in order.
    pub fn opened_urls(&self) -> Vec<Url> {
        self.state.lock().opened.clone()
    }

    /// Number of channels closed from our side.
    pub fn closed_count(&self) -> usize {
        self.state.lock().closed
    }
}

#[async_trait]
impl Transport for MockTransport {
    async fn open(&self, url: &Url) -> TransportResult<Box<dyn Channel>> {
        let mut state = self.state.lock();
        state.opened.push(url.clone());
        match state.script.pop_front() {
            Some(Scripted::Accept(rx)) => Ok(Box::new(MockChannel {
                rx,
                state: Arc::clone(&self.state),
                closed: false,
            })),
            Some(Scripted::Refuse(reason)) => Err(NetworkError::ConnectionFailed(reason)),
            None => Err(NetworkError::ConnectionFailed("connection refused".into())),
        }
    }
}

/// Feeds frames into an accepted mock channel.
#[derive(Clone)]
pub struct MockChannelHandle {
    tx: mpsc::UnboundedSender<MockFrame>,
}

impl MockChannelHandle {
    /// Delivers a text frame.
    pub fn send_text(&self, text: impl Into<String>) {
        let _ = self.tx.send(MockFrame::Text(text.into()));
    }

    /// Fails the channel with a receive error.
    pub fn fail(&self, reason: impl Into<String>) {
        let _ = self.tx.send(MockFrame::Error(reason.into()));
    }

    /// Closes the channel from the peer side.
    pub fn close(&self) {
        let _ = self.tx.send(MockFrame::Close);
    }
}

struct MockChannel {
    rx: mpsc::UnboundedReceiver<MockFrame>,
    state: Arc<Mutex<MockState>>,
    closed: bool,
}

#[async_trait]
impl Channel for MockChannel {
    async fn recv(&mut self) -> TransportResult<Option<String>> {
        if self.closed {
            return Ok(None);
        }
        match self.rx.recv().await {
            Some(MockFrame::Text(text)) => Ok(Some(text)),
            Some(MockFrame::Error(reason)) => Err(NetworkError::ReceiveFailed(reason)),
            Some(MockFrame::Close) | None => {
                self.closed = true;
                Ok(None)
            }
        }
    }

    async fn close(&mut self) {
        if !self.closed {
            self.closed = true;
            self.state.lock().closed += 1;
        }
    }
}
