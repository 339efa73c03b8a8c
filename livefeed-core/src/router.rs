// SPDX-FileCopyrightText: 2026 Mattia Egloff <mattia.egloff@pm.me>
//
// SPDX-License-Identifier: GPL-3.0-or-later

//! Message Router
//!
//! Normalizes channel frames and poll payloads into [`Message`] values and
//! hands each one to the subscriber exactly once.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;
use serde_json::Value;
use tracing::{trace, warn};

use crate::error::FeedError;
use crate::message::Message;
use crate::subscriber::Subscriber;

/// Dispatches messages from either source to one subscriber.
///
/// Shared between the connection driver and the polling task. Each source
/// calls in from a single task, so delivery within a source is FIFO.
pub struct MessageRouter {
    subscriber: Arc<dyn Subscriber>,
    last: Mutex<Option<Message>>,
    delivered: AtomicU64,
}

impl MessageRouter {
    /// Creates a router for the given subscriber.
    pub fn new(subscriber: Arc<dyn Subscriber>) -> Self {
        MessageRouter {
            subscriber,
            last: Mutex::new(None),
            delivered: AtomicU64::new(0),
        }
    }

    /// Parses and delivers a channel frame.
    ///
    /// Malformed frames are logged and dropped; they are not delivered and
    /// not counted.
    pub fn route_frame(&self, frame: &str) -> Option<Message> {
        match Message::from_frame(frame) {
            Ok(message) => {
                self.deliver(&message);
                Some(message)
            }
            Err(err) => {
                warn!(error = %err, len = frame.len(), "dropping malformed frame");
                None
            }
        }
    }

    /// Wraps a poll payload as an `update` message and delivers it.
    pub fn route_payload(&self, payload: Value) -> Message {
        let message = Message::update(payload);
        self.deliver(&message);
        message
    }

    /// Forwards an error to the subscriber.
    pub fn report_error(&self, error: &FeedError) {
        self.subscriber.on_error(error);
    }

    /// Returns the most recently delivered message.
    pub fn last_message(&self) -> Option<Message> {
        self.last.lock().clone()
    }

    /// Number of messages delivered so far.
    pub fn delivered_count(&self) -> u64 {
        self.delivered.load(Ordering::Relaxed)
    }

    /// Returns the subscriber this router delivers to.
    pub fn subscriber(&self) -> &Arc<dyn Subscriber> {
        &self.subscriber
    }

    fn deliver(&self, message: &Message) {
        trace!(kind = %message.kind, "delivering message");
        *self.last.lock() = Some(message.clone());
        self.delivered.fetch_add(1, Ordering::Relaxed);
        self.subscriber.on_message(message);
    }
}

impl std::fmt::Debug for MessageRouter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MessageRouter")
            .field("delivered", &self.delivered_count())
            .finish_non_exhaustive()
    }
}
