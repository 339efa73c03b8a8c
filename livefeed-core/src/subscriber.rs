// SPDX-FileCopyrightText: 2026 Mattia Egloff <mattia.egloff@pm.me>
//
// SPDX-License-Identifier: GPL-3.0-or-later

//! Subscriber Callbacks
//!
//! The caller-supplied receiver for messages and connection lifecycle events.

use std::sync::Arc;

use crate::config::Topic;
use crate::error::FeedError;
use crate::message::Message;
use crate::network::ConnectionState;

/// Receives messages and lifecycle events for one topic.
///
/// Only [`Subscriber::on_message`] is required; the lifecycle hooks default
/// to no-ops. Callbacks run on the delivering task and should not block.
pub trait Subscriber: Send + Sync {
    /// Called once per delivered message, in delivery order.
    fn on_message(&self, message: &Message);

    /// Called when the live channel opens.
    fn on_connect(&self) {}

    /// Called when the live channel is lost or closed.
    fn on_disconnect(&self) {}

    /// Called for transport errors, fetch failures and reconnect exhaustion.
    fn on_error(&self, _error: &FeedError) {}

    /// Called on every connection state transition.
    fn on_state_change(&self, _state: ConnectionState) {}
}

type MessageFn = Box<dyn Fn(&Message) + Send + Sync>;
type LifecycleFn = Box<dyn Fn() + Send + Sync>;
type ErrorFn = Box<dyn Fn(&FeedError) + Send + Sync>;
type StateFn = Box<dyn Fn(ConnectionState) + Send + Sync>;

/// Closure-based subscriber.
///
/// # Example
///
/// ```ignore
/// let subscriber = CallbackSubscriber::new(|msg| println!("{}", msg.kind))
///     .on_connect(|| println!("connected"))
///     .on_error(|err| eprintln!("{err}"));
/// ```
pub struct CallbackSubscriber {
    message: MessageFn,
    connect: Option<LifecycleFn>,
    disconnect: Option<LifecycleFn>,
    error: Option<ErrorFn>,
    state: Option<StateFn>,
}

impl CallbackSubscriber {
    /// Creates a subscriber from the message callback.
    pub fn new<F>(on_message: F) -> Self
    where
        F: Fn(&Message) + Send + Sync + 'static,
    {
        CallbackSubscriber {
            message: Box::new(on_message),
            connect: None,
            disconnect: None,
            error: None,
            state: None,
        }
    }

    /// Sets the connect callback.
    pub fn on_connect<F>(mut self, f: F) -> Self
    where
        F: Fn() + Send + Sync + 'static,
    {
        self.connect = Some(Box::new(f));
        self
    }

    /// Sets the disconnect callback.
    pub fn on_disconnect<F>(mut self, f: F) -> Self
    where
        F: Fn() + Send + Sync + 'static,
    {
        self.disconnect = Some(Box::new(f));
        self
    }

    /// Sets the error callback.
    pub fn on_error<F>(mut self, f: F) -> Self
    where
        F: Fn(&FeedError) + Send + Sync + 'static,
    {
        self.error = Some(Box::new(f));
        self
    }

    /// Sets the state change callback.
    pub fn on_state_change<F>(mut self, f: F) -> Self
    where
        F: Fn(ConnectionState) + Send + Sync + 'static,
    {
        self.state = Some(Box::new(f));
        self
    }
}

impl Subscriber for CallbackSubscriber {
    fn on_message(&self, message: &Message) {
        (self.message)(message);
    }

    fn on_connect(&self) {
        if let Some(f) = &self.connect {
            f();
        }
    }

    fn on_disconnect(&self) {
        if let Some(f) = &self.disconnect {
            f();
        }
    }

    fn on_error(&self, error: &FeedError) {
        if let Some(f) = &self.error {
            f(error);
        }
    }

    fn on_state_change(&self, state: ConnectionState) {
        if let Some(f) = &self.state {
            f(state);
        }
    }
}

/// A topic bound to the subscriber that receives its updates.
#[derive(Clone)]
pub struct Subscription {
    /// Channel name to subscribe to.
    pub topic: Topic,
    /// Receiver of messages and lifecycle events.
    pub subscriber: Arc<dyn Subscriber>,
}

impl Subscription {
    /// Binds a subscriber to a topic.
    pub fn new(topic: Topic, subscriber: Arc<dyn Subscriber>) -> Self {
        Subscription { topic, subscriber }
    }
}

impl std::fmt::Debug for Subscription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subscription")
            .field("topic", &self.topic)
            .finish_non_exhaustive()
    }
}
