// SPDX-FileCopyrightText: 2026 Mattia Egloff <mattia.egloff@pm.me>
//
// SPDX-License-Identifier: GPL-3.0-or-later

//! Common Test Utilities
//!
//! Shared subscriber and fetcher doubles used across test modules.

#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use livefeed_core::{ConnectionState, FeedError, FetchError, Fetcher, Message, Subscriber};
use serde_json::Value;
use tokio::sync::mpsc;
use tokio::time::Instant;

/// Everything a subscriber can observe, in order.
#[derive(Debug, Clone, PartialEq)]
pub enum Event {
    Message(Message),
    Connect,
    Disconnect,
    Error(String),
    State(ConnectionState),
}

/// Subscriber that forwards every callback into a channel.
pub struct RecordingSubscriber {
    tx: mpsc::UnboundedSender<Event>,
}

impl RecordingSubscriber {
    pub fn new() -> (Arc<Self>, EventLog) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Arc::new(RecordingSubscriber { tx }), EventLog { rx })
    }
}

impl Subscriber for RecordingSubscriber {
    fn on_message(&self, message: &Message) {
        let _ = self.tx.send(Event::Message(message.clone()));
    }

    fn on_connect(&self) {
        let _ = self.tx.send(Event::Connect);
    }

    fn on_disconnect(&self) {
        let _ = self.tx.send(Event::Disconnect);
    }

    fn on_error(&self, error: &FeedError) {
        let _ = self.tx.send(Event::Error(error.to_string()));
    }

    fn on_state_change(&self, state: ConnectionState) {
        let _ = self.tx.send(Event::State(state));
    }
}

/// Receiving end of a [`RecordingSubscriber`].
pub struct EventLog {
    rx: mpsc::UnboundedReceiver<Event>,
}

impl EventLog {
    /// Next event, waiting for it.
    pub async fn next(&mut self) -> Event {
        self.rx.recv().await.expect("subscriber dropped")
    }

    /// Waits until `pred` matches, returning every event seen up to and
    /// including the match.
    pub async fn until(&mut self, pred: impl Fn(&Event) -> bool) -> Vec<Event> {
        let mut seen = Vec::new();
        loop {
            let event = self.next().await;
            let done = pred(&event);
            seen.push(event);
            if done {
                return seen;
            }
        }
    }

    /// Waits for the given state.
    pub async fn until_state(&mut self, state: ConnectionState) -> Vec<Event> {
        self.until(|e| *e == Event::State(state)).await
    }

    /// Waits for the next delivered message.
    pub async fn next_message(&mut self) -> Message {
        loop {
            if let Event::Message(message) = self.next().await {
                return message;
            }
        }
    }

    /// Events already queued, without waiting.
    pub fn drain(&mut self) -> Vec<Event> {
        let mut events = Vec::new();
        while let Ok(event) = self.rx.try_recv() {
            events.push(event);
        }
        events
    }
}

/// States in the order they were reported.
pub fn states(events: &[Event]) -> Vec<ConnectionState> {
    events
        .iter()
        .filter_map(|e| match e {
            Event::State(s) => Some(*s),
            _ => None,
        })
        .collect()
}

/// Fetcher that plays back a script of outcomes and records call times.
///
/// Once the script runs out, every call succeeds with `{"seq": n}`.
#[derive(Default)]
pub struct ScriptedFetcher {
    script: Mutex<VecDeque<Result<Value, u16>>>,
    calls: Mutex<Vec<(String, Instant)>>,
}

impl ScriptedFetcher {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn with_script(script: impl IntoIterator<Item = Result<Value, u16>>) -> Arc<Self> {
        let fetcher = Self::default();
        fetcher.script.lock().unwrap().extend(script);
        Arc::new(fetcher)
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }

    pub fn call_times(&self) -> Vec<Instant> {
        self.calls.lock().unwrap().iter().map(|(_, t)| *t).collect()
    }

    pub fn keys(&self) -> Vec<String> {
        self.calls.lock().unwrap().iter().map(|(k, _)| k.clone()).collect()
    }
}

#[async_trait]
impl Fetcher for ScriptedFetcher {
    async fn fetch(&self, key: &str) -> Result<Value, FetchError> {
        let seq = {
            let mut calls = self.calls.lock().unwrap();
            calls.push((key.to_string(), Instant::now()));
            calls.len()
        };
        let next = self.script.lock().unwrap().pop_front();
        match next {
            Some(Ok(payload)) => Ok(payload),
            Some(Err(status)) => Err(FetchError::HttpError(status)),
            None => Ok(serde_json::json!({ "seq": seq })),
        }
    }
}

/// Gaps between consecutive instants, in whole seconds.
pub fn gaps_secs(times: &[Instant]) -> Vec<u64> {
    times
        .windows(2)
        .map(|w| (w[1] - w[0]).as_secs())
        .collect()
}
