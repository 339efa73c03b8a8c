// SPDX-FileCopyrightText: 2026 Mattia Egloff <mattia.egloff@pm.me>
//
// SPDX-License-Identifier: GPL-3.0-or-later

//! Message Types
//!
//! The single message shape delivered to subscribers, whether it arrived as
//! a live channel frame or was wrapped from a poll response.

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

/// Kind of update carried by a [`Message`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MessageType {
    /// Generic data update (also used for poll results).
    Update,
    /// Metrics changed.
    #[serde(alias = "metricsUpdate")]
    MetricsUpdate,
    /// An intervention changed.
    #[serde(alias = "interventionUpdate")]
    InterventionUpdate,
    /// Alert raised by the server.
    Alert,
    /// Keep-alive with no payload.
    Heartbeat,
    /// Server-side error report.
    Error,
}

impl MessageType {
    /// Wire name of this message type.
    pub fn as_str(&self) -> &'static str {
        match self {
            MessageType::Update => "update",
            MessageType::MetricsUpdate => "metrics_update",
            MessageType::InterventionUpdate => "intervention_update",
            MessageType::Alert => "alert",
            MessageType::Heartbeat => "heartbeat",
            MessageType::Error => "error",
        }
    }
}

impl std::fmt::Display for MessageType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A delivered update.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    /// What kind of update this is.
    #[serde(rename = "type")]
    pub kind: MessageType,
    /// When the update was produced.
    #[serde(deserialize_with = "deserialize_timestamp")]
    pub timestamp: DateTime<Utc>,
    /// Update body, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payload: Option<Value>,
    /// Alert details, for `alert` messages.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alert: Option<Value>,
}

impl Message {
    /// Parses an inbound text frame.
    ///
    /// The frame must be a JSON object with a known `type` and a
    /// `timestamp`. Timestamps may be RFC 3339, ISO 8601 without an offset
    /// (read as UTC) or integer milliseconds since the Unix epoch.
    pub fn from_frame(frame: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(frame)
    }

    /// Wraps a poll result as an `update` message stamped now.
    pub fn update(payload: Value) -> Self {
        Message {
            kind: MessageType::Update,
            timestamp: Utc::now(),
            payload: Some(payload),
            alert: None,
        }
    }

    /// Serializes back to the wire format.
    pub fn to_frame(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}

/// Accepts the timestamp spellings dashboard backends emit.
fn deserialize_timestamp<'de, D>(deserializer: D) -> Result<DateTime<Utc>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Text(String),
        Millis(i64),
    }

    match Raw::deserialize(deserializer)? {
        Raw::Text(text) => parse_timestamp(&text)
            .ok_or_else(|| D::Error::custom(format!("invalid timestamp: {}", text))),
        Raw::Millis(millis) => DateTime::from_timestamp_millis(millis)
            .ok_or_else(|| D::Error::custom(format!("timestamp out of range: {}", millis))),
    }
}

fn parse_timestamp(text: &str) -> Option<DateTime<Utc>> {
    if let Ok(ts) = DateTime::parse_from_rfc3339(text) {
        return Some(ts.with_timezone(&Utc));
    }
    NaiveDateTime::parse_from_str(text, "%Y-%m-%dT%H:%M:%S%.f")
        .ok()
        .map(|naive| naive.and_utc())
}
