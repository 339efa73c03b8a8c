// SPDX-FileCopyrightText: 2026 Mattia Egloff <mattia.egloff@pm.me>
//
// SPDX-License-Identifier: GPL-3.0-or-later

//! Network Error Types

use thiserror::Error;

/// Live channel errors.
///
/// Carries rendered messages rather than source errors so it can travel
/// through the reconnect state machine by value.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum NetworkError {
    /// The channel URL was rejected.
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    /// The channel could not be opened.
    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    /// The peer closed the channel.
    #[error("Connection closed")]
    ConnectionClosed,

    /// Reading from an open channel failed.
    #[error("Receive failed: {0}")]
    ReceiveFailed(String),
}
