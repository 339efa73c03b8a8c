// SPDX-FileCopyrightText: 2026 Mattia Egloff <mattia.egloff@pm.me>
//
// SPDX-License-Identifier: GPL-3.0-or-later

//! Feed Error Types

use thiserror::Error;

use crate::cache::FetchError;
use crate::config::ConfigError;
use crate::network::NetworkError;

/// Result type for feed operations.
pub type FeedResult<T> = Result<T, FeedError>;

/// Errors surfaced to callers and to [`Subscriber::on_error`].
///
/// [`Subscriber::on_error`]: crate::Subscriber::on_error
#[derive(Debug, Error)]
pub enum FeedError {
    /// The live channel failed; a reconnect may already be scheduled.
    #[error("Transport error: {0}")]
    Transport(#[from] NetworkError),

    /// Reconnect attempts ran out and polling took over.
    #[error("Reconnect attempts exhausted after {attempts} failures")]
    ReconnectExhausted {
        /// Consecutive failures that led here.
        attempts: u32,
    },

    /// A polling fetch failed.
    #[error("Fetch error: {0}")]
    Fetch(#[from] FetchError),

    /// Invalid configuration.
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// The connection driver is gone.
    #[error("Connection manager has shut down")]
    Shutdown,
}
