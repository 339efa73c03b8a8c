// SPDX-FileCopyrightText: 2026 Mattia Egloff <mattia.egloff@pm.me>
//
// SPDX-License-Identifier: GPL-3.0-or-later

//! Exponential Backoff
//!
//! `BackoffPolicy` is the pure delay formula; `Backoff` is the per-owner
//! attempt counter built on top of it. The live channel and the polling
//! fallback each own their own `Backoff`.

use std::time::Duration;

/// Default first reconnect delay.
pub const DEFAULT_INITIAL_DELAY: Duration = Duration::from_millis(1_000);

/// Default reconnect delay cap.
pub const DEFAULT_MAX_DELAY: Duration = Duration::from_millis(30_000);

/// Capped exponential delay: `min(initial_delay * 2^attempt, max_delay)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BackoffPolicy {
    /// Delay for attempt 0.
    pub initial_delay: Duration,
    /// Upper bound for any delay.
    pub max_delay: Duration,
}

impl BackoffPolicy {
    /// Creates a policy with the given bounds.
    pub const fn new(initial_delay: Duration, max_delay: Duration) -> Self {
        BackoffPolicy {
            initial_delay,
            max_delay,
        }
    }

    /// Returns the delay for the given attempt.
    pub fn next_delay(&self, attempt: u32) -> Duration {
        let factor = 2u32.saturating_pow(attempt);
        self.initial_delay
            .saturating_mul(factor)
            .min(self.max_delay)
    }
}

impl Default for BackoffPolicy {
    fn default() -> Self {
        BackoffPolicy::new(DEFAULT_INITIAL_DELAY, DEFAULT_MAX_DELAY)
    }
}

/// Backoff state owned by a single component.
///
/// The policy never resets itself; the owner calls [`Backoff::reset`] on its
/// own success event.
#[derive(Debug, Clone)]
pub struct Backoff {
    policy: BackoffPolicy,
    attempt: u32,
}

impl Backoff {
    /// Creates a fresh state at attempt 0.
    pub fn new(policy: BackoffPolicy) -> Self {
        Backoff { policy, attempt: 0 }
    }

    /// Returns the policy this state uses.
    pub fn policy(&self) -> &BackoffPolicy {
        &self.policy
    }

    /// Returns the number of failures recorded since the last reset.
    pub fn attempt(&self) -> u32 {
        self.attempt
    }

    /// Returns the delay for the current attempt.
    pub fn current_delay(&self) -> Duration {
        self.policy.next_delay(self.attempt)
    }

    /// Records one failure and returns the new attempt count.
    pub fn record_failure(&mut self) -> u32 {
        self.attempt = self.attempt.saturating_add(1);
        self.attempt
    }

    /// Back to attempt 0 and the initial delay.
    pub fn reset(&mut self) {
        self.attempt = 0;
    }
}

impl Default for Backoff {
    fn default() -> Self {
        Backoff::new(BackoffPolicy::default())
    }
}
