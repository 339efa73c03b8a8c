// SPDX-FileCopyrightText: 2026 Mattia Egloff <mattia.egloff@pm.me>
//
// SPDX-License-Identifier: GPL-3.0-or-later

//! Reconnect State Machine
//!
//! Pure transition logic for one live channel. The machine never touches a
//! socket or a timer: it consumes [`Input`]s and returns the [`Effect`]s the
//! driver has to carry out, in order. This keeps the reconnect and fallback
//! rules testable without a clock.

use std::time::Duration;

use super::error::NetworkError;
use super::transport::ConnectionState;
use crate::backoff::Backoff;
use crate::config::ReconnectConfig;

/// Something that happened to the connection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Input {
    /// Caller asked to connect.
    Connect,
    /// Caller asked to reconnect from scratch.
    Reconnect,
    /// Caller asked to disconnect.
    Disconnect,
    /// The pending open succeeded.
    Opened,
    /// The channel failed to open, errored or was closed by the peer.
    Lost {
        /// Transport error, `None` for a clean close.
        error: Option<NetworkError>,
    },
    /// The reconnect timer elapsed.
    TimerFired,
}

/// Work for the driver.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    /// Start opening a channel.
    OpenChannel,
    /// Close the open channel or abandon a pending open.
    CloseChannel,
    /// Arm the reconnect timer.
    ArmTimer(Duration),
    /// Disarm the reconnect timer.
    CancelTimer,
    /// Start the polling fallback.
    StartPolling,
    /// Stop the polling fallback.
    StopPolling,
    /// Tell the subscriber.
    Notify(Notice),
}

/// Subscriber-facing notifications.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notice {
    /// State changed.
    StateChanged(ConnectionState),
    /// Channel opened.
    Connected,
    /// Channel lost or closed.
    Disconnected,
    /// Transport error on the channel.
    TransportError(NetworkError),
    /// Attempts exhausted; polling has taken over.
    Exhausted {
        /// Consecutive failures counted.
        attempts: u32,
    },
}

/// Reconnect state machine for one channel.
#[derive(Debug, Clone)]
pub struct ReconnectMachine {
    state: ConnectionState,
    backoff: Backoff,
    max_attempts: u32,
    timer_armed: bool,
    link_active: bool,
    polling: bool,
}

impl ReconnectMachine {
    /// Creates a machine in the `disconnected` state.
    pub fn new(config: &ReconnectConfig) -> Self {
        ReconnectMachine {
            state: ConnectionState::Disconnected,
            backoff: Backoff::new(config.policy()),
            max_attempts: config.max_attempts,
            timer_armed: false,
            link_active: false,
            polling: false,
        }
    }

    /// Current state.
    pub fn state(&self) -> ConnectionState {
        self.state
    }

    /// Consecutive failures since the last successful open.
    pub fn attempt(&self) -> u32 {
        self.backoff.attempt()
    }

    /// Delay the next failure would schedule.
    pub fn next_delay(&self) -> Duration {
        self.backoff.current_delay()
    }

    /// Whether a reconnect timer is armed.
    pub fn timer_armed(&self) -> bool {
        self.timer_armed
    }

    /// Whether the polling fallback should be running.
    pub fn polling(&self) -> bool {
        self.polling
    }

    /// Applies one input and returns the resulting effects.
    pub fn handle(&mut self, input: Input) -> Vec<Effect> {
        let mut effects = Vec::new();
        match input {
            Input::Connect => self.begin_connect(&mut effects),
            Input::Reconnect => {
                self.backoff.reset();
                self.begin_connect(&mut effects);
            }
            Input::Disconnect => self.disconnect(&mut effects),
            Input::Opened => self.opened(&mut effects),
            Input::Lost { error } => self.lost(error, &mut effects),
            Input::TimerFired => {
                if self.timer_armed {
                    self.timer_armed = false;
                    self.open(&mut effects);
                }
            }
        }
        effects
    }

    fn begin_connect(&mut self, effects: &mut Vec<Effect>) {
        let was_connected = self.state == ConnectionState::Connected;
        self.teardown(effects);
        // Replacing an open channel passes through `disconnected`. Polling
        // is left alone.
        if was_connected {
            self.set_state(ConnectionState::Disconnected, effects);
            effects.push(Effect::Notify(Notice::Disconnected));
        }
        self.open(effects);
    }

    fn disconnect(&mut self, effects: &mut Vec<Effect>) {
        let was_connected = self.state == ConnectionState::Connected;
        self.teardown(effects);
        if self.polling {
            self.polling = false;
            effects.push(Effect::StopPolling);
        }
        self.set_state(ConnectionState::Disconnected, effects);
        if was_connected {
            effects.push(Effect::Notify(Notice::Disconnected));
        }
    }

    fn opened(&mut self, effects: &mut Vec<Effect>) {
        // An open that completes after teardown is stale.
        if !self.link_active || self.state != ConnectionState::Connecting {
            return;
        }
        self.backoff.reset();
        self.set_state(ConnectionState::Connected, effects);
        if self.polling {
            self.polling = false;
            effects.push(Effect::StopPolling);
        }
        effects.push(Effect::Notify(Notice::Connected));
    }

    fn lost(&mut self, error: Option<NetworkError>, effects: &mut Vec<Effect>) {
        if !self.link_active {
            return;
        }
        self.link_active = false;
        self.set_state(ConnectionState::Disconnected, effects);
        if let Some(error) = error {
            effects.push(Effect::Notify(Notice::TransportError(error)));
        }
        effects.push(Effect::Notify(Notice::Disconnected));

        let delay = self.backoff.current_delay();
        let attempts = self.backoff.record_failure();
        if attempts >= self.max_attempts {
            self.set_state(ConnectionState::Failed, effects);
            if !self.polling {
                self.polling = true;
                effects.push(Effect::StartPolling);
            }
            effects.push(Effect::Notify(Notice::Exhausted { attempts }));
        } else {
            self.timer_armed = true;
            effects.push(Effect::ArmTimer(delay));
        }
    }

    fn open(&mut self, effects: &mut Vec<Effect>) {
        self.link_active = true;
        self.set_state(ConnectionState::Connecting, effects);
        effects.push(Effect::OpenChannel);
    }

    fn teardown(&mut self, effects: &mut Vec<Effect>) {
        if self.timer_armed {
            self.timer_armed = false;
            effects.push(Effect::CancelTimer);
        }
        if self.link_active {
            self.link_active = false;
            effects.push(Effect::CloseChannel);
        }
    }

    fn set_state(&mut self, state: ConnectionState, effects: &mut Vec<Effect>) {
        if self.state != state {
            self.state = state;
            effects.push(Effect::Notify(Notice::StateChanged(state)));
        }
    }
}
