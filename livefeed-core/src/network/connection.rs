// SPDX-FileCopyrightText: 2026 Mattia Egloff <mattia.egloff@pm.me>
//
// SPDX-License-Identifier: GPL-3.0-or-later

//! Connection Manager
//!
//! Manages the live channel lifecycle with automatic reconnection and a
//! polling fallback once reconnects are exhausted.
//!
//! A [`ConnectionManager`] is a handle to a driver task. The driver owns the
//! [`ReconnectMachine`], the channel, the reconnect timer and the
//! [`PollingFallback`], and is the only writer of the connection state. All
//! of its work happens on that one task: commands, channel events and timer
//! ticks are taken one at a time from a single `select!` loop.

use std::future::pending;
use std::pin::Pin;
use std::sync::Arc;
use std::time::Duration;

use futures_util::future::BoxFuture;
use tokio::sync::{mpsc, oneshot, watch};
use tokio::time::{sleep, Sleep};
use tracing::{debug, info, warn};
use url::Url;

use super::error::NetworkError;
use super::machine::{Effect, Input, Notice, ReconnectMachine};
use super::transport::{
    Channel, ConnectionState, ConnectionStatus, Transport, TransportResult,
};
use super::websocket::WebSocketTransport;
use crate::config::{PollingConfig, ReconnectConfig};
use crate::error::{FeedError, FeedResult};
use crate::message::Message;
use crate::polling::{Fetcher, PollingFallback};
use crate::router::MessageRouter;
use crate::subscriber::Subscriber;

/// Handle to a live channel with automatic reconnection.
///
/// Dropping the handle disconnects and stops the driver.
///
/// # Example
///
/// ```ignore
/// use livefeed_core::network::ConnectionManager;
///
/// let manager = ConnectionManager::builder(url, subscriber)
///     .fallback("graph_stats", fetcher)
///     .spawn();
/// manager.connect().await?;
/// ```
pub struct ConnectionManager {
    url: Url,
    commands: mpsc::UnboundedSender<Command>,
    status: watch::Receiver<ConnectionStatus>,
    router: Arc<MessageRouter>,
}

impl ConnectionManager {
    /// Starts building a manager for the channel at `url`.
    pub fn builder(url: Url, subscriber: Arc<dyn Subscriber>) -> ConnectionManagerBuilder {
        ConnectionManagerBuilder {
            url,
            subscriber,
            transport: None,
            reconnect: ReconnectConfig::default(),
            polling: PollingConfig::default(),
            fallback: None,
        }
    }

    /// Opens the channel, tearing down any existing channel and pending
    /// reconnect first.
    ///
    /// An open channel is reported as `disconnected` before the new one
    /// starts connecting.
    pub async fn connect(&self) -> FeedResult<()> {
        self.request(Input::Connect).await
    }

    /// Closes the channel and cancels every pending reconnect and poll.
    ///
    /// When this returns no further state transitions happen until
    /// [`connect`](Self::connect) or [`reconnect`](Self::reconnect).
    pub async fn disconnect(&self) -> FeedResult<()> {
        self.request(Input::Disconnect).await
    }

    /// Resets the attempt counter and delay, then connects.
    pub async fn reconnect(&self) -> FeedResult<()> {
        self.request(Input::Reconnect).await
    }

    /// Current connection state.
    pub fn state(&self) -> ConnectionState {
        self.status.borrow().state
    }

    /// Current status snapshot.
    pub fn status(&self) -> ConnectionStatus {
        *self.status.borrow()
    }

    /// Returns true if the channel is open.
    pub fn is_connected(&self) -> bool {
        self.state() == ConnectionState::Connected
    }

    /// Receiver that observes every status change.
    pub fn watch_status(&self) -> watch::Receiver<ConnectionStatus> {
        self.status.clone()
    }

    /// Most recently delivered message from either source.
    pub fn last_message(&self) -> Option<Message> {
        self.router.last_message()
    }

    /// Channel URL.
    pub fn url(&self) -> &Url {
        &self.url
    }

    async fn request(&self, input: Input) -> FeedResult<()> {
        let (ack, done) = oneshot::channel();
        self.commands
            .send(Command { input, ack })
            .map_err(|_| FeedError::Shutdown)?;
        done.await.map_err(|_| FeedError::Shutdown)
    }
}

impl std::fmt::Debug for ConnectionManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConnectionManager")
            .field("url", &self.url.as_str())
            .field("status", &self.status())
            .finish()
    }
}

/// Builder for [`ConnectionManager`].
pub struct ConnectionManagerBuilder {
    url: Url,
    subscriber: Arc<dyn Subscriber>,
    transport: Option<Arc<dyn Transport>>,
    reconnect: ReconnectConfig,
    polling: PollingConfig,
    fallback: Option<(String, Arc<dyn Fetcher>)>,
}

impl ConnectionManagerBuilder {
    /// Uses the given transport instead of [`WebSocketTransport`].
    pub fn transport(mut self, transport: Arc<dyn Transport>) -> Self {
        self.transport = Some(transport);
        self
    }

    /// Overrides the reconnect policy.
    pub fn reconnect(mut self, config: ReconnectConfig) -> Self {
        self.reconnect = config;
        self
    }

    /// Overrides the polling policy.
    pub fn polling(mut self, config: PollingConfig) -> Self {
        self.polling = config;
        self
    }

    /// Resource to poll once reconnects are exhausted.
    ///
    /// Without a fallback the manager simply stays `failed`.
    pub fn fallback(mut self, key: impl Into<String>, fetcher: Arc<dyn Fetcher>) -> Self {
        self.fallback = Some((key.into(), fetcher));
        self
    }

    /// Spawns the driver on the current Tokio runtime.
    ///
    /// The manager starts `disconnected`; call
    /// [`connect`](ConnectionManager::connect) to open the channel.
    pub fn spawn(self) -> ConnectionManager {
        let router = Arc::new(MessageRouter::new(Arc::clone(&self.subscriber)));
        let (commands, command_rx) = mpsc::unbounded_channel();
        let (status_tx, status) = watch::channel(ConnectionStatus::default());
        let transport = self
            .transport
            .unwrap_or_else(|| Arc::new(WebSocketTransport::new()));

        let driver = Driver {
            url: self.url.clone(),
            transport,
            machine: ReconnectMachine::new(&self.reconnect),
            subscriber: self.subscriber,
            router: Arc::clone(&router),
            polling: PollingFallback::new(self.polling, Arc::clone(&router)),
            fallback: self.fallback,
            link: Link::Idle,
            timer: RetryTimer::default(),
            status: status_tx,
            commands: command_rx,
        };
        tokio::spawn(driver.run());

        ConnectionManager {
            url: self.url,
            commands,
            status,
            router,
        }
    }
}

struct Command {
    input: Input,
    ack: oneshot::Sender<()>,
}

type PendingOpen = BoxFuture<'static, TransportResult<Box<dyn Channel>>>;

enum Link {
    Idle,
    Opening(PendingOpen),
    Open(Box<dyn Channel>),
}

enum LinkEvent {
    Opened(Box<dyn Channel>),
    Frame(String),
    Lost(Option<NetworkError>),
}

impl Link {
    /// Waits for the next event on the link; never resolves while idle.
    async fn next_event(&mut self) -> LinkEvent {
        match self {
            Link::Idle => pending().await,
            Link::Opening(open) => match open.as_mut().await {
                Ok(channel) => LinkEvent::Opened(channel),
                Err(err) => LinkEvent::Lost(Some(err)),
            },
            Link::Open(channel) => match channel.recv().await {
                Ok(Some(frame)) => LinkEvent::Frame(frame),
                Ok(None) => LinkEvent::Lost(None),
                Err(err) => LinkEvent::Lost(Some(err)),
            },
        }
    }
}

#[derive(Default)]
struct RetryTimer(Option<Pin<Box<Sleep>>>);

impl RetryTimer {
    fn arm(&mut self, delay: Duration) {
        self.0 = Some(Box::pin(sleep(delay)));
    }

    fn clear(&mut self) {
        self.0 = None;
    }

    async fn fired(&mut self) {
        match &mut self.0 {
            Some(timer) => timer.as_mut().await,
            None => pending().await,
        }
    }
}

struct Driver {
    url: Url,
    transport: Arc<dyn Transport>,
    machine: ReconnectMachine,
    subscriber: Arc<dyn Subscriber>,
    router: Arc<MessageRouter>,
    polling: PollingFallback,
    fallback: Option<(String, Arc<dyn Fetcher>)>,
    link: Link,
    timer: RetryTimer,
    status: watch::Sender<ConnectionStatus>,
    commands: mpsc::UnboundedReceiver<Command>,
}

impl Driver {
    async fn run(mut self) {
        loop {
            tokio::select! {
                // Commands first, so a disconnect beats an already-due timer.
                biased;

                command = self.commands.recv() => match command {
                    Some(Command { input, ack }) => {
                        self.apply(input).await;
                        let _ = ack.send(());
                    }
                    None => {
                        debug!(url = %self.url, "manager dropped, shutting down");
                        self.apply(Input::Disconnect).await;
                        return;
                    }
                },
                event = self.link.next_event() => self.on_link_event(event).await,
                () = self.timer.fired() => {
                    self.timer.clear();
                    self.apply(Input::TimerFired).await;
                }
            }
        }
    }

    async fn on_link_event(&mut self, event: LinkEvent) {
        match event {
            LinkEvent::Opened(channel) => {
                self.link = Link::Open(channel);
                self.apply(Input::Opened).await;
            }
            LinkEvent::Frame(frame) => {
                // Parse failures are logged by the router and change nothing.
                self.router.route_frame(&frame);
            }
            LinkEvent::Lost(error) => {
                self.link = Link::Idle;
                self.apply(Input::Lost { error }).await;
            }
        }
    }

    async fn apply(&mut self, input: Input) {
        let effects = self.machine.handle(input);
        for effect in effects {
            self.perform(effect).await;
        }
        self.status.send_replace(ConnectionStatus {
            state: self.machine.state(),
            attempt: self.machine.attempt(),
            polling: self.polling.is_running(),
        });
    }

    async fn perform(&mut self, effect: Effect) {
        match effect {
            Effect::OpenChannel => {
                debug!(url = %self.url, attempt = self.machine.attempt(), "opening channel");
                let transport = Arc::clone(&self.transport);
                let url = self.url.clone();
                self.link = Link::Opening(Box::pin(async move { transport.open(&url).await }));
            }
            Effect::CloseChannel => {
                if let Link::Open(mut channel) = std::mem::replace(&mut self.link, Link::Idle) {
                    channel.close().await;
                }
            }
            Effect::ArmTimer(delay) => {
                debug!(
                    url = %self.url,
                    attempt = self.machine.attempt(),
                    delay_ms = delay.as_millis() as u64,
                    "reconnect scheduled"
                );
                self.timer.arm(delay);
            }
            Effect::CancelTimer => self.timer.clear(),
            Effect::StartPolling => match &self.fallback {
                Some((key, fetcher)) => self.polling.start(key.clone(), Arc::clone(fetcher)),
                None => warn!(url = %self.url, "reconnects exhausted and no polling fallback configured"),
            },
            Effect::StopPolling => self.polling.stop(),
            Effect::Notify(notice) => self.notify(notice),
        }
    }

    fn notify(&self, notice: Notice) {
        match notice {
            Notice::StateChanged(state) => {
                debug!(url = %self.url, %state, "state changed");
                self.subscriber.on_state_change(state);
            }
            Notice::Connected => {
                info!(url = %self.url, "channel connected");
                self.subscriber.on_connect();
            }
            Notice::Disconnected => {
                info!(url = %self.url, "channel disconnected");
                self.subscriber.on_disconnect();
            }
            Notice::TransportError(err) => {
                warn!(url = %self.url, error = %err, "channel error");
                self.subscriber.on_error(&FeedError::Transport(err));
            }
            Notice::Exhausted { attempts } => {
                warn!(url = %self.url, attempts, "reconnects exhausted, falling back to polling");
                self.subscriber
                    .on_error(&FeedError::ReconnectExhausted { attempts });
            }
        }
    }
}
