//! Outbound connection manager.
//!
//! Owns one framed TCP connection to the remote agent and drives the
//! connect/retry state machine:
//!
//! ```text
//! Disconnected --connect()--> Connecting --ok--> Connected
//!      ^                          |                 |
//!      |                          v (auto)          v (socket error)
//!      +--- disconnect() --- Reconnecting <---------+
//! ```
//!
//! Retries run at a fixed interval with no upper bound on attempts until
//! `disconnect()` is called or a connection succeeds. All socket mutation is
//! serialized behind the writer lock; the receive loop runs as a dedicated
//! task per live connection and exits through the shutdown watch channel or
//! an I/O error.

use std::sync::Arc;
use std::time::Duration;

use metrics::counter;
use serde_json::Value;
use tokio::net::TcpStream;
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tokio::sync::watch;
use tracing::{info, warn};

use tether_core::message::Role;
use tether_core::sink::{ConversationSink, resolve_role};

use crate::dispatch::{Dispatcher, process_frame};
use crate::errors::{NetError, Result};
use crate::frame::{DEFAULT_MAX_FRAME_BYTES, read_frame, write_frame};

/// Client connection settings.
#[derive(Clone, Debug)]
pub struct ClientConfig {
    /// Agent host.
    pub host: String,
    /// Agent port.
    pub port: u16,
    /// Fixed retry interval. No backoff growth.
    pub reconnect_interval: Duration,
    /// Whether a failed or dropped connection retries indefinitely.
    pub auto_reconnect: bool,
    /// Frame cap for both directions.
    pub max_frame_bytes: usize,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 9999,
            reconnect_interval: Duration::from_millis(5000),
            auto_reconnect: true,
            max_frame_bytes: DEFAULT_MAX_FRAME_BYTES,
        }
    }
}

/// Connection lifecycle states.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ConnectionState {
    /// No connection, no retry pending.
    Disconnected,
    /// First connection attempt in flight.
    Connecting,
    /// Live connection with an active receive loop.
    Connected,
    /// Retry loop active.
    Reconnecting,
}

struct StateCell {
    state: ConnectionState,
    attempt: u64,
    retry_active: bool,
}

struct Inner {
    config: ClientConfig,
    dispatcher: Dispatcher,
    sink: Option<Arc<dyn ConversationSink>>,
    /// The socket lock: all open/close/assign of the write half happens
    /// while holding this.
    writer: tokio::sync::Mutex<Option<OwnedWriteHalf>>,
    state: parking_lot::Mutex<StateCell>,
    /// Shutdown signal for the current connect generation. Replaced on each
    /// `connect()` so a past `disconnect()` cannot kill a new session.
    shutdown: parking_lot::Mutex<watch::Sender<bool>>,
}

/// Connection manager for one outbound agent link.
///
/// Cheap to clone; all clones share the same connection. At most one
/// `AgentClient` may own a given agent socket at a time.
#[derive(Clone)]
pub struct AgentClient {
    inner: Arc<Inner>,
}

impl AgentClient {
    /// Create a manager in the `Disconnected` state.
    #[must_use]
    pub fn new(
        config: ClientConfig,
        dispatcher: Dispatcher,
        sink: Option<Arc<dyn ConversationSink>>,
    ) -> Self {
        let (shutdown, _) = watch::channel(false);
        Self {
            inner: Arc::new(Inner {
                config,
                dispatcher,
                sink,
                writer: tokio::sync::Mutex::new(None),
                state: parking_lot::Mutex::new(StateCell {
                    state: ConnectionState::Disconnected,
                    attempt: 0,
                    retry_active: false,
                }),
                shutdown: parking_lot::Mutex::new(shutdown),
            }),
        }
    }

    /// Current lifecycle state.
    #[must_use]
    pub fn state(&self) -> ConnectionState {
        self.inner.state.lock().state
    }

    /// Retry attempts made since the last successful connection.
    #[must_use]
    pub fn attempt(&self) -> u64 {
        self.inner.state.lock().attempt
    }

    /// Whether a live connection exists.
    #[must_use]
    pub fn is_connected(&self) -> bool {
        self.state() == ConnectionState::Connected
    }

    /// Establish the connection.
    ///
    /// A no-op reporting success when already connected or when a retry
    /// sequence is in flight. On immediate failure with `auto_reconnect`
    /// set, the retry loop starts in the background and the error is still
    /// returned to the caller.
    pub async fn connect(&self) -> Result<()> {
        {
            let mut cell = self.inner.state.lock();
            match cell.state {
                ConnectionState::Connected => return Ok(()),
                ConnectionState::Connecting | ConnectionState::Reconnecting => return Ok(()),
                ConnectionState::Disconnected => cell.state = ConnectionState::Connecting,
            }
        }
        // Fresh generation: a previous disconnect() must not affect it.
        let shutdown_rx = {
            let (tx, rx) = watch::channel(false);
            *self.inner.shutdown.lock() = tx;
            rx
        };

        match self.try_open().await {
            Ok(stream) => {
                self.install(stream, shutdown_rx).await;
                Ok(())
            }
            Err(e) => {
                warn!(host = %self.inner.config.host, port = self.inner.config.port, error = %e, "connection failed");
                if self.inner.config.auto_reconnect {
                    self.enter_reconnecting(shutdown_rx);
                } else {
                    self.inner.state.lock().state = ConnectionState::Disconnected;
                }
                Err(e)
            }
        }
    }

    /// Send one payload to the agent.
    ///
    /// Persists the payload through the sink (role `user` unless the
    /// document says otherwise) on success. A send failure tears the
    /// connection down and, with `auto_reconnect`, starts the retry loop.
    pub async fn send(&self, doc: &Value) -> Result<()> {
        let payload = serde_json::to_vec(doc)?;
        let mut guard = self.inner.writer.lock().await;
        let Some(writer) = guard.as_mut() else {
            return Err(NetError::NotConnected);
        };

        match write_frame(writer, &payload, self.inner.config.max_frame_bytes).await {
            Ok(()) => {
                if let Some(sink) = &self.inner.sink {
                    sink.record(resolve_role(doc, Role::User), doc);
                }
                Ok(())
            }
            Err(e) => {
                warn!(error = %e, "send failed, tearing down connection");
                *guard = None;
                drop(guard);
                self.on_connection_lost();
                Err(e)
            }
        }
    }

    /// Drop the connection and cancel any pending retry.
    ///
    /// The only cancellation primitive: interrupts the retry timer and
    /// closes the socket, which makes the receive loop exit.
    pub async fn disconnect(&self) {
        let _ = self.inner.shutdown.lock().send(true);
        {
            let mut cell = self.inner.state.lock();
            cell.state = ConnectionState::Disconnected;
            cell.attempt = 0;
            cell.retry_active = false;
        }
        let mut guard = self.inner.writer.lock().await;
        if let Some(mut writer) = guard.take() {
            use tokio::io::AsyncWriteExt;
            let _ = writer.shutdown().await;
        }
        info!("disconnected from agent");
    }

    async fn try_open(&self) -> Result<TcpStream> {
        let addr = (self.inner.config.host.as_str(), self.inner.config.port);
        Ok(TcpStream::connect(addr).await?)
    }

    /// Take ownership of an established stream: store the write half, mark
    /// `Connected`, start the receive loop.
    async fn install(&self, stream: TcpStream, shutdown_rx: watch::Receiver<bool>) {
        let (read_half, write_half) = stream.into_split();
        *self.inner.writer.lock().await = Some(write_half);
        {
            let mut cell = self.inner.state.lock();
            cell.state = ConnectionState::Connected;
            cell.attempt = 0;
            cell.retry_active = false;
        }
        info!(host = %self.inner.config.host, port = self.inner.config.port, "connected to agent");

        let client = self.clone();
        drop(tokio::spawn(async move {
            client.receive_loop(read_half, shutdown_rx).await;
        }));
    }

    async fn receive_loop(
        &self,
        mut reader: OwnedReadHalf,
        mut shutdown_rx: watch::Receiver<bool>,
    ) {
        loop {
            tokio::select! {
                _ = shutdown_rx.changed() => {
                    if *shutdown_rx.borrow() {
                        return;
                    }
                }
                frame = read_frame(&mut reader, self.inner.config.max_frame_bytes) => {
                    match frame {
                        Ok(body) => {
                            let _ = process_frame(
                                &self.inner.dispatcher,
                                self.inner.sink.as_ref(),
                                &body,
                                "agent",
                            );
                        }
                        Err(e) => {
                            warn!(error = %e, "receive loop ended");
                            break;
                        }
                    }
                }
            }
        }
        // Connection lost (not a local disconnect): tear down and retry.
        *self.inner.writer.lock().await = None;
        self.on_connection_lost();
    }

    /// Shared socket-error path for send and receive failures.
    fn on_connection_lost(&self) {
        if *self.inner.shutdown.lock().borrow() {
            return; // local disconnect already handled state
        }
        if self.inner.config.auto_reconnect {
            let shutdown_rx = self.inner.shutdown.lock().subscribe();
            self.enter_reconnecting(shutdown_rx);
        } else {
            self.inner.state.lock().state = ConnectionState::Disconnected;
        }
    }

    /// Move to `Reconnecting` and ensure exactly one retry task is active.
    fn enter_reconnecting(&self, shutdown_rx: watch::Receiver<bool>) {
        {
            let mut cell = self.inner.state.lock();
            cell.state = ConnectionState::Reconnecting;
            if cell.retry_active {
                return;
            }
            cell.retry_active = true;
        }
        let client = self.clone();
        drop(tokio::spawn(async move {
            client.retry_loop(shutdown_rx).await;
        }));
    }

    async fn retry_loop(&self, mut shutdown_rx: watch::Receiver<bool>) {
        loop {
            tokio::select! {
                _ = shutdown_rx.changed() => {
                    if *shutdown_rx.borrow() {
                        info!("reconnection stopped: client disconnected");
                        return;
                    }
                }
                () = tokio::time::sleep(self.inner.config.reconnect_interval) => {}
            }
            if *shutdown_rx.borrow() {
                return;
            }

            let attempt = {
                let mut cell = self.inner.state.lock();
                cell.attempt += 1;
                cell.attempt
            };
            counter!("tether_reconnect_attempts_total").increment(1);

            match self.try_open().await {
                Ok(stream) => {
                    info!(attempt, "reconnected to agent");
                    self.install(stream, shutdown_rx.clone()).await;
                    return;
                }
                Err(e) => {
                    warn!(attempt, error = %e, "reconnection attempt failed");
                }
            }
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
