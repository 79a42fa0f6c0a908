//! Inbound push channel.
//!
//! Accepts framed TCP peers, registers each with the [`PeerRegistry`], and
//! runs a reader and a writer task per peer. Inbound frames go through the
//! same decode/persist/dispatch pipeline as the client's; outbound traffic
//! is broadcast-only via [`AgentServer::broadcast`].

use std::sync::Arc;

use serde_json::Value;
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::watch;
use tracing::{info, warn};
use uuid::Uuid;

use tether_core::sink::ConversationSink;

use crate::dispatch::{Dispatcher, process_frame};
use crate::errors::Result;
use crate::frame::{DEFAULT_MAX_FRAME_BYTES, read_frame, write_frame};
use crate::registry::PeerRegistry;

/// Push-channel server: accept loop plus per-peer tasks.
pub struct AgentServer {
    listener: TcpListener,
    registry: Arc<PeerRegistry>,
    dispatcher: Dispatcher,
    sink: Option<Arc<dyn ConversationSink>>,
    max_frame: usize,
    shutdown: watch::Sender<bool>,
}

impl AgentServer {
    /// Bind the listening socket. The accept loop starts with
    /// [`run`](Self::run).
    pub async fn bind(
        addr: &str,
        dispatcher: Dispatcher,
        sink: Option<Arc<dyn ConversationSink>>,
    ) -> Result<Self> {
        let listener = TcpListener::bind(addr).await?;
        info!(addr = %listener.local_addr()?, "push channel listening");
        let (shutdown, _) = watch::channel(false);
        Ok(Self {
            listener,
            registry: Arc::new(PeerRegistry::new()),
            dispatcher,
            sink,
            max_frame: DEFAULT_MAX_FRAME_BYTES,
            shutdown,
        })
    }

    /// The bound address.
    pub fn local_addr(&self) -> Result<std::net::SocketAddr> {
        Ok(self.listener.local_addr()?)
    }

    /// Shared registry handle, for broadcasting from outside the server.
    #[must_use]
    pub fn registry(&self) -> Arc<PeerRegistry> {
        Arc::clone(&self.registry)
    }

    /// Queue one document to every connected peer.
    pub fn broadcast(&self, doc: &Value) -> Result<usize> {
        self.registry.broadcast(doc)
    }

    /// Signal the accept loop and every peer task to stop.
    pub fn shutdown(&self) {
        let _ = self.shutdown.send(true);
    }

    /// Run the accept loop until [`shutdown`](Self::shutdown).
    pub async fn run(&self) {
        let mut shutdown_rx = self.shutdown.subscribe();
        loop {
            tokio::select! {
                _ = shutdown_rx.changed() => {
                    if *shutdown_rx.borrow() {
                        info!("push channel stopping");
                        return;
                    }
                }
                accepted = self.listener.accept() => {
                    match accepted {
                        Ok((stream, addr)) => {
                            let peer_id = format!("peer_{}", Uuid::now_v7());
                            info!(peer_id = %peer_id, %addr, "peer connected");
                            self.spawn_peer(peer_id, stream);
                        }
                        Err(e) => warn!(error = %e, "accept failed"),
                    }
                }
            }
        }
    }

    fn spawn_peer(&self, peer_id: String, stream: TcpStream) {
        let (mut read_half, mut write_half) = stream.into_split();
        let mut outbound = self.registry.register(&peer_id);
        let registry = Arc::clone(&self.registry);
        let dispatcher = self.dispatcher.clone();
        let sink = self.sink.clone();
        let max_frame = self.max_frame;
        let mut shutdown_rx = self.shutdown.subscribe();
        let mut writer_shutdown = self.shutdown.subscribe();

        // Writer: drain the peer's broadcast queue onto the socket.
        let writer_peer = peer_id.clone();
        drop(tokio::spawn(async move {
            loop {
                tokio::select! {
                    _ = writer_shutdown.changed() => {
                        if *writer_shutdown.borrow() {
                            return;
                        }
                    }
                    payload = outbound.recv() => {
                        let Some(payload) = payload else { return };
                        if let Err(e) = write_frame(&mut write_half, &payload, max_frame).await {
                            warn!(peer_id = %writer_peer, error = %e, "peer write failed");
                            return;
                        }
                    }
                }
            }
        }));

        // Reader: decode/persist/dispatch until the peer hangs up.
        drop(tokio::spawn(async move {
            loop {
                tokio::select! {
                    _ = shutdown_rx.changed() => {
                        if *shutdown_rx.borrow() {
                            break;
                        }
                    }
                    frame = read_frame(&mut read_half, max_frame) => {
                        match frame {
                            Ok(body) => {
                                let _ = process_frame(&dispatcher, sink.as_ref(), &body, &peer_id);
                            }
                            Err(e) => {
                                info!(peer_id = %peer_id, error = %e, "peer disconnected");
                                break;
                            }
                        }
                    }
                }
            }
            registry.unregister(&peer_id);
        }));
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
