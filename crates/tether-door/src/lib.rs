//! # tether-door
//!
//! The engine's outward face, composed of two listeners:
//!
//! | Surface | Purpose |
//! |---------|---------|
//! | TCP push channel | framed peers; inbound frames dispatched and persisted, [`FrontDoor::broadcast`] fans a payload out to all of them |
//! | HTTP query API | read-only views over the conversation store (`http::router`) |
//!
//! Both run as background tasks owned by a [`FrontDoor`]; `shutdown()` stops
//! them together.

#![deny(unsafe_code)]

pub mod errors;
pub mod http;

pub use errors::{DoorError, Result};

use std::net::SocketAddr;
use std::sync::Arc;

use serde_json::Value;
use tokio::sync::watch;
use tracing::info;

use tether_core::sink::ConversationSink;
use tether_net::{AgentServer, Dispatcher};
use tether_store::ConversationStore;

/// Listener addresses for the two surfaces.
#[derive(Clone, Debug)]
pub struct FrontDoorConfig {
    /// Push channel bind address, e.g. `0.0.0.0:9999`.
    pub push_addr: String,
    /// Query API bind address, e.g. `0.0.0.0:10000`.
    pub http_addr: String,
}

/// Running front door: push channel plus query API.
pub struct FrontDoor {
    server: Arc<AgentServer>,
    push_addr: SocketAddr,
    http_addr: SocketAddr,
    http_shutdown: watch::Sender<bool>,
}

impl FrontDoor {
    /// Bind both listeners and start serving.
    ///
    /// Inbound push-channel frames flow through `dispatcher` and `sink`
    /// exactly like the client path; the query API reads `store` directly.
    pub async fn start(
        config: &FrontDoorConfig,
        store: Arc<ConversationStore>,
        dispatcher: Dispatcher,
        sink: Option<Arc<dyn ConversationSink>>,
    ) -> Result<Self> {
        let server = Arc::new(AgentServer::bind(&config.push_addr, dispatcher, sink).await?);
        let push_addr = server.local_addr()?;
        let runner = Arc::clone(&server);
        drop(tokio::spawn(async move { runner.run().await }));

        let listener = tokio::net::TcpListener::bind(&config.http_addr).await?;
        let http_addr = listener.local_addr()?;
        let (http_shutdown, mut shutdown_rx) = watch::channel(false);
        let router = http::router(store);
        drop(tokio::spawn(async move {
            let served = axum::serve(listener, router).with_graceful_shutdown(async move {
                // Closed sender counts as shutdown too.
                let _ = shutdown_rx.changed().await;
            });
            if let Err(e) = served.await {
                tracing::error!(error = %e, "query api stopped unexpectedly");
            }
        }));
        info!(push = %push_addr, http = %http_addr, "front door open");

        Ok(Self {
            server,
            push_addr,
            http_addr,
            http_shutdown,
        })
    }

    /// Queue one document to every connected push-channel peer; returns how
    /// many peers it was queued to.
    pub fn broadcast(&self, doc: &Value) -> Result<usize> {
        Ok(self.server.broadcast(doc)?)
    }

    /// Number of live push-channel peers.
    #[must_use]
    pub fn peer_count(&self) -> usize {
        self.server.registry().peer_count()
    }

    /// Bound push channel address.
    #[must_use]
    pub fn push_addr(&self) -> SocketAddr {
        self.push_addr
    }

    /// Bound query API address.
    #[must_use]
    pub fn http_addr(&self) -> SocketAddr {
        self.http_addr
    }

    /// Stop both listeners.
    pub fn shutdown(&self) {
        self.server.shutdown();
        let _ = self.http_shutdown.send(true);
        info!("front door closed");
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
