//! Connected-peer registry and broadcast fan-out.
//!
//! Each accepted peer gets a bounded outbound queue; a writer task drains it
//! onto the socket. Broadcasts serialize the document once and hand every
//! queue the same `Arc`'d bytes. A peer that cannot keep up accumulates
//! drops; past [`MAX_TOTAL_DROPS`] it is evicted rather than allowed to
//! stall or balloon the queue.

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use metrics::counter;
use parking_lot::RwLock;
use serde_json::Value;
use tokio::sync::mpsc;
use tracing::{debug, warn};

use crate::errors::Result;

/// Outbound queue depth per peer.
const PEER_QUEUE_DEPTH: usize = 64;

/// Dropped-frame budget before a peer is evicted.
const MAX_TOTAL_DROPS: usize = 100;

struct PeerEntry {
    tx: mpsc::Sender<Arc<Vec<u8>>>,
    drops: AtomicUsize,
}

/// Registry of live push-channel peers.
#[derive(Default)]
pub struct PeerRegistry {
    peers: RwLock<HashMap<String, PeerEntry>>,
    count: AtomicUsize,
}

impl PeerRegistry {
    /// Empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of live peers.
    #[must_use]
    pub fn peer_count(&self) -> usize {
        self.count.load(Ordering::Relaxed)
    }

    /// Register a peer and return the receiving end of its outbound queue.
    ///
    /// The caller owns the writer task that drains the receiver; dropping it
    /// (socket closed) plus [`unregister`](Self::unregister) fully retires
    /// the peer.
    pub fn register(&self, peer_id: &str) -> mpsc::Receiver<Arc<Vec<u8>>> {
        let (tx, rx) = mpsc::channel(PEER_QUEUE_DEPTH);
        let previous = self.peers.write().insert(
            peer_id.to_string(),
            PeerEntry {
                tx,
                drops: AtomicUsize::new(0),
            },
        );
        if previous.is_none() {
            let _ = self.count.fetch_add(1, Ordering::Relaxed);
        }
        debug!(peer_id, peers = self.peer_count(), "peer registered");
        rx
    }

    /// Remove a peer. Idempotent.
    pub fn unregister(&self, peer_id: &str) {
        if self.peers.write().remove(peer_id).is_some() {
            let _ = self.count.fetch_sub(1, Ordering::Relaxed);
            debug!(peer_id, peers = self.peer_count(), "peer unregistered");
        }
    }

    /// Queue one document to every live peer.
    ///
    /// Serializes once. Full queues drop the frame for that peer only;
    /// peers over their drop budget are evicted. Returns the number of
    /// peers the frame was queued to.
    pub fn broadcast(&self, doc: &Value) -> Result<usize> {
        let payload = Arc::new(serde_json::to_vec(doc)?);
        let mut delivered = 0;
        let mut evict = Vec::new();

        {
            let peers = self.peers.read();
            for (peer_id, entry) in peers.iter() {
                match entry.tx.try_send(Arc::clone(&payload)) {
                    Ok(()) => delivered += 1,
                    Err(mpsc::error::TrySendError::Full(_)) => {
                        let drops = entry.drops.fetch_add(1, Ordering::Relaxed) + 1;
                        counter!("tether_broadcast_drops_total").increment(1);
                        if drops >= MAX_TOTAL_DROPS {
                            evict.push(peer_id.clone());
                        } else {
                            warn!(peer_id, drops, "peer queue full, frame dropped");
                        }
                    }
                    Err(mpsc::error::TrySendError::Closed(_)) => {
                        evict.push(peer_id.clone());
                    }
                }
            }
        }
        for peer_id in evict {
            warn!(peer_id = %peer_id, "evicting unresponsive peer");
            self.unregister(&peer_id);
        }
        Ok(delivered)
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
