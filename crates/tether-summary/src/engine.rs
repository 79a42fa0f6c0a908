//! Persistence sink with the summarization cadence.
//!
//! [`MemoryEngine`] is the [`ConversationSink`] handed to the transport
//! layer: every well-formed decoded document lands here, is persisted as a
//! [`Message`], and ticks the round counter. At every `memory_rounds`-th
//! message the pending count returns to zero and a summarization round runs
//! on its own task so the receive loop is never blocked on the collaborator.
//!
//! Sink contract: failures are logged and swallowed here, never surfaced to
//! the transport.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use chrono::Utc;
use metrics::counter;
use serde_json::Value;
use tracing::{debug, info, warn};

use tether_core::memory::MemoryKind;
use tether_core::message::{Message, Role, generate_message_id};
use tether_core::sink::ConversationSink;
use tether_store::store::ConversationStore;

use crate::client::{HistoryTurn, SummarizeClient};
use crate::errors::Result;

/// Conversation persistence plus the every-N-messages memory cadence.
pub struct MemoryEngine {
    store: Arc<ConversationStore>,
    client: Option<SummarizeClient>,
    memory_rounds: u32,
    /// Lifetime message count. The pending count is this modulo
    /// `memory_rounds`, so a cadence trigger needs no separate reset write.
    round_counter: AtomicU64,
}

impl MemoryEngine {
    /// Create an engine over `store`.
    ///
    /// With no client, documents are persisted but no memories are ever
    /// generated. A zero `memory_rounds` is treated as 1 (settings
    /// validation clamps it the same way).
    #[must_use]
    pub fn new(
        store: Arc<ConversationStore>,
        client: Option<SummarizeClient>,
        memory_rounds: u32,
    ) -> Self {
        Self {
            store,
            client,
            memory_rounds: memory_rounds.max(1),
            round_counter: AtomicU64::new(0),
        }
    }

    /// Messages persisted since the last summarization round. Zero
    /// immediately after a trigger, whether the round succeeds or not.
    #[must_use]
    pub fn pending_rounds(&self) -> u32 {
        (self.round_counter.load(Ordering::Relaxed) % u64::from(self.memory_rounds)) as u32
    }

    /// Run one summarization round immediately.
    ///
    /// Fetches the newest `memory_rounds` messages oldest-first plus the
    /// latest memory for continuity, calls the collaborator, and appends a
    /// long-term memory on success.
    pub async fn summarize_round(&self) -> Result<()> {
        let Some(client) = &self.client else {
            return Ok(());
        };
        run_round(&self.store, client, self.memory_rounds).await
    }

    fn tick(&self) {
        // One atomic decides the trigger: concurrent recorders straddling
        // the threshold see distinct tick values, so exactly one of them
        // lands on the multiple and fires. A failed round does not re-fire
        // until another full cadence has passed.
        let ticks = self.round_counter.fetch_add(1, Ordering::Relaxed) + 1;
        if ticks % u64::from(self.memory_rounds) != 0 {
            return;
        }

        let Some(client) = self.client.clone() else {
            return;
        };
        let store = Arc::clone(&self.store);
        let rounds = self.memory_rounds;
        drop(tokio::spawn(async move {
            if let Err(e) = run_round(&store, &client, rounds).await {
                warn!(error = %e, "summarization round skipped");
            }
        }));
    }
}

impl ConversationSink for MemoryEngine {
    fn record(&self, role: Role, doc: &Value) {
        let id = doc
            .get("id")
            .and_then(Value::as_str)
            .map_or_else(generate_message_id, str::to_string);
        let msg = Message {
            id,
            role,
            content: doc.clone(),
            timestamp: Utc::now(),
        };
        if let Err(e) = self.store.save_message(&msg) {
            warn!(id = %msg.id, error = %e, "failed to persist message");
            return;
        }
        debug!(id = %msg.id, role = %role, "message persisted");
        self.tick();
    }
}

async fn run_round(
    store: &ConversationStore,
    client: &SummarizeClient,
    rounds: u32,
) -> Result<()> {
    let history: Vec<HistoryTurn> = store
        .recent_messages(i64::from(rounds))?
        .iter()
        .map(|m| HistoryTurn {
            role: m.role,
            content: m.content_text(),
        })
        .collect();
    if history.is_empty() {
        return Ok(());
    }
    let last_memory = store
        .latest_memory()?
        .map(|m| m.content)
        .unwrap_or_default();

    let summary = client.summarize(&history, &last_memory).await?;
    let id = store.save_memory(MemoryKind::Long, &summary, Utc::now())?;
    counter!("tether_memories_generated_total").increment(1);
    info!(memory_id = id, "long-term memory stored");
    Ok(())
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
