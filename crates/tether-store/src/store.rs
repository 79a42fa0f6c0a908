//! High-level `ConversationStore` facade.
//!
//! Owns the connection pool and composes the repositories. This is the type
//! the rest of the engine holds (behind an `Arc`); the repos stay internal
//! to checkout-then-call plumbing.

use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use tracing::info;

use tether_core::memory::{Memory, MemoryKind};
use tether_core::message::Message;

use crate::errors::{Result, StoreError};
use crate::memories::MemoryRepo;
use crate::messages::MessageRepo;
use crate::pool::{ConnectionPool, open_memory_pool, open_pool};

/// Database file name under the storage root.
const DB_FILE: &str = "tether.db";

/// Maximum page size for message queries. Larger limits are clamped, not
/// rejected, to bound response size against careless callers.
pub const MAX_PAGE_SIZE: i64 = 100;

/// Durable conversation store: message log plus memory log.
pub struct ConversationStore {
    pool: ConnectionPool,
    root: PathBuf,
}

impl ConversationStore {
    /// Open the store under `root`, creating the directory and database as
    /// needed. The root is fixed for the lifetime of the store.
    pub fn open(root: &Path) -> Result<Self> {
        std::fs::create_dir_all(root).map_err(|source| StoreError::Root {
            path: root.to_path_buf(),
            source,
        })?;
        let db_path = root.join(DB_FILE);
        let pool = open_pool(&db_path)?;
        info!(path = %db_path.display(), "conversation store opened");
        Ok(Self {
            pool,
            root: root.to_path_buf(),
        })
    }

    /// In-memory store for tests.
    pub fn open_in_memory() -> Result<Self> {
        Ok(Self {
            pool: open_memory_pool()?,
            root: PathBuf::new(),
        })
    }

    /// Storage root this store was opened under.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    // ── Messages ─────────────────────────────────────────────────────────

    /// Insert or replace a message by id.
    pub fn save_message(&self, msg: &Message) -> Result<()> {
        MessageRepo::save(&*self.pool.get()?, msg)
    }

    /// Fetch one message by id.
    pub fn get_message(&self, id: &str) -> Result<Option<Message>> {
        MessageRepo::get(&*self.pool.get()?, id)
    }

    /// Update an existing message. Returns `false` when the id is unknown.
    pub fn update_message(&self, id: &str, msg: &Message) -> Result<bool> {
        MessageRepo::update(&*self.pool.get()?, id, msg)
    }

    /// Delete a message. Returns `false` when the id is unknown.
    pub fn delete_message(&self, id: &str) -> Result<bool> {
        MessageRepo::delete(&*self.pool.get()?, id)
    }

    /// Page through messages ordered by timestamp.
    ///
    /// Negative offsets are treated as zero; `limit` is clamped to
    /// `1..=MAX_PAGE_SIZE`.
    pub fn get_messages(&self, offset: i64, limit: i64, ascending: bool) -> Result<Vec<Message>> {
        let offset = offset.max(0);
        let limit = limit.clamp(1, MAX_PAGE_SIZE);
        MessageRepo::list(&*self.pool.get()?, offset, limit, ascending)
    }

    /// Count stored messages.
    pub fn message_count(&self) -> Result<i64> {
        MessageRepo::count(&*self.pool.get()?)
    }

    /// The newest `n` messages in ascending (oldest-first) order.
    ///
    /// This is the summarizer's view of "recent history": take the newest
    /// `n` records, then present them in conversation order.
    pub fn recent_messages(&self, n: i64) -> Result<Vec<Message>> {
        let mut newest_first = self.get_messages(0, n, false)?;
        newest_first.reverse();
        Ok(newest_first)
    }

    // ── Memories ─────────────────────────────────────────────────────────

    /// Append a memory; returns the assigned id.
    pub fn save_memory(
        &self,
        kind: MemoryKind,
        content: &str,
        timestamp: DateTime<Utc>,
    ) -> Result<i64> {
        MemoryRepo::insert(&*self.pool.get()?, kind, content, timestamp)
    }

    /// Fetch one memory by id.
    pub fn get_memory(&self, id: i64) -> Result<Option<Memory>> {
        MemoryRepo::get(&*self.pool.get()?, id)
    }

    /// Fetch the memory with the highest id.
    pub fn latest_memory(&self) -> Result<Option<Memory>> {
        MemoryRepo::latest(&*self.pool.get()?)
    }

    /// Update an existing memory. Returns `false` when the id is unknown.
    pub fn update_memory(&self, id: i64, mem: &Memory) -> Result<bool> {
        MemoryRepo::update(&*self.pool.get()?, id, mem)
    }

    /// Delete a memory. Returns `false` when the id is unknown.
    pub fn delete_memory(&self, id: i64) -> Result<bool> {
        MemoryRepo::delete(&*self.pool.get()?, id)
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
