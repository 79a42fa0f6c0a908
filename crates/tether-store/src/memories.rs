//! Memory repository — append-only summaries with store-assigned ids.

use chrono::{DateTime, Utc};
use rusqlite::{Connection, OptionalExtension, params};

use tether_core::memory::{Memory, MemoryKind};

use crate::errors::{Result, StoreError};

/// Memory repository — stateless, every method takes `&Connection`.
pub struct MemoryRepo;

impl MemoryRepo {
    /// Append a memory and return its assigned id.
    pub fn insert(
        conn: &Connection,
        kind: MemoryKind,
        content: &str,
        timestamp: DateTime<Utc>,
    ) -> Result<i64> {
        let _ = conn.execute(
            "INSERT INTO memories (kind, content, timestamp) VALUES (?1, ?2, ?3)",
            params![kind.as_str(), content, timestamp.to_rfc3339()],
        )?;
        Ok(conn.last_insert_rowid())
    }

    /// Fetch one memory by id.
    pub fn get(conn: &Connection, id: i64) -> Result<Option<Memory>> {
        conn.query_row(
            "SELECT id, kind, content, timestamp FROM memories WHERE id = ?1",
            params![id],
            Self::map_row,
        )
        .optional()?
        .transpose()
    }

    /// Fetch the memory with the highest id, if any.
    pub fn latest(conn: &Connection) -> Result<Option<Memory>> {
        conn.query_row(
            "SELECT id, kind, content, timestamp FROM memories ORDER BY id DESC LIMIT 1",
            [],
            Self::map_row,
        )
        .optional()?
        .transpose()
    }

    /// Update an existing memory. Returns `false` when the id is unknown.
    pub fn update(conn: &Connection, id: i64, mem: &Memory) -> Result<bool> {
        let changed = conn.execute(
            "UPDATE memories SET kind = ?1, content = ?2, timestamp = ?3 WHERE id = ?4",
            params![
                mem.kind.as_str(),
                mem.content,
                mem.timestamp.to_rfc3339(),
                id,
            ],
        )?;
        Ok(changed > 0)
    }

    /// Delete by id. Returns `false` when the id is unknown.
    pub fn delete(conn: &Connection, id: i64) -> Result<bool> {
        let changed = conn.execute("DELETE FROM memories WHERE id = ?1", params![id])?;
        Ok(changed > 0)
    }

    fn map_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Result<Memory>> {
        let id: i64 = row.get(0)?;
        let kind: String = row.get(1)?;
        let content: String = row.get(2)?;
        let timestamp: String = row.get(3)?;
        Ok(decode_row(id, &kind, content, &timestamp))
    }
}

fn decode_row(id: i64, kind: &str, content: String, timestamp: &str) -> Result<Memory> {
    let kind = MemoryKind::parse(kind)
        .ok_or_else(|| StoreError::Corrupt(format!("unknown kind {kind:?} on memory {id}")))?;
    let timestamp = DateTime::parse_from_rfc3339(timestamp)
        .map_err(|e| StoreError::Corrupt(format!("bad timestamp on memory {id}: {e}")))?
        .with_timezone(&Utc);
    Ok(Memory {
        id,
        kind,
        content,
        timestamp,
    })
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
