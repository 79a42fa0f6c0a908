//! Schema creation.
//!
//! Both tables are created idempotently; opening an existing database from a
//! previous run is the normal case, not a special one.

use rusqlite::Connection;

use crate::errors::Result;

const CREATE_MESSAGES_TABLE: &str = "CREATE TABLE IF NOT EXISTS messages (
    id        TEXT PRIMARY KEY,
    role      TEXT NOT NULL,
    content   TEXT NOT NULL,
    timestamp TEXT NOT NULL
)";

const CREATE_MESSAGES_TIMESTAMP_INDEX: &str =
    "CREATE INDEX IF NOT EXISTS idx_messages_timestamp ON messages (timestamp)";

const CREATE_MEMORIES_TABLE: &str = "CREATE TABLE IF NOT EXISTS memories (
    id        INTEGER PRIMARY KEY AUTOINCREMENT,
    kind      TEXT NOT NULL,
    content   TEXT NOT NULL,
    timestamp TEXT NOT NULL
)";

/// Create tables and indexes if absent.
pub fn run_migrations(conn: &Connection) -> Result<()> {
    conn.execute_batch(&format!(
        "{CREATE_MESSAGES_TABLE};\n{CREATE_MESSAGES_TIMESTAMP_INDEX};\n{CREATE_MEMORIES_TABLE};"
    ))?;
    Ok(())
}
