//! SQLite connection pool.

use std::path::Path;

use r2d2_sqlite::SqliteConnectionManager;

use crate::errors::Result;
use crate::schema::run_migrations;

/// Shared connection pool type.
pub type ConnectionPool = r2d2::Pool<SqliteConnectionManager>;

/// One checked-out connection.
pub type PooledConnection = r2d2::PooledConnection<SqliteConnectionManager>;

/// Open (or create) the database at `path` and run migrations.
///
/// Every pooled connection gets WAL journaling and foreign keys enabled.
/// SQLite serializes writes internally; concurrent writers contend but do
/// not corrupt.
pub fn open_pool(path: &Path) -> Result<ConnectionPool> {
    let manager = SqliteConnectionManager::file(path).with_init(|conn| {
        conn.execute_batch("PRAGMA journal_mode = WAL; PRAGMA foreign_keys = ON;")
    });
    let pool = r2d2::Pool::builder().max_size(8).build(manager)?;

    let conn = pool.get()?;
    run_migrations(&conn)?;
    Ok(pool)
}

/// In-memory pool for tests. Single connection so every checkout sees the
/// same database.
pub fn open_memory_pool() -> Result<ConnectionPool> {
    let manager = SqliteConnectionManager::memory();
    let pool = r2d2::Pool::builder().max_size(1).build(manager)?;
    let conn = pool.get()?;
    run_migrations(&conn)?;
    Ok(pool)
}
