//! Message repository — upsert-by-id conversation log.

use chrono::{DateTime, Utc};
use rusqlite::{Connection, OptionalExtension, params};
use serde_json::Value;

use tether_core::message::{Message, Role};

use crate::errors::{Result, StoreError};

/// Message repository — stateless, every method takes `&Connection`.
pub struct MessageRepo;

impl MessageRepo {
    /// Insert or replace by id. Duplicate ids replace the prior record.
    pub fn save(conn: &Connection, msg: &Message) -> Result<()> {
        let _ = conn.execute(
            "INSERT OR REPLACE INTO messages (id, role, content, timestamp) VALUES (?1, ?2, ?3, ?4)",
            params![
                msg.id,
                msg.role.as_str(),
                msg.content.to_string(),
                msg.timestamp.to_rfc3339(),
            ],
        )?;
        Ok(())
    }

    /// Fetch one message by id.
    pub fn get(conn: &Connection, id: &str) -> Result<Option<Message>> {
        conn.query_row(
            "SELECT id, role, content, timestamp FROM messages WHERE id = ?1",
            params![id],
            Self::map_row,
        )
        .optional()?
        .transpose()
    }

    /// Update an existing message. Returns `false` when the id is unknown.
    pub fn update(conn: &Connection, id: &str, msg: &Message) -> Result<bool> {
        let changed = conn.execute(
            "UPDATE messages SET role = ?1, content = ?2, timestamp = ?3 WHERE id = ?4",
            params![
                msg.role.as_str(),
                msg.content.to_string(),
                msg.timestamp.to_rfc3339(),
                id,
            ],
        )?;
        Ok(changed > 0)
    }

    /// Delete by id. Returns `false` when the id is unknown.
    pub fn delete(conn: &Connection, id: &str) -> Result<bool> {
        let changed = conn.execute("DELETE FROM messages WHERE id = ?1", params![id])?;
        Ok(changed > 0)
    }

    /// Page through messages ordered by timestamp.
    ///
    /// Plain restartable pagination — not a live cursor. `limit` is taken as
    /// given here; the facade clamps it.
    pub fn list(
        conn: &Connection,
        offset: i64,
        limit: i64,
        ascending: bool,
    ) -> Result<Vec<Message>> {
        let order = if ascending { "ASC" } else { "DESC" };
        // id as tiebreaker: equal timestamps must page deterministically.
        let sql = format!(
            "SELECT id, role, content, timestamp FROM messages ORDER BY timestamp {order}, id {order} LIMIT ?1 OFFSET ?2"
        );
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt.query_map(params![limit, offset], Self::map_row)?;

        let mut messages = Vec::new();
        for row in rows {
            messages.push(row??);
        }
        Ok(messages)
    }

    /// Count stored messages.
    pub fn count(conn: &Connection) -> Result<i64> {
        let count: i64 = conn.query_row("SELECT COUNT(*) FROM messages", [], |row| row.get(0))?;
        Ok(count)
    }

    fn map_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Result<Message>> {
        let id: String = row.get(0)?;
        let role: String = row.get(1)?;
        let content: String = row.get(2)?;
        let timestamp: String = row.get(3)?;
        Ok(decode_row(id, &role, &content, &timestamp))
    }
}

/// Decode raw column values into a [`Message`].
fn decode_row(id: String, role: &str, content: &str, timestamp: &str) -> Result<Message> {
    let role = Role::parse(role)
        .ok_or_else(|| StoreError::Corrupt(format!("unknown role {role:?} on message {id}")))?;
    // Payloads are stored as JSON text; rows written by other tools may hold
    // bare strings, which are preserved as string payloads.
    let content = serde_json::from_str::<Value>(content)
        .unwrap_or_else(|_| Value::String(content.to_string()));
    let timestamp = DateTime::parse_from_rfc3339(timestamp)
        .map_err(|e| StoreError::Corrupt(format!("bad timestamp on message {id}: {e}")))?
        .with_timezone(&Utc);
    Ok(Message {
        id,
        role,
        content,
        timestamp,
    })
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
#[allow(unused_results)]
mod tests {
    use super::*;
    use crate::schema::run_migrations;
    use serde_json::json;

    fn setup() -> Connection {
        let conn = Connection::open_in_memory().unwrap();
        run_migrations(&conn).unwrap();
        conn
    }

    fn msg(id: &str, role: Role, content: Value, ts: &str) -> Message {
        Message {
            id: id.into(),
            role,
            content,
            timestamp: DateTime::parse_from_rfc3339(ts).unwrap().with_timezone(&Utc),
        }
    }

    #[test]
    fn save_and_get() {
        let conn = setup();
        let m = msg("m1", Role::User, json!({"text": "hi"}), "2026-01-01T00:00:00Z");
        MessageRepo::save(&conn, &m).unwrap();

        let back = MessageRepo::get(&conn, "m1").unwrap().unwrap();
        assert_eq!(back, m);
    }

    #[test]
    fn save_same_id_replaces() {
        let conn = setup();
        let first = msg("m1", Role::User, json!("a"), "2026-01-01T00:00:00Z");
        let second = msg("m1", Role::Assistant, json!("b"), "2026-01-02T00:00:00Z");
        MessageRepo::save(&conn, &first).unwrap();
        MessageRepo::save(&conn, &second).unwrap();

        assert_eq!(MessageRepo::count(&conn).unwrap(), 1);
        let back = MessageRepo::get(&conn, "m1").unwrap().unwrap();
        assert_eq!(back.content, json!("b"));
        assert_eq!(back.role, Role::Assistant);
    }

    #[test]
    fn get_unknown_is_none() {
        let conn = setup();
        assert!(MessageRepo::get(&conn, "nope").unwrap().is_none());
    }

    #[test]
    fn update_existing() {
        let conn = setup();
        let m = msg("m1", Role::User, json!("a"), "2026-01-01T00:00:00Z");
        MessageRepo::save(&conn, &m).unwrap();

        let updated = msg("m1", Role::User, json!("b"), "2026-01-01T00:00:00Z");
        assert!(MessageRepo::update(&conn, "m1", &updated).unwrap());
        assert_eq!(
            MessageRepo::get(&conn, "m1").unwrap().unwrap().content,
            json!("b")
        );
    }

    #[test]
    fn update_unknown_returns_false() {
        let conn = setup();
        let m = msg("m1", Role::User, json!("a"), "2026-01-01T00:00:00Z");
        assert!(!MessageRepo::update(&conn, "ghost", &m).unwrap());
    }

    #[test]
    fn delete_existing_and_unknown() {
        let conn = setup();
        let m = msg("m1", Role::User, json!("a"), "2026-01-01T00:00:00Z");
        MessageRepo::save(&conn, &m).unwrap();

        assert!(MessageRepo::delete(&conn, "m1").unwrap());
        assert!(!MessageRepo::delete(&conn, "m1").unwrap());
    }

    #[test]
    fn list_descending_returns_newest_first() {
        let conn = setup();
        for (id, ts) in [
            ("m1", "2026-01-01T00:00:00Z"),
            ("m2", "2026-01-02T00:00:00Z"),
            ("m3", "2026-01-03T00:00:00Z"),
        ] {
            MessageRepo::save(&conn, &msg(id, Role::User, json!(id), ts)).unwrap();
        }

        let page = MessageRepo::list(&conn, 0, 5, false).unwrap();
        let ids: Vec<&str> = page.iter().map(|m| m.id.as_str()).collect();
        assert_eq!(ids, ["m3", "m2", "m1"]);
    }

    #[test]
    fn list_pagination_concatenates() {
        let conn = setup();
        for i in 0..6 {
            let ts = format!("2026-01-0{}T00:00:00Z", i + 1);
            MessageRepo::save(&conn, &msg(&format!("m{i}"), Role::User, json!(i), &ts)).unwrap();
        }

        let first = MessageRepo::list(&conn, 0, 3, true).unwrap();
        let second = MessageRepo::list(&conn, 3, 3, true).unwrap();
        let all = MessageRepo::list(&conn, 0, 6, true).unwrap();

        let joined: Vec<&str> = first.iter().chain(&second).map(|m| m.id.as_str()).collect();
        let expected: Vec<&str> = all.iter().map(|m| m.id.as_str()).collect();
        assert_eq!(joined, expected);
    }

    #[test]
    fn equal_timestamps_page_deterministically() {
        let conn = setup();
        // All five share one timestamp; only the id can order them.
        for id in ["m4", "m1", "m5", "m3", "m2"] {
            MessageRepo::save(&conn, &msg(id, Role::User, json!(id), "2026-01-01T00:00:00Z"))
                .unwrap();
        }

        let first = MessageRepo::list(&conn, 0, 2, true).unwrap();
        let second = MessageRepo::list(&conn, 2, 3, true).unwrap();
        let joined: Vec<&str> = first.iter().chain(&second).map(|m| m.id.as_str()).collect();
        assert_eq!(joined, ["m1", "m2", "m3", "m4", "m5"]);

        let newest_first = MessageRepo::list(&conn, 0, 5, false).unwrap();
        let ids: Vec<&str> = newest_first.iter().map(|m| m.id.as_str()).collect();
        assert_eq!(ids, ["m5", "m4", "m3", "m2", "m1"]);
    }

    #[test]
    fn bare_string_content_is_preserved() {
        let conn = setup();
        conn.execute(
            "INSERT INTO messages (id, role, content, timestamp) VALUES ('m1', 'user', 'not json at all', '2026-01-01T00:00:00Z')",
            [],
        )
        .unwrap();

        let back = MessageRepo::get(&conn, "m1").unwrap().unwrap();
        assert_eq!(back.content, json!("not json at all"));
    }

    #[test]
    fn unknown_role_is_corrupt() {
        let conn = setup();
        conn.execute(
            "INSERT INTO messages (id, role, content, timestamp) VALUES ('m1', 'narrator', '\"x\"', '2026-01-01T00:00:00Z')",
            [],
        )
        .unwrap();

        assert!(matches!(
            MessageRepo::get(&conn, "m1"),
            Err(StoreError::Corrupt(_))
        ));
    }
}
