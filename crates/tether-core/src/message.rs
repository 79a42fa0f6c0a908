//! Conversation message types.
//!
//! A [`Message`] is one persisted turn of the conversation with the remote
//! agent. Messages are created on every successful decode of an inbound or
//! outbound payload when persistence is enabled, and upserted by `id`.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

/// Who produced a message.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// The local application (outbound payloads).
    User,
    /// The remote agent (inbound payloads).
    Assistant,
}

impl Role {
    /// Stable lowercase name used on the wire and in storage.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Assistant => "assistant",
        }
    }

    /// Parse a stored role string. Unknown strings are `None`.
    #[must_use]
    pub fn parse(s: &str) -> Option<Role> {
        match s {
            "user" => Some(Role::User),
            "assistant" => Some(Role::Assistant),
            _ => None,
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One persisted conversation turn.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Message {
    /// Unique id. Inserting with an existing id replaces the prior record.
    pub id: String,
    /// Message attribution.
    pub role: Role,
    /// Caller-defined payload. Shape is not validated by the engine.
    pub content: Value,
    /// Creation time.
    pub timestamp: DateTime<Utc>,
}

impl Message {
    /// Create a message with a fresh id and the current time.
    #[must_use]
    pub fn new(role: Role, content: Value) -> Self {
        Self {
            id: generate_message_id(),
            role,
            content,
            timestamp: Utc::now(),
        }
    }

    /// Best-effort plain-text view of the payload.
    ///
    /// String payloads are returned as-is; anything else is rendered as
    /// compact JSON. Used when building summarization history and the
    /// read-only query responses.
    #[must_use]
    pub fn content_text(&self) -> String {
        match &self.content {
            Value::String(s) => s.clone(),
            other => other.to_string(),
        }
    }
}

/// Generate a unique, time-ordered message id.
#[must_use]
pub fn generate_message_id() -> String {
    format!("msg_{}", Uuid::now_v7())
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn new_message_has_id_and_timestamp() {
        let msg = Message::new(Role::User, json!({"text": "hi"}));
        assert!(msg.id.starts_with("msg_"));
        assert_eq!(msg.role, Role::User);
    }

    #[test]
    fn ids_are_unique() {
        let a = generate_message_id();
        let b = generate_message_id();
        assert_ne!(a, b);
    }

    #[test]
    fn role_round_trip() {
        for role in [Role::User, Role::Assistant] {
            assert_eq!(Role::parse(role.as_str()), Some(role));
        }
        assert_eq!(Role::parse("system"), None);
    }

    #[test]
    fn role_serde_is_lowercase() {
        assert_eq!(serde_json::to_value(Role::Assistant).unwrap(), "assistant");
        let back: Role = serde_json::from_value(json!("user")).unwrap();
        assert_eq!(back, Role::User);
    }

    #[test]
    fn message_serde_round_trip() {
        let msg = Message::new(Role::Assistant, json!({"name": "motion"}));
        let s = serde_json::to_string(&msg).unwrap();
        let back: Message = serde_json::from_str(&s).unwrap();
        assert_eq!(msg, back);
    }

    #[test]
    fn content_text_string_passthrough() {
        let msg = Message::new(Role::User, json!("hello"));
        assert_eq!(msg.content_text(), "hello");
    }

    #[test]
    fn content_text_object_is_json() {
        let msg = Message::new(Role::User, json!({"a": 1}));
        assert_eq!(msg.content_text(), r#"{"a":1}"#);
    }
}
