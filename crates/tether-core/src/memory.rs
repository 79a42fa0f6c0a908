//! Long-term memory types.
//!
//! A [`Memory`] is a condensed textual summary of recent conversation history,
//! produced by the summarizer and stored append-only. Ids are assigned by the
//! store and increase monotonically; the latest memory is the one with the
//! highest id.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Memory lifetime class.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MemoryKind {
    /// Short-lived working context.
    Short,
    /// Durable long-term memory. Everything the summarizer produces.
    Long,
}

impl MemoryKind {
    /// Stable lowercase name used in storage.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            MemoryKind::Short => "short",
            MemoryKind::Long => "long",
        }
    }

    /// Parse a stored kind string. Unknown strings are `None`.
    #[must_use]
    pub fn parse(s: &str) -> Option<MemoryKind> {
        match s {
            "short" => Some(MemoryKind::Short),
            "long" => Some(MemoryKind::Long),
            _ => None,
        }
    }
}

/// One stored memory record.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Memory {
    /// Store-assigned id, monotonically increasing.
    pub id: i64,
    /// Lifetime class.
    pub kind: MemoryKind,
    /// Summary text.
    pub content: String,
    /// Creation time.
    pub timestamp: DateTime<Utc>,
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kind_round_trip() {
        for kind in [MemoryKind::Short, MemoryKind::Long] {
            assert_eq!(MemoryKind::parse(kind.as_str()), Some(kind));
        }
        assert_eq!(MemoryKind::parse("medium"), None);
    }

    #[test]
    fn memory_serde_round_trip() {
        let mem = Memory {
            id: 7,
            kind: MemoryKind::Long,
            content: "talked about the weather".into(),
            timestamp: Utc::now(),
        };
        let s = serde_json::to_string(&mem).unwrap();
        let back: Memory = serde_json::from_str(&s).unwrap();
        assert_eq!(mem, back);
    }

    #[test]
    fn kind_serde_is_lowercase() {
        assert_eq!(serde_json::to_value(MemoryKind::Long).unwrap(), "long");
    }
}
