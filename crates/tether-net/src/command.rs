//! Typed decode of wire documents.
//!
//! The wire shape is `{"name": string, "arguments": object}` — the field
//! names are fixed for protocol compatibility with existing peers. The
//! discriminant is decoded once into a closed sum type and matched
//! exhaustively from there; nothing downstream branches on strings.

use serde_json::{Map, Value};

/// Wire field holding the discriminant.
pub const NAME_FIELD: &str = "name";
/// Wire field holding the payload object.
pub const ARGUMENTS_FIELD: &str = "arguments";

/// One decoded agent command.
#[derive(Clone, Debug, PartialEq)]
pub enum AgentCommand {
    /// `name == "motion"`.
    Motion(Value),
    /// `name == "emotion"`.
    Emotion(Value),
    /// `name == "motion_and_emotion"` — fans out to both handlers,
    /// emotion first.
    MotionAndEmotion(Value),
    /// Any other discriminant.
    Generic {
        /// The unrecognized discriminant.
        name: String,
        /// Payload object.
        arguments: Value,
    },
}

impl AgentCommand {
    /// Decode a document. `None` when the discriminant is missing or not a
    /// string — such documents are malformed and dropped by the caller.
    ///
    /// A missing or non-object `arguments` field decodes as an empty object.
    #[must_use]
    pub fn parse(doc: &Value) -> Option<AgentCommand> {
        let name = doc.get(NAME_FIELD)?.as_str()?;
        let arguments = match doc.get(ARGUMENTS_FIELD) {
            Some(Value::Object(map)) => Value::Object(map.clone()),
            _ => Value::Object(Map::new()),
        };
        Some(match name {
            "motion" => AgentCommand::Motion(arguments),
            "emotion" => AgentCommand::Emotion(arguments),
            "motion_and_emotion" => AgentCommand::MotionAndEmotion(arguments),
            other => AgentCommand::Generic {
                name: other.to_string(),
                arguments,
            },
        })
    }

    /// The wire discriminant for this command.
    #[must_use]
    pub fn name(&self) -> &str {
        match self {
            AgentCommand::Motion(_) => "motion",
            AgentCommand::Emotion(_) => "emotion",
            AgentCommand::MotionAndEmotion(_) => "motion_and_emotion",
            AgentCommand::Generic { name, .. } => name,
        }
    }
}

/// Build an outbound wire document.
#[must_use]
pub fn envelope(name: &str, arguments: Value) -> Value {
    serde_json::json!({ NAME_FIELD: name, ARGUMENTS_FIELD: arguments })
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
