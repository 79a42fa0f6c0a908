//! The seam between the transport layer and conversation persistence.
//!
//! The networking crates decode frames but do not know how (or whether) the
//! conversation is stored. Anything that wants the decoded documents —
//! typically the store plus the memory cadence — implements
//! [`ConversationSink`] and is handed to the client/server at construction.

use serde_json::Value;

use crate::message::Role;

/// Receiver for every well-formed decoded payload, inbound or outbound.
///
/// Implementations must not panic and must swallow their own failures:
/// a storage error is logged by the sink, never surfaced to the receive loop.
pub trait ConversationSink: Send + Sync {
    /// Record one decoded document with its resolved attribution.
    ///
    /// Callers resolve the role first (see [`resolve_role`]): the document's
    /// own `role` field when present and valid, otherwise the
    /// direction-derived default (inbound [`Role::Assistant`], outbound
    /// [`Role::User`]).
    fn record(&self, role: Role, doc: &Value);
}

/// Resolve message attribution for a decoded document.
///
/// The wire document may carry its own `"role"` field; otherwise the
/// direction-derived default applies.
#[must_use]
pub fn resolve_role(doc: &Value, default_role: Role) -> Role {
    doc.get("role")
        .and_then(Value::as_str)
        .and_then(Role::parse)
        .unwrap_or(default_role)
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
