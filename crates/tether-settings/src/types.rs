//! Settings type definitions.
//!
//! Every type carries `#[serde(default)]` so partial TOML files are valid —
//! missing fields get their production default during deserialization.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Root settings for the Tether engine.
///
/// # TOML format
///
/// ```toml
/// agent_id = "pet-01"
///
/// [api]
/// host = "agents.example.com"
/// api_key = "sk-..."
///
/// [conversation]
/// context_rounds = 6
/// memory_rounds = 18
///
/// [server]
/// port = 9999
/// http_port = 10000
/// ```
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Identity of the remote agent this engine talks to. Opaque.
    pub agent_id: String,
    /// Summarization collaborator endpoint.
    pub api: ApiSettings,
    /// Conversation history and memory cadence.
    pub conversation: ConversationSettings,
    /// Socket and query endpoint settings.
    pub server: ServerSettings,
    /// Storage root selection.
    pub storage: StorageSettings,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            agent_id: String::new(),
            api: ApiSettings::default(),
            conversation: ConversationSettings::default(),
            server: ServerSettings::default(),
            storage: StorageSettings::default(),
        }
    }
}

impl Settings {
    /// Correct nonsensical values in place.
    ///
    /// Out-of-range values are clamped with a warning rather than rejected,
    /// so users get corrected behavior instead of a startup failure.
    pub fn validate(&mut self) {
        if self.conversation.memory_rounds == 0 {
            tracing::warn!("conversation.memory_rounds is 0, correcting to 1");
            self.conversation.memory_rounds = 1;
        }
        if self.conversation.context_rounds == 0 {
            tracing::warn!("conversation.context_rounds is 0, correcting to 1");
            self.conversation.context_rounds = 1;
        }
        if self.server.reconnect_interval_ms == 0 {
            tracing::warn!("server.reconnect_interval_ms is 0, correcting to 5000");
            self.server.reconnect_interval_ms = 5000;
        }
    }
}

/// Summarization collaborator endpoint settings.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiSettings {
    /// API host, without scheme.
    pub host: String,
    /// Opaque bearer credential for the summarization endpoint.
    pub api_key: String,
}

/// Conversation history and memory cadence settings.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConversationSettings {
    /// Number of recent turns injected as context on session restore.
    pub context_rounds: u32,
    /// Messages between summarization rounds.
    pub memory_rounds: u32,
}

impl Default for ConversationSettings {
    fn default() -> Self {
        Self {
            context_rounds: 6,
            memory_rounds: 18,
        }
    }
}

/// Socket and query endpoint settings.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerSettings {
    /// TCP port the framed push channel listens on (server mode), and the
    /// port a client connects to.
    pub port: u16,
    /// Port for the read-only HTTP query endpoint.
    pub http_port: u16,
    /// Fixed reconnect retry interval, milliseconds.
    pub reconnect_interval_ms: u64,
    /// Whether a dropped client connection retries indefinitely.
    pub auto_reconnect: bool,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            port: 9999,
            http_port: 10000,
            reconnect_interval_ms: 5000,
            auto_reconnect: true,
        }
    }
}

/// Storage root selection. The root is chosen once at construction.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageSettings {
    /// Externally supplied storage root. When `None`, the default
    /// user-scoped root (`~/.config/tether`) is used.
    pub root: Option<PathBuf>,
}

/// Default user-scoped root for configuration and storage.
///
/// Falls back to a relative `.config/tether` when no home directory can be
/// determined (containers, stripped-down images).
#[must_use]
pub fn default_root() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from(".config"))
        .join("tether")
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
