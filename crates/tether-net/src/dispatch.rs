//! Handler table and the per-frame processing pipeline.
//!
//! Handlers are registered once at setup through the builder-style `on_*`
//! methods, then the table is read-only for the life of the connection. A
//! missing handler is never an error: the message is still persisted, just
//! not forwarded to application code.

use std::sync::Arc;

use metrics::counter;
use serde_json::Value;
use tracing::{debug, warn};

use tether_core::message::Role;
use tether_core::sink::{ConversationSink, resolve_role};

use crate::command::AgentCommand;

/// Handler for a typed command's arguments object.
pub type CommandHandler = Arc<dyn Fn(Value) + Send + Sync>;
/// Handler for unrecognized discriminants: `(name, arguments)`.
pub type GenericHandler = Arc<dyn Fn(&str, Value) + Send + Sync>;
/// Handler receiving every well-formed document, before typed dispatch.
pub type RawHandler = Arc<dyn Fn(&Value) + Send + Sync>;

/// Read-only table of registered handlers.
#[derive(Clone, Default)]
pub struct Dispatcher {
    message: Option<RawHandler>,
    motion: Option<CommandHandler>,
    emotion: Option<CommandHandler>,
    generic: Option<GenericHandler>,
}

impl Dispatcher {
    /// Empty table.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register the raw message handler, invoked for every well-formed
    /// document in addition to any typed handler.
    #[must_use]
    pub fn on_message(mut self, handler: impl Fn(&Value) + Send + Sync + 'static) -> Self {
        self.message = Some(Arc::new(handler));
        self
    }

    /// Register the motion handler.
    #[must_use]
    pub fn on_motion(mut self, handler: impl Fn(Value) + Send + Sync + 'static) -> Self {
        self.motion = Some(Arc::new(handler));
        self
    }

    /// Register the emotion handler.
    #[must_use]
    pub fn on_emotion(mut self, handler: impl Fn(Value) + Send + Sync + 'static) -> Self {
        self.emotion = Some(Arc::new(handler));
        self
    }

    /// Register the generic handler for unrecognized discriminants.
    #[must_use]
    pub fn on_generic(mut self, handler: impl Fn(&str, Value) + Send + Sync + 'static) -> Self {
        self.generic = Some(Arc::new(handler));
        self
    }

    /// Route one decoded command. Returns whether any typed handler ran.
    pub fn dispatch(&self, doc: &Value, command: &AgentCommand) -> bool {
        if let Some(handler) = &self.message {
            handler(doc);
        }
        match command {
            AgentCommand::Motion(args) => self.invoke(&self.motion, args),
            AgentCommand::Emotion(args) => self.invoke(&self.emotion, args),
            AgentCommand::MotionAndEmotion(args) => {
                // Contract: emotion first, then motion, same arguments.
                let emotion_ran = self.invoke(&self.emotion, args);
                let motion_ran = self.invoke(&self.motion, args);
                emotion_ran || motion_ran
            }
            AgentCommand::Generic { name, arguments } => match &self.generic {
                Some(handler) => {
                    handler(name, arguments.clone());
                    true
                }
                None => false,
            },
        }
    }

    fn invoke(&self, slot: &Option<CommandHandler>, args: &Value) -> bool {
        match slot {
            Some(handler) => {
                handler(args.clone());
                true
            }
            None => false,
        }
    }
}

/// Process one received frame body end to end.
///
/// Decode → attribute → persist via the sink → dispatch. Any failure here
/// drops the single frame and keeps the connection alive; only the caller's
/// I/O errors fail connections.
///
/// Returns whether the frame held a well-formed document.
pub(crate) fn process_frame(
    dispatcher: &Dispatcher,
    sink: Option<&Arc<dyn ConversationSink>>,
    body: &[u8],
    peer: &str,
) -> bool {
    let doc: Value = match serde_json::from_slice(body) {
        Ok(doc) => doc,
        Err(e) => {
            counter!("tether_frames_dropped_total").increment(1);
            warn!(peer, error = %e, "dropping frame with invalid JSON");
            return false;
        }
    };
    let Some(command) = AgentCommand::parse(&doc) else {
        counter!("tether_frames_dropped_total").increment(1);
        warn!(peer, "dropping frame without a string discriminant");
        return false;
    };

    if let Some(sink) = sink {
        sink.record(resolve_role(&doc, Role::Assistant), &doc);
    }
    let handled = dispatcher.dispatch(&doc, &command);
    debug!(peer, name = command.name(), handled, "dispatched frame");
    true
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
