//! # tether-net
//!
//! Framed transport and connection management for the Tether engine.
//!
//! ## Submodules
//!
//! | Module | Purpose |
//! |--------|---------|
//! | `frame` | Length-prefixed wire codec over `AsyncRead`/`AsyncWrite` |
//! | `command` | Typed decode of `{"name", "arguments"}` documents |
//! | `dispatch` | Handler table and per-frame processing pipeline |
//! | `client` | Outbound connection manager with the reconnect state machine |
//! | `registry` | Server-mode peer set with broadcast fan-out |
//! | `server` | Accept loop producing one framed peer per inbound connection |
//!
//! ## Data Flow
//!
//! Inbound bytes → `frame` → `dispatch` (raw handler, typed handlers, sink).
//! Outbound payload → `frame` → peer(s).

#![deny(unsafe_code)]

pub mod client;
pub mod command;
pub mod dispatch;
pub mod errors;
pub mod frame;
pub mod registry;
pub mod server;

pub use client::{AgentClient, ClientConfig, ConnectionState};
pub use command::AgentCommand;
pub use dispatch::Dispatcher;
pub use errors::{NetError, Result};
pub use frame::{DEFAULT_MAX_FRAME_BYTES, FramedChannel};
pub use registry::PeerRegistry;
pub use server::AgentServer;
