//! # tether-core
//!
//! Foundation types for the Tether messaging and persistence engine.
//!
//! This crate provides the shared vocabulary the other tether crates depend on:
//!
//! - **Messages**: [`message::Message`] with [`message::Role`] attribution
//! - **Memories**: [`memory::Memory`] summaries with [`memory::MemoryKind`]
//! - **Sink seam**: [`sink::ConversationSink`], the boundary between the
//!   transport layer and whatever persists/condenses the conversation
//! - **Logging**: [`logging::init`] tracing setup for binaries
//!
//! ## Crate Position
//!
//! Foundation crate. Depended on by all other tether crates.

#![deny(unsafe_code)]

pub mod logging;
pub mod memory;
pub mod message;
pub mod sink;
