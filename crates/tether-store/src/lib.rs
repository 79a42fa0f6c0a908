//! # tether-store
//!
//! Durable SQLite storage for the Tether engine: an append-mostly message log
//! with upsert-by-id semantics, and an append-only memory log.
//!
//! Layout follows the repository pattern: stateless repos whose methods take
//! `&Connection` ([`messages::MessageRepo`], [`memories::MemoryRepo`]),
//! composed behind a pool-owning facade ([`store::ConversationStore`]).
//!
//! The storage root (default user-scoped directory or an externally supplied
//! one) is selected once at construction; the store never re-reads
//! configuration.

#![deny(unsafe_code)]

pub mod errors;
pub mod memories;
pub mod messages;
pub mod pool;
pub mod schema;
pub mod store;

pub use errors::{Result, StoreError};
pub use store::ConversationStore;
