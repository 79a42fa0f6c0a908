//! # tether-summary
//!
//! Long-term memory generation for the Tether engine.
//!
//! ## Submodules
//!
//! | Module | Purpose |
//! |--------|---------|
//! | `client` | HTTP client for the external summarization collaborator |
//! | `engine` | Persistence sink with the every-N-messages summarization cadence |
//!
//! ## Data Flow
//!
//! Decoded document → `engine` (persist message, tick counter) → at the
//! threshold: recent history + latest memory → `client` → new long-term
//! memory appended to the store.

#![deny(unsafe_code)]

pub mod client;
pub mod engine;
pub mod errors;

pub use client::{HistoryTurn, SummarizeClient};
pub use engine::MemoryEngine;
pub use errors::{Result, SummaryError};
