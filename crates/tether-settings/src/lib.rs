//! # tether-settings
//!
//! Configuration for the Tether engine, loaded from layered TOML sources
//! (in priority order):
//!
//! 1. **Compiled defaults** — [`Settings::default()`]
//! 2. **Default root file** — `<default root>/config.toml`
//! 3. **Override file** — an externally supplied root's `config.toml`,
//!    deep-merged over the lower layers (override wins per key)
//!
//! Settings are constructed once at process start and passed by value into
//! the engine's constructors — no component re-reads configuration files or
//! consults ambient global state after startup.

#![deny(unsafe_code)]

pub mod errors;
pub mod loader;
pub mod types;

pub use errors::{Result, SettingsError};
pub use loader::{deep_merge, load_layered, load_settings};
pub use types::{
    ApiSettings, ConversationSettings, ServerSettings, Settings, StorageSettings,
};
