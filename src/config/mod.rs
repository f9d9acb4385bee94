//! Tracker configuration.
//!
//! Provides a serde-backed configuration with:
//! - JSON loading from strings or files
//! - Per-family adapter selection (`http`, `bot_info`, `proxy`)
//! - Validation of the collection endpoint and tracking id

mod settings;

pub use settings::{AdapterConfig, ConfigError, TrackerConfig};
