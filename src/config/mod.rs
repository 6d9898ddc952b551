//! Configuration module.
//!
//! Provides `SessionConfig` (the per-`start()` options), `RuntimeConfig`,
//! the top-level `CaptureConfig` with TOML persistence, and `CapturePaths`
//! for the platform config directory.

pub mod paths;
pub mod settings;

pub use paths::CapturePaths;
pub use settings::{CaptureConfig, ConfigError, RuntimeConfig, SessionConfig};
