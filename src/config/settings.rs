//! Session settings, runtime settings and TOML persistence.
//!
//! All structs implement `Serialize`, `Deserialize`, `Default` and `Clone`
//! so they can be round-tripped through TOML files and snapshotted into a
//! session at `start()`.

use std::time::Duration;

use anyhow::Result;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::CapturePaths;

// ---------------------------------------------------------------------------
// ConfigError
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("language tag is empty")]
    EmptyLanguage,

    #[error("malformed language tag: {0:?}")]
    InvalidLanguage(String),
}

// ---------------------------------------------------------------------------
// SessionConfig
// ---------------------------------------------------------------------------

/// Options recognised by `start(config)`.
///
/// A value of `0` in any of the numeric fields disables that timer or limit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// When `false` the platform stops by itself after the first final result.
    pub continuous: bool,
    /// When `false` the platform only delivers final fragments.
    pub interim_results: bool,
    /// BCP-47 tag passed to the platform (e.g. `"en-US"`).
    pub language: String,
    /// Absolute maximum session duration in milliseconds.
    pub timeout_ms: u64,
    /// Inactivity window in milliseconds before a forced stop.
    pub silence_timeout_ms: u64,
    /// Cap on total final-transcript characters.
    pub max_length: usize,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            continuous: true,
            interim_results: true,
            language: "en-US".into(),
            timeout_ms: 30_000,
            silence_timeout_ms: 3_000,
            max_length: 500,
        }
    }
}

impl SessionConfig {
    pub fn timeout(&self) -> Option<Duration> {
        non_zero_millis(self.timeout_ms)
    }

    pub fn silence_timeout(&self) -> Option<Duration> {
        non_zero_millis(self.silence_timeout_ms)
    }

    pub fn max_length(&self) -> Option<usize> {
        (self.max_length > 0).then_some(self.max_length)
    }

    /// Check the shape of the language tag.
    ///
    /// Subtags are separated by `-`, each 1–8 ASCII alphanumerics, and the
    /// primary subtag must be alphabetic.  Registry membership is not checked;
    /// the platform reports `language-not-supported` for tags it rejects.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let tag = self.language.trim();
        if tag.is_empty() {
            return Err(ConfigError::EmptyLanguage);
        }

        let mut subtags = tag.split('-');
        let primary = subtags.next().unwrap_or_default();
        let primary_ok = (2..=8).contains(&primary.len())
            && primary.chars().all(|c| c.is_ascii_alphabetic());
        let rest_ok = subtags
            .all(|s| (1..=8).contains(&s.len()) && s.chars().all(|c| c.is_ascii_alphanumeric()));

        if primary_ok && rest_ok {
            Ok(())
        } else {
            Err(ConfigError::InvalidLanguage(self.language.clone()))
        }
    }
}

fn non_zero_millis(ms: u64) -> Option<Duration> {
    (ms > 0).then(|| Duration::from_millis(ms))
}

// ---------------------------------------------------------------------------
// RuntimeConfig
// ---------------------------------------------------------------------------

/// Settings that outlive a single session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RuntimeConfig {
    /// How long to wait for the platform's `end` event after requesting
    /// release before treating the stream as released anyway.  `0` waits
    /// for the platform indefinitely.
    pub release_timeout_ms: u64,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            release_timeout_ms: 2_000,
        }
    }
}

impl RuntimeConfig {
    pub fn release_timeout(&self) -> Option<Duration> {
        non_zero_millis(self.release_timeout_ms)
    }
}

// ---------------------------------------------------------------------------
// CaptureConfig  (top-level)
// ---------------------------------------------------------------------------

/// Top-level configuration, serialised as `settings.toml`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CaptureConfig {
    /// Defaults for every `start()`.
    pub session: SessionConfig,
    pub runtime: RuntimeConfig,
}

impl CaptureConfig {
    /// Load configuration from the platform-appropriate `settings.toml`.
    ///
    /// Returns `Ok(CaptureConfig::default())` when the file does not exist.
    pub fn load() -> Result<Self> {
        Self::load_from(&CapturePaths::new().settings_file)
    }

    /// Load from an explicit path (useful for tests).
    pub fn load_from(path: &std::path::Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(path)?;
        let config: Self = toml::from_str(&content)?;
        Ok(config)
    }

    /// Save configuration to the platform-appropriate `settings.toml`,
    /// creating parent directories as needed.
    pub fn save(&self) -> Result<()> {
        self.save_to(&CapturePaths::new().settings_file)
    }

    pub fn save_to(&self, path: &std::path::Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    pub fn is_first_run() -> bool {
        !CapturePaths::new().settings_file.exists()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
