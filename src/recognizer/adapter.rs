//! Contract between the speech session and the platform recognizer.
//!
//! # Overview
//!
//! [`PlatformRecognizer`] opens streams.  Each [`RecognizerStream`] pairs an
//! event receiver with a [`StreamControl`] handle used to release it.
//!
//! # Contract
//!
//! - `close()` asks for graceful termination: the platform may still deliver a
//!   last batch of final results, then `End`.
//! - `abort()` asks for immediate termination: the platform should deliver
//!   `End` promptly, possibly preceded by an `aborted` error.
//! - Both are synchronous requests and idempotent, including after the stream
//!   has already ended on its own.
//! - `End` is the last event.  Anything a misbehaving platform sends after
//!   release is dropped by the session.

use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::mpsc;

use crate::config::SessionConfig;

use super::{PlatformErrorCode, RecognizerEvent};

// ---------------------------------------------------------------------------
// RecognizerOptions
// ---------------------------------------------------------------------------

/// The subset of [`SessionConfig`] the platform itself consumes.  Timers and
/// length limits are enforced by the session, not the platform.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecognizerOptions {
    pub continuous: bool,
    pub interim_results: bool,
    pub language: String,
}

impl From<&SessionConfig> for RecognizerOptions {
    fn from(config: &SessionConfig) -> Self {
        Self {
            continuous: config.continuous,
            interim_results: config.interim_results,
            language: config.language.clone(),
        }
    }
}

// ---------------------------------------------------------------------------
// StreamControl / RecognizerStream
// ---------------------------------------------------------------------------

/// Release handle for one open stream.
pub trait StreamControl: Send + Sync {
    fn close(&self);
    fn abort(&self);
}

/// One open platform stream.
pub struct RecognizerStream {
    control: Arc<dyn StreamControl>,
    events: mpsc::UnboundedReceiver<RecognizerEvent>,
}

impl RecognizerStream {
    pub fn new(
        control: Arc<dyn StreamControl>,
        events: mpsc::UnboundedReceiver<RecognizerEvent>,
    ) -> Self {
        Self { control, events }
    }

    pub fn control(&self) -> Arc<dyn StreamControl> {
        Arc::clone(&self.control)
    }

    /// Next platform event, or `None` once the platform dropped its sender.
    pub async fn next_event(&mut self) -> Option<RecognizerEvent> {
        self.events.recv().await
    }
}

impl std::fmt::Debug for RecognizerStream {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RecognizerStream").finish_non_exhaustive()
    }
}

// ---------------------------------------------------------------------------
// PlatformRecognizer trait
// ---------------------------------------------------------------------------

/// Object-safe, thread-safe interface over the platform's streaming speech
/// recognizer.  Held behind an `Arc<dyn PlatformRecognizer>`.
#[async_trait]
pub trait PlatformRecognizer: Send + Sync {
    /// Whether the capability exists at all.  Must be side-effect free; it is
    /// queried once when a [`SpeechCapture`](crate::session::SpeechCapture) is
    /// built.
    fn is_available(&self) -> bool;

    /// Establish a stream.  Suspends until the platform is listening.
    async fn open(&self, options: &RecognizerOptions)
        -> Result<RecognizerStream, PlatformErrorCode>;
}

// Compile-time assertion: Box<dyn PlatformRecognizer> must be constructible.
const _: fn() = || {
    fn _assert_object_safe(_: Box<dyn PlatformRecognizer>) {}
};

// ---------------------------------------------------------------------------
// UnsupportedRecognizer
// ---------------------------------------------------------------------------

/// Adapter for platforms without a speech recognizer.
///
/// Reports itself unavailable, so `SpeechCapture::start` rejects with
/// `Unsupported` before ever calling `open`.
#[derive(Debug, Default, Clone, Copy)]
pub struct UnsupportedRecognizer;

#[async_trait]
impl PlatformRecognizer for UnsupportedRecognizer {
    fn is_available(&self) -> bool {
        false
    }

    async fn open(
        &self,
        _options: &RecognizerOptions,
    ) -> Result<RecognizerStream, PlatformErrorCode> {
        Err(PlatformErrorCode::NotSupported)
    }
}
