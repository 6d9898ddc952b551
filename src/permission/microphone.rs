//! Microphone authorisation seam.
//!
//! [`MicrophoneAccess`] is the platform capability the permission gate
//! prompts.  [`StaticMicrophone`] is a fixed-decision implementation used by
//! the demo binary and by tests.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;

// ---------------------------------------------------------------------------
// MicrophoneError
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MicrophoneError {
    #[error("microphone access denied")]
    Denied,

    #[error("no microphone available")]
    Unavailable,

    #[error("microphone error: {0}")]
    Device(String),
}

// ---------------------------------------------------------------------------
// MicrophoneAccess trait
// ---------------------------------------------------------------------------

/// Platform microphone authorisation.
///
/// `prompt` may show a system dialog and suspend until the user answers.
/// It is only ever called by [`PermissionGate`](super::PermissionGate), which
/// guarantees at most one prompt is in flight.
#[async_trait]
pub trait MicrophoneAccess: Send + Sync {
    /// Whether an input device exists at all.  Must be side-effect free.
    fn is_available(&self) -> bool {
        true
    }

    async fn prompt(&self) -> Result<(), MicrophoneError>;
}

// ---------------------------------------------------------------------------
// StaticMicrophone
// ---------------------------------------------------------------------------

/// Answers every prompt with the same decision, optionally after a delay.
///
/// ```rust
/// # use speech_capture::permission::{MicrophoneAccess, StaticMicrophone};
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() {
/// let mic = StaticMicrophone::denied();
/// assert!(mic.prompt().await.is_err());
/// assert_eq!(mic.prompts(), 1);
/// # }
/// ```
#[derive(Debug)]
pub struct StaticMicrophone {
    decision: Result<(), MicrophoneError>,
    available: bool,
    delay: Duration,
    prompts: AtomicUsize,
}

impl StaticMicrophone {
    pub fn granted() -> Self {
        Self::with_decision(Ok(()), true)
    }

    pub fn denied() -> Self {
        Self::with_decision(Err(MicrophoneError::Denied), true)
    }

    /// No input device: reports unavailable and fails every prompt.
    pub fn unavailable() -> Self {
        Self::with_decision(Err(MicrophoneError::Unavailable), false)
    }

    fn with_decision(decision: Result<(), MicrophoneError>, available: bool) -> Self {
        Self {
            decision,
            available,
            delay: Duration::ZERO,
            prompts: AtomicUsize::new(0),
        }
    }

    /// Suspend each prompt for `delay` before answering.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    /// Number of times the platform prompt was shown.
    pub fn prompts(&self) -> usize {
        self.prompts.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl MicrophoneAccess for StaticMicrophone {
    fn is_available(&self) -> bool {
        self.available
    }

    async fn prompt(&self) -> Result<(), MicrophoneError> {
        self.prompts.fetch_add(1, Ordering::SeqCst);
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        self.decision.clone()
    }
}
