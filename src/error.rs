//! Error taxonomy shared by the permission gate, the recognizer adapter and
//! the session state machine.
//!
//! [`ErrorCode`] is the stable classification surfaced to consumers through
//! `onError`.  [`SessionError`] pairs a code with a human-readable message.
//! [`CaptureError`] covers the synchronous rejections returned by
//! [`SpeechCapture::start`](crate::session::SpeechCapture::start) before any
//! platform call is made.

use serde::{Deserialize, Serialize};
use thiserror::Error;

// ---------------------------------------------------------------------------
// ErrorCode
// ---------------------------------------------------------------------------

/// Classification of everything that can end a session abnormally.
///
/// | Code               | Retry                         | UI treatment      |
/// |--------------------|-------------------------------|-------------------|
/// | `PermissionDenied` | explicit re-request only      | persistent banner |
/// | `Unsupported`      | never                         | persistent banner |
/// | `NoSpeechDetected` | immediately                   | transient notice  |
/// | `NetworkTransient` | immediately                   | transient notice  |
/// | `AudioCapture`     | immediately                   | transient notice  |
/// | `AlreadyActive`    | caller bug                    | none              |
/// | `Aborted`          | caller-initiated              | none              |
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ErrorCode {
    /// The user or the system refused microphone access.
    PermissionDenied,
    /// The platform has no speech-recognition capability (or not for the
    /// requested language).
    Unsupported,
    /// The recognizer heard nothing it could transcribe.
    NoSpeechDetected,
    /// The recognition service could not be reached.
    NetworkTransient,
    /// The audio input device failed mid-session.
    AudioCapture,
    /// `start()` was called while a session was still live.
    AlreadyActive,
    /// The caller hard-cancelled the session.
    Aborted,
}

impl ErrorCode {
    /// Stable identifier, identical to the serialised form.
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorCode::PermissionDenied => "PermissionDenied",
            ErrorCode::Unsupported => "Unsupported",
            ErrorCode::NoSpeechDetected => "NoSpeechDetected",
            ErrorCode::NetworkTransient => "NetworkTransient",
            ErrorCode::AudioCapture => "AudioCapture",
            ErrorCode::AlreadyActive => "AlreadyActive",
            ErrorCode::Aborted => "Aborted",
        }
    }

    /// `true` when a fresh `start()` may be issued straight away.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            ErrorCode::NoSpeechDetected | ErrorCode::NetworkTransient | ErrorCode::AudioCapture
        )
    }

    /// `true` for conditions that persist until the user changes something
    /// outside the session (permission settings, a different platform).
    pub fn is_persistent(&self) -> bool {
        matches!(self, ErrorCode::PermissionDenied | ErrorCode::Unsupported)
    }

    /// `false` for caller-initiated cancellation, which should not be shown
    /// to the user as a failure.
    pub fn is_user_facing(&self) -> bool {
        !matches!(self, ErrorCode::Aborted)
    }

    /// Message used when the platform supplies no better description.
    pub fn default_message(&self) -> &'static str {
        match self {
            ErrorCode::PermissionDenied => {
                "Microphone access denied. Please allow microphone access."
            }
            ErrorCode::Unsupported => "Speech recognition is not supported on this platform",
            ErrorCode::NoSpeechDetected => "No speech was detected",
            ErrorCode::NetworkTransient => "Speech recognition error: network",
            ErrorCode::AudioCapture => "Speech recognition error: audio-capture",
            ErrorCode::AlreadyActive => "A speech session is already active",
            ErrorCode::Aborted => "Speech recognition was aborted",
        }
    }
}

impl std::fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// SessionError
// ---------------------------------------------------------------------------

/// Payload of the `onError` notification.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Error)]
#[error("{code}: {message}")]
pub struct SessionError {
    pub code: ErrorCode,
    pub message: String,
}

impl SessionError {
    /// Error with the code's default message.
    pub fn new(code: ErrorCode) -> Self {
        Self {
            code,
            message: code.default_message().to_string(),
        }
    }

    pub fn with_message(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }
}

impl From<ErrorCode> for SessionError {
    fn from(code: ErrorCode) -> Self {
        Self::new(code)
    }
}

// ---------------------------------------------------------------------------
// CaptureError
// ---------------------------------------------------------------------------

/// Synchronous rejections from `start()`.
///
/// When one of these is returned no session was created, no notification was
/// emitted and the platform was never touched.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CaptureError {
    #[error("a speech session is already active")]
    AlreadyActive,

    #[error("speech recognition is not supported on this platform")]
    Unsupported,

    /// `start()` on a session instance that already reached a terminal state.
    #[error("speech session has already finished")]
    SessionFinished,

    #[error("invalid session configuration: {0}")]
    InvalidConfig(String),
}

impl CaptureError {
    /// The consumer-facing classification, where one exists.
    pub fn code(&self) -> Option<ErrorCode> {
        match self {
            CaptureError::AlreadyActive => Some(ErrorCode::AlreadyActive),
            CaptureError::Unsupported => Some(ErrorCode::Unsupported),
            CaptureError::SessionFinished | CaptureError::InvalidConfig(_) => None,
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
