//! Session lifecycle states.
//!
//! ```text
//! Idle ──start()──▶ RequestingPermission ──granted + stream open──▶ Listening
//!                                        └─denied──▶ Errored(PermissionDenied)
//! Listening ──interim/final──▶ Listening
//! Listening ──stop()/silence/max-duration──▶ Stopping ──end──▶ Ended
//! Listening ──end (single-shot)──▶ Ended
//! Listening | Stopping ──error──▶ Errored(code)
//! any non-terminal ──abort()──▶ Errored(Aborted)
//! ```
//!
//! `Ended` and `Errored` are terminal for a session instance.

use serde::Serialize;

use crate::error::ErrorCode;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(tag = "state", content = "code")]
pub enum SessionState {
    #[default]
    Idle,
    RequestingPermission,
    Listening,
    Stopping,
    Ended,
    Errored(ErrorCode),
}

impl SessionState {
    /// `true` while a second `start()` must be rejected.
    ///
    /// ```
    /// use speech_capture::session::SessionState;
    ///
    /// assert!(!SessionState::Idle.is_active());
    /// assert!(SessionState::RequestingPermission.is_active());
    /// assert!(SessionState::Listening.is_active());
    /// assert!(SessionState::Stopping.is_active());
    /// assert!(!SessionState::Ended.is_active());
    /// ```
    pub fn is_active(&self) -> bool {
        matches!(
            self,
            SessionState::RequestingPermission | SessionState::Listening | SessionState::Stopping
        )
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, SessionState::Ended | SessionState::Errored(_))
    }

    /// A short label suitable for a status badge.
    pub fn label(&self) -> &'static str {
        match self {
            SessionState::Idle => "Idle",
            SessionState::RequestingPermission => "Requesting permission",
            SessionState::Listening => "Listening",
            SessionState::Stopping => "Stopping",
            SessionState::Ended => "Ended",
            SessionState::Errored(_) => "Error",
        }
    }
}

/// Why a session left `Listening` for `Stopping`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum StopReason {
    /// `stop()` from the caller.
    Manual,
    SilenceTimeout,
    MaxDuration,
}
