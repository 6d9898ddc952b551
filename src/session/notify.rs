//! Consumer-facing notifications.
//!
//! Every session emits, in transition order:
//!
//! ```text
//! Start  Result*  (End | Error)
//! ```
//!
//! `Start` is absent when the session fails before it ever listened (for
//! example a cached permission denial).  Nothing follows the terminal
//! `End`/`Error`.

use serde::Serialize;
use tokio::sync::mpsc;

use crate::error::SessionError;

/// Payload of `onResult`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TranscriptUpdate {
    /// For a final result: the text appended to the transcript (already
    /// truncated).  For an interim result: the full current guess.
    pub text: String,
    pub is_final: bool,
    /// Set once, on the final result whose text was cut to fit `max_length`.
    pub truncated: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", content = "payload", rename_all = "snake_case")]
pub enum SessionNotification {
    Start,
    Result(TranscriptUpdate),
    Error(SessionError),
    End,
}

impl SessionNotification {
    /// `true` for the notification that seals a session.
    pub fn is_terminal(&self) -> bool {
        matches!(self, SessionNotification::Error(_) | SessionNotification::End)
    }
}

/// Receiving side of a session's notifications.
pub type NotificationStream = mpsc::UnboundedReceiver<SessionNotification>;

/// Callback-style consumer, driven by
/// [`SpeechCapture::start_with`](super::SpeechCapture::start_with).
///
/// Callbacks run on the dispatcher task, never under a session lock, so a
/// consumer may call back into its [`SessionHandle`](super::SessionHandle).
pub trait SessionConsumer: Send {
    fn on_start(&mut self) {}

    fn on_result(&mut self, _update: &TranscriptUpdate) {}

    fn on_error(&mut self, _error: &SessionError) {}

    fn on_end(&mut self) {}

    fn dispatch(&mut self, notification: &SessionNotification) {
        match notification {
            SessionNotification::Start => self.on_start(),
            SessionNotification::Result(update) => self.on_result(update),
            SessionNotification::Error(error) => self.on_error(error),
            SessionNotification::End => self.on_end(),
        }
    }
}
