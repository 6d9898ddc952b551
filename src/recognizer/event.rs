//! Recognizer event stream vocabulary and platform error classification.

use serde::{Deserialize, Serialize};

use crate::error::{ErrorCode, SessionError};

// ---------------------------------------------------------------------------
// RecognizerEvent
// ---------------------------------------------------------------------------

/// One event delivered by an open recognizer stream.
///
/// The set is closed: the session state machine handles every variant in
/// every state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum RecognizerEvent {
    /// Provisional guess for the utterance in progress.  Each interim event
    /// carries the full current guess, not a delta.
    Interim { text: String },
    /// Confirmed text for a finished utterance span.
    Final { text: String },
    Error { code: PlatformErrorCode },
    /// The platform released the stream.  Always the last event.
    End,
}

impl RecognizerEvent {
    pub fn interim(text: impl Into<String>) -> Self {
        Self::Interim { text: text.into() }
    }

    pub fn final_text(text: impl Into<String>) -> Self {
        Self::Final { text: text.into() }
    }

    pub fn error(code: PlatformErrorCode) -> Self {
        Self::Error { code }
    }

    pub fn is_end(&self) -> bool {
        matches!(self, RecognizerEvent::End)
    }
}

// ---------------------------------------------------------------------------
// PlatformErrorCode
// ---------------------------------------------------------------------------

/// Raw error code as reported by the platform recognizer.
///
/// Serialised as the platform's kebab-case string (`"not-allowed"`,
/// `"no-speech"`, …).  Unrecognised strings are preserved in `Other`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum PlatformErrorCode {
    NotAllowed,
    ServiceNotAllowed,
    NoSpeech,
    Network,
    AudioCapture,
    Aborted,
    LanguageNotSupported,
    NotSupported,
    BadGrammar,
    Other(String),
}

impl PlatformErrorCode {
    pub fn as_str(&self) -> &str {
        match self {
            PlatformErrorCode::NotAllowed => "not-allowed",
            PlatformErrorCode::ServiceNotAllowed => "service-not-allowed",
            PlatformErrorCode::NoSpeech => "no-speech",
            PlatformErrorCode::Network => "network",
            PlatformErrorCode::AudioCapture => "audio-capture",
            PlatformErrorCode::Aborted => "aborted",
            PlatformErrorCode::LanguageNotSupported => "language-not-supported",
            PlatformErrorCode::NotSupported => "not-supported",
            PlatformErrorCode::BadGrammar => "bad-grammar",
            PlatformErrorCode::Other(code) => code.as_str(),
        }
    }

    /// Map the raw platform code onto the stable [`ErrorCode`] taxonomy.
    ///
    /// Codes without a dedicated class are treated as transient so the
    /// caller may retry.  A caller's own abort never reaches this table (the
    /// session is already terminal when the platform echoes `aborted`), so a
    /// platform `aborted` is a cutoff and is reported as transient.
    pub fn classify(&self) -> ErrorCode {
        match self {
            PlatformErrorCode::NotAllowed | PlatformErrorCode::ServiceNotAllowed => {
                ErrorCode::PermissionDenied
            }
            PlatformErrorCode::NoSpeech => ErrorCode::NoSpeechDetected,
            PlatformErrorCode::Network => ErrorCode::NetworkTransient,
            PlatformErrorCode::AudioCapture => ErrorCode::AudioCapture,
            PlatformErrorCode::LanguageNotSupported | PlatformErrorCode::NotSupported => {
                ErrorCode::Unsupported
            }
            PlatformErrorCode::Aborted
            | PlatformErrorCode::BadGrammar
            | PlatformErrorCode::Other(_) => ErrorCode::NetworkTransient,
        }
    }

    /// Classified error with a message naming the raw code.
    pub fn to_session_error(&self) -> SessionError {
        let code = self.classify();
        let message = match code {
            ErrorCode::PermissionDenied => code.default_message().to_string(),
            _ => format!("Speech recognition error: {}", self.as_str()),
        };
        SessionError::with_message(code, message)
    }
}

impl From<&str> for PlatformErrorCode {
    fn from(code: &str) -> Self {
        match code {
            "not-allowed" => PlatformErrorCode::NotAllowed,
            "service-not-allowed" => PlatformErrorCode::ServiceNotAllowed,
            "no-speech" => PlatformErrorCode::NoSpeech,
            "network" => PlatformErrorCode::Network,
            "audio-capture" => PlatformErrorCode::AudioCapture,
            "aborted" => PlatformErrorCode::Aborted,
            "language-not-supported" => PlatformErrorCode::LanguageNotSupported,
            "not-supported" => PlatformErrorCode::NotSupported,
            "bad-grammar" => PlatformErrorCode::BadGrammar,
            other => PlatformErrorCode::Other(other.to_string()),
        }
    }
}

impl From<String> for PlatformErrorCode {
    fn from(code: String) -> Self {
        PlatformErrorCode::from(code.as_str())
    }
}

impl From<PlatformErrorCode> for String {
    fn from(code: PlatformErrorCode) -> Self {
        code.as_str().to_string()
    }
}

impl std::fmt::Display for PlatformErrorCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
