//! Continuous speech capture for text-input surfaces.
//!
//! The crate drives a streaming, platform-provided speech recognizer and
//! exposes one cancellable session at a time to a text-input consumer.
//!
//! ```text
//! SpeechCapture::start(config)
//!        │
//!        ▼
//! PermissionGate::request_access()      (shared across sessions)
//!        │ granted
//!        ▼
//! PlatformRecognizer::open()  ──events──▶ SpeechSession (state machine)
//!                                             ├─ TranscriptReconciler
//!                                             └─ SilenceWatchdog
//!                                                   │
//!                                                   ▼
//!                                  SessionNotification ─▶ SessionConsumer
//! ```

pub mod config;
pub mod error;
pub mod permission;
pub mod recognizer;
pub mod session;

pub use config::{CaptureConfig, RuntimeConfig, SessionConfig};
pub use error::{CaptureError, ErrorCode, SessionError};
pub use permission::{MicrophoneAccess, PermissionGate, PermissionState, StaticMicrophone};
pub use recognizer::{
    Capabilities, PlatformErrorCode, PlatformRecognizer, RecognizerEvent, ReplayScript,
    ScriptedRecognizer,
};
pub use session::{
    InputComposer, SessionConsumer, SessionHandle, SessionNotification, SessionState,
    SpeechCapture, TranscriptUpdate,
};
