//! Platform speech-recognizer adapter.
//!
//! # Architecture
//!
//! ```text
//! ┌────────────────────────────────────────────────────────┐
//! │              PlatformRecognizer (trait)                │
//! │                                                        │
//! │   open(options) ──▶ RecognizerStream                   │
//! │                      ├─ control: StreamControl         │
//! │                      │    close() / abort()            │
//! │                      └─ events:                        │
//! │                           Interim │ Final │ Error │ End│
//! └────────────────────────────────────────────────────────┘
//!        ▲                         ▲
//!   ScriptedRecognizer       UnsupportedRecognizer
//!   (event replay)           (capability absent)
//! ```
//!
//! Platform error codes are classified here, at the adapter boundary, via
//! [`PlatformErrorCode::classify`].

pub mod adapter;
pub mod capability;
pub mod event;
pub mod replay;

pub use adapter::{
    PlatformRecognizer, RecognizerOptions, RecognizerStream, StreamControl,
    UnsupportedRecognizer,
};
pub use capability::Capabilities;
pub use event::{PlatformErrorCode, RecognizerEvent};
pub use replay::{ReplayScript, ReplayStats, ReplayStep, ScriptedRecognizer};
