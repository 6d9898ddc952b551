//! Speech session lifecycle.
//!
//! # Layers
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │ SpeechCapture / SessionHandle     (capture.rs)              │
//! │   driver task: permission → slot → open → pump              │
//! │   ┌───────────────────────────────────────────────────────┐ │
//! │   │ SpeechSession                 (machine.rs)            │ │
//! │   │   handle(input, now) → Step { notification, command } │ │
//! │   │   ├─ TranscriptReconciler     (reconciler.rs)         │ │
//! │   │   └─ SilenceWatchdog          (watchdog.rs)           │ │
//! │   └───────────────────────────────────────────────────────┘ │
//! └─────────────────────────────────────────────────────────────┘
//!          │ SessionNotification (notify.rs)
//!          ▼
//!   SessionConsumer, e.g. InputComposer (composer.rs)
//! ```

pub mod capture;
pub mod composer;
pub mod machine;
pub mod notify;
pub mod reconciler;
pub mod state;
pub mod watchdog;

pub use capture::{SessionHandle, SessionSnapshot, SpeechCapture};
pub use composer::InputComposer;
pub use machine::{SessionInput, SpeechSession, Step, StreamCommand, StreamPhase};
pub use notify::{NotificationStream, SessionConsumer, SessionNotification, TranscriptUpdate};
pub use reconciler::{Fragment, Reconciled, TranscriptReconciler, TranscriptState};
pub use state::{SessionState, StopReason};
pub use watchdog::{SilenceWatchdog, WatchdogTrigger};
