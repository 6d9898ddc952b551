//! Capability detection for the text-input surface.

use serde::Serialize;

use crate::permission::PermissionGate;

use super::PlatformRecognizer;

/// What the platform can do, computed once per
/// [`SpeechCapture`](crate::session::SpeechCapture) and cached.
///
/// A text input renders its manual-entry fallback when either flag is false.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Capabilities {
    pub recognizer_available: bool,
    pub microphone_available: bool,
}

impl Capabilities {
    /// Query both capabilities.  Side-effect free: never prompts and never
    /// opens a stream.
    pub fn detect(recognizer: &dyn PlatformRecognizer, permissions: &PermissionGate) -> Self {
        Self {
            recognizer_available: recognizer.is_available(),
            microphone_available: permissions.microphone_available(),
        }
    }

    /// `true` when voice input can be offered at all.
    pub fn voice_input_available(&self) -> bool {
        self.recognizer_available && self.microphone_available
    }
}
