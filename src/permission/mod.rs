//! Microphone permission negotiation.
//!
//! * [`PermissionState`]: `Unknown | Granted | Denied`.
//! * [`PermissionGate`]: process-wide cache with request coalescing.
//! * [`MicrophoneAccess`]: async trait over the platform prompt.
//! * [`StaticMicrophone`]: fixed-decision implementation.

pub mod gate;
pub mod microphone;

use serde::{Deserialize, Serialize};

pub use gate::PermissionGate;
pub use microphone::{MicrophoneAccess, MicrophoneError, StaticMicrophone};

/// Microphone authorisation as last observed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum PermissionState {
    /// Never asked, or a denial was cleared for retry.
    #[default]
    Unknown,
    Granted,
    Denied,
}

impl PermissionState {
    /// `true` once the platform has answered.
    pub fn is_resolved(&self) -> bool {
        !matches!(self, PermissionState::Unknown)
    }
}
