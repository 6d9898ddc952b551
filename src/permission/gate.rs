//! Process-wide microphone permission tracking.
//!
//! [`PermissionGate`] is the only state that survives across speech sessions.
//! It is constructed once and passed explicitly (as an `Arc`) to the
//! [`SpeechCapture`](crate::session::SpeechCapture) that owns the sessions.
//!
//! # Semantics
//!
//! ```text
//! Unknown ──request_access()──▶ prompt ──ok──▶  Granted   (cached)
//!                                      └─err─▶  Denied    (cached)
//! Denied  ──retry()───────────▶ Unknown ──▶ prompt …
//! Granted ──mark_denied()─────▶ Denied    (platform refused mid-session)
//! ```
//!
//! Concurrent `request_access()` calls coalesce onto the single in-flight
//! prompt: the prompt runs under an async lock, and callers that were queued
//! behind it read the cached decision instead of prompting again.

use std::sync::{Arc, Mutex, PoisonError};

use super::{MicrophoneAccess, PermissionState};

pub struct PermissionGate {
    microphone: Arc<dyn MicrophoneAccess>,
    state: Mutex<PermissionState>,
    /// Held for the duration of a platform prompt.
    in_flight: tokio::sync::Mutex<()>,
}

impl PermissionGate {
    pub fn new(microphone: Arc<dyn MicrophoneAccess>) -> Self {
        Self {
            microphone,
            state: Mutex::new(PermissionState::Unknown),
            in_flight: tokio::sync::Mutex::new(()),
        }
    }

    /// Current cached decision.  Never prompts.
    pub fn state(&self) -> PermissionState {
        *self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn microphone_available(&self) -> bool {
        self.microphone.is_available()
    }

    /// Resolve the permission, prompting the platform only when the decision
    /// is still `Unknown`.
    ///
    /// Always returns `Granted` or `Denied`.
    pub async fn request_access(&self) -> PermissionState {
        let cached = self.state();
        if cached.is_resolved() {
            return cached;
        }

        let _prompt = self.in_flight.lock().await;

        // Queued behind another caller's prompt.
        let cached = self.state();
        if cached.is_resolved() {
            log::debug!("permission: joined in-flight request ({cached:?})");
            return cached;
        }

        log::info!("permission: prompting for microphone access");
        let decision = match self.microphone.prompt().await {
            Ok(()) => PermissionState::Granted,
            Err(e) => {
                log::warn!("permission: microphone access refused: {e}");
                PermissionState::Denied
            }
        };

        self.set(decision);
        decision
    }

    /// Explicit re-request after a denial.
    ///
    /// Clears a cached `Denied` and prompts again.  A cached `Granted` is
    /// returned unchanged.
    pub async fn retry(&self) -> PermissionState {
        {
            let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
            if *state == PermissionState::Denied {
                log::debug!("permission: clearing cached denial for retry");
                *state = PermissionState::Unknown;
            }
        }
        self.request_access().await
    }

    /// Record a refusal the platform reported after the gate had granted
    /// access.  Cached until [`retry`](Self::retry), like a prompted denial.
    pub fn mark_denied(&self) {
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        if *state != PermissionState::Denied {
            log::warn!("permission: platform refused microphone access, was {:?}", *state);
            *state = PermissionState::Denied;
        }
    }

    fn set(&self, decision: PermissionState) {
        *self.state.lock().unwrap_or_else(PoisonError::into_inner) = decision;
    }
}

impl std::fmt::Debug for PermissionGate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PermissionGate")
            .field("state", &self.state())
            .finish_non_exhaustive()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
