//! Session orchestration: one driver task per session.
//!
//! [`SpeechCapture`] owns the recognizer, the shared [`PermissionGate`] and the
//! stream slot.  Every [`SpeechCapture::start`] creates a fresh
//! [`SpeechSession`] and spawns a driver task for it:
//!
//! ```text
//! start()
//!   └─▶ driver task
//!         ├─ gate.request_access()            [RequestingPermission]
//!         ├─ await stream slot                (previous stream released)
//!         ├─ recognizer.open(options)         [→ Listening]
//!         └─ pump: select! {
//!               recognizer event   → machine
//!               watchdog deadline  → Tick
//!               release timeout    → synthetic End
//!               wake (stop/abort)  → recompute deadlines
//!            }
//!         until terminal and the stream is released; slot dropped
//! ```
//!
//! The machine lives behind one `std::sync::Mutex`, shared by the driver and
//! every [`SessionHandle`].  Notifications are queued while that lock is held,
//! so consumers see them in transition order.  `stop()` and `abort()` run the
//! machine synchronously on the caller's thread and issue the resulting
//! close/abort request to the platform before they return.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use serde::Serialize;
use tokio::sync::{mpsc, watch, Notify, OwnedMutexGuard};
use tokio::task::JoinHandle;
use tokio::time::Instant;

use crate::config::{RuntimeConfig, SessionConfig};
use crate::error::{CaptureError, ErrorCode, SessionError};
use crate::permission::{PermissionGate, PermissionState};
use crate::recognizer::{
    Capabilities, PlatformRecognizer, RecognizerEvent, RecognizerOptions, RecognizerStream,
    StreamControl,
};

use super::machine::{SessionInput, SpeechSession, StreamCommand, StreamPhase};
use super::notify::{NotificationStream, SessionConsumer, SessionNotification};
use super::state::{SessionState, StopReason};

// ---------------------------------------------------------------------------
// SessionSnapshot
// ---------------------------------------------------------------------------

/// Point-in-time copy of a session's observable data.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SessionSnapshot {
    pub id: u64,
    pub state: SessionState,
    pub permission: PermissionState,
    pub final_transcript: String,
    pub interim_transcript: String,
    pub segments: Vec<String>,
    pub truncated: bool,
    pub stop_reason: Option<StopReason>,
    pub error: Option<SessionError>,
}

impl SessionSnapshot {
    fn of(session: &SpeechSession) -> Self {
        Self {
            id: session.id(),
            state: session.state(),
            permission: session.permission(),
            final_transcript: session.final_transcript().to_string(),
            interim_transcript: session.interim_transcript().to_string(),
            segments: session.transcript().segments.clone(),
            truncated: session.truncated(),
            stop_reason: session.stop_reason(),
            error: session.error().cloned(),
        }
    }
}

// ---------------------------------------------------------------------------
// Shared session core
// ---------------------------------------------------------------------------

struct SessionCore {
    session: SpeechSession,
    control: Option<Arc<dyn StreamControl>>,
    /// Dropped after the terminal notification so the stream ends.
    notifications: Option<mpsc::UnboundedSender<SessionNotification>>,
}

struct SessionShared {
    id: u64,
    core: Mutex<SessionCore>,
    permissions: Arc<PermissionGate>,
    wake: Notify,
    state: watch::Sender<SessionState>,
    released: watch::Sender<bool>,
}

impl SessionShared {
    fn lock(&self) -> MutexGuard<'_, SessionCore> {
        self.core.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn with_session<R>(&self, f: impl FnOnce(&SpeechSession) -> R) -> R {
        f(&self.lock().session)
    }

    fn attach(&self, control: Arc<dyn StreamControl>) {
        self.lock().control = Some(control);
    }

    /// Run one input through the machine and carry out its step.  `Open` is
    /// returned to the driver; close and abort are issued here.
    fn apply(&self, input: SessionInput) -> Option<StreamCommand> {
        let mut core = self.lock();
        let step = core.session.handle(input, Instant::now());
        let state = core.session.state();

        // Recorded before anyone can observe the failure and start again.
        if state == SessionState::Errored(ErrorCode::PermissionDenied) {
            self.permissions.mark_denied();
        }

        if let Some(notification) = step.notification {
            let terminal = notification.is_terminal();
            if let Some(tx) = &core.notifications {
                if tx.send(notification).is_err() {
                    log::debug!("session {}: consumer went away", self.id);
                }
            }
            if terminal {
                core.notifications = None;
            }
        }

        self.state.send_if_modified(|current| {
            let changed = *current != state;
            *current = state;
            changed
        });

        match step.command {
            Some(StreamCommand::Close) => {
                if let Some(control) = &core.control {
                    control.close();
                }
                None
            }
            Some(StreamCommand::Abort) => {
                if let Some(control) = &core.control {
                    control.abort();
                }
                None
            }
            other => other,
        }
    }

    async fn terminated(&self) {
        let mut rx = self.state.subscribe();
        let _ = rx.wait_for(|s| s.is_terminal()).await;
    }
}

// ---------------------------------------------------------------------------
// SessionHandle
// ---------------------------------------------------------------------------

/// Caller's handle on one session.  Cheap to clone.
#[derive(Clone)]
pub struct SessionHandle {
    shared: Arc<SessionShared>,
}

impl SessionHandle {
    pub fn id(&self) -> u64 {
        self.shared.id
    }

    pub fn state(&self) -> SessionState {
        *self.shared.state.borrow()
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        self.shared.with_session(SessionSnapshot::of)
    }

    /// Graceful stop.  No-op unless the session is `Listening`.
    pub fn stop(&self) {
        self.shared.apply(SessionInput::Stop);
        self.shared.wake.notify_one();
    }

    /// Hard cancel.  The session is `Errored(Aborted)` when this returns and
    /// the platform has been asked to release the stream.
    pub fn abort(&self) {
        self.shared.apply(SessionInput::Abort);
        self.shared.wake.notify_one();
    }

    /// Deterministic teardown for owners going away.  Aborts a live session;
    /// does nothing to a finished one.
    pub fn dispose(&self) {
        if !self.state().is_terminal() {
            self.abort();
        }
    }

    /// Wait for `Ended` or `Errored` and return it.
    pub async fn finished(&self) -> SessionState {
        let mut rx = self.shared.state.subscribe();
        let _ = rx.wait_for(|s| s.is_terminal()).await;
        let state = *rx.borrow();
        state
    }

    /// Wait until the platform stream is released and the driver has exited.
    pub async fn released(&self) {
        let mut rx = self.shared.released.subscribe();
        let _ = rx.wait_for(|released| *released).await;
    }
}

impl std::fmt::Debug for SessionHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionHandle")
            .field("id", &self.shared.id)
            .field("state", &self.state())
            .finish()
    }
}

// ---------------------------------------------------------------------------
// SessionDriver
// ---------------------------------------------------------------------------

struct SessionDriver {
    shared: Arc<SessionShared>,
    recognizer: Arc<dyn PlatformRecognizer>,
    permissions: Arc<PermissionGate>,
    slot: Arc<tokio::sync::Mutex<()>>,
    options: RecognizerOptions,
    release_timeout: Option<Duration>,
}

impl SessionDriver {
    async fn run(self) {
        let slot = self.drive().await;
        drop(slot);
        self.shared.released.send_replace(true);
        log::debug!("session {}: driver finished", self.shared.id);
    }

    /// Returns the stream slot guard, if one was taken, once the session is
    /// settled.
    async fn drive(&self) -> Option<OwnedMutexGuard<()>> {
        let id = self.shared.id;

        if self.permissions.request_access().await != PermissionState::Granted {
            self.shared.apply(SessionInput::PermissionDenied);
            return None;
        }

        let slot = tokio::select! {
            guard = Arc::clone(&self.slot).lock_owned() => guard,
            _ = self.shared.terminated() => {
                log::debug!("session {id}: finished while waiting for the stream slot");
                return None;
            }
        };

        if self.shared.apply(SessionInput::PermissionGranted) != Some(StreamCommand::Open) {
            return Some(slot);
        }

        match self.recognizer.open(&self.options).await {
            Ok(stream) => {
                self.shared.attach(stream.control());
                self.shared.apply(SessionInput::StreamOpened);
                self.pump(stream).await;
            }
            Err(code) => {
                log::warn!("session {id}: recognizer failed to open: {code}");
                self.shared
                    .apply(SessionInput::StreamFailed(code.to_session_error()));
            }
        }
        Some(slot)
    }

    async fn pump(&self, mut stream: RecognizerStream) {
        let id = self.shared.id;
        let mut release_deadline: Option<Instant> = None;

        loop {
            let (settled, releasing, deadline) = self.shared.with_session(|s| {
                (
                    s.is_settled(),
                    s.stream_phase() == StreamPhase::Releasing,
                    s.next_deadline(),
                )
            });
            if settled {
                break;
            }
            if releasing && release_deadline.is_none() {
                release_deadline = self.release_timeout.map(|t| Instant::now() + t);
            }

            tokio::select! {
                biased;

                event = stream.next_event() => {
                    let event = event.unwrap_or_else(|| {
                        log::warn!("session {id}: stream closed without end");
                        RecognizerEvent::End
                    });
                    self.shared.apply(SessionInput::Recognizer(event));
                }
                _ = sleep_until(deadline) => {
                    self.shared.apply(SessionInput::Tick);
                }
                _ = sleep_until(release_deadline) => {
                    log::warn!(
                        "session {id}: no end within {:?} of release, treating stream as released",
                        self.release_timeout.unwrap_or_default()
                    );
                    self.shared.apply(SessionInput::Recognizer(RecognizerEvent::End));
                }
                _ = self.shared.wake.notified() => {}
            }
        }
    }
}

async fn sleep_until(deadline: Option<Instant>) {
    match deadline {
        Some(deadline) => tokio::time::sleep_until(deadline).await,
        None => std::future::pending().await,
    }
}

// ---------------------------------------------------------------------------
// SpeechCapture
// ---------------------------------------------------------------------------

/// Entry point for text inputs that offer voice entry.
///
/// Holds at most one live session.  Must be used from within a Tokio runtime:
/// `start` spawns the session's driver task.
pub struct SpeechCapture {
    recognizer: Arc<dyn PlatformRecognizer>,
    permissions: Arc<PermissionGate>,
    capabilities: Capabilities,
    release_timeout: Option<Duration>,
    /// Held by whichever driver owns the platform stream.
    slot: Arc<tokio::sync::Mutex<()>>,
    current: Mutex<Option<SessionHandle>>,
    next_id: AtomicU64,
}

impl SpeechCapture {
    pub fn new(
        recognizer: Arc<dyn PlatformRecognizer>,
        permissions: Arc<PermissionGate>,
        runtime: &RuntimeConfig,
    ) -> Self {
        let capabilities = Capabilities::detect(recognizer.as_ref(), &permissions);
        log::debug!("capture: {capabilities:?}");
        Self {
            recognizer,
            permissions,
            capabilities,
            release_timeout: runtime.release_timeout(),
            slot: Arc::new(tokio::sync::Mutex::new(())),
            current: Mutex::new(None),
            next_id: AtomicU64::new(1),
        }
    }

    /// Start a new session.
    ///
    /// Rejected synchronously, with no side effects, when the configuration
    /// is invalid, the platform has no recognizer, or a session is still
    /// live.  If the previous session is finished but its stream is still
    /// being released, the new session waits for that release before it
    /// opens a stream.
    pub fn start(
        &self,
        config: SessionConfig,
    ) -> Result<(SessionHandle, NotificationStream), CaptureError> {
        config
            .validate()
            .map_err(|e| CaptureError::InvalidConfig(e.to_string()))?;
        if !self.capabilities.recognizer_available {
            return Err(CaptureError::Unsupported);
        }

        let mut current = self.current.lock().unwrap_or_else(PoisonError::into_inner);
        if current.as_ref().is_some_and(|h| h.state().is_active()) {
            log::debug!("capture: start rejected, a session is already active");
            return Err(CaptureError::AlreadyActive);
        }

        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let options = RecognizerOptions::from(&config);
        let mut session = SpeechSession::new(id, config, self.permissions.state());
        session.start(Instant::now())?;

        let (tx, rx) = mpsc::unbounded_channel();
        let (state, _) = watch::channel(session.state());
        let (released, _) = watch::channel(false);
        let shared = Arc::new(SessionShared {
            id,
            core: Mutex::new(SessionCore {
                session,
                control: None,
                notifications: Some(tx),
            }),
            permissions: Arc::clone(&self.permissions),
            wake: Notify::new(),
            state,
            released,
        });

        log::info!("capture: session {id} starting ({})", options.language);
        tokio::spawn(
            SessionDriver {
                shared: Arc::clone(&shared),
                recognizer: Arc::clone(&self.recognizer),
                permissions: Arc::clone(&self.permissions),
                slot: Arc::clone(&self.slot),
                options,
                release_timeout: self.release_timeout,
            }
            .run(),
        );

        let handle = SessionHandle { shared };
        *current = Some(handle.clone());
        Ok((handle, rx))
    }

    /// Start a session whose notifications are delivered to `consumer` on a
    /// dispatcher task.  The task hands the consumer back after the terminal
    /// notification.
    pub fn start_with<C>(
        &self,
        config: SessionConfig,
        mut consumer: C,
    ) -> Result<(SessionHandle, JoinHandle<C>), CaptureError>
    where
        C: SessionConsumer + 'static,
    {
        let (handle, mut notifications) = self.start(config)?;
        let dispatcher = tokio::spawn(async move {
            while let Some(notification) = notifications.recv().await {
                consumer.dispatch(&notification);
            }
            consumer
        });
        Ok((handle, dispatcher))
    }

    /// The most recently started session, live or not.
    pub fn current(&self) -> Option<SessionHandle> {
        self.current
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn stop(&self) {
        if let Some(handle) = self.current() {
            handle.stop();
        }
    }

    pub fn abort(&self) {
        if let Some(handle) = self.current() {
            handle.abort();
        }
    }

    /// Abort the live session, if any, and forget it.
    pub fn dispose(&self) {
        let handle = self
            .current
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        if let Some(handle) = handle {
            handle.dispose();
        }
    }

    /// Computed once, in [`SpeechCapture::new`].
    pub fn capabilities(&self) -> Capabilities {
        self.capabilities
    }

    pub fn permissions(&self) -> &Arc<PermissionGate> {
        &self.permissions
    }
}

impl Drop for SpeechCapture {
    fn drop(&mut self) {
        self.dispose();
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
