//! Sans-IO speech session state machine.
//!
//! [`SpeechSession::handle`] consumes one [`SessionInput`] at a time and
//! returns a [`Step`]: at most one consumer notification and at most one
//! command for the platform stream.  The machine never sleeps, spawns or
//! touches the platform itself; time is passed in explicitly.  That keeps
//! every transition testable by feeding a literal input sequence.
//!
//! # Stream tracking
//!
//! Independently of the lifecycle state the machine tracks the platform
//! stream:
//!
//! ```text
//! NotRequested ──Open──▶ Opening ──StreamOpened──▶ Open ──Close/Abort──▶ Releasing ──End──▶ Released
//!                           └──StreamFailed──▶ Released
//! ```
//!
//! A stream that finishes opening after the session was aborted is released
//! straight away with an `Abort` command.  Terminal sessions drop every
//! recognizer event except the `End` that settles the stream.

use tokio::time::Instant;

use crate::config::SessionConfig;
use crate::error::{CaptureError, ErrorCode, SessionError};
use crate::permission::PermissionState;
use crate::recognizer::RecognizerEvent;

use super::notify::{SessionNotification, TranscriptUpdate};
use super::reconciler::{Fragment, TranscriptReconciler, TranscriptState};
use super::state::{SessionState, StopReason};
use super::watchdog::SilenceWatchdog;

// ---------------------------------------------------------------------------
// Inputs and outputs
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionInput {
    PermissionGranted,
    PermissionDenied,
    /// `open()` returned a live stream.
    StreamOpened,
    /// `open()` failed.
    StreamFailed(SessionError),
    Recognizer(RecognizerEvent),
    Stop,
    Abort,
    /// A watchdog deadline may have passed.
    Tick,
}

/// What the driver must do to the platform stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreamCommand {
    Open,
    Close,
    Abort,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Step {
    pub notification: Option<SessionNotification>,
    pub command: Option<StreamCommand>,
}

impl Step {
    fn none() -> Self {
        Self::default()
    }

    fn notify(notification: SessionNotification) -> Self {
        Self {
            notification: Some(notification),
            command: None,
        }
    }

    fn command(command: Option<StreamCommand>) -> Self {
        Self {
            notification: None,
            command,
        }
    }

    fn with_command(mut self, command: Option<StreamCommand>) -> Self {
        self.command = command;
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreamPhase {
    NotRequested,
    Opening,
    Open,
    Releasing,
    Released,
}

// ---------------------------------------------------------------------------
// SpeechSession
// ---------------------------------------------------------------------------

#[derive(Debug)]
pub struct SpeechSession {
    id: u64,
    config: SessionConfig,
    state: SessionState,
    permission: PermissionState,
    transcript: TranscriptState,
    reconciler: TranscriptReconciler,
    watchdog: SilenceWatchdog,
    stream: StreamPhase,
    error: Option<SessionError>,
    stop_reason: Option<StopReason>,
    truncation_reported: bool,
    started_at: Option<Instant>,
    last_activity_at: Option<Instant>,
}

impl SpeechSession {
    /// A fresh `Idle` session.  `config` is the immutable snapshot for this
    /// session's lifetime; `permission` is the gate's cached decision.
    pub fn new(id: u64, config: SessionConfig, permission: PermissionState) -> Self {
        Self {
            id,
            reconciler: TranscriptReconciler::new(config.max_length()),
            watchdog: SilenceWatchdog::new(config.silence_timeout(), config.timeout()),
            config,
            state: SessionState::Idle,
            permission,
            transcript: TranscriptState::default(),
            stream: StreamPhase::NotRequested,
            error: None,
            stop_reason: None,
            truncation_reported: false,
            started_at: None,
            last_activity_at: None,
        }
    }

    /// `Idle → RequestingPermission`.  Rejected without side effects on a
    /// session that is live or finished.
    pub fn start(&mut self, now: Instant) -> Result<(), CaptureError> {
        match self.state {
            SessionState::Idle => {
                self.error = None;
                self.started_at = Some(now);
                self.transition(SessionState::RequestingPermission);
                Ok(())
            }
            s if s.is_active() => Err(CaptureError::AlreadyActive),
            _ => Err(CaptureError::SessionFinished),
        }
    }

    pub fn handle(&mut self, input: SessionInput, now: Instant) -> Step {
        let step = match input {
            SessionInput::PermissionGranted => self.on_permission(PermissionState::Granted),
            SessionInput::PermissionDenied => self.on_permission(PermissionState::Denied),
            SessionInput::StreamOpened => self.on_stream_opened(now),
            SessionInput::StreamFailed(error) => self.on_stream_failed(error),
            SessionInput::Recognizer(event) => self.on_event(event, now),
            SessionInput::Stop => self.on_stop(StopReason::Manual),
            SessionInput::Abort => self.on_abort(),
            SessionInput::Tick => self.on_tick(now),
        };
        debug_assert!(self.state == SessionState::Listening || self.transcript.interim.is_empty());
        step
    }

    // -- accessors ----------------------------------------------------------

    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    pub fn permission(&self) -> PermissionState {
        self.permission
    }

    pub fn transcript(&self) -> &TranscriptState {
        &self.transcript
    }

    pub fn final_transcript(&self) -> &str {
        &self.transcript.final_text
    }

    pub fn interim_transcript(&self) -> &str {
        &self.transcript.interim
    }

    pub fn error(&self) -> Option<&SessionError> {
        self.error.as_ref()
    }

    pub fn stop_reason(&self) -> Option<StopReason> {
        self.stop_reason
    }

    /// Whether any final fragment was cut to fit `max_length`.
    pub fn truncated(&self) -> bool {
        self.truncation_reported
    }

    pub fn started_at(&self) -> Option<Instant> {
        self.started_at
    }

    /// Time of the last recognizer event.
    pub fn last_activity_at(&self) -> Option<Instant> {
        self.last_activity_at
    }

    pub fn stream_phase(&self) -> StreamPhase {
        self.stream
    }

    /// Earliest watchdog deadline; `None` outside `Listening`.
    pub fn next_deadline(&self) -> Option<Instant> {
        self.watchdog.next_deadline()
    }

    /// Terminal, with no platform stream outstanding or still to be opened.
    pub fn is_settled(&self) -> bool {
        self.state.is_terminal()
            && matches!(self.stream, StreamPhase::NotRequested | StreamPhase::Released)
    }

    // -- transitions --------------------------------------------------------

    fn transition(&mut self, to: SessionState) {
        if self.state != to {
            log::debug!("session {}: {:?} -> {:?}", self.id, self.state, to);
            self.state = to;
        }
        if to != SessionState::Listening {
            self.transcript.interim.clear();
            self.watchdog.disarm();
        }
    }

    /// Ask the platform to let go of an open stream.  `Abort` escalates a
    /// release that is already in progress.
    fn release(&mut self, command: StreamCommand) -> Option<StreamCommand> {
        match self.stream {
            StreamPhase::Open => {
                self.stream = StreamPhase::Releasing;
                Some(command)
            }
            StreamPhase::Releasing if command == StreamCommand::Abort => Some(command),
            _ => None,
        }
    }

    fn fail(&mut self, error: SessionError) -> Step {
        log::info!("session {}: failed with {}", self.id, error.code);
        if error.code == ErrorCode::PermissionDenied {
            self.permission = PermissionState::Denied;
        }
        self.transition(SessionState::Errored(error.code));
        self.error = Some(error.clone());
        let command = self.release(StreamCommand::Abort);
        Step::notify(SessionNotification::Error(error)).with_command(command)
    }

    fn on_permission(&mut self, decision: PermissionState) -> Step {
        self.permission = decision;
        if self.state != SessionState::RequestingPermission {
            return Step::none();
        }

        match decision {
            PermissionState::Granted if self.stream == StreamPhase::NotRequested => {
                self.stream = StreamPhase::Opening;
                Step::command(Some(StreamCommand::Open))
            }
            PermissionState::Granted => Step::none(),
            _ => self.fail(SessionError::new(ErrorCode::PermissionDenied)),
        }
    }

    fn on_stream_opened(&mut self, now: Instant) -> Step {
        if self.stream != StreamPhase::Opening {
            return Step::none();
        }

        if self.state == SessionState::RequestingPermission {
            self.stream = StreamPhase::Open;
            self.transition(SessionState::Listening);
            self.watchdog.arm(now);
            self.last_activity_at = Some(now);
            log::info!("session {}: listening ({})", self.id, self.config.language);
            Step::notify(SessionNotification::Start)
        } else {
            log::debug!("session {}: releasing stream opened after abort", self.id);
            self.stream = StreamPhase::Releasing;
            Step::command(Some(StreamCommand::Abort))
        }
    }

    fn on_stream_failed(&mut self, error: SessionError) -> Step {
        if self.stream == StreamPhase::Opening {
            self.stream = StreamPhase::Released;
        }
        if self.state == SessionState::RequestingPermission {
            self.fail(error)
        } else {
            Step::none()
        }
    }

    fn on_event(&mut self, event: RecognizerEvent, now: Instant) -> Step {
        if !matches!(self.state, SessionState::Listening | SessionState::Stopping) {
            if event.is_end() && self.stream != StreamPhase::NotRequested {
                self.stream = StreamPhase::Released;
            }
            log::debug!("session {}: dropped late {:?}", self.id, event);
            return Step::none();
        }

        self.last_activity_at = Some(now);
        self.watchdog.touch(now);

        match event {
            RecognizerEvent::Interim { text } => {
                if self.state != SessionState::Listening {
                    return Step::none();
                }
                self.reconciler.reconcile(&mut self.transcript, Fragment::Interim(&text));
                Step::notify(SessionNotification::Result(TranscriptUpdate {
                    text,
                    is_final: false,
                    truncated: false,
                }))
            }
            RecognizerEvent::Final { text } => {
                let reconciled = self
                    .reconciler
                    .reconcile(&mut self.transcript, Fragment::Final(&text));

                let surface_truncation = reconciled.truncated && !self.truncation_reported;
                if surface_truncation {
                    log::debug!("session {}: final fragment truncated", self.id);
                    self.truncation_reported = true;
                }
                if reconciled.appended.is_empty() && !surface_truncation {
                    return Step::none();
                }
                Step::notify(SessionNotification::Result(TranscriptUpdate {
                    text: reconciled.appended,
                    is_final: true,
                    truncated: surface_truncation,
                }))
            }
            RecognizerEvent::Error { code } => self.fail(code.to_session_error()),
            RecognizerEvent::End => {
                self.stream = StreamPhase::Released;
                self.transition(SessionState::Ended);
                log::info!(
                    "session {}: ended ({} chars)",
                    self.id,
                    self.transcript.final_chars()
                );
                Step::notify(SessionNotification::End)
            }
        }
    }

    fn on_stop(&mut self, reason: StopReason) -> Step {
        if self.state != SessionState::Listening {
            return Step::none();
        }
        self.stop_reason = Some(reason);
        self.transition(SessionState::Stopping);
        Step::command(self.release(StreamCommand::Close))
    }

    fn on_abort(&mut self) -> Step {
        if self.state.is_terminal() {
            return Step::none();
        }
        self.fail(SessionError::new(ErrorCode::Aborted))
    }

    fn on_tick(&mut self, now: Instant) -> Step {
        if self.state != SessionState::Listening {
            return Step::none();
        }
        match self.watchdog.poll(now) {
            Some(trigger) => {
                log::info!("session {}: {:?} timer fired, stopping", self.id, trigger);
                self.on_stop(trigger.into())
            }
            None => Step::none(),
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::recognizer::PlatformErrorCode;

    fn ms(n: u64) -> Duration {
        Duration::from_millis(n)
    }

    fn config() -> SessionConfig {
        SessionConfig {
            silence_timeout_ms: 3_000,
            timeout_ms: 30_000,
            max_length: 0,
            ..SessionConfig::default()
        }
    }

    /// A session driven to `Listening` at `t0`.
    fn listening(config: SessionConfig, t0: Instant) -> SpeechSession {
        let mut s = SpeechSession::new(1, config, PermissionState::Unknown);
        s.start(t0).unwrap();
        assert_eq!(
            s.handle(SessionInput::PermissionGranted, t0).command,
            Some(StreamCommand::Open)
        );
        let step = s.handle(SessionInput::StreamOpened, t0);
        assert_eq!(step.notification, Some(SessionNotification::Start));
        assert_eq!(s.state(), SessionState::Listening);
        s
    }

    fn event(e: RecognizerEvent) -> SessionInput {
        SessionInput::Recognizer(e)
    }

    fn result(text: &str, is_final: bool) -> Option<SessionNotification> {
        Some(SessionNotification::Result(TranscriptUpdate {
            text: text.into(),
            is_final,
            truncated: false,
        }))
    }

    #[test]
    fn happy_path_start_to_end() {
        let t0 = Instant::now();
        let mut s = listening(config(), t0);

        let step = s.handle(event(RecognizerEvent::interim("hel")), t0 + ms(100));
        assert_eq!(step.notification, result("hel", false));
        assert_eq!(s.interim_transcript(), "hel");

        let step = s.handle(event(RecognizerEvent::final_text("hello")), t0 + ms(200));
        assert_eq!(step.notification, result("hello", true));
        assert_eq!(s.interim_transcript(), "");

        let step = s.handle(SessionInput::Stop, t0 + ms(300));
        assert_eq!(step.notification, None);
        assert_eq!(step.command, Some(StreamCommand::Close));
        assert_eq!(s.state(), SessionState::Stopping);
        assert_eq!(s.stop_reason(), Some(StopReason::Manual));

        let step = s.handle(event(RecognizerEvent::End), t0 + ms(400));
        assert_eq!(step.notification, Some(SessionNotification::End));
        assert_eq!(s.state(), SessionState::Ended);
        assert_eq!(s.final_transcript(), "hello");
        assert!(s.is_settled());
    }

    #[test]
    fn start_rejects_live_and_finished_sessions() {
        let t0 = Instant::now();
        let mut s = SpeechSession::new(1, config(), PermissionState::Unknown);
        s.start(t0).unwrap();
        assert_eq!(s.start(t0), Err(CaptureError::AlreadyActive));
        assert_eq!(s.state(), SessionState::RequestingPermission);

        s.handle(SessionInput::PermissionDenied, t0);
        assert_eq!(s.start(t0), Err(CaptureError::SessionFinished));
    }

    #[test]
    fn permission_denied_errors_without_open() {
        let t0 = Instant::now();
        let mut s = SpeechSession::new(1, config(), PermissionState::Denied);
        s.start(t0).unwrap();

        let step = s.handle(SessionInput::PermissionDenied, t0);
        assert_eq!(step.command, None);
        match step.notification {
            Some(SessionNotification::Error(e)) => assert_eq!(e.code, ErrorCode::PermissionDenied),
            other => panic!("expected error, got {other:?}"),
        }
        assert_eq!(s.state(), SessionState::Errored(ErrorCode::PermissionDenied));
        assert_eq!(s.stream_phase(), StreamPhase::NotRequested);
        assert!(s.is_settled());
    }

    #[test]
    fn open_failure_is_classified() {
        let t0 = Instant::now();
        let mut s = SpeechSession::new(1, config(), PermissionState::Granted);
        s.start(t0).unwrap();
        s.handle(SessionInput::PermissionGranted, t0);

        let failure = PlatformErrorCode::AudioCapture.to_session_error();
        let step = s.handle(SessionInput::StreamFailed(failure), t0);
        assert!(matches!(step.notification, Some(SessionNotification::Error(_))));
        assert_eq!(s.state(), SessionState::Errored(ErrorCode::AudioCapture));
        assert!(s.is_settled());
    }

    #[test]
    fn stop_is_idempotent() {
        let t0 = Instant::now();
        let mut s = listening(config(), t0);

        assert_eq!(s.handle(SessionInput::Stop, t0).command, Some(StreamCommand::Close));
        assert_eq!(s.handle(SessionInput::Stop, t0), Step::default());

        let end = s.handle(event(RecognizerEvent::End), t0);
        assert_eq!(end.notification, Some(SessionNotification::End));
        assert_eq!(s.handle(SessionInput::Stop, t0), Step::default());
    }

    #[test]
    fn stop_outside_listening_is_a_no_op() {
        let t0 = Instant::now();
        let mut s = SpeechSession::new(1, config(), PermissionState::Unknown);
        assert_eq!(s.handle(SessionInput::Stop, t0), Step::default());
        s.start(t0).unwrap();
        assert_eq!(s.handle(SessionInput::Stop, t0), Step::default());
        assert_eq!(s.state(), SessionState::RequestingPermission);
    }

    #[test]
    fn stopping_keeps_finals_and_drops_interims() {
        let t0 = Instant::now();
        let mut s = listening(config(), t0);
        s.handle(event(RecognizerEvent::interim("hel")), t0);
        s.handle(SessionInput::Stop, t0);
        assert_eq!(s.interim_transcript(), "");

        assert_eq!(s.handle(event(RecognizerEvent::interim("hello")), t0), Step::default());
        let step = s.handle(event(RecognizerEvent::final_text("hello")), t0);
        assert_eq!(step.notification, result("hello", true));
        assert_eq!(s.final_transcript(), "hello");
        assert_eq!(s.state(), SessionState::Stopping);
    }

    #[test]
    fn platform_error_is_terminal_and_releases() {
        let t0 = Instant::now();
        let mut s = listening(config(), t0);
        s.handle(event(RecognizerEvent::interim("hel")), t0);

        let step = s.handle(event(RecognizerEvent::error(PlatformErrorCode::NoSpeech)), t0);
        assert_eq!(step.command, Some(StreamCommand::Abort));
        match step.notification {
            Some(SessionNotification::Error(e)) => {
                assert_eq!(e.code, ErrorCode::NoSpeechDetected);
                assert_eq!(e.message, "Speech recognition error: no-speech");
            }
            other => panic!("expected error, got {other:?}"),
        }
        assert_eq!(s.interim_transcript(), "");
        assert!(!s.is_settled());

        // The platform's End settles the stream without a notification.
        assert_eq!(s.handle(event(RecognizerEvent::End), t0), Step::default());
        assert!(s.is_settled());
    }

    #[test]
    fn error_while_stopping_is_reported() {
        let t0 = Instant::now();
        let mut s = listening(config(), t0);
        s.handle(SessionInput::Stop, t0);

        let step = s.handle(event(RecognizerEvent::error(PlatformErrorCode::Network)), t0);
        assert!(matches!(step.notification, Some(SessionNotification::Error(_))));
        assert_eq!(s.state(), SessionState::Errored(ErrorCode::NetworkTransient));
    }

    #[test]
    fn platform_refusal_revokes_the_grant() {
        let t0 = Instant::now();
        let mut s = listening(config(), t0);
        assert_eq!(s.permission(), PermissionState::Granted);

        let step = s.handle(event(RecognizerEvent::error(PlatformErrorCode::NotAllowed)), t0);
        assert_eq!(step.command, Some(StreamCommand::Abort));
        assert_eq!(s.state(), SessionState::Errored(ErrorCode::PermissionDenied));
        assert_eq!(s.permission(), PermissionState::Denied);
    }

    #[test]
    fn platform_cutoff_is_a_visible_error() {
        let t0 = Instant::now();
        let mut s = listening(config(), t0);

        let step = s.handle(event(RecognizerEvent::error(PlatformErrorCode::Aborted)), t0);
        match step.notification {
            Some(SessionNotification::Error(e)) => {
                assert_eq!(e.code, ErrorCode::NetworkTransient);
                assert!(e.code.is_user_facing());
            }
            other => panic!("expected error, got {other:?}"),
        }
    }

    #[test]
    fn abort_seals_the_session() {
        let t0 = Instant::now();
        let mut s = listening(config(), t0);

        let step = s.handle(SessionInput::Abort, t0);
        assert_eq!(step.command, Some(StreamCommand::Abort));
        assert_eq!(s.state(), SessionState::Errored(ErrorCode::Aborted));

        // Late platform traffic is consumed silently.
        for late in [
            RecognizerEvent::final_text("late"),
            RecognizerEvent::error(PlatformErrorCode::Aborted),
            RecognizerEvent::End,
        ] {
            assert_eq!(s.handle(event(late), t0).notification, None);
        }
        assert_eq!(s.final_transcript(), "");
        assert_eq!(s.handle(SessionInput::Abort, t0), Step::default());
        assert!(s.is_settled());
    }

    #[test]
    fn abort_escalates_a_pending_close() {
        let t0 = Instant::now();
        let mut s = listening(config(), t0);
        s.handle(SessionInput::Stop, t0);

        let step = s.handle(SessionInput::Abort, t0);
        assert_eq!(step.command, Some(StreamCommand::Abort));
        assert_eq!(s.stream_phase(), StreamPhase::Releasing);
    }

    #[test]
    fn stream_opened_after_abort_is_released() {
        let t0 = Instant::now();
        let mut s = SpeechSession::new(1, config(), PermissionState::Granted);
        s.start(t0).unwrap();
        s.handle(SessionInput::PermissionGranted, t0);

        let step = s.handle(SessionInput::Abort, t0);
        assert_eq!(step.command, None);
        assert!(!s.is_settled());

        let step = s.handle(SessionInput::StreamOpened, t0 + ms(50));
        assert_eq!(step.notification, None);
        assert_eq!(step.command, Some(StreamCommand::Abort));
        assert_eq!(s.state(), SessionState::Errored(ErrorCode::Aborted));

        s.handle(event(RecognizerEvent::End), t0 + ms(60));
        assert!(s.is_settled());
    }

    #[test]
    fn silence_tick_stops_after_window() {
        let t0 = Instant::now();
        let mut s = listening(config(), t0);
        s.handle(event(RecognizerEvent::final_text("hello")), t0);

        assert_eq!(s.next_deadline(), Some(t0 + ms(3_000)));
        assert_eq!(s.handle(SessionInput::Tick, t0 + ms(2_999)), Step::default());

        let step = s.handle(SessionInput::Tick, t0 + ms(3_000));
        assert_eq!(step.command, Some(StreamCommand::Close));
        assert_eq!(s.stop_reason(), Some(StopReason::SilenceTimeout));
        assert_eq!(s.next_deadline(), None);
    }

    #[test]
    fn activity_postpones_silence() {
        let t0 = Instant::now();
        let mut s = listening(config(), t0);
        s.handle(event(RecognizerEvent::interim("a")), t0 + ms(2_500));

        assert_eq!(s.last_activity_at(), Some(t0 + ms(2_500)));
        assert_eq!(s.handle(SessionInput::Tick, t0 + ms(3_000)), Step::default());
        assert_eq!(s.next_deadline(), Some(t0 + ms(5_500)));
    }

    #[test]
    fn max_duration_fires_despite_activity() {
        let t0 = Instant::now();
        let cfg = SessionConfig {
            timeout_ms: 5_000,
            ..config()
        };
        let mut s = listening(cfg, t0);
        for i in 1..=4 {
            s.handle(event(RecognizerEvent::interim("x")), t0 + ms(i * 1_000));
        }

        let step = s.handle(SessionInput::Tick, t0 + ms(5_000));
        assert_eq!(step.command, Some(StreamCommand::Close));
        assert_eq!(s.stop_reason(), Some(StopReason::MaxDuration));
    }

    #[test]
    fn single_shot_end_while_listening_ends() {
        let t0 = Instant::now();
        let cfg = SessionConfig {
            continuous: false,
            ..config()
        };
        let mut s = listening(cfg, t0);
        s.handle(event(RecognizerEvent::final_text("once")), t0);

        let step = s.handle(event(RecognizerEvent::End), t0);
        assert_eq!(step.notification, Some(SessionNotification::End));
        assert_eq!(s.state(), SessionState::Ended);
        assert_eq!(s.stop_reason(), None);
    }

    #[test]
    fn truncation_is_surfaced_once() {
        let t0 = Instant::now();
        let cfg = SessionConfig {
            max_length: 8,
            ..config()
        };
        let mut s = listening(cfg, t0);

        let first = s.handle(event(RecognizerEvent::final_text("hello there")), t0);
        assert_eq!(
            first.notification,
            Some(SessionNotification::Result(TranscriptUpdate {
                text: "hello th".into(),
                is_final: true,
                truncated: true,
            }))
        );
        assert!(s.truncated());

        // Nothing fits any more and the flag was already reported.
        let second = s.handle(event(RecognizerEvent::final_text("more")), t0);
        assert_eq!(second.notification, None);
        assert_eq!(s.final_transcript(), "hello th");
        assert!(s.final_transcript().chars().count() <= 8);
    }

    #[test]
    fn every_input_is_handled_in_every_state() {
        let t0 = Instant::now();
        let inputs = || {
            vec![
                SessionInput::PermissionGranted,
                SessionInput::PermissionDenied,
                SessionInput::StreamOpened,
                SessionInput::StreamFailed(ErrorCode::NetworkTransient.into()),
                event(RecognizerEvent::interim("i")),
                event(RecognizerEvent::final_text("f")),
                event(RecognizerEvent::error(PlatformErrorCode::Network)),
                event(RecognizerEvent::End),
                SessionInput::Stop,
                SessionInput::Abort,
                SessionInput::Tick,
            ]
        };

        // Whatever arrives after the terminal notification stays silent.
        for input in inputs() {
            let mut s = listening(config(), t0);
            let mut sealed = false;
            for next in std::iter::once(input).chain(inputs()) {
                let step = s.handle(next, t0);
                if sealed {
                    assert_eq!(step.notification, None);
                }
                sealed |= step.notification.as_ref().is_some_and(|n| n.is_terminal());
            }
            assert!(s.state().is_terminal());
        }
    }
}
