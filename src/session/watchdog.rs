//! Silence and maximum-duration timers for one session.
//!
//! The watchdog holds deadlines only; it never sleeps.  The session driver
//! asks for [`SilenceWatchdog::next_deadline`], sleeps until then, and feeds a
//! `Tick` to the state machine, which calls [`SilenceWatchdog::poll`].
//!
//! ```text
//! arm(t0) ──▶ silence deadline = t0 + silence      max deadline = t0 + timeout
//! touch(t) ─▶ silence deadline = t  + silence      (max deadline unchanged)
//! disarm() ─▶ both cleared
//! ```

use std::time::Duration;

use tokio::time::Instant;

use super::state::StopReason;

/// Which timer expired.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WatchdogTrigger {
    Silence,
    MaxDuration,
}

impl From<WatchdogTrigger> for StopReason {
    fn from(trigger: WatchdogTrigger) -> Self {
        match trigger {
            WatchdogTrigger::Silence => StopReason::SilenceTimeout,
            WatchdogTrigger::MaxDuration => StopReason::MaxDuration,
        }
    }
}

#[derive(Debug, Clone)]
pub struct SilenceWatchdog {
    silence: Option<Duration>,
    max_duration: Option<Duration>,
    silence_deadline: Option<Instant>,
    max_deadline: Option<Instant>,
}

impl SilenceWatchdog {
    /// `None` disables the corresponding timer.
    pub fn new(silence: Option<Duration>, max_duration: Option<Duration>) -> Self {
        Self {
            silence,
            max_duration,
            silence_deadline: None,
            max_deadline: None,
        }
    }

    /// Start both timers.  Called once, on `Listening` entry.
    pub fn arm(&mut self, now: Instant) {
        self.silence_deadline = self.silence.map(|d| now + d);
        self.max_deadline = self.max_duration.map(|d| now + d);
    }

    /// Recognizer activity: push the silence deadline out.
    pub fn touch(&mut self, now: Instant) {
        if self.is_armed() {
            self.silence_deadline = self.silence.map(|d| now + d);
        }
    }

    pub fn disarm(&mut self) {
        self.silence_deadline = None;
        self.max_deadline = None;
    }

    pub fn is_armed(&self) -> bool {
        self.silence_deadline.is_some() || self.max_deadline.is_some()
    }

    /// Earliest pending deadline.
    pub fn next_deadline(&self) -> Option<Instant> {
        match (self.silence_deadline, self.max_deadline) {
            (Some(a), Some(b)) => Some(a.min(b)),
            (a, b) => a.or(b),
        }
    }

    /// Report an expired timer.  When both are due the absolute limit wins.
    pub fn poll(&self, now: Instant) -> Option<WatchdogTrigger> {
        if self.max_deadline.is_some_and(|d| d <= now) {
            return Some(WatchdogTrigger::MaxDuration);
        }
        if self.silence_deadline.is_some_and(|d| d <= now) {
            return Some(WatchdogTrigger::Silence);
        }
        None
    }
}
