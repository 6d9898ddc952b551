//! Scripted event-replay recognizer.
//!
//! [`ScriptedRecognizer`] stands in for the platform capability: every
//! `open()` takes the next [`ReplayScript`] from its queue and replays the
//! script's events with the given delays on a background task.  It reacts to
//! release requests the way platform recognizers do:
//!
//! ```text
//! close()  → (close_latency) → End
//! abort()  → Error(aborted) → End          (both late for the session)
//! script exhausted, hold_open = false → End
//! script exhausted, hold_open = true  → wait for close()/abort()
//! ```
//!
//! `continuous = false` ends the stream after the first final fragment and
//! `interim_results = false` suppresses interim events, as the platform does.

use std::collections::VecDeque;
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use anyhow::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::sync::{mpsc, watch};

use super::{
    PlatformErrorCode, PlatformRecognizer, RecognizerEvent, RecognizerOptions, RecognizerStream,
    StreamControl,
};

// ---------------------------------------------------------------------------
// ReplayScript
// ---------------------------------------------------------------------------

/// One scripted event, delivered `after_ms` after the previous one.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReplayStep {
    #[serde(default)]
    pub after_ms: u64,
    pub event: RecognizerEvent,
}

/// Behaviour of one scripted stream.
///
/// Loadable from TOML:
///
/// ```toml
/// hold_open = true
///
/// [[steps]]
/// after_ms = 200
/// event = { type = "interim", text = "hel" }
///
/// [[steps]]
/// after_ms = 300
/// event = { type = "final", text = "hello" }
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReplayScript {
    /// Time `open()` takes to establish the stream.
    pub open_delay_ms: u64,
    /// When set, `open()` fails with this code instead of streaming.
    pub open_error: Option<PlatformErrorCode>,
    pub steps: Vec<ReplayStep>,
    /// Keep the stream open after the last step until released.
    pub hold_open: bool,
    /// Delay between `close()` and the final `End`.
    pub close_latency_ms: u64,
}

impl ReplayScript {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn step(mut self, after_ms: u64, event: RecognizerEvent) -> Self {
        self.steps.push(ReplayStep { after_ms, event });
        self
    }

    pub fn hold_open(mut self) -> Self {
        self.hold_open = true;
        self
    }

    pub fn open_delay(mut self, ms: u64) -> Self {
        self.open_delay_ms = ms;
        self
    }

    pub fn close_latency(mut self, ms: u64) -> Self {
        self.close_latency_ms = ms;
        self
    }

    pub fn failing(code: PlatformErrorCode) -> Self {
        Self {
            open_error: Some(code),
            ..Self::default()
        }
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Ok(toml::from_str(&content)?)
    }
}

// ---------------------------------------------------------------------------
// ReplayStats
// ---------------------------------------------------------------------------

/// Counters observed across every stream a [`ScriptedRecognizer`] opened.
#[derive(Debug, Default)]
pub struct ReplayStats {
    opens: AtomicUsize,
    closes: AtomicUsize,
    aborts: AtomicUsize,
    active: AtomicUsize,
    peak_active: AtomicUsize,
}

impl ReplayStats {
    /// Calls to `open()`, including failed ones.
    pub fn opens(&self) -> usize {
        self.opens.load(Ordering::SeqCst)
    }

    pub fn closes(&self) -> usize {
        self.closes.load(Ordering::SeqCst)
    }

    pub fn aborts(&self) -> usize {
        self.aborts.load(Ordering::SeqCst)
    }

    /// Streams opened and not yet ended.
    pub fn active(&self) -> usize {
        self.active.load(Ordering::SeqCst)
    }

    /// Highest number of simultaneously open streams.
    pub fn peak_active(&self) -> usize {
        self.peak_active.load(Ordering::SeqCst)
    }

    fn enter(&self) {
        let now = self.active.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak_active.fetch_max(now, Ordering::SeqCst);
    }

    fn leave(&self) {
        self.active.fetch_sub(1, Ordering::SeqCst);
    }
}

// ---------------------------------------------------------------------------
// ScriptedControl
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Release {
    Close,
    Abort,
}

struct ScriptedControl {
    release: watch::Sender<Option<Release>>,
    stats: Arc<ReplayStats>,
}

impl StreamControl for ScriptedControl {
    fn close(&self) {
        self.stats.closes.fetch_add(1, Ordering::SeqCst);
        self.release.send_if_modified(|r| {
            if r.is_none() {
                *r = Some(Release::Close);
                true
            } else {
                false
            }
        });
    }

    fn abort(&self) {
        self.stats.aborts.fetch_add(1, Ordering::SeqCst);
        // Abort escalates a pending close.
        self.release.send_if_modified(|r| {
            if *r == Some(Release::Abort) {
                false
            } else {
                *r = Some(Release::Abort);
                true
            }
        });
    }
}

// ---------------------------------------------------------------------------
// ScriptedRecognizer
// ---------------------------------------------------------------------------

pub struct ScriptedRecognizer {
    available: bool,
    scripts: Mutex<VecDeque<ReplayScript>>,
    stats: Arc<ReplayStats>,
}

impl ScriptedRecognizer {
    /// Each `open()` consumes the next script; once the queue is empty every
    /// further stream is an empty script held open until released.
    pub fn new(scripts: impl IntoIterator<Item = ReplayScript>) -> Self {
        Self {
            available: true,
            scripts: Mutex::new(scripts.into_iter().collect()),
            stats: Arc::new(ReplayStats::default()),
        }
    }

    /// Report the capability as absent.
    pub fn unavailable(mut self) -> Self {
        self.available = false;
        self
    }

    pub fn push_script(&self, script: ReplayScript) {
        self.scripts
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push_back(script);
    }

    pub fn stats(&self) -> Arc<ReplayStats> {
        Arc::clone(&self.stats)
    }

    fn next_script(&self) -> ReplayScript {
        self.scripts
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .pop_front()
            .unwrap_or_else(|| ReplayScript::new().hold_open())
    }
}

#[async_trait]
impl PlatformRecognizer for ScriptedRecognizer {
    fn is_available(&self) -> bool {
        self.available
    }

    async fn open(
        &self,
        options: &RecognizerOptions,
    ) -> Result<RecognizerStream, PlatformErrorCode> {
        self.stats.opens.fetch_add(1, Ordering::SeqCst);
        let script = self.next_script();

        if script.open_delay_ms > 0 {
            tokio::time::sleep(Duration::from_millis(script.open_delay_ms)).await;
        }
        if let Some(code) = script.open_error.clone() {
            log::debug!("replay: open failed with {code}");
            return Err(code);
        }

        self.stats.enter();
        let (release_tx, release_rx) = watch::channel(None);
        let (event_tx, event_rx) = mpsc::unbounded_channel();
        let control = Arc::new(ScriptedControl {
            release: release_tx,
            stats: Arc::clone(&self.stats),
        });

        tokio::spawn(replay(
            script,
            options.clone(),
            event_tx,
            release_rx,
            Arc::clone(&self.stats),
        ));

        Ok(RecognizerStream::new(control, event_rx))
    }
}

/// Deliver the script, then the release tail.  The stream counts as inactive
/// before `End` is sent so a follow-up `open()` never overlaps it.
async fn replay(
    script: ReplayScript,
    options: RecognizerOptions,
    events: mpsc::UnboundedSender<RecognizerEvent>,
    mut release: watch::Receiver<Option<Release>>,
    stats: Arc<ReplayStats>,
) {
    let finish = |events: &mpsc::UnboundedSender<RecognizerEvent>| {
        stats.leave();
        let _ = events.send(RecognizerEvent::End);
    };

    for step in script.steps {
        if release.borrow().is_some() {
            break;
        }
        if step.after_ms > 0 {
            tokio::select! {
                _ = tokio::time::sleep(Duration::from_millis(step.after_ms)) => {}
                _ = release.wait_for(|r| r.is_some()) => break,
            }
        }

        let event = step.event;
        if matches!(event, RecognizerEvent::Interim { .. }) && !options.interim_results {
            continue;
        }
        if event.is_end() {
            finish(&events);
            return;
        }

        let single_shot = matches!(event, RecognizerEvent::Final { .. }) && !options.continuous;
        if events.send(event).is_err() {
            stats.leave();
            return;
        }
        if single_shot {
            finish(&events);
            return;
        }
    }

    if script.hold_open {
        let _ = release.wait_for(|r| r.is_some()).await;
    }

    let released = *release.borrow();
    match released {
        Some(Release::Abort) => {
            let _ = events.send(RecognizerEvent::error(PlatformErrorCode::Aborted));
        }
        Some(Release::Close) if script.close_latency_ms > 0 => {
            tokio::time::sleep(Duration::from_millis(script.close_latency_ms)).await;
        }
        _ => {}
    }
    finish(&events);
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SessionConfig;

    fn options() -> RecognizerOptions {
        RecognizerOptions::from(&SessionConfig::default())
    }

    async fn collect(stream: &mut RecognizerStream) -> Vec<RecognizerEvent> {
        let mut out = Vec::new();
        while let Some(event) = stream.next_event().await {
            let end = event.is_end();
            out.push(event);
            if end {
                break;
            }
        }
        out
    }

    #[tokio::test(start_paused = true)]
    async fn replays_steps_then_ends() {
        let recognizer = ScriptedRecognizer::new([ReplayScript::new()
            .step(100, RecognizerEvent::interim("hel"))
            .step(100, RecognizerEvent::final_text("hello"))]);

        let mut stream = recognizer.open(&options()).await.unwrap();
        let events = collect(&mut stream).await;

        assert_eq!(
            events,
            vec![
                RecognizerEvent::interim("hel"),
                RecognizerEvent::final_text("hello"),
                RecognizerEvent::End,
            ]
        );
        assert_eq!(recognizer.stats().active(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn single_shot_ends_after_first_final() {
        let recognizer = ScriptedRecognizer::new([ReplayScript::new()
            .step(10, RecognizerEvent::final_text("one"))
            .step(10, RecognizerEvent::final_text("two"))]);
        let opts = RecognizerOptions {
            continuous: false,
            ..options()
        };

        let mut stream = recognizer.open(&opts).await.unwrap();
        let events = collect(&mut stream).await;

        assert_eq!(
            events,
            vec![RecognizerEvent::final_text("one"), RecognizerEvent::End]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn interim_results_can_be_suppressed() {
        let recognizer = ScriptedRecognizer::new([ReplayScript::new()
            .step(10, RecognizerEvent::interim("he"))
            .step(10, RecognizerEvent::final_text("hey"))]);
        let opts = RecognizerOptions {
            interim_results: false,
            ..options()
        };

        let mut stream = recognizer.open(&opts).await.unwrap();
        let events = collect(&mut stream).await;

        assert_eq!(
            events,
            vec![RecognizerEvent::final_text("hey"), RecognizerEvent::End]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn abort_replays_late_error_then_end() {
        let recognizer = ScriptedRecognizer::new([ReplayScript::new().hold_open()]);
        let mut stream = recognizer.open(&options()).await.unwrap();

        stream.control().abort();
        stream.control().abort();
        let events = collect(&mut stream).await;

        assert_eq!(
            events,
            vec![
                RecognizerEvent::error(PlatformErrorCode::Aborted),
                RecognizerEvent::End
            ]
        );
        assert_eq!(recognizer.stats().aborts(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn close_is_safe_after_end() {
        let recognizer = ScriptedRecognizer::new([ReplayScript::new()]);
        let mut stream = recognizer.open(&options()).await.unwrap();
        let events = collect(&mut stream).await;
        assert_eq!(events, vec![RecognizerEvent::End]);

        stream.control().close();
        stream.control().abort();
        assert!(stream.next_event().await.is_none());
    }

    #[tokio::test]
    async fn open_error_is_reported() {
        let recognizer =
            ScriptedRecognizer::new([ReplayScript::failing(PlatformErrorCode::AudioCapture)]);
        let err = recognizer.open(&options()).await.unwrap_err();
        assert_eq!(err, PlatformErrorCode::AudioCapture);
        assert_eq!(recognizer.stats().opens(), 1);
        assert_eq!(recognizer.stats().peak_active(), 0);
    }

    #[test]
    fn script_parses_from_toml() {
        let script: ReplayScript = toml::from_str(
            r#"
            hold_open = true

            [[steps]]
            after_ms = 200
            event = { type = "interim", text = "hel" }

            [[steps]]
            after_ms = 300
            event = { type = "error", code = "no-speech" }
            "#,
        )
        .unwrap();

        assert!(script.hold_open);
        assert_eq!(script.steps.len(), 2);
        assert_eq!(
            script.steps[1].event,
            RecognizerEvent::error(PlatformErrorCode::NoSpeech)
        );
    }
}
