//! Merges interim and final fragments into a stable transcript.
//!
//! The reconciler reduces each fragment into the session's transcript in
//! place:
//!
//! ```text
//! (&mut TranscriptState, Fragment) ──▶ Reconciled { appended, truncated }
//! ```
//!
//! * `Final`: appended to the final transcript, separated by one space when
//!   both sides are non-empty; the interim guess is cleared.
//! * `Interim`: replaces the interim guess wholesale.  The platform re-sends
//!   the full guess on every tick, so interim fragments never accumulate.
//!
//! When appending would exceed `max_length` characters the *fragment* is
//! truncated, never the existing transcript, and `truncated` is set.

/// One incoming fragment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Fragment<'a> {
    Interim(&'a str),
    Final(&'a str),
}

/// Transcript owned by a session.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TranscriptState {
    /// Confirmed segments in arrival order.  Append-only.
    pub segments: Vec<String>,
    /// `segments` joined with single spaces.
    pub final_text: String,
    pub interim: String,
}

impl TranscriptState {
    /// Final transcript length in characters.
    pub fn final_chars(&self) -> usize {
        self.final_text.chars().count()
    }
}

/// What one reduction step added.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Reconciled {
    /// Text actually added to the final transcript (empty for interim).
    pub appended: String,
    pub truncated: bool,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct TranscriptReconciler {
    max_length: Option<usize>,
}

impl TranscriptReconciler {
    pub fn new(max_length: Option<usize>) -> Self {
        Self { max_length }
    }

    /// Fold `fragment` into `transcript`.  Segments already confirmed are
    /// never copied.
    pub fn reconcile(
        &self,
        transcript: &mut TranscriptState,
        fragment: Fragment<'_>,
    ) -> Reconciled {
        match fragment {
            Fragment::Interim(text) => {
                transcript.interim.clear();
                transcript.interim.push_str(text);
                Reconciled::default()
            }
            Fragment::Final(text) => {
                transcript.interim.clear();
                self.append_final(transcript, text)
            }
        }
    }

    fn append_final(&self, transcript: &mut TranscriptState, text: &str) -> Reconciled {
        if text.is_empty() {
            return Reconciled::default();
        }

        let separator = usize::from(!transcript.final_text.is_empty());
        let (appended, truncated) = match self.max_length {
            None => (text.to_string(), false),
            Some(max) => {
                let room = max.saturating_sub(transcript.final_chars() + separator);
                if text.chars().count() <= room {
                    (text.to_string(), false)
                } else {
                    (text.chars().take(room).collect::<String>(), true)
                }
            }
        };

        if !appended.is_empty() {
            if separator == 1 {
                transcript.final_text.push(' ');
            }
            transcript.final_text.push_str(&appended);
            transcript.segments.push(appended.clone());
        }

        Reconciled {
            appended,
            truncated,
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
