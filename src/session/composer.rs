//! Reference text-input consumer.
//!
//! [`InputComposer`] keeps the value of a text field that accepts both typing
//! and dictation.  Final results are appended to whatever the user already
//! typed; the live interim guess is only shown, never committed.

use crate::error::SessionError;

use super::notify::{SessionConsumer, TranscriptUpdate};

#[derive(Debug, Clone, Default)]
pub struct InputComposer {
    value: String,
    interim: String,
    listening: bool,
    max_length: Option<usize>,
    last_error: Option<SessionError>,
}

impl InputComposer {
    /// `max_length` caps the field's value in characters; `0` disables it.
    pub fn new(max_length: usize) -> Self {
        Self {
            max_length: (max_length > 0).then_some(max_length),
            ..Self::default()
        }
    }

    /// Committed text.
    pub fn value(&self) -> &str {
        &self.value
    }

    /// What the field shows: the value followed by the interim guess while
    /// dictation is running.
    ///
    /// ```
    /// use speech_capture::session::{InputComposer, SessionConsumer, TranscriptUpdate};
    ///
    /// let mut input = InputComposer::new(0);
    /// input.set_value("Dear team,");
    /// input.on_start();
    /// input.on_result(&TranscriptUpdate { text: "thanks for".into(), is_final: false, truncated: false });
    /// assert_eq!(input.display(), "Dear team, thanks for");
    /// assert_eq!(input.value(), "Dear team,");
    /// ```
    pub fn display(&self) -> String {
        if !self.listening || self.interim.is_empty() {
            return self.value.clone();
        }
        if self.value.is_empty() {
            return self.interim.clone();
        }
        format!("{} {}", self.value, self.interim)
    }

    /// Manual edit.  Replaces the value, capped at `max_length`.
    pub fn set_value(&mut self, value: &str) {
        self.value = self.cap(value);
    }

    /// Reset value and interim guess.
    pub fn clear(&mut self) {
        self.value.clear();
        self.interim.clear();
    }

    pub fn is_listening(&self) -> bool {
        self.listening
    }

    pub fn interim(&self) -> &str {
        &self.interim
    }

    pub fn last_error(&self) -> Option<&SessionError> {
        self.last_error.as_ref()
    }

    /// Characters left before `max_length`; `None` when unlimited.
    pub fn remaining(&self) -> Option<usize> {
        self.max_length
            .map(|max| max.saturating_sub(self.value.chars().count()))
    }

    fn cap(&self, text: &str) -> String {
        match self.max_length {
            Some(max) => text.chars().take(max).collect(),
            None => text.to_string(),
        }
    }
}

impl SessionConsumer for InputComposer {
    fn on_start(&mut self) {
        self.listening = true;
        self.interim.clear();
        self.last_error = None;
    }

    fn on_result(&mut self, update: &TranscriptUpdate) {
        if !update.is_final {
            self.interim = update.text.clone();
            return;
        }

        self.interim.clear();
        if update.text.is_empty() {
            return;
        }
        let merged = if self.value.is_empty() {
            update.text.clone()
        } else {
            format!("{} {}", self.value, update.text)
        };
        self.value = self.cap(&merged);
    }

    fn on_error(&mut self, error: &SessionError) {
        self.listening = false;
        self.interim.clear();
        if error.code.is_user_facing() {
            self.last_error = Some(error.clone());
        }
    }

    fn on_end(&mut self) {
        self.listening = false;
        self.interim.clear();
    }
}
