//! RecordingWarningSink - keeps reported warnings for later inspection.

use std::sync::{Mutex, PoisonError};

use crate::ports::WarningSink;

/// Stores every message it receives.
///
/// Useful for hosts that surface warnings after a batch, and for tests that
/// assert on what was reported.
#[derive(Debug, Default)]
pub struct RecordingWarningSink {
    messages: Mutex<Vec<String>>,
}

impl RecordingWarningSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn messages(&self) -> Vec<String> {
        self.messages
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn len(&self) -> usize {
        self.messages
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Drain everything recorded so far.
    pub fn take(&self) -> Vec<String> {
        std::mem::take(&mut *self.messages.lock().unwrap_or_else(PoisonError::into_inner))
    }
}

impl WarningSink for RecordingWarningSink {
    fn warn(&self, message: &str) {
        tracing::debug!(target: "relay", "recorded warning: {message}");
        self.messages
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(message.to_string());
    }
}
