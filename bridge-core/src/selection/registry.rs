//! The pending question a session is waiting on.

use serde::{Deserialize, Serialize};
use std::sync::{Arc, RwLock};
use tracing::debug;

/// A question shown to the user together with its numbered options.
///
/// Options are 1-indexed from the user's point of view: option `n` lives at
/// `options[n - 1]`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PendingQuestion {
    pub text: String,
    pub options: Vec<String>,
}

impl PendingQuestion {
    pub fn new(text: impl Into<String>, options: Vec<String>) -> Self {
        Self {
            text: text.into(),
            options,
        }
    }

    /// Option text for a 1-based position.
    pub fn option(&self, index: usize) -> Option<&str> {
        index
            .checked_sub(1)
            .and_then(|i| self.options.get(i))
            .map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.options.len()
    }

    pub fn is_empty(&self) -> bool {
        self.options.is_empty()
    }
}

/// Holds zero or one [`PendingQuestion`].
///
/// The question is stored behind an `Arc` and swapped as a whole, so a reader
/// racing with [`set_question`](Self::set_question) sees either the previous
/// question or the new one, never a mix of both.
#[derive(Debug, Default)]
pub struct OptionRegistry {
    slot: RwLock<Option<Arc<PendingQuestion>>>,
}

impl OptionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Install a new question, replacing any previous one.
    pub fn set_question(
        &self,
        text: impl Into<String>,
        options: Vec<String>,
    ) -> Arc<PendingQuestion> {
        let question = Arc::new(PendingQuestion::new(text, options));
        let mut slot = self.slot.write().unwrap_or_else(|e| e.into_inner());
        let replaced = slot.replace(Arc::clone(&question)).is_some();
        debug!(options = question.len(), replaced, "Installed pending question");
        question
    }

    /// Snapshot of the current question, if any.
    pub fn current(&self) -> Option<Arc<PendingQuestion>> {
        self.slot
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .as_ref()
            .map(Arc::clone)
    }

    /// Remove the current question. Returns the question that was removed.
    pub fn clear(&self) -> Option<Arc<PendingQuestion>> {
        self.slot.write().unwrap_or_else(|e| e.into_inner()).take()
    }

    /// Remove the current question only if it is `expected`. The comparison
    /// and the removal happen under one write guard, so a question installed
    /// concurrently is never cleared by mistake.
    pub fn clear_if(&self, expected: &Arc<PendingQuestion>) -> bool {
        let mut slot = self.slot.write().unwrap_or_else(|e| e.into_inner());
        let matches = slot
            .as_ref()
            .is_some_and(|current| Arc::ptr_eq(current, expected));
        if matches {
            slot.take();
        }
        matches
    }

    pub fn has_pending(&self) -> bool {
        self.slot.read().unwrap_or_else(|e| e.into_inner()).is_some()
    }
}
