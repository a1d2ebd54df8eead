//! Resolve a user's reply against the pending question.

use super::parser::parse_number;
use super::registry::PendingQuestion;
use serde::{Deserialize, Serialize};
use std::ops::RangeInclusive;
use tracing::debug;

/// Result of matching a reply against a question's options.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum ActionOutcome {
    /// The reply named an existing option.
    Selected { index: usize, option: String },
    /// The reply was a number, but no option has that position.
    OutOfRange { index: usize, max: usize },
    /// The reply was not a number at all.
    Unparsable { input: String },
}

impl ActionOutcome {
    /// Down-arrow presses needed to move the cursor from the first option to
    /// the selected one.
    pub fn down_presses(&self) -> Option<usize> {
        match self {
            ActionOutcome::Selected { index, .. } => Some(index - 1),
            _ => None,
        }
    }

    /// Valid positions, reported for out-of-range replies.
    pub fn valid_range(&self) -> Option<RangeInclusive<usize>> {
        match self {
            ActionOutcome::OutOfRange { max, .. } => Some(1..=*max),
            _ => None,
        }
    }

    /// Text re-prompting the user after an invalid reply.
    pub fn retry_prompt(&self) -> Option<String> {
        match self {
            ActionOutcome::Selected { .. } => None,
            ActionOutcome::OutOfRange { index, max } => Some(format!(
                "Option {} is out of range (1-{}). Choose from the options below:",
                index, max
            )),
            ActionOutcome::Unparsable { input } => Some(format!(
                "Please provide a number for your choice (you entered '{}' which is not valid). \
                 Choose from the options below:",
                input
            )),
        }
    }
}

/// Match `raw` against `question`.
///
/// Pure: no I/O and no retries. Zero parses as a number and is therefore
/// out of range rather than unparsable.
pub fn resolve(raw: &str, question: &PendingQuestion) -> ActionOutcome {
    let outcome = match parse_number(raw) {
        None => ActionOutcome::Unparsable {
            input: raw.to_string(),
        },
        Some(index) => match question.option(index) {
            Some(option) => ActionOutcome::Selected {
                index,
                option: option.to_string(),
            },
            None => ActionOutcome::OutOfRange {
                index,
                max: question.len(),
            },
        },
    };
    debug!(input = raw, ?outcome, "Resolved action");
    outcome
}
