//! Review verdicts.
//!
//! A verdict is the reviewer's decision for one draft snapshot. It is
//! immutable once produced and is recorded in the draft history before the
//! orchestrator acts on it.

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Rejected attempt to build empty feedback.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("revision feedback must not be empty")]
pub struct EmptyFeedback;

/// Revision instructions. Never empty.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Feedback(String);

impl Feedback {
    /// Wrap feedback text, rejecting blank strings.
    pub fn new(text: impl Into<String>) -> Result<Self, EmptyFeedback> {
        let text = text.into();
        if text.trim().is_empty() {
            return Err(EmptyFeedback);
        }
        Ok(Self(text))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Number of feedback lines (one per violation when composed by the reviewer).
    pub fn line_count(&self) -> usize {
        self.0.lines().filter(|l| !l.trim().is_empty()).count()
    }

    pub fn into_inner(self) -> String {
        self.0
    }
}

impl TryFrom<String> for Feedback {
    type Error = EmptyFeedback;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Feedback::new(value)
    }
}

impl From<Feedback> for String {
    fn from(feedback: Feedback) -> Self {
        feedback.0
    }
}

impl fmt::Display for Feedback {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Outcome of one review pass.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "verdict", rename_all = "snake_case")]
pub enum ReviewVerdict {
    /// Draft satisfies every guideline.
    Accepted,

    /// Draft must be revised according to the feedback.
    NeedsRevision { feedback: Feedback },
}

impl ReviewVerdict {
    pub fn needs_revision(feedback: Feedback) -> Self {
        Self::NeedsRevision { feedback }
    }

    pub fn is_accepted(&self) -> bool {
        matches!(self, Self::Accepted)
    }

    pub fn feedback(&self) -> Option<&Feedback> {
        match self {
            Self::Accepted => None,
            Self::NeedsRevision { feedback } => Some(feedback),
        }
    }
}
