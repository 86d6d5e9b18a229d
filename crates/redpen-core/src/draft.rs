//! Draft state shared between the orchestrator and its agents.
//!
//! A `DraftState` is owned by exactly one workflow run. Agents borrow it for
//! the duration of a single call; the reviewer takes `&mut` so no second
//! review can be in flight for the same draft.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::verdict::ReviewVerdict;

/// One recorded review of a draft snapshot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryEntry {
    /// Revision number of the content that was reviewed
    pub revision: u32,

    /// The verdict produced for that revision
    pub verdict: ReviewVerdict,

    /// When the verdict was recorded
    pub reviewed_at: DateTime<Utc>,
}

/// The in-flight work product of one workflow run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DraftState {
    content: String,
    revision_count: u32,
    guidelines_enabled: bool,
    history: Vec<HistoryEntry>,

    /// The writer's summary of what the latest revision changed
    #[serde(default, skip_serializing_if = "Option::is_none")]
    revision_notes: Option<String>,
}

impl DraftState {
    /// Start a draft at revision 0.
    pub fn new(content: impl Into<String>, guidelines_enabled: bool) -> Self {
        Self {
            content: content.into(),
            revision_count: 0,
            guidelines_enabled,
            history: Vec::new(),
            revision_notes: None,
        }
    }

    pub fn content(&self) -> &str {
        &self.content
    }

    pub fn revision_count(&self) -> u32 {
        self.revision_count
    }

    pub fn guidelines_enabled(&self) -> bool {
        self.guidelines_enabled
    }

    pub fn history(&self) -> &[HistoryEntry] {
        &self.history
    }

    /// The most recent verdict, if the draft has been reviewed.
    pub fn last_verdict(&self) -> Option<&ReviewVerdict> {
        self.history.last().map(|e| &e.verdict)
    }

    /// Append a verdict for the current revision. History is append-only.
    pub fn record_verdict(&mut self, verdict: ReviewVerdict) {
        tracing::debug!(
            revision = self.revision_count,
            accepted = verdict.is_accepted(),
            "Recording review verdict"
        );
        self.history.push(HistoryEntry {
            revision: self.revision_count,
            verdict,
            reviewed_at: Utc::now(),
        });
    }

    /// Notes the writer left with the current revision, if any.
    pub fn revision_notes(&self) -> Option<&str> {
        self.revision_notes.as_deref()
    }

    /// Replace the content with a new snapshot and bump the revision count.
    pub fn revise(&mut self, content: impl Into<String>) {
        self.revise_with_notes(content, None);
    }

    /// Like [`revise`](Self::revise), replacing the revision notes too.
    /// Blank notes are dropped.
    pub fn revise_with_notes(&mut self, content: impl Into<String>, notes: Option<String>) {
        self.content = content.into();
        self.revision_notes = notes.filter(|n| !n.trim().is_empty());
        self.revision_count += 1;
    }

    /// Number of recorded verdicts that asked for a revision.
    pub fn revision_requests(&self) -> u32 {
        self.history
            .iter()
            .filter(|e| !e.verdict.is_accepted())
            .count() as u32
    }

    /// Whether every revision request in history has been applied.
    ///
    /// Holds at each cycle boundary: each `NeedsRevision` verdict is followed
    /// by exactly one `revise`.
    pub fn revisions_settled(&self) -> bool {
        self.revision_requests() == self.revision_count
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::verdict::Feedback;

    fn revise_verdict(text: &str) -> ReviewVerdict {
        ReviewVerdict::needs_revision(Feedback::new(text).unwrap())
    }

    #[test]
    fn test_new_draft_starts_at_revision_zero() {
        let draft = DraftState::new("first pass", true);
        assert_eq!(draft.revision_count(), 0);
        assert!(draft.history().is_empty());
        assert!(draft.guidelines_enabled());
        assert!(draft.last_verdict().is_none());
    }

    #[test]
    fn test_revision_notes_follow_latest_revision() {
        let mut draft = DraftState::new("v0", true);
        assert_eq!(draft.revision_notes(), None);

        draft.revise_with_notes("v1", Some("Added citations".to_string()));
        assert_eq!(draft.revision_notes(), Some("Added citations"));

        draft.revise_with_notes("v2", Some("  ".to_string()));
        assert_eq!(draft.revision_notes(), None);
        assert_eq!(draft.revision_count(), 2);
    }

    #[test]
    fn test_revise_increments_count_and_replaces_content() {
        let mut draft = DraftState::new("v0", true);
        draft.revise("v1");
        draft.revise("v2");
        assert_eq!(draft.content(), "v2");
        assert_eq!(draft.revision_count(), 2);
    }

    #[test]
    fn test_history_tracks_reviewed_revision() {
        let mut draft = DraftState::new("v0", true);
        draft.record_verdict(revise_verdict("Missing: sources"));
        draft.revise("v1");
        draft.record_verdict(ReviewVerdict::Accepted);

        let revisions: Vec<u32> = draft.history().iter().map(|e| e.revision).collect();
        assert_eq!(revisions, vec![0, 1]);
        assert_eq!(draft.last_verdict(), Some(&ReviewVerdict::Accepted));
    }

    #[test]
    fn test_revisions_settled_at_cycle_boundaries() {
        let mut draft = DraftState::new("v0", true);
        assert!(draft.revisions_settled());

        draft.record_verdict(revise_verdict("Missing: a"));
        assert!(!draft.revisions_settled());

        draft.revise("v1");
        assert!(draft.revisions_settled());

        draft.record_verdict(ReviewVerdict::Accepted);
        assert!(draft.revisions_settled());
        assert_eq!(draft.revision_requests(), 1);
    }
}
