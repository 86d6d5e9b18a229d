//! Fixed prompts for the drafting agents and the semantic judge.
//!
//! Each prompt is a system message plus a user message built from the
//! draft-specific inputs. The system messages never change, so providers
//! with prompt caching reuse them across calls.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Research agent system prompt.
pub const RESEARCH_SYSTEM_PROMPT: &str = r#"
You are a research assistant preparing notes for a writer.

Given a brief, list the key facts, figures, and sources a writer needs.
- One fact per line, each followed by its source (URL or reference)
- Do not write prose; the writer composes the report
- If a fact cannot be sourced, leave it out
"#;

/// Writer agent system prompt.
pub const WRITER_SYSTEM_PROMPT: &str = r#"
You are a report writer.

Write a complete markdown report from the brief and research notes.
- Cite sources for factual claims
- Leave no placeholders or unfinished sections
- Return only the report text, with no preamble
"#;

/// Writer prompt used when revising against reviewer feedback.
pub const REVISE_SYSTEM_PROMPT: &str = r#"
You are a report writer revising your draft after review.

Each feedback line names a guideline the draft does not meet.
- Address every feedback line
- Keep everything the feedback does not mention
- Return only the revised report text, with no preamble
- Optionally end with a line reading exactly "REVISION NOTES:" followed by
  a short summary of what you changed for the reviewer
"#;

/// Marker line separating revised content from the writer's notes.
pub const REVISION_NOTES_MARKER: &str = "REVISION NOTES:";

/// Semantic judge system prompt.
///
/// The judge answers strict JSON only; anything else is rejected by
/// [`crate::judgment::parse_judgment`].
pub const JUDGE_SYSTEM_PROMPT: &str = r#"
You check whether a draft meets one guideline criterion.

Judge ONLY the criterion given. Do not assess overall quality.

Respond with a single JSON object and nothing else:
{"satisfied": true|false, "explanation": "one sentence", "quote": "optional exact text from the draft"}

- "explanation" says what is missing when not satisfied
- "quote", when present, must be copied verbatim from the draft
"#;

/// Writing tone for drafting and revision.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase", from = "String")]
pub enum Tone {
    #[default]
    Objective,
    Formal,
    Analytical,
    Persuasive,
    Informative,
    Explanatory,
    Descriptive,
    Critical,
    Comparative,
    Speculative,
    Reflective,
    Narrative,
    Humorous,
    Optimistic,
    Pessimistic,
}

impl Tone {
    pub const ALL: [Tone; 15] = [
        Tone::Objective,
        Tone::Formal,
        Tone::Analytical,
        Tone::Persuasive,
        Tone::Informative,
        Tone::Explanatory,
        Tone::Descriptive,
        Tone::Critical,
        Tone::Comparative,
        Tone::Speculative,
        Tone::Reflective,
        Tone::Narrative,
        Tone::Humorous,
        Tone::Optimistic,
        Tone::Pessimistic,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Tone::Objective => "objective",
            Tone::Formal => "formal",
            Tone::Analytical => "analytical",
            Tone::Persuasive => "persuasive",
            Tone::Informative => "informative",
            Tone::Explanatory => "explanatory",
            Tone::Descriptive => "descriptive",
            Tone::Critical => "critical",
            Tone::Comparative => "comparative",
            Tone::Speculative => "speculative",
            Tone::Reflective => "reflective",
            Tone::Narrative => "narrative",
            Tone::Humorous => "humorous",
            Tone::Optimistic => "optimistic",
            Tone::Pessimistic => "pessimistic",
        }
    }

    /// Parse a tone name, falling back to [`Tone::Objective`].
    pub fn parse_or_default(s: &str) -> Self {
        let wanted = s.trim();
        Self::ALL
            .into_iter()
            .find(|t| t.as_str().eq_ignore_ascii_case(wanted))
            .unwrap_or_default()
    }
}

impl FromStr for Tone {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self::parse_or_default(s))
    }
}

impl From<String> for Tone {
    fn from(s: String) -> Self {
        Self::parse_or_default(&s)
    }
}

impl fmt::Display for Tone {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// User message for the research agent.
pub fn research_prompt(brief: &str) -> String {
    format!("## Brief\n{}\n\n## Task\nList the research notes for this brief.", brief.trim())
}

/// User message for the first draft.
pub fn draft_prompt(brief: &str, notes: Option<&str>, tone: Tone) -> String {
    let mut prompt = format!("## Brief\n{}\n\n", brief.trim());
    if let Some(notes) = notes.filter(|n| !n.trim().is_empty()) {
        prompt.push_str(&format!("## Research Notes\n{}\n\n", notes.trim()));
    }
    prompt.push_str(&format!("## Tone\nWrite in a {} tone.", tone));
    prompt
}

/// User message for a revision.
pub fn revision_prompt(brief: &str, content: &str, feedback: &str, tone: Tone) -> String {
    format!(
        "## Brief\n{}\n\n## Draft\n{}\n\n## Reviewer Feedback\n{}\n\n## Tone\nKeep a {} tone.",
        brief.trim(),
        content,
        feedback,
        tone
    )
}

/// User message for a semantic judgment.
///
/// Revision notes from the writer go in their own section so the judge can
/// weigh them, but the verdict is still about the draft text.
pub fn judge_prompt(criterion: &str, content: &str, notes: Option<&str>) -> String {
    let mut prompt = format!("## Criterion\n{}\n\n## Draft\n{}", criterion.trim(), content);
    if let Some(notes) = notes.filter(|n| !n.trim().is_empty()) {
        prompt.push_str(&format!("\n\n## Writer's Revision Notes\n{}", notes.trim()));
    }
    prompt
}

/// Split a revision reply into content and the writer's notes.
///
/// The notes start at the last line that reads exactly
/// [`REVISION_NOTES_MARKER`]. Replies without the marker are all content.
pub fn split_revision_notes(reply: &str) -> (&str, Option<&str>) {
    let mut offset = 0;
    let mut split = None;
    for line in reply.split_inclusive('\n') {
        if line.trim() == REVISION_NOTES_MARKER {
            split = Some((offset, offset + line.len()));
        }
        offset += line.len();
    }

    match split {
        Some((start, end)) => {
            let notes = reply[end..].trim();
            (
                reply[..start].trim_end(),
                if notes.is_empty() { None } else { Some(notes) },
            )
        }
        None => (reply, None),
    }
}
