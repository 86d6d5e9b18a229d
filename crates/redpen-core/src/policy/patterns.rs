//! Shared detection patterns for guideline checks.
//!
//! The citation and placeholder patterns are used by more than one check
//! kind, so they live here rather than next to a single check.

use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    // =========================================================================
    // CITATION PATTERNS
    // =========================================================================

    /// Bare http(s) URL
    pub static ref URL_PATTERN: Regex = Regex::new(
        r#"https?://[^\s<>()\[\]"']+"#
    ).unwrap();

    /// Numeric reference marker: [1], [12], [3, 4]
    pub static ref NUMERIC_REFERENCE_PATTERN: Regex = Regex::new(
        r"\[\d+(?:\s*[,\x{2013}-]\s*\d+)*\]"
    ).unwrap();

    /// Author-year citation: (Smith, 2021), (Smith et al., 2019), (Lee & Park 2020)
    pub static ref AUTHOR_YEAR_PATTERN: Regex = Regex::new(
        r"\([A-Z][A-Za-z'\-]+(?:\s+et al\.)?(?:\s*(?:&|and)\s*[A-Z][A-Za-z'\-]+)?,?\s+(?:19|20)\d{2}[a-z]?\)"
    ).unwrap();

    // =========================================================================
    // STRUCTURE PATTERNS
    // =========================================================================

    /// Markdown ATX heading; captures the heading text
    pub static ref HEADING_PATTERN: Regex = Regex::new(
        r"(?m)^\s{0,3}#{1,6}\s+(?P<title>.+?)\s*#*\s*$"
    ).unwrap();

    /// A word for counting purposes
    pub static ref WORD_PATTERN: Regex = Regex::new(
        r"[\p{L}\p{N}]+(?:['\x{2019}\-][\p{L}\p{N}]+)*"
    ).unwrap();

    // =========================================================================
    // UNFINISHED-DRAFT PATTERNS
    // =========================================================================

    /// Placeholder text left behind by a drafting pass
    pub static ref PLACEHOLDER_PATTERN: Regex = Regex::new(
        r"(?i)\b(TODO|TBD|FIXME|XXX)\b|lorem ipsum|\[citation needed\]|\[insert [^\]]*\]"
    ).unwrap();
}

/// Count citations of every supported form.
pub fn count_citations(content: &str) -> usize {
    URL_PATTERN.find_iter(content).count()
        + NUMERIC_REFERENCE_PATTERN.find_iter(content).count()
        + AUTHOR_YEAR_PATTERN.find_iter(content).count()
}

/// Count words in content.
pub fn count_words(content: &str) -> usize {
    WORD_PATTERN.find_iter(content).count()
}

/// Lower-cased heading titles in document order.
pub fn headings(content: &str) -> Vec<String> {
    HEADING_PATTERN
        .captures_iter(content)
        .filter_map(|c| c.name("title"))
        .map(|m| m.as_str().trim().to_lowercase())
        .collect()
}

/// First placeholder found in content, if any.
pub fn find_placeholder(content: &str) -> Option<&str> {
    PLACEHOLDER_PATTERN.find(content).map(|m| m.as_str())
}
