//! Revision feedback composition.
//!
//! Turns a [`ComplianceResult`] into a verdict. Feedback has one line per
//! violation in guideline declaration order:
//!
//! ```text
//! Missing: cite sources (0 citations found, at least 1 required)
//! Missing: finished (placeholder "TODO" left in text)
//! ```

use crate::policy::{ComplianceResult, Violation};
use crate::verdict::{Feedback, ReviewVerdict};

/// Render a single violation as one feedback line.
pub fn feedback_line(violation: &Violation) -> String {
    let explanation = violation.explanation.trim();
    if explanation.is_empty() {
        format!("Missing: {}", violation.guideline_id)
    } else {
        // Explanations are single-line by construction; flatten model output.
        let flat = explanation.split_whitespace().collect::<Vec<_>>().join(" ");
        format!("Missing: {} ({})", violation.guideline_id, flat)
    }
}

/// Compose feedback for a set of violations; `None` when there are none.
pub fn compose_feedback(violations: &[Violation]) -> Option<Feedback> {
    let text = violations
        .iter()
        .map(feedback_line)
        .collect::<Vec<_>>()
        .join("\n");
    Feedback::new(text).ok()
}

/// Map a compliance result to the verdict it implies.
pub fn verdict_for(result: &ComplianceResult) -> ReviewVerdict {
    match compose_feedback(result.violations()) {
        Some(feedback) => ReviewVerdict::needs_revision(feedback),
        None => ReviewVerdict::Accepted,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn violation(id: &str, explanation: &str, position: usize) -> Violation {
        Violation {
            guideline_id: id.to_string(),
            explanation: explanation.to_string(),
            position,
        }
    }

    #[test]
    fn test_line_without_explanation() {
        assert_eq!(
            feedback_line(&violation("cite sources", "", 0)),
            "Missing: cite sources"
        );
    }

    #[test]
    fn test_line_with_multiline_explanation_is_flattened() {
        assert_eq!(
            feedback_line(&violation("tone", "too casual\nand  chatty", 0)),
            "Missing: tone (too casual and chatty)"
        );
    }

    #[test]
    fn test_compliant_maps_to_accepted() {
        assert_eq!(verdict_for(&ComplianceResult::Compliant), ReviewVerdict::Accepted);
    }

    #[test]
    fn test_violations_map_to_revision() {
        let result = ComplianceResult::from_violations(vec![
            violation("finished", "placeholder \"TODO\" left in text", 1),
            violation("cite sources", "", 0),
        ]);

        let verdict = verdict_for(&result);
        let feedback = verdict.feedback().unwrap();
        assert_eq!(
            feedback.as_str(),
            "Missing: cite sources\nMissing: finished (placeholder \"TODO\" left in text)"
        );
    }

    proptest! {
        #[test]
        fn prop_one_line_per_violation(ids in proptest::collection::vec("[a-z]{1,12}", 1..8),
                                       explanation in "[a-z \\n]{0,30}") {
            let violations: Vec<Violation> = ids
                .iter()
                .enumerate()
                .map(|(i, id)| violation(id, &explanation, i))
                .collect();

            let feedback = compose_feedback(&violations).unwrap();
            prop_assert_eq!(feedback.line_count(), violations.len());
            for v in &violations {
                let expected = format!("Missing: {}", v.guideline_id);
                prop_assert!(feedback.as_str().contains(&expected));
            }
        }
    }
}
