//! Guidelines policy: decides whether content complies with a guideline set.
//!
//! [`GuidelineEvaluator`] runs the deterministic checks from `redpen-core`
//! and sends each `semantic` guideline to the judge model. Provider failures
//! and unreadable judgments are errors, never findings.

use async_trait::async_trait;
use redpen_core::{evaluate_rules, ComplianceResult, EvaluationError, GuidelineSet, RuleOutcome, Violation};
use thiserror::Error;
use tracing::debug;

use crate::cache::{JudgmentCache, JudgmentKey};
use crate::judgment::{parse_judgment, Judgment, JudgmentError};
use crate::prompts::{judge_prompt, JUDGE_SYSTEM_PROMPT};
use crate::providers::ProviderError;
use crate::resilience::ResilientCaller;

/// Errors from policy evaluation.
#[derive(Error, Debug, Clone)]
pub enum PolicyError {
    #[error(transparent)]
    Core(#[from] EvaluationError),

    #[error("Judgment for guideline '{guideline_id}' failed: {source}")]
    Provider {
        guideline_id: String,
        #[source]
        source: ProviderError,
    },

    #[error("Unreadable judgment for guideline '{guideline_id}': {source}")]
    MalformedJudgment {
        guideline_id: String,
        #[source]
        source: JudgmentError,
    },

    #[error("Guideline '{guideline_id}' needs a judgment but no judge is configured")]
    JudgmentUnavailable { guideline_id: String },
}

/// Evaluates content against guidelines.
///
/// Implementations must be pure with respect to their inputs: the same
/// content and guidelines give the same result.
#[async_trait]
pub trait GuidelinesPolicy: Send + Sync {
    async fn evaluate(
        &self,
        content: &str,
        guidelines: &GuidelineSet,
    ) -> Result<ComplianceResult, PolicyError>;

    /// Evaluate a revised draft together with the writer's notes on it.
    ///
    /// Notes may inform model judgments; deterministic checks see only the
    /// content. The default ignores the notes.
    async fn evaluate_revision(
        &self,
        content: &str,
        notes: Option<&str>,
        guidelines: &GuidelineSet,
    ) -> Result<ComplianceResult, PolicyError> {
        let _ = notes;
        self.evaluate(content, guidelines).await
    }
}

/// Standard policy: deterministic checks plus optional model judgments.
#[derive(Clone)]
pub struct GuidelineEvaluator {
    judge: Option<ResilientCaller>,
    cache: JudgmentCache,
}

impl GuidelineEvaluator {
    /// Evaluator without a judge; semantic guidelines are an error.
    pub fn deterministic() -> Self {
        Self {
            judge: None,
            cache: JudgmentCache::default(),
        }
    }

    /// Evaluator that asks `judge` about semantic guidelines.
    pub fn with_judge(judge: ResilientCaller, cache: JudgmentCache) -> Self {
        Self {
            judge: Some(judge),
            cache,
        }
    }

    async fn judge(
        &self,
        guideline_id: &str,
        criterion: &str,
        content: &str,
        notes: Option<&str>,
    ) -> Result<Judgment, PolicyError> {
        let key = JudgmentKey::new(guideline_id, criterion, content).with_notes(notes);
        if let Some(cached) = self.cache.get(&key).await {
            debug!(guideline = guideline_id, "Judgment cache hit");
            return Ok(cached);
        }

        let judge = self
            .judge
            .as_ref()
            .ok_or_else(|| PolicyError::JudgmentUnavailable {
                guideline_id: guideline_id.to_string(),
            })?;

        let raw = judge
            .ask(JUDGE_SYSTEM_PROMPT, judge_prompt(criterion, content, notes))
            .await
            .map_err(|source| PolicyError::Provider {
                guideline_id: guideline_id.to_string(),
                source,
            })?;

        let judgment = parse_judgment(&raw, content).map_err(|source| PolicyError::MalformedJudgment {
            guideline_id: guideline_id.to_string(),
            source,
        })?;

        debug!(
            guideline = guideline_id,
            satisfied = judgment.satisfied,
            provider = judge.provider_name(),
            "Semantic judgment"
        );
        self.cache.insert(key, judgment.clone()).await;
        Ok(judgment)
    }
}

impl Default for GuidelineEvaluator {
    fn default() -> Self {
        Self::deterministic()
    }
}

#[async_trait]
impl GuidelinesPolicy for GuidelineEvaluator {
    async fn evaluate(
        &self,
        content: &str,
        guidelines: &GuidelineSet,
    ) -> Result<ComplianceResult, PolicyError> {
        self.evaluate_revision(content, None, guidelines).await
    }

    async fn evaluate_revision(
        &self,
        content: &str,
        notes: Option<&str>,
        guidelines: &GuidelineSet,
    ) -> Result<ComplianceResult, PolicyError> {
        let mut violations = Vec::new();

        for finding in evaluate_rules(content, guidelines)? {
            let explanation = match finding.outcome {
                RuleOutcome::Satisfied => continue,
                RuleOutcome::Violated { explanation } => explanation,
                RuleOutcome::NeedsJudgment { criterion } => {
                    let judgment = self.judge(&finding.guideline.id, &criterion, content, notes).await?;
                    if judgment.satisfied {
                        continue;
                    }
                    judgment.explanation
                }
            };

            violations.push(Violation {
                guideline_id: finding.guideline.id.clone(),
                explanation,
                position: finding.position,
            });
        }

        Ok(ComplianceResult::from_violations(violations))
    }
}
