//! Judgment cache.
//!
//! Semantic judgments are cached by guideline, criterion, content, and
//! revision notes so evaluating the same draft twice asks the model once and
//! gives the same answer both times. Keys hold the full text; two drafts
//! never share a judgment.

use moka::future::Cache;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::judgment::Judgment;

/// Cache sizing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CacheConfig {
    pub max_entries: u64,

    #[serde(with = "crate::config::humantime_duration")]
    pub ttl: Duration,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            max_entries: 10_000,
            ttl: Duration::from_secs(3600),
        }
    }
}

/// Cache key for one semantic judgment.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct JudgmentKey {
    guideline_id: String,
    criterion: String,
    content: String,
    notes: Option<String>,
}

impl JudgmentKey {
    pub fn new(guideline_id: &str, criterion: &str, content: &str) -> Self {
        Self {
            guideline_id: guideline_id.to_string(),
            criterion: criterion.to_string(),
            content: content.to_string(),
            notes: None,
        }
    }

    /// Key for a judgment whose prompt also carried revision notes.
    pub fn with_notes(mut self, notes: Option<&str>) -> Self {
        self.notes = notes.map(str::to_string);
        self
    }
}

/// Judgment cache using moka.
#[derive(Clone)]
pub struct JudgmentCache {
    cache: Cache<JudgmentKey, Judgment>,
}

impl JudgmentCache {
    pub fn new(config: &CacheConfig) -> Self {
        let cache = Cache::builder()
            .max_capacity(config.max_entries)
            .time_to_live(config.ttl)
            .build();

        Self { cache }
    }

    pub async fn get(&self, key: &JudgmentKey) -> Option<Judgment> {
        self.cache.get(key).await
    }

    pub async fn insert(&self, key: JudgmentKey, judgment: Judgment) {
        self.cache.insert(key, judgment).await;
    }

    pub fn invalidate_all(&self) {
        self.cache.invalidate_all();
    }

    pub fn entry_count(&self) -> u64 {
        self.cache.entry_count()
    }
}

impl Default for JudgmentCache {
    fn default() -> Self {
        Self::new(&CacheConfig::default())
    }
}
