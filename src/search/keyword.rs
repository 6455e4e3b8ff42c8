//! Field-weighted keyword engine.
//!
//! Approximates BM25 with regex hit counts: the query tokens become one
//! case-insensitive alternation, the store returns matching documents, and
//! the engine scores them by weighted per-field match counts.

use async_trait::async_trait;
use regex::{Regex, RegexBuilder};
use std::sync::Arc;

use crate::error::{Result, StoreError};
use crate::models::{MatchType, ResumeDocument, SearchResultItem};
use crate::search::{doc_to_item, leading_snippet, snippet_around, SearchEngine};
use crate::store::{DocumentStore, KeywordQueryPlan};

/// Per-field weights for the match-count score. Skills matches count most;
/// plain body text least. Company hits are returned but carry no weight.
const WEIGHT_TEXT: f32 = 1.0;
const WEIGHT_NAME: f32 = 2.0;
const WEIGHT_EMAIL: f32 = 1.5;
const WEIGHT_SKILLS: f32 = 3.0;
const WEIGHT_ROLE: f32 = 2.5;

/// Raw weighted count at which the normalized score saturates at 1.0.
const SCORE_SATURATION: f32 = 30.0;

pub struct KeywordEngine {
    store: Arc<dyn DocumentStore>,
}

impl KeywordEngine {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self { store }
    }
}

#[async_trait]
impl SearchEngine for KeywordEngine {
    async fn search(&self, query: &str, k: usize, trace: &str) -> Result<Vec<SearchResultItem>> {
        let Some(pattern) = token_alternation(query) else {
            return Ok(Vec::new());
        };
        let regex = RegexBuilder::new(&pattern)
            .case_insensitive(true)
            .build()
            .map_err(|e| StoreError::Query(format!("bad token pattern: {e}")))?;

        // Over-fetch so scoring can reorder within a larger pool.
        let plan = KeywordQueryPlan::all_fields(&pattern);
        let docs = self.store.keyword_query(&plan, k * 2).await?;
        tracing::debug!(trace, matched = docs.len(), "keyword query done");

        let mut items: Vec<SearchResultItem> = docs
            .iter()
            .map(|doc| {
                let score = normalized_score(&regex, doc);
                let snippet = match regex.find(&doc.text) {
                    Some(m) => snippet_around(&doc.text, m.start(), m.end()),
                    None => leading_snippet(&doc.text),
                };
                doc_to_item(doc, snippet, score, MatchType::Keyword)
            })
            .collect();

        // Stable sort keeps the adapter's insertion order for equal scores.
        items.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(std::cmp::Ordering::Equal));
        items.truncate(k);
        Ok(items)
    }
}

/// Build one case-insensitive alternation from whitespace-split tokens.
/// Returns None for an all-whitespace query.
fn token_alternation(query: &str) -> Option<String> {
    let tokens: Vec<String> = query.split_whitespace().map(regex::escape).collect();
    if tokens.is_empty() {
        None
    } else {
        Some(tokens.join("|"))
    }
}

fn count_in(regex: &Regex, haystack: &str) -> f32 {
    regex.find_iter(haystack).count() as f32
}

/// Weighted match count, normalized to [0, 1].
fn normalized_score(regex: &Regex, doc: &ResumeDocument) -> f32 {
    let skills = doc.skills.join(", ");
    let raw = WEIGHT_TEXT * count_in(regex, &doc.text)
        + WEIGHT_NAME * count_in(regex, &doc.name)
        + WEIGHT_EMAIL * count_in(regex, &doc.email)
        + WEIGHT_SKILLS * count_in(regex, &skills)
        + WEIGHT_ROLE * count_in(regex, &doc.role);
    (raw / SCORE_SATURATION).min(1.0)
}
