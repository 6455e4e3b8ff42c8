//! Weighted hybrid fusion over the keyword and vector engines.
//!
//! Both engines run concurrently; their result lists merge into one mapping
//! keyed by candidate name, with each side's score scaled by its configured
//! weight.

use async_trait::async_trait;
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::Arc;

use crate::error::Result;
use crate::models::{HybridWeights, MatchType, SearchResultItem};
use crate::search::keyword::KeywordEngine;
use crate::search::vector::VectorEngine;
use crate::search::SearchEngine;

/// How far the pair may drift from summing to 1.0 before we log about it.
const WEIGHT_SUM_TOLERANCE: f32 = 0.01;

pub struct HybridEngine {
    keyword: Arc<KeywordEngine>,
    vector: Arc<VectorEngine>,
    weights: RwLock<HybridWeights>,
}

impl HybridEngine {
    pub fn new(
        keyword: Arc<KeywordEngine>,
        vector: Arc<VectorEngine>,
        weights: HybridWeights,
    ) -> Self {
        warn_on_weight_drift(&weights);
        Self {
            keyword,
            vector,
            weights: RwLock::new(weights),
        }
    }

    pub fn weights(&self) -> HybridWeights {
        *self.weights.read()
    }

    /// Replace the fusion weights. Applies to searches dispatched after the
    /// write; in-flight searches keep the snapshot they took at dispatch.
    pub fn update_weights(&self, weights: HybridWeights) {
        warn_on_weight_drift(&weights);
        *self.weights.write() = weights;
        tracing::info!(
            vector_weight = weights.vector_weight,
            keyword_weight = weights.keyword_weight,
            "hybrid weights updated"
        );
    }
}

fn warn_on_weight_drift(weights: &HybridWeights) {
    let sum = weights.vector_weight + weights.keyword_weight;
    if (sum - 1.0).abs() > WEIGHT_SUM_TOLERANCE {
        tracing::warn!(
            vector_weight = weights.vector_weight,
            keyword_weight = weights.keyword_weight,
            "hybrid weights sum to {sum}, expected ~1.0"
        );
    }
}

#[async_trait]
impl SearchEngine for HybridEngine {
    async fn search(&self, query: &str, k: usize, trace: &str) -> Result<Vec<SearchResultItem>> {
        // One consistent snapshot per search; updates race benignly.
        let weights = self.weights();
        let fetch = k * 3;

        let (keyword_hits, vector_hits) = tokio::join!(
            self.keyword.search(query, fetch, trace),
            self.vector.search(query, fetch, trace),
        );
        let keyword_hits = keyword_hits?;
        let vector_hits = vector_hits?;

        tracing::debug!(
            trace,
            keyword = keyword_hits.len(),
            vector = vector_hits.len(),
            "hybrid fan-out done"
        );

        Ok(merge_weighted(vector_hits, keyword_hits, weights, k))
    }
}

/// Fold both result lists into one ranking.
///
/// Identity is the candidate's `name`. That collides for duplicate names and
/// misses renamed duplicates; a stable document id would be the better key,
/// but name-keying is the established behavior callers rely on.
pub fn merge_weighted(
    vector_hits: Vec<SearchResultItem>,
    keyword_hits: Vec<SearchResultItem>,
    weights: HybridWeights,
    limit: usize,
) -> Vec<SearchResultItem> {
    let mut merged: Vec<SearchResultItem> = Vec::with_capacity(vector_hits.len() + keyword_hits.len());
    let mut slot_by_name: HashMap<String, usize> = HashMap::new();

    for mut hit in vector_hits {
        hit.score *= weights.vector_weight;
        hit.match_type = MatchType::Hybrid;
        slot_by_name.insert(hit.name.clone(), merged.len());
        merged.push(hit);
    }

    for mut hit in keyword_hits {
        let contribution = hit.score * weights.keyword_weight;
        match slot_by_name.get(&hit.name) {
            Some(&slot) => {
                let entry = &mut merged[slot];
                entry.score += contribution;
                if hit.snippet.len() > entry.snippet.len() {
                    entry.snippet = std::mem::take(&mut hit.snippet);
                }
            }
            None => {
                hit.score = contribution;
                hit.match_type = MatchType::Hybrid;
                slot_by_name.insert(hit.name.clone(), merged.len());
                merged.push(hit);
            }
        }
    }

    // Stable sort: equal scores keep vector-then-keyword insertion order.
    merged.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(std::cmp::Ordering::Equal));
    merged.truncate(limit);
    merged
}
