//! Two-stage retrieval pipeline: candidate generation through one of the
//! engines, then optional LLM re-ranking, then the caller's top-K cut.

use std::sync::Arc;

use crate::config::RerankConfig;
use crate::error::Result;
use crate::llm::rerank::{RerankAnalysis, Reranker};
use crate::models::{HybridWeights, LlmAnalysis, SearchResultItem, SearchType};
use crate::search::hybrid::HybridEngine;
use crate::search::keyword::KeywordEngine;
use crate::search::vector::VectorEngine;
use crate::search::SearchEngine;

/// Results plus whatever the re-ranker had to say about them.
#[derive(Debug, Default)]
pub struct SearchOutcome {
    pub results: Vec<SearchResultItem>,
    pub analysis: Option<RerankAnalysis>,
}

pub struct RetrievalPipeline {
    keyword: Arc<KeywordEngine>,
    vector: Arc<VectorEngine>,
    hybrid: Arc<HybridEngine>,
    reranker: Reranker,
    rerank: RerankConfig,
}

impl RetrievalPipeline {
    pub fn new(
        keyword: Arc<KeywordEngine>,
        vector: Arc<VectorEngine>,
        hybrid: Arc<HybridEngine>,
        reranker: Reranker,
        rerank: RerankConfig,
    ) -> Self {
        Self {
            keyword,
            vector,
            hybrid,
            reranker,
            rerank,
        }
    }

    pub fn hybrid_weights(&self) -> HybridWeights {
        self.hybrid.weights()
    }

    pub fn update_hybrid_weights(&self, weights: HybridWeights) {
        self.hybrid.update_weights(weights);
    }

    /// Run a search. Returns at most `k` results sorted by effective score;
    /// `match_type` reflects the last stage that owned the ranking.
    pub async fn search(
        &self,
        query: &str,
        search_type: SearchType,
        k: usize,
        trace: &str,
    ) -> Result<SearchOutcome> {
        // Fetch extra headroom when the re-ranker gets to filter afterwards.
        let fetch = if self.rerank.enabled {
            self.rerank.retrieval_top_k.max(k)
        } else {
            k
        };

        let engine: &dyn SearchEngine = match search_type {
            SearchType::Keyword => self.keyword.as_ref(),
            SearchType::Vector => self.vector.as_ref(),
            SearchType::Hybrid => self.hybrid.as_ref(),
        };
        let mut results = engine.search(query, fetch, trace).await?;

        let mut analysis = None;
        if self.rerank.enabled && !results.is_empty() {
            let (reranked, rerank_analysis) =
                self.reranker.rerank_and_filter(query, results, trace).await;
            results = reranked;
            analysis = Some(rerank_analysis);
        }

        results.truncate(k);

        if let Some(analysis) = &analysis {
            attach_analysis(&mut results, analysis);
        }

        tracing::debug!(
            trace,
            search_type = search_type.as_str(),
            returned = results.len(),
            "pipeline search done"
        );
        Ok(SearchOutcome { results, analysis })
    }
}

/// Copy each verdict's reasoning and extracted info into a per-result
/// `llmAnalysis` object, matched by name. The re-ranker already stored the
/// same data on the item itself; both fields are emitted on the wire.
fn attach_analysis(results: &mut [SearchResultItem], analysis: &RerankAnalysis) {
    for item in results.iter_mut() {
        if let Some(verdict) = analysis.verdicts.iter().find(|v| v.name == item.name) {
            item.llm_analysis = Some(LlmAnalysis {
                reasoning: verdict.reasoning.clone(),
                extracted_info: verdict.extracted_info.clone(),
            });
        }
    }
}
