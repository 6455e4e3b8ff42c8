//! Semantic vector engine: embed the query, run ANN search, clamp scores.

use async_trait::async_trait;
use std::sync::Arc;

use crate::error::Result;
use crate::llm::embeddings::EmbeddingClient;
use crate::models::{MatchType, SearchResultItem};
use crate::search::{doc_to_item, leading_snippet, SearchEngine};
use crate::store::DocumentStore;

pub struct VectorEngine {
    store: Arc<dyn DocumentStore>,
    embeddings: Arc<dyn EmbeddingClient>,
}

impl VectorEngine {
    pub fn new(store: Arc<dyn DocumentStore>, embeddings: Arc<dyn EmbeddingClient>) -> Self {
        Self { store, embeddings }
    }
}

#[async_trait]
impl SearchEngine for VectorEngine {
    async fn search(&self, query: &str, k: usize, trace: &str) -> Result<Vec<SearchResultItem>> {
        let vector = self.embeddings.embed(query).await?;
        let hits = self.store.vector_query(&vector, k).await?;
        tracing::debug!(trace, hits = hits.len(), "vector query done");

        // The store already ordered by similarity; cosine can dip below zero
        // for dissimilar pairs, so clamp into the score contract.
        Ok(hits
            .iter()
            .map(|(doc, raw)| {
                doc_to_item(
                    doc,
                    leading_snippet(&doc.text),
                    raw.clamp(0.0, 1.0),
                    MatchType::Vector,
                )
            })
            .collect())
    }
}
