//! Snapshot-backed in-memory resume store.
//!
//! The ingestion path (out of scope here) writes a JSON array of resume
//! documents; this store loads it once at startup and serves keyword and
//! vector queries from memory. Brute-force cosine is fine at resume-corpus
//! scale.

use async_trait::async_trait;
use parking_lot::RwLock;
use regex::RegexBuilder;
use std::path::Path;

use crate::config::StoreConfig;
use crate::error::StoreError;
use crate::models::ResumeDocument;
use crate::store::{field_text, DocumentStore, KeywordQueryPlan};

#[derive(Debug)]
pub struct JsonResumeStore {
    documents: RwLock<Vec<ResumeDocument>>,
    /// Name of the vector index the ingestion path built; empty means knn
    /// queries are unsupported.
    vector_index: String,
}

impl JsonResumeStore {
    /// Load the snapshot at `{uri}/{database}/{collection}.json`.
    pub fn open(config: &StoreConfig) -> Result<Self, StoreError> {
        let path = Path::new(&config.uri)
            .join(&config.database)
            .join(format!("{}.json", config.collection));
        let data = std::fs::read_to_string(&path).map_err(|e| {
            StoreError::Load(format!("cannot read {}: {e}", path.display()))
        })?;
        let documents: Vec<ResumeDocument> = serde_json::from_str(&data)
            .map_err(|e| StoreError::Load(format!("malformed snapshot {}: {e}", path.display())))?;

        tracing::info!(
            "Loaded {} resumes from {}",
            documents.len(),
            path.display()
        );

        Ok(Self {
            documents: RwLock::new(documents),
            vector_index: config.vector_index.clone(),
        })
    }

    /// Build a store directly from documents. Used by tests and tools that
    /// already hold the corpus.
    pub fn from_documents(documents: Vec<ResumeDocument>, vector_index: &str) -> Self {
        Self {
            documents: RwLock::new(documents),
            vector_index: vector_index.to_string(),
        }
    }

    pub fn document_count(&self) -> usize {
        self.documents.read().len()
    }
}

#[async_trait]
impl DocumentStore for JsonResumeStore {
    async fn keyword_query(
        &self,
        plan: &KeywordQueryPlan,
        limit: usize,
    ) -> Result<Vec<ResumeDocument>, StoreError> {
        let regex = RegexBuilder::new(&plan.pattern)
            .case_insensitive(true)
            .build()
            .map_err(|e| StoreError::Query(format!("bad pattern {:?}: {e}", plan.pattern)))?;

        let documents = self.documents.read();
        let mut hits = Vec::new();
        for doc in documents.iter() {
            let matched = plan
                .fields
                .iter()
                .any(|&field| regex.is_match(&field_text(doc, field)));
            if matched {
                hits.push(doc.clone());
                if hits.len() >= limit {
                    break;
                }
            }
        }
        Ok(hits)
    }

    async fn vector_query(
        &self,
        vector: &[f32],
        k: usize,
    ) -> Result<Vec<(ResumeDocument, f32)>, StoreError> {
        if self.vector_index.is_empty() {
            return Err(StoreError::VectorIndexUnavailable(
                "no vector index configured for this collection".to_string(),
            ));
        }

        let documents = self.documents.read();
        let mut scored: Vec<(ResumeDocument, f32)> = documents
            .iter()
            .filter(|d| !d.embedding.is_empty())
            .map(|d| (d.clone(), cosine_similarity(vector, &d.embedding)))
            .collect();

        scored.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));
        scored.truncate(k);
        Ok(scored)
    }
}

fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }

    let mut dot = 0.0f32;
    let mut norm_a = 0.0f32;
    let mut norm_b = 0.0f32;

    for i in 0..a.len() {
        dot += a[i] * b[i];
        norm_a += a[i] * a[i];
        norm_b += b[i] * b[i];
    }

    let denom = norm_a.sqrt() * norm_b.sqrt();
    if denom == 0.0 {
        0.0
    } else {
        dot / denom
    }
}
