//! Runtime configuration endpoints: read the effective retrieval settings
//! and adjust the hybrid fusion weights without a restart.

use axum::extract::State;
use axum::Json;
use serde::{Deserialize, Serialize};

use crate::api::{to_api_error, ApiError};
use crate::models::HybridWeights;
use crate::state::AppState;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfigResponse {
    pub provider: String,
    pub chat_model: String,
    pub embedding_model: String,
    pub embedding_dim: usize,
    pub hybrid_weights: Option<HybridWeights>,
    pub rerank_enabled: bool,
    pub rerank_top_k: usize,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WeightsUpdate {
    pub vector_weight: Option<f32>,
    pub keyword_weight: Option<f32>,
}

/// GET /api/config
pub async fn get_config(State(state): State<AppState>) -> Json<ConfigResponse> {
    Json(ConfigResponse {
        provider: state.config.llm.provider.clone(),
        chat_model: state.config.llm.chat_model.clone(),
        embedding_model: state.config.llm.embedding_model.clone(),
        embedding_dim: state.config.llm.embedding_dim,
        hybrid_weights: state.pipeline.as_ref().map(|p| p.hybrid_weights()),
        rerank_enabled: state.config.rerank.enabled,
        rerank_top_k: state.config.rerank.retrieval_top_k,
    })
}

/// PUT /api/config: update hybrid weights. Takes effect for searches
/// dispatched after the write; in-flight searches are untouched.
pub async fn update_config(
    State(state): State<AppState>,
    Json(update): Json<WeightsUpdate>,
) -> Result<Json<ConfigResponse>, ApiError> {
    let pipeline = state
        .pipeline
        .as_ref()
        .ok_or_else(|| to_api_error(crate::error::Error::PipelineNotReady))?;

    let current = pipeline.hybrid_weights();
    pipeline.update_hybrid_weights(HybridWeights {
        vector_weight: update.vector_weight.unwrap_or(current.vector_weight),
        keyword_weight: update.keyword_weight.unwrap_or(current.keyword_weight),
    });

    Ok(get_config(State(state)).await)
}
