use std::time::Instant;

use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use uuid::Uuid;

use crate::api::{to_api_error, ApiError};
use crate::models::{SearchRequest, SearchResponse, SearchResponseMetadata, SearchType};
use crate::state::AppState;

/// Reusable search entry point, also exercised directly by tests.
pub async fn run_search(state: &AppState, req: SearchRequest) -> Result<SearchResponse, ApiError> {
    let query = req.query.trim().to_string();
    if query.is_empty() {
        return Err((StatusCode::BAD_REQUEST, "query is required".to_string()));
    }
    if req.top_k == 0 {
        return Err((StatusCode::BAD_REQUEST, "topK must be positive".to_string()));
    }

    let pipeline = state
        .pipeline
        .as_ref()
        .ok_or_else(|| to_api_error(crate::error::Error::PipelineNotReady))?;

    let trace_id = Uuid::new_v4();
    let started = Instant::now();

    let outcome = pipeline
        .search(&query, req.search_type, req.top_k, &trace_id.to_string())
        .await
        .map_err(to_api_error)?;

    let hybrid_weights = match req.search_type {
        SearchType::Hybrid => Some(pipeline.hybrid_weights()),
        _ => None,
    };

    Ok(SearchResponse {
        result_count: outcome.results.len(),
        duration_ms: started.elapsed().as_millis() as u64,
        results: outcome.results,
        query,
        search_type: req.search_type,
        top_k: req.top_k,
        metadata: SearchResponseMetadata {
            trace_id,
            hybrid_weights,
        },
    })
}

/// POST /api/search
pub async fn search(
    State(state): State<AppState>,
    Json(req): Json<SearchRequest>,
) -> Result<Json<SearchResponse>, ApiError> {
    let response = run_search(&state, req).await?;
    Ok(Json(response))
}
