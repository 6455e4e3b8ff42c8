//! Conversational endpoint.
//!
//! First message in a conversation runs the full hybrid pipeline and caches
//! the structured results; follow-ups that narrow those results take the
//! filter path and never touch the document store.

use std::time::Instant;

use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use uuid::Uuid;

use crate::api::{to_api_error, ApiError};
use crate::llm::filter::matches_filter_intent;
use crate::models::{ChatMessage, ChatRequest, ChatResponse, ChatSearchMetadata, SearchType};
use crate::state::AppState;

/// Reusable chat entry point, also exercised directly by tests.
pub async fn run_chat(state: &AppState, req: ChatRequest) -> Result<ChatResponse, ApiError> {
    let message = req.message.trim().to_string();
    if message.is_empty() {
        return Err((StatusCode::BAD_REQUEST, "message is required".to_string()));
    }
    if req.top_k == 0 {
        return Err((StatusCode::BAD_REQUEST, "topK must be positive".to_string()));
    }

    let pipeline = state
        .pipeline
        .as_ref()
        .ok_or_else(|| to_api_error(crate::error::Error::PipelineNotReady))?;

    // A client-supplied id signals a follow-up even without a filter phrase.
    let (conversation_id, client_supplied) = match req.conversation_id.as_deref() {
        Some(id) if !id.trim().is_empty() => (id.trim().to_string(), true),
        _ => (Uuid::new_v4().to_string(), false),
    };

    let conversation = state.conversations.get_or_create(&conversation_id);
    // Held for the whole request: messages on one conversation serialize here.
    let mut memory = conversation.memory.lock().await;

    let trace = Uuid::new_v4().to_string();
    let started = Instant::now();

    let use_filter = memory.has_results()
        && (client_supplied
            || matches_filter_intent(&message, &state.config.filter_intent_phrases));

    let (response_text, results, search_type) = if use_filter {
        let history: Vec<ChatMessage> = if req.include_history {
            memory
                .messages()
                .map(|turn| ChatMessage {
                    role: turn.role.to_string(),
                    content: turn.content.clone(),
                })
                .collect()
        } else {
            Vec::new()
        };

        let cached_count = memory.last_results().len();
        let (mut filtered, summary) = state
            .filter
            .filter(&message, memory.last_results(), &history, &trace)
            .await;
        filtered.truncate(req.top_k);

        let text = if summary.is_empty() {
            format!("{} of {cached_count} previous candidates match.", filtered.len())
        } else {
            summary
        };
        // The cache keeps the last non-filter retrieval; filters never replace it.
        (text, filtered, "filter")
    } else {
        let outcome = pipeline
            .search(&message, SearchType::Hybrid, req.top_k, &trace)
            .await
            .map_err(to_api_error)?;

        let text = outcome
            .analysis
            .as_ref()
            .map(|a| a.summary.clone())
            .filter(|s| !s.is_empty())
            .unwrap_or_else(|| {
                format!("Found {} matching candidates.", outcome.results.len())
            });
        memory.set_last_results(outcome.results.clone());
        (text, outcome.results, "hybrid")
    };

    memory.add_exchange(&message, &response_text);
    let message_count = memory.message_count();
    drop(memory);

    Ok(ChatResponse {
        response: response_text,
        conversation_id,
        message_count,
        model: state.chat.model().to_string(),
        provider: state.chat.provider().to_string(),
        search_metadata: ChatSearchMetadata {
            query: message,
            search_type: search_type.to_string(),
            result_count: results.len(),
            duration_ms: started.elapsed().as_millis() as u64,
        },
        search_results: results,
    })
}

/// POST /api/chat
pub async fn chat(
    State(state): State<AppState>,
    Json(req): Json<ChatRequest>,
) -> Result<Json<ChatResponse>, ApiError> {
    let response = run_chat(&state, req).await?;
    Ok(Json(response))
}
