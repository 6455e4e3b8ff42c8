use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;

use crate::api::{to_api_error, ApiError};
use crate::error::Error;
use crate::models::{HistoryMessage, HistoryResponse};
use crate::state::AppState;

/// GET /api/conversations/{id}/history
pub async fn history(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<HistoryResponse>, ApiError> {
    let conversation = state
        .conversations
        .get(&id)
        .ok_or_else(|| to_api_error(Error::UnknownConversation(id.clone())))?;

    let memory = conversation.memory.lock().await;
    let messages: Vec<HistoryMessage> = memory
        .messages()
        .map(|turn| HistoryMessage {
            role: turn.role.to_string(),
            content: turn.content.clone(),
            timestamp: turn.timestamp,
        })
        .collect();

    Ok(Json(HistoryResponse {
        message_count: messages.len(),
        conversation_id: id,
        messages,
    }))
}

/// DELETE /api/conversations/{id}
pub async fn delete(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    if state.conversations.remove(&id) {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(to_api_error(Error::UnknownConversation(id)))
    }
}
