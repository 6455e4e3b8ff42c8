//! LLM-facing components: the chat and embedding clients, the second-stage
//! re-ranker, and the conversational result filter.

pub mod chat;
pub mod embeddings;
pub mod filter;
pub mod rerank;

use async_trait::async_trait;

use crate::error::ChatError;
use crate::models::ChatMessage;

/// One-shot completion client. Stateless and safe for concurrent calls; the
/// client knows nothing about JSON; callers put formatting instructions in
/// their prompts.
#[async_trait]
pub trait ChatClient: Send + Sync {
    fn provider(&self) -> &str;
    fn model(&self) -> &str;
    async fn complete(&self, messages: &[ChatMessage]) -> Result<String, ChatError>;
}

/// Unwrap the first triple-backtick fence (optionally tagged `json`) from an
/// LLM response, or return the trimmed body when there is no fence. Models
/// wrap JSON in markdown often enough that every structured caller needs
/// this.
pub fn extract_json_block(content: &str) -> &str {
    let trimmed = content.trim();
    let Some(fence_start) = trimmed.find("```") else {
        return trimmed;
    };

    let after_fence = &trimmed[fence_start + 3..];
    // Skip a language tag on the fence line.
    let body_start = match after_fence.find('\n') {
        Some(newline) => {
            let tag = after_fence[..newline].trim();
            if tag.is_empty() || tag.eq_ignore_ascii_case("json") {
                newline + 1
            } else {
                0
            }
        }
        None => 0,
    };

    let body = &after_fence[body_start..];
    match body.find("```") {
        Some(end) => body[..end].trim(),
        None => body.trim(),
    }
}
