//! Query embedding client.
//!
//! Only queries are embedded here; document embeddings are produced by the
//! ingestion path. The vector length is checked against the configured
//! dimension on every call since a mismatched vector would quietly wreck the
//! similarity geometry.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::config::LlmConfig;
use crate::error::EmbedError;

/// Maximum characters to send per text to the embedding API. Keeps dense
/// queries safely under typical 8 192-token embedding contexts.
const MAX_EMBED_CHARS: usize = 3_000;

#[async_trait]
pub trait EmbeddingClient: Send + Sync {
    /// Fixed process-wide embedding dimension.
    fn dimension(&self) -> usize;

    /// Map a text to a vector of exactly `dimension()` floats.
    async fn embed(&self, text: &str) -> Result<Vec<f32>, EmbedError>;
}

pub struct HttpEmbeddingClient {
    client: reqwest::Client,
    config: LlmConfig,
}

impl HttpEmbeddingClient {
    pub fn new(client: reqwest::Client, config: LlmConfig) -> Self {
        Self { client, config }
    }
}

#[async_trait]
impl EmbeddingClient for HttpEmbeddingClient {
    fn dimension(&self) -> usize {
        self.config.embedding_dim
    }

    async fn embed(&self, text: &str) -> Result<Vec<f32>, EmbedError> {
        let input = truncate_for_embedding(text, MAX_EMBED_CHARS);

        let vector = match self.config.provider.as_str() {
            "ollama" => embed_ollama(&self.client, &self.config, input).await?,
            "openai" => embed_openai(&self.client, &self.config, input).await?,
            other => return Err(EmbedError::UnknownProvider(other.to_string())),
        };

        if vector.len() != self.config.embedding_dim {
            return Err(EmbedError::DimensionMismatch {
                expected: self.config.embedding_dim,
                got: vector.len(),
            });
        }
        Ok(vector)
    }
}

/// Truncate `text` to at most `max_chars` bytes, splitting on a UTF-8 char
/// boundary.
fn truncate_for_embedding(text: &str, max_chars: usize) -> &str {
    if text.len() <= max_chars {
        return text;
    }
    let mut end = max_chars;
    while !text.is_char_boundary(end) {
        end -= 1;
    }
    &text[..end]
}

// ─── Ollama ──────────────────────────────────────────────

#[derive(Serialize)]
struct OllamaEmbedRequest<'a> {
    model: &'a str,
    input: &'a str,
    /// Ask Ollama to silently truncate over-length inputs instead of 400ing.
    truncate: bool,
}

#[derive(Deserialize)]
struct OllamaEmbedResponse {
    embeddings: Vec<Vec<f32>>,
}

async fn embed_ollama(
    client: &reqwest::Client,
    config: &LlmConfig,
    text: &str,
) -> Result<Vec<f32>, EmbedError> {
    let url = format!("{}/api/embed", config.base_url);

    let req = OllamaEmbedRequest {
        model: &config.embedding_model,
        input: text,
        truncate: true,
    };

    let resp = client
        .post(&url)
        .json(&req)
        .send()
        .await
        .map_err(|e| EmbedError::Transport(e.to_string()))?;

    if !resp.status().is_success() {
        let status = resp.status().as_u16();
        let body = resp.text().await.unwrap_or_default();
        return Err(EmbedError::Provider { status, body });
    }

    let body: OllamaEmbedResponse = resp
        .json()
        .await
        .map_err(|e| EmbedError::Transport(format!("bad Ollama embed response: {e}")))?;
    body.embeddings.into_iter().next().ok_or(EmbedError::Empty)
}

// ─── OpenAI-compatible ───────────────────────────────────

#[derive(Serialize)]
struct OpenAiEmbedRequest<'a> {
    model: &'a str,
    input: &'a str,
}

#[derive(Deserialize)]
struct OpenAiEmbedResponse {
    data: Vec<OpenAiEmbedData>,
}

#[derive(Deserialize)]
struct OpenAiEmbedData {
    embedding: Vec<f32>,
}

async fn embed_openai(
    client: &reqwest::Client,
    config: &LlmConfig,
    text: &str,
) -> Result<Vec<f32>, EmbedError> {
    let url = format!("{}/v1/embeddings", config.base_url);
    let api_key = config.api_key.as_deref().unwrap_or_default();

    let req = OpenAiEmbedRequest {
        model: &config.embedding_model,
        input: text,
    };

    let resp = client
        .post(&url)
        .header("Authorization", format!("Bearer {api_key}"))
        .json(&req)
        .send()
        .await
        .map_err(|e| EmbedError::Transport(e.to_string()))?;

    if !resp.status().is_success() {
        let status = resp.status().as_u16();
        let body = resp.text().await.unwrap_or_default();
        return Err(EmbedError::Provider { status, body });
    }

    let body: OpenAiEmbedResponse = resp
        .json()
        .await
        .map_err(|e| EmbedError::Transport(format!("bad OpenAI embed response: {e}")))?;
    body.data
        .into_iter()
        .next()
        .map(|d| d.embedding)
        .ok_or(EmbedError::Empty)
}
