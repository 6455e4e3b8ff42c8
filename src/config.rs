use serde::{Deserialize, Serialize};

use crate::models::HybridWeights;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Server bind address
    pub bind_addr: String,
    /// Document store connection
    pub store: StoreConfig,
    /// LLM provider configuration (chat + embeddings)
    pub llm: LlmConfig,
    /// Hybrid fusion weights
    pub hybrid: HybridWeights,
    /// Second-stage re-ranking configuration
    pub rerank: RerankConfig,
    /// Maximum messages retained per conversation
    pub max_conversation_messages: usize,
    /// Phrases that flag a chat message as a filter follow-up
    pub filter_intent_phrases: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreConfig {
    /// Root of the store (directory holding the ingested snapshot)
    pub uri: String,
    /// Database name
    pub database: String,
    /// Collection name
    pub collection: String,
    /// Name of the vector index; empty means knn is unavailable
    pub vector_index: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmConfig {
    /// "ollama" or "openai"
    pub provider: String,
    /// Base URL for the LLM API
    pub base_url: String,
    /// Model name for chat, re-ranking and filtering
    pub chat_model: String,
    /// Model name for embeddings
    pub embedding_model: String,
    /// API key (only needed for cloud providers)
    pub api_key: Option<String>,
    /// Embedding vector dimension
    pub embedding_dim: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RerankConfig {
    /// When false, retrieval results are returned as ranked by the engines.
    pub enabled: bool,
    /// Candidates fetched for the re-ranker; the caller's topK trims after.
    pub retrieval_top_k: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            bind_addr: "127.0.0.1:9100".to_string(),
            store: StoreConfig::default(),
            llm: LlmConfig::default(),
            hybrid: HybridWeights::default(),
            rerank: RerankConfig::default(),
            max_conversation_messages: 10,
            filter_intent_phrases: default_filter_intent_phrases(),
        }
    }
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            uri: "./data".to_string(),
            database: "resumedb".to_string(),
            collection: "resumes".to_string(),
            vector_index: "resume_embedding_index".to_string(),
        }
    }
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            provider: "ollama".to_string(),
            base_url: "http://localhost:11434".to_string(),
            chat_model: "llama3.2".to_string(),
            embedding_model: "mxbai-embed-large".to_string(),
            api_key: None,
            embedding_dim: 1024,
        }
    }
}

impl Default for RerankConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            retrieval_top_k: 10,
        }
    }
}

/// Substrings that mark a chat message as narrowing previous results rather
/// than asking a fresh question. English-only; kept in configuration because
/// of that brittleness.
fn default_filter_intent_phrases() -> Vec<String> {
    [
        "only",
        "filter",
        "show me",
        "display",
        "from those",
        "from the above",
        "from previous",
        "from these",
        "among them",
        "out of these",
        "narrow down",
        "refine",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect()
}

impl Config {
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Ok(addr) = std::env::var("RESUME_SEARCH_BIND_ADDR") {
            config.bind_addr = addr;
        }
        if let Ok(uri) = std::env::var("RESUME_SEARCH_STORE_URI") {
            config.store.uri = uri;
        }
        if let Ok(db) = std::env::var("RESUME_SEARCH_DB") {
            config.store.database = db;
        }
        if let Ok(coll) = std::env::var("RESUME_SEARCH_COLLECTION") {
            config.store.collection = coll;
        }
        if let Ok(index) = std::env::var("RESUME_SEARCH_VECTOR_INDEX") {
            config.store.vector_index = index;
        }
        if let Ok(provider) = std::env::var("LLM_PROVIDER") {
            config.llm.provider = provider;
        }
        if let Ok(url) = std::env::var("LLM_BASE_URL") {
            config.llm.base_url = url;
        }
        if let Ok(model) = std::env::var("LLM_CHAT_MODEL") {
            config.llm.chat_model = model;
        }
        if let Ok(model) = std::env::var("LLM_EMBEDDING_MODEL") {
            config.llm.embedding_model = model;
        }
        if let Ok(key) = std::env::var("LLM_API_KEY") {
            config.llm.api_key = Some(key);
        }
        if let Ok(dim) = std::env::var("LLM_EMBEDDING_DIM") {
            if let Ok(d) = dim.parse() {
                config.llm.embedding_dim = d;
            }
        }
        if let Ok(val) = std::env::var("HYBRID_VECTOR_WEIGHT") {
            if let Ok(w) = val.parse() {
                config.hybrid.vector_weight = w;
            }
        }
        if let Ok(val) = std::env::var("HYBRID_KEYWORD_WEIGHT") {
            if let Ok(w) = val.parse() {
                config.hybrid.keyword_weight = w;
            }
        }
        if let Ok(val) = std::env::var("RERANK_ENABLED") {
            config.rerank.enabled = matches!(val.as_str(), "1" | "true" | "yes");
        }
        if let Ok(val) = std::env::var("RERANK_TOP_K") {
            if let Ok(k) = val.parse() {
                config.rerank.retrieval_top_k = k;
            }
        }
        if let Ok(val) = std::env::var("MAX_CONVERSATION_HISTORY") {
            if let Ok(n) = val.parse() {
                config.max_conversation_messages = n;
            }
        }
        if let Ok(val) = std::env::var("FILTER_INTENT_PHRASES") {
            let phrases: Vec<String> = val
                .split(',')
                .map(|p| p.trim().to_string())
                .filter(|p| !p.is_empty())
                .collect();
            if !phrases.is_empty() {
                config.filter_intent_phrases = phrases;
            }
        }

        config
    }

    /// Path of the resume snapshot the ingestion path maintains.
    pub fn snapshot_path(&self) -> std::path::PathBuf {
        std::path::Path::new(&self.store.uri)
            .join(&self.store.database)
            .join(format!("{}.json", self.store.collection))
    }
}
