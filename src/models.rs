use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A resume document as written by the ingestion path. Read-only here.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResumeDocument {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub phone: String,
    pub role: String,
    pub skills: Vec<String>,
    pub company: String,
    /// Full extracted resume text.
    pub text: String,
    /// Fixed-dimension embedding; empty when the document was never embedded.
    #[serde(default)]
    pub embedding: Vec<f32>,
}

/// Which stage last owned the ranking of a result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum MatchType {
    Keyword,
    Vector,
    Hybrid,
    LlmReranked,
}

/// Search mode requested by the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SearchType {
    Keyword,
    Vector,
    Hybrid,
}

impl SearchType {
    pub fn as_str(&self) -> &'static str {
        match self {
            SearchType::Keyword => "keyword",
            SearchType::Vector => "vector",
            SearchType::Hybrid => "hybrid",
        }
    }
}

/// Structured fields the re-ranker extracts from a resume. Evidence-based
/// strings from the LLM, not guarantees.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExtractedInfo {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub current_company: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub skills: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub experience: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub key_highlights: Vec<String>,
}

/// Re-rank metadata the pipeline attaches alongside the per-item fields the
/// re-ranker already set. Both are emitted on the wire.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LlmAnalysis {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reasoning: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub extracted_info: Option<ExtractedInfo>,
}

/// A single ranked result.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchResultItem {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub phone: String,
    /// Display snippet, at most 200 characters.
    pub snippet: String,
    /// Normalized to [0, 1]; only comparable within one result list.
    pub score: f32,
    pub match_type: MatchType,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub extracted_info: Option<ExtractedInfo>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub llm_reasoning: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub llm_analysis: Option<LlmAnalysis>,
    /// Full resume text carried for the re-rank and filter prompts; never
    /// serialized to callers.
    #[serde(skip)]
    pub content: String,
}

/// One message on the chat model wire.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: String,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: "system".to_string(),
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: "user".to_string(),
            content: content.into(),
        }
    }
}

/// Hybrid fusion weights. Soft invariant: the pair sums to ~1.0.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HybridWeights {
    pub vector_weight: f32,
    pub keyword_weight: f32,
}

impl Default for HybridWeights {
    fn default() -> Self {
        Self {
            vector_weight: 0.7,
            keyword_weight: 0.3,
        }
    }
}

// ─── API request/response types ──────────────────────────

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchRequest {
    pub query: String,
    #[serde(default = "default_search_type")]
    pub search_type: SearchType,
    #[serde(default = "default_search_top_k")]
    pub top_k: usize,
}

fn default_search_type() -> SearchType {
    SearchType::Hybrid
}

fn default_search_top_k() -> usize {
    3
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchResponse {
    pub query: String,
    pub search_type: SearchType,
    pub top_k: usize,
    pub result_count: usize,
    #[serde(rename = "duration_ms")]
    pub duration_ms: u64,
    pub results: Vec<SearchResultItem>,
    pub metadata: SearchResponseMetadata,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchResponseMetadata {
    pub trace_id: Uuid,
    /// Present only for hybrid searches.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hybrid_weights: Option<HybridWeights>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatRequest {
    pub message: String,
    pub conversation_id: Option<String>,
    #[serde(default = "default_true")]
    pub include_history: bool,
    #[serde(default = "default_chat_top_k")]
    pub top_k: usize,
}

fn default_true() -> bool {
    true
}

fn default_chat_top_k() -> usize {
    10
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatResponse {
    pub response: String,
    pub conversation_id: String,
    pub message_count: usize,
    pub model: String,
    pub provider: String,
    pub search_results: Vec<SearchResultItem>,
    pub search_metadata: ChatSearchMetadata,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatSearchMetadata {
    pub query: String,
    /// "hybrid" for fresh retrievals, "filter" for the cached-results path.
    pub search_type: String,
    pub result_count: usize,
    #[serde(rename = "duration_ms")]
    pub duration_ms: u64,
}

/// One turn in a conversation history response.
#[derive(Debug, Clone, Serialize)]
pub struct HistoryMessage {
    pub role: String,
    pub content: String,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryResponse {
    pub conversation_id: String,
    pub messages: Vec<HistoryMessage>,
    pub message_count: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_match_type_wire_names() {
        assert_eq!(
            serde_json::to_string(&MatchType::LlmReranked).unwrap(),
            "\"llm-reranked\""
        );
        assert_eq!(serde_json::to_string(&MatchType::Keyword).unwrap(), "\"keyword\"");
        assert_eq!(serde_json::to_string(&MatchType::Hybrid).unwrap(), "\"hybrid\"");
    }

    #[test]
    fn test_search_type_roundtrip() {
        let ty: SearchType = serde_json::from_str("\"vector\"").unwrap();
        assert_eq!(ty, SearchType::Vector);
        assert_eq!(ty.as_str(), "vector");
    }

    #[test]
    fn test_search_request_defaults() {
        let req: SearchRequest = serde_json::from_str(r#"{"query": "QA engineers"}"#).unwrap();
        assert_eq!(req.search_type, SearchType::Hybrid);
        assert_eq!(req.top_k, 3);
    }

    #[test]
    fn test_chat_request_defaults() {
        let req: ChatRequest = serde_json::from_str(r#"{"message": "hi"}"#).unwrap();
        assert!(req.conversation_id.is_none());
        assert!(req.include_history);
        assert_eq!(req.top_k, 10);
    }

    #[test]
    fn test_result_item_content_not_serialized() {
        let item = SearchResultItem {
            id: Uuid::new_v4(),
            name: "Asha Rao".into(),
            email: "asha@example.com".into(),
            phone: "+91 98x".into(),
            snippet: "snippet".into(),
            score: 0.5,
            match_type: MatchType::Hybrid,
            extracted_info: None,
            llm_reasoning: None,
            llm_analysis: None,
            content: "full resume text".into(),
        };
        let json = serde_json::to_string(&item).unwrap();
        assert!(!json.contains("full resume text"));
        assert!(json.contains("\"matchType\":\"hybrid\""));
        assert!(!json.contains("llmReasoning"));
    }

    #[test]
    fn test_extracted_info_camel_case() {
        let info = ExtractedInfo {
            current_company: Some("Acme".into()),
            key_highlights: vec!["Led a team of 4".into()],
            ..Default::default()
        };
        let json = serde_json::to_string(&info).unwrap();
        assert!(json.contains("currentCompany"));
        assert!(json.contains("keyHighlights"));
    }
}
