//! Second-stage LLM re-ranking.
//!
//! Candidates from the retrieval engines are packed into one prompt; the
//! model returns a per-candidate verdict (relevance, match/no-match,
//! reasoning, extracted facts) plus a summary. Verdicts that match keep and
//! re-score their candidate; the rest are dropped. On any LLM or parse
//! failure the input ranking is returned untouched: this stage may reorder
//! and filter, never lose candidates to an outage.

use serde::Deserialize;
use std::sync::Arc;

use crate::llm::{extract_json_block, ChatClient};
use crate::models::{ChatMessage, ExtractedInfo, MatchType, SearchResultItem};

/// How much of each resume the prompt carries.
const MAX_CANDIDATE_CHARS: usize = 3_000;

const SYSTEM_PROMPT: &str = "\
You are a resume screening assistant. You receive a search query and a \
numbered list of candidate resumes, and you must evaluate every candidate \
against the query.

Operate in one of two modes:

STRICT mode: the query contains concrete criteria (a city, a company name, \
a named skill, a minimum number of years, a certification):
- A candidate matches only when the resume text explicitly satisfies every \
criterion.
- Locations must appear as text in the resume. Never infer a location from \
a phone number prefix or from where a company is headquartered.
- Score relevance from 0.0 to 1.0: 0.9-1.0 all criteria explicit and strong, \
0.6-0.8 all criteria met with weaker evidence, 0.3-0.5 partial match, \
below 0.3 clear miss. Candidates that do not match get matchesCriteria false.

LENIENT mode: the query is generic (\"top candidates\", \"best profiles\", \
\"good engineers\"):
- Mark every candidate as matching and rank purely by overall resume \
quality: depth of experience, breadth of skills, concrete achievements.

For each candidate also extract, when evident from the text: current \
company, location, skills, total experience, and up to three key highlights.

Respond with ONLY a JSON object, no prose around it:
{\"matches\": [{\"name\": \"...\", \"relevanceScore\": 0.0, \
\"matchesCriteria\": true, \"reasoning\": \"...\", \
\"extractedInfo\": {\"currentCompany\": \"...\", \"location\": \"...\", \
\"skills\": [\"...\"], \"experience\": \"...\", \"keyHighlights\": [\"...\"]}}], \
\"summary\": \"...\"}";

/// Per-candidate verdict from the model.
#[derive(Debug, Clone)]
pub struct CandidateVerdict {
    pub name: String,
    pub relevance: f32,
    pub matches_criteria: bool,
    pub reasoning: Option<String>,
    pub extracted_info: Option<ExtractedInfo>,
}

/// Outcome of one re-rank run.
#[derive(Debug, Clone, Default)]
pub struct RerankAnalysis {
    pub summary: String,
    pub verdicts: Vec<CandidateVerdict>,
}

pub struct Reranker {
    chat: Arc<dyn ChatClient>,
}

impl Reranker {
    pub fn new(chat: Arc<dyn ChatClient>) -> Self {
        Self { chat }
    }

    /// Re-rank and filter `candidates` against `query`.
    pub async fn rerank_and_filter(
        &self,
        query: &str,
        candidates: Vec<SearchResultItem>,
        trace: &str,
    ) -> (Vec<SearchResultItem>, RerankAnalysis) {
        if candidates.is_empty() {
            return (candidates, RerankAnalysis::default());
        }

        let messages = vec![
            ChatMessage::system(SYSTEM_PROMPT),
            ChatMessage::user(build_user_prompt(query, &candidates)),
        ];

        let response = match self.chat.complete(&messages).await {
            Ok(response) => response,
            Err(e) => {
                tracing::warn!(trace, "re-rank LLM call failed: {e}");
                let analysis = RerankAnalysis {
                    summary: format!(
                        "Re-ranking unavailable ({e}); returning candidates in retrieval order."
                    ),
                    verdicts: Vec::new(),
                };
                return (candidates, analysis);
            }
        };

        match parse_verdicts(&response) {
            Ok((verdicts, summary)) => {
                let results = apply_verdicts(candidates, &verdicts, trace);
                (results, RerankAnalysis { summary, verdicts })
            }
            Err(e) => {
                tracing::warn!(trace, "failed to parse re-rank response: {e}");
                let analysis = RerankAnalysis {
                    summary: format!(
                        "Could not parse the re-ranker response ({e}); returning candidates in retrieval order."
                    ),
                    verdicts: Vec::new(),
                };
                (candidates, analysis)
            }
        }
    }
}

fn build_user_prompt(query: &str, candidates: &[SearchResultItem]) -> String {
    use std::fmt::Write;

    let mut prompt = format!("Query: {query}\n\nCandidates:\n");
    for (i, candidate) in candidates.iter().enumerate() {
        let (body, truncated) = truncate_chars(&candidate.content, MAX_CANDIDATE_CHARS);
        write!(
            prompt,
            "\n{}. {} | {} | {}\n{}{}\n",
            i + 1,
            candidate.name,
            candidate.email,
            candidate.phone,
            body,
            if truncated { "... [truncated]" } else { "" },
        )
        .unwrap();
    }
    prompt
}

/// Cut at a char boundary; report whether anything was cut.
fn truncate_chars(text: &str, max_chars: usize) -> (&str, bool) {
    if text.len() <= max_chars {
        return (text, false);
    }
    let mut end = max_chars;
    while !text.is_char_boundary(end) {
        end -= 1;
    }
    (&text[..end], true)
}

// ─── Response parsing ────────────────────────────────────

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RerankResponse {
    matches: Vec<RawVerdict>,
    #[serde(default)]
    summary: Option<String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawVerdict {
    name: String,
    #[serde(default)]
    relevance_score: f32,
    matches_criteria: bool,
    #[serde(default)]
    reasoning: Option<String>,
    #[serde(default)]
    extracted_info: Option<RawExtractedInfo>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawExtractedInfo {
    #[serde(default)]
    current_company: Option<String>,
    #[serde(default)]
    location: Option<String>,
    #[serde(default)]
    skills: Option<StringOrList>,
    #[serde(default)]
    experience: Option<String>,
    #[serde(default)]
    key_highlights: Option<StringOrList>,
}

/// Models sometimes return `"a, b, c"` where a list was asked for. The union
/// exists only at parse time; everything downstream sees a `Vec<String>`.
#[derive(Deserialize)]
#[serde(untagged)]
enum StringOrList {
    One(String),
    Many(Vec<String>),
}

impl StringOrList {
    fn into_list(self) -> Vec<String> {
        match self {
            StringOrList::Many(items) => items,
            StringOrList::One(joined) => joined
                .split(',')
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect(),
        }
    }
}

impl RawExtractedInfo {
    fn normalize(self) -> ExtractedInfo {
        ExtractedInfo {
            current_company: self.current_company,
            location: self.location,
            skills: self.skills.map(StringOrList::into_list).unwrap_or_default(),
            experience: self.experience,
            key_highlights: self
                .key_highlights
                .map(StringOrList::into_list)
                .unwrap_or_default(),
        }
    }
}

fn parse_verdicts(response: &str) -> Result<(Vec<CandidateVerdict>, String), serde_json::Error> {
    let body = extract_json_block(response);
    let parsed: RerankResponse = serde_json::from_str(body)?;

    let verdicts = parsed
        .matches
        .into_iter()
        .map(|raw| CandidateVerdict {
            name: raw.name,
            relevance: raw.relevance_score.clamp(0.0, 1.0),
            matches_criteria: raw.matches_criteria,
            reasoning: raw.reasoning,
            extracted_info: raw.extracted_info.map(RawExtractedInfo::normalize),
        })
        .collect();

    Ok((verdicts, parsed.summary.unwrap_or_default()))
}

/// Keep the candidates whose verdict matches, re-scored and re-tagged.
fn apply_verdicts(
    candidates: Vec<SearchResultItem>,
    verdicts: &[CandidateVerdict],
    trace: &str,
) -> Vec<SearchResultItem> {
    let mut results: Vec<SearchResultItem> = Vec::with_capacity(verdicts.len());

    for verdict in verdicts {
        if !verdict.matches_criteria {
            continue;
        }
        let Some(original) = candidates.iter().find(|c| c.name == verdict.name) else {
            tracing::warn!(trace, name = %verdict.name, "verdict names unknown candidate, ignoring");
            continue;
        };
        let mut item = original.clone();
        item.score = verdict.relevance;
        item.match_type = MatchType::LlmReranked;
        item.llm_reasoning = verdict.reasoning.clone();
        item.extracted_info = verdict.extracted_info.clone();
        results.push(item);
    }

    results.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(std::cmp::Ordering::Equal));
    results
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ChatError;
    use async_trait::async_trait;
    use parking_lot::Mutex;
    use uuid::Uuid;

    /// Chat double that replays canned responses.
    struct ScriptedChat {
        replies: Mutex<Vec<Result<String, ChatError>>>,
        calls: Mutex<Vec<Vec<ChatMessage>>>,
    }

    impl ScriptedChat {
        fn replying(reply: &str) -> Self {
            Self {
                replies: Mutex::new(vec![Ok(reply.to_string())]),
                calls: Mutex::new(Vec::new()),
            }
        }

        fn failing() -> Self {
            Self {
                replies: Mutex::new(vec![Err(ChatError::Transport("connection refused".into()))]),
                calls: Mutex::new(Vec::new()),
            }
        }

        fn call_count(&self) -> usize {
            self.calls.lock().len()
        }
    }

    #[async_trait]
    impl ChatClient for ScriptedChat {
        fn provider(&self) -> &str {
            "scripted"
        }
        fn model(&self) -> &str {
            "scripted-model"
        }
        async fn complete(&self, messages: &[ChatMessage]) -> Result<String, ChatError> {
            self.calls.lock().push(messages.to_vec());
            self.replies.lock().remove(0)
        }
    }

    fn candidate(name: &str, content: &str) -> SearchResultItem {
        SearchResultItem {
            id: Uuid::new_v4(),
            name: name.to_string(),
            email: format!("{}@example.com", name.to_lowercase().replace(' ', ".")),
            phone: "+91 98450 11111".to_string(),
            snippet: content.chars().take(50).collect(),
            score: 0.5,
            match_type: MatchType::Hybrid,
            extracted_info: None,
            llm_reasoning: None,
            llm_analysis: None,
            content: content.to_string(),
        }
    }

    #[tokio::test]
    async fn test_strict_verdicts_filter_and_reorder() {
        let reply = r#"{"matches": [
            {"name": "Asha", "relevanceScore": 0.9, "matchesCriteria": true, "reasoning": "strong match"},
            {"name": "Bela", "relevanceScore": 0.2, "matchesCriteria": false, "reasoning": "no city match"},
            {"name": "Chen", "relevanceScore": 0.7, "matchesCriteria": true}
        ], "summary": "2 of 3 matched"}"#;
        let chat = Arc::new(ScriptedChat::replying(reply));
        let reranker = Reranker::new(chat);

        let input = vec![candidate("Asha", "a"), candidate("Bela", "b"), candidate("Chen", "c")];
        let (results, analysis) = reranker.rerank_and_filter("QA in Pune", input, "t").await;

        assert_eq!(results.len(), 2);
        assert_eq!(results[0].name, "Asha");
        assert!((results[0].score - 0.9).abs() < 1e-6);
        assert_eq!(results[0].match_type, MatchType::LlmReranked);
        assert_eq!(results[0].llm_reasoning.as_deref(), Some("strong match"));
        assert_eq!(results[1].name, "Chen");
        assert_eq!(analysis.summary, "2 of 3 matched");
        assert_eq!(analysis.verdicts.len(), 3);
    }

    #[tokio::test]
    async fn test_fenced_response_is_unwrapped() {
        let reply = "```json\n{\"matches\": [{\"name\": \"Asha\", \"relevanceScore\": 1.0, \"matchesCriteria\": true}], \"summary\": \"ok\"}\n```";
        let reranker = Reranker::new(Arc::new(ScriptedChat::replying(reply)));
        let (results, _) = reranker
            .rerank_and_filter("q", vec![candidate("Asha", "a")], "t")
            .await;
        assert_eq!(results.len(), 1);
        assert!((results[0].score - 1.0).abs() < 1e-6);
    }

    #[tokio::test]
    async fn test_parse_failure_returns_originals() {
        let reranker = Reranker::new(Arc::new(ScriptedChat::replying("sorry I cannot comply")));
        let input = vec![candidate("Asha", "a"), candidate("Bela", "b")];
        let (results, analysis) = reranker.rerank_and_filter("q", input, "t").await;

        assert_eq!(results.len(), 2);
        assert_eq!(results[0].name, "Asha");
        assert_eq!(results[0].match_type, MatchType::Hybrid);
        assert!(analysis.summary.contains("parse"));
        assert!(analysis.verdicts.is_empty());
    }

    #[tokio::test]
    async fn test_transport_failure_returns_originals() {
        let reranker = Reranker::new(Arc::new(ScriptedChat::failing()));
        let input = vec![candidate("Asha", "a")];
        let (results, analysis) = reranker.rerank_and_filter("q", input, "t").await;
        assert_eq!(results.len(), 1);
        assert!(analysis.summary.contains("unavailable"));
    }

    #[tokio::test]
    async fn test_empty_candidates_skip_the_llm() {
        let chat = Arc::new(ScriptedChat::replying("unused"));
        let reranker = Reranker::new(chat.clone());
        let (results, analysis) = reranker.rerank_and_filter("q", vec![], "t").await;
        assert!(results.is_empty());
        assert!(analysis.summary.is_empty());
        assert_eq!(chat.call_count(), 0);
    }

    #[tokio::test]
    async fn test_unknown_verdict_name_is_ignored() {
        let reply = r#"{"matches": [
            {"name": "Nobody Here", "relevanceScore": 0.9, "matchesCriteria": true},
            {"name": "Asha", "relevanceScore": 0.6, "matchesCriteria": true}
        ], "summary": "s"}"#;
        let reranker = Reranker::new(Arc::new(ScriptedChat::replying(reply)));
        let (results, _) = reranker
            .rerank_and_filter("q", vec![candidate("Asha", "a")], "t")
            .await;
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].name, "Asha");
    }

    #[tokio::test]
    async fn test_output_is_subset_of_input() {
        let reply = r#"{"matches": [
            {"name": "Asha", "relevanceScore": 0.8, "matchesCriteria": true},
            {"name": "Bela", "relevanceScore": 0.9, "matchesCriteria": true}
        ], "summary": "s"}"#;
        let reranker = Reranker::new(Arc::new(ScriptedChat::replying(reply)));
        let input = vec![candidate("Asha", "a"), candidate("Bela", "b"), candidate("Chen", "c")];
        let names: Vec<String> = input.iter().map(|c| c.name.clone()).collect();
        let (results, _) = reranker.rerank_and_filter("q", input, "t").await;
        assert!(results.iter().all(|r| names.contains(&r.name)));
        // Sorted by the new scores.
        assert_eq!(results[0].name, "Bela");
    }

    #[tokio::test]
    async fn test_relevance_is_clamped() {
        let reply = r#"{"matches": [{"name": "Asha", "relevanceScore": 1.7, "matchesCriteria": true}], "summary": ""}"#;
        let reranker = Reranker::new(Arc::new(ScriptedChat::replying(reply)));
        let (results, _) = reranker
            .rerank_and_filter("q", vec![candidate("Asha", "a")], "t")
            .await;
        assert_eq!(results[0].score, 1.0);
    }

    #[tokio::test]
    async fn test_extracted_info_accepts_string_or_list() {
        let reply = r#"{"matches": [{
            "name": "Asha", "relevanceScore": 0.9, "matchesCriteria": true,
            "extractedInfo": {
                "currentCompany": "Acme",
                "location": "Bengaluru",
                "skills": "Java, Selenium ,  TestNG",
                "experience": "8 years",
                "keyHighlights": ["Led QA guild"]
            }
        }], "summary": ""}"#;
        let reranker = Reranker::new(Arc::new(ScriptedChat::replying(reply)));
        let (results, _) = reranker
            .rerank_and_filter("q", vec![candidate("Asha", "a")], "t")
            .await;

        let info = results[0].extracted_info.as_ref().unwrap();
        assert_eq!(info.skills, vec!["Java", "Selenium", "TestNG"]);
        assert_eq!(info.key_highlights, vec!["Led QA guild"]);
        assert_eq!(info.location.as_deref(), Some("Bengaluru"));
    }

    #[tokio::test]
    async fn test_prompt_carries_query_and_truncated_content() {
        let chat = Arc::new(ScriptedChat::replying(r#"{"matches": [], "summary": ""}"#));
        let reranker = Reranker::new(chat.clone());
        let long_resume = "experience ".repeat(500);
        reranker
            .rerank_and_filter("QA engineers in Bengaluru", vec![candidate("Asha", &long_resume)], "t")
            .await;

        let calls = chat.calls.lock();
        let user = &calls[0][1];
        assert_eq!(calls[0][0].role, "system");
        assert!(user.content.contains("Query: QA engineers in Bengaluru"));
        assert!(user.content.contains("1. Asha |"));
        assert!(user.content.contains("... [truncated]"));
    }

    #[test]
    fn test_truncate_chars_boundary() {
        let text = "é".repeat(2000);
        let (body, truncated) = truncate_chars(&text, 3001);
        assert!(truncated);
        assert!(body.is_char_boundary(body.len()));
        let (body, truncated) = truncate_chars("short", 3000);
        assert_eq!(body, "short");
        assert!(!truncated);
    }
}
