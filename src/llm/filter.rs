//! Conversational filter over cached results.
//!
//! Follow-up messages like "only those in Bengaluru" narrow the previous
//! answer instead of re-querying the store. The cached results (with the
//! extracted info a previous re-rank produced) go to the chat model once;
//! whatever it marks as matching survives, in the original order.

use serde::Deserialize;
use std::sync::Arc;

use crate::llm::{extract_json_block, ChatClient};
use crate::models::{ChatMessage, SearchResultItem};

const SYSTEM_PROMPT: &str = "\
You filter a list of previously retrieved resume candidates against a new \
criterion from the user. Typical criteria:
- company type: service-based vs product-based companies
- location: a city or region named in the candidate's data
- experience: a minimum or maximum number of years
- skills: presence of a named skill

Rules:
- Judge only from the candidate data given. Never modify it.
- Never invent a match; when the data does not show the criterion, the \
candidate does not match.
- Every candidate in the input must appear in your output exactly once.

Respond with ONLY a JSON object, no prose around it:
{\"filteredResults\": [{\"name\": \"...\", \"matches\": true, \
\"reasoning\": \"...\"}], \"summary\": \"...\"}";

/// True when the message narrows previous results rather than asking fresh.
/// Case-insensitive substring match over the configured phrase list.
pub fn matches_filter_intent(message: &str, phrases: &[String]) -> bool {
    let lower = message.to_lowercase();
    phrases.iter().any(|p| lower.contains(&p.to_lowercase()))
}

pub struct ResultFilter {
    chat: Arc<dyn ChatClient>,
}

impl ResultFilter {
    pub fn new(chat: Arc<dyn ChatClient>) -> Self {
        Self { chat }
    }

    /// Filter `cached` against `criteria`. Recent conversation turns may be
    /// supplied for context. Returns the surviving subset and a summary; on
    /// LLM or parse failure returns every cached result (fail-open).
    pub async fn filter(
        &self,
        criteria: &str,
        cached: &[SearchResultItem],
        history: &[ChatMessage],
        trace: &str,
    ) -> (Vec<SearchResultItem>, String) {
        let messages = vec![
            ChatMessage::system(SYSTEM_PROMPT),
            ChatMessage::user(build_user_prompt(criteria, cached, history)),
        ];

        let response = match self.chat.complete(&messages).await {
            Ok(response) => response,
            Err(e) => {
                tracing::warn!(trace, "filter LLM call failed: {e}");
                return (
                    cached.to_vec(),
                    format!("Could not apply the filter ({e}); showing all previous results."),
                );
            }
        };

        match parse_filter_response(&response) {
            Ok((verdicts, summary)) => {
                let keep: std::collections::HashSet<&str> = verdicts
                    .iter()
                    .filter(|v| v.matches)
                    .map(|v| v.name.as_str())
                    .collect();
                // Original order is preserved by walking the cache, not the verdicts.
                let results: Vec<SearchResultItem> = cached
                    .iter()
                    .filter(|c| keep.contains(c.name.as_str()))
                    .cloned()
                    .collect();
                (results, summary)
            }
            Err(e) => {
                tracing::warn!(trace, "failed to parse filter response: {e}");
                (
                    cached.to_vec(),
                    format!(
                        "Could not parse the filter response ({e}); showing all previous results."
                    ),
                )
            }
        }
    }
}

fn build_user_prompt(
    criteria: &str,
    cached: &[SearchResultItem],
    history: &[ChatMessage],
) -> String {
    use std::fmt::Write;

    let mut prompt = String::new();
    if !history.is_empty() {
        prompt.push_str("Recent conversation:\n");
        for turn in history {
            let _ = writeln!(prompt, "{}: {}", turn.role, turn.content);
        }
        prompt.push('\n');
    }

    let _ = writeln!(prompt, "Filter criterion: {criteria}\n\nCandidates:");
    for (i, item) in cached.iter().enumerate() {
        let _ = write!(prompt, "\n{}. {}", i + 1, item.name);
        if let Some(info) = &item.extracted_info {
            if let Some(company) = &info.current_company {
                let _ = write!(prompt, "\n   company: {company}");
            }
            if let Some(location) = &info.location {
                let _ = write!(prompt, "\n   location: {location}");
            }
            if !info.skills.is_empty() {
                let _ = write!(prompt, "\n   skills: {}", info.skills.join(", "));
            }
            if let Some(experience) = &info.experience {
                let _ = write!(prompt, "\n   experience: {experience}");
            }
            if !info.key_highlights.is_empty() {
                let _ = write!(prompt, "\n   highlights: {}", info.key_highlights.join("; "));
            }
        } else {
            let _ = write!(prompt, "\n   snippet: {}", item.snippet);
        }
        prompt.push('\n');
    }
    prompt
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct FilterResponse {
    filtered_results: Vec<FilterVerdict>,
    #[serde(default)]
    summary: Option<String>,
}

#[derive(Deserialize)]
struct FilterVerdict {
    name: String,
    matches: bool,
    #[serde(default)]
    #[allow(dead_code)]
    reasoning: Option<String>,
}

fn parse_filter_response(
    response: &str,
) -> Result<(Vec<FilterVerdict>, String), serde_json::Error> {
    let body = extract_json_block(response);
    let parsed: FilterResponse = serde_json::from_str(body)?;
    Ok((parsed.filtered_results, parsed.summary.unwrap_or_default()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ChatError;
    use crate::models::{ExtractedInfo, MatchType};
    use async_trait::async_trait;
    use parking_lot::Mutex;
    use uuid::Uuid;

    struct ScriptedChat {
        reply: Result<String, ChatError>,
        calls: Mutex<Vec<Vec<ChatMessage>>>,
    }

    impl ScriptedChat {
        fn replying(reply: &str) -> Self {
            Self {
                reply: Ok(reply.to_string()),
                calls: Mutex::new(Vec::new()),
            }
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
            match &self.reply {
                Ok(s) => Ok(s.clone()),
                Err(_) => Err(ChatError::Transport("down".into())),
            }
        }
    }

    fn cached(name: &str, location: &str) -> SearchResultItem {
        SearchResultItem {
            id: Uuid::new_v4(),
            name: name.to_string(),
            email: format!("{name}@example.com"),
            phone: "+91 98450 22222".to_string(),
            snippet: "snippet".to_string(),
            score: 0.8,
            match_type: MatchType::LlmReranked,
            extracted_info: Some(ExtractedInfo {
                location: Some(location.to_string()),
                ..Default::default()
            }),
            llm_reasoning: None,
            llm_analysis: None,
            content: String::new(),
        }
    }

    fn phrases() -> Vec<String> {
        crate::config::Config::default().filter_intent_phrases
    }

    #[test]
    fn test_intent_detection_positive() {
        let p = phrases();
        assert!(matches_filter_intent("only those in Bengaluru", &p));
        assert!(matches_filter_intent("Narrow Down to Java devs", &p));
        assert!(matches_filter_intent("from the above, who has 5 years?", &p));
        assert!(matches_filter_intent("please FILTER by city", &p));
    }

    #[test]
    fn test_intent_detection_negative() {
        let p = phrases();
        assert!(!matches_filter_intent("find QA engineers", &p));
        assert!(!matches_filter_intent("best backend candidates", &p));
    }

    #[tokio::test]
    async fn test_filter_keeps_matching_subset_in_order() {
        let reply = r#"{"filteredResults": [
            {"name": "Chen", "matches": true, "reasoning": "in Bengaluru"},
            {"name": "Asha", "matches": true, "reasoning": "in Bengaluru"},
            {"name": "Bela", "matches": false, "reasoning": "in Pune"}
        ], "summary": "2 of 3 in Bengaluru"}"#;
        let filter = ResultFilter::new(Arc::new(ScriptedChat::replying(reply)));
        let cache = vec![
            cached("Asha", "Bengaluru"),
            cached("Bela", "Pune"),
            cached("Chen", "Bengaluru"),
        ];

        let (results, summary) = filter.filter("only in Bengaluru", &cache, &[], "t").await;
        assert_eq!(results.len(), 2);
        // Cache order, not verdict order.
        assert_eq!(results[0].name, "Asha");
        assert_eq!(results[1].name, "Chen");
        assert_eq!(summary, "2 of 3 in Bengaluru");
    }

    #[tokio::test]
    async fn test_parse_failure_fails_open() {
        let filter = ResultFilter::new(Arc::new(ScriptedChat::replying("cannot help")));
        let cache = vec![cached("Asha", "Bengaluru"), cached("Bela", "Pune")];
        let (results, summary) = filter.filter("only seniors", &cache, &[], "t").await;
        assert_eq!(results.len(), 2);
        assert!(summary.contains("showing all previous results"));
    }

    #[tokio::test]
    async fn test_transport_failure_fails_open() {
        let chat = ScriptedChat {
            reply: Err(ChatError::Transport("down".into())),
            calls: Mutex::new(Vec::new()),
        };
        let filter = ResultFilter::new(Arc::new(chat));
        let cache = vec![cached("Asha", "Bengaluru")];
        let (results, summary) = filter.filter("only seniors", &cache, &[], "t").await;
        assert_eq!(results.len(), 1);
        assert!(summary.contains("showing all previous results"));
    }

    #[tokio::test]
    async fn test_prompt_formats_extracted_info_and_history() {
        let chat = Arc::new(ScriptedChat::replying(
            r#"{"filteredResults": [], "summary": ""}"#,
        ));
        let filter = ResultFilter::new(chat.clone());
        let history = vec![
            ChatMessage::user("Find QA engineers"),
            ChatMessage {
                role: "assistant".into(),
                content: "Found 3 candidates".into(),
            },
        ];
        filter
            .filter("only in Bengaluru", &[cached("Asha", "Bengaluru")], &history, "t")
            .await;

        let calls = chat.calls.lock();
        let user = &calls[0][1].content;
        assert!(user.contains("Filter criterion: only in Bengaluru"));
        assert!(user.contains("location: Bengaluru"));
        assert!(user.contains("Recent conversation:"));
        assert!(user.contains("Find QA engineers"));
    }

    #[tokio::test]
    async fn test_fenced_filter_response() {
        let reply = "```json\n{\"filteredResults\": [{\"name\": \"Asha\", \"matches\": true}], \"summary\": \"ok\"}\n```";
        let filter = ResultFilter::new(Arc::new(ScriptedChat::replying(reply)));
        let cache = vec![cached("Asha", "Bengaluru"), cached("Bela", "Pune")];
        let (results, _) = filter.filter("c", &cache, &[], "t").await;
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].name, "Asha");
    }
}
