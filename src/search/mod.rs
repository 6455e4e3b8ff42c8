//! Retrieval engines.
//!
//! Each engine satisfies the same [`SearchEngine`] contract; the hybrid
//! engine composes the keyword and vector engines rather than inheriting
//! from them.

pub mod hybrid;
pub mod keyword;
pub mod vector;

use async_trait::async_trait;

use crate::error::Result;
use crate::models::{MatchType, ResumeDocument, SearchResultItem};

/// Common contract for the keyword, vector and hybrid engines.
#[async_trait]
pub trait SearchEngine: Send + Sync {
    /// Return up to `k` results ordered by score descending. `trace` is the
    /// request trace id, included in engine logs.
    async fn search(&self, query: &str, k: usize, trace: &str) -> Result<Vec<SearchResultItem>>;
}

/// Display snippets are capped at 200 characters including ellipses.
pub(crate) const SNIPPET_MAX_CHARS: usize = 200;

/// Leading snippet with a trailing ellipsis when the text was cut.
pub(crate) fn leading_snippet(text: &str) -> String {
    if text.len() <= SNIPPET_MAX_CHARS {
        return text.to_string();
    }
    let end = floor_char_boundary(text, SNIPPET_MAX_CHARS - 3);
    format!("{}...", &text[..end])
}

/// Window centered on a match with ellipses on each truncated side.
pub(crate) fn snippet_around(text: &str, match_start: usize, match_end: usize) -> String {
    // Leaves room for an ellipsis on both sides within the 200-char cap.
    const WINDOW: usize = 190;

    if text.len() <= SNIPPET_MAX_CHARS {
        return text.to_string();
    }

    let match_len = match_end.saturating_sub(match_start);
    let slack = WINDOW.saturating_sub(match_len);
    let mut window_start = match_start.saturating_sub(slack / 2);
    let window_end = (window_start + WINDOW).min(text.len());
    if window_end.saturating_sub(window_start) < WINDOW {
        window_start = window_end.saturating_sub(WINDOW);
    }

    let window_start = ceil_char_boundary(text, window_start);
    let window_end = floor_char_boundary(text, window_end);

    let mut snippet = String::with_capacity(SNIPPET_MAX_CHARS);
    if window_start > 0 {
        snippet.push_str("...");
    }
    snippet.push_str(&text[window_start..window_end]);
    if window_end < text.len() {
        snippet.push_str("...");
    }
    snippet
}

fn floor_char_boundary(text: &str, mut index: usize) -> usize {
    if index >= text.len() {
        return text.len();
    }
    while !text.is_char_boundary(index) {
        index -= 1;
    }
    index
}

fn ceil_char_boundary(text: &str, mut index: usize) -> usize {
    if index >= text.len() {
        return text.len();
    }
    while !text.is_char_boundary(index) {
        index += 1;
    }
    index
}

/// Map a document to a result item with the given snippet and score.
pub(crate) fn doc_to_item(
    doc: &ResumeDocument,
    snippet: String,
    score: f32,
    match_type: MatchType,
) -> SearchResultItem {
    SearchResultItem {
        id: doc.id,
        name: doc.name.clone(),
        email: doc.email.clone(),
        phone: doc.phone.clone(),
        snippet,
        score,
        match_type,
        extracted_info: None,
        llm_reasoning: None,
        llm_analysis: None,
        content: doc.text.clone(),
    }
}
