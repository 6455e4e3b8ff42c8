//! In-process conversation state.
//!
//! The store maps conversation ids to lazily created entries. Each entry's
//! memory sits behind an async mutex that the chat handler holds for the
//! whole request, so concurrent messages on one conversation serialize and
//! exchanges land in arrival order. Nothing here survives process exit.

use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use std::collections::{HashMap, VecDeque};
use std::sync::Arc;

use crate::models::SearchResultItem;

#[derive(Debug, Clone)]
pub struct ChatTurn {
    pub role: &'static str,
    pub content: String,
    pub timestamp: DateTime<Utc>,
}

/// Bounded message history plus the cached results of the most recent
/// non-filter retrieval.
pub struct ConversationMemory {
    messages: VecDeque<ChatTurn>,
    last_results: Vec<SearchResultItem>,
    capacity: usize,
}

impl ConversationMemory {
    fn new(capacity: usize) -> Self {
        Self {
            messages: VecDeque::new(),
            last_results: Vec::new(),
            capacity,
        }
    }

    /// Append one user/assistant pair, then evict oldest-first until the
    /// history fits the capacity again.
    pub fn add_exchange(&mut self, user_text: &str, assistant_text: &str) {
        let now = Utc::now();
        self.messages.push_back(ChatTurn {
            role: "user",
            content: user_text.to_string(),
            timestamp: now,
        });
        self.messages.push_back(ChatTurn {
            role: "assistant",
            content: assistant_text.to_string(),
            timestamp: now,
        });
        while self.messages.len() > self.capacity {
            self.messages.pop_front();
        }
    }

    /// Oldest first.
    pub fn messages(&self) -> impl Iterator<Item = &ChatTurn> {
        self.messages.iter()
    }

    pub fn message_count(&self) -> usize {
        self.messages.len()
    }

    pub fn clear(&mut self) {
        self.messages.clear();
        self.last_results.clear();
    }

    pub fn set_last_results(&mut self, results: Vec<SearchResultItem>) {
        self.last_results = results;
    }

    pub fn last_results(&self) -> &[SearchResultItem] {
        &self.last_results
    }

    pub fn has_results(&self) -> bool {
        !self.last_results.is_empty()
    }

    pub fn clear_results(&mut self) {
        self.last_results.clear();
    }
}

/// One tracked conversation. The async mutex is the per-conversation lock;
/// hold it across the whole request.
pub struct Conversation {
    pub memory: tokio::sync::Mutex<ConversationMemory>,
}

/// Process-wide conversation registry. Entry creation is lazy; deletion is
/// explicit. Not shareable across processes.
pub struct ConversationStore {
    entries: RwLock<HashMap<String, Arc<Conversation>>>,
    capacity: usize,
}

impl ConversationStore {
    pub fn new(capacity: usize) -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
            capacity,
        }
    }

    pub fn get(&self, id: &str) -> Option<Arc<Conversation>> {
        self.entries.read().get(id).cloned()
    }

    pub fn get_or_create(&self, id: &str) -> Arc<Conversation> {
        if let Some(existing) = self.get(id) {
            return existing;
        }
        let mut entries = self.entries.write();
        entries
            .entry(id.to_string())
            .or_insert_with(|| {
                Arc::new(Conversation {
                    memory: tokio::sync::Mutex::new(ConversationMemory::new(self.capacity)),
                })
            })
            .clone()
    }

    /// Remove a conversation; false when the id was never seen.
    pub fn remove(&self, id: &str) -> bool {
        self.entries.write().remove(id).is_some()
    }

    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::MatchType;
    use uuid::Uuid;

    fn result(name: &str) -> SearchResultItem {
        SearchResultItem {
            id: Uuid::new_v4(),
            name: name.to_string(),
            email: format!("{name}@example.com"),
            phone: "+1 555 0100".to_string(),
            snippet: "s".to_string(),
            score: 0.5,
            match_type: MatchType::Hybrid,
            extracted_info: None,
            llm_reasoning: None,
            llm_analysis: None,
            content: String::new(),
        }
    }

    #[test]
    fn test_fifo_eviction_at_capacity_four() {
        let mut memory = ConversationMemory::new(4);
        memory.add_exchange("q1", "a1");
        memory.add_exchange("q2", "a2");
        memory.add_exchange("q3", "a3");
        assert_eq!(memory.message_count(), 4);

        let contents: Vec<&str> = memory.messages().map(|m| m.content.as_str()).collect();
        // q1/a1 evicted; the newest pair sits at positions 2 and 3.
        assert_eq!(contents, vec!["q2", "a2", "q3", "a3"]);
        assert_eq!(memory.messages().nth(2).unwrap().content, "q3");
        assert_eq!(memory.messages().nth(3).unwrap().content, "a3");
    }

    #[test]
    fn test_history_never_exceeds_capacity() {
        let mut memory = ConversationMemory::new(10);
        for i in 0..50 {
            memory.add_exchange(&format!("q{i}"), &format!("a{i}"));
            assert!(memory.message_count() <= 10);
        }
        assert_eq!(memory.message_count(), 10);
        assert_eq!(memory.messages().next().unwrap().content, "q45");
    }

    #[test]
    fn test_roles_alternate_in_arrival_order() {
        let mut memory = ConversationMemory::new(10);
        memory.add_exchange("question", "answer");
        let roles: Vec<&str> = memory.messages().map(|m| m.role).collect();
        assert_eq!(roles, vec!["user", "assistant"]);
    }

    #[test]
    fn test_clear_drops_history_and_results() {
        let mut memory = ConversationMemory::new(10);
        memory.add_exchange("q", "a");
        memory.set_last_results(vec![result("Asha")]);
        assert!(memory.has_results());

        memory.clear();
        assert_eq!(memory.message_count(), 0);
        assert!(!memory.has_results());
    }

    #[test]
    fn test_results_cache_roundtrip() {
        let mut memory = ConversationMemory::new(10);
        assert!(!memory.has_results());
        memory.set_last_results(vec![result("Asha"), result("Bela")]);
        assert_eq!(memory.last_results().len(), 2);
        memory.clear_results();
        assert!(!memory.has_results());
    }

    #[test]
    fn test_store_creates_lazily_and_reuses() {
        let store = ConversationStore::new(10);
        assert!(store.is_empty());
        let a = store.get_or_create("conv-1");
        let b = store.get_or_create("conv-1");
        assert!(Arc::ptr_eq(&a, &b));
        assert_eq!(store.len(), 1);
        assert!(store.get("conv-2").is_none());
    }

    #[test]
    fn test_store_remove() {
        let store = ConversationStore::new(10);
        store.get_or_create("conv-1");
        assert!(store.remove("conv-1"));
        assert!(!store.remove("conv-1"));
        assert!(store.get("conv-1").is_none());
    }

    #[tokio::test]
    async fn test_memory_lock_serializes_writers() {
        let store = ConversationStore::new(10);
        let conv = store.get_or_create("conv-1");

        let mut handles = Vec::new();
        for i in 0..8 {
            let conv = conv.clone();
            handles.push(tokio::spawn(async move {
                let mut memory = conv.memory.lock().await;
                memory.add_exchange(&format!("q{i}"), &format!("a{i}"));
            }));
        }
        for handle in handles {
            handle.await.unwrap();
        }

        let memory = conv.memory.lock().await;
        assert_eq!(memory.message_count(), 10);
        // Pairs are never interleaved: user then assistant with matching index.
        let turns: Vec<(&str, String)> = memory
            .messages()
            .map(|m| (m.role, m.content.clone()))
            .collect();
        for pair in turns.chunks(2) {
            assert_eq!(pair[0].0, "user");
            assert_eq!(pair[1].0, "assistant");
            assert_eq!(pair[0].1[1..], pair[1].1[1..]);
        }
    }
}
