use std::sync::Arc;

use crate::config::Config;
use crate::conversation::ConversationStore;
use crate::llm::chat::HttpChatClient;
use crate::llm::embeddings::{EmbeddingClient, HttpEmbeddingClient};
use crate::llm::filter::ResultFilter;
use crate::llm::rerank::Reranker;
use crate::llm::ChatClient;
use crate::pipeline::RetrievalPipeline;
use crate::search::hybrid::HybridEngine;
use crate::search::keyword::KeywordEngine;
use crate::search::vector::VectorEngine;
use crate::store::memory::JsonResumeStore;
use crate::store::DocumentStore;

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    pub chat: Arc<dyn ChatClient>,
    /// None when the store was unavailable at startup; search and chat then
    /// report "pipeline not initialized" instead of the process exiting.
    pub pipeline: Option<Arc<RetrievalPipeline>>,
    pub filter: Arc<ResultFilter>,
    pub conversations: Arc<ConversationStore>,
}

impl AppState {
    pub fn new(config: Config) -> anyhow::Result<Self> {
        let http_client = reqwest::Client::builder()
            .connect_timeout(std::time::Duration::from_secs(10))
            .timeout(std::time::Duration::from_secs(120))
            .build()?;

        let chat: Arc<dyn ChatClient> =
            Arc::new(HttpChatClient::new(http_client.clone(), config.llm.clone()));
        let embeddings: Arc<dyn EmbeddingClient> =
            Arc::new(HttpEmbeddingClient::new(http_client, config.llm.clone()));

        let pipeline = match JsonResumeStore::open(&config.store) {
            Ok(store) => {
                let store: Arc<dyn DocumentStore> = Arc::new(store);
                Some(Arc::new(build_pipeline(
                    &config,
                    store,
                    embeddings,
                    chat.clone(),
                )))
            }
            Err(e) => {
                tracing::error!(
                    "document store unavailable at startup: {e}; \
                     search requests will fail with 'pipeline not initialized'"
                );
                None
            }
        };

        Ok(Self::from_parts(config, chat, pipeline))
    }

    /// Assemble state from already-built collaborators. Tests inject their
    /// doubles through this.
    pub fn from_parts(
        config: Config,
        chat: Arc<dyn ChatClient>,
        pipeline: Option<Arc<RetrievalPipeline>>,
    ) -> Self {
        let filter = Arc::new(ResultFilter::new(chat.clone()));
        let conversations = Arc::new(ConversationStore::new(config.max_conversation_messages));
        Self {
            config,
            chat,
            pipeline,
            filter,
            conversations,
        }
    }
}

/// Wire the engines and re-ranker together.
pub fn build_pipeline(
    config: &Config,
    store: Arc<dyn DocumentStore>,
    embeddings: Arc<dyn EmbeddingClient>,
    chat: Arc<dyn ChatClient>,
) -> RetrievalPipeline {
    let keyword = Arc::new(KeywordEngine::new(store.clone()));
    let vector = Arc::new(VectorEngine::new(store, embeddings));
    let hybrid = Arc::new(HybridEngine::new(
        keyword.clone(),
        vector.clone(),
        config.hybrid,
    ));
    RetrievalPipeline::new(
        keyword,
        vector,
        hybrid,
        Reranker::new(chat),
        config.rerank.clone(),
    )
}
