//! RAG engine implementation

use async_trait::async_trait;
use serde_json::json;
use std::sync::Arc;
use tracing::debug;

use docchat_core::{
    ChatMessage, Embedder, Error, PASSAGE_SEPARATOR, RAGEngine, RAGQuery, RAGResult, Result,
    ScoredRecord, VectorStore,
};

/// System instruction for grounded answers
pub const GROUNDED_SYSTEM_PROMPT: &str = "Use the retrieved context to answer the user's query.";

/// Build the messages for a grounded answer.
///
/// An empty context is sent as-is so the model falls back to general knowledge.
pub fn grounded_messages(context: &str, question: &str) -> Vec<ChatMessage> {
    vec![
        ChatMessage::system(GROUNDED_SYSTEM_PROMPT),
        ChatMessage::user(format!("Context: {}\n\nQuery: {}", context, question)),
    ]
}

/// Local RAG engine: embeds the query and looks it up in a vector store
pub struct LocalRAGEngine<V: VectorStore, E: Embedder> {
    vector_store: Arc<V>,
    embedder: Arc<E>,
}

impl<V: VectorStore, E: Embedder> LocalRAGEngine<V, E> {
    /// Create a new local RAG engine
    pub fn new(vector_store: Arc<V>, embedder: Arc<E>) -> Self {
        Self {
            vector_store,
            embedder,
        }
    }
}

#[async_trait]
impl<V: VectorStore + 'static, E: Embedder + 'static> RAGEngine for LocalRAGEngine<V, E> {
    async fn retrieve(&self, query: &RAGQuery) -> Result<RAGResult> {
        if query.top_k == 0 {
            return Err(Error::InvalidQuery("top_k must be at least 1".to_string()));
        }

        if self.vector_store.count().await? == 0 {
            debug!("Vector store is empty, retrieving no context");
            return Ok(RAGResult {
                passages: Vec::new(),
                context: String::new(),
            });
        }

        let vector = self.embedder.embed(&query.query).await?;
        let passages = self.vector_store.query(&vector, query.top_k).await?;
        debug!(
            "Retrieved {} passages (top score {:?})",
            passages.len(),
            passages.first().map(|p| p.score)
        );

        let context = self.build_context(&passages);
        Ok(RAGResult { passages, context })
    }

    fn build_context(&self, passages: &[ScoredRecord]) -> String {
        passages
            .iter()
            .map(|p| p.text.as_str())
            .collect::<Vec<_>>()
            .join(PASSAGE_SEPARATOR)
    }

    async fn stats(&self) -> Result<serde_json::Value> {
        let stats = self.vector_store.stats().await?;

        Ok(json!({
            "embedding_model": self.embedder.model_id(),
            "records": stats.records,
            "dimension": stats.dimension,
            "location": stats.location,
        }))
    }
}
