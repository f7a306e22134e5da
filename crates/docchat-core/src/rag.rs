//! RAG (Retrieval-Augmented Generation) engine trait and types

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::{Result, ScoredRecord};

/// Separator placed between passages in an assembled context
pub const PASSAGE_SEPARATOR: &str = "\n\n";

/// Query for RAG retrieval
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RAGQuery {
    pub query: String,
    pub top_k: usize,
}

impl RAGQuery {
    pub fn new(query: impl Into<String>, top_k: usize) -> Self {
        Self { query: query.into(), top_k }
    }
}

impl Default for RAGQuery {
    fn default() -> Self {
        Self {
            query: String::new(),
            top_k: 3,
        }
    }
}

/// Result from RAG retrieval
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RAGResult {
    /// Retrieved passages, most relevant first
    pub passages: Vec<ScoredRecord>,
    /// Passages joined with `PASSAGE_SEPARATOR`; empty when nothing was retrieved
    pub context: String,
}

/// Trait for RAG engines
///
/// An empty result is not an error: the generator is then expected to answer from
/// general knowledge.
#[async_trait]
pub trait RAGEngine: Send + Sync {
    /// Retrieve relevant passages for a query
    async fn retrieve(&self, query: &RAGQuery) -> Result<RAGResult>;

    /// Build context from retrieved passages
    fn build_context(&self, passages: &[ScoredRecord]) -> String;

    /// Get statistics about the RAG engine
    async fn stats(&self) -> Result<serde_json::Value>;
}
