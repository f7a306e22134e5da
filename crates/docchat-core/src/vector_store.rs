//! Vector store trait and types

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::Result;

/// The persisted unit of a vector store: a vector with the text it was computed from
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmbeddingRecord {
    pub vector: Vec<f32>,
    pub text: String,
    pub metadata: serde_json::Value,
}

impl EmbeddingRecord {
    pub fn new(vector: Vec<f32>, text: impl Into<String>) -> Self {
        Self {
            vector,
            text: text.into(),
            metadata: serde_json::Value::Null,
        }
    }

    pub fn with_metadata(mut self, metadata: serde_json::Value) -> Self {
        self.metadata = metadata;
        self
    }
}

/// A record returned from a similarity query
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoredRecord {
    pub text: String,
    pub metadata: serde_json::Value,
    /// Cosine similarity to the query vector (higher = more relevant)
    pub score: f32,
}

/// Summary of what a store currently holds
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoreStats {
    pub records: usize,
    pub dimension: Option<usize>,
    pub location: Option<String>,
}

/// Trait for vector stores
///
/// Implementations must guarantee:
/// - `add` is atomic per call: all records of the batch become visible or none do
/// - every vector in the store has the same dimensionality
/// - `query` results are ordered by score descending, ties in insertion order
/// - concurrent `add` calls are serialized, `query` calls may run concurrently
#[async_trait]
pub trait VectorStore: Send + Sync {
    /// Append a batch of records, returning how many were committed
    async fn add(&self, records: Vec<EmbeddingRecord>) -> Result<usize>;

    /// Return at most `k` records most similar to `vector`
    async fn query(&self, vector: &[f32], k: usize) -> Result<Vec<ScoredRecord>>;

    /// Get the total number of records
    async fn count(&self) -> Result<usize>;

    /// Dimensionality established by the first committed batch, if any
    async fn dimension(&self) -> Result<Option<usize>>;

    /// Get statistics about the store
    async fn stats(&self) -> Result<StoreStats>;
}
