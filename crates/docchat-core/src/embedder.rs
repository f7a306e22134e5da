//! Embedder trait

use async_trait::async_trait;

use crate::Result;

/// Trait for embedding models
///
/// An embedder maps text to a fixed-length vector. For a fixed model the mapping must
/// be deterministic: the same text always produces the same vector. Failures surface
/// as `Error::EmbeddingUnavailable` and are never retried silently.
#[async_trait]
pub trait Embedder: Send + Sync {
    /// Embed a single text
    async fn embed(&self, text: &str) -> Result<Vec<f32>>;

    /// Embed several texts, preserving order
    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        let mut vectors = Vec::with_capacity(texts.len());
        for text in texts {
            vectors.push(self.embed(text).await?);
        }
        Ok(vectors)
    }

    /// Identifier of the underlying model
    fn model_id(&self) -> &str;
}
