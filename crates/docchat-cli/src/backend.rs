//! Embedder selection

use async_trait::async_trait;

use docchat_core::{Embedder, Result};
use docchat_ollama::OllamaEmbedder;
use docchat_rag::HashEmbedder;

use crate::config::{AppConfig, EmbedderKind};

/// The embedder chosen by configuration
pub enum EmbedderBackend {
    Ollama(OllamaEmbedder),
    Hash(HashEmbedder),
}

impl EmbedderBackend {
    pub fn from_config(config: &AppConfig) -> Result<Self> {
        match config.embedder {
            EmbedderKind::Ollama => Ok(EmbedderBackend::Ollama(OllamaEmbedder::new(
                config.ollama.clone(),
            )?)),
            EmbedderKind::Hash => Ok(EmbedderBackend::Hash(HashEmbedder::default())),
        }
    }
}

#[async_trait]
impl Embedder for EmbedderBackend {
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        match self {
            EmbedderBackend::Ollama(embedder) => embedder.embed(text).await,
            EmbedderBackend::Hash(embedder) => embedder.embed(text).await,
        }
    }

    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        match self {
            EmbedderBackend::Ollama(embedder) => embedder.embed_batch(texts).await,
            EmbedderBackend::Hash(embedder) => embedder.embed_batch(texts).await,
        }
    }

    fn model_id(&self) -> &str {
        match self {
            EmbedderBackend::Ollama(embedder) => embedder.model_id(),
            EmbedderBackend::Hash(embedder) => embedder.model_id(),
        }
    }
}
