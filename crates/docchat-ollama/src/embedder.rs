//! Ollama embedding client

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tokio::time::timeout;
use tracing::{debug, warn};

use docchat_core::{Embedder, Error, Result};

use crate::client::http_client;
use crate::config::OllamaConfig;

/// Texts sent per `/api/embed` request
const MAX_BATCH: usize = 32;

/// Embedder backed by an Ollama embedding model
pub struct OllamaEmbedder {
    config: OllamaConfig,
    client: Client,
}

#[derive(Debug, Serialize)]
pub(crate) struct EmbedRequest<'a> {
    pub(crate) model: &'a str,
    pub(crate) input: &'a [String],
}

#[derive(Debug, Deserialize)]
struct EmbedResponse {
    #[serde(default)]
    embeddings: Vec<Vec<f32>>,
    #[serde(default)]
    error: Option<String>,
}

impl OllamaEmbedder {
    pub fn new(config: OllamaConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            config,
            client: http_client()?,
        })
    }

    async fn request(&self, input: &[String]) -> Result<Vec<Vec<f32>>> {
        let url = self.config.endpoint("/api/embed");
        let body = EmbedRequest {
            model: &self.config.embed_model,
            input,
        };
        debug!("POST {} ({} inputs)", url, input.len());

        let response = self
            .client
            .post(&url)
            .json(&body)
            .send()
            .await
            .map_err(|e| Error::EmbeddingUnavailable(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            warn!("Embedding request failed with status {}", status);
            return Err(Error::EmbeddingUnavailable(format!(
                "Ollama embed request failed with status {}: {}",
                status, error_text
            )));
        }

        let parsed: EmbedResponse = response
            .json()
            .await
            .map_err(|e| Error::EmbeddingUnavailable(format!("unreadable embed response: {}", e)))?;

        if let Some(error) = parsed.error {
            return Err(Error::EmbeddingUnavailable(error));
        }
        if parsed.embeddings.len() != input.len() {
            return Err(Error::EmbeddingUnavailable(format!(
                "Ollama returned {} embeddings for {} inputs",
                parsed.embeddings.len(),
                input.len()
            )));
        }

        Ok(parsed.embeddings)
    }
}

#[async_trait]
impl Embedder for OllamaEmbedder {
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        let mut vectors = self.embed_batch(&[text.to_string()]).await?;
        vectors
            .pop()
            .ok_or_else(|| Error::EmbeddingUnavailable("no embedding returned".to_string()))
    }

    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        let mut vectors = Vec::with_capacity(texts.len());
        for batch in texts.chunks(MAX_BATCH) {
            let embedded = match timeout(self.config.timeout(), self.request(batch)).await {
                Ok(result) => result?,
                Err(_) => {
                    return Err(Error::EmbeddingUnavailable(
                        "embedding request timed out".to_string(),
                    ));
                }
            };
            vectors.extend(embedded);
        }
        Ok(vectors)
    }

    fn model_id(&self) -> &str {
        &self.config.embed_model
    }
}
