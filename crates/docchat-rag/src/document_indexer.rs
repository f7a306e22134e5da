//! Ingestion pipeline: decode, chunk, embed, store

use async_trait::async_trait;
use chrono::Utc;
use serde_json::json;
use std::sync::Arc;
use tracing::{debug, info};

use docchat_core::{
    ChunkConfig, Document, DocumentIndexer, Embedder, EmbeddingRecord, Error,
    IngestionReport, Result, VectorStore,
};

use crate::chunker::Chunker;
use crate::decode::decode;

/// Document indexer that works with any `VectorStore` and `Embedder`.
///
/// Every chunk of a document is embedded before anything is written, and the records
/// are committed as one batch, so a failure leaves no trace of the document.
pub struct IngestionPipeline<V: VectorStore, E: Embedder> {
    vector_store: Arc<V>,
    embedder: Arc<E>,
    chunker: Chunker,
}

impl<V: VectorStore, E: Embedder> IngestionPipeline<V, E> {
    /// Create a new pipeline with default chunking
    pub fn new(vector_store: Arc<V>, embedder: Arc<E>) -> Self {
        Self {
            vector_store,
            embedder,
            chunker: Chunker::default(),
        }
    }

    /// Create with custom chunking; invalid parameters fail before any work
    pub fn with_config(
        vector_store: Arc<V>,
        embedder: Arc<E>,
        config: ChunkConfig,
    ) -> Result<Self> {
        Ok(Self {
            vector_store,
            embedder,
            chunker: Chunker::new(config)?,
        })
    }

    async fn ingest_document(&self, document: Document) -> Result<IngestionReport> {
        let decoded = decode(&document.content, document.encoding.as_deref())?;
        let chunks = self.chunker.split(&document.source, &decoded.text);
        debug!("Split '{}' into {} chunks", document.source, chunks.len());

        let texts: Vec<String> = chunks.iter().map(|c| c.text.clone()).collect();
        let vectors = self.embedder.embed_batch(&texts).await?;
        if vectors.len() != chunks.len() {
            return Err(Error::EmbeddingUnavailable(format!(
                "embedder returned {} vectors for {} chunks",
                vectors.len(),
                chunks.len()
            )));
        }

        let ingested_at = Utc::now().to_rfc3339();
        let total_chunks = chunks.len();
        let records: Vec<EmbeddingRecord> = chunks
            .into_iter()
            .zip(vectors)
            .map(|(chunk, vector)| {
                EmbeddingRecord::new(vector, chunk.text).with_metadata(json!({
                    "source": chunk.source,
                    "chunk_index": chunk.index,
                    "total_chunks": total_chunks,
                    "start": chunk.start,
                    "end": chunk.end,
                    "encoding": decoded.encoding.label(),
                    "embedding_model": self.embedder.model_id(),
                    "ingested_at": ingested_at,
                }))
            })
            .collect();

        let chunks_stored = self.vector_store.add(records).await?;

        Ok(IngestionReport {
            source: document.source,
            encoding: decoded.encoding.label().to_string(),
            chunks_stored,
        })
    }
}

#[async_trait]
impl<V: VectorStore + 'static, E: Embedder + 'static> DocumentIndexer for IngestionPipeline<V, E> {
    async fn ingest(&self, document: Document) -> Result<IngestionReport> {
        let source = document.source.clone();
        info!("Ingesting '{}' ({} bytes)", source, document.content.len());

        let report = self
            .ingest_document(document)
            .await
            .map_err(|e| Error::ingestion(&source, e))?;

        info!("Stored {} chunks from '{}'", report.chunks_stored, report.source);
        Ok(report)
    }

    fn chunk_config(&self) -> ChunkConfig {
        self.chunker.config()
    }
}
