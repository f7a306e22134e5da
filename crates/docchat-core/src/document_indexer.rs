//! Document indexer trait and types

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::{Error, Result};

/// Raw uploaded content, alive only for the duration of an ingestion
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Document {
    /// Unique source identifier (file path, upload name, ...)
    pub source: String,
    pub content: Vec<u8>,
    /// Declared text encoding; detected during ingestion when absent
    pub encoding: Option<String>,
}

impl Document {
    pub fn new(source: impl Into<String>, content: impl Into<Vec<u8>>) -> Self {
        Self {
            source: source.into(),
            content: content.into(),
            encoding: None,
        }
    }

    /// Create a document from text that is already decoded
    pub fn from_text(source: impl Into<String>, text: &str) -> Self {
        Self::new(source, text.as_bytes().to_vec()).with_encoding("utf-8")
    }

    /// Read a document from a local file, using its path as the source identifier
    pub async fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = tokio::fs::read(path).await?;
        Ok(Self::new(path.display().to_string(), content))
    }

    pub fn with_encoding(mut self, encoding: impl Into<String>) -> Self {
        self.encoding = Some(encoding.into());
        self
    }
}

/// Chunking parameters
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChunkConfig {
    /// Maximum chunk length in characters
    pub max_size: usize,
    /// Characters shared by consecutive chunks
    pub overlap: usize,
}

impl ChunkConfig {
    pub fn new(max_size: usize, overlap: usize) -> Result<Self> {
        let config = Self { max_size, overlap };
        config.validate()?;
        Ok(config)
    }

    /// Check `0 <= overlap < max_size`
    pub fn validate(&self) -> Result<()> {
        if self.max_size == 0 {
            return Err(Error::Configuration(
                "chunk max_size must be greater than zero".to_string(),
            ));
        }
        if self.overlap >= self.max_size {
            return Err(Error::Configuration(format!(
                "chunk overlap ({}) must be smaller than max_size ({})",
                self.overlap, self.max_size
            )));
        }
        Ok(())
    }

    /// Distance between the starts of consecutive chunks
    pub fn step(&self) -> usize {
        self.max_size - self.overlap
    }
}

impl Default for ChunkConfig {
    fn default() -> Self {
        Self {
            max_size: 500,
            overlap: 50,
        }
    }
}

/// A contiguous piece of a document's text
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Chunk {
    pub text: String,
    pub source: String,
    /// Ordinal position within the document
    pub index: usize,
    /// Character offset of the first character
    pub start: usize,
    /// Character offset one past the last character
    pub end: usize,
}

/// Result of ingesting one document
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IngestionReport {
    pub source: String,
    pub encoding: String,
    pub chunks_stored: usize,
}

/// Trait for document indexers
///
/// An indexer turns a document into chunks, embeds them and writes them to a vector
/// store as a single batch. A document is either fully indexed or not at all.
#[async_trait]
pub trait DocumentIndexer: Send + Sync {
    /// Index a single document
    async fn ingest(&self, document: Document) -> Result<IngestionReport>;

    /// Index several documents in order, stopping at the first failure.
    ///
    /// Documents committed before the failure stay in the store.
    async fn ingest_all(&self, documents: Vec<Document>) -> Result<Vec<IngestionReport>> {
        let mut reports = Vec::with_capacity(documents.len());
        for document in documents {
            reports.push(self.ingest(document).await?);
        }
        Ok(reports)
    }

    /// Chunking parameters in use
    fn chunk_config(&self) -> ChunkConfig;
}
