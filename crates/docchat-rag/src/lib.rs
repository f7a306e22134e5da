//! Retrieval core for docchat
//!
//! This crate provides the chunker, text decoding, an offline embedder, the file-backed
//! vector store, the ingestion pipeline and the retrieval engine.

pub mod chunker;
pub mod decode;
mod document_indexer;
mod embedder;
mod engine;
mod vector_store;


pub use chunker::{Chunker, split};
pub use decode::{DecodedText, TextEncoding, decode};
pub use document_indexer::IngestionPipeline;
pub use embedder::HashEmbedder;
pub use engine::{GROUNDED_SYSTEM_PROMPT, LocalRAGEngine, grounded_messages};
pub use vector_store::{FileVectorStore, cosine_similarity};

// Re-export core types for convenience
pub use docchat_core::{
    Chunk, ChunkConfig, Document, DocumentIndexer, Embedder, EmbeddingRecord, Error,
    IngestionReport, RAGEngine, RAGQuery, RAGResult, Result, ScoredRecord, StoreStats,
    VectorStore,
};
