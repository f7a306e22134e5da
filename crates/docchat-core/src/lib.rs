//! Core traits and types for docchat
//!
//! This crate defines the fundamental traits and types used across the docchat system.
//! It provides capability-facing interfaces for embedders, vector stores, document
//! indexers, RAG engines and chat models, keeping every collaborator swappable in tests.

pub mod conversation;
pub mod document_indexer;
pub mod embedder;
pub mod error;
pub mod llm;
pub mod rag;
pub mod vector_store;

pub use conversation::{Conversation, ConversationState};
pub use document_indexer::{Chunk, ChunkConfig, Document, DocumentIndexer, IngestionReport};
pub use embedder::Embedder;
pub use error::{Error, Result};
pub use llm::{ChatMessage, GenerationResult, LLMProvider, Role, TextStream};
pub use rag::{PASSAGE_SEPARATOR, RAGEngine, RAGQuery, RAGResult};
pub use vector_store::{EmbeddingRecord, ScoredRecord, StoreStats, VectorStore};
