//! Ollama integration for docchat
//!
//! This crate provides the Ollama implementations of the `LLMProvider` and `Embedder`
//! traits.

mod client;
mod config;
mod embedder;

#[cfg(test)]
mod tests;

pub use client::OllamaClient;
pub use config::{
    DEFAULT_BASE_URL, DEFAULT_CHAT_MODEL, DEFAULT_EMBED_MODEL, DEFAULT_TIMEOUT_SECS, OllamaConfig,
};
pub use embedder::OllamaEmbedder;

// Re-export core types for convenience
pub use docchat_core::{ChatMessage, Embedder, Error, GenerationResult, LLMProvider, Result};
