//! Application configuration

use serde::{Deserialize, Serialize};
use std::env;
use std::path::PathBuf;
use std::str::FromStr;

use docchat_core::{ChunkConfig, Error, Result};
use docchat_ollama::OllamaConfig;

pub const DEFAULT_STORE_PATH: &str = "./docchat_store.json";
pub const DEFAULT_TOP_K: usize = 3;

/// Which embedder backs ingestion and retrieval
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EmbedderKind {
    /// Embedding model served by Ollama
    Ollama,
    /// Offline feature-hashing embedder
    Hash,
}

impl FromStr for EmbedderKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "ollama" => Ok(EmbedderKind::Ollama),
            "hash" | "local" => Ok(EmbedderKind::Hash),
            other => Err(Error::Configuration(format!(
                "unknown embedder '{}', expected 'ollama' or 'hash'",
                other
            ))),
        }
    }
}

/// Complete configuration of a docchat process
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AppConfig {
    pub ollama: OllamaConfig,
    pub store_path: PathBuf,
    pub chunk: ChunkConfig,
    pub top_k: usize,
    pub embedder: EmbedderKind,
}

fn parse_number(key: &str, value: Option<String>, default: usize) -> Result<usize> {
    match value {
        Some(raw) => raw.trim().parse().map_err(|_| {
            Error::Configuration(format!("{} must be a non-negative integer, got '{}'", key, raw))
        }),
        None => Ok(default),
    }
}

impl AppConfig {
    /// Load configuration from `.env` and the process environment
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Load configuration from an arbitrary key lookup
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let ollama = OllamaConfig::from_lookup(&lookup)?;

        let store_path = lookup("DOCCHAT_STORE_PATH")
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_STORE_PATH));

        let defaults = ChunkConfig::default();
        let chunk = ChunkConfig {
            max_size: parse_number(
                "DOCCHAT_CHUNK_SIZE",
                lookup("DOCCHAT_CHUNK_SIZE"),
                defaults.max_size,
            )?,
            overlap: parse_number(
                "DOCCHAT_CHUNK_OVERLAP",
                lookup("DOCCHAT_CHUNK_OVERLAP"),
                defaults.overlap,
            )?,
        };

        let top_k = parse_number("DOCCHAT_TOP_K", lookup("DOCCHAT_TOP_K"), DEFAULT_TOP_K)?;

        let embedder = match lookup("DOCCHAT_EMBEDDER") {
            Some(value) => value.parse()?,
            None => EmbedderKind::Ollama,
        };

        let config = Self {
            ollama,
            store_path,
            chunk,
            top_k,
            embedder,
        };
        config.validate()?;
        Ok(config)
    }

    /// Check every parameter before any work starts
    pub fn validate(&self) -> Result<()> {
        self.ollama.validate()?;
        self.chunk.validate()?;
        if self.top_k == 0 {
            return Err(Error::Configuration("top_k must be at least 1".to_string()));
        }
        Ok(())
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            ollama: OllamaConfig::default(),
            store_path: PathBuf::from(DEFAULT_STORE_PATH),
            chunk: ChunkConfig::default(),
            top_k: DEFAULT_TOP_K,
            embedder: EmbedderKind::Ollama,
        }
    }
}
