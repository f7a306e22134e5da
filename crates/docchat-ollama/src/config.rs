//! Ollama configuration

use serde::{Deserialize, Serialize};
use std::time::Duration;
use url::Url;

use docchat_core::{Error, Result};

pub const DEFAULT_BASE_URL: &str = "http://localhost:11434";
pub const DEFAULT_CHAT_MODEL: &str = "mistral";
pub const DEFAULT_EMBED_MODEL: &str = "all-minilm";
pub const DEFAULT_TIMEOUT_SECS: u64 = 120;

/// Configuration for the Ollama client
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OllamaConfig {
    pub base_url: String,
    pub chat_model: String,
    pub embed_model: String,
    pub timeout_secs: u64,
    pub temperature: Option<f32>,
}

impl OllamaConfig {
    /// Create configuration from a key lookup such as `std::env::var`
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let base_url = lookup("OLLAMA_URL")
            .or_else(|| lookup("OLLAMA_HOST"))
            .unwrap_or_else(|| DEFAULT_BASE_URL.to_string());

        let chat_model =
            lookup("OLLAMA_CHAT_MODEL").unwrap_or_else(|| DEFAULT_CHAT_MODEL.to_string());

        let embed_model =
            lookup("OLLAMA_EMBED_MODEL").unwrap_or_else(|| DEFAULT_EMBED_MODEL.to_string());

        let timeout_secs = match lookup("OLLAMA_TIMEOUT_SECS") {
            Some(value) => value.trim().parse().map_err(|_| {
                Error::Configuration(format!(
                    "OLLAMA_TIMEOUT_SECS must be a number, got '{}'",
                    value
                ))
            })?,
            None => DEFAULT_TIMEOUT_SECS,
        };

        let temperature = match lookup("OLLAMA_TEMPERATURE") {
            Some(value) => Some(value.trim().parse().map_err(|_| {
                Error::Configuration(format!(
                    "OLLAMA_TEMPERATURE must be a number, got '{}'",
                    value
                ))
            })?),
            None => None,
        };

        let config = Self {
            base_url,
            chat_model,
            embed_model,
            timeout_secs,
            temperature,
        };
        config.validate()?;
        Ok(config)
    }

    /// Create configuration with an explicit server URL and default models
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            chat_model: DEFAULT_CHAT_MODEL.to_string(),
            embed_model: DEFAULT_EMBED_MODEL.to_string(),
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            temperature: None,
        }
    }

    pub fn validate(&self) -> Result<()> {
        let url = Url::parse(&self.base_url).map_err(|e| {
            Error::Configuration(format!("invalid Ollama URL '{}': {}", self.base_url, e))
        })?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(Error::Configuration(format!(
                "Ollama URL must use http or https, got '{}'",
                url.scheme()
            )));
        }
        if self.chat_model.trim().is_empty() || self.embed_model.trim().is_empty() {
            return Err(Error::Configuration("model names must not be empty".to_string()));
        }
        if self.timeout_secs == 0 {
            return Err(Error::Configuration("timeout must be at least one second".to_string()));
        }
        Ok(())
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Full URL of an API path such as `/api/chat`
    pub fn endpoint(&self, path: &str) -> String {
        format!("{}{}", self.base_url.trim_end_matches('/'), path)
    }
}

impl Default for OllamaConfig {
    fn default() -> Self {
        Self::new(DEFAULT_BASE_URL)
    }
}
