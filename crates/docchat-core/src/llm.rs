//! LLM provider trait and types

use async_trait::async_trait;
use futures::stream::BoxStream;
use serde::{Deserialize, Serialize};

use crate::Result;

/// Who authored a chat message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Role::System => "system",
            Role::User => "user",
            Role::Assistant => "assistant",
        };
        f.write_str(name)
    }
}

/// A single message sent to or received from a chat model
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self { role: Role::System, content: content.into() }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self { role: Role::User, content: content.into() }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self { role: Role::Assistant, content: content.into() }
    }
}

/// Result of a text generation request
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerationResult {
    pub text: String,
    pub model_id: String,
    pub tokens_used: Option<u32>,
}

/// Fragments of a response in arrival order
pub type TextStream = BoxStream<'static, Result<String>>;

/// Trait for chat model providers (e.g., Ollama)
///
/// The retrieval core only needs `generate`; whole-history chat and streaming serve
/// the interactive sessions.
#[async_trait]
pub trait LLMProvider: Send + Sync {
    /// Send a full message history and wait for the whole answer
    async fn chat(&self, messages: &[ChatMessage]) -> Result<GenerationResult>;

    /// Send a full message history and receive the answer as it is produced
    async fn chat_stream(&self, messages: &[ChatMessage]) -> Result<TextStream>;

    /// Answer a single prompt under a system instruction
    async fn generate(&self, system_prompt: &str, user_prompt: &str) -> Result<GenerationResult> {
        let messages = [ChatMessage::system(system_prompt), ChatMessage::user(user_prompt)];
        self.chat(&messages).await
    }

    /// Get the model ID being used
    fn model_id(&self) -> &str;
}
