//! Ollama chat client implementation

use async_trait::async_trait;
use futures::stream::{self, BoxStream, StreamExt};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tokio::time::timeout;
use tracing::{debug, warn};

use docchat_core::{ChatMessage, Error, GenerationResult, LLMProvider, Result, TextStream};

use crate::config::OllamaConfig;

/// Ollama chat client
pub struct OllamaClient {
    config: OllamaConfig,
    client: Client,
    current_model: String,
}

#[derive(Debug, Serialize)]
pub(crate) struct ChatOptions {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(crate) temperature: Option<f32>,
}

#[derive(Debug, Serialize)]
pub(crate) struct ChatRequest<'a> {
    pub(crate) model: &'a str,
    pub(crate) messages: &'a [ChatMessage],
    pub(crate) stream: bool,
    pub(crate) options: ChatOptions,
}

#[derive(Debug, Deserialize)]
struct ResponseMessage {
    #[serde(default)]
    content: String,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    message: Option<ResponseMessage>,
    #[serde(default)]
    done: bool,
    #[serde(default)]
    eval_count: Option<u32>,
    #[serde(default)]
    error: Option<String>,
}

/// One parsed line of a streaming chat response
#[derive(Debug, PartialEq, Eq)]
pub(crate) enum StreamEvent {
    Fragment(String),
    Skip,
    Done,
}

/// Build the shared HTTP client
pub(crate) fn http_client() -> Result<Client> {
    Client::builder()
        .connect_timeout(Duration::from_secs(10))
        .build()
        .map_err(|e| Error::Network(e.to_string()))
}

impl OllamaClient {
    /// Create a new Ollama client from configuration
    pub fn new(config: OllamaConfig) -> Result<Self> {
        config.validate()?;
        let current_model = config.chat_model.clone();

        Ok(Self {
            config,
            client: http_client()?,
            current_model,
        })
    }

    /// Set the model to use for generation
    pub fn with_model(mut self, model_id: impl Into<String>) -> Self {
        self.current_model = model_id.into();
        self
    }

    pub(crate) fn chat_request<'a>(
        &'a self,
        messages: &'a [ChatMessage],
        stream: bool,
    ) -> ChatRequest<'a> {
        ChatRequest {
            model: &self.current_model,
            messages,
            stream,
            options: ChatOptions {
                temperature: self.config.temperature,
            },
        }
    }

    async fn send(&self, request: &ChatRequest<'_>) -> Result<reqwest::Response> {
        let url = self.config.endpoint("/api/chat");
        debug!("POST {} ({} messages, stream={})", url, request.messages.len(), request.stream);

        let response = self
            .client
            .post(&url)
            .json(request)
            .send()
            .await
            .map_err(|e| Error::Network(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(Error::LLMProvider(format!(
                "Ollama chat request failed with status {}: {}",
                status, error_text
            )));
        }

        Ok(response)
    }

    /// Perform a non-streaming chat request
    async fn perform_chat(&self, messages: &[ChatMessage]) -> Result<GenerationResult> {
        let request = self.chat_request(messages, false);
        let response = self.send(&request).await?;

        let body: ChatResponse = response
            .json()
            .await
            .map_err(|e| Error::Serialization(e.to_string()))?;

        if let Some(error) = body.error {
            return Err(Error::LLMProvider(error));
        }

        let text = body.message.map(|m| m.content).unwrap_or_default();
        if text.trim().is_empty() {
            return Err(Error::LLMProvider("Empty response from Ollama".to_string()));
        }

        Ok(GenerationResult {
            text: text.trim().to_string(),
            model_id: self.current_model.clone(),
            tokens_used: body.eval_count,
        })
    }
}

/// Parse one NDJSON line of a streaming chat response
pub(crate) fn parse_stream_line(line: &str) -> Result<StreamEvent> {
    let line = line.trim();
    if line.is_empty() {
        return Ok(StreamEvent::Skip);
    }

    let chunk: ChatResponse =
        serde_json::from_str(line).map_err(|e| Error::Serialization(e.to_string()))?;

    if let Some(error) = chunk.error {
        return Err(Error::LLMProvider(error));
    }

    match chunk.message {
        Some(message) if !message.content.is_empty() => Ok(StreamEvent::Fragment(message.content)),
        _ if chunk.done => Ok(StreamEvent::Done),
        _ => Ok(StreamEvent::Skip),
    }
}

struct NdjsonState {
    bytes: BoxStream<'static, Result<Vec<u8>>>,
    buffer: Vec<u8>,
    finished: bool,
}

fn take_line(buffer: &mut Vec<u8>) -> Option<String> {
    let newline = buffer.iter().position(|b| *b == b'\n')?;
    let line: Vec<u8> = buffer.drain(..=newline).collect();
    Some(String::from_utf8_lossy(&line).into_owned())
}

async fn next_fragment(state: &mut NdjsonState) -> Option<Result<String>> {
    loop {
        if state.finished {
            return None;
        }

        if let Some(line) = take_line(&mut state.buffer) {
            match parse_stream_line(&line) {
                Ok(StreamEvent::Fragment(text)) => return Some(Ok(text)),
                Ok(StreamEvent::Skip) => continue,
                Ok(StreamEvent::Done) => {
                    state.finished = true;
                    return None;
                }
                Err(e) => {
                    state.finished = true;
                    return Some(Err(e));
                }
            }
        }

        match state.bytes.next().await {
            Some(Ok(chunk)) => state.buffer.extend_from_slice(&chunk),
            Some(Err(e)) => {
                state.finished = true;
                return Some(Err(e));
            }
            None if state.buffer.is_empty() => return None,
            // Final line without a trailing newline
            None => state.buffer.push(b'\n'),
        }
    }
}

/// Turn a byte stream of NDJSON chat chunks into text fragments
pub(crate) fn ndjson_fragments(bytes: BoxStream<'static, Result<Vec<u8>>>) -> TextStream {
    let state = NdjsonState {
        bytes: bytes.fuse().boxed(),
        buffer: Vec::new(),
        finished: false,
    };

    stream::unfold(state, |mut state| async move {
        next_fragment(&mut state).await.map(|item| (item, state))
    })
    .boxed()
}

#[async_trait]
impl LLMProvider for OllamaClient {
    async fn chat(&self, messages: &[ChatMessage]) -> Result<GenerationResult> {
        let chat_future = self.perform_chat(messages);

        match timeout(self.config.timeout(), chat_future).await {
            Ok(result) => result,
            Err(_) => Err(Error::Timeout("Request timed out".to_string())),
        }
    }

    async fn chat_stream(&self, messages: &[ChatMessage]) -> Result<TextStream> {
        let request = self.chat_request(messages, true);
        let response = match timeout(self.config.timeout(), self.send(&request)).await {
            Ok(result) => result?,
            Err(_) => return Err(Error::Timeout("Request timed out".to_string())),
        };

        let bytes = response
            .bytes_stream()
            .map(|chunk| {
                chunk.map(|b| b.to_vec()).map_err(|e| {
                    warn!("Ollama stream interrupted: {}", e);
                    Error::Network(e.to_string())
                })
            })
            .boxed();

        Ok(ndjson_fragments(bytes))
    }

    fn model_id(&self) -> &str {
        &self.current_model
    }
}
