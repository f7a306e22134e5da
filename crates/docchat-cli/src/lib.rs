//! Interactive front end for docchat
//!
//! Chat sessions, document chat, summaries and the terminal helpers used by the
//! `docchat` binary.

mod backend;
mod chat;
mod config;
mod document_chat;
mod summarizer;
pub mod ui;

#[cfg(test)]
mod tests;

pub use backend::EmbedderBackend;
pub use chat::{ChatSession, collect_stream};
pub use config::{AppConfig, DEFAULT_STORE_PATH, DEFAULT_TOP_K, EmbedderKind};
pub use document_chat::{Answer, DocumentChat, UploadOutcome};
pub use summarizer::{SUMMARY_INPUT_LIMIT, SUMMARY_SYSTEM_PROMPT, Summarizer, truncate_input};

// Re-export core types for convenience
pub use docchat_core::{ConversationState, Document, Error, Result};
