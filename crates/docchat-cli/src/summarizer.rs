//! One-shot summaries

use docchat_core::{Error, LLMProvider, Result};

/// Number of characters of input sent to the model
pub const SUMMARY_INPUT_LIMIT: usize = 4000;

pub const SUMMARY_SYSTEM_PROMPT: &str =
    "Summarize the following text into a short and clear summary.";

/// The first `SUMMARY_INPUT_LIMIT` characters of `text`
pub fn truncate_input(text: &str) -> &str {
    match text.char_indices().nth(SUMMARY_INPUT_LIMIT) {
        Some((byte_index, _)) => &text[..byte_index],
        None => text,
    }
}

pub struct Summarizer<L: LLMProvider> {
    llm: L,
}

impl<L: LLMProvider> Summarizer<L> {
    pub fn new(llm: L) -> Self {
        Self { llm }
    }

    pub async fn summarize(&self, text: &str) -> Result<String> {
        let text = text.trim();
        if text.is_empty() {
            return Err(Error::InvalidInput("nothing to summarize".to_string()));
        }
        let result = self
            .llm
            .generate(SUMMARY_SYSTEM_PROMPT, truncate_input(text))
            .await?;
        Ok(result.text)
    }
}
