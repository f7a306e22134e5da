//! Plain chat without retrieval

use futures::StreamExt;

use docchat_core::{ChatMessage, Conversation, Error, LLMProvider, Result, TextStream};

/// Drain a fragment stream, handing every fragment to `on_fragment` as it arrives
pub async fn collect_stream(
    mut stream: TextStream,
    mut on_fragment: impl FnMut(&str),
) -> Result<String> {
    let mut full = String::new();
    while let Some(fragment) = stream.next().await {
        let fragment = fragment?;
        on_fragment(&fragment);
        full.push_str(&fragment);
    }
    if full.is_empty() {
        return Err(Error::LLMProvider("model returned an empty response".to_string()));
    }
    Ok(full)
}

pub(crate) fn require_input(input: &str) -> Result<&str> {
    let input = input.trim();
    if input.is_empty() {
        return Err(Error::InvalidInput("message is empty".to_string()));
    }
    Ok(input)
}

/// A conversation with the model where every message carries the full history.
///
/// Turns are only recorded once the model has answered, so a failed request leaves
/// the history as it was.
pub struct ChatSession<L: LLMProvider> {
    llm: L,
    conversation: Conversation,
}

impl<L: LLMProvider> ChatSession<L> {
    pub fn new(llm: L) -> Self {
        Self {
            llm,
            conversation: Conversation::new(),
        }
    }

    pub fn conversation(&self) -> &Conversation {
        &self.conversation
    }

    pub fn model_id(&self) -> &str {
        self.llm.model_id()
    }

    fn messages_with(&self, input: &str) -> Vec<ChatMessage> {
        let mut messages = self.conversation.all().to_vec();
        messages.push(ChatMessage::user(input));
        messages
    }

    fn record(&mut self, input: &str, answer: &str) -> Result<()> {
        self.conversation.append(ChatMessage::user(input))?;
        self.conversation.append(ChatMessage::assistant(answer))
    }

    pub async fn send(&mut self, input: &str) -> Result<String> {
        let input = require_input(input)?;
        let messages = self.messages_with(input);
        let result = self.llm.chat(&messages).await?;
        self.record(input, &result.text)?;
        Ok(result.text)
    }

    pub async fn send_streaming(
        &mut self,
        input: &str,
        on_fragment: impl FnMut(&str),
    ) -> Result<String> {
        let input = require_input(input)?;
        let messages = self.messages_with(input);
        let stream = self.llm.chat_stream(&messages).await?;
        let answer = collect_stream(stream, on_fragment).await?;
        self.record(input, &answer)?;
        Ok(answer)
    }
}
