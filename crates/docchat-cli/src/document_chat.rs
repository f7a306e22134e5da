//! Chat grounded in uploaded documents

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use docchat_core::{
    ChatMessage, Conversation, ConversationState, Document, DocumentIndexer, Error,
    IngestionReport, LLMProvider, RAGEngine, RAGQuery, Result, ScoredRecord,
};
use docchat_rag::grounded_messages;

use crate::chat::{collect_stream, require_input};

/// An answer together with the passages it was grounded in
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Answer {
    pub text: String,
    pub passages: Vec<ScoredRecord>,
}

/// Outcome of an upload
#[derive(Debug)]
pub struct UploadOutcome {
    /// Documents committed to the store, in upload order
    pub committed: Vec<IngestionReport>,
    /// The failure that stopped the upload, if any
    pub error: Option<Error>,
    /// Conversation state after the upload
    pub state: ConversationState,
}

/// Question answering over an indexed document set
pub struct DocumentChat<R: RAGEngine, D: DocumentIndexer, L: LLMProvider> {
    rag: R,
    indexer: D,
    llm: L,
    conversation: Conversation,
    top_k: usize,
}

impl<R: RAGEngine, D: DocumentIndexer, L: LLMProvider> DocumentChat<R, D, L> {
    pub fn new(rag: R, indexer: D, llm: L, top_k: usize) -> Result<Self> {
        if top_k == 0 {
            return Err(Error::Configuration("top_k must be at least 1".to_string()));
        }
        Ok(Self {
            rag,
            indexer,
            llm,
            conversation: Conversation::new(),
            top_k,
        })
    }

    pub fn conversation(&self) -> &Conversation {
        &self.conversation
    }

    pub fn state(&self) -> ConversationState {
        self.conversation.state()
    }

    pub fn top_k(&self) -> usize {
        self.top_k
    }

    /// Store statistics plus the chunking in use
    pub async fn stats(&self) -> Result<serde_json::Value> {
        let mut stats = self.rag.stats().await?;
        let chunking = self.indexer.chunk_config();
        if let Some(fields) = stats.as_object_mut() {
            fields.insert("chunk_size".to_string(), chunking.max_size.into());
            fields.insert("chunk_overlap".to_string(), chunking.overlap.into());
        }
        Ok(stats)
    }

    /// Ingest documents in order, stopping at the first failure.
    ///
    /// The conversation is reset when at least one document was committed, because
    /// earlier answers were grounded in a corpus that no longer exists.
    pub async fn upload(&mut self, documents: Vec<Document>) -> UploadOutcome {
        let mut committed = Vec::with_capacity(documents.len());
        let mut error = None;

        for document in documents {
            match self.indexer.ingest(document).await {
                Ok(report) => committed.push(report),
                Err(e) => {
                    warn!("Upload stopped: {}", e);
                    error = Some(e);
                    break;
                }
            }
        }

        let state = if committed.is_empty() {
            self.conversation.state()
        } else {
            self.conversation.upload_completed()
        };

        UploadOutcome {
            committed,
            error,
            state,
        }
    }

    /// Retrieve passages without generating an answer
    pub async fn search(&self, question: &str, top_k: usize) -> Result<Vec<ScoredRecord>> {
        let question = require_input(question)?;
        let result = self.rag.retrieve(&RAGQuery::new(question, top_k)).await?;
        Ok(result.passages)
    }

    async fn prepare(&self, question: &str) -> Result<(Vec<ChatMessage>, Vec<ScoredRecord>)> {
        let result = self
            .rag
            .retrieve(&RAGQuery::new(question, self.top_k))
            .await?;
        debug!(
            "Retrieved {} passages for question ({} chars of context)",
            result.passages.len(),
            result.context.len()
        );

        // Earlier turns go between the system prompt and the grounded question
        let mut messages = grounded_messages(&result.context, question);
        let question_turn = messages.split_off(1);
        messages.extend(self.conversation.all().iter().cloned());
        messages.extend(question_turn);
        Ok((messages, result.passages))
    }

    fn record(&mut self, question: &str, answer: &str) -> Result<()> {
        self.conversation.append(ChatMessage::user(question))?;
        self.conversation.append(ChatMessage::assistant(answer))
    }

    pub async fn ask(&mut self, question: &str) -> Result<Answer> {
        let question = require_input(question)?;
        let (messages, passages) = self.prepare(question).await?;
        let result = self.llm.chat(&messages).await?;
        self.record(question, &result.text)?;
        Ok(Answer {
            text: result.text,
            passages,
        })
    }

    pub async fn ask_streaming(
        &mut self,
        question: &str,
        on_fragment: impl FnMut(&str),
    ) -> Result<Answer> {
        let question = require_input(question)?;
        let (messages, passages) = self.prepare(question).await?;
        let stream = self.llm.chat_stream(&messages).await?;
        let text = collect_stream(stream, on_fragment).await?;
        self.record(question, &text)?;
        Ok(Answer { text, passages })
    }
}
