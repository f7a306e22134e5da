//! Session tests against a scripted model

#[cfg(test)]
mod session_tests {
    use crate::{
        ChatSession, ConversationState, Document, DocumentChat, Error, SUMMARY_INPUT_LIMIT,
        Summarizer,
    };
    use async_trait::async_trait;
    use docchat_core::{ChatMessage, GenerationResult, LLMProvider, Result, TextStream};
    use docchat_rag::{FileVectorStore, HashEmbedder, IngestionPipeline, LocalRAGEngine};
    use futures::StreamExt;
    use insta::assert_snapshot;
    use std::collections::VecDeque;
    use std::sync::{Arc, Mutex};

    /// Replies with scripted answers and records every request
    #[derive(Clone, Default)]
    struct ScriptedModel {
        replies: Arc<Mutex<VecDeque<Result<String>>>>,
        requests: Arc<Mutex<Vec<Vec<ChatMessage>>>>,
    }

    impl ScriptedModel {
        fn new(replies: impl IntoIterator<Item = Result<String>>) -> Self {
            Self {
                replies: Arc::new(Mutex::new(replies.into_iter().collect())),
                requests: Arc::default(),
            }
        }

        fn next_reply(&self, messages: &[ChatMessage]) -> Result<String> {
            self.requests.lock().unwrap().push(messages.to_vec());
            self.replies
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| Err(Error::LLMProvider("script exhausted".to_string())))
        }

        fn last_request(&self) -> Vec<ChatMessage> {
            self.requests.lock().unwrap().last().cloned().unwrap_or_default()
        }
    }

    #[async_trait]
    impl LLMProvider for ScriptedModel {
        async fn chat(&self, messages: &[ChatMessage]) -> Result<GenerationResult> {
            Ok(GenerationResult {
                text: self.next_reply(messages)?,
                model_id: "scripted".to_string(),
                tokens_used: None,
            })
        }

        async fn chat_stream(&self, messages: &[ChatMessage]) -> Result<TextStream> {
            let reply = self.next_reply(messages)?;
            let fragments: Vec<Result<String>> = reply
                .split_inclusive(' ')
                .map(|fragment| Ok(fragment.to_string()))
                .collect();
            Ok(futures::stream::iter(fragments).boxed())
        }

        fn model_id(&self) -> &str {
            "scripted"
        }
    }

    fn render(messages: &[ChatMessage]) -> String {
        messages
            .iter()
            .map(|m| format!("{}: {}", m.role, m.content))
            .collect::<Vec<_>>()
            .join("\n---\n")
    }

    type Docs = DocumentChat<
        LocalRAGEngine<FileVectorStore, HashEmbedder>,
        IngestionPipeline<FileVectorStore, HashEmbedder>,
        ScriptedModel,
    >;

    fn document_chat(model: ScriptedModel) -> Docs {
        let store = Arc::new(FileVectorStore::in_memory());
        let embedder = Arc::new(HashEmbedder::default());
        DocumentChat::new(
            LocalRAGEngine::new(Arc::clone(&store), Arc::clone(&embedder)),
            IngestionPipeline::new(store, embedder),
            model,
            1,
        )
        .unwrap()
    }

    #[tokio::test]
    async fn test_chat_sends_full_history() {
        let model = ScriptedModel::new([Ok("Hi there.".to_string()), Ok("Rust.".to_string())]);
        let mut session = ChatSession::new(model.clone());

        session.send("Hello").await.unwrap();
        let answer = session.send("What language is this?").await.unwrap();

        assert_eq!(answer, "Rust.");
        assert_eq!(session.conversation().len(), 4);
        assert_snapshot!(render(&model.last_request()), @r"
        user: Hello
        ---
        assistant: Hi there.
        ---
        user: What language is this?
        ");
    }

    #[tokio::test]
    async fn test_failed_chat_keeps_history() {
        let model = ScriptedModel::new([
            Ok("First.".to_string()),
            Err(Error::Network("connection reset".to_string())),
        ]);
        let mut session = ChatSession::new(model);

        session.send("one").await.unwrap();
        let result = session.send("two").await;

        assert!(matches!(result, Err(Error::Network(_))));
        assert_eq!(session.conversation().len(), 2);
    }

    #[tokio::test]
    async fn test_empty_message_is_rejected_without_a_request() {
        let model = ScriptedModel::default();
        let mut session = ChatSession::new(model.clone());

        assert!(matches!(session.send("   ").await, Err(Error::InvalidInput(_))));
        assert!(model.requests.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_streaming_reports_fragments_in_order() {
        let model = ScriptedModel::new([Ok("one two three".to_string())]);
        let mut session = ChatSession::new(model);
        let mut seen = Vec::new();

        let answer = session
            .send_streaming("count", |fragment| seen.push(fragment.to_string()))
            .await
            .unwrap();

        assert_eq!(seen, vec!["one ", "two ", "three"]);
        assert_eq!(answer, "one two three");
        assert_eq!(session.conversation().all()[1].content, "one two three");
    }

    #[tokio::test]
    async fn test_document_question_is_grounded() {
        let model = ScriptedModel::new([Ok("On the mat.".to_string())]);
        let mut chat = document_chat(model.clone());

        let outcome = chat
            .upload(vec![Document::from_text(
                "pets.txt",
                "The cat sat on the mat. The dog ran in the park.",
            )])
            .await;
        assert!(outcome.error.is_none());
        assert_eq!(outcome.committed.len(), 1);

        let answer = chat.ask("Where did the cat sit?").await.unwrap();

        assert_eq!(answer.text, "On the mat.");
        assert_eq!(answer.passages.len(), 1);
        assert_eq!(chat.state(), ConversationState::Active);
        assert_snapshot!(render(&model.last_request()), @r"
        system: Use the retrieved context to answer the user's query.
        ---
        user: Context: The cat sat on the mat. The dog ran in the park.

        Query: Where did the cat sit?
        ");
    }

    #[tokio::test]
    async fn test_follow_up_question_carries_history() {
        let model = ScriptedModel::new([
            Ok("On the mat.".to_string()),
            Ok("In the park.".to_string()),
        ]);
        let mut chat = document_chat(model.clone());
        chat.upload(vec![Document::from_text("pets.txt", "The dog ran in the park.")])
            .await;

        chat.ask("Where did the cat sit?").await.unwrap();
        chat.ask_streaming("And the dog?", |_| {}).await.unwrap();

        let request = model.last_request();
        assert_eq!(request.len(), 4);
        assert_eq!(request[1].content, "Where did the cat sit?");
        assert_eq!(request[2].content, "On the mat.");
        assert!(request[3].content.ends_with("Query: And the dog?"));
        assert_eq!(chat.conversation().len(), 4);
    }

    #[tokio::test]
    async fn test_upload_resets_conversation() {
        let model = ScriptedModel::new([Ok("Nothing indexed yet.".to_string())]);
        let mut chat = document_chat(model.clone());

        chat.ask("Anything?").await.unwrap();
        assert_eq!(chat.state(), ConversationState::Active);
        // Nothing indexed: the question was answered without context
        assert!(model.last_request()[1].content.starts_with("Context: \n\nQuery:"));

        let outcome = chat
            .upload(vec![Document::from_text("notes.txt", "Fresh notes.")])
            .await;

        assert_eq!(outcome.state, ConversationState::Empty);
        assert!(chat.conversation().is_empty());
    }

    #[tokio::test]
    async fn test_failed_upload_keeps_conversation() {
        let model = ScriptedModel::new([Ok("Sure.".to_string())]);
        let mut chat = document_chat(model);
        chat.ask("Hello?").await.unwrap();

        let outcome = chat
            .upload(vec![Document::from_text("bad.txt", "text").with_encoding("klingon")])
            .await;

        assert!(outcome.committed.is_empty());
        assert!(outcome.error.is_some());
        assert_eq!(outcome.state, ConversationState::Active);
        assert_eq!(chat.conversation().len(), 2);
    }

    #[tokio::test]
    async fn test_partial_upload_keeps_committed_documents() {
        let mut chat = document_chat(ScriptedModel::default());

        let outcome = chat
            .upload(vec![
                Document::from_text("a.txt", "alpha"),
                Document::from_text("b.txt", "beta").with_encoding("klingon"),
                Document::from_text("c.txt", "gamma"),
            ])
            .await;

        assert_eq!(outcome.committed.len(), 1);
        assert_eq!(outcome.committed[0].source, "a.txt");
        assert!(matches!(outcome.error, Some(Error::IngestionFailed { .. })));

        let stats = chat.stats().await.unwrap();
        assert_eq!(stats["records"], 1);
    }

    #[tokio::test]
    async fn test_summarizer_truncates_input() {
        let model = ScriptedModel::new([Ok("Short.".to_string())]);
        let summarizer = Summarizer::new(model.clone());
        let text = "word ".repeat(2000);

        let summary = summarizer.summarize(&text).await.unwrap();

        assert_eq!(summary, "Short.");
        let request = model.last_request();
        assert_snapshot!(
            request[0].content.as_str(),
            @"Summarize the following text into a short and clear summary."
        );
        assert_eq!(request[1].content.chars().count(), SUMMARY_INPUT_LIMIT);
    }

    #[tokio::test]
    async fn test_summarizer_rejects_empty_text() {
        let summarizer = Summarizer::new(ScriptedModel::default());
        assert!(matches!(summarizer.summarize(" \n").await, Err(Error::InvalidInput(_))));
    }
}
