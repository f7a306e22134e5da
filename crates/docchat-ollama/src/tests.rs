//! Snapshot tests for the Ollama client

#[cfg(test)]
mod snapshot_tests {
    use crate::client::OllamaClient;
    use crate::embedder::EmbedRequest;
    use crate::{ChatMessage, OllamaConfig};
    use insta::assert_yaml_snapshot;

    #[test]
    fn test_config_snapshot() {
        let config = OllamaConfig::new("http://localhost:11434");

        assert_yaml_snapshot!(config, @r#"
        base_url: "http://localhost:11434"
        chat_model: mistral
        embed_model: all-minilm
        timeout_secs: 120
        temperature: ~
        "#);
    }

    #[test]
    fn test_chat_request_snapshot() {
        let mut config = OllamaConfig::default();
        config.temperature = Some(0.5);
        let client = OllamaClient::new(config).unwrap();

        let messages = vec![
            ChatMessage::system("Use the retrieved context to answer the user's query."),
            ChatMessage::user("Where did the cat sit?"),
        ];

        assert_yaml_snapshot!(client.chat_request(&messages, true), @r#"
        model: mistral
        messages:
          - role: system
            content: "Use the retrieved context to answer the user's query."
          - role: user
            content: Where did the cat sit?
        stream: true
        options:
          temperature: 0.5
        "#);
    }

    #[test]
    fn test_embed_request_snapshot() {
        let input = vec!["first chunk".to_string(), "second chunk".to_string()];
        let request = EmbedRequest {
            model: "all-minilm",
            input: &input,
        };

        assert_yaml_snapshot!(request, @r#"
        model: all-minilm
        input:
          - first chunk
          - second chunk
        "#);
    }
}
