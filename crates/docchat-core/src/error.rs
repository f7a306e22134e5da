//! Error types for docchat

use thiserror::Error;

/// Result type alias using our custom Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Core error types for the docchat system
///
/// Every failure leaves previously committed state untouched: ingestion batches are
/// all-or-nothing, so a caller never has to repair a half-written store.
#[derive(Error, Debug)]
pub enum Error {
    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Embedding unavailable: {0}")]
    EmbeddingUnavailable(String),

    #[error("Dimension mismatch: store holds {expected}-dimensional vectors, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },

    #[error("Invalid query: {0}")]
    InvalidQuery(String),

    #[error("Ingestion of '{document}' failed: {source}")]
    IngestionFailed {
        document: String,
        #[source]
        source: Box<Error>,
    },

    #[error("LLM provider error: {0}")]
    LLMProvider(String),

    #[error("Vector store error: {0}")]
    VectorStore(String),

    #[error("Decoding error: {0}")]
    Decoding(String),

    #[error("Network error: {0}")]
    Network(String),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Timeout error: {0}")]
    Timeout(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Other error: {0}")]
    Other(String),
}

impl Error {
    /// Wrap a step failure into `IngestionFailed` for the named document
    pub fn ingestion(document: impl Into<String>, source: Error) -> Self {
        Error::IngestionFailed {
            document: document.into(),
            source: Box::new(source),
        }
    }

    /// Whether retrying the same call could succeed
    pub fn is_transient(&self) -> bool {
        match self {
            Error::EmbeddingUnavailable(_)
            | Error::LLMProvider(_)
            | Error::Network(_)
            | Error::Timeout(_)
            | Error::Io(_) => true,
            Error::IngestionFailed { source, .. } => source.is_transient(),
            _ => false,
        }
    }
}

impl From<anyhow::Error> for Error {
    fn from(err: anyhow::Error) -> Self {
        Error::Other(err.to_string())
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::Serialization(err.to_string())
    }
}
