//! Error types for vidchat.

use thiserror::Error;

/// Library-level error type for vidchat operations.
#[derive(Error, Debug)]
pub enum VidchatError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Transcript source error: {0}")]
    Source(String),

    #[error("Transcript fetch failed: {0}")]
    Transcript(String),

    #[error("Embedding generation failed: {0}")]
    Embedding(String),

    #[error("Vector store error: {0}")]
    VectorStore(String),

    #[error("Moderation failed: {0}")]
    Moderation(String),

    #[error("RAG error: {0}")]
    Rag(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),

    #[error("OpenAI API error: {0}")]
    OpenAI(String),

    #[error("External tool not found: {0}. Please install it and ensure it's in your PATH.")]
    ToolNotFound(String),

    #[error("External tool failed: {0}")]
    ToolFailed(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("The previous question has not been answered yet. Retry it or start over.")]
    TurnPending,

    #[error("No pending question to retry")]
    NothingPending,

    #[error("Chat session not found: {0}")]
    SessionNotFound(String),
}

impl VidchatError {
    /// Whether this error came from a remote provider call rather than from
    /// how the caller drove the session.
    pub fn is_provider_failure(&self) -> bool {
        matches!(
            self,
            VidchatError::Moderation(_)
                | VidchatError::OpenAI(_)
                | VidchatError::Rag(_)
                | VidchatError::Embedding(_)
        )
    }
}

/// Result type alias for vidchat operations.
pub type Result<T> = std::result::Result<T, VidchatError>;
