//! Answering engine: condense-question retrieval-augmented generation.
//!
//! A user turn is first rewritten into a standalone question using the prior
//! conversation, the corpus index is searched with that question, and the
//! completion model answers from the retrieved passages.

pub mod context;
mod engine;
mod llm;
mod rewrite;

pub use context::ContextBuilder;
pub use engine::{Answer, Answerer, ChatEngine, NO_CONTEXT_ANSWER};
pub use llm::{CompletionModel, OpenAIChatModel};
pub use rewrite::{CondenseQuestionRewriter, QuestionRewriter, VerbatimRewriter};

use crate::vector_store::SearchResult;
use serde::Serialize;

/// A retrieved passage with display details.
#[derive(Debug, Clone, Serialize)]
pub struct ContextChunk {
    /// Video ID.
    pub video_id: String,
    /// Source identifier as listed in the source file.
    pub source: String,
    /// Formatted timestamp (e.g., "02:34").
    pub timestamp: String,
    /// Start time in seconds.
    pub start_seconds: f64,
    /// Text content.
    pub content: String,
    /// Similarity score.
    pub score: f32,
    /// Watch URL at the passage start.
    pub url: Option<String>,
}

impl From<SearchResult> for ContextChunk {
    fn from(result: SearchResult) -> Self {
        Self {
            timestamp: result.document.format_timestamp(),
            video_id: result.document.video_id,
            source: result.document.source,
            start_seconds: result.document.start_seconds,
            content: result.document.content,
            score: result.score,
            url: None,
        }
    }
}
