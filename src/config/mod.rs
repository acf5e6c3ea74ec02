//! Configuration module for vidchat.
//!
//! Handles loading and managing application settings and prompt templates.

mod prompts;
mod settings;

pub use prompts::{ChatPrompts, Prompts};
pub use settings::{
    ChunkingSettings, EmbeddingSettings, GeneralSettings, LlmSettings, PromptSettings,
    RetrievalSettings, SecretSettings, ServerSettings, Settings, SourceSettings,
    TranscriptSettings, UiSettings,
};
