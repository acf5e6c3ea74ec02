//! vidchat - chat with a collection of YouTube videos
//!
//! Builds a similarity index over the caption transcripts of a fixed list of
//! videos and answers questions about them through a retrieval-augmented chat.
//!
//! # Architecture
//!
//! - `config` - Settings, secrets and prompt templates
//! - `sources` - The source list and YouTube identifiers
//! - `transcript` - Caption download and WebVTT parsing
//! - `chunking` - Time-window chunking of transcripts
//! - `embedding` - Embedding generation
//! - `vector_store` - In-memory similarity search
//! - `index` - Corpus index construction and process-wide caching
//! - `moderation` - Content moderation gate
//! - `rag` - Condense-question answering engine
//! - `chat` - Conversations and turn resolution
//! - `cli` - Terminal chat, web chat and maintenance commands
//!
//! # Example
//!
//! ```rust,no_run
//! use vidchat::cli::ChatServices;
//! use vidchat::config::Settings;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let settings = Settings::load()?;
//!     let services = ChatServices::start(&settings).await?;
//!
//!     let mut session = services.new_session();
//!     let reply = session.submit("How do I import a map?").await?;
//!     println!("{}", reply.content);
//!
//!     Ok(())
//! }
//! ```

pub mod chat;
pub mod chunking;
pub mod cli;
pub mod config;
pub mod embedding;
pub mod error;
pub mod index;
pub mod moderation;
pub mod openai;
pub mod rag;
pub mod sources;
pub mod transcript;
pub mod vector_store;

pub use error::{Result, VidchatError};
