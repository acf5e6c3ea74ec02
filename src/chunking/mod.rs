//! Content chunking for breaking transcripts into searchable passages.

mod temporal;

pub use temporal::TemporalChunker;

use serde::{Deserialize, Serialize};

/// A chunk of content from a video transcript.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContentChunk {
    /// Text content of this chunk.
    pub content: String,
    /// Start time in seconds.
    pub start_seconds: f64,
    /// End time in seconds.
    pub end_seconds: f64,
    /// Order of this chunk in the video.
    pub order: i32,
}

impl ContentChunk {
    /// Create a new content chunk.
    pub fn new(content: String, start_seconds: f64, end_seconds: f64, order: i32) -> Self {
        Self {
            content,
            start_seconds,
            end_seconds,
            order,
        }
    }

    /// Duration of this chunk in seconds.
    pub fn duration(&self) -> f64 {
        self.end_seconds - self.start_seconds
    }
}

/// Configuration for chunking.
#[derive(Debug, Clone)]
pub struct ChunkingConfig {
    /// Target chunk duration in seconds.
    pub target_duration: u32,
}

impl Default for ChunkingConfig {
    fn default() -> Self {
        Self {
            target_duration: 120,
        }
    }
}

impl From<&crate::config::ChunkingSettings> for ChunkingConfig {
    fn from(settings: &crate::config::ChunkingSettings) -> Self {
        Self {
            target_duration: settings.target_chunk_seconds.max(1),
        }
    }
}
