//! Time-based chunking implementation.
//!
//! Splits transcripts into chunks based on time intervals.

use super::{ChunkingConfig, ContentChunk};
use crate::transcript::Transcript;

/// Time-based chunker.
///
/// Splits transcripts into fixed-duration windows. A caption segment belongs
/// to the window its start time falls in, so no text is repeated across chunks.
pub struct TemporalChunker {
    config: ChunkingConfig,
}

impl TemporalChunker {
    pub fn new(config: ChunkingConfig) -> Self {
        Self { config }
    }

    /// Split a transcript into content chunks.
    pub fn chunk(&self, transcript: &Transcript) -> Vec<ContentChunk> {
        let mut chunks = Vec::new();
        let target_duration = self.config.target_duration.max(1) as f64;

        if transcript.segments.is_empty() {
            return chunks;
        }

        let total_duration = transcript.duration_seconds;
        let mut chunk_start = 0.0;
        let mut chunk_order = 0;

        while chunk_start < total_duration {
            let chunk_end = (chunk_start + target_duration).min(total_duration);
            let is_last = chunk_end >= total_duration;

            let chunk_content: String = transcript
                .segments
                .iter()
                .filter(|seg| {
                    seg.start_seconds >= chunk_start
                        && (seg.start_seconds < chunk_end || is_last)
                })
                .map(|seg| seg.text.as_str())
                .collect::<Vec<_>>()
                .join(" ");

            if !chunk_content.trim().is_empty() {
                chunks.push(ContentChunk::new(
                    chunk_content.trim().to_string(),
                    chunk_start,
                    chunk_end,
                    chunk_order,
                ));
                chunk_order += 1;
            }

            chunk_start = chunk_end;
        }

        chunks
    }
}

impl Default for TemporalChunker {
    fn default() -> Self {
        Self::new(ChunkingConfig::default())
    }
}
