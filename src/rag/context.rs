//! Context building for RAG responses.

use super::ContextChunk;
use crate::error::Result;
use crate::index::CorpusIndex;
use crate::sources::watch_url;
use crate::vector_store::SearchResult;
use std::sync::Arc;

/// Builds context from index search results for RAG.
#[derive(Clone)]
pub struct ContextBuilder {
    index: Arc<CorpusIndex>,
    max_chunks: usize,
    min_score: f32,
}

impl ContextBuilder {
    /// Create a new context builder returning the two best passages.
    pub fn new(index: Arc<CorpusIndex>) -> Self {
        Self {
            index,
            max_chunks: 2,
            min_score: 0.0,
        }
    }

    /// Set the maximum number of context chunks.
    pub fn with_max_chunks(mut self, max_chunks: usize) -> Self {
        self.max_chunks = max_chunks.max(1);
        self
    }

    /// Set the minimum similarity score threshold.
    pub fn with_min_score(mut self, min_score: f32) -> Self {
        self.min_score = min_score;
        self
    }

    /// Build context for a query.
    pub async fn build(&self, query: &str) -> Result<Vec<ContextChunk>> {
        let results = self
            .index
            .retrieve(query, self.max_chunks, self.min_score)
            .await?;
        Ok(Self::from_results(results))
    }

    /// Build context from raw search results.
    pub fn from_results(results: Vec<SearchResult>) -> Vec<ContextChunk> {
        results
            .into_iter()
            .map(|r| {
                let url = watch_url(&r.document.video_id, r.document.start_seconds);
                let mut chunk = ContextChunk::from(r);
                chunk.url = Some(url);
                chunk
            })
            .collect()
    }
}

/// Format context chunks for inclusion in a prompt.
pub fn format_context_for_prompt(chunks: &[ContextChunk]) -> String {
    chunks
        .iter()
        .map(|chunk| {
            format!(
                "video: {} @ {}\n\n{}",
                chunk.source, chunk.timestamp, chunk.content
            )
        })
        .collect::<Vec<_>>()
        .join("\n\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::index::testing::index_of;

    #[tokio::test]
    async fn test_build_limits_and_links() {
        let index = index_of(&["offline maps download", "purchase maps in store", "zzz"]).await;
        let builder = ContextBuilder::new(index).with_max_chunks(1);

        let chunks = builder.build("download offline maps").await.unwrap();
        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0].content, "offline maps download");
        assert_eq!(
            chunks[0].url.as_deref(),
            Some("https://www.youtube.com/watch?v=video0&t=0s")
        );
    }

    #[test]
    fn test_format_context_for_prompt() {
        let chunks = vec![
            ContextChunk {
                video_id: "a".to_string(),
                source: "https://youtu.be/a".to_string(),
                timestamp: "01:00".to_string(),
                start_seconds: 60.0,
                content: "First passage".to_string(),
                score: 0.9,
                url: None,
            },
            ContextChunk {
                video_id: "b".to_string(),
                source: "https://youtu.be/b".to_string(),
                timestamp: "00:10".to_string(),
                start_seconds: 10.0,
                content: "Second passage".to_string(),
                score: 0.8,
                url: None,
            },
        ];

        let text = format_context_for_prompt(&chunks);
        assert_eq!(
            text,
            "video: https://youtu.be/a @ 01:00\n\nFirst passage\n\nvideo: https://youtu.be/b @ 00:10\n\nSecond passage"
        );
    }
}
