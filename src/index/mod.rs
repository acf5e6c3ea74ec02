//! Corpus index: every indexed transcript passage, embedded and searchable.
//!
//! The index is built once per process from the head of the source list and
//! then shared read-only by every chat session.

mod cache;
mod indexer;

pub use cache::{shared_cache, IndexCache};
pub use indexer::CorpusIndexer;

use crate::embedding::Embedder;
use crate::error::Result;
use crate::vector_store::{IndexedSource, SearchResult, VectorStore};
use chrono::{DateTime, Utc};
use std::sync::Arc;
use tracing::{debug, instrument};

/// Similarity index over the embedded passages of the indexed sources.
///
/// Immutable once built.
pub struct CorpusIndex {
    store: Arc<dyn VectorStore>,
    embedder: Arc<dyn Embedder>,
    sources: Vec<String>,
    built_at: DateTime<Utc>,
}

impl CorpusIndex {
    pub(crate) fn new(
        store: Arc<dyn VectorStore>,
        embedder: Arc<dyn Embedder>,
        sources: Vec<String>,
    ) -> Self {
        Self {
            store,
            embedder,
            sources,
            built_at: Utc::now(),
        }
    }

    /// Source identifiers that were indexed, trimmed, in list order.
    pub fn sources(&self) -> &[String] {
        &self.sources
    }

    /// When the index finished building.
    pub fn built_at(&self) -> DateTime<Utc> {
        self.built_at
    }

    /// Number of passages in the index.
    pub async fn passage_count(&self) -> Result<usize> {
        self.store.document_count().await
    }

    /// Per-source passage summary.
    pub async fn summary(&self) -> Result<Vec<IndexedSource>> {
        self.store.list_sources().await
    }

    /// Embed `query` and return the `limit` most similar passages scoring at
    /// least `min_score`.
    #[instrument(skip(self))]
    pub async fn retrieve(&self, query: &str, limit: usize, min_score: f32) -> Result<Vec<SearchResult>> {
        let query_embedding = self.embedder.embed(query).await?;
        let results = self
            .store
            .search_with_threshold(&query_embedding, limit, min_score)
            .await?;
        debug!("Retrieved {} passages", results.len());
        Ok(results)
    }
}

impl std::fmt::Debug for CorpusIndex {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CorpusIndex")
            .field("sources", &self.sources)
            .field("built_at", &self.built_at)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
pub(crate) mod testing {
    //! Fakes shared by tests that need an index without network access.

    use super::*;
    use crate::error::VidchatError;
    use crate::transcript::{Transcript, TranscriptFetcher, TranscriptSegment};
    use crate::vector_store::{Document, MemoryVectorStore};
    use async_trait::async_trait;
    use std::sync::Mutex;

    /// Embeds text as letter frequencies over a-z.
    pub struct LetterEmbedder;

    #[async_trait]
    impl Embedder for LetterEmbedder {
        async fn embed(&self, text: &str) -> Result<Vec<f32>> {
            let mut v = vec![0.0f32; 26];
            for c in text.to_ascii_lowercase().chars() {
                if c.is_ascii_lowercase() {
                    v[(c as u8 - b'a') as usize] += 1.0;
                }
            }
            Ok(v)
        }

        async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
            let mut out = Vec::with_capacity(texts.len());
            for text in texts {
                out.push(self.embed(text).await?);
            }
            Ok(out)
        }

        fn dimensions(&self) -> usize {
            26
        }
    }

    /// Returns a two-segment transcript per source and records every call.
    #[derive(Default)]
    pub struct RecordingFetcher {
        pub calls: Mutex<Vec<String>>,
        pub fail_on: Option<String>,
    }

    #[async_trait]
    impl TranscriptFetcher for RecordingFetcher {
        async fn fetch(&self, source: &str) -> Result<Transcript> {
            let source = source.trim().to_string();
            self.calls.lock().unwrap().push(source.clone());
            if self.fail_on.as_deref() == Some(source.as_str()) {
                return Err(VidchatError::Transcript(format!("no captions for {source}")));
            }
            Ok(Transcript::new(
                source.clone(),
                source.clone(),
                vec![
                    TranscriptSegment::new(0.0, 10.0, format!("{source} introduction")),
                    TranscriptSegment::new(10.0, 20.0, format!("{source} details")),
                ],
            ))
        }
    }

    /// An index over the given passages, one document each.
    pub async fn index_of(passages: &[&str]) -> Arc<CorpusIndex> {
        let embedder = Arc::new(LetterEmbedder);
        let store = Arc::new(MemoryVectorStore::new());
        let mut docs = Vec::new();
        for (i, text) in passages.iter().enumerate() {
            docs.push(Document::new(
                format!("video{i}"),
                format!("https://youtu.be/video{i}"),
                text.to_string(),
                i as f64 * 60.0,
                i as f64 * 60.0 + 60.0,
                embedder.embed(text).await.unwrap(),
                0,
            ));
        }
        store.upsert_batch(&docs).await.unwrap();
        Arc::new(CorpusIndex::new(store, embedder, Vec::new()))
    }
}
