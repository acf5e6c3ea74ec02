//! Builds the corpus index: fetch, chunk, embed, store.

use super::CorpusIndex;
use crate::chunking::{ChunkingConfig, TemporalChunker};
use crate::config::Settings;
use crate::embedding::{Embedder, OpenAIEmbedder};
use crate::error::{Result, VidchatError};
use crate::openai::OpenAIClient;
use crate::sources::{indexed_prefix, MAX_INDEXED_SOURCES};
use crate::transcript::{Transcript, TranscriptFetcher, YoutubeCaptionFetcher};
use crate::vector_store::{Document, MemoryVectorStore, VectorStore};
use futures::stream::{self, StreamExt};
use indicatif::ProgressBar;
use std::sync::Arc;
use tracing::{debug, info, instrument};

/// Turns a source list into a [`CorpusIndex`].
pub struct CorpusIndexer {
    fetcher: Arc<dyn TranscriptFetcher>,
    embedder: Arc<dyn Embedder>,
    chunker: TemporalChunker,
    max_concurrent: usize,
    progress: ProgressBar,
}

impl CorpusIndexer {
    /// Create an indexer with a hidden progress bar and four concurrent fetches.
    pub fn new(
        fetcher: Arc<dyn TranscriptFetcher>,
        embedder: Arc<dyn Embedder>,
        chunking: ChunkingConfig,
    ) -> Self {
        Self {
            fetcher,
            embedder,
            chunker: TemporalChunker::new(chunking),
            max_concurrent: 4,
            progress: ProgressBar::hidden(),
        }
    }

    /// Create an indexer backed by yt-dlp captions and OpenAI embeddings.
    pub fn from_settings(settings: &Settings, client: OpenAIClient) -> Self {
        let fetcher = YoutubeCaptionFetcher::new(&settings.transcript)
            .with_temp_root(settings.temp_dir());
        let embedder = OpenAIEmbedder::with_client(
            client,
            &settings.embedding.model,
            settings.embedding.dimensions as usize,
        );

        Self::new(
            Arc::new(fetcher),
            Arc::new(embedder),
            ChunkingConfig::from(&settings.chunking),
        )
        .with_max_concurrent(settings.transcript.max_concurrent_fetches)
    }

    /// Set the maximum number of concurrent transcript fetches.
    pub fn with_max_concurrent(mut self, max_concurrent: usize) -> Self {
        self.max_concurrent = max_concurrent.max(1);
        self
    }

    /// Report progress on `progress`, one tick per fetched source.
    pub fn with_progress(mut self, progress: ProgressBar) -> Self {
        self.progress = progress;
        self
    }

    /// Build the index from the head of `sources`.
    ///
    /// Only the first [`MAX_INDEXED_SOURCES`] lines are considered; blank
    /// lines among them are skipped. The first fetch or embedding error
    /// aborts the build.
    #[instrument(skip(self, sources), fields(listed = sources.len()))]
    pub async fn build(&self, sources: &[String]) -> Result<CorpusIndex> {
        if sources.len() > MAX_INDEXED_SOURCES {
            debug!(
                "Ignoring {} sources past the first {}",
                sources.len() - MAX_INDEXED_SOURCES,
                MAX_INDEXED_SOURCES
            );
        }

        let selected: Vec<String> = indexed_prefix(sources)
            .iter()
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();

        info!("Indexing {} sources", selected.len());
        let transcripts = self.fetch_all(&selected).await?;

        let store = Arc::new(MemoryVectorStore::new());
        let indexed = self.index_transcripts(store.as_ref(), &transcripts).await?;
        info!("Indexed {} passages from {} sources", indexed, transcripts.len());

        Ok(CorpusIndex::new(store, self.embedder.clone(), selected))
    }

    /// Fetch every transcript, preserving list order, failing fast.
    async fn fetch_all(&self, sources: &[String]) -> Result<Vec<Transcript>> {
        self.progress.set_length(sources.len() as u64);
        self.progress.set_position(0);

        let mut stream = stream::iter(sources.iter())
            .map(|source| async move { self.fetcher.fetch(source).await })
            .buffered(self.max_concurrent);

        let mut transcripts = Vec::with_capacity(sources.len());
        while let Some(result) = stream.next().await {
            match result {
                Ok(transcript) => {
                    self.progress.inc(1);
                    transcripts.push(transcript);
                }
                Err(e) => {
                    self.progress.abandon();
                    return Err(e);
                }
            }
        }

        Ok(transcripts)
    }

    /// Chunk and embed transcripts into `store`.
    async fn index_transcripts(&self, store: &dyn VectorStore, transcripts: &[Transcript]) -> Result<usize> {
        let mut pending: Vec<(&Transcript, crate::chunking::ContentChunk)> = Vec::new();
        for transcript in transcripts {
            let chunks = self.chunker.chunk(transcript);
            debug!("{}: {} chunks", transcript.video_id, chunks.len());
            pending.extend(chunks.into_iter().map(|chunk| (transcript, chunk)));
        }

        if pending.is_empty() {
            self.progress.finish_and_clear();
            return Ok(0);
        }

        self.progress.set_message("embedding passages");
        let texts: Vec<String> = pending.iter().map(|(_, c)| c.content.clone()).collect();
        let embeddings = self.embedder.embed_batch(&texts).await?;

        if embeddings.len() != pending.len() {
            return Err(VidchatError::Embedding(format!(
                "Expected {} embeddings, got {}",
                pending.len(),
                embeddings.len()
            )));
        }

        let documents: Vec<Document> = pending
            .into_iter()
            .zip(embeddings)
            .map(|((transcript, chunk), embedding)| {
                Document::new(
                    transcript.video_id.clone(),
                    transcript.source.clone(),
                    chunk.content,
                    chunk.start_seconds,
                    chunk.end_seconds,
                    embedding,
                    chunk.order,
                )
            })
            .collect();

        let count = store.upsert_batch(&documents).await?;
        self.progress.finish_and_clear();
        Ok(count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::index::testing::{LetterEmbedder, RecordingFetcher};
    use crate::transcript::TranscriptSegment;
    use async_trait::async_trait;

    fn indexer(fetcher: Arc<RecordingFetcher>) -> CorpusIndexer {
        CorpusIndexer::new(fetcher, Arc::new(LetterEmbedder), ChunkingConfig { target_duration: 10 })
    }

    #[tokio::test]
    async fn test_only_first_twenty_sources_are_indexed() {
        let fetcher = Arc::new(RecordingFetcher::default());
        let sources: Vec<String> = (0..25).map(|i| format!("source-{i:02}\n")).collect();

        let index = indexer(fetcher.clone()).build(&sources).await.unwrap();

        let calls = fetcher.calls.lock().unwrap().clone();
        let expected: Vec<String> = (0..20).map(|i| format!("source-{i:02}")).collect();
        assert_eq!(calls, expected);
        assert_eq!(index.sources(), expected.as_slice());

        // Two ten-second chunks per transcript.
        assert_eq!(index.passage_count().await.unwrap(), 40);
        let summary = index.summary().await.unwrap();
        assert_eq!(summary.len(), 20);
        assert!(summary.iter().all(|s| s.chunk_count == 2));
    }

    #[tokio::test]
    async fn test_blank_lines_are_skipped() {
        let fetcher = Arc::new(RecordingFetcher::default());
        let sources = vec!["one\n".to_string(), "   \n".to_string(), "two".to_string()];

        let index = indexer(fetcher.clone()).build(&sources).await.unwrap();
        assert_eq!(index.sources(), &["one".to_string(), "two".to_string()]);
    }

    #[tokio::test]
    async fn test_fetch_failure_aborts_build() {
        let fetcher = Arc::new(RecordingFetcher {
            fail_on: Some("broken".to_string()),
            ..Default::default()
        });
        let sources = vec!["fine\n".to_string(), "broken\n".to_string()];

        let result = indexer(fetcher).build(&sources).await;
        assert!(matches!(result, Err(VidchatError::Transcript(_))));
    }

    struct ShortEmbedder;

    #[async_trait]
    impl Embedder for ShortEmbedder {
        async fn embed(&self, _text: &str) -> Result<Vec<f32>> {
            Ok(vec![1.0])
        }

        async fn embed_batch(&self, _texts: &[String]) -> Result<Vec<Vec<f32>>> {
            Ok(vec![vec![1.0]])
        }

        fn dimensions(&self) -> usize {
            1
        }
    }

    #[tokio::test]
    async fn test_embedding_count_mismatch_is_an_error() {
        let indexer = CorpusIndexer::new(
            Arc::new(RecordingFetcher::default()),
            Arc::new(ShortEmbedder),
            ChunkingConfig { target_duration: 10 },
        );

        let result = indexer.build(&["a".to_string()]).await;
        assert!(matches!(result, Err(VidchatError::Embedding(_))));
    }

    #[tokio::test]
    async fn test_passages_keep_their_timestamps() {
        struct OneVideo;

        #[async_trait]
        impl TranscriptFetcher for OneVideo {
            async fn fetch(&self, source: &str) -> Result<Transcript> {
                Ok(Transcript::new(
                    "dQw4w9WgXcQ".to_string(),
                    source.trim().to_string(),
                    vec![
                        TranscriptSegment::new(0.0, 5.0, "import a geopdf map".to_string()),
                        TranscriptSegment::new(12.0, 18.0, "export placemarks as kml".to_string()),
                    ],
                ))
            }
        }

        let index = CorpusIndexer::new(
            Arc::new(OneVideo),
            Arc::new(LetterEmbedder),
            ChunkingConfig { target_duration: 10 },
        )
        .build(&["https://youtu.be/dQw4w9WgXcQ\n".to_string()])
        .await
        .unwrap();

        let results = index.retrieve("export kml placemarks", 1, 0.0).await.unwrap();
        assert_eq!(results[0].document.start_seconds, 10.0);
        assert_eq!(results[0].document.source, "https://youtu.be/dQw4w9WgXcQ");
    }
}
