//! In-memory vector store implementation.

use super::{cosine_similarity, Document, IndexedSource, SearchResult, VectorStore};
use crate::error::{Result, VidchatError};
use async_trait::async_trait;
use std::sync::RwLock;

/// In-memory vector store.
///
/// Filled once while the index is built, then only read.
pub struct MemoryVectorStore {
    documents: RwLock<Vec<Document>>,
}

impl MemoryVectorStore {
    /// Create a new in-memory vector store.
    pub fn new() -> Self {
        Self {
            documents: RwLock::new(Vec::new()),
        }
    }
}

impl Default for MemoryVectorStore {
    fn default() -> Self {
        Self::new()
    }
}

fn poisoned<T>(_: T) -> VidchatError {
    VidchatError::VectorStore("document lock poisoned".to_string())
}

#[async_trait]
impl VectorStore for MemoryVectorStore {
    async fn upsert_batch(&self, docs: &[Document]) -> Result<usize> {
        let mut store = self.documents.write().map_err(poisoned)?;
        for doc in docs {
            match store.iter_mut().find(|existing| existing.id == doc.id) {
                Some(existing) => *existing = doc.clone(),
                None => store.push(doc.clone()),
            }
        }
        Ok(docs.len())
    }

    async fn search_with_threshold(
        &self,
        query_embedding: &[f32],
        limit: usize,
        min_score: f32,
    ) -> Result<Vec<SearchResult>> {
        let docs = self.documents.read().map_err(poisoned)?;

        let mut results: Vec<SearchResult> = docs
            .iter()
            .map(|doc| SearchResult {
                document: doc.clone(),
                score: cosine_similarity(query_embedding, &doc.embedding),
            })
            .filter(|r| r.score >= min_score)
            .collect();

        // Stable sort keeps insertion order among equal scores.
        results.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(std::cmp::Ordering::Equal));
        results.truncate(limit);

        Ok(results)
    }

    async fn list_sources(&self) -> Result<Vec<IndexedSource>> {
        let docs = self.documents.read().map_err(poisoned)?;

        let mut sources: Vec<IndexedSource> = Vec::new();
        for doc in docs.iter() {
            let position = sources.iter().position(|s| s.video_id == doc.video_id);
            let entry = match position {
                Some(i) => &mut sources[i],
                None => {
                    sources.push(IndexedSource {
                        video_id: doc.video_id.clone(),
                        source: doc.source.clone(),
                        chunk_count: 0,
                        total_duration_seconds: 0.0,
                    });
                    let last = sources.len() - 1;
                    &mut sources[last]
                }
            };

            entry.chunk_count += 1;
            if doc.end_seconds > entry.total_duration_seconds {
                entry.total_duration_seconds = doc.end_seconds;
            }
        }

        Ok(sources)
    }

    async fn document_count(&self) -> Result<usize> {
        let docs = self.documents.read().map_err(poisoned)?;
        Ok(docs.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn doc(video_id: &str, content: &str, start: f64, embedding: Vec<f32>, order: i32) -> Document {
        Document::new(
            video_id.to_string(),
            format!("https://youtu.be/{video_id}"),
            content.to_string(),
            start,
            start + 30.0,
            embedding,
            order,
        )
    }

    #[tokio::test]
    async fn test_memory_vector_store() {
        let store = MemoryVectorStore::new();

        let doc1 = doc("video1", "Hello world", 0.0, vec![1.0, 0.0, 0.0], 0);
        let doc2 = doc("video1", "Goodbye world", 30.0, vec![0.0, 1.0, 0.0], 1);
        let doc3 = doc("video2", "Other video", 0.0, vec![0.7, 0.7, 0.0], 0);

        store.upsert_batch(&[doc1, doc2, doc3]).await.unwrap();

        assert_eq!(store.document_count().await.unwrap(), 3);

        let results = store
            .search_with_threshold(&[1.0, 0.0, 0.0], 10, f32::MIN)
            .await
            .unwrap();
        assert_eq!(results.len(), 3);
        assert_eq!(results[0].document.content, "Hello world");
        assert!(results[0].score > results[1].score);

        let top = store
            .search_with_threshold(&[1.0, 0.0, 0.0], 2, f32::MIN)
            .await
            .unwrap();
        assert_eq!(top.len(), 2);

        let sources = store.list_sources().await.unwrap();
        assert_eq!(sources.len(), 2);
        assert_eq!(sources[0].video_id, "video1");
        assert_eq!(sources[0].chunk_count, 2);
        assert_eq!(sources[0].total_duration_seconds, 60.0);
    }

    #[tokio::test]
    async fn test_threshold_filters_results() {
        let store = MemoryVectorStore::new();
        store
            .upsert_batch(&[
                doc("v", "match", 0.0, vec![1.0, 0.0], 0),
                doc("v", "orthogonal", 30.0, vec![0.0, 1.0], 1),
            ])
            .await
            .unwrap();

        let results = store.search_with_threshold(&[1.0, 0.0], 10, 0.5).await.unwrap();
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].document.content, "match");
    }
}
