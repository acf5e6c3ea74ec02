//! Vector store abstraction for vidchat.
//!
//! Provides a trait-based interface for vector search backends.

mod memory;

pub use memory::MemoryVectorStore;

use crate::error::Result;
use crate::transcript::format_timestamp;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A transcript passage stored in the vector database.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Document {
    /// Unique document ID.
    pub id: Uuid,
    /// Video ID this passage belongs to.
    pub video_id: String,
    /// Source identifier the transcript was fetched from.
    pub source: String,
    /// Text content of this passage.
    pub content: String,
    /// Start time in the video (seconds).
    pub start_seconds: f64,
    /// End time in the video (seconds).
    pub end_seconds: f64,
    /// Embedding vector.
    pub embedding: Vec<f32>,
    /// Order of this passage in the video.
    pub chunk_order: i32,
    /// When this document was indexed.
    pub indexed_at: DateTime<Utc>,
}

impl Document {
    /// Create a new document.
    pub fn new(
        video_id: String,
        source: String,
        content: String,
        start_seconds: f64,
        end_seconds: f64,
        embedding: Vec<f32>,
        chunk_order: i32,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            video_id,
            source,
            content,
            start_seconds,
            end_seconds,
            embedding,
            chunk_order,
            indexed_at: Utc::now(),
        }
    }

    /// Format timestamp for display.
    pub fn format_timestamp(&self) -> String {
        format_timestamp(self.start_seconds)
    }
}

/// A search result with score.
#[derive(Debug, Clone)]
pub struct SearchResult {
    /// The matched document.
    pub document: Document,
    /// Similarity score (higher is better).
    pub score: f32,
}

/// Summary information about an indexed source.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IndexedSource {
    /// Video ID.
    pub video_id: String,
    /// Source identifier.
    pub source: String,
    /// Number of indexed passages.
    pub chunk_count: u32,
    /// Total duration in seconds.
    pub total_duration_seconds: f64,
}

/// Trait for vector store implementations.
#[async_trait]
pub trait VectorStore: Send + Sync {
    /// Bulk insert documents.
    async fn upsert_batch(&self, docs: &[Document]) -> Result<usize>;

    /// Search for the `limit` most similar documents scoring at least
    /// `min_score`.
    async fn search_with_threshold(
        &self,
        query_embedding: &[f32],
        limit: usize,
        min_score: f32,
    ) -> Result<Vec<SearchResult>>;

    /// List indexed sources, in first-indexed order.
    async fn list_sources(&self) -> Result<Vec<IndexedSource>>;

    /// Get total document count.
    async fn document_count(&self) -> Result<usize>;
}

/// Compute cosine similarity between two vectors.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }

    let dot_product: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();

    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }

    dot_product / (norm_a * norm_b)
}
