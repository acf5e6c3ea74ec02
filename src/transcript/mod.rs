//! Transcript ingestion.
//!
//! Fetches caption text for a transcript source and turns it into timed
//! segments. Fetching is delegated to yt-dlp; this module only parses what it
//! writes.

mod models;
mod vtt;
mod youtube;

pub use models::{format_timestamp, Transcript, TranscriptSegment};
pub use vtt::parse_vtt;
pub use youtube::YoutubeCaptionFetcher;

use crate::error::Result;
use async_trait::async_trait;

/// Trait for transcript ingestion collaborators.
#[async_trait]
pub trait TranscriptFetcher: Send + Sync {
    /// Fetch the transcript for one source identifier.
    async fn fetch(&self, source: &str) -> Result<Transcript>;
}
