//! YouTube caption fetching through yt-dlp.

use super::{parse_vtt, Transcript, TranscriptFetcher};
use crate::config::TranscriptSettings;
use crate::error::{Result, VidchatError};
use crate::sources::extract_video_id;
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use tokio::process::Command;
use tracing::{debug, info, instrument};

/// Fetches captions for YouTube videos with yt-dlp.
///
/// Manual captions are preferred; automatic captions are used when allowed
/// and nothing else exists.
pub struct YoutubeCaptionFetcher {
    language: String,
    allow_auto_captions: bool,
    temp_root: Option<PathBuf>,
}

impl YoutubeCaptionFetcher {
    pub fn new(settings: &TranscriptSettings) -> Self {
        Self {
            language: settings.language.clone(),
            allow_auto_captions: settings.allow_auto_captions,
            temp_root: None,
        }
    }

    /// Download caption files under `dir` instead of the system temp directory.
    pub fn with_temp_root(mut self, dir: PathBuf) -> Self {
        self.temp_root = Some(dir);
        self
    }

    fn temp_dir(&self) -> Result<tempfile::TempDir> {
        match &self.temp_root {
            Some(root) => {
                std::fs::create_dir_all(root)?;
                Ok(tempfile::tempdir_in(root)?)
            }
            None => Ok(tempfile::tempdir()?),
        }
    }

    async fn download_captions(&self, video_id: &str, output_dir: &Path) -> Result<PathBuf> {
        let url = format!("https://www.youtube.com/watch?v={}", video_id);
        let template = output_dir.join(format!("{}.%(ext)s", video_id));

        let mut command = Command::new("yt-dlp");
        command
            .arg("--skip-download")
            .arg("--write-subs")
            .arg("--sub-langs").arg(&self.language)
            .arg("--sub-format").arg("vtt")
            .arg("--output").arg(template.to_str().unwrap_or_default())
            .arg("--no-playlist")
            .arg("--quiet")
            .arg("--no-warnings");
        if self.allow_auto_captions {
            command.arg("--write-auto-subs");
        }

        let result = command
            .arg(&url)
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .output()
            .await;

        let output = match result {
            Ok(o) => o,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(VidchatError::ToolNotFound("yt-dlp".into()));
            }
            Err(e) => {
                return Err(VidchatError::ToolFailed(format!("yt-dlp execution failed: {e}")));
            }
        };

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(VidchatError::Transcript(format!(
                "yt-dlp failed for {video_id}: {stderr}"
            )));
        }

        find_caption_file(output_dir, video_id)?.ok_or_else(|| {
            VidchatError::Transcript(format!(
                "No '{}' captions available for video {}",
                self.language, video_id
            ))
        })
    }
}

#[async_trait]
impl TranscriptFetcher for YoutubeCaptionFetcher {
    #[instrument(skip(self), fields(source = %source.trim()))]
    async fn fetch(&self, source: &str) -> Result<Transcript> {
        let video_id = extract_video_id(source).ok_or_else(|| {
            VidchatError::Source(format!("Invalid YouTube video ID or URL: {}", source.trim()))
        })?;

        let temp_dir = self.temp_dir()?;
        info!("Fetching captions for {}", video_id);
        let caption_path = self.download_captions(&video_id, temp_dir.path()).await?;

        let content = tokio::fs::read_to_string(&caption_path).await?;
        let segments = parse_vtt(&content);
        debug!("Parsed {} caption segments", segments.len());

        let transcript = Transcript::new(video_id.clone(), source.trim().to_string(), segments);
        if transcript.is_empty() {
            return Err(VidchatError::Transcript(format!(
                "Captions for video {} contain no text",
                video_id
            )));
        }

        Ok(transcript)
    }
}

/// Locates a downloaded caption file (`<id>.<lang>.vtt`) by video ID.
fn find_caption_file(dir: &Path, video_id: &str) -> Result<Option<PathBuf>> {
    let prefix = format!("{}.", video_id);
    let mut candidates: Vec<PathBuf> = std::fs::read_dir(dir)?
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|path| {
            let name = path.file_name().and_then(|n| n.to_str()).unwrap_or_default();
            name.starts_with(&prefix) && name.ends_with(".vtt")
        })
        .collect();
    candidates.sort();
    Ok(candidates.into_iter().next())
}
