//! Transcript source list.
//!
//! The corpus is a fixed, newline-delimited list of YouTube URLs or video IDs
//! read once at startup.

mod youtube;

pub use youtube::{extract_video_id, watch_url};

use crate::error::{Result, VidchatError};
use std::path::Path;
use tracing::{debug, instrument};

/// Number of sources from the top of the list that get indexed.
///
/// Entries past this cap are ignored.
pub const MAX_INDEXED_SOURCES: usize = 20;

/// Read the source list, one identifier per line.
///
/// Lines are returned in order and unmodified, trailing newline included.
/// Consumers trim as needed.
#[instrument]
pub fn load_source_list(path: &Path) -> Result<Vec<String>> {
    let content = std::fs::read_to_string(path).map_err(|e| {
        if e.kind() == std::io::ErrorKind::NotFound {
            VidchatError::Config(format!("Source list not found: {}", path.display()))
        } else {
            VidchatError::Io(e)
        }
    })?;

    let lines: Vec<String> = content.split_inclusive('\n').map(str::to_string).collect();
    debug!("Loaded {} source lines", lines.len());
    Ok(lines)
}

/// The prefix of `sources` that is indexed.
pub fn indexed_prefix(sources: &[String]) -> &[String] {
    &sources[..sources.len().min(MAX_INDEXED_SOURCES)]
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_lines_keep_trailing_newlines() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            "https://www.youtube.com/watch?v=aaaaaaaaaaa\nhttps://youtu.be/bbbbbbbbbbb  \nccccccccccc"
        )
        .unwrap();

        let lines = load_source_list(file.path()).unwrap();
        assert_eq!(
            lines,
            vec![
                "https://www.youtube.com/watch?v=aaaaaaaaaaa\n".to_string(),
                "https://youtu.be/bbbbbbbbbbb  \n".to_string(),
                "ccccccccccc".to_string(),
            ]
        );
    }

    #[test]
    fn test_missing_list_is_config_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = load_source_list(&dir.path().join("video_urls.txt")).unwrap_err();
        assert!(matches!(err, VidchatError::Config(_)));
        assert!(err.to_string().contains("video_urls.txt"));
    }

    #[test]
    fn test_indexed_prefix_caps_at_twenty() {
        let sources: Vec<String> = (0..25).map(|i| format!("video-{i}\n")).collect();
        let prefix = indexed_prefix(&sources);
        assert_eq!(prefix.len(), MAX_INDEXED_SOURCES);
        assert_eq!(prefix.last().map(String::as_str), Some("video-19\n"));

        let short: Vec<String> = vec!["only\n".to_string()];
        assert_eq!(indexed_prefix(&short).len(), 1);
    }
}
