//! Pre-flight checks before expensive operations.
//!
//! Validates that required tools and configuration are available
//! before starting an index build that would otherwise fail midway.

use crate::config::Settings;
use crate::error::{Result, VidchatError};
use std::path::Path;
use std::process::Command;

/// Run every check needed to build the index and chat.
///
/// Returns Ok(()) if all checks pass, or the first error describing what's missing.
pub fn check(settings: &Settings) -> Result<()> {
    check_api_key(settings)?;
    check_source_list(&settings.source_list_path())?;
    check_tool("yt-dlp")?;
    Ok(())
}

/// Check that an OpenAI API key is configured.
fn check_api_key(settings: &Settings) -> Result<()> {
    match settings.openai_api_key()? {
        Some(_) => Ok(()),
        None => Err(VidchatError::Config(format!(
            "OpenAI API key not found. Set it with: export OPENAI_API_KEY='sk-...' or add openai_key to {}",
            settings.secrets_path().display()
        ))),
    }
}

/// Check that the source list exists.
fn check_source_list(path: &Path) -> Result<()> {
    if path.is_file() {
        Ok(())
    } else {
        Err(VidchatError::Config(format!(
            "Source list not found: {}",
            path.display()
        )))
    }
}

/// Check if an external tool is available.
fn check_tool(name: &str) -> Result<()> {
    match Command::new(name).arg("--version").output() {
        Ok(output) if output.status.success() => Ok(()),
        Ok(_) => Err(VidchatError::ToolNotFound(format!(
            "{} is installed but not working correctly",
            name
        ))),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            Err(VidchatError::ToolNotFound(name.to_string()))
        }
        Err(e) => Err(VidchatError::ToolNotFound(format!("{}: {}", name, e))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_check_source_list() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("video_urls.txt");

        let err = check_source_list(&path).unwrap_err();
        assert!(err.to_string().contains("video_urls.txt"));

        std::fs::write(&path, "https://youtu.be/abc\n").unwrap();
        assert!(check_source_list(&path).is_ok());
    }

    #[test]
    fn test_missing_tool() {
        let err = check_tool("vidchat-no-such-tool").unwrap_err();
        assert!(matches!(err, VidchatError::ToolNotFound(_)));
    }
}
