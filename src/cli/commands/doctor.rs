//! Doctor command - verify system requirements and configuration.

use crate::cli::Output;
use crate::config::Settings;
use crate::sources::{load_source_list, MAX_INDEXED_SOURCES};
use console::style;
use std::path::Path;
use std::process::Command;

/// Check result for a single item.
#[derive(Debug)]
pub struct CheckResult {
    pub name: String,
    pub status: CheckStatus,
    pub message: String,
    pub hint: Option<String>,
}

#[derive(Debug, PartialEq)]
pub enum CheckStatus {
    Ok,
    Warning,
    Error,
}

impl CheckResult {
    fn ok(name: &str, message: &str) -> Self {
        Self {
            name: name.to_string(),
            status: CheckStatus::Ok,
            message: message.to_string(),
            hint: None,
        }
    }

    fn warning(name: &str, message: &str, hint: &str) -> Self {
        Self {
            name: name.to_string(),
            status: CheckStatus::Warning,
            message: message.to_string(),
            hint: Some(hint.to_string()),
        }
    }

    fn error(name: &str, message: &str, hint: &str) -> Self {
        Self {
            name: name.to_string(),
            status: CheckStatus::Error,
            message: message.to_string(),
            hint: Some(hint.to_string()),
        }
    }

    fn print(&self) {
        let icon = match self.status {
            CheckStatus::Ok => style("✓").green(),
            CheckStatus::Warning => style("!").yellow(),
            CheckStatus::Error => style("✗").red(),
        };

        println!("  {} {} - {}", icon, style(&self.name).bold(), self.message);

        if let Some(hint) = &self.hint {
            println!("    {} {}", style("→").dim(), style(hint).dim());
        }
    }
}

/// Run all diagnostic checks.
pub fn run_doctor(settings: &Settings) -> anyhow::Result<()> {
    Output::header("vidchat doctor");
    println!();
    println!("Checking system requirements and configuration...\n");

    let mut checks = Vec::new();

    let mut section = |title: &str, results: Vec<CheckResult>| {
        println!("{}", style(title).bold());
        for check in &results {
            check.print();
        }
        println!();
        checks.extend(results);
    };

    section("External Tools", vec![check_tool("yt-dlp", install_hint_ytdlp())]);
    section("API Configuration", vec![check_openai_api_key(settings)]);
    section("Sources", vec![check_source_list(&settings.source_list_path())]);
    section("Configuration", vec![check_config_file()]);

    let errors = checks.iter().filter(|c| c.status == CheckStatus::Error).count();
    let warnings = checks.iter().filter(|c| c.status == CheckStatus::Warning).count();

    if errors > 0 {
        Output::error(&format!(
            "{} error(s) found. Please fix them before chatting.",
            errors
        ));
        anyhow::bail!("{} doctor check(s) failed", errors);
    } else if warnings > 0 {
        Output::warning(&format!("All checks passed with {} warning(s).", warnings));
    } else {
        Output::success("All checks passed! vidchat is ready to use.");
    }

    Ok(())
}

/// Check if an external tool is available.
fn check_tool(name: &str, hint: &str) -> CheckResult {
    match Command::new(name).arg("--version").output() {
        Ok(output) if output.status.success() => {
            let version = String::from_utf8_lossy(&output.stdout)
                .lines()
                .next()
                .unwrap_or("installed")
                .trim()
                .to_string();

            let version_display = if version.len() > 50 {
                format!("{}...", &version[..50])
            } else {
                version
            };

            CheckResult::ok(name, &version_display)
        }
        Ok(_) => CheckResult::error(name, "installed but not working", hint),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            CheckResult::error(name, "not found", hint)
        }
        Err(e) => CheckResult::error(name, &format!("error: {}", e), hint),
    }
}

/// Check if an OpenAI API key is configured in the environment or the secrets file.
fn check_openai_api_key(settings: &Settings) -> CheckResult {
    let secrets = settings.secrets_path();
    let hint = format!(
        "Set with: export OPENAI_API_KEY='sk-...' or add openai_key to {}",
        secrets.display()
    );

    match settings.openai_api_key() {
        Ok(Some(key)) if key.starts_with("sk-") && key.len() > 20 => {
            CheckResult::ok("OpenAI API key", &format!("configured ({})", mask_key(&key)))
        }
        Ok(Some(_)) => CheckResult::warning(
            "OpenAI API key",
            "set but format looks unusual",
            "Expected format: sk-... (OpenAI API key)",
        ),
        Ok(None) => CheckResult::error("OpenAI API key", "not set", &hint),
        Err(e) => CheckResult::error(
            "OpenAI API key",
            &format!("unreadable secrets file: {}", e),
            &hint,
        ),
    }
}

fn mask_key(key: &str) -> String {
    format!("{}...{}", &key[..7], &key[key.len() - 4..])
}

/// Check the source list and how much of it will be indexed.
fn check_source_list(path: &Path) -> CheckResult {
    let name = "Source list";
    match load_source_list(path) {
        Ok(lines) => {
            let listed = lines.iter().filter(|l| !l.trim().is_empty()).count();
            if listed == 0 {
                CheckResult::error(
                    name,
                    &format!("{} is empty", path.display()),
                    "Add one YouTube URL or video ID per line",
                )
            } else if lines.len() > MAX_INDEXED_SOURCES {
                CheckResult::warning(
                    name,
                    &format!("{} ({} lines)", path.display(), lines.len()),
                    &format!(
                        "Only the first {} lines are indexed; the rest are ignored",
                        MAX_INDEXED_SOURCES
                    ),
                )
            } else {
                CheckResult::ok(name, &format!("{} ({} sources)", path.display(), listed))
            }
        }
        Err(e) => CheckResult::error(
            name,
            &e.to_string(),
            "Create it with one YouTube URL or video ID per line, or set sources.list_path",
        ),
    }
}

/// Check if config file exists.
fn check_config_file() -> CheckResult {
    let config_path = Settings::default_config_path();
    if config_path.exists() {
        CheckResult::ok("Config file", &format!("{}", config_path.display()))
    } else {
        CheckResult::warning(
            "Config file",
            "using defaults",
            &format!("Create {} to override", config_path.display()),
        )
    }
}

/// Platform-specific install hint for yt-dlp.
fn install_hint_ytdlp() -> &'static str {
    if cfg!(target_os = "macos") {
        "Install with: brew install yt-dlp"
    } else if cfg!(target_os = "linux") {
        "Install with: pip install yt-dlp (or your package manager)"
    } else {
        "Install from: https://github.com/yt-dlp/yt-dlp"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_check_result_ok() {
        let result = CheckResult::ok("test", "passed");
        assert_eq!(result.status, CheckStatus::Ok);
        assert!(result.hint.is_none());
    }

    #[test]
    fn test_check_result_error() {
        let result = CheckResult::error("test", "failed", "fix it");
        assert_eq!(result.status, CheckStatus::Error);
        assert_eq!(result.hint, Some("fix it".to_string()));
    }

    #[test]
    fn test_mask_key() {
        assert_eq!(mask_key("sk-abcdefghijklmnopqrstuvwxyz"), "sk-abcd...wxyz");
    }

    #[test]
    fn test_check_source_list() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("video_urls.txt");

        assert_eq!(check_source_list(&path).status, CheckStatus::Error);

        std::fs::write(&path, "\n\n").unwrap();
        assert_eq!(check_source_list(&path).status, CheckStatus::Error);

        std::fs::write(&path, "https://youtu.be/a\nhttps://youtu.be/b\n").unwrap();
        let result = check_source_list(&path);
        assert_eq!(result.status, CheckStatus::Ok);
        assert!(result.message.contains("2 sources"));

        let long: String = (0..25).map(|i| format!("video{i}\n")).collect();
        std::fs::write(&path, long).unwrap();
        assert_eq!(check_source_list(&path).status, CheckStatus::Warning);
    }
}
