//! Configuration settings for vidchat.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Root configuration structure.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
#[derive(Default)]
pub struct Settings {
    pub general: GeneralSettings,
    pub sources: SourceSettings,
    pub transcript: TranscriptSettings,
    pub chunking: ChunkingSettings,
    pub embedding: EmbeddingSettings,
    pub llm: LlmSettings,
    pub retrieval: RetrievalSettings,
    pub ui: UiSettings,
    pub server: ServerSettings,
    pub secrets: SecretSettings,
    pub prompts: PromptSettings,
}

/// General application settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralSettings {
    /// Directory for temporary files (caption downloads).
    pub temp_dir: String,
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,
}

impl Default for GeneralSettings {
    fn default() -> Self {
        Self {
            temp_dir: "/tmp/vidchat".to_string(),
            log_level: "warn".to_string(),
        }
    }
}

/// Where the transcript source list lives.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SourceSettings {
    /// Newline-delimited file of video URLs or IDs.
    pub list_path: String,
}

impl Default for SourceSettings {
    fn default() -> Self {
        Self {
            list_path: "video_urls.txt".to_string(),
        }
    }
}

/// Caption download settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TranscriptSettings {
    /// Caption language requested from yt-dlp.
    pub language: String,
    /// Accept automatically generated captions when no manual ones exist.
    pub allow_auto_captions: bool,
    /// Maximum concurrent caption downloads while indexing.
    pub max_concurrent_fetches: usize,
}

impl Default for TranscriptSettings {
    fn default() -> Self {
        Self {
            language: "en".to_string(),
            allow_auto_captions: true,
            max_concurrent_fetches: 4,
        }
    }
}

/// Content chunking settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ChunkingSettings {
    /// Target chunk duration in seconds.
    pub target_chunk_seconds: u32,
}

impl Default for ChunkingSettings {
    fn default() -> Self {
        Self {
            target_chunk_seconds: 120,
        }
    }
}

/// Embedding generation settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EmbeddingSettings {
    /// Embedding model to use.
    pub model: String,
    /// Embedding dimensions.
    pub dimensions: u32,
}

impl Default for EmbeddingSettings {
    fn default() -> Self {
        Self {
            model: "text-embedding-3-small".to_string(),
            dimensions: 1536,
        }
    }
}

/// Completion model binding used for question condensing and answering.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LlmSettings {
    /// Chat completion model.
    pub model: String,
    /// Sampling temperature.
    pub temperature: f32,
}

impl Default for LlmSettings {
    fn default() -> Self {
        Self {
            model: "gpt-3.5-turbo-16k".to_string(),
            temperature: 0.3,
        }
    }
}

/// Passage retrieval settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RetrievalSettings {
    /// Number of passages handed to the model per question.
    pub similarity_top_k: usize,
    /// Minimum cosine similarity for a passage to be used.
    pub min_score: f32,
}

impl Default for RetrievalSettings {
    fn default() -> Self {
        Self {
            similarity_top_k: 2,
            min_score: 0.0,
        }
    }
}

/// Text shown by the chat surfaces.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct UiSettings {
    /// Page and banner title.
    pub title: String,
    /// Placeholder for the question input.
    pub input_placeholder: String,
    /// The assistant turn every conversation starts with.
    pub greeting: String,
    /// Shown while the index is being built.
    pub loading_message: String,
    /// Shown while a turn is being answered.
    pub thinking_message: String,
}

impl Default for UiSettings {
    fn default() -> Self {
        Self {
            title: "Chat with the Avenza Maps YouTube content".to_string(),
            input_placeholder: "Your question".to_string(),
            greeting: "Ask me a question about Avenza Maps YouTube content!".to_string(),
            loading_message:
                "Loading and indexing the Avenza Maps docs - hang tight! This should take 1-2 minutes."
                    .to_string(),
            thinking_message: "Thinking...".to_string(),
        }
    }
}

/// HTTP server settings for the web chat.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerSettings {
    pub host: String,
    pub port: u16,
    /// Minutes without a request after which a browser session is dropped.
    pub session_idle_minutes: u64,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8501,
            session_idle_minutes: 60,
        }
    }
}

/// Location of the secrets file holding the API credential.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SecretSettings {
    /// TOML file with an `openai_key` entry. `OPENAI_API_KEY` takes precedence.
    pub path: String,
}

impl Default for SecretSettings {
    fn default() -> Self {
        Self {
            path: "~/.vidchat/secrets.toml".to_string(),
        }
    }
}

/// Prompt customization settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
#[derive(Default)]
pub struct PromptSettings {
    /// Directory for custom prompts (overrides defaults).
    pub custom_dir: Option<String>,
    /// Custom variables available in all prompts as {{variable_name}}.
    pub variables: std::collections::HashMap<String, String>,
}

/// Contents of the secrets file.
#[derive(Debug, Clone, Default, Deserialize)]
struct SecretsFile {
    openai_key: Option<String>,
}

impl Settings {
    /// Load settings from the default configuration file.
    pub fn load() -> crate::error::Result<Self> {
        Self::load_from(None)
    }

    /// Load settings from a specific path, or default location if None.
    pub fn load_from(path: Option<&PathBuf>) -> crate::error::Result<Self> {
        let config_path = match path {
            Some(p) => p.clone(),
            None => Self::default_config_path(),
        };

        if config_path.exists() {
            let content = std::fs::read_to_string(&config_path)?;
            let settings: Settings = toml::from_str(&content)?;
            Ok(settings)
        } else {
            Ok(Settings::default())
        }
    }

    /// Get the default configuration file path.
    pub fn default_config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("vidchat")
            .join("config.toml")
    }

    /// Expand shell variables in paths (e.g., ~).
    pub fn expand_path(path: &str) -> PathBuf {
        PathBuf::from(shellexpand::tilde(path).to_string())
    }

    /// Get the expanded temp directory path.
    pub fn temp_dir(&self) -> PathBuf {
        Self::expand_path(&self.general.temp_dir)
    }

    /// Get the expanded source list path.
    pub fn source_list_path(&self) -> PathBuf {
        Self::expand_path(&self.sources.list_path)
    }

    /// Get the expanded secrets file path.
    pub fn secrets_path(&self) -> PathBuf {
        Self::expand_path(&self.secrets.path)
    }

    /// Resolve the OpenAI API key.
    ///
    /// `OPENAI_API_KEY` wins; otherwise the `openai_key` entry of the secrets
    /// file is used. Returns `None` when neither is set.
    pub fn openai_api_key(&self) -> crate::error::Result<Option<String>> {
        if let Ok(key) = std::env::var("OPENAI_API_KEY") {
            if !key.trim().is_empty() {
                return Ok(Some(key));
            }
        }
        Self::read_secrets_key(&self.secrets_path())
    }

    fn read_secrets_key(path: &std::path::Path) -> crate::error::Result<Option<String>> {
        if !path.exists() {
            return Ok(None);
        }
        let content = std::fs::read_to_string(path)?;
        let secrets: SecretsFile = toml::from_str(&content)?;
        Ok(secrets.openai_key.filter(|k| !k.trim().is_empty()))
    }
}
