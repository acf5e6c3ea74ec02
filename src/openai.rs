//! OpenAI client configuration with sensible defaults.

use async_openai::{config::OpenAIConfig, Client};
use std::time::Duration;
use tracing::warn;

/// Default timeout for OpenAI API requests (5 minutes).
const DEFAULT_TIMEOUT_SECS: u64 = 300;

/// Shared client type used by every OpenAI-backed component.
pub type OpenAIClient = Client<OpenAIConfig>;

/// Create an OpenAI client with configured timeout.
///
/// When `api_key` is `None` the key is read from `OPENAI_API_KEY`.
pub fn create_client(api_key: Option<&str>) -> OpenAIClient {
    create_client_with_timeout(api_key, Duration::from_secs(DEFAULT_TIMEOUT_SECS))
}

/// Create an OpenAI client with a custom timeout.
pub fn create_client_with_timeout(api_key: Option<&str>, timeout: Duration) -> OpenAIClient {
    let http_client = reqwest::Client::builder()
        .timeout(timeout)
        .build()
        .unwrap_or_else(|e| {
            warn!("Failed to build HTTP client with timeout, using defaults: {}", e);
            reqwest::Client::new()
        });

    let config = match api_key {
        Some(key) => OpenAIConfig::new().with_api_key(key),
        None => OpenAIConfig::default(),
    };

    Client::with_config(config).with_http_client(http_client)
}
