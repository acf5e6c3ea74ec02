//! OpenAI moderation endpoint.

use super::{ModerationVerdict, Moderator};
use crate::error::{Result, VidchatError};
use crate::openai::OpenAIClient;
use async_openai::types::CreateModerationRequestArgs;
use async_trait::async_trait;
use std::collections::BTreeMap;
use tracing::{debug, instrument};

/// Moderator backed by the OpenAI moderation API.
pub struct OpenAIModerator {
    client: OpenAIClient,
}

impl OpenAIModerator {
    pub fn new(client: OpenAIClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl Moderator for OpenAIModerator {
    #[instrument(skip(self, text))]
    async fn moderate(&self, text: &str) -> Result<ModerationVerdict> {
        let request = CreateModerationRequestArgs::default()
            .input(text)
            .build()
            .map_err(|e| VidchatError::Moderation(format!("Failed to build request: {}", e)))?;

        let response = self
            .client
            .moderations()
            .create(request)
            .await
            .map_err(|e| VidchatError::OpenAI(format!("Moderation API error: {}", e)))?;

        let result = response
            .results
            .into_iter()
            .next()
            .ok_or_else(|| VidchatError::Moderation("Empty moderation response".to_string()))?;

        let category_scores = scores_to_map(serde_json::to_value(&result.category_scores)?);
        debug!(flagged = result.flagged, "Moderation verdict");

        Ok(ModerationVerdict {
            flagged: result.flagged,
            category_scores,
        })
    }
}

/// Flatten the provider's per-category score object into a name/score map.
fn scores_to_map(value: serde_json::Value) -> BTreeMap<String, f32> {
    match value {
        serde_json::Value::Object(fields) => fields
            .into_iter()
            .filter_map(|(name, score)| score.as_f64().map(|s| (name, s as f32)))
            .collect(),
        _ => BTreeMap::new(),
    }
}
