//! Content moderation gate.
//!
//! Every user turn is classified before it may reach the answering engine.
//! Flagged input is answered with [`REFUSAL_MESSAGE`] instead.

mod openai;

pub use openai::OpenAIModerator;

use crate::error::Result;
use async_trait::async_trait;
use serde::Serialize;
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::{info, instrument};

/// Assistant reply for input the moderation classifier flags.
pub const REFUSAL_MESSAGE: &str = "Please refrain from using profanity.";

/// Classifier output for one input.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ModerationVerdict {
    /// Whether the input violates the content policy.
    pub flagged: bool,
    /// Per-category confidence scores.
    pub category_scores: BTreeMap<String, f32>,
}

impl ModerationVerdict {
    /// The highest-scoring category, if any scores were returned.
    pub fn top_category(&self) -> Option<(&str, f32)> {
        self.category_scores
            .iter()
            .max_by(|a, b| a.1.partial_cmp(b.1).unwrap_or(std::cmp::Ordering::Equal))
            .map(|(name, score)| (name.as_str(), *score))
    }
}

/// Trait for moderation classifiers.
#[async_trait]
pub trait Moderator: Send + Sync {
    /// Classify raw user input.
    async fn moderate(&self, text: &str) -> Result<ModerationVerdict>;
}

/// Result of running the gate on a user turn.
#[derive(Debug, Clone, PartialEq)]
pub enum ModerationOutcome {
    /// The input may be answered.
    Allowed,
    /// The input was flagged; answer with [`REFUSAL_MESSAGE`].
    Rejected(ModerationVerdict),
}

/// Runs the moderator and reduces its verdict to an outcome.
#[derive(Clone)]
pub struct ModerationGate {
    moderator: Arc<dyn Moderator>,
}

impl ModerationGate {
    pub fn new(moderator: Arc<dyn Moderator>) -> Self {
        Self { moderator }
    }

    /// Check one user turn. Classifier failures propagate.
    #[instrument(skip(self, text), fields(len = text.len()))]
    pub async fn check(&self, text: &str) -> Result<ModerationOutcome> {
        let verdict = self.moderator.moderate(text).await?;
        if verdict.flagged {
            match verdict.top_category() {
                Some((category, score)) => {
                    info!(category, score, "User input rejected by moderation")
                }
                None => info!("User input rejected by moderation"),
            }
            Ok(ModerationOutcome::Rejected(verdict))
        } else {
            Ok(ModerationOutcome::Allowed)
        }
    }
}
