//! Turn resolution: moderation first, then the answering engine.

use super::{ChatState, Conversation, Turn};
use crate::error::{Result, VidchatError};
use crate::moderation::{ModerationGate, ModerationOutcome, REFUSAL_MESSAGE};
use crate::rag::{Answerer, ContextChunk};
use serde::Serialize;
use std::sync::Arc;
use tracing::{info, instrument, warn};
use uuid::Uuid;

/// Assistant text that closes a question the user gave up on after a failure.
pub const FAILED_TURN_MESSAGE: &str =
    "Sorry, I couldn't answer that question. Please try asking again.";

/// The assistant turn produced for one user question.
#[derive(Debug, Clone, Serialize)]
pub struct Reply {
    pub content: String,
    /// True when moderation rejected the question.
    pub refused: bool,
    pub sources: Vec<ContextChunk>,
}

/// One user's conversation plus the services that answer it.
pub struct ChatSession {
    id: Uuid,
    conversation: Conversation,
    gate: ModerationGate,
    answerer: Arc<dyn Answerer>,
}

impl ChatSession {
    pub fn new(greeting: &str, gate: ModerationGate, answerer: Arc<dyn Answerer>) -> Self {
        Self {
            id: Uuid::new_v4(),
            conversation: Conversation::new(greeting),
            gate,
            answerer,
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn turns(&self) -> &[Turn] {
        self.conversation.turns()
    }

    pub fn state(&self) -> ChatState {
        self.conversation.state()
    }

    /// Append a user question and answer it.
    ///
    /// On error the question stays pending; call [`retry`](Self::retry) or
    /// [`abandon`](Self::abandon) before submitting again.
    #[instrument(skip(self, input), fields(session = %self.id))]
    pub async fn submit(&mut self, input: &str) -> Result<Reply> {
        if input.trim().is_empty() {
            return Err(VidchatError::InvalidInput("question is empty".to_string()));
        }
        self.conversation.push_user(input)?;
        self.resolve().await
    }

    /// Answer the pending question again after a failure.
    #[instrument(skip(self), fields(session = %self.id))]
    pub async fn retry(&mut self) -> Result<Reply> {
        if self.state() == ChatState::Idle {
            return Err(VidchatError::NothingPending);
        }
        info!("Retrying pending question");
        self.resolve().await
    }

    /// Close the pending question with [`FAILED_TURN_MESSAGE`].
    pub fn abandon(&mut self) -> Result<()> {
        self.conversation.push_assistant(FAILED_TURN_MESSAGE)?;
        warn!(session = %self.id, "Abandoned unanswered question");
        Ok(())
    }

    async fn resolve(&mut self) -> Result<Reply> {
        let question = self
            .conversation
            .pending_question()
            .ok_or(VidchatError::NothingPending)?
            .to_string();

        let reply = match self.gate.check(&question).await? {
            ModerationOutcome::Rejected(_) => Reply {
                content: REFUSAL_MESSAGE.to_string(),
                refused: true,
                sources: Vec::new(),
            },
            ModerationOutcome::Allowed => {
                let answer = self
                    .answerer
                    .answer(self.conversation.history(), &question)
                    .await?;
                Reply {
                    content: answer.text,
                    refused: false,
                    sources: answer.sources,
                }
            }
        };

        self.conversation.push_assistant(&reply.content)?;
        Ok(reply)
    }
}
