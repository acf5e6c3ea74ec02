//! Append-only conversation state.

use crate::error::{Result, VidchatError};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Who produced a turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

/// One message in a conversation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Turn {
    pub role: Role,
    pub content: String,
    pub created_at: DateTime<Utc>,
}

impl Turn {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
            created_at: Utc::now(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
            created_at: Utc::now(),
        }
    }
}

/// Whether the conversation is waiting on an assistant reply.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChatState {
    /// The last turn is the assistant's; a new question may be asked.
    Idle,
    /// The last turn is an unanswered user question.
    AwaitingAnswer,
}

/// Ordered turns, starting with an assistant greeting.
///
/// User and assistant turns strictly alternate after the greeting.
#[derive(Debug, Clone, Serialize)]
pub struct Conversation {
    turns: Vec<Turn>,
}

impl Conversation {
    pub fn new(greeting: &str) -> Self {
        Self {
            turns: vec![Turn::assistant(greeting)],
        }
    }

    pub fn turns(&self) -> &[Turn] {
        &self.turns
    }

    pub fn len(&self) -> usize {
        self.turns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.turns.is_empty()
    }

    pub fn state(&self) -> ChatState {
        match self.turns.last() {
            Some(turn) if turn.role == Role::User => ChatState::AwaitingAnswer,
            _ => ChatState::Idle,
        }
    }

    /// The unanswered user question, if any.
    pub fn pending_question(&self) -> Option<&str> {
        match self.turns.last() {
            Some(turn) if turn.role == Role::User => Some(turn.content.as_str()),
            _ => None,
        }
    }

    /// Every turn before the pending question, or all turns when idle.
    pub fn history(&self) -> &[Turn] {
        match self.state() {
            ChatState::AwaitingAnswer => &self.turns[..self.turns.len() - 1],
            ChatState::Idle => &self.turns,
        }
    }

    pub fn push_user(&mut self, content: &str) -> Result<()> {
        if self.state() == ChatState::AwaitingAnswer {
            return Err(VidchatError::TurnPending);
        }
        self.turns.push(Turn::user(content));
        Ok(())
    }

    pub fn push_assistant(&mut self, content: &str) -> Result<()> {
        if self.state() == ChatState::Idle {
            return Err(VidchatError::NothingPending);
        }
        self.turns.push(Turn::assistant(content));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_conversation_is_greeting_only() {
        let conv = Conversation::new("Hello!");
        assert_eq!(conv.len(), 1);
        assert_eq!(conv.turns()[0].role, Role::Assistant);
        assert_eq!(conv.turns()[0].content, "Hello!");
        assert_eq!(conv.state(), ChatState::Idle);
        assert_eq!(conv.pending_question(), None);
    }

    #[test]
    fn test_turns_alternate() {
        let mut conv = Conversation::new("Hello!");
        conv.push_user("Q1").unwrap();
        assert_eq!(conv.state(), ChatState::AwaitingAnswer);
        assert_eq!(conv.pending_question(), Some("Q1"));
        assert_eq!(conv.history().len(), 1);

        assert!(matches!(conv.push_user("Q2"), Err(VidchatError::TurnPending)));

        conv.push_assistant("A1").unwrap();
        assert_eq!(conv.state(), ChatState::Idle);
        assert_eq!(conv.history().len(), 3);
        assert!(matches!(conv.push_assistant("A2"), Err(VidchatError::NothingPending)));

        let roles: Vec<Role> = conv.turns().iter().map(|t| t.role).collect();
        assert_eq!(roles, vec![Role::Assistant, Role::User, Role::Assistant]);
    }

    #[test]
    fn test_serialized_shape() {
        let mut conv = Conversation::new("Hi");
        conv.push_user("What is a layer?").unwrap();

        let value = serde_json::to_value(&conv).unwrap();
        assert_eq!(value["turns"][0]["role"], "assistant");
        assert_eq!(value["turns"][1]["role"], "user");
        assert_eq!(value["turns"][1]["content"], "What is a layer?");
        assert_eq!(
            serde_json::to_value(ChatState::AwaitingAnswer).unwrap(),
            "awaiting_answer"
        );
    }
}
