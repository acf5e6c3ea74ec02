//! History-aware question rewriting.

use super::CompletionModel;
use crate::chat::{Role, Turn};
use crate::config::Prompts;
use crate::error::Result;
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, instrument};

/// Rewrites a follow-up question into a query that stands on its own.
#[async_trait]
pub trait QuestionRewriter: Send + Sync {
    async fn rewrite(&self, history: &[Turn], question: &str) -> Result<String>;
}

/// Uses the completion model to condense history plus follow-up into one
/// standalone question.
pub struct CondenseQuestionRewriter {
    llm: Arc<dyn CompletionModel>,
    prompts: Prompts,
}

impl CondenseQuestionRewriter {
    pub fn new(llm: Arc<dyn CompletionModel>, prompts: Prompts) -> Self {
        Self { llm, prompts }
    }
}

#[async_trait]
impl QuestionRewriter for CondenseQuestionRewriter {
    #[instrument(skip(self, history), fields(turns = history.len()))]
    async fn rewrite(&self, history: &[Turn], question: &str) -> Result<String> {
        // Nothing to condense before the user has asked anything.
        if !history.iter().any(|t| t.role == Role::User) {
            return Ok(question.to_string());
        }

        let mut vars = HashMap::new();
        vars.insert("chat_history".to_string(), format_history(history));
        vars.insert("question".to_string(), question.to_string());
        let prompt = self.prompts.render_with_custom(&self.prompts.chat.condense, &vars);

        let condensed = self.llm.complete(&self.prompts.chat.system, &prompt).await?;
        let condensed = condensed.trim();
        debug!("Condensed question: {}", condensed);

        if condensed.is_empty() {
            Ok(question.to_string())
        } else {
            Ok(condensed.to_string())
        }
    }
}

/// Uses the question unchanged.
pub struct VerbatimRewriter;

#[async_trait]
impl QuestionRewriter for VerbatimRewriter {
    async fn rewrite(&self, _history: &[Turn], question: &str) -> Result<String> {
        Ok(question.to_string())
    }
}

fn format_history(history: &[Turn]) -> String {
    history
        .iter()
        .map(|turn| {
            let speaker = match turn.role {
                Role::User => "Human",
                Role::Assistant => "Assistant",
            };
            format!("{}: {}", speaker, turn.content)
        })
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rag::testing::ScriptedModel;

    #[tokio::test]
    async fn test_no_user_history_skips_model() {
        let llm = Arc::new(ScriptedModel::replying("unused"));
        let rewriter = CondenseQuestionRewriter::new(llm.clone(), Prompts::default());

        let history = vec![Turn::assistant("Ask me a question!")];
        let query = rewriter.rewrite(&history, "Does it work offline?").await.unwrap();

        assert_eq!(query, "Does it work offline?");
        assert!(llm.prompts().is_empty());
    }

    #[tokio::test]
    async fn test_history_is_condensed() {
        let llm = Arc::new(ScriptedModel::replying("  Does Avenza Maps work offline on Android?\n"));
        let rewriter = CondenseQuestionRewriter::new(llm.clone(), Prompts::default());

        let history = vec![
            Turn::assistant("Ask me a question!"),
            Turn::user("Is there an Android app?"),
            Turn::assistant("Yes, Avenza Maps runs on Android."),
        ];
        let query = rewriter.rewrite(&history, "Does it work offline?").await.unwrap();

        assert_eq!(query, "Does Avenza Maps work offline on Android?");
        let prompts = llm.prompts();
        assert_eq!(prompts.len(), 1);
        assert!(prompts[0].contains("Human: Is there an Android app?"));
        assert!(prompts[0].contains("Assistant: Yes, Avenza Maps runs on Android."));
        assert!(prompts[0].contains("Does it work offline?"));
    }

    #[tokio::test]
    async fn test_blank_condensation_falls_back_to_question() {
        let llm = Arc::new(ScriptedModel::replying("   "));
        let rewriter = CondenseQuestionRewriter::new(llm, Prompts::default());

        let history = vec![Turn::user("hi"), Turn::assistant("hello")];
        let query = rewriter.rewrite(&history, "And layers?").await.unwrap();
        assert_eq!(query, "And layers?");
    }
}
