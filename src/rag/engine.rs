//! Condense-question chat engine.

use super::context::format_context_for_prompt;
use super::{CompletionModel, CondenseQuestionRewriter, ContextBuilder, ContextChunk, QuestionRewriter};
use crate::chat::Turn;
use crate::config::{Prompts, RetrievalSettings};
use crate::error::Result;
use crate::index::CorpusIndex;
use async_trait::async_trait;
use serde::Serialize;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, info, instrument};

/// Reply used when retrieval returns no passages.
pub const NO_CONTEXT_ANSWER: &str =
    "I couldn't find any relevant information in the indexed videos for this question.";

/// An answer with the passages it was grounded on.
#[derive(Debug, Clone, Serialize)]
pub struct Answer {
    pub text: String,
    /// The question the index was searched with.
    pub standalone_question: String,
    pub sources: Vec<ContextChunk>,
}

/// Produces an answer for a question given the prior conversation.
#[async_trait]
pub trait Answerer: Send + Sync {
    /// `history` holds every turn before `question`, oldest first.
    async fn answer(&self, history: &[Turn], question: &str) -> Result<Answer>;
}

/// Rewrites, retrieves, then answers.
pub struct ChatEngine {
    context_builder: ContextBuilder,
    rewriter: Arc<dyn QuestionRewriter>,
    llm: Arc<dyn CompletionModel>,
    prompts: Prompts,
}

impl ChatEngine {
    /// Create an engine that condenses questions with the same model it
    /// answers with.
    pub fn new(index: Arc<CorpusIndex>, llm: Arc<dyn CompletionModel>, prompts: Prompts) -> Self {
        let rewriter = Arc::new(CondenseQuestionRewriter::new(llm.clone(), prompts.clone()));
        Self {
            context_builder: ContextBuilder::new(index),
            rewriter,
            llm,
            prompts,
        }
    }

    /// Replace the question rewriter.
    pub fn with_rewriter(mut self, rewriter: Arc<dyn QuestionRewriter>) -> Self {
        self.rewriter = rewriter;
        self
    }

    /// Apply retrieval depth and score threshold.
    pub fn with_retrieval(mut self, settings: &RetrievalSettings) -> Self {
        self.context_builder = self
            .context_builder
            .with_max_chunks(settings.similarity_top_k)
            .with_min_score(settings.min_score);
        self
    }
}

#[async_trait]
impl Answerer for ChatEngine {
    #[instrument(skip(self, history), fields(turns = history.len()))]
    async fn answer(&self, history: &[Turn], question: &str) -> Result<Answer> {
        let standalone = self.rewriter.rewrite(history, question).await?;
        info!("Answering: {}", standalone);

        let context_chunks = self.context_builder.build(&standalone).await?;
        if context_chunks.is_empty() {
            return Ok(Answer {
                text: NO_CONTEXT_ANSWER.to_string(),
                standalone_question: standalone,
                sources: Vec::new(),
            });
        }

        let mut vars = HashMap::new();
        vars.insert("question".to_string(), standalone.clone());
        vars.insert("context".to_string(), format_context_for_prompt(&context_chunks));
        let prompt = self.prompts.render_with_custom(&self.prompts.chat.answer, &vars);

        let text = self.llm.complete(&self.prompts.chat.system, &prompt).await?;
        debug!("Generated response with {} sources", context_chunks.len());

        Ok(Answer {
            text,
            standalone_question: standalone,
            sources: context_chunks,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::RetrievalSettings;
    use crate::index::testing::index_of;
    use crate::rag::testing::ScriptedModel;
    use crate::rag::VerbatimRewriter;
    use std::sync::atomic::Ordering;

    #[tokio::test]
    async fn test_first_question_answers_from_context() {
        let index = index_of(&[
            "Avenza Maps is a mobile app for offline maps",
            "zzz zzz zzz",
        ])
        .await;
        let llm = Arc::new(ScriptedModel::replying("It is an offline map app."));
        let engine = ChatEngine::new(index, llm.clone(), Prompts::default());

        let history = vec![Turn::assistant("Ask me a question about Avenza Maps YouTube content!")];
        let answer = engine.answer(&history, "What is Avenza Maps?").await.unwrap();

        assert_eq!(answer.text, "It is an offline map app.");
        assert_eq!(answer.standalone_question, "What is Avenza Maps?");
        assert!(!answer.sources.is_empty());
        assert_eq!(answer.sources[0].content, "Avenza Maps is a mobile app for offline maps");

        // No user turn yet, so only the answer prompt reaches the model.
        let prompts = llm.prompts();
        assert_eq!(prompts.len(), 1);
        assert!(prompts[0].contains("Avenza Maps is a mobile app for offline maps"));
        assert!(prompts[0].contains("Query: What is Avenza Maps?"));
    }

    #[tokio::test]
    async fn test_follow_up_is_condensed_before_retrieval() {
        let index = index_of(&["georeferenced pdf import", "store purchases"]).await;
        let llm = Arc::new(ScriptedModel::sequence(&[
            "How do I import a georeferenced pdf?",
            "Use the import button.",
        ]));
        let engine = ChatEngine::new(index, llm.clone(), Prompts::default());

        let history = vec![
            Turn::assistant("Ask me a question!"),
            Turn::user("Can I use my own maps?"),
            Turn::assistant("Yes, you can import them."),
        ];
        let answer = engine.answer(&history, "How?").await.unwrap();

        assert_eq!(answer.standalone_question, "How do I import a georeferenced pdf?");
        assert_eq!(answer.text, "Use the import button.");
        assert_eq!(answer.sources[0].content, "georeferenced pdf import");
        assert_eq!(llm.prompts().len(), 2);
    }

    #[tokio::test]
    async fn test_retrieval_settings_limit_sources() {
        let index = index_of(&["layers one", "layers two", "layers three"]).await;
        let llm = Arc::new(ScriptedModel::replying("ok"));
        let settings = RetrievalSettings {
            similarity_top_k: 1,
            min_score: 0.0,
        };
        let engine = ChatEngine::new(index, llm, Prompts::default())
            .with_rewriter(Arc::new(VerbatimRewriter))
            .with_retrieval(&settings);

        let answer = engine.answer(&[], "layers").await.unwrap();
        assert_eq!(answer.sources.len(), 1);
    }

    #[tokio::test]
    async fn test_placeholders_in_question_and_passage_stay_literal() {
        let index = index_of(&["maps passage mentioning {{question}}"]).await;
        let llm = Arc::new(ScriptedModel::replying("ok"));
        let engine = ChatEngine::new(index, llm.clone(), Prompts::default());

        for _ in 0..10 {
            engine.answer(&[], "maps {{context}} please").await.unwrap();
        }

        for prompt in llm.prompts() {
            assert!(prompt.contains("Query: maps {{context}} please\n"));
            assert!(prompt.contains("maps passage mentioning {{question}}"));
            assert_eq!(prompt.matches("maps passage mentioning").count(), 1);
        }
    }

    #[tokio::test]
    async fn test_empty_context_skips_model() {
        let index = index_of(&[]).await;
        let llm = Arc::new(ScriptedModel::replying("unused"));
        let engine = ChatEngine::new(index, llm.clone(), Prompts::default());

        let answer = engine.answer(&[], "anything").await.unwrap();
        assert_eq!(answer.text, NO_CONTEXT_ANSWER);
        assert!(llm.prompts().is_empty());
    }

    #[tokio::test]
    async fn test_model_failure_propagates() {
        let index = index_of(&["offline maps"]).await;
        let llm = Arc::new(ScriptedModel::replying("unused"));
        llm.fail.store(true, Ordering::SeqCst);
        let engine = ChatEngine::new(index, llm, Prompts::default());

        let err = engine.answer(&[], "offline?").await.unwrap_err();
        assert!(err.is_provider_failure());
    }
}
