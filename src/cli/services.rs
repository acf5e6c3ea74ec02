//! Startup shared by the chat surfaces: credentials, index, engine.

use crate::chat::ChatSession;
use crate::cli::Output;
use crate::config::{Prompts, Settings};
use crate::error::{Result, VidchatError};
use crate::index::{shared_cache, CorpusIndex, CorpusIndexer};
use crate::moderation::{ModerationGate, OpenAIModerator};
use crate::openai::{create_client, OpenAIClient};
use crate::rag::{Answerer, ChatEngine, OpenAIChatModel};
use crate::sources::load_source_list;
use indicatif::ProgressBar;
use std::sync::Arc;
use tracing::info;

/// Everything a new chat session needs, built once per process.
#[derive(Clone)]
pub struct ChatServices {
    index: Arc<CorpusIndex>,
    gate: ModerationGate,
    answerer: Arc<dyn Answerer>,
    greeting: String,
}

impl ChatServices {
    pub fn new(
        index: Arc<CorpusIndex>,
        gate: ModerationGate,
        answerer: Arc<dyn Answerer>,
        greeting: &str,
    ) -> Self {
        Self {
            index,
            gate,
            answerer,
            greeting: greeting.to_string(),
        }
    }

    /// Resolve credentials, build (or reuse) the index and wire the
    /// OpenAI-backed moderation and answering engine.
    pub async fn start(settings: &Settings) -> Result<Self> {
        let client = openai_client(settings)?;

        let progress = Output::progress_bar(0, &settings.ui.loading_message);
        let index = load_index(settings, client.clone(), progress.clone()).await;
        progress.finish_and_clear();
        let index = index?;

        let prompts = Prompts::load(
            settings.prompts.custom_dir.as_deref(),
            Some(&settings.prompts.variables),
        )?;
        let llm = Arc::new(OpenAIChatModel::from_settings(client.clone(), &settings.llm));
        let engine = ChatEngine::new(index.clone(), llm, prompts).with_retrieval(&settings.retrieval);
        let gate = ModerationGate::new(Arc::new(OpenAIModerator::new(client)));

        info!(model = %settings.llm.model, "Chat services ready");
        Ok(Self::new(index, gate, Arc::new(engine), &settings.ui.greeting))
    }

    pub fn index(&self) -> &Arc<CorpusIndex> {
        &self.index
    }

    /// A fresh conversation holding only the greeting.
    pub fn new_session(&self) -> ChatSession {
        ChatSession::new(&self.greeting, self.gate.clone(), self.answerer.clone())
    }
}

/// Build an OpenAI client from the configured credential.
pub fn openai_client(settings: &Settings) -> Result<OpenAIClient> {
    let key = settings.openai_api_key()?.ok_or_else(|| {
        VidchatError::Config(format!(
            "OpenAI API key not found. Set OPENAI_API_KEY or add openai_key to {}",
            settings.secrets_path().display()
        ))
    })?;
    Ok(create_client(Some(&key)))
}

/// The process-wide index, built from the source list on first use.
pub async fn load_index(
    settings: &Settings,
    client: OpenAIClient,
    progress: ProgressBar,
) -> Result<Arc<CorpusIndex>> {
    shared_cache()
        .get_or_build(move || async move {
            let sources = load_source_list(&settings.source_list_path())?;
            CorpusIndexer::from_settings(settings, client)
                .with_progress(progress)
                .build(&sources)
                .await
        })
        .await
}
