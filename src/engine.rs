/// RAG query engine.
///
/// Lazily loads the knowledge file, builds the lexical index and connects
/// the model client on first use, then answers questions grounded in the
/// best-matching FAQ rows. Every failure path ends in a fixed reply string;
/// nothing propagates out of [`RagEngine::query`].
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use thiserror::Error;
use tokio::sync::OnceCell;
use tracing::{error, info, warn};

use crate::config::Config;
use crate::corpus::{LexicalIndex, LoadError, TfidfError, load_documents};
use crate::llm::gemini::GeminiProvider;
use crate::llm::{LanguageModel, LlmError, ModelProvider};

pub const UNAVAILABLE_REPLY: &str = "I'm currently unavailable. Please try again later.";
pub const UNKNOWN_REPLY: &str = "I don't know. Please wait for the Human reply.";
pub const ERROR_REPLY: &str = "Sorry, I encountered an error. Please try again.";

/// Answers containing any of these (case-insensitive) are treated as the
/// model admitting it does not know.
pub const UNCERTAIN_PHRASES: &[&str] = &["i don't know", "not sure", "cannot", "no information"];

#[derive(Error, Debug)]
pub enum InitError {
    #[error("no API key found in ${0}")]
    MissingApiKey(String),

    #[error("model client: {0}")]
    Llm(#[from] LlmError),

    #[error(transparent)]
    Load(#[from] LoadError),

    #[error("index build failed: {0}")]
    Index(#[from] TfidfError),

    #[error("index task failed: {0}")]
    Task(String),
}

struct Ready {
    model: Arc<dyn LanguageModel>,
    index: LexicalIndex,
}

pub struct RagEngine {
    config: Arc<Config>,
    provider: Arc<dyn ModelProvider>,
    state: OnceCell<Ready>,
    init_attempts: AtomicUsize,
}

impl RagEngine {
    pub fn new(config: Arc<Config>, provider: Arc<dyn ModelProvider>) -> Self {
        Self {
            config,
            provider,
            state: OnceCell::new(),
            init_attempts: AtomicUsize::new(0),
        }
    }

    /// Engine backed by the Gemini API described in `config.llm`.
    pub fn with_gemini(config: Arc<Config>) -> Self {
        let provider = GeminiProvider::new(
            &config.llm.base_url,
            Duration::from_secs(config.llm.timeout_secs),
        );
        Self::new(config, Arc::new(provider))
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    #[must_use]
    pub fn is_ready(&self) -> bool {
        self.state.initialized()
    }

    /// How many times initialization has actually run (successful or not).
    pub fn init_attempts(&self) -> usize {
        self.init_attempts.load(Ordering::SeqCst)
    }

    /// The built index, once initialization has succeeded.
    pub fn index(&self) -> Option<&LexicalIndex> {
        self.state.get().map(|r| &r.index)
    }

    /// Make sure the engine is ready. Returns `false` on any failure; the
    /// next call tries again. Concurrent callers share a single build.
    pub async fn initialize(&self) -> bool {
        match self.state.get_or_try_init(|| self.build()).await {
            Ok(_) => true,
            Err(e) => {
                error!("Initialization failed: {e}");
                false
            }
        }
    }

    async fn build(&self) -> Result<Ready, InitError> {
        self.init_attempts.fetch_add(1, Ordering::SeqCst);
        info!("RAG initialization starting...");

        let api_key = self
            .config
            .api_key()
            .ok_or_else(|| InitError::MissingApiKey(self.config.llm.api_key_env.clone()))?;
        info!("API key loaded");

        let model = self.provider.connect(&api_key, &self.config.llm.model)?;
        info!("Model client ready ({})", model.model());

        let path = self.config.knowledge_file();
        let max_features = self.config.retrieval.max_features;
        let index = tokio::task::spawn_blocking(move || -> Result<LexicalIndex, InitError> {
            let documents = load_documents(&path)?;
            Ok(LexicalIndex::build(documents, max_features)?)
        })
        .await
        .map_err(|e| InitError::Task(e.to_string()))??;

        info!(
            "RAG initialized: {} documents, {} terms",
            index.len(),
            index.vocabulary_len()
        );
        Ok(Ready { model, index })
    }

    /// Context for `query` from the top `top_k` rows above the similarity
    /// floor. Empty when nothing matches or the engine is not ready.
    pub fn retrieve(&self, query: &str, top_k: usize) -> String {
        match self.state.get() {
            Some(ready) => {
                ready
                    .index
                    .retrieve(query, top_k, self.config.retrieval.min_similarity)
            }
            None => {
                warn!("Retrieval requested before initialization");
                String::new()
            }
        }
    }

    /// Answer a question. Always returns a human-readable reply.
    pub async fn query(&self, text: &str) -> String {
        if !self.initialize().await {
            return UNAVAILABLE_REPLY.to_string();
        }
        let Some(ready) = self.state.get() else {
            return UNAVAILABLE_REPLY.to_string();
        };

        let context = self.retrieve(text, self.config.retrieval.top_k);
        if context.is_empty() || context.chars().count() < self.config.retrieval.min_context_chars
        {
            info!("Low-confidence retrieval for {text:?}");
            return UNKNOWN_REPLY.to_string();
        }

        let prompt = build_prompt(&self.config.assistant_name, &context, text);
        let generated = ready.model.generate(&prompt).await.and_then(|a| {
            let trimmed = a.trim();
            if trimmed.is_empty() {
                Err(LlmError::EmptyAnswer)
            } else {
                Ok(trimmed.to_string())
            }
        });
        let answer = match generated {
            Ok(a) => a,
            Err(e) => {
                error!("Query error: {e}");
                return ERROR_REPLY.to_string();
            }
        };

        if is_uncertain(&answer) {
            info!("Model was not confident, deferring to a human");
            return UNKNOWN_REPLY.to_string();
        }
        answer
    }
}

/// Grounding prompt: persona, answer-only-from-context rule, context,
/// question, answer cue.
pub fn build_prompt(assistant_name: &str, context: &str, question: &str) -> String {
    format!(
        "You are a helpful FAQ assistant for {assistant_name}.\n\
         Answer the question based ONLY on the context below. \
         If the answer is not in the context, say \"I don't know.\"\n\
         \n\
         Context:\n\
         {context}\n\
         \n\
         Question: {question}\n\
         \n\
         Answer:"
    )
}

/// Plain substring check against [`UNCERTAIN_PHRASES`].
pub fn is_uncertain(answer: &str) -> bool {
    let lowered = answer.to_lowercase();
    UNCERTAIN_PHRASES.iter().any(|p| lowered.contains(p))
}
