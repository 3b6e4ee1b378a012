//! Generative language model backend.
//!
//! `ModelProvider` turns a credential and model id into a client;
//! `LanguageModel` turns a prompt into generated text.
pub mod gemini;
pub mod mock;

use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;

/// Errors that can occur while talking to a model backend.
#[derive(Error, Debug)]
pub enum LlmError {
    #[error("client setup failed: {0}")]
    Setup(String),

    #[error("request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("backend returned {status}: {body}")]
    Status { status: u16, body: String },

    #[error("malformed response: {0}")]
    BadResponse(String),

    #[error("model returned an empty answer")]
    EmptyAnswer,
}

/// A hosted text-generation model bound to one credential and model id.
///
/// Implementations must be `Send + Sync` so one client can serve
/// concurrent requests behind `Arc`.
#[async_trait]
pub trait LanguageModel: Send + Sync {
    /// Generate a completion for a single text prompt.
    async fn generate(&self, prompt: &str) -> Result<String, LlmError>;

    /// Model identifier this client is bound to.
    fn model(&self) -> &str;
}

/// Builds `LanguageModel` clients.
pub trait ModelProvider: Send + Sync {
    fn connect(&self, api_key: &str, model: &str) -> Result<Arc<dyn LanguageModel>, LlmError>;
}
