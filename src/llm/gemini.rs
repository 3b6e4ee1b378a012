/// Google Gemini `generateContent` client.
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::header;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::{LanguageModel, LlmError, ModelProvider};

const API_KEY_HEADER: &str = "x-goog-api-key";

// ── Wire types ───────────────────────────────────────────────────────

#[derive(Serialize, Deserialize, Debug, Default)]
struct Part {
    #[serde(default)]
    text: String,
}

#[derive(Serialize, Deserialize, Debug, Default)]
struct Content {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    role: Option<String>,
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Serialize, Debug)]
struct GenerateContentRequest {
    contents: Vec<Content>,
}

#[derive(Deserialize, Debug)]
struct Candidate {
    #[serde(default)]
    content: Option<Content>,
    #[serde(default, rename = "finishReason")]
    finish_reason: Option<String>,
}

#[derive(Deserialize, Debug)]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

impl GenerateContentRequest {
    fn from_prompt(prompt: &str) -> Self {
        Self {
            contents: vec![Content {
                role: Some("user".to_string()),
                parts: vec![Part {
                    text: prompt.to_string(),
                }],
            }],
        }
    }
}

/// Concatenate the text parts of the first candidate.
fn extract_text(response: GenerateContentResponse) -> Result<String, LlmError> {
    let candidate = response
        .candidates
        .into_iter()
        .next()
        .ok_or_else(|| LlmError::BadResponse("no candidates in response".to_string()))?;

    let content = candidate.content.ok_or_else(|| {
        LlmError::BadResponse(format!(
            "candidate has no content (finish reason: {})",
            candidate.finish_reason.as_deref().unwrap_or("unknown")
        ))
    })?;

    let text = content
        .parts
        .into_iter()
        .map(|p| p.text)
        .collect::<Vec<_>>()
        .concat();
    if text.trim().is_empty() {
        return Err(LlmError::EmptyAnswer);
    }
    Ok(text)
}

// ── Provider / client ────────────────────────────────────────────────

/// Connects Gemini clients against a given API base URL.
pub struct GeminiProvider {
    base_url: String,
    timeout: Duration,
}

impl GeminiProvider {
    #[must_use]
    pub fn new(base_url: &str, timeout: Duration) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            timeout,
        }
    }
}

impl ModelProvider for GeminiProvider {
    fn connect(&self, api_key: &str, model: &str) -> Result<Arc<dyn LanguageModel>, LlmError> {
        let client = reqwest::Client::builder()
            .timeout(self.timeout)
            .build()
            .map_err(|e| LlmError::Setup(format!("http client error: {e}")))?;

        Ok(Arc::new(GeminiModel {
            client,
            endpoint: format!("{}/models/{model}:generateContent", self.base_url),
            api_key: api_key.to_string(),
            model: model.to_string(),
        }))
    }
}

pub struct GeminiModel {
    client: reqwest::Client,
    endpoint: String,
    api_key: String,
    model: String,
}

#[async_trait]
impl LanguageModel for GeminiModel {
    async fn generate(&self, prompt: &str) -> Result<String, LlmError> {
        debug!("Calling {} ({} prompt chars)", self.model, prompt.len());

        let response = self
            .client
            .post(&self.endpoint)
            .header(API_KEY_HEADER, &self.api_key)
            .header(header::CONTENT_TYPE, "application/json")
            .json(&GenerateContentRequest::from_prompt(prompt))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(LlmError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let parsed: GenerateContentResponse = response
            .json()
            .await
            .map_err(|e| LlmError::BadResponse(e.to_string()))?;

        extract_text(parsed)
    }

    fn model(&self) -> &str {
        &self.model
    }
}
