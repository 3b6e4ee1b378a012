/// Mock model backend for testing purposes.
///
/// Returns a scripted answer (or failure) and records every call, so tests
/// can run the full pipeline without network access.
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use super::{LanguageModel, LlmError, ModelProvider};

enum Script {
    Answer(String),
    Fail(String),
}

/// A model that always gives the same scripted response.
pub struct MockModel {
    script: Script,
    calls: AtomicUsize,
    last_prompt: Mutex<Option<String>>,
}

impl MockModel {
    /// Model that answers every prompt with `answer`.
    #[must_use]
    pub fn answering(answer: &str) -> Self {
        Self::with_script(Script::Answer(answer.to_string()))
    }

    /// Model whose every call fails with a bad-response error.
    #[must_use]
    pub fn failing(reason: &str) -> Self {
        Self::with_script(Script::Fail(reason.to_string()))
    }

    fn with_script(script: Script) -> Self {
        Self {
            script,
            calls: AtomicUsize::new(0),
            last_prompt: Mutex::new(None),
        }
    }

    /// Number of `generate` calls so far.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// The most recent prompt, if any.
    pub fn last_prompt(&self) -> Option<String> {
        self.last_prompt.lock().ok().and_then(|p| p.clone())
    }
}

impl Default for MockModel {
    fn default() -> Self {
        Self::answering("This is a mock answer.")
    }
}

#[async_trait]
impl LanguageModel for MockModel {
    async fn generate(&self, prompt: &str) -> Result<String, LlmError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Ok(mut last) = self.last_prompt.lock() {
            *last = Some(prompt.to_string());
        }
        match &self.script {
            Script::Answer(a) => Ok(a.clone()),
            Script::Fail(reason) => Err(LlmError::BadResponse(reason.clone())),
        }
    }

    fn model(&self) -> &str {
        "mock"
    }
}

/// Provider handing out one shared `MockModel`.
pub struct MockProvider {
    model: Arc<MockModel>,
    connects: AtomicUsize,
}

impl MockProvider {
    #[must_use]
    pub fn new(model: Arc<MockModel>) -> Self {
        Self {
            model,
            connects: AtomicUsize::new(0),
        }
    }

    /// Number of clients built so far.
    pub fn connects(&self) -> usize {
        self.connects.load(Ordering::SeqCst)
    }
}

impl ModelProvider for MockProvider {
    fn connect(&self, _api_key: &str, _model: &str) -> Result<Arc<dyn LanguageModel>, LlmError> {
        self.connects.fetch_add(1, Ordering::SeqCst);
        Ok(self.model.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_mock_answers_and_records() {
        let model = MockModel::answering("42");
        assert_eq!(model.generate("question?").await.unwrap(), "42");
        assert_eq!(model.calls(), 1);
        assert_eq!(model.last_prompt().as_deref(), Some("question?"));
    }

    #[tokio::test]
    async fn test_mock_failure() {
        let model = MockModel::failing("boom");
        let err = model.generate("anything").await.unwrap_err();
        assert!(err.to_string().contains("boom"));
        assert_eq!(model.calls(), 1);
    }

    #[test]
    fn test_provider_counts_connects() {
        let provider = MockProvider::new(Arc::new(MockModel::default()));
        let client = provider.connect("key", "gemini-2.5-flash").unwrap();
        assert_eq!(client.model(), "mock");
        assert_eq!(provider.connects(), 1);
    }
}
