/// Configuration module for faqrag.
///
/// Handles loading, validating, and providing default configuration values
/// for the knowledge source, retrieval tuning, LLM backend, and chat server.
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

// ── Default value functions ──────────────────────────────────────────

fn default_knowledge_path() -> String {
    "Files.xlsx".to_string()
}

fn default_assistant_name() -> String {
    "Life & Half".to_string()
}

fn default_top_k() -> usize {
    3
}

fn default_max_features() -> usize {
    500
}

fn default_min_similarity() -> f32 {
    0.1
}

fn default_min_context_chars() -> usize {
    20
}

fn default_api_key_env() -> String {
    "gemini_key".to_string()
}

fn default_model() -> String {
    "gemini-2.5-flash".to_string()
}

fn default_base_url() -> String {
    "https://generativelanguage.googleapis.com/v1beta".to_string()
}

fn default_timeout_secs() -> u64 {
    60
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    5000
}

fn default_session_timeout_secs() -> u64 {
    300
}

// ── Config structs ───────────────────────────────────────────────────

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct Config {
    /// Spreadsheet (or CSV) holding one FAQ entry per row.
    #[serde(default = "default_knowledge_path")]
    pub knowledge_path: String,

    /// Name the assistant introduces itself with in the grounding prompt.
    #[serde(default = "default_assistant_name")]
    pub assistant_name: String,

    #[serde(default)]
    pub retrieval: RetrievalConfig,

    #[serde(default)]
    pub llm: LlmConfig,

    #[serde(default)]
    pub server: ServerConfig,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct RetrievalConfig {
    #[serde(default = "default_top_k")]
    pub top_k: usize,

    /// Vocabulary cap for the TF-IDF vectorizer.
    #[serde(default = "default_max_features")]
    pub max_features: usize,

    /// Matches must score strictly above this to be used as context.
    #[serde(default = "default_min_similarity")]
    pub min_similarity: f32,

    #[serde(default = "default_min_context_chars")]
    pub min_context_chars: usize,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct LlmConfig {
    /// Name of the environment variable carrying the API key.
    #[serde(default = "default_api_key_env")]
    pub api_key_env: String,

    #[serde(default = "default_model")]
    pub model: String,

    #[serde(default = "default_base_url")]
    pub base_url: String,

    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,

    /// Conversation state is dropped after this many idle seconds.
    #[serde(default = "default_session_timeout_secs")]
    pub session_timeout_secs: u64,
}

// ── Default impls ────────────────────────────────────────────────────

impl Default for Config {
    fn default() -> Self {
        Self {
            knowledge_path: default_knowledge_path(),
            assistant_name: default_assistant_name(),
            retrieval: RetrievalConfig::default(),
            llm: LlmConfig::default(),
            server: ServerConfig::default(),
        }
    }
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            top_k: default_top_k(),
            max_features: default_max_features(),
            min_similarity: default_min_similarity(),
            min_context_chars: default_min_context_chars(),
        }
    }
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            api_key_env: default_api_key_env(),
            model: default_model(),
            base_url: default_base_url(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            session_timeout_secs: default_session_timeout_secs(),
        }
    }
}

// ── Config implementation ────────────────────────────────────────────

impl Config {
    /// Load configuration from a JSON file.
    ///
    /// If `config_path` is empty, defaults to `"config.json"`.
    /// If the file does not exist, returns a default config and optionally
    /// generates a template file. A `PORT` environment variable, when set,
    /// overrides `server.port`.
    pub fn load(config_path: &str) -> Result<Self> {
        let path = if config_path.is_empty() {
            "config.json"
        } else {
            config_path
        };

        let mut cfg = if Path::new(path).exists() {
            let data = std::fs::read_to_string(path)
                .with_context(|| format!("failed to read config: {path}"))?;

            match serde_json::from_str::<Config>(&data) {
                Ok(c) => {
                    info!("Loaded configuration from {path}");
                    c
                }
                Err(e) => {
                    warn!("Invalid JSON in {path}: {e}");
                    warn!("Using default configuration");
                    Self::default()
                }
            }
        } else {
            info!("{path} not found, using defaults");
            let cfg = Self::default();

            // Generate template only for the default path
            if path == "config.json" {
                match cfg.save(path) {
                    Ok(()) => info!("Generated config template: {path}"),
                    Err(e) => warn!("Failed to generate config template: {e}"),
                }
            }

            cfg
        };

        if let Ok(port) = std::env::var("PORT") {
            cfg.apply_port_override(&port);
        }

        Ok(cfg)
    }

    /// Save configuration to a JSON file.
    pub fn save(&self, path: &str) -> Result<()> {
        let data = serde_json::to_string_pretty(self).context("failed to marshal config")?;
        std::fs::write(path, data).with_context(|| format!("failed to write config: {path}"))?;
        Ok(())
    }

    /// Validate configuration values.
    pub fn validate(&self) -> Result<()> {
        anyhow::ensure!(
            !self.knowledge_path.trim().is_empty(),
            "knowledge_path must not be empty"
        );
        anyhow::ensure!(self.retrieval.top_k > 0, "retrieval.top_k must be positive");
        anyhow::ensure!(
            self.retrieval.max_features > 0,
            "retrieval.max_features must be positive"
        );
        anyhow::ensure!(
            (0.0..1.0).contains(&self.retrieval.min_similarity),
            "retrieval.min_similarity must be in [0, 1)"
        );
        anyhow::ensure!(
            !self.llm.api_key_env.is_empty(),
            "llm.api_key_env must not be empty"
        );
        anyhow::ensure!(!self.llm.model.is_empty(), "llm.model must not be empty");
        anyhow::ensure!(self.llm.timeout_secs > 0, "llm.timeout_secs must be positive");
        Ok(())
    }

    /// Path of the knowledge spreadsheet.
    #[must_use]
    pub fn knowledge_file(&self) -> PathBuf {
        PathBuf::from(&self.knowledge_path)
    }

    /// Read the API key from the configured environment variable.
    ///
    /// Blank values count as absent.
    #[must_use]
    pub fn api_key(&self) -> Option<String> {
        std::env::var(&self.llm.api_key_env)
            .ok()
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
    }

    fn apply_port_override(&mut self, raw: &str) {
        match raw.trim().parse::<u16>() {
            Ok(port) => self.server.port = port,
            Err(e) => warn!("Ignoring invalid PORT value {raw:?}: {e}"),
        }
    }
}

// ── Tests ────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.knowledge_path, "Files.xlsx");
        assert_eq!(config.retrieval.top_k, 3);
        assert_eq!(config.retrieval.max_features, 500);
        assert_eq!(config.retrieval.min_context_chars, 20);
        assert!((config.retrieval.min_similarity - 0.1).abs() < f32::EPSILON);
        assert_eq!(config.llm.api_key_env, "gemini_key");
        assert_eq!(config.llm.model, "gemini-2.5-flash");
        assert_eq!(config.server.port, 5000);
        assert_eq!(config.server.session_timeout_secs, 300);
    }

    #[test]
    fn test_load_from_json() {
        let json = r#"{"knowledge_path": "./faq.csv", "retrieval": {"top_k": 5}}"#;
        let config: Config = serde_json::from_str(json).unwrap();
        assert_eq!(config.knowledge_path, "./faq.csv");
        assert_eq!(config.retrieval.top_k, 5);
        // Other fields should have defaults
        assert_eq!(config.retrieval.max_features, 500);
        assert_eq!(config.llm.model, "gemini-2.5-flash");
    }

    #[test]
    fn test_load_missing_file_uses_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("absent.json");
        let config = Config::load(path.to_str().unwrap()).unwrap();
        assert_eq!(config.retrieval.top_k, 3);
        // Template is only written for the default path
        assert!(!path.exists());
    }

    #[test]
    fn test_load_invalid_json_uses_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("broken.json");
        std::fs::write(&path, "{ not json").unwrap();
        let config = Config::load(path.to_str().unwrap()).unwrap();
        assert_eq!(config.knowledge_path, "Files.xlsx");
    }

    #[test]
    fn test_validate_ok() {
        let config = Config::default();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_bad_top_k() {
        let mut config = Config::default();
        config.retrieval.top_k = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_bad_similarity() {
        let mut config = Config::default();
        config.retrieval.min_similarity = 1.5;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_port_override() {
        let mut config = Config::default();
        config.apply_port_override("8080");
        assert_eq!(config.server.port, 8080);

        config.apply_port_override("not-a-port");
        assert_eq!(config.server.port, 8080);
    }

    #[test]
    fn test_api_key_missing_variable() {
        let mut config = Config::default();
        config.llm.api_key_env = "FAQRAG_TEST_KEY_THAT_IS_NEVER_SET".to_string();
        assert!(config.api_key().is_none());
    }

    #[test]
    fn test_serialization_roundtrip() {
        let config = Config::default();
        let json = serde_json::to_string_pretty(&config).unwrap();
        let parsed: Config = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed.retrieval.top_k, config.retrieval.top_k);
        assert_eq!(parsed.knowledge_path, config.knowledge_path);
        assert_eq!(parsed.llm.model, config.llm.model);
    }
}
