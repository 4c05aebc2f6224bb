//! Typed view over the merged configuration document.
//!
//! Every field has a default so an empty or missing `config.yml` yields a
//! working local-mode setup.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::core::errors::ConfigError;

pub const DEFAULT_EMBEDDING_MODEL: &str = "sentence-transformers/all-MiniLM-L6-v2";
pub const DEFAULT_LLM_BASE_URL: &str = "https://api.groq.com/openai";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub server: ServerSettings,
    pub store: StoreSettings,
    pub embedding: EmbeddingSettings,
    pub llm: LlmSettings,
    pub emergency: EmergencySettings,
}

impl Settings {
    pub fn from_value(config: &Value) -> Result<Self, ConfigError> {
        if config.is_null() {
            return Ok(Self::default());
        }
        serde_json::from_value(config.clone())
            .map_err(|e| ConfigError::Invalid(format!("Invalid configuration: {}", e)))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerSettings {
    pub host: String,
    pub port: u16,
    pub cors_allowed_origins: Vec<String>,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 5000,
            cors_allowed_origins: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreSettings {
    /// Store directory, relative to the data directory unless absolute.
    pub dir: String,
    pub top_k: usize,
    pub max_context_chars: usize,
}

impl Default for StoreSettings {
    fn default() -> Self {
        Self {
            dir: "medical_book_db".to_string(),
            top_k: 3,
            max_context_chars: 2000,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EmbeddingSettings {
    pub base_url: String,
    pub model: String,
    pub api_key: Option<String>,
    pub timeout_secs: u64,
    pub batch_size: usize,
}

impl Default for EmbeddingSettings {
    fn default() -> Self {
        Self {
            base_url: "http://127.0.0.1:8090".to_string(),
            model: DEFAULT_EMBEDDING_MODEL.to_string(),
            api_key: None,
            timeout_secs: 30,
            batch_size: 32,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LlmSettings {
    pub base_url: String,
    /// Overridden by the `GROQ_API_KEY` environment variable.
    pub api_key: Option<String>,
    pub model_candidates: Vec<String>,
    pub temperature: f32,
    pub max_tokens: u32,
    pub timeout_secs: u64,
    pub probe_on_startup: bool,
}

impl Default for LlmSettings {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_LLM_BASE_URL.to_string(),
            api_key: None,
            model_candidates: default_model_candidates(),
            temperature: 0.1,
            max_tokens: 600,
            timeout_secs: 30,
            probe_on_startup: true,
        }
    }
}

fn default_model_candidates() -> Vec<String> {
    [
        "llama-3.1-8b-instant",
        "llama-3.1-70b-versatile",
        "llama-3.2-1b-preview",
        "llama-3.2-3b-preview",
        "llama-3.2-90b-preview",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect()
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchMode {
    /// Bare substring scan; "strokes" triggers "stroke".
    #[default]
    Substring,
    /// Trigger must appear as whole words.
    Word,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct EmergencySettings {
    pub match_mode: MatchMode,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn empty_config_yields_defaults() {
        let settings = Settings::from_value(&json!({})).unwrap();
        assert_eq!(settings.server.port, 5000);
        assert_eq!(settings.store.top_k, 3);
        assert_eq!(settings.embedding.model, DEFAULT_EMBEDDING_MODEL);
        assert_eq!(settings.llm.model_candidates[0], "llama-3.1-8b-instant");
        assert_eq!(settings.emergency.match_mode, MatchMode::Substring);
    }

    #[test]
    fn partial_sections_keep_remaining_defaults() {
        let settings = Settings::from_value(&json!({
            "llm": { "max_tokens": 300 },
            "emergency": { "match_mode": "word" }
        }))
        .unwrap();
        assert_eq!(settings.llm.max_tokens, 300);
        assert!(settings.llm.probe_on_startup);
        assert_eq!(settings.emergency.match_mode, MatchMode::Word);
    }

    #[test]
    fn unknown_match_mode_is_rejected() {
        let result = Settings::from_value(&json!({ "emergency": { "match_mode": "fuzzy" } }));
        assert!(matches!(result, Err(ConfigError::Invalid(_))));
    }
}
