use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde_json::{Map, Value};

use super::paths::AppPaths;
use super::settings::Settings;
use super::validation::validate_config;
use crate::core::errors::ConfigError;

const REDACT_PLACEHOLDER: &str = "****";

const SENSITIVE_PATTERNS: [&str; 8] = [
    "api_key",
    "secret",
    "password",
    "_token",
    "token_",
    "credential",
    "auth_",
    "bearer",
];

const SENSITIVE_WHITELIST: [&str; 3] = ["max_tokens", "total_tokens", "tokens"];

#[derive(Clone)]
pub struct ConfigService {
    paths: Arc<AppPaths>,
}

impl ConfigService {
    pub fn new(paths: Arc<AppPaths>) -> Self {
        Self { paths }
    }

    pub fn config_path(&self) -> PathBuf {
        if let Ok(path) = env::var("MEDIBOOK_CONFIG_PATH") {
            return PathBuf::from(path);
        }

        let user_config = self.paths.user_data_dir.join("config.yml");
        if user_config.exists() {
            return user_config;
        }

        self.paths.project_root.join("config.yml")
    }

    pub fn secrets_path(&self) -> PathBuf {
        self.paths.secrets_path.clone()
    }

    /// Public config deep-merged with the secrets file, validated.
    pub fn load_config(&self) -> Result<Value, ConfigError> {
        let public_config = load_yaml_file(&self.config_path());
        let secrets_config = load_yaml_file(&self.secrets_path());
        let merged = deep_merge(&public_config, &secrets_config);
        validate_config(&merged)?;
        Ok(merged)
    }

    pub fn settings(&self) -> Result<Settings, ConfigError> {
        let config = self.load_config()?;
        Settings::from_value(&config)
    }

    pub fn redact_sensitive_values(&self, value: &Value) -> Value {
        redact_sensitive_values(value)
    }
}

fn load_yaml_file(path: &Path) -> Value {
    if !path.exists() {
        return Value::Object(Map::new());
    }

    match fs::read_to_string(path) {
        Ok(contents) => match serde_yaml::from_str::<Value>(&contents) {
            Ok(value) => match value {
                Value::Object(_) => value,
                _ => Value::Object(Map::new()),
            },
            Err(err) => {
                tracing::warn!("Ignoring unparsable config {}: {}", path.display(), err);
                Value::Object(Map::new())
            }
        },
        Err(_) => Value::Object(Map::new()),
    }
}

fn deep_merge(base: &Value, override_value: &Value) -> Value {
    match (base, override_value) {
        (Value::Object(base_map), Value::Object(override_map)) => {
            let mut merged: Map<String, Value> = base_map.clone();
            for (key, value) in override_map {
                let merged_value = match merged.get(key) {
                    Some(existing) => deep_merge(existing, value),
                    None => value.clone(),
                };
                merged.insert(key.clone(), merged_value);
            }
            Value::Object(merged)
        }
        _ => override_value.clone(),
    }
}

fn redact_sensitive_values(value: &Value) -> Value {
    match value {
        Value::Object(map) => {
            let mut redacted = Map::new();
            for (key, val) in map {
                if is_sensitive_key(key) && !val.is_null() {
                    redacted.insert(key.clone(), Value::String(REDACT_PLACEHOLDER.to_string()));
                } else {
                    redacted.insert(key.clone(), redact_sensitive_values(val));
                }
            }
            Value::Object(redacted)
        }
        Value::Array(items) => Value::Array(items.iter().map(redact_sensitive_values).collect()),
        _ => value.clone(),
    }
}

fn is_sensitive_key(key: &str) -> bool {
    let key_lower = key.to_lowercase();
    if SENSITIVE_WHITELIST
        .iter()
        .any(|allowed| *allowed == key_lower)
    {
        return false;
    }
    SENSITIVE_PATTERNS
        .iter()
        .any(|pattern| key_lower.contains(pattern))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn deep_merge_merges_objects_and_overrides_scalars() {
        let base = json!({
            "llm": { "model_candidates": ["a", "b"], "temperature": 0.1 },
            "store": { "top_k": 3 }
        });
        let secrets = json!({
            "llm": { "api_key": "gsk_secret" },
            "store": { "top_k": 2 }
        });

        let merged = deep_merge(&base, &secrets);

        assert_eq!(
            merged,
            json!({
                "llm": { "model_candidates": ["a", "b"], "temperature": 0.1, "api_key": "gsk_secret" },
                "store": { "top_k": 2 }
            })
        );
    }

    #[test]
    fn redact_sensitive_values_replaces_secrets_only() {
        let input = json!({
            "llm": {
                "api_key": "gsk_secret",
                "max_tokens": 600
            },
            "items": [
                { "password": "pw" }
            ]
        });

        let redacted = redact_sensitive_values(&input);

        assert_eq!(
            redacted,
            json!({
                "llm": {
                    "api_key": "****",
                    "max_tokens": 600
                },
                "items": [
                    { "password": "****" }
                ]
            })
        );
    }

    #[test]
    fn load_config_merges_secrets_file_from_data_dir() {
        let tmp = tempfile::tempdir().unwrap();
        let paths = Arc::new(AppPaths::from_dirs(
            tmp.path().to_path_buf(),
            tmp.path().to_path_buf(),
        ));
        fs::write(
            tmp.path().join("config.yml"),
            "store:\n  top_k: 2\nllm:\n  temperature: 0.3\n",
        )
        .unwrap();
        fs::write(tmp.path().join("secrets.yaml"), "llm:\n  api_key: gsk_abc\n").unwrap();

        let service = ConfigService::new(paths);
        let config = service.load_config().unwrap();

        assert_eq!(config["store"]["top_k"], json!(2));
        assert_eq!(config["llm"]["api_key"], json!("gsk_abc"));

        let settings = service.settings().unwrap();
        assert_eq!(settings.store.top_k, 2);
        assert!((settings.llm.temperature - 0.3).abs() < f32::EPSILON);
    }
}
