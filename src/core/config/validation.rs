use serde_json::{Map, Value};

use crate::core::errors::ConfigError;

pub fn validate_config(config: &Value) -> Result<(), ConfigError> {
    let root = config
        .as_object()
        .ok_or_else(|| config_type_error("root", "object"))?;

    if let Some(server) = expect_optional_object(root, "server")? {
        validate_optional_string_field(server, "server.host", "host")?;
        validate_u64_field(server, "server.port", "port", 0, 65535)?;
        validate_string_array_field(
            server,
            "server.cors_allowed_origins",
            "cors_allowed_origins",
        )?;
    }

    if let Some(store) = expect_optional_object(root, "store")? {
        validate_non_empty_string_field(store, "store.dir", "dir")?;
        validate_u64_field(store, "store.top_k", "top_k", 1, 10)?;
        validate_u64_field(
            store,
            "store.max_context_chars",
            "max_context_chars",
            100,
            100_000,
        )?;
    }

    if let Some(embedding) = expect_optional_object(root, "embedding")? {
        validate_non_empty_string_field(embedding, "embedding.base_url", "base_url")?;
        validate_non_empty_string_field(embedding, "embedding.model", "model")?;
        validate_optional_string_field(embedding, "embedding.api_key", "api_key")?;
        validate_u64_field(embedding, "embedding.timeout_secs", "timeout_secs", 1, 600)?;
        validate_u64_field(embedding, "embedding.batch_size", "batch_size", 1, 1024)?;
    }

    if let Some(llm) = expect_optional_object(root, "llm")? {
        validate_non_empty_string_field(llm, "llm.base_url", "base_url")?;
        validate_optional_string_field(llm, "llm.api_key", "api_key")?;
        validate_string_array_field(llm, "llm.model_candidates", "model_candidates")?;
        validate_f64_field(llm, "llm.temperature", "temperature", 0.0, 2.0)?;
        validate_u64_field(llm, "llm.max_tokens", "max_tokens", 1, 32_768)?;
        validate_u64_field(llm, "llm.timeout_secs", "timeout_secs", 1, 600)?;
        validate_bool_field(llm, "llm.probe_on_startup", "probe_on_startup")?;
    }

    if let Some(emergency) = expect_optional_object(root, "emergency")? {
        validate_enum_field(
            emergency,
            "emergency.match_mode",
            "match_mode",
            &["substring", "word"],
        )?;
    }

    Ok(())
}

fn expect_optional_object<'a>(
    root: &'a Map<String, Value>,
    key: &str,
) -> Result<Option<&'a Map<String, Value>>, ConfigError> {
    match root.get(key) {
        Some(Value::Object(map)) => Ok(Some(map)),
        Some(_) => Err(config_type_error(key, "object")),
        None => Ok(None),
    }
}

fn validate_bool_field(
    section: &Map<String, Value>,
    path: &str,
    key: &str,
) -> Result<(), ConfigError> {
    let Some(value) = section.get(key) else {
        return Ok(());
    };
    if value.as_bool().is_some() {
        return Ok(());
    }
    Err(config_type_error(path, "boolean"))
}

fn validate_u64_field(
    section: &Map<String, Value>,
    path: &str,
    key: &str,
    min: u64,
    max: u64,
) -> Result<(), ConfigError> {
    let Some(value) = section.get(key) else {
        return Ok(());
    };
    let Some(number) = value.as_u64() else {
        return Err(config_type_error(path, "integer"));
    };
    if number < min || number > max {
        return Err(out_of_range(path, min, max));
    }
    Ok(())
}

fn validate_f64_field(
    section: &Map<String, Value>,
    path: &str,
    key: &str,
    min: f64,
    max: f64,
) -> Result<(), ConfigError> {
    let Some(value) = section.get(key) else {
        return Ok(());
    };
    let Some(number) = value.as_f64() else {
        return Err(config_type_error(path, "number"));
    };
    if number < min || number > max {
        return Err(out_of_range(path, min, max));
    }
    Ok(())
}

fn validate_optional_string_field(
    section: &Map<String, Value>,
    path: &str,
    key: &str,
) -> Result<(), ConfigError> {
    let Some(value) = section.get(key) else {
        return Ok(());
    };
    if value.is_null() || value.as_str().is_some() {
        return Ok(());
    }
    Err(config_type_error(path, "string"))
}

fn validate_non_empty_string_field(
    section: &Map<String, Value>,
    path: &str,
    key: &str,
) -> Result<(), ConfigError> {
    let Some(value) = section.get(key) else {
        return Ok(());
    };
    let Some(text) = value.as_str() else {
        return Err(config_type_error(path, "string"));
    };
    if text.trim().is_empty() {
        return Err(ConfigError::Invalid(format!(
            "Invalid config at '{}': value cannot be empty",
            path
        )));
    }
    Ok(())
}

fn validate_enum_field(
    section: &Map<String, Value>,
    path: &str,
    key: &str,
    allowed: &[&str],
) -> Result<(), ConfigError> {
    let Some(value) = section.get(key) else {
        return Ok(());
    };
    let Some(text) = value.as_str() else {
        return Err(config_type_error(path, "string"));
    };
    if allowed.contains(&text) {
        return Ok(());
    }
    Err(ConfigError::Invalid(format!(
        "Invalid config at '{}': expected one of {}",
        path,
        allowed.join(", ")
    )))
}

fn validate_string_array_field(
    section: &Map<String, Value>,
    path: &str,
    key: &str,
) -> Result<(), ConfigError> {
    let Some(value) = section.get(key) else {
        return Ok(());
    };
    let Some(items) = value.as_array() else {
        return Err(config_type_error(path, "array of strings"));
    };
    for (index, item) in items.iter().enumerate() {
        let Some(text) = item.as_str() else {
            return Err(config_type_error(&format!("{}[{}]", path, index), "string"));
        };
        if text.trim().is_empty() {
            return Err(ConfigError::Invalid(format!(
                "Invalid config at '{}[{}]': value cannot be empty",
                path, index
            )));
        }
    }
    Ok(())
}

fn out_of_range<T: std::fmt::Display>(path: &str, min: T, max: T) -> ConfigError {
    ConfigError::Invalid(format!(
        "Invalid config at '{}': must be between {} and {}",
        path, min, max
    ))
}

fn config_type_error(path: &str, expected: &str) -> ConfigError {
    ConfigError::Invalid(format!(
        "Invalid config at '{}': expected {}",
        path, expected
    ))
}
