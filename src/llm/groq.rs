use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde_json::{json, Value};

use super::credentials::ApiKey;
use super::provider::CompletionClient;
use super::types::ChatRequest;
use crate::core::config::settings::LlmSettings;
use crate::core::errors::LlmError;

/// Chat completions against Groq's OpenAI-compatible API (or any server
/// speaking the same protocol).
#[derive(Clone)]
pub struct GroqClient {
    base_url: String,
    api_key: ApiKey,
    client: Client,
}

impl GroqClient {
    pub fn new(settings: &LlmSettings, api_key: ApiKey) -> Result<Self, LlmError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(settings.timeout_secs))
            .build()?;
        Ok(Self {
            base_url: settings.base_url.trim_end_matches('/').to_string(),
            api_key,
            client,
        })
    }
}

fn build_body(request: &ChatRequest, model_id: &str) -> Value {
    let mut body = json!({
        "model": model_id,
        "messages": request.messages,
        "stream": false,
    });

    if let Some(obj) = body.as_object_mut() {
        if let Some(t) = request.temperature {
            obj.insert("temperature".to_string(), json!(t));
        }
        if let Some(t) = request.max_tokens {
            obj.insert("max_tokens".to_string(), json!(t));
        }
    }
    body
}

fn extract_content(payload: &Value) -> Result<String, LlmError> {
    payload["choices"][0]["message"]["content"]
        .as_str()
        .map(|s| s.to_string())
        .ok_or(LlmError::EmptyResponse)
}

#[async_trait]
impl CompletionClient for GroqClient {
    fn name(&self) -> &str {
        "groq"
    }

    async fn chat(&self, request: ChatRequest, model_id: &str) -> Result<String, LlmError> {
        let url = format!("{}/v1/chat/completions", self.base_url);
        let body = build_body(&request, model_id);

        let res = self
            .client
            .post(&url)
            .bearer_auth(self.api_key.expose())
            .json(&body)
            .send()
            .await?;

        if !res.status().is_success() {
            let status = res.status().as_u16();
            let text = res.text().await.unwrap_or_default();
            return Err(LlmError::Status { status, body: text });
        }

        let payload: Value = res.json().await?;
        extract_content(&payload)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::types::ChatMessage;

    #[test]
    fn body_includes_sampling_settings() {
        let request = ChatRequest::prompt("hi").with_settings(&LlmSettings::default());
        let body = build_body(&request, "llama-3.1-8b-instant");

        assert_eq!(body["model"], json!("llama-3.1-8b-instant"));
        assert_eq!(body["stream"], json!(false));
        assert_eq!(body["max_tokens"], json!(600));
        assert!(body["temperature"].as_f64().is_some());
        assert_eq!(
            body["messages"],
            json!([ChatMessage::user("hi")])
        );
    }

    #[test]
    fn body_omits_unset_fields() {
        let body = build_body(&ChatRequest::prompt("hi"), "m");
        assert!(body.get("temperature").is_none());
        assert!(body.get("max_tokens").is_none());
    }

    #[test]
    fn extract_content_reads_first_choice() {
        let payload = json!({
            "choices": [{ "message": { "role": "assistant", "content": "READY" } }]
        });
        assert_eq!(extract_content(&payload).unwrap(), "READY");
        assert!(matches!(
            extract_content(&json!({ "choices": [] })),
            Err(LlmError::EmptyResponse)
        ));
    }
}
