//! Sentence-embedding client.
//!
//! Embeddings come from an OpenAI-compatible `/v1/embeddings` endpoint
//! serving the configured sentence-transformer model.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde_json::json;

use crate::core::config::settings::EmbeddingSettings;
use crate::core::errors::EmbeddingError;

#[async_trait]
pub trait Embedder: Send + Sync {
    /// Model identifier recorded alongside ingested vectors.
    fn model(&self) -> &str;

    /// One vector per input, in input order.
    async fn embed(&self, inputs: &[String]) -> Result<Vec<Vec<f32>>, EmbeddingError>;

    async fn embed_query(&self, query: &str) -> Result<Vec<f32>, EmbeddingError> {
        let mut vectors = self.embed(&[query.to_string()]).await?;
        if vectors.len() != 1 {
            return Err(EmbeddingError::Shape {
                expected: 1,
                got: vectors.len(),
            });
        }
        vectors.pop().ok_or(EmbeddingError::Shape {
            expected: 1,
            got: 0,
        })
    }
}

#[derive(Clone)]
pub struct HttpEmbedder {
    base_url: String,
    model: String,
    api_key: Option<String>,
    client: Client,
}

#[derive(Deserialize)]
struct EmbeddingsResponse {
    data: Vec<EmbeddingItem>,
}

#[derive(Deserialize)]
struct EmbeddingItem {
    #[serde(default)]
    index: Option<usize>,
    embedding: Vec<f32>,
}

impl HttpEmbedder {
    pub fn new(settings: &EmbeddingSettings) -> Result<Self, EmbeddingError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(settings.timeout_secs))
            .build()?;
        Ok(Self {
            base_url: settings.base_url.trim_end_matches('/').to_string(),
            model: settings.model.clone(),
            api_key: settings.api_key.clone().filter(|k| !k.trim().is_empty()),
            client,
        })
    }
}

#[async_trait]
impl Embedder for HttpEmbedder {
    fn model(&self) -> &str {
        &self.model
    }

    async fn embed(&self, inputs: &[String]) -> Result<Vec<Vec<f32>>, EmbeddingError> {
        if inputs.is_empty() {
            return Ok(Vec::new());
        }

        let url = format!("{}/v1/embeddings", self.base_url);
        let body = json!({
            "model": self.model,
            "input": inputs,
        });

        let mut request = self.client.post(&url).json(&body);
        if let Some(key) = &self.api_key {
            request = request.bearer_auth(key);
        }

        let res = request.send().await?;
        if !res.status().is_success() {
            let status = res.status().as_u16();
            let text = res.text().await.unwrap_or_default();
            return Err(EmbeddingError::Status { status, body: text });
        }

        let payload: EmbeddingsResponse = res.json().await?;
        order_embeddings(payload.data, inputs.len())
    }
}

/// Servers may return items out of order; `index` is authoritative when set.
fn order_embeddings(
    mut items: Vec<EmbeddingItem>,
    expected: usize,
) -> Result<Vec<Vec<f32>>, EmbeddingError> {
    if items.len() != expected {
        return Err(EmbeddingError::Shape {
            expected,
            got: items.len(),
        });
    }
    if items.iter().all(|item| item.index.is_some()) {
        items.sort_by_key(|item| item.index.unwrap_or(0));
    }
    Ok(items.into_iter().map(|item| item.embedding).collect())
}
