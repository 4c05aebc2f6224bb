use std::sync::Arc;

use super::credentials::ApiKey;
use super::groq::GroqClient;
use super::probe::select_model;
use super::provider::CompletionClient;
use super::types::ChatRequest;
use crate::core::config::settings::LlmSettings;
use crate::core::errors::LlmError;

/// A completion client bound to the model chosen at start-up.
#[derive(Clone)]
pub struct LlmService {
    client: Arc<dyn CompletionClient>,
    model: String,
    settings: LlmSettings,
}

impl LlmService {
    pub fn new(client: Arc<dyn CompletionClient>, model: String, settings: LlmSettings) -> Self {
        Self {
            client,
            model,
            settings,
        }
    }

    /// Resolves the credential and picks a model. `None` means local mode:
    /// no key, a malformed key, or no candidate answered.
    pub async fn connect(settings: &LlmSettings) -> Option<Self> {
        let api_key = match ApiKey::resolve(settings.api_key.as_deref()) {
            Ok(key) => key,
            Err(err) => {
                tracing::warn!("No valid hosted API key ({}); using local mode", err);
                return None;
            }
        };

        let client: Arc<dyn CompletionClient> = match GroqClient::new(settings, api_key) {
            Ok(client) => Arc::new(client),
            Err(err) => {
                tracing::warn!("Failed to build completion client: {}", err);
                return None;
            }
        };

        Self::with_client(client, settings).await
    }

    /// Model selection against an already-built client.
    pub async fn with_client(
        client: Arc<dyn CompletionClient>,
        settings: &LlmSettings,
    ) -> Option<Self> {
        let model = if settings.probe_on_startup {
            let (selected, _) =
                select_model(client.as_ref(), &settings.model_candidates, settings).await;
            selected
        } else {
            settings.model_candidates.first().cloned()
        };

        match model {
            Some(model) => {
                tracing::info!("Hosted AI enabled with {} via {}", model, client.name());
                Some(Self::new(client, model, settings.clone()))
            }
            None => {
                tracing::warn!("No working hosted models found; using local mode");
                None
            }
        }
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    pub async fn complete(&self, prompt: &str) -> Result<String, LlmError> {
        let request = ChatRequest::prompt(prompt).with_settings(&self.settings);
        self.client.chat(request, &self.model).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;

    struct EchoClient;

    #[async_trait]
    impl CompletionClient for EchoClient {
        fn name(&self) -> &str {
            "echo"
        }

        async fn chat(&self, request: ChatRequest, model_id: &str) -> Result<String, LlmError> {
            Ok(format!("{}:{}", model_id, request.messages[0].content))
        }
    }

    #[tokio::test]
    async fn without_probing_first_candidate_is_used() {
        let settings = LlmSettings {
            probe_on_startup: false,
            model_candidates: vec!["first".to_string(), "second".to_string()],
            ..LlmSettings::default()
        };
        let service = LlmService::with_client(Arc::new(EchoClient), &settings)
            .await
            .unwrap();
        assert_eq!(service.model(), "first");
        assert_eq!(service.complete("hi").await.unwrap(), "first:hi");
    }

    #[tokio::test]
    async fn empty_candidate_list_means_local_mode() {
        let settings = LlmSettings {
            probe_on_startup: false,
            model_candidates: Vec::new(),
            ..LlmSettings::default()
        };
        assert!(LlmService::with_client(Arc::new(EchoClient), &settings)
            .await
            .is_none());
    }

    #[tokio::test]
    async fn probing_accepts_reply_containing_ready_marker() {
        let settings = LlmSettings {
            model_candidates: vec!["m".to_string()],
            ..LlmSettings::default()
        };
        // EchoClient answers "m:Say 'READY' if working." which contains the marker.
        let service = LlmService::with_client(Arc::new(EchoClient), &settings).await;
        assert_eq!(service.map(|s| s.model().to_string()).as_deref(), Some("m"));
    }
}
