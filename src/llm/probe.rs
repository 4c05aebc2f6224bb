//! Candidate-model probing.
//!
//! Hosted providers retire model names regularly, so start-up and the doctor
//! tool walk a candidate list and keep the first model that answers.

use std::fmt;

use super::provider::CompletionClient;
use super::types::ChatRequest;
use crate::core::config::settings::LlmSettings;
use crate::core::errors::LlmError;

pub const PROBE_PROMPT: &str = "Say 'READY' if working.";
const READY_MARKER: &str = "READY";
const ERROR_EXCERPT_CHARS: usize = 100;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProbeOutcome {
    Ready,
    /// Model answered but without the marker.
    UnexpectedReply(String),
    Deprecated,
    NotFound,
    Failed(String),
}

impl ProbeOutcome {
    pub fn is_ready(&self) -> bool {
        matches!(self, ProbeOutcome::Ready)
    }
}

impl fmt::Display for ProbeOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProbeOutcome::Ready => write!(f, "READY"),
            ProbeOutcome::UnexpectedReply(reply) => write!(f, "test response issue: {}", reply),
            ProbeOutcome::Deprecated => write!(f, "DEPRECATED"),
            ProbeOutcome::NotFound => write!(f, "NOT FOUND"),
            ProbeOutcome::Failed(msg) => write!(f, "FAILED: {}", msg),
        }
    }
}

#[derive(Debug, Clone)]
pub struct ProbeReport {
    pub model: String,
    pub outcome: ProbeOutcome,
}

pub fn classify_error(err: &LlmError) -> ProbeOutcome {
    let message = err.to_string();
    if message.contains("decommissioned") {
        return ProbeOutcome::Deprecated;
    }
    if message.contains("not exist") || err.status() == Some(404) {
        return ProbeOutcome::NotFound;
    }
    ProbeOutcome::Failed(message.chars().take(ERROR_EXCERPT_CHARS).collect())
}

pub async fn probe_model(
    client: &dyn CompletionClient,
    model: &str,
    settings: &LlmSettings,
) -> ProbeOutcome {
    let request = ChatRequest::prompt(PROBE_PROMPT).with_settings(settings);
    match client.chat(request, model).await {
        Ok(reply) if reply.contains(READY_MARKER) => ProbeOutcome::Ready,
        Ok(reply) => ProbeOutcome::UnexpectedReply(reply.chars().take(ERROR_EXCERPT_CHARS).collect()),
        Err(err) => classify_error(&err),
    }
}

/// Probes candidates in order and stops at the first ready model.
pub async fn select_model(
    client: &dyn CompletionClient,
    candidates: &[String],
    settings: &LlmSettings,
) -> (Option<String>, Vec<ProbeReport>) {
    let mut reports = Vec::new();
    for model in candidates {
        tracing::info!("Trying to load model: {}", model);
        let outcome = probe_model(client, model, settings).await;
        if outcome.is_ready() {
            tracing::info!("Hosted model {} is ready", model);
        } else {
            tracing::warn!("{} - {}", model, outcome);
        }
        let ready = outcome.is_ready();
        reports.push(ProbeReport {
            model: model.clone(),
            outcome,
        });
        if ready {
            return (Some(model.clone()), reports);
        }
    }
    (None, reports)
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::collections::HashMap;
    use std::sync::Mutex;

    struct ScriptedClient {
        replies: HashMap<String, Result<String, (u16, String)>>,
        calls: Mutex<Vec<String>>,
    }

    impl ScriptedClient {
        fn new(entries: Vec<(&str, Result<&str, (u16, &str)>)>) -> Self {
            let replies = entries
                .into_iter()
                .map(|(model, reply)| {
                    (
                        model.to_string(),
                        reply
                            .map(|r| r.to_string())
                            .map_err(|(s, b)| (s, b.to_string())),
                    )
                })
                .collect();
            Self {
                replies,
                calls: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl CompletionClient for ScriptedClient {
        fn name(&self) -> &str {
            "scripted"
        }

        async fn chat(&self, _request: ChatRequest, model_id: &str) -> Result<String, LlmError> {
            self.calls.lock().unwrap().push(model_id.to_string());
            match self.replies.get(model_id) {
                Some(Ok(reply)) => Ok(reply.clone()),
                Some(Err((status, body))) => Err(LlmError::Status {
                    status: *status,
                    body: body.clone(),
                }),
                None => Err(LlmError::EmptyResponse),
            }
        }
    }

    fn candidates(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn classify_error_recognises_provider_messages() {
        let retired = LlmError::Status {
            status: 400,
            body: "The model `llama2-70b-4096` has been decommissioned".to_string(),
        };
        assert_eq!(classify_error(&retired), ProbeOutcome::Deprecated);

        let missing = LlmError::Status {
            status: 404,
            body: "{}".to_string(),
        };
        assert_eq!(classify_error(&missing), ProbeOutcome::NotFound);

        let other = LlmError::Status {
            status: 500,
            body: "x".repeat(300),
        };
        match classify_error(&other) {
            ProbeOutcome::Failed(msg) => assert_eq!(msg.chars().count(), 100),
            outcome => panic!("unexpected outcome {:?}", outcome),
        }
    }

    #[tokio::test]
    async fn select_model_stops_at_first_ready_candidate() {
        let client = ScriptedClient::new(vec![
            ("old", Err((400, "model has been decommissioned"))),
            ("gone", Err((404, "model does not exist"))),
            ("chatty", Ok("Hello there!")),
            ("good", Ok("READY")),
            ("never", Ok("READY")),
        ]);
        let list = candidates(&["old", "gone", "chatty", "good", "never"]);

        let (selected, reports) = select_model(&client, &list, &LlmSettings::default()).await;

        assert_eq!(selected.as_deref(), Some("good"));
        let outcomes: Vec<_> = reports.iter().map(|r| r.outcome.clone()).collect();
        assert_eq!(
            outcomes,
            vec![
                ProbeOutcome::Deprecated,
                ProbeOutcome::NotFound,
                ProbeOutcome::UnexpectedReply("Hello there!".to_string()),
                ProbeOutcome::Ready,
            ]
        );
        assert!(!client.calls.lock().unwrap().contains(&"never".to_string()));
    }

    #[tokio::test]
    async fn select_model_returns_none_when_all_fail() {
        let client = ScriptedClient::new(vec![]);
        let (selected, reports) =
            select_model(&client, &candidates(&["a", "b"]), &LlmSettings::default()).await;
        assert!(selected.is_none());
        assert_eq!(reports.len(), 2);
    }
}
