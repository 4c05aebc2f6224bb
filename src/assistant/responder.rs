use std::sync::Arc;

use super::emergency::EmergencyDetector;
use super::fallback::{canned_answer, first_informative_sentence};
use super::prompt::{build_context, render_prompt};
use crate::core::config::Settings;
use crate::llm::LlmService;
use crate::rag::Retriever;

pub const DISCLAIMER: &str = "\n\n⚠️ Consult healthcare professionals for medical advice.";

/// Answers a single question. Retrieval and the hosted model are both
/// optional; each missing or failing stage falls through to the next one
/// down to the canned table, so `respond` always produces text.
pub struct Responder {
    emergency: EmergencyDetector,
    retriever: Option<Arc<dyn Retriever>>,
    llm: Option<LlmService>,
    top_k: usize,
    max_context_chars: usize,
}

impl Responder {
    pub fn new(
        settings: &Settings,
        retriever: Option<Arc<dyn Retriever>>,
        llm: Option<LlmService>,
    ) -> Self {
        Self {
            emergency: EmergencyDetector::new(settings.emergency.match_mode),
            retriever,
            llm,
            top_k: settings.store.top_k,
            max_context_chars: settings.store.max_context_chars,
        }
    }

    pub fn has_retriever(&self) -> bool {
        self.retriever.is_some()
    }

    pub fn model(&self) -> Option<&str> {
        self.llm.as_ref().map(LlmService::model)
    }

    pub async fn respond(&self, question: &str) -> String {
        if let Some(alert) = self.emergency.detect(question) {
            tracing::warn!("Emergency trigger matched; skipping retrieval");
            return format!("{}{}", alert, DISCLAIMER);
        }

        let context = self.context_for(question).await;
        let answer = match context.as_deref() {
            Some(context) => match self.ask_model(question, context).await {
                Some(answer) => answer,
                None => first_informative_sentence(context)
                    .unwrap_or_else(|| canned_answer(question).to_string()),
            },
            None => canned_answer(question).to_string(),
        };

        format!("{}{}", answer, DISCLAIMER)
    }

    async fn context_for(&self, question: &str) -> Option<String> {
        let retriever = self.retriever.as_ref()?;
        let chunks = match retriever.retrieve(question, self.top_k).await {
            Ok(chunks) => chunks,
            Err(err) => {
                tracing::warn!("Search error: {}", err);
                return None;
            }
        };
        tracing::debug!("Retrieved {} chunks", chunks.len());

        let context = build_context(&chunks, self.max_context_chars);
        if context.is_empty() {
            None
        } else {
            Some(context)
        }
    }

    async fn ask_model(&self, question: &str, context: &str) -> Option<String> {
        let llm = self.llm.as_ref()?;
        match llm.complete(&render_prompt(context, question)).await {
            Ok(text) if !text.trim().is_empty() => Some(text.trim().to_string()),
            Ok(_) => {
                tracing::warn!("Hosted model {} returned an empty answer", llm.model());
                None
            }
            Err(err) => {
                tracing::warn!("Hosted model error: {}", err);
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assistant::emergency::CALL_TO_ACTION;
    use crate::core::config::settings::LlmSettings;
    use crate::core::errors::{EmbeddingError, LlmError, RetrievalError};
    use crate::llm::{ChatRequest, CompletionClient};
    use crate::rag::StoredChunk;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct FixedRetriever {
        chunks: Vec<StoredChunk>,
        calls: AtomicUsize,
    }

    impl FixedRetriever {
        fn new(texts: &[&str]) -> Arc<Self> {
            Arc::new(Self {
                chunks: texts
                    .iter()
                    .enumerate()
                    .map(|(i, t)| StoredChunk::new(t.to_string(), "book.pdf", None, i as i64))
                    .collect(),
                calls: AtomicUsize::new(0),
            })
        }
    }

    #[async_trait]
    impl Retriever for FixedRetriever {
        async fn retrieve(
            &self,
            _query: &str,
            k: usize,
        ) -> Result<Vec<StoredChunk>, RetrievalError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(self.chunks.iter().take(k).cloned().collect())
        }
    }

    struct BrokenRetriever;

    #[async_trait]
    impl Retriever for BrokenRetriever {
        async fn retrieve(
            &self,
            _query: &str,
            _k: usize,
        ) -> Result<Vec<StoredChunk>, RetrievalError> {
            Err(RetrievalError::Embedding(EmbeddingError::Shape {
                expected: 1,
                got: 0,
            }))
        }
    }

    struct CannedClient {
        reply: Result<String, u16>,
    }

    #[async_trait]
    impl CompletionClient for CannedClient {
        fn name(&self) -> &str {
            "canned"
        }

        async fn chat(&self, request: ChatRequest, _model_id: &str) -> Result<String, LlmError> {
            assert!(request.messages[0].content.contains("MEDICAL INFORMATION:"));
            match &self.reply {
                Ok(text) => Ok(text.clone()),
                Err(status) => Err(LlmError::Status {
                    status: *status,
                    body: "unavailable".to_string(),
                }),
            }
        }
    }

    fn llm(reply: Result<&str, u16>) -> LlmService {
        LlmService::new(
            Arc::new(CannedClient {
                reply: reply.map(str::to_string),
            }),
            "test-model".to_string(),
            LlmSettings::default(),
        )
    }

    const PASSAGE: &str = "Diabetes mellitus is a disorder in which the body cannot regulate blood glucose properly. It is common.";

    #[tokio::test]
    async fn diabetes_without_store_or_model_uses_canned_answer() {
        let responder = Responder::new(&Settings::default(), None, None);
        let answer = responder.respond("What is diabetes?").await;
        assert_eq!(
            answer,
            format!(
                "Diabetes affects blood sugar regulation. Type 1 requires insulin; Type 2 can be managed with lifestyle changes.{}",
                DISCLAIMER
            )
        );
    }

    #[tokio::test]
    async fn emergency_short_circuits_retrieval_and_model() {
        let retriever = FixedRetriever::new(&[PASSAGE]);
        let responder = Responder::new(
            &Settings::default(),
            Some(retriever.clone()),
            Some(llm(Ok("should not be used"))),
        );
        let answer = responder.respond("I have chest pain").await;
        assert!(answer.starts_with("🚨 CHEST PAIN could be a heart attack."));
        assert!(answer.contains(CALL_TO_ACTION));
        assert!(answer.ends_with(DISCLAIMER));
        assert_eq!(retriever.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn model_answer_is_trimmed_and_qualified() {
        let responder = Responder::new(
            &Settings::default(),
            Some(FixedRetriever::new(&[PASSAGE])),
            Some(llm(Ok("  Diabetes is a metabolic disorder.\n"))),
        );
        let answer = responder.respond("Tell me about diabetes").await;
        assert_eq!(answer, format!("Diabetes is a metabolic disorder.{}", DISCLAIMER));
    }

    #[tokio::test]
    async fn model_failure_falls_back_to_retrieved_sentence() {
        let responder = Responder::new(
            &Settings::default(),
            Some(FixedRetriever::new(&[PASSAGE])),
            Some(llm(Err(503))),
        );
        let answer = responder.respond("Tell me about diabetes").await;
        assert_eq!(
            answer,
            format!(
                "Diabetes mellitus is a disorder in which the body cannot regulate blood glucose properly{}",
                DISCLAIMER
            )
        );
    }

    #[tokio::test]
    async fn retrieval_error_degrades_to_canned_table() {
        let responder = Responder::new(
            &Settings::default(),
            Some(Arc::new(BrokenRetriever)),
            Some(llm(Ok("unused"))),
        );
        let answer = responder.respond("heart health tips").await;
        assert!(answer.starts_with("Heart disease includes"));
        assert!(answer.ends_with(DISCLAIMER));
    }

    #[tokio::test]
    async fn context_without_long_sentence_uses_canned_table() {
        let responder = Responder::new(
            &Settings::default(),
            Some(FixedRetriever::new(&["A line with exactly enough text. Short bits! Ok?"])),
            None,
        );
        let answer = responder.respond("what about a cold").await;
        assert_eq!(
            answer,
            format!(
                "I can provide information about medical conditions from authoritative sources.{}",
                DISCLAIMER
            )
        );
    }

    #[tokio::test]
    async fn reports_configured_components() {
        let responder = Responder::new(
            &Settings::default(),
            Some(FixedRetriever::new(&[])),
            Some(llm(Ok("x"))),
        );
        assert!(responder.has_retriever());
        assert_eq!(responder.model(), Some("test-model"));

        let bare = Responder::new(&Settings::default(), None, None);
        assert!(!bare.has_retriever());
        assert_eq!(bare.model(), None);
    }
}
