use async_trait::async_trait;

use super::types::ChatRequest;
use crate::core::errors::LlmError;

#[async_trait]
pub trait CompletionClient: Send + Sync {
    /// provider name (e.g. "groq")
    fn name(&self) -> &str;

    /// chat completion (non-streaming) against an explicit model
    async fn chat(&self, request: ChatRequest, model_id: &str) -> Result<String, LlmError>;
}
