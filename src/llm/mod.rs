pub mod credentials;
pub mod groq;
pub mod probe;
pub mod provider;
pub mod service;
pub mod types;

pub use credentials::ApiKey;
pub use groq::GroqClient;
pub use provider::CompletionClient;
pub use service::LlmService;
pub use types::{ChatMessage, ChatRequest};
