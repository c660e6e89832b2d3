//! LLM access: provider trait, concrete HTTP providers, and the gateway.

pub mod chat_completions;
pub mod gateway;
pub mod gemini;
pub mod provider;

pub use chat_completions::ChatCompletionsProvider;
pub use gateway::LlmGateway;
pub use gemini::GeminiProvider;
pub use provider::{LlmProvider, extract_text};
