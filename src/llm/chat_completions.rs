//! OpenAI-compatible chat completions provider (Groq by default).

use super::provider::{DEFAULT_TIMEOUT, LlmProvider, extract_text, send_json};
use crate::errors::ProviderError;
use async_trait::async_trait;
use std::time::Duration;

pub const GROQ_ENDPOINT: &str = "https://api.groq.com/openai/v1/chat/completions";
pub const GROQ_MODEL: &str = "llama3-70b-8192";

/// Provider speaking the `/chat/completions` request shape.
pub struct ChatCompletionsProvider {
    name: String,
    api_key: String,
    model: String,
    endpoint: String,
    timeout: Duration,
    client: reqwest::Client,
}

impl ChatCompletionsProvider {
    pub fn new(
        name: impl Into<String>,
        api_key: impl Into<String>,
        model: impl Into<String>,
        endpoint: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            api_key: api_key.into(),
            model: model.into(),
            endpoint: endpoint.into(),
            timeout: DEFAULT_TIMEOUT,
            client: reqwest::Client::new(),
        }
    }

    /// Groq with its default model and endpoint.
    pub fn groq(api_key: impl Into<String>) -> Self {
        Self::new("groq", api_key, GROQ_MODEL, GROQ_ENDPOINT)
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn model(&self) -> &str {
        &self.model
    }
}

#[async_trait]
impl LlmProvider for ChatCompletionsProvider {
    fn name(&self) -> &str {
        &self.name
    }

    async fn generate(
        &self,
        prompt: &str,
        max_tokens: u32,
        temperature: f32,
    ) -> Result<String, ProviderError> {
        if self.api_key.is_empty() {
            return Err(ProviderError::MissingApiKey {
                provider: self.name.clone(),
            });
        }

        let payload = serde_json::json!({
            "model": self.model,
            "messages": [{ "role": "user", "content": prompt }],
            "max_tokens": max_tokens,
            "temperature": temperature,
        });

        let request = self
            .client
            .post(&self.endpoint)
            .bearer_auth(&self.api_key)
            .json(&payload)
            .timeout(self.timeout);

        let body = send_json(&self.name, request).await?;
        Ok(extract_text(&self.name, &body))
    }
}
