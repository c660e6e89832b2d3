//! Google Gemini `generateContent` provider.

use super::provider::{DEFAULT_TIMEOUT, LlmProvider, extract_text, send_json};
use crate::errors::ProviderError;
use async_trait::async_trait;
use std::time::Duration;

pub const GEMINI_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta/models";
pub const GEMINI_MODEL: &str = "gemini-1.5-flash";

pub struct GeminiProvider {
    api_key: String,
    model: String,
    base_url: String,
    timeout: Duration,
    client: reqwest::Client,
}

impl GeminiProvider {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            model: GEMINI_MODEL.to_string(),
            base_url: GEMINI_BASE_URL.to_string(),
            timeout: DEFAULT_TIMEOUT,
            client: reqwest::Client::new(),
        }
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// The key travels in the `x-goog-api-key` header, never in the URL.
    fn endpoint(&self) -> String {
        format!("{}/{}:generateContent", self.base_url, self.model)
    }
}

#[async_trait]
impl LlmProvider for GeminiProvider {
    fn name(&self) -> &str {
        "gemini"
    }

    async fn generate(
        &self,
        prompt: &str,
        max_tokens: u32,
        temperature: f32,
    ) -> Result<String, ProviderError> {
        if self.api_key.is_empty() {
            return Err(ProviderError::MissingApiKey {
                provider: "gemini".to_string(),
            });
        }

        let payload = serde_json::json!({
            "contents": [{
                "parts": [{ "text": prompt }]
            }],
            "generationConfig": {
                "temperature": temperature,
                "maxOutputTokens": max_tokens,
            }
        });

        let request = self
            .client
            .post(self.endpoint())
            .header("x-goog-api-key", &self.api_key)
            .json(&payload)
            .timeout(self.timeout);

        let body = send_json("gemini", request).await?;
        Ok(extract_text("gemini", &body))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{body_partial_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn test_generate_sends_gemini_request() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/models/gemini-1.5-flash:generateContent"))
            .and(header("x-goog-api-key", "g-key"))
            .and(body_partial_json(json!({
                "contents": [{"parts": [{"text": "Review this"}]}],
                "generationConfig": {"maxOutputTokens": 300},
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "candidates": [{"content": {"parts": [{"text": "No issues"}]}}]
            })))
            .expect(1)
            .mount(&server)
            .await;

        let provider =
            GeminiProvider::new("g-key").with_base_url(format!("{}/models/", server.uri()));
        let text = provider.generate("Review this", 300, 0.1).await.unwrap();
        assert_eq!(text, "No issues");
    }

    #[tokio::test]
    async fn test_server_error_is_status_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;

        let provider = GeminiProvider::new("g-key").with_base_url(server.uri());
        let err = provider.generate("x", 10, 0.0).await.unwrap_err();
        assert_eq!(err.provider(), "gemini");
        assert!(matches!(err, ProviderError::Status { status: 500, .. }));
    }

    #[test]
    fn test_endpoint_format() {
        let provider = GeminiProvider::new("k").with_model("gemini-pro");
        assert_eq!(
            provider.endpoint(),
            "https://generativelanguage.googleapis.com/v1beta/models/gemini-pro:generateContent"
        );
    }

    #[tokio::test]
    async fn test_transport_error_does_not_leak_key() {
        let key = "SECRET-KEY-123";
        let provider = GeminiProvider::new(key).with_base_url("http://127.0.0.1:9");
        let err = provider.generate("x", 10, 0.0).await.unwrap_err();
        assert!(matches!(err, ProviderError::Transport { .. }));

        let rendered = format!("{} {:?}", err, err);
        assert!(!rendered.contains(key));
    }
}
