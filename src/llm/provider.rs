//! Provider trait and the shared HTTP/envelope plumbing.

use crate::errors::ProviderError;
use async_trait::async_trait;
use serde_json::Value;
use std::time::Duration;

/// Default per-request transport timeout.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(60);

/// Prompt used to check whether a provider answers at all.
pub const CONNECTION_TEST_PROMPT: &str = "You are a helpful AI assistant. \
Please respond with a brief greeting and confirm that you can understand this message. \
Keep your response under 50 words.";

/// A named text-generation backend.
#[async_trait]
pub trait LlmProvider: Send + Sync {
    /// Registry name (`"groq"`, `"gemini"`, ...).
    fn name(&self) -> &str;

    /// Generate text for `prompt`.
    async fn generate(
        &self,
        prompt: &str,
        max_tokens: u32,
        temperature: f32,
    ) -> Result<String, ProviderError>;

    /// Issue a minimal generation and report whether it produced text.
    /// Never fails.
    async fn is_available(&self) -> bool {
        match self.generate(CONNECTION_TEST_PROMPT, 60, 0.0).await {
            Ok(text) => !text.trim().is_empty(),
            Err(e) => {
                tracing::debug!(provider = self.name(), error = %e, "Provider unavailable");
                false
            }
        }
    }
}

/// Response envelope shapes providers are known to return.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Envelope {
    /// `{"choices": [{"message": {"content": ...}}]}`
    ChatCompletions,
    /// `{"candidates": [{"content": {"parts": [{"text": ...}]}}]}`
    Candidates,
}

impl Envelope {
    fn pointer(self) -> &'static str {
        match self {
            Self::ChatCompletions => "/choices/0/message/content",
            Self::Candidates => "/candidates/0/content/parts/0/text",
        }
    }

    /// Detect which known shape `body` has.
    pub fn detect(body: &Value) -> Option<Self> {
        [Self::ChatCompletions, Self::Candidates]
            .into_iter()
            .find(|env| body.pointer(env.pointer()).is_some_and(Value::is_string))
    }
}

/// Pull the generated text out of either envelope shape.
///
/// Any other shape yields an empty string and a logged warning.
///
/// # Examples
///
/// ```
/// use redline::llm::provider::extract_text;
/// use serde_json::json;
///
/// let openai = json!({"choices": [{"message": {"content": "hi"}}]});
/// let gemini = json!({"candidates": [{"content": {"parts": [{"text": "hi"}]}}]});
/// assert_eq!(extract_text("groq", &openai), "hi");
/// assert_eq!(extract_text("gemini", &gemini), "hi");
/// assert_eq!(extract_text("groq", &json!({"error": "nope"})), "");
/// ```
pub fn extract_text(provider: &str, body: &Value) -> String {
    match Envelope::detect(body) {
        Some(envelope) => body
            .pointer(envelope.pointer())
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string(),
        None => {
            tracing::warn!(provider, "Unexpected response envelope, treating as empty");
            String::new()
        }
    }
}

/// Send a JSON request and decode a JSON body, mapping failures to
/// [`ProviderError`] tagged with `provider`.
///
/// Transport errors have their URL stripped so they are safe to log.
pub(crate) async fn send_json(
    provider: &str,
    request: reqwest::RequestBuilder,
) -> Result<Value, ProviderError> {
    let resp = request
        .send()
        .await
        .map_err(|source| ProviderError::Transport {
            provider: provider.to_string(),
            source: source.without_url(),
        })?;

    let status = resp.status();
    if !status.is_success() {
        let body = resp.text().await.unwrap_or_default();
        return Err(ProviderError::Status {
            provider: provider.to_string(),
            status: status.as_u16(),
            body: truncate(&body, 500),
        });
    }

    resp.json::<Value>()
        .await
        .map_err(|source| ProviderError::Transport {
            provider: provider.to_string(),
            source: source.without_url(),
        })
}

fn truncate(s: &str, max: usize) -> String {
    match s.char_indices().nth(max) {
        Some((idx, _)) => format!("{}...", &s[..idx]),
        None => s.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    struct EchoProvider {
        reply: &'static str,
    }

    #[async_trait]
    impl LlmProvider for EchoProvider {
        fn name(&self) -> &str {
            "echo"
        }

        async fn generate(&self, _: &str, _: u32, _: f32) -> Result<String, ProviderError> {
            Ok(self.reply.to_string())
        }
    }

    struct BrokenProvider;

    #[async_trait]
    impl LlmProvider for BrokenProvider {
        fn name(&self) -> &str {
            "broken"
        }

        async fn generate(&self, _: &str, _: u32, _: f32) -> Result<String, ProviderError> {
            Err(ProviderError::Other {
                provider: "broken".to_string(),
                message: "down".to_string(),
            })
        }
    }

    #[test]
    fn test_detect_envelopes() {
        assert_eq!(
            Envelope::detect(&json!({"choices": [{"message": {"content": "x"}}]})),
            Some(Envelope::ChatCompletions)
        );
        assert_eq!(
            Envelope::detect(&json!({"candidates": [{"content": {"parts": [{"text": "x"}]}}]})),
            Some(Envelope::Candidates)
        );
        assert_eq!(Envelope::detect(&json!({"choices": []})), None);
        assert_eq!(
            Envelope::detect(&json!({"choices": [{"message": {"content": null}}]})),
            None
        );
    }

    #[test]
    fn test_extract_text_unknown_shape_is_empty() {
        assert_eq!(extract_text("x", &json!([1, 2, 3])), "");
        assert_eq!(extract_text("x", &json!({"output": "text"})), "");
    }

    #[test]
    fn test_truncate_long_body() {
        let long = "a".repeat(600);
        let out = truncate(&long, 500);
        assert_eq!(out.len(), 503);
        assert_eq!(truncate("short", 500), "short");
    }

    #[tokio::test]
    async fn test_is_available_default() {
        assert!(EchoProvider { reply: "Hello!" }.is_available().await);
        assert!(!EchoProvider { reply: "   " }.is_available().await);
        assert!(!BrokenProvider.is_available().await);
    }
}
