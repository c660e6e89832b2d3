//! Provider registry with default/fallback resolution.

use super::chat_completions::ChatCompletionsProvider;
use super::gemini::GeminiProvider;
use super::provider::LlmProvider;
use crate::config::RedlineConfig;
use crate::errors::{LlmError, ProviderError};
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

pub const DEFAULT_MAX_TOKENS: u32 = 2000;

/// Routes generation requests to named providers.
///
/// A request goes to the explicitly named provider (or the default) first.
/// If that fails and a distinct fallback is registered, the fallback gets
/// one attempt. Unregistered names are skipped.
pub struct LlmGateway {
    providers: Vec<Arc<dyn LlmProvider>>,
    default_provider: String,
    fallback_provider: Option<String>,
    max_tokens: u32,
}

impl LlmGateway {
    pub fn new(default_provider: impl Into<String>, fallback_provider: Option<String>) -> Self {
        Self {
            providers: Vec::new(),
            default_provider: default_provider.into(),
            fallback_provider,
            max_tokens: DEFAULT_MAX_TOKENS,
        }
    }

    /// Build a gateway registering every provider whose API key is set.
    pub fn from_config(config: &RedlineConfig) -> Self {
        let llm = &config.toml.llm;
        let timeout = Duration::from_secs(llm.timeout_secs);
        let mut gateway = Self::new(config.default_provider(), config.fallback_provider())
            .with_max_tokens(config.max_tokens());

        if let Some(key) = config.groq_api_key() {
            gateway.register(Arc::new(
                ChatCompletionsProvider::new(
                    "groq",
                    key,
                    llm.groq.model.as_str(),
                    llm.groq.base_url.as_str(),
                )
                .with_timeout(timeout),
            ));
        }
        if let Some(key) = config.gemini_api_key() {
            gateway.register(Arc::new(
                GeminiProvider::new(key)
                    .with_model(llm.gemini.model.as_str())
                    .with_base_url(llm.gemini.base_url.as_str())
                    .with_timeout(timeout),
            ));
        }

        tracing::info!(
            providers = ?gateway.available_providers(),
            default = %gateway.default_provider,
            fallback = ?gateway.fallback_provider,
            "LLM gateway initialized"
        );
        gateway
    }

    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = max_tokens;
        self
    }

    /// Add a provider, replacing any previously registered one with the same name.
    pub fn register(&mut self, provider: Arc<dyn LlmProvider>) {
        self.providers.retain(|p| p.name() != provider.name());
        self.providers.push(provider);
    }

    pub fn with_provider(mut self, provider: Arc<dyn LlmProvider>) -> Self {
        self.register(provider);
        self
    }

    pub fn provider(&self, name: &str) -> Option<&Arc<dyn LlmProvider>> {
        self.providers.iter().find(|p| p.name() == name)
    }

    /// Registered provider names, in registration order.
    pub fn available_providers(&self) -> Vec<&str> {
        self.providers.iter().map(|p| p.name()).collect()
    }

    pub fn default_provider(&self) -> &str {
        &self.default_provider
    }

    pub fn fallback_provider(&self) -> Option<&str> {
        self.fallback_provider.as_deref()
    }

    /// Per-request token budget agents should pass to [`generate_response`](Self::generate_response).
    pub fn max_tokens(&self) -> u32 {
        self.max_tokens
    }

    /// Providers to try for a request targeting `provider` (or the default).
    fn chain(&self, provider: Option<&str>) -> Vec<&dyn LlmProvider> {
        let target = provider.unwrap_or(&self.default_provider);
        let mut chain: Vec<&dyn LlmProvider> = Vec::with_capacity(2);

        match self.provider(target) {
            Some(p) => chain.push(p.as_ref()),
            None => tracing::debug!(provider = target, "Requested provider not registered"),
        }

        if let Some(fallback) = self.fallback_provider.as_deref()
            && fallback != target
            && let Some(p) = self.provider(fallback)
        {
            chain.push(p.as_ref());
        }

        chain
    }

    /// Generate text, falling back once on failure.
    pub async fn generate_response(
        &self,
        prompt: &str,
        max_tokens: u32,
        temperature: f32,
        provider: Option<&str>,
    ) -> Result<String, LlmError> {
        resolve(&self.chain(provider), prompt, max_tokens, temperature).await
    }

    /// Check every registered provider. Never fails.
    pub async fn test_connection(&self) -> BTreeMap<String, bool> {
        let mut results = BTreeMap::new();
        for provider in &self.providers {
            let ok = provider.is_available().await;
            tracing::info!(provider = provider.name(), available = ok, "Provider availability checked");
            results.insert(provider.name().to_string(), ok);
        }
        results
    }
}

/// Try each provider in order; the first success wins.
pub async fn resolve(
    chain: &[&dyn LlmProvider],
    prompt: &str,
    max_tokens: u32,
    temperature: f32,
) -> Result<String, LlmError> {
    let mut attempted = Vec::with_capacity(chain.len());
    let mut last_error: Option<ProviderError> = None;

    for provider in chain {
        attempted.push(provider.name().to_string());
        match provider.generate(prompt, max_tokens, temperature).await {
            Ok(text) => {
                if attempted.len() > 1 {
                    tracing::info!(provider = provider.name(), "Fallback provider succeeded");
                }
                return Ok(text);
            }
            Err(e) => {
                tracing::warn!(provider = provider.name(), error = %e, "LLM provider failed");
                last_error = Some(e);
            }
        }
    }

    Err(LlmError::AllProvidersFailed {
        attempted,
        last_error,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};

    // =========================================
    // Fake providers
    // =========================================

    struct FakeProvider {
        name: &'static str,
        reply: Option<&'static str>,
        calls: AtomicUsize,
    }

    impl FakeProvider {
        fn ok(name: &'static str, reply: &'static str) -> Arc<Self> {
            Arc::new(Self {
                name,
                reply: Some(reply),
                calls: AtomicUsize::new(0),
            })
        }

        fn failing(name: &'static str) -> Arc<Self> {
            Arc::new(Self {
                name,
                reply: None,
                calls: AtomicUsize::new(0),
            })
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl LlmProvider for FakeProvider {
        fn name(&self) -> &str {
            self.name
        }

        async fn generate(&self, _: &str, _: u32, _: f32) -> Result<String, ProviderError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            match self.reply {
                Some(reply) => Ok(reply.to_string()),
                None => Err(ProviderError::Other {
                    provider: self.name.to_string(),
                    message: "simulated outage".to_string(),
                }),
            }
        }
    }

    fn gateway(
        default: &str,
        fallback: Option<&str>,
        providers: &[Arc<FakeProvider>],
    ) -> LlmGateway {
        let mut gw = LlmGateway::new(default, fallback.map(String::from));
        for p in providers {
            gw.register(p.clone());
        }
        gw
    }

    // =========================================
    // Resolution
    // =========================================

    #[tokio::test]
    async fn test_default_provider_used() {
        let groq = FakeProvider::ok("groq", "from groq");
        let gemini = FakeProvider::ok("gemini", "from gemini");
        let gw = gateway("groq", Some("gemini"), &[groq.clone(), gemini.clone()]);

        let text = gw.generate_response("p", 100, 0.3, None).await.unwrap();
        assert_eq!(text, "from groq");
        assert_eq!(gemini.calls(), 0);
    }

    #[tokio::test]
    async fn test_fallback_after_default_fails() {
        let groq = FakeProvider::failing("groq");
        let gemini = FakeProvider::ok("gemini", "from gemini");
        let gw = gateway("groq", Some("gemini"), &[groq.clone(), gemini.clone()]);

        let text = gw.generate_response("p", 100, 0.3, None).await.unwrap();
        assert_eq!(text, "from gemini");
        assert_eq!(groq.calls(), 1);
        assert_eq!(gemini.calls(), 1);
    }

    #[tokio::test]
    async fn test_explicit_provider_overrides_default() {
        let groq = FakeProvider::ok("groq", "from groq");
        let gemini = FakeProvider::ok("gemini", "from gemini");
        let gw = gateway("groq", Some("gemini"), &[groq.clone(), gemini]);

        let text = gw
            .generate_response("p", 100, 0.3, Some("gemini"))
            .await
            .unwrap();
        assert_eq!(text, "from gemini");
        assert_eq!(groq.calls(), 0);
    }

    #[tokio::test]
    async fn test_fallback_not_retried_when_it_was_the_target() {
        let gemini = FakeProvider::failing("gemini");
        let gw = gateway("groq", Some("gemini"), &[gemini.clone()]);

        let err = gw
            .generate_response("p", 100, 0.3, Some("gemini"))
            .await
            .unwrap_err();
        assert_eq!(gemini.calls(), 1);
        match err {
            LlmError::AllProvidersFailed {
                attempted,
                last_error,
            } => {
                assert_eq!(attempted, vec!["gemini"]);
                assert_eq!(last_error.unwrap().provider(), "gemini");
            }
            other => panic!("Expected AllProvidersFailed, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_unregistered_target_goes_straight_to_fallback() {
        let gemini = FakeProvider::ok("gemini", "from gemini");
        let gw = gateway("groq", Some("gemini"), &[gemini.clone()]);

        let text = gw.generate_response("p", 100, 0.3, None).await.unwrap();
        assert_eq!(text, "from gemini");
    }

    #[tokio::test]
    async fn test_both_fail() {
        let gw = gateway(
            "groq",
            Some("gemini"),
            &[FakeProvider::failing("groq"), FakeProvider::failing("gemini")],
        );
        let err = gw.generate_response("p", 100, 0.3, None).await.unwrap_err();
        assert_eq!(
            err.to_string(),
            "All LLM providers failed (attempted: groq, gemini)"
        );
    }

    #[tokio::test]
    async fn test_no_providers_registered() {
        let gw = LlmGateway::new("groq", Some("gemini".to_string()));
        let err = gw.generate_response("p", 100, 0.3, None).await.unwrap_err();
        assert!(matches!(
            err,
            LlmError::AllProvidersFailed { ref attempted, last_error: None } if attempted.is_empty()
        ));
    }

    #[tokio::test]
    async fn test_unknown_explicit_provider_without_fallback() {
        let groq = FakeProvider::ok("groq", "unused");
        let gw = gateway("groq", None, &[groq.clone()]);
        let err = gw
            .generate_response("p", 100, 0.3, Some("openai"))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            LlmError::AllProvidersFailed { ref attempted, last_error: None } if attempted.is_empty()
        ));
        assert_eq!(groq.calls(), 0);
    }

    #[tokio::test]
    async fn test_no_fallback_configured() {
        let groq = FakeProvider::failing("groq");
        let gemini = FakeProvider::ok("gemini", "unused");
        let gw = gateway("groq", None, &[groq, gemini.clone()]);

        assert!(gw.generate_response("p", 100, 0.3, None).await.is_err());
        assert_eq!(gemini.calls(), 0);
    }

    // =========================================
    // Registry
    // =========================================

    #[test]
    fn test_register_replaces_same_name() {
        let gw = gateway(
            "groq",
            None,
            &[FakeProvider::ok("groq", "a"), FakeProvider::ok("gemini", "b")],
        )
        .with_provider(FakeProvider::ok("groq", "c"));
        assert_eq!(gw.available_providers(), vec!["gemini", "groq"]);
    }

    #[tokio::test]
    async fn test_connection_reports_each_provider() {
        let gw = gateway(
            "groq",
            Some("gemini"),
            &[FakeProvider::ok("groq", "Hello"), FakeProvider::failing("gemini")],
        );
        let results = gw.test_connection().await;
        assert_eq!(results.get("groq"), Some(&true));
        assert_eq!(results.get("gemini"), Some(&false));
    }

    #[test]
    fn test_max_tokens_default_and_override() {
        let gw = LlmGateway::new("groq", None);
        assert_eq!(gw.max_tokens(), DEFAULT_MAX_TOKENS);
        assert_eq!(gw.with_max_tokens(500).max_tokens(), 500);
    }

    #[test]
    fn test_from_config_registers_keyed_providers() {
        use crate::config::{EnvOverrides, RedlineConfig, RedlineToml};

        let env = EnvOverrides {
            gemini_api_key: Some("test-key".to_string()),
            max_tokens: Some("700".to_string()),
            ..Default::default()
        };
        let config = RedlineConfig::from_parts("/project".into(), RedlineToml::default(), env);
        let gw = LlmGateway::from_config(&config);

        assert_eq!(gw.available_providers(), vec!["gemini"]);
        assert_eq!(gw.default_provider(), "groq");
        assert_eq!(gw.fallback_provider(), Some("gemini"));
        assert_eq!(gw.max_tokens(), 700);
    }
}
