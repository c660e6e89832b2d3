//! Typed error hierarchy for the review engine.
//!
//! One enum per subsystem:
//! - `ProviderError`: a single LLM provider call failed
//! - `LlmError`: the gateway could not produce text from any provider
//! - `StoreError`: findings store failures
//! - `OrchestratorError`: conditions that abort a whole review
//! - `FractionError`: malformed fraction notation
//!
//! Agent `review()` bodies return `anyhow::Result`; those errors are logged
//! and swallowed by the execution wrapper and never reach this hierarchy.

use thiserror::Error;

/// A single provider call failed. Always names the provider.
#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("{provider}: request failed: {source}")]
    Transport {
        provider: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("{provider}: HTTP {status}: {body}")]
    Status {
        provider: String,
        status: u16,
        body: String,
    },

    #[error("{provider}: no API key configured")]
    MissingApiKey { provider: String },

    #[error("{provider}: {message}")]
    Other { provider: String, message: String },
}

impl ProviderError {
    /// Name of the provider that failed.
    pub fn provider(&self) -> &str {
        match self {
            Self::Transport { provider, .. }
            | Self::Status { provider, .. }
            | Self::MissingApiKey { provider }
            | Self::Other { provider, .. } => provider,
        }
    }

    /// Whether the failure was the transport timing out.
    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::Transport { source, .. } if source.is_timeout())
    }
}

/// Errors surfaced by the LLM gateway.
#[derive(Debug, Error)]
pub enum LlmError {
    #[error("All LLM providers failed (attempted: {})", attempted.join(", "))]
    AllProvidersFailed {
        attempted: Vec<String>,
        #[source]
        last_error: Option<ProviderError>,
    },
}

/// Errors from the findings store.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Review session {id} not found")]
    SessionNotFound { id: i64 },

    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("Database lock poisoned")]
    LockPoisoned,

    #[error("Invalid stored value in column '{column}': {message}")]
    InvalidColumn { column: String, message: String },
}

/// Errors that abort an orchestrated review.
#[derive(Debug, Error)]
pub enum OrchestratorError {
    #[error("Review context has no session id")]
    MissingSessionId,

    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Malformed fraction text.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FractionError {
    #[error("Invalid number '{part}' in fraction '{text}'")]
    InvalidNumber { text: String, part: String },

    #[error("Zero denominator in fraction '{0}'")]
    ZeroDenominator(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn provider_error_reports_provider_name() {
        let err = ProviderError::Status {
            provider: "groq".to_string(),
            status: 503,
            body: "unavailable".to_string(),
        };
        assert_eq!(err.provider(), "groq");
        assert_eq!(err.to_string(), "groq: HTTP 503: unavailable");
        assert!(!err.is_timeout());
    }

    #[test]
    fn missing_api_key_is_matchable() {
        let err = ProviderError::MissingApiKey {
            provider: "gemini".to_string(),
        };
        match &err {
            ProviderError::MissingApiKey { provider } => assert_eq!(provider, "gemini"),
            _ => panic!("Expected MissingApiKey variant"),
        }
    }

    #[test]
    fn all_providers_failed_lists_attempts() {
        let err = LlmError::AllProvidersFailed {
            attempted: vec!["groq".to_string(), "gemini".to_string()],
            last_error: None,
        };
        assert_eq!(
            err.to_string(),
            "All LLM providers failed (attempted: groq, gemini)"
        );
    }

    #[test]
    fn all_providers_failed_exposes_source() {
        use std::error::Error as _;
        let err = LlmError::AllProvidersFailed {
            attempted: vec!["groq".to_string()],
            last_error: Some(ProviderError::Other {
                provider: "groq".to_string(),
                message: "boom".to_string(),
            }),
        };
        let source = err.source().expect("source should be set");
        assert_eq!(source.to_string(), "groq: boom");
    }

    #[test]
    fn orchestrator_error_wraps_store_error() {
        let err: OrchestratorError = StoreError::SessionNotFound { id: 9 }.into();
        assert!(matches!(
            err,
            OrchestratorError::Store(StoreError::SessionNotFound { id: 9 })
        ));
        assert_eq!(err.to_string(), "Review session 9 not found");
    }

    #[test]
    fn fraction_error_display() {
        let err = FractionError::ZeroDenominator("1/0".to_string());
        assert_eq!(err.to_string(), "Zero denominator in fraction '1/0'");
    }
}
