//! Concrete review agents.
//!
//! Each agent combines deterministic rule checks with an optional LLM pass.
//! Without a gateway only the rules run.

pub mod diagram;
pub mod formatting;
pub mod technical;

pub use diagram::DiagramAgent;
pub use formatting::FormattingAgent;
pub use technical::TechnicalAgent;

use crate::llm::LlmGateway;
use crate::review::agent::ReviewAgent;
use crate::review::findings::{Finding, ReviewContext};
use crate::review::parser::FindingsParser;
use crate::review::prompts::{PromptKind, build_agent_prompt};
use std::sync::Arc;

/// All built-in agents, in their default run order.
pub fn default_agents(gateway: Option<Arc<LlmGateway>>) -> Vec<Arc<dyn ReviewAgent>> {
    vec![
        Arc::new(TechnicalAgent::new(gateway.clone())),
        Arc::new(FormattingAgent::new(gateway.clone())),
        Arc::new(DiagramAgent::new(gateway)),
    ]
}

/// LLM settings for one agent's model pass.
#[derive(Debug, Clone)]
pub(crate) struct LlmPass {
    pub kind: PromptKind,
    pub temperature: f32,
    pub parser: FindingsParser,
}

impl LlmPass {
    /// Prompt the gateway and parse the answer.
    ///
    /// Gateway failures are logged and yield no findings so the caller's
    /// rule findings still go through.
    pub async fn run(&self, gateway: Option<&LlmGateway>, context: &ReviewContext) -> Vec<Finding> {
        let Some(gateway) = gateway else {
            tracing::debug!(agent = %self.kind, "No LLM gateway configured, skipping model pass");
            return Vec::new();
        };

        let prompt = build_agent_prompt(self.kind, &context.document_text);
        match gateway
            .generate_response(&prompt, gateway.max_tokens(), self.temperature, None)
            .await
        {
            Ok(response) => {
                let findings = self.parser.parse(&response);
                tracing::info!(
                    agent = %self.kind,
                    session_id = ?context.session_id,
                    findings = findings.len(),
                    "LLM review completed"
                );
                findings
            }
            Err(e) => {
                tracing::error!(
                    agent = %self.kind,
                    session_id = ?context.session_id,
                    error = %e,
                    "LLM review failed, continuing with rule checks"
                );
                Vec::new()
            }
        }
    }
}

/// Whether any of `terms` occurs in `text` as a substring.
pub(crate) fn mentions_any(text: &str, terms: &[&str]) -> bool {
    terms.iter().any(|term| text.contains(term))
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_agents_order_and_names() {
        let agents = default_agents(None);
        let names: Vec<&str> = agents.iter().map(|a| a.name()).collect();
        assert_eq!(names, vec!["technical", "formatting", "diagram"]);
    }

    #[test]
    fn test_mentions_any() {
        assert!(mentions_any("turn off power first", &["danger", "turn off power"]));
        assert!(!mentions_any("mount the bracket", &["wire", "voltage"]));
    }
}
