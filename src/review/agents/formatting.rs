//! Formatting and standards agent backed by the rule validators.

use super::LlmPass;
use crate::llm::LlmGateway;
use crate::review::agent::ReviewAgent;
use crate::review::findings::{Finding, ReviewContext};
use crate::review::parser::FindingsParser;
use crate::review::prompts::PromptKind;
use crate::validators;
use async_trait::async_trait;
use std::sync::Arc;

pub struct FormattingAgent {
    gateway: Option<Arc<LlmGateway>>,
    llm: LlmPass,
}

impl FormattingAgent {
    pub const NAME: &'static str = "formatting";

    pub fn new(gateway: Option<Arc<LlmGateway>>) -> Self {
        Self {
            gateway,
            llm: LlmPass {
                kind: PromptKind::Formatting,
                temperature: 0.1,
                parser: FindingsParser::new("formatting", 0.8),
            },
        }
    }
}

#[async_trait]
impl ReviewAgent for FormattingAgent {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn description(&self) -> &str {
        "Ensure measurement notation, unit conversions, and symbols follow company standards"
    }

    fn confidence_threshold(&self) -> f64 {
        0.8
    }

    async fn review(&self, context: &ReviewContext) -> anyhow::Result<Vec<Finding>> {
        let mut findings = self.llm.run(self.gateway.as_deref(), context).await;
        let ai_count = findings.len();

        let rule_findings = validators::run_all(&context.document_text);
        let rule_count = rule_findings.len();
        findings.extend(rule_findings);

        tracing::info!(
            agent = Self::NAME,
            session_id = ?context.session_id,
            ai_findings = ai_count,
            rule_findings = rule_count,
            "Formatting review completed"
        );
        Ok(findings)
    }
}
