//! Diagram agent: wiring diagram references and safety-critical wiring notes.

use super::{LlmPass, mentions_any};
use crate::llm::LlmGateway;
use crate::review::agent::ReviewAgent;
use crate::review::findings::{Finding, ReviewContext, Severity};
use crate::review::parser::FindingsParser;
use crate::review::prompts::PromptKind;
use async_trait::async_trait;
use regex::Regex;
use std::collections::BTreeSet;
use std::sync::{Arc, LazyLock};

/// Spellings of fail-safe seen in installation documents.
const FAIL_SAFE_TERMS: &[&str] = &["fail safe", "fail-safe", "failsafe"];

static REFERENCE_PATTERNS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    [
        r"[Ff]igure\s+\d+",
        r"[Dd]iagram\s+\d+",
        r"[Dd]rawing\s+#?\s*\w+",
        r"[Ww]iring\s+[Dd]iagram",
        r"[Ss]ee\s+[Dd]iagram",
    ]
    .into_iter()
    .map(|p| Regex::new(p).unwrap())
    .collect()
});

pub struct DiagramAgent {
    gateway: Option<Arc<LlmGateway>>,
    llm: LlmPass,
}

impl DiagramAgent {
    pub const NAME: &'static str = "diagram";

    pub fn new(gateway: Option<Arc<LlmGateway>>) -> Self {
        Self {
            gateway,
            llm: LlmPass {
                kind: PromptKind::Diagram,
                temperature: 0.2,
                parser: FindingsParser::new("diagram", 0.85),
            },
        }
    }
}

#[async_trait]
impl ReviewAgent for DiagramAgent {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn description(&self) -> &str {
        "Identify wiring errors, unclear visuals, and safety issues in diagrams"
    }

    fn confidence_threshold(&self) -> f64 {
        0.7
    }

    async fn review(&self, context: &ReviewContext) -> anyhow::Result<Vec<Finding>> {
        let references = extract_references(&context.document_text);
        tracing::debug!(
            agent = Self::NAME,
            references = ?references,
            "Diagram references extracted"
        );

        let mut findings = self.llm.run(self.gateway.as_deref(), context).await;
        findings.extend(text_findings(&context.document_text));

        tracing::info!(
            agent = Self::NAME,
            session_id = ?context.session_id,
            references = references.len(),
            findings = findings.len(),
            "Diagram review completed"
        );
        Ok(findings)
    }
}

/// Distinct diagram references (`Figure 3`, `Drawing #A2`, ...), sorted.
pub fn extract_references(text: &str) -> BTreeSet<String> {
    REFERENCE_PATTERNS
        .iter()
        .flat_map(|re| re.find_iter(text).map(|m| m.as_str().to_string()))
        .collect()
}

/// Text-only wiring checks.
pub fn text_findings(text: &str) -> Vec<Finding> {
    let lower = text.to_lowercase();
    let mut findings = Vec::new();

    if mentions_any(&lower, &["wire", "connect"]) && !mentions_any(&lower, &["diagram", "figure"])
    {
        findings.push(
            Finding::new(
                Severity::Warning,
                "diagram",
                "Wiring instructions provided without diagram reference",
                "Document text",
            )
            .with_suggestion("Add reference to wiring diagram for visual guidance")
            .with_confidence(0.7),
        );
    }

    if lower.contains("fire alarm")
        && !mentions_any(&lower, FAIL_SAFE_TERMS)
        && !lower.contains("normally closed")
    {
        findings.push(
            Finding::new(
                Severity::Error,
                "safety",
                "Fire alarm integration mentioned without fail-safe configuration details",
                "Fire alarm section",
            )
            .with_suggestion("Specify fail-safe wiring configuration for fire alarm integration")
            .with_confidence(0.8),
        );
    }

    if mentions_any(&lower, &["12vdc", "24vdc"]) && !mentions_any(&lower, &["polarity", "positive"])
    {
        findings.push(
            Finding::new(
                Severity::Warning,
                "wiring",
                "DC voltage specified without polarity warnings",
                "Power specifications",
            )
            .with_suggestion("Add warning about correct polarity connection")
            .with_confidence(0.7),
        );
    }

    if mentions_any(&lower, &["maglock", "magnetic lock"])
        && !lower.contains("fire alarm")
        && !mentions_any(&lower, FAIL_SAFE_TERMS)
    {
        findings.push(
            Finding::new(
                Severity::Info,
                "specification",
                "Magnetic lock mentioned without fail-safe or fire alarm integration details",
                "Lock specifications",
            )
            .with_suggestion(
                "Clarify that magnetic locks are fail-safe and should integrate with fire alarm systems",
            )
            .with_confidence(0.6),
        );
    }

    findings
}

#[cfg(test)]
mod tests {
    use super::*;

    fn categories(findings: &[Finding]) -> Vec<&str> {
        findings.iter().map(Finding::category).collect()
    }

    #[test]
    fn test_extract_references_dedups() {
        let refs = extract_references(
            "See Figure 2. Refer to Figure 2 and Drawing #A12. Follow the wiring diagram.",
        );
        let refs: Vec<&str> = refs.iter().map(String::as_str).collect();
        assert_eq!(refs, vec!["Drawing #A12", "Figure 2", "wiring diagram"]);
    }

    #[test]
    fn test_wiring_without_reference() {
        let findings = text_findings("Connect the red lead to terminal 1.");
        assert_eq!(categories(&findings), vec!["diagram"]);
        assert_eq!(findings[0].location(), "Document text");
    }

    #[test]
    fn test_wiring_with_figure_reference() {
        assert!(text_findings("Connect the red lead as shown in Figure 1.").is_empty());
    }

    #[test]
    fn test_fire_alarm_without_fail_safe() {
        let findings = text_findings("Tie into the fire alarm panel per Figure 4.");
        assert_eq!(categories(&findings), vec!["safety"]);
        assert_eq!(findings[0].severity(), Severity::Error);
    }

    #[test]
    fn test_fire_alarm_with_normally_closed() {
        let text = "Tie into the fire alarm normally closed contact per Figure 4.";
        assert!(text_findings(text).is_empty());
    }

    #[test]
    fn test_fail_safe_spellings_accepted() {
        for text in [
            "Tie into the fire alarm; lock is fail-safe per Figure 4.",
            "Tie into the fire alarm; lock is failsafe per Figure 4.",
            "Tie into the fire alarm; lock is fail safe per Figure 4.",
        ] {
            assert!(text_findings(text).is_empty(), "{}", text);
        }
        assert!(text_findings("Mount the Fail-Safe maglock on the header.").is_empty());
    }

    #[test]
    fn test_dc_voltage_without_polarity() {
        let findings = text_findings("Supply 12VDC to the lock (Figure 1).");
        assert_eq!(categories(&findings), vec!["wiring"]);
    }

    #[test]
    fn test_maglock_without_fire_alarm() {
        let findings = text_findings("Mount the maglock on the header.");
        assert_eq!(categories(&findings), vec!["specification"]);
        assert_eq!(findings[0].severity(), Severity::Info);
    }

    #[tokio::test]
    async fn test_execute_review_filters_info_specification() {
        // specification finding is 0.6, below the 0.7 threshold
        let agent = DiagramAgent::new(None);
        let ctx = ReviewContext::new("Mount the maglock on the header.").with_session(2);
        assert!(agent.execute_review(&ctx).await.is_empty());
    }
}
