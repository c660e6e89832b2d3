//! Technical accuracy agent: safety, tooling, measurements and step order.

use super::{LlmPass, mentions_any};
use crate::llm::LlmGateway;
use crate::review::agent::ReviewAgent;
use crate::review::findings::{Finding, ReviewContext, Severity};
use crate::review::parser::FindingsParser;
use crate::review::prompts::PromptKind;
use async_trait::async_trait;
use regex::Regex;
use std::sync::{Arc, LazyLock};

const ELECTRICAL_TERMS: &[&str] = &[
    "wire",
    "wiring",
    "electrical",
    "power",
    "voltage",
    "connect power",
];
const SAFETY_TERMS: &[&str] = &[
    "danger",
    "warning",
    "caution",
    "safety",
    "turn off power",
    "disconnect power",
];
const ACTION_TERMS: &[&str] = &["drill", "screw", "cut", "strip", "connect", "mount", "install"];
const TOOL_TERMS: &[&str] = &[
    "screwdriver",
    "drill bit",
    "wire stripper",
    "multimeter",
    "level",
];
const POWER_ON_TERMS: &[&str] = &["connect power", "plug in"];

/// Unit prefixes that make a number count as a measurement with units.
const UNIT_PREFIXES: &[&str] = &["mm", "cm", "inch", "meter", "gauge", "awg"];
/// Units that only count as whole words.
const UNIT_WORDS: &[&str] = &["in", "ft"];

/// More bare numbers than this triggers a measurements finding.
const BARE_NUMBER_LIMIT: usize = 3;
/// Power-on steps inside this many leading sentences are flagged.
const EARLY_SENTENCE_COUNT: usize = 3;

static NUMBER_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b\d+(?:\.\d+)?").unwrap());

pub struct TechnicalAgent {
    gateway: Option<Arc<LlmGateway>>,
    llm: LlmPass,
}

impl TechnicalAgent {
    pub const NAME: &'static str = "technical";

    pub fn new(gateway: Option<Arc<LlmGateway>>) -> Self {
        Self {
            gateway,
            llm: LlmPass {
                kind: PromptKind::Technical,
                temperature: 0.3,
                parser: FindingsParser::new("technical", 0.8),
            },
        }
    }
}

#[async_trait]
impl ReviewAgent for TechnicalAgent {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn description(&self) -> &str {
        "Identify technical errors, safety issues, and completeness problems in installation instructions"
    }

    fn confidence_threshold(&self) -> f64 {
        0.6
    }

    async fn review(&self, context: &ReviewContext) -> anyhow::Result<Vec<Finding>> {
        let mut findings = self.llm.run(self.gateway.as_deref(), context).await;
        let ai_count = findings.len();

        let rule_findings = rule_findings(&context.document_text);
        let rule_count = rule_findings.len();
        findings.extend(rule_findings);

        tracing::info!(
            agent = Self::NAME,
            session_id = ?context.session_id,
            ai_findings = ai_count,
            rule_findings = rule_count,
            "Technical review completed"
        );
        Ok(findings)
    }
}

/// Run every rule check over `text`.
pub fn rule_findings(text: &str) -> Vec<Finding> {
    let text = text.to_lowercase();
    [
        check_safety_warnings(&text),
        check_tool_requirements(&text),
        check_bare_measurements(&text),
        check_power_sequence(&text),
    ]
    .into_iter()
    .flatten()
    .collect()
}

fn check_safety_warnings(text: &str) -> Option<Finding> {
    if !mentions_any(text, ELECTRICAL_TERMS) || mentions_any(text, SAFETY_TERMS) {
        return None;
    }
    Some(
        Finding::new(
            Severity::Warning,
            "safety",
            "Document contains electrical procedures but lacks adequate safety warnings",
            "Throughout document",
        )
        .with_suggestion("Add safety warnings about turning off power before electrical work")
        .with_confidence(0.9),
    )
}

fn check_tool_requirements(text: &str) -> Option<Finding> {
    if !mentions_any(text, ACTION_TERMS) || mentions_any(text, TOOL_TERMS) {
        return None;
    }
    Some(
        Finding::new(
            Severity::Warning,
            "tools",
            "Installation procedures mentioned without specifying required tools",
            "Installation steps",
        )
        .with_suggestion("Add a tools and materials list at the beginning of the document")
        .with_confidence(0.7),
    )
}

fn has_unit(rest: &str) -> bool {
    let rest = rest.trim_start();
    if UNIT_PREFIXES.iter().any(|unit| rest.starts_with(unit)) {
        return true;
    }
    let word: String = rest.chars().take_while(|c| c.is_alphanumeric()).collect();
    UNIT_WORDS.contains(&word.as_str())
}

/// Count numbers not followed by a length or wire-gauge unit.
pub fn count_bare_numbers(text: &str) -> usize {
    NUMBER_REGEX
        .find_iter(text)
        .filter(|m| !has_unit(&text[m.end()..]))
        .count()
}

fn check_bare_measurements(text: &str) -> Option<Finding> {
    if count_bare_numbers(text) <= BARE_NUMBER_LIMIT {
        return None;
    }
    Some(
        Finding::new(
            Severity::Warning,
            "measurements",
            "Multiple measurements found without units specified",
            "Throughout document",
        )
        .with_suggestion("Ensure all measurements include appropriate units (mm, inches, etc.)")
        .with_confidence(0.6),
    )
}

fn check_power_sequence(text: &str) -> Option<Finding> {
    let early = text
        .split('.')
        .take(EARLY_SENTENCE_COUNT)
        .any(|sentence| mentions_any(sentence, POWER_ON_TERMS));
    if !early {
        return None;
    }
    Some(
        Finding::new(
            Severity::Error,
            "sequence",
            "Power connection appears early in instructions - potential safety hazard",
            "Installation sequence",
        )
        .with_suggestion(
            "Move power connection to the final step after all other connections are complete",
        )
        .with_confidence(0.8),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::review::agents::test_support::gateway_replying;

    fn categories(findings: &[Finding]) -> Vec<&str> {
        findings.iter().map(Finding::category).collect()
    }

    // =========================================
    // Rule checks
    // =========================================

    #[test]
    fn test_electrical_without_safety() {
        let findings = rule_findings("Route the wiring through the frame.");
        assert!(categories(&findings).contains(&"safety"));
    }

    #[test]
    fn test_electrical_with_caution_is_fine() {
        let findings = rule_findings("CAUTION: Route the wiring through the frame.");
        assert!(!categories(&findings).contains(&"safety"));
    }

    #[test]
    fn test_actions_without_tools() {
        let findings = rule_findings("Mount the bracket to the header.");
        let tools: Vec<_> = findings.iter().filter(|f| f.category() == "tools").collect();
        assert_eq!(tools.len(), 1);
        assert_eq!(tools[0].confidence(), 0.7);
    }

    #[test]
    fn test_actions_with_tool_list() {
        let findings = rule_findings("Tools: Phillips screwdriver. Mount the bracket.");
        assert!(!categories(&findings).contains(&"tools"));
    }

    #[test]
    fn test_count_bare_numbers() {
        assert_eq!(count_bare_numbers("12mm 3 in 4 inch 5 ft 18 awg"), 0);
        assert_eq!(count_bare_numbers("use 4 screws and 2 anchors"), 2);
        // "in" only counts as a whole word
        assert_eq!(count_bare_numbers("step 2 install"), 1);
    }

    #[test]
    fn test_many_bare_numbers_flagged() {
        let findings = rule_findings("space holes 4 apart, 6 deep, 8 from edge, 10 total");
        assert!(categories(&findings).contains(&"measurements"));
        let few = rule_findings("drill 2 holes 3 apart");
        assert!(!categories(&few).contains(&"measurements"));
    }

    #[test]
    fn test_power_early_is_error() {
        let findings = rule_findings("Plug in the unit. Then mount it. Then wire the lock. Done.");
        let seq = findings.iter().find(|f| f.category() == "sequence").unwrap();
        assert_eq!(seq.severity(), Severity::Error);
    }

    #[test]
    fn test_power_late_is_fine() {
        let text = "Mount the unit. Attach the cover. Route the cable. Connect power last.";
        assert!(!categories(&rule_findings(text)).contains(&"sequence"));
    }

    #[test]
    fn test_rule_checks_case_insensitive() {
        let findings = rule_findings("CONNECT POWER. Mount.");
        assert!(categories(&findings).contains(&"sequence"));
    }

    // =========================================
    // Agent
    // =========================================

    #[tokio::test]
    async fn test_review_without_gateway_runs_rules_only() {
        let agent = TechnicalAgent::new(None);
        let ctx = ReviewContext::new("Mount the bracket.").with_session(1);
        let findings = agent.review(&ctx).await.unwrap();
        assert_eq!(categories(&findings), vec!["tools"]);
    }

    #[tokio::test]
    async fn test_review_merges_llm_findings_first() {
        let gateway = gateway_replying(Some(
            "FINDINGS:\n[ERROR] - Step 4: Torque value missing\nSuggestion: Specify 5 Nm",
        ));
        let agent = TechnicalAgent::new(Some(gateway));
        let ctx = ReviewContext::new("Mount the bracket.").with_session(1);
        let findings = agent.review(&ctx).await.unwrap();

        assert_eq!(categories(&findings), vec!["technical", "tools"]);
        assert_eq!(findings[0].confidence(), 0.8);
        assert_eq!(findings[0].suggestion(), Some("Specify 5 Nm"));
    }

    #[tokio::test]
    async fn test_gateway_failure_keeps_rule_findings() {
        let agent = TechnicalAgent::new(Some(gateway_replying(None)));
        let ctx = ReviewContext::new("Mount the bracket.").with_session(1);
        let findings = agent.execute_review(&ctx).await;
        assert_eq!(categories(&findings), vec!["tools"]);
        assert_eq!(findings[0].agent_name(), "technical");
    }

    #[tokio::test]
    async fn test_threshold_drops_low_confidence_rules() {
        let agent = TechnicalAgent::new(None);
        // measurements finding (0.6) sits exactly on the threshold and survives
        let ctx = ReviewContext::new("a 1, b 2, c 3, d 4, e 5 with a level").with_session(1);
        let findings = agent.execute_review(&ctx).await;
        assert!(categories(&findings).contains(&"measurements"));
    }
}
