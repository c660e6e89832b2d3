//! Review orchestration: runs agents in order, persists their findings and
//! assembles the [`ReviewResult`].
//!
//! ## Status accounting
//!
//! An agent counts as succeeded when its orchestration step finished
//! without error, even if its own `review()` failed and was swallowed by
//! [`ReviewAgent::execute_review`]. Only errors raised here (persisting a
//! finding, for example) count as failures. Unknown agent names are skipped
//! and count toward neither side. Repeated names run once.
//!
//! ## Partial persistence
//!
//! Findings are written one at a time. When a write fails partway through
//! an agent's list, the rows already written stay in the store while the
//! returned [`ReviewResult`] records an empty list for that agent, so
//! [`ReviewOrchestrator::get_review_by_session`] can show findings the
//! original result did not.

use crate::errors::OrchestratorError;
use crate::llm::LlmGateway;
use crate::review::agent::ReviewAgent;
use crate::review::agents::default_agents;
use crate::review::findings::{
    AgentResult, DocumentInfo, Finding, ReviewContext, ReviewResult, ReviewStatus, SeverityCounts,
};
use crate::store::FindingsStore;
use serde::Serialize;
use std::collections::HashSet;
use std::sync::Arc;
use std::time::{Duration, Instant};

const NO_ISSUES_SUMMARY: &str =
    "No issues found in the document. The content appears to be technically sound.";
const FAILED_SUMMARY: &str = "Review failed - unable to complete analysis.";
const PARTIAL_NOTE: &str = " Note: Some agents failed to complete their review.";

const SELF_TEST_DOCUMENT: &str = "This is a test document for agent validation.";

/// Registered agent as listed to users.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AgentInfo {
    pub name: String,
    pub description: String,
    pub confidence_threshold: f64,
}

/// Outcome of running one agent against the self-test document.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AgentTestReport {
    pub name: String,
    pub passed: bool,
    pub findings: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

pub struct ReviewOrchestrator {
    agents: Vec<Arc<dyn ReviewAgent>>,
    store: Arc<dyn FindingsStore>,
    agent_timeout: Option<Duration>,
}

impl ReviewOrchestrator {
    /// Orchestrator with no agents registered.
    pub fn new(store: Arc<dyn FindingsStore>) -> Self {
        Self {
            agents: Vec::new(),
            store,
            agent_timeout: None,
        }
    }

    /// Orchestrator with the built-in technical, formatting and diagram agents.
    pub fn with_default_agents(
        store: Arc<dyn FindingsStore>,
        gateway: Option<Arc<LlmGateway>>,
    ) -> Self {
        let mut orchestrator = Self::new(store);
        for agent in default_agents(gateway) {
            orchestrator.register(agent);
        }
        orchestrator
    }

    /// Add an agent, replacing any agent already registered under its name.
    pub fn register(&mut self, agent: Arc<dyn ReviewAgent>) {
        self.agents.retain(|a| a.name() != agent.name());
        self.agents.push(agent);
    }

    pub fn with_agent(mut self, agent: Arc<dyn ReviewAgent>) -> Self {
        self.register(agent);
        self
    }

    /// Bound each agent's run. A timed-out agent contributes no findings.
    pub fn with_agent_timeout(mut self, timeout: Duration) -> Self {
        self.agent_timeout = Some(timeout);
        self
    }

    pub fn agent(&self, name: &str) -> Option<&Arc<dyn ReviewAgent>> {
        self.agents.iter().find(|a| a.name() == name)
    }

    /// Registered agents in registration order.
    pub fn available_agents(&self) -> Vec<AgentInfo> {
        self.agents
            .iter()
            .map(|a| AgentInfo {
                name: a.name().to_string(),
                description: a.description().to_string(),
                confidence_threshold: a.confidence_threshold(),
            })
            .collect()
    }

    /// Run the named agents (all registered agents when `None`) in order.
    ///
    /// Fails only when `context` carries no session id; every other
    /// failure is folded into the result's status.
    pub async fn start_review(
        &self,
        context: &ReviewContext,
        agent_names: Option<&[String]>,
    ) -> Result<ReviewResult, OrchestratorError> {
        let session_id = context
            .session_id
            .ok_or(OrchestratorError::MissingSessionId)?;
        let start = Instant::now();

        let mut requested: Vec<String> = match agent_names {
            Some(names) => names.to_vec(),
            None => self.agents.iter().map(|a| a.name().to_string()).collect(),
        };
        let mut seen = HashSet::new();
        requested.retain(|name| seen.insert(name.clone()));

        tracing::info!(
            session_id,
            agents = ?requested,
            filename = %context.document_info.filename,
            "Starting review"
        );

        let mut agent_results = Vec::with_capacity(requested.len());
        let mut attempted = 0usize;
        let mut succeeded = 0usize;

        for name in &requested {
            let Some(agent) = self.agent(name) else {
                tracing::warn!(session_id, agent = %name, "Unknown agent requested, skipping");
                continue;
            };
            attempted += 1;

            let findings = match self.run_agent(agent.as_ref(), context, session_id).await {
                Ok(findings) => {
                    succeeded += 1;
                    findings
                }
                Err(e) => {
                    tracing::error!(session_id, agent = %name, error = %e, "Agent step failed");
                    Vec::new()
                }
            };
            agent_results.push(AgentResult {
                agent_name: name.clone(),
                findings,
            });
        }

        let findings: Vec<Finding> = agent_results
            .iter()
            .flat_map(|r| r.findings.iter().cloned())
            .collect();
        let status = ReviewStatus::from_counts(succeeded, attempted);
        let summary = build_summary(&findings, &agent_results, status);
        let elapsed = start.elapsed().as_secs_f64();

        tracing::info!(
            session_id,
            status = %status,
            findings = findings.len(),
            succeeded,
            attempted,
            elapsed_secs = elapsed,
            "Review finished"
        );

        Ok(ReviewResult {
            session_id,
            findings,
            agent_results,
            total_processing_time: elapsed,
            status,
            summary: Some(summary),
        })
    }

    async fn run_agent(
        &self,
        agent: &dyn ReviewAgent,
        context: &ReviewContext,
        session_id: i64,
    ) -> Result<Vec<Finding>, OrchestratorError> {
        let mut findings = match self.agent_timeout {
            Some(limit) => match tokio::time::timeout(limit, agent.execute_review(context)).await
            {
                Ok(findings) => findings,
                Err(_) => {
                    tracing::warn!(
                        session_id,
                        agent = agent.name(),
                        timeout_secs = limit.as_secs_f64(),
                        "Agent timed out"
                    );
                    Vec::new()
                }
            },
            None => agent.execute_review(context).await,
        };

        for finding in &mut findings {
            let id = self.store.add_finding(finding)?;
            finding.assign_id(id);
        }
        Ok(findings)
    }

    /// Rebuild a result from stored findings, grouped by agent in first-seen order.
    ///
    /// Returns `None` when the session has no findings.
    pub fn get_review_by_session(
        &self,
        session_id: i64,
    ) -> Result<Option<ReviewResult>, OrchestratorError> {
        let findings = self.store.get_session_findings(session_id)?;
        if findings.is_empty() {
            return Ok(None);
        }

        let mut agent_results: Vec<AgentResult> = Vec::new();
        for finding in &findings {
            match agent_results
                .iter_mut()
                .find(|r| r.agent_name == finding.agent_name())
            {
                Some(result) => result.findings.push(finding.clone()),
                None => agent_results.push(AgentResult {
                    agent_name: finding.agent_name().to_string(),
                    findings: vec![finding.clone()],
                }),
            }
        }

        let status = ReviewStatus::Completed;
        let summary = build_summary(&findings, &agent_results, status);
        Ok(Some(ReviewResult {
            session_id,
            findings,
            agent_results,
            total_processing_time: 0.0,
            status,
            summary: Some(summary),
        }))
    }

    /// Run each agent's `review()` on a small sample document. Nothing is persisted.
    pub async fn test_agents(&self) -> Vec<AgentTestReport> {
        let context = ReviewContext::new(SELF_TEST_DOCUMENT).with_document_info(DocumentInfo {
            page_count: Some(1),
            ..DocumentInfo::new("test.txt")
        });

        let mut reports = Vec::with_capacity(self.agents.len());
        for agent in &self.agents {
            let report = match agent.review(&context).await {
                Ok(findings) => {
                    tracing::info!(agent = agent.name(), findings = findings.len(), "Agent self-test passed");
                    AgentTestReport {
                        name: agent.name().to_string(),
                        passed: true,
                        findings: findings.len(),
                        error: None,
                    }
                }
                Err(e) => {
                    tracing::error!(agent = agent.name(), error = %e, "Agent self-test failed");
                    AgentTestReport {
                        name: agent.name().to_string(),
                        passed: false,
                        findings: 0,
                        error: Some(e.to_string()),
                    }
                }
            };
            reports.push(report);
        }
        reports
    }
}

/// Human-readable summary of a review.
///
/// A failed review gets a fixed message regardless of findings.
pub fn build_summary(
    findings: &[Finding],
    agent_results: &[AgentResult],
    status: ReviewStatus,
) -> String {
    if status == ReviewStatus::Failed {
        return FAILED_SUMMARY.to_string();
    }
    if findings.is_empty() {
        return NO_ISSUES_SUMMARY.to_string();
    }

    let counts = SeverityCounts::tally(findings);
    let mut parts = Vec::new();
    if counts.errors > 0 {
        parts.push(format!("{} critical issue(s) that must be fixed", counts.errors));
    }
    if counts.warnings > 0 {
        parts.push(format!("{} warning(s) that should be addressed", counts.warnings));
    }
    if counts.infos > 0 {
        parts.push(format!("{} suggestion(s) for improvement", counts.infos));
    }
    let mut summary = format!("Review found: {}.", parts.join(", "));

    let breakdown: Vec<String> = agent_results
        .iter()
        .filter(|r| !r.findings.is_empty())
        .map(|r| format!("{}: {} findings", r.agent_name, r.findings.len()))
        .collect();
    if !breakdown.is_empty() {
        summary.push_str(&format!(" Agent breakdown: {}.", breakdown.join(", ")));
    }

    if status == ReviewStatus::Partial {
        summary.push_str(PARTIAL_NOTE);
    }
    summary
}
