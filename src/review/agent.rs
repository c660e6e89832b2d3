//! The review agent contract and its confidence-filtering wrapper.

use crate::review::findings::{Finding, ReviewContext};
use async_trait::async_trait;
use std::time::Instant;

/// One pluggable analyzer.
///
/// Implementors provide [`review`](ReviewAgent::review); callers use
/// [`execute_review`](ReviewAgent::execute_review), which never fails.
#[async_trait]
pub trait ReviewAgent: Send + Sync {
    /// Registry name, also stamped onto every finding this agent emits.
    fn name(&self) -> &str;

    fn description(&self) -> &str;

    /// Minimum confidence a finding needs to survive filtering.
    fn confidence_threshold(&self) -> f64;

    /// Analyze the document. May fail for any reason.
    async fn review(&self, context: &ReviewContext) -> anyhow::Result<Vec<Finding>>;

    /// Run [`review`](ReviewAgent::review), swallowing errors and dropping
    /// findings below the confidence threshold.
    ///
    /// A failed review yields an empty list. Surviving findings are
    /// attributed to this agent and the context's session.
    async fn execute_review(&self, context: &ReviewContext) -> Vec<Finding> {
        let start = Instant::now();
        let threshold = self.confidence_threshold();

        let raw = match self.review(context).await {
            Ok(findings) => findings,
            Err(e) => {
                tracing::error!(
                    agent = self.name(),
                    elapsed_ms = start.elapsed().as_millis() as u64,
                    error = %e,
                    "Agent review failed"
                );
                return Vec::new();
            }
        };

        let raw_count = raw.len();
        let session_id = context.session_id.unwrap_or_default();
        let findings: Vec<Finding> = raw
            .into_iter()
            .filter(|f| f.confidence() >= threshold)
            .map(|mut f| {
                f.attribute(self.name(), session_id);
                f
            })
            .collect();

        tracing::info!(
            agent = self.name(),
            elapsed_ms = start.elapsed().as_millis() as u64,
            raw = raw_count,
            kept = findings.len(),
            threshold,
            "Agent review completed"
        );

        findings
    }
}
