//! Multi-agent document review.
//!
//! Independent agents each inspect the same [`ReviewContext`] and emit
//! [`Finding`]s. The [`ReviewOrchestrator`] runs the requested agents,
//! persists what they report, and consolidates everything into a
//! [`ReviewResult`] with a status and a human-readable summary.
//!
//! ## Components
//!
//! - [`findings`]: the data model shared by every agent
//! - [`agent`]: the [`ReviewAgent`] contract and confidence filtering
//! - [`parser`]: turns LLM free text into findings
//! - [`prompts`]: prompt templates per agent kind
//! - [`agents`]: the technical, formatting, and diagram agents
//! - [`orchestrator`]: sequencing, persistence, and summaries
//!
//! ## Example
//!
//! ```
//! use redline::review::agents::technical::rule_findings;
//! use redline::review::findings::Severity;
//!
//! let findings = rule_findings("Plug in the unit. Then mount the bracket.");
//! assert!(findings.iter().any(|f| f.category() == "sequence"));
//! assert!(findings.iter().any(|f| f.severity() == Severity::Error));
//! ```

pub mod agent;
pub mod agents;
pub mod findings;
pub mod orchestrator;
pub mod parser;
pub mod prompts;

pub use agent::ReviewAgent;
pub use findings::{
    AgentResult, DocumentInfo, Finding, ReviewContext, ReviewResult, ReviewStatus, Severity,
};
pub use orchestrator::ReviewOrchestrator;
pub use parser::FindingsParser;
