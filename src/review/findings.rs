//! Core review data model.
//!
//! This module defines the records that flow between agents, the parser,
//! the orchestrator and the findings store.
//!
//! ## Types
//!
//! - [`Severity`]: Severity classification for individual findings
//! - [`Finding`]: A single identified issue with location and suggestion
//! - [`ReviewContext`]: The read-only input bundle handed to every agent
//! - [`ReviewStatus`]: Outcome of an orchestrated review
//! - [`ReviewResult`]: Consolidated output of one review session
//!
//! ## Example
//!
//! ```
//! use redline::review::findings::{Finding, Severity};
//!
//! let finding = Finding::new(
//!     Severity::Error,
//!     "conversion",
//!     "Incorrect temperature conversion",
//!     "Page 3",
//! )
//! .with_suggestion("Use 37.8°C")
//! .with_confidence(0.95);
//!
//! assert!(finding.severity().is_critical());
//! assert_eq!(finding.suggestion(), Some("Use 37.8°C"));
//! ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

/// Severity level for individual findings.
///
/// Severities are ordered from most to least critical.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, PartialOrd, Ord,
)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    /// Blocks or hinders completing the installation.
    Error,
    /// Could cause problems for the technician.
    #[default]
    Warning,
    /// Improvement suggestion.
    Info,
}

impl Severity {
    /// Normalize a free-form severity token.
    ///
    /// Matching is case-insensitive. Anything outside the
    /// `error`/`warning`/`info` vocabulary becomes [`Severity::Warning`].
    ///
    /// # Examples
    ///
    /// ```
    /// use redline::review::findings::Severity;
    ///
    /// assert_eq!(Severity::normalize("ERROR"), Severity::Error);
    /// assert_eq!(Severity::normalize(" Info "), Severity::Info);
    /// assert_eq!(Severity::normalize("critical"), Severity::Warning);
    /// ```
    pub fn normalize(token: &str) -> Self {
        match token.trim().to_lowercase().as_str() {
            "error" => Self::Error,
            "info" => Self::Info,
            _ => Self::Warning,
        }
    }

    /// Check if this severity is considered critical (error).
    pub fn is_critical(&self) -> bool {
        matches!(self, Self::Error)
    }

    /// Get the emoji indicator for this severity.
    pub fn emoji(&self) -> &'static str {
        match self {
            Self::Error => "🔴",
            Self::Warning => "🟡",
            Self::Info => "🔵",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Error => "error",
            Self::Warning => "warning",
            Self::Info => "info",
        };
        write!(f, "{}", s)
    }
}

/// A single finding produced by a review agent.
///
/// `id` and `created_at` stay empty until the findings store records the
/// finding. Confidence is always kept inside `[0, 1]`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Finding {
    #[serde(skip_serializing_if = "Option::is_none")]
    id: Option<i64>,
    session_id: i64,
    agent_name: String,
    severity: Severity,
    category: String,
    description: String,
    location: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    suggestion: Option<String>,
    confidence: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    created_at: Option<DateTime<Utc>>,
}

impl Finding {
    /// Create a new finding with full confidence and no attribution.
    ///
    /// Agent name and session id are stamped on by
    /// [`ReviewAgent::execute_review`](crate::review::agent::ReviewAgent::execute_review).
    pub fn new(
        severity: Severity,
        category: impl Into<String>,
        description: impl Into<String>,
        location: impl Into<String>,
    ) -> Self {
        Self {
            id: None,
            session_id: 0,
            agent_name: String::new(),
            severity,
            category: category.into(),
            description: description.into(),
            location: location.into(),
            suggestion: None,
            confidence: 1.0,
            created_at: None,
        }
    }

    /// Set the suggested fix.
    pub fn with_suggestion(mut self, suggestion: impl Into<String>) -> Self {
        self.suggestion = Some(suggestion.into());
        self
    }

    /// Set the confidence, clamped into `[0, 1]`.
    ///
    /// # Examples
    ///
    /// ```
    /// use redline::review::findings::{Finding, Severity};
    ///
    /// let finding = Finding::new(Severity::Info, "precision", "Too precise", "Doc")
    ///     .with_confidence(1.7);
    /// assert_eq!(finding.confidence(), 1.0);
    /// ```
    pub fn with_confidence(mut self, confidence: f64) -> Self {
        self.confidence = if confidence.is_nan() {
            0.0
        } else {
            confidence.clamp(0.0, 1.0)
        };
        self
    }

    /// Set the agent that produced this finding.
    pub fn with_agent(mut self, agent_name: impl Into<String>) -> Self {
        self.agent_name = agent_name.into();
        self
    }

    /// Set the owning review session.
    pub fn with_session(mut self, session_id: i64) -> Self {
        self.session_id = session_id;
        self
    }

    /// Set the storage identity.
    pub fn with_id(mut self, id: i64) -> Self {
        self.id = Some(id);
        self
    }

    /// Set the storage timestamp.
    pub fn with_created_at(mut self, created_at: DateTime<Utc>) -> Self {
        self.created_at = Some(created_at);
        self
    }

    pub(crate) fn attribute(&mut self, agent_name: &str, session_id: i64) {
        self.agent_name = agent_name.to_string();
        self.session_id = session_id;
    }

    pub(crate) fn assign_id(&mut self, id: i64) {
        self.id = Some(id);
    }

    pub fn id(&self) -> Option<i64> {
        self.id
    }

    pub fn session_id(&self) -> i64 {
        self.session_id
    }

    pub fn agent_name(&self) -> &str {
        &self.agent_name
    }

    pub fn severity(&self) -> Severity {
        self.severity
    }

    pub fn category(&self) -> &str {
        &self.category
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn location(&self) -> &str {
        &self.location
    }

    pub fn suggestion(&self) -> Option<&str> {
        self.suggestion.as_deref()
    }

    pub fn confidence(&self) -> f64 {
        self.confidence
    }

    pub fn created_at(&self) -> Option<DateTime<Utc>> {
        self.created_at
    }
}

impl fmt::Display for Finding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} [{}] {}: {}",
            self.severity.emoji(),
            self.severity,
            self.location,
            self.description
        )?;
        if let Some(ref suggestion) = self.suggestion {
            write!(f, "\n   → {}", suggestion)?;
        }
        Ok(())
    }
}

/// Metadata supplied by the document source alongside the extracted text.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DocumentInfo {
    #[serde(default)]
    pub filename: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub page_count: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub processing_method: Option<String>,
    #[serde(default)]
    pub has_images: bool,
    /// Any additional source-specific metadata.
    #[serde(flatten)]
    pub extra: HashMap<String, serde_json::Value>,
}

impl DocumentInfo {
    pub fn new(filename: impl Into<String>) -> Self {
        Self {
            filename: filename.into(),
            ..Self::default()
        }
    }
}

/// Input bundle for one review request.
///
/// Built once by the caller and shared by reference with every agent.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ReviewContext {
    pub document_text: String,
    pub document_info: DocumentInfo,
    pub session_id: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_preferences: Option<HashMap<String, serde_json::Value>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub previous_findings: Option<Vec<Finding>>,
}

impl ReviewContext {
    pub fn new(document_text: impl Into<String>) -> Self {
        Self {
            document_text: document_text.into(),
            ..Self::default()
        }
    }

    pub fn with_session(mut self, session_id: i64) -> Self {
        self.session_id = Some(session_id);
        self
    }

    pub fn with_document_info(mut self, info: DocumentInfo) -> Self {
        self.document_info = info;
        self
    }

    pub fn with_user_preferences(mut self, prefs: HashMap<String, serde_json::Value>) -> Self {
        self.user_preferences = Some(prefs);
        self
    }

    pub fn with_previous_findings(mut self, findings: Vec<Finding>) -> Self {
        self.previous_findings = Some(findings);
        self
    }
}

/// Outcome of an orchestrated review.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReviewStatus {
    /// Every requested agent completed.
    #[default]
    Completed,
    /// Some agents completed, some failed.
    Partial,
    /// No agent completed.
    Failed,
}

impl ReviewStatus {
    /// Derive the status from how many requested agents completed.
    ///
    /// # Examples
    ///
    /// ```
    /// use redline::review::findings::ReviewStatus;
    ///
    /// assert_eq!(ReviewStatus::from_counts(3, 3), ReviewStatus::Completed);
    /// assert_eq!(ReviewStatus::from_counts(2, 3), ReviewStatus::Partial);
    /// assert_eq!(ReviewStatus::from_counts(0, 3), ReviewStatus::Failed);
    /// ```
    pub fn from_counts(succeeded: usize, requested: usize) -> Self {
        if succeeded == 0 {
            Self::Failed
        } else if succeeded < requested {
            Self::Partial
        } else {
            Self::Completed
        }
    }

    /// Get the emoji indicator for this status.
    pub fn emoji(&self) -> &'static str {
        match self {
            Self::Completed => "✓",
            Self::Partial => "⚠",
            Self::Failed => "✗",
        }
    }
}

impl fmt::Display for ReviewStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Completed => "completed",
            Self::Partial => "partial",
            Self::Failed => "failed",
        };
        write!(f, "{}", s)
    }
}

impl std::str::FromStr for ReviewStatus {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "completed" => Ok(Self::Completed),
            "partial" => Ok(Self::Partial),
            "failed" => Ok(Self::Failed),
            _ => anyhow::bail!(
                "Invalid review status '{}'. Valid values: completed, partial, failed",
                s
            ),
        }
    }
}

/// Findings recorded for one agent, in the order the agent ran.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgentResult {
    pub agent_name: String,
    pub findings: Vec<Finding>,
}

/// Per-severity tallies over a list of findings.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SeverityCounts {
    pub errors: usize,
    pub warnings: usize,
    pub infos: usize,
}

impl SeverityCounts {
    pub fn tally<'a>(findings: impl IntoIterator<Item = &'a Finding>) -> Self {
        let mut counts = Self::default();
        for finding in findings {
            match finding.severity() {
                Severity::Error => counts.errors += 1,
                Severity::Warning => counts.warnings += 1,
                Severity::Info => counts.infos += 1,
            }
        }
        counts
    }

    pub fn total(&self) -> usize {
        self.errors + self.warnings + self.infos
    }
}

/// Consolidated output of one review session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReviewResult {
    pub session_id: i64,
    /// All findings, in agent order then per-agent order.
    pub findings: Vec<Finding>,
    pub agent_results: Vec<AgentResult>,
    /// Wall-clock duration of the whole review in seconds.
    pub total_processing_time: f64,
    pub status: ReviewStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
}

impl ReviewResult {
    /// Findings recorded for the named agent, if it ran.
    pub fn agent_findings(&self, agent_name: &str) -> Option<&[Finding]> {
        self.agent_results
            .iter()
            .find(|r| r.agent_name == agent_name)
            .map(|r| r.findings.as_slice())
    }

    pub fn severity_counts(&self) -> SeverityCounts {
        SeverityCounts::tally(&self.findings)
    }

    pub fn has_critical(&self) -> bool {
        self.findings.iter().any(|f| f.severity().is_critical())
    }
}

impl fmt::Display for ReviewResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "{} Review session {}: {} ({:.2}s)",
            self.status.emoji(),
            self.session_id,
            self.status,
            self.total_processing_time
        )?;
        if let Some(ref summary) = self.summary {
            writeln!(f, "{}", summary)?;
        }
        for result in &self.agent_results {
            writeln!(f)?;
            writeln!(f, "## {} ({})", result.agent_name, result.findings.len())?;
            for finding in &result.findings {
                writeln!(f, "{}", finding)?;
            }
        }
        Ok(())
    }
}
