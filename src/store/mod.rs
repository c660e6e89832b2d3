//! Findings persistence.
//!
//! The orchestrator only needs [`FindingsStore::add_finding`] and
//! [`FindingsStore::get_session_findings`]; the session calls serve the CLI.
//! [`SqliteStore`] is the durable implementation and [`InMemoryStore`]
//! backs tests and dry runs.

pub mod sqlite;

pub use sqlite::SqliteStore;

use crate::errors::StoreError;
use crate::review::findings::{Finding, ReviewStatus};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::sync::Mutex;

/// Lifecycle of a stored review session.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionStatus {
    #[default]
    Pending,
    Processing,
    Completed,
    Partial,
    Failed,
}

impl SessionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Processing => "processing",
            Self::Completed => "completed",
            Self::Partial => "partial",
            Self::Failed => "failed",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Partial | Self::Failed)
    }
}

impl fmt::Display for SessionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SessionStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(Self::Pending),
            "processing" => Ok(Self::Processing),
            "completed" => Ok(Self::Completed),
            "partial" => Ok(Self::Partial),
            "failed" => Ok(Self::Failed),
            other => Err(format!("unknown session status '{}'", other)),
        }
    }
}

impl From<ReviewStatus> for SessionStatus {
    fn from(status: ReviewStatus) -> Self {
        match status {
            ReviewStatus::Completed => Self::Completed,
            ReviewStatus::Partial => Self::Partial,
            ReviewStatus::Failed => Self::Failed,
        }
    }
}

/// Fields supplied when opening a session.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NewSession {
    pub document_filename: String,
    pub document_path: String,
    pub processing_method: String,
}

impl NewSession {
    pub fn new(document_filename: impl Into<String>) -> Self {
        Self {
            document_filename: document_filename.into(),
            ..Default::default()
        }
    }

    pub fn with_path(mut self, path: impl Into<String>) -> Self {
        self.document_path = path.into();
        self
    }

    pub fn with_processing_method(mut self, method: impl Into<String>) -> Self {
        self.processing_method = method.into();
        self
    }
}

/// A stored review session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReviewSession {
    pub id: i64,
    pub document_filename: String,
    pub document_path: String,
    pub processing_method: String,
    pub status: SessionStatus,
    pub total_processing_time: f64,
    pub summary: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Storage contract for review sessions and their findings.
///
/// Implementations serialize writes internally; callers may share one
/// store across tasks.
pub trait FindingsStore: Send + Sync {
    fn create_session(&self, session: &NewSession) -> Result<i64, StoreError>;

    fn update_session_status(
        &self,
        id: i64,
        status: SessionStatus,
        processing_time: f64,
        summary: Option<&str>,
    ) -> Result<(), StoreError>;

    fn get_session(&self, id: i64) -> Result<Option<ReviewSession>, StoreError>;

    /// Most recent sessions first.
    fn recent_sessions(&self, limit: usize) -> Result<Vec<ReviewSession>, StoreError>;

    /// Record `finding` and return its new identity.
    fn add_finding(&self, finding: &Finding) -> Result<i64, StoreError>;

    /// Findings for a session in creation order.
    fn get_session_findings(&self, session_id: i64) -> Result<Vec<Finding>, StoreError>;
}

#[derive(Default)]
struct MemoryState {
    sessions: Vec<ReviewSession>,
    findings: Vec<Finding>,
}

/// Process-local store with sequential ids starting at 1.
#[derive(Default)]
pub struct InMemoryStore {
    state: Mutex<MemoryState>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn with_state<R>(&self, f: impl FnOnce(&mut MemoryState) -> R) -> Result<R, StoreError> {
        let mut state = self.state.lock().map_err(|_| StoreError::LockPoisoned)?;
        Ok(f(&mut state))
    }
}

impl FindingsStore for InMemoryStore {
    fn create_session(&self, session: &NewSession) -> Result<i64, StoreError> {
        self.with_state(|state| {
            let id = state.sessions.len() as i64 + 1;
            state.sessions.push(ReviewSession {
                id,
                document_filename: session.document_filename.clone(),
                document_path: session.document_path.clone(),
                processing_method: session.processing_method.clone(),
                status: SessionStatus::Pending,
                total_processing_time: 0.0,
                summary: None,
                created_at: Utc::now(),
            });
            id
        })
    }

    fn update_session_status(
        &self,
        id: i64,
        status: SessionStatus,
        processing_time: f64,
        summary: Option<&str>,
    ) -> Result<(), StoreError> {
        self.with_state(|state| {
            let session = state
                .sessions
                .iter_mut()
                .find(|s| s.id == id)
                .ok_or(StoreError::SessionNotFound { id })?;
            session.status = status;
            session.total_processing_time = processing_time;
            session.summary = summary.map(String::from);
            Ok::<(), StoreError>(())
        })?
    }

    fn get_session(&self, id: i64) -> Result<Option<ReviewSession>, StoreError> {
        self.with_state(|state| state.sessions.iter().find(|s| s.id == id).cloned())
    }

    fn recent_sessions(&self, limit: usize) -> Result<Vec<ReviewSession>, StoreError> {
        self.with_state(|state| state.sessions.iter().rev().take(limit).cloned().collect())
    }

    fn add_finding(&self, finding: &Finding) -> Result<i64, StoreError> {
        self.with_state(|state| {
            let id = state.findings.len() as i64 + 1;
            state.findings.push(
                finding
                    .clone()
                    .with_id(id)
                    .with_created_at(Utc::now()),
            );
            id
        })
    }

    fn get_session_findings(&self, session_id: i64) -> Result<Vec<Finding>, StoreError> {
        self.with_state(|state| {
            state
                .findings
                .iter()
                .filter(|f| f.session_id() == session_id)
                .cloned()
                .collect()
        })
    }
}
