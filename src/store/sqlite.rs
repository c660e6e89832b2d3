use std::path::Path;
use std::sync::{Mutex, MutexGuard};

use chrono::{DateTime, SecondsFormat, Utc};
use rusqlite::{Connection, OptionalExtension, Row, params};

use super::{FindingsStore, NewSession, ReviewSession, SessionStatus};
use crate::errors::StoreError;
use crate::review::findings::{Finding, Severity};

/// SQLite-backed findings store.
///
/// One connection behind a mutex, so every write is serialized.
pub struct SqliteStore {
    conn: Mutex<Connection>,
}

impl SqliteStore {
    /// Open (or create) a database at `path` and run migrations.
    pub fn open(path: &Path) -> Result<Self, StoreError> {
        let store = Self {
            conn: Mutex::new(Connection::open(path)?),
        };
        store.init()?;
        Ok(store)
    }

    /// In-memory database, for tests.
    pub fn in_memory() -> Result<Self, StoreError> {
        let store = Self {
            conn: Mutex::new(Connection::open_in_memory()?),
        };
        store.init()?;
        Ok(store)
    }

    fn lock(&self) -> Result<MutexGuard<'_, Connection>, StoreError> {
        self.conn.lock().map_err(|_| StoreError::LockPoisoned)
    }

    fn init(&self) -> Result<(), StoreError> {
        let conn = self.lock()?;
        conn.execute_batch("PRAGMA foreign_keys = ON;")?;
        conn.execute_batch(
            "
            CREATE TABLE IF NOT EXISTS review_sessions (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                document_filename TEXT NOT NULL,
                document_path TEXT NOT NULL DEFAULT '',
                processing_method TEXT NOT NULL DEFAULT '',
                status TEXT NOT NULL DEFAULT 'pending',
                total_processing_time REAL NOT NULL DEFAULT 0.0,
                summary TEXT,
                created_at TEXT NOT NULL
            );

            CREATE TABLE IF NOT EXISTS agent_findings (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                session_id INTEGER NOT NULL REFERENCES review_sessions(id) ON DELETE CASCADE,
                agent_name TEXT NOT NULL,
                severity TEXT NOT NULL,
                category TEXT NOT NULL,
                description TEXT NOT NULL,
                location TEXT NOT NULL,
                suggestion TEXT,
                confidence REAL NOT NULL DEFAULT 0.0,
                created_at TEXT NOT NULL
            );

            CREATE INDEX IF NOT EXISTS idx_agent_findings_session ON agent_findings(session_id);
            CREATE INDEX IF NOT EXISTS idx_review_sessions_created ON review_sessions(created_at);
            ",
        )?;
        Ok(())
    }
}

/// Fixed-width UTC timestamp so text ordering matches time ordering.
fn now_timestamp() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Micros, true)
}

fn parse_timestamp(column: &str, raw: &str) -> Result<DateTime<Utc>, StoreError> {
    DateTime::parse_from_rfc3339(raw)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| StoreError::InvalidColumn {
            column: column.to_string(),
            message: e.to_string(),
        })
}

/// Intermediate row struct for review_sessions.
struct SessionRow {
    id: i64,
    document_filename: String,
    document_path: String,
    processing_method: String,
    status: String,
    total_processing_time: f64,
    summary: Option<String>,
    created_at: String,
}

impl SessionRow {
    const COLUMNS: &'static str = "id, document_filename, document_path, processing_method, status, total_processing_time, summary, created_at";

    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            document_filename: row.get(1)?,
            document_path: row.get(2)?,
            processing_method: row.get(3)?,
            status: row.get(4)?,
            total_processing_time: row.get(5)?,
            summary: row.get(6)?,
            created_at: row.get(7)?,
        })
    }

    fn into_session(self) -> Result<ReviewSession, StoreError> {
        let status = self
            .status
            .parse::<SessionStatus>()
            .map_err(|message| StoreError::InvalidColumn {
                column: "status".to_string(),
                message,
            })?;
        Ok(ReviewSession {
            id: self.id,
            document_filename: self.document_filename,
            document_path: self.document_path,
            processing_method: self.processing_method,
            status,
            total_processing_time: self.total_processing_time,
            summary: self.summary,
            created_at: parse_timestamp("created_at", &self.created_at)?,
        })
    }
}

/// Intermediate row struct for agent_findings.
struct FindingRow {
    id: i64,
    session_id: i64,
    agent_name: String,
    severity: String,
    category: String,
    description: String,
    location: String,
    suggestion: Option<String>,
    confidence: f64,
    created_at: String,
}

impl FindingRow {
    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            session_id: row.get(1)?,
            agent_name: row.get(2)?,
            severity: row.get(3)?,
            category: row.get(4)?,
            description: row.get(5)?,
            location: row.get(6)?,
            suggestion: row.get(7)?,
            confidence: row.get(8)?,
            created_at: row.get(9)?,
        })
    }

    fn into_finding(self) -> Result<Finding, StoreError> {
        let mut finding = Finding::new(
            Severity::normalize(&self.severity),
            self.category,
            self.description,
            self.location,
        )
        .with_agent(self.agent_name)
        .with_session(self.session_id)
        .with_id(self.id)
        .with_confidence(self.confidence)
        .with_created_at(parse_timestamp("created_at", &self.created_at)?);
        if let Some(suggestion) = self.suggestion {
            finding = finding.with_suggestion(suggestion);
        }
        Ok(finding)
    }
}

impl FindingsStore for SqliteStore {
    fn create_session(&self, session: &NewSession) -> Result<i64, StoreError> {
        let conn = self.lock()?;
        conn.execute(
            "INSERT INTO review_sessions (document_filename, document_path, processing_method, status, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                session.document_filename,
                session.document_path,
                session.processing_method,
                SessionStatus::Pending.as_str(),
                now_timestamp(),
            ],
        )?;
        let id = conn.last_insert_rowid();
        tracing::debug!(session_id = id, filename = %session.document_filename, "Review session created");
        Ok(id)
    }

    fn update_session_status(
        &self,
        id: i64,
        status: SessionStatus,
        processing_time: f64,
        summary: Option<&str>,
    ) -> Result<(), StoreError> {
        let conn = self.lock()?;
        let updated = conn.execute(
            "UPDATE review_sessions SET status = ?1, total_processing_time = ?2, summary = ?3 WHERE id = ?4",
            params![status.as_str(), processing_time, summary, id],
        )?;
        if updated == 0 {
            return Err(StoreError::SessionNotFound { id });
        }
        Ok(())
    }

    fn get_session(&self, id: i64) -> Result<Option<ReviewSession>, StoreError> {
        let conn = self.lock()?;
        let row = conn
            .query_row(
                &format!(
                    "SELECT {} FROM review_sessions WHERE id = ?1",
                    SessionRow::COLUMNS
                ),
                params![id],
                SessionRow::from_row,
            )
            .optional()?;
        row.map(SessionRow::into_session).transpose()
    }

    fn recent_sessions(&self, limit: usize) -> Result<Vec<ReviewSession>, StoreError> {
        let conn = self.lock()?;
        let mut stmt = conn.prepare(&format!(
            "SELECT {} FROM review_sessions ORDER BY created_at DESC, id DESC LIMIT ?1",
            SessionRow::COLUMNS
        ))?;
        let rows = stmt.query_map(params![limit as i64], SessionRow::from_row)?;
        let mut sessions = Vec::new();
        for row in rows {
            sessions.push(row?.into_session()?);
        }
        Ok(sessions)
    }

    fn add_finding(&self, finding: &Finding) -> Result<i64, StoreError> {
        let conn = self.lock()?;
        conn.execute(
            "INSERT INTO agent_findings
             (session_id, agent_name, severity, category, description, location, suggestion, confidence, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
            params![
                finding.session_id(),
                finding.agent_name(),
                finding.severity().to_string(),
                finding.category(),
                finding.description(),
                finding.location(),
                finding.suggestion(),
                finding.confidence(),
                now_timestamp(),
            ],
        )?;
        Ok(conn.last_insert_rowid())
    }

    fn get_session_findings(&self, session_id: i64) -> Result<Vec<Finding>, StoreError> {
        let conn = self.lock()?;
        let mut stmt = conn.prepare(
            "SELECT id, session_id, agent_name, severity, category, description, location, suggestion, confidence, created_at
             FROM agent_findings WHERE session_id = ?1 ORDER BY created_at, id",
        )?;
        let rows = stmt.query_map(params![session_id], FindingRow::from_row)?;
        let mut findings = Vec::new();
        for row in rows {
            findings.push(row?.into_finding()?);
        }
        Ok(findings)
    }
}

// ── Tests ─────────────────────────────────────────────────────────────
