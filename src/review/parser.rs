//! Findings parsing from free-form analyzer output.
//!
//! LLM answers are prompted into this shape, but nothing guarantees it:
//!
//! ```text
//! FINDINGS:
//! [ERROR] - Page 3: Reversed polarity
//! Suggestion: Swap leads
//! ---
//! [INFO] - Page 4: minor typo
//! ```
//!
//! Each header line starts a finding; a later `Suggestion:` line attaches to
//! the pending one. Every other line is ignored, including continuation
//! text. A block whose header drifts from the grammar is dropped.

use crate::review::findings::{Finding, Severity};
use regex::Regex;
use std::sync::LazyLock;

const FINDINGS_MARKER: &str = "FINDINGS:";

static HEADER_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\[?(\w+)\]?\s*-\s*([^:]+):\s*(.+)$").unwrap());

const SUGGESTION_PREFIX: &str = "suggestion:";

/// One parsed header line plus its optional suggestion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedFinding {
    pub severity: Severity,
    pub location: String,
    pub description: String,
    pub suggestion: Option<String>,
}

/// Parser turning analyzer text into findings for one agent.
///
/// The grammar carries no confidence or category, so both are fixed per
/// parser.
#[derive(Debug, Clone)]
pub struct FindingsParser {
    category: String,
    confidence: f64,
}

impl FindingsParser {
    pub fn new(category: impl Into<String>, confidence: f64) -> Self {
        Self {
            category: category.into(),
            confidence,
        }
    }

    /// Parse `text` into findings, in the order their headers appear.
    pub fn parse(&self, text: &str) -> Vec<Finding> {
        parse_records(text)
            .into_iter()
            .map(|record| {
                let finding = Finding::new(
                    record.severity,
                    self.category.as_str(),
                    record.description,
                    record.location,
                )
                .with_confidence(self.confidence);
                match record.suggestion {
                    Some(suggestion) => finding.with_suggestion(suggestion),
                    None => finding,
                }
            })
            .collect()
    }
}

fn parse_header(line: &str) -> Option<ParsedFinding> {
    let caps = HEADER_REGEX.captures(line)?;
    Some(ParsedFinding {
        severity: Severity::normalize(caps.get(1)?.as_str()),
        location: caps.get(2)?.as_str().trim().to_string(),
        description: caps.get(3)?.as_str().trim().to_string(),
        suggestion: None,
    })
}

fn parse_suggestion(line: &str) -> Option<String> {
    let prefix = line.get(..SUGGESTION_PREFIX.len())?;
    if !prefix.eq_ignore_ascii_case(SUGGESTION_PREFIX) {
        return None;
    }
    let rest = line.split_once(':').map_or("", |(_, rest)| rest);
    Some(rest.trim().to_string())
}

/// Parse `text` into raw records without building findings.
pub fn parse_records(text: &str) -> Vec<ParsedFinding> {
    let body = match text.find(FINDINGS_MARKER) {
        Some(idx) => &text[idx + FINDINGS_MARKER.len()..],
        None => text,
    };

    let mut records = Vec::new();
    let mut pending: Option<ParsedFinding> = None;

    for raw_line in body.lines() {
        let line = raw_line.trim();

        if let Some(header) = parse_header(line) {
            records.extend(pending.replace(header));
            continue;
        }

        if let Some(ref mut current) = pending
            && let Some(suggestion) = parse_suggestion(line)
        {
            current.suggestion = Some(suggestion);
        }
    }

    records.extend(pending);
    records
}

/// Convenience function to parse findings with a one-off parser.
pub fn parse_findings(text: &str, category: &str, confidence: f64) -> Vec<Finding> {
    FindingsParser::new(category, confidence).parse(text)
}
