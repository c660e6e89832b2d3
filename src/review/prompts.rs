//! Prompt templates for the LLM-backed part of each agent.
//!
//! Every agent prompt ends with the answer grammar consumed by
//! [`FindingsParser`](crate::review::parser::FindingsParser).

use serde::{Deserialize, Serialize};
use std::fmt;

const BASE_SYSTEM_PROMPT: &str = "You are an expert technical writing reviewer specializing in \
installation instructions for mechanical and electronic access control hardware. Your task is to \
analyze documents and provide constructive feedback to improve clarity, accuracy, and usability.

Always provide specific, actionable feedback with clear locations in the document where the \
issues occur. Focus on issues that would impact a technician trying to install the product \
using the provided instructions.";

const ANSWER_FORMAT: &str = "FINDINGS:
[Severity] - [Location]: [Description]
Suggestion: [Specific recommendation]

---
[Repeat for each finding]";

/// Which analyzer a prompt is for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PromptKind {
    Technical,
    Formatting,
    Diagram,
}

impl PromptKind {
    fn focus(&self) -> &'static str {
        match self {
            Self::Technical => "TECHNICAL ACCURACY",
            Self::Formatting => "FORMATTING and STANDARDS COMPLIANCE",
            Self::Diagram => "DIAGRAMS and VISUAL ELEMENTS",
        }
    }

    /// Review checklist presented to the model.
    pub fn focus_areas(&self) -> &'static [&'static str] {
        match self {
            Self::Technical => &[
                "**Technical Errors**: Incorrect or misleading procedures, inconsistent part numbers, impossible configurations",
                "**Safety Issues**: Missing safety warnings, procedures that could lead to injury or damage",
                "**Completeness**: Missing steps, unclear sequences, incomplete information",
                "**Tool Requirements**: Missing or incorrect tool specifications or lists",
                "**Troubleshooting**: Inadequate troubleshooting steps for common issues",
            ],
            Self::Formatting => &[
                "**Fraction Format**: Inconsistent fraction notation (1/2 vs ½ vs 0.5)",
                "**Measurement Units**: Missing units, inconsistent unit formatting, metric vs imperial",
                "**Number Format**: Inconsistent decimal places, number formatting",
                "**List Formatting**: Inconsistent bullet points, numbering, indentation",
                "**Reference Format**: Inconsistent figure/table references, citation format",
            ],
            Self::Diagram => &[
                "**Diagram Accuracy**: Incorrect or confusing wiring, mislabeled connections, missing components",
                "**Visual Clarity**: Illegible text, unclear symbols",
                "**Diagram-Text Alignment**: Diagrams that don't match the text descriptions",
                "**Missing Visuals**: Complex procedures lacking helpful diagrams",
                "**Symbol Standards**: Non-standard electrical symbols, inconsistent notation",
            ],
        }
    }

    fn severity_guide(&self) -> &'static str {
        match self {
            Self::Technical => {
                "\"error\" (blocks or hinders completion), \"warning\" (could cause problems) or \"info\" (improvement suggestion)"
            }
            Self::Formatting => {
                "\"error\" (incorrect standards), \"warning\" (inconsistent format), or \"info\" (style improvement)"
            }
            Self::Diagram => {
                "\"error\" (incorrect/dangerous), \"warning\" (unclear/confusing), or \"info\" (could be improved)"
            }
        }
    }

    fn location_hint(&self) -> &'static str {
        match self {
            Self::Technical => "Specific page or section where the issue occurs",
            Self::Formatting => "Specific page/section/step reference",
            Self::Diagram => "Specific figure/page reference",
        }
    }
}

impl fmt::Display for PromptKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Technical => "technical",
            Self::Formatting => "formatting",
            Self::Diagram => "diagram",
        };
        write!(f, "{}", s)
    }
}

/// Build the full prompt for `kind` over `document_text`.
pub fn build_agent_prompt(kind: PromptKind, document_text: &str) -> String {
    let focus_list = kind
        .focus_areas()
        .iter()
        .enumerate()
        .map(|(i, area)| format!("{}. {}", i + 1, area))
        .collect::<Vec<_>>()
        .join("\n");

    format!(
        r#"{base}

You are specifically focused on {focus}. Review the document for:
{focus_list}

For each issue found, provide:
- Severity: {severity}
- Location: {location}
- Description: Clear explanation of the issue
- Suggestion: Specific recommendation to fix the issue

Document to review:
{document_text}

Respond in this exact format:
{answer_format}
"#,
        base = BASE_SYSTEM_PROMPT,
        focus = kind.focus(),
        severity = kind.severity_guide(),
        location = kind.location_hint(),
        answer_format = ANSWER_FORMAT,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::review::parser::parse_records;

    #[test]
    fn test_prompt_embeds_document_and_focus() {
        let prompt = build_agent_prompt(PromptKind::Technical, "Step 1: Mount the bracket.");
        assert!(prompt.contains("Step 1: Mount the bracket."));
        assert!(prompt.contains("TECHNICAL ACCURACY"));
        assert!(prompt.contains("1. **Technical Errors**"));
        assert!(prompt.contains("5. **Troubleshooting**"));
    }

    #[test]
    fn test_each_kind_has_distinct_focus() {
        let technical = build_agent_prompt(PromptKind::Technical, "doc");
        let formatting = build_agent_prompt(PromptKind::Formatting, "doc");
        let diagram = build_agent_prompt(PromptKind::Diagram, "doc");
        assert!(formatting.contains("Fraction Format"));
        assert!(diagram.contains("Symbol Standards"));
        assert_ne!(technical, formatting);
        assert_ne!(formatting, diagram);
    }

    #[test]
    fn test_answer_format_is_last_section() {
        let prompt = build_agent_prompt(PromptKind::Diagram, "doc");
        assert!(prompt.trim_end().ends_with("[Repeat for each finding]"));
        assert!(prompt.contains("FINDINGS:\n[Severity] - [Location]: [Description]"));
    }

    #[test]
    fn test_answer_format_placeholder_parses_as_header() {
        // The template's own example line is valid grammar
        let records = parse_records(ANSWER_FORMAT);
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].location, "[Location]");
    }

    #[test]
    fn test_kind_display() {
        assert_eq!(PromptKind::Formatting.to_string(), "formatting");
    }
}
