//! Rule-based measurement and format validators.
//!
//! Every check here is a pure function from document text to findings. No
//! check depends on another check's output or on the order they run in.
//!
//! ## Checks
//!
//! - [`conversions`]: temperature and linear unit conversion arithmetic
//! - [`format`]: notation detectors (decimal inches, fractional metric, ...)
//! - [`consistency`]: document-wide unit system and notation consistency
//! - [`fractions`]: decimal ↔ sixteenths conversion used by the above
//!
//! ## Example
//!
//! ```
//! use redline::review::findings::Severity;
//! use redline::validators::conversions::check_conversions;
//!
//! let findings = check_conversions("Operating range up to 100°F (37°C).");
//! assert_eq!(findings.len(), 1);
//! assert_eq!(findings[0].severity(), Severity::Error);
//! ```

pub mod consistency;
pub mod conversions;
pub mod format;
pub mod fractions;

use crate::review::findings::Finding;
use regex::{Regex, RegexBuilder};
use std::ops::Range;
use std::sync::LazyLock;

pub use conversions::{ConversionRule, check_conversions};
pub use fractions::{decimal_to_fraction, fraction_to_decimal};

/// Run every validator over `text`, in a fixed order.
pub fn run_all(text: &str) -> Vec<Finding> {
    let mut findings = Vec::new();
    findings.extend(conversions::check_conversions(text));
    findings.extend(format::check_imperial_decimals(text));
    findings.extend(format::check_metric_fractions(text));
    findings.extend(format::check_metric_precision(text));
    findings.extend(format::check_missing_units(text));
    findings.extend(format::check_inch_symbols(text));
    findings.extend(format::check_temperature_symbols(text));
    findings.extend(consistency::check_unit_consistency(text));
    findings.extend(consistency::check_temperature_consistency(text));
    findings.extend(consistency::check_pairing_precision(text));
    findings.extend(consistency::check_fraction_styles(text));
    findings
}

fn ci(pattern: &str) -> Regex {
    RegexBuilder::new(pattern)
        .case_insensitive(true)
        .build()
        .unwrap()
}

// Ranges and part numbers that look like dash-separated measurements
static EXCEPTION_PATTERNS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    vec![
        ci(r"^\d+\s*-\s*\d+\s*(?:VDC|VAC|volts?|V)\b"),
        ci(r"^\d+\s*-\s*\d+\s*(?:kHz|MHz|Hz)\b"),
        ci(r"^\d+\s*-\s*\d+\s*(?:amps?|mA|A)\b"),
        ci(r"^\d+\s*-\s*\d+\s*(?:ohms?|Ω)"),
        ci(r"^[a-z][a-z0-9]*\d+-\d+"),
    ]
});

/// Check whether a candidate is a voltage, frequency, current or
/// resistance range, or a model number, rather than a measurement.
///
/// # Examples
///
/// ```
/// use redline::validators::is_exception;
///
/// assert!(is_exception("12-24VDC"));
/// assert!(is_exception("50-60 Hz"));
/// assert!(is_exception("M62-12"));
/// assert!(!is_exception("1-1/2\""));
/// ```
pub fn is_exception(candidate: &str) -> bool {
    let candidate = candidate.trim_start();
    EXCEPTION_PATTERNS.iter().any(|re| re.is_match(candidate))
}

/// Widen a match to include a glued-on alphanumeric prefix and a short
/// trailing context, so [`is_exception`] can see units and model prefixes.
pub(crate) fn exception_window(text: &str, range: Range<usize>) -> &str {
    let mut start = range.start;
    while let Some(c) = text[..start].chars().next_back() {
        if !c.is_alphanumeric() {
            break;
        }
        start -= c.len_utf8();
    }
    let end = ceil_boundary(text, (range.end + 8).min(text.len()));
    &text[start..end]
}

/// Text surrounding a match, with ellipses where it was cut.
pub(crate) fn context_around(text: &str, range: Range<usize>, radius: usize) -> String {
    let start = floor_boundary(text, range.start.saturating_sub(radius));
    let end = ceil_boundary(text, (range.end + radius).min(text.len()));
    let mut context = text[start..end].trim().to_string();
    if start > 0 {
        context.insert_str(0, "...");
    }
    if end < text.len() {
        context.push_str("...");
    }
    context
}

fn floor_boundary(text: &str, mut index: usize) -> usize {
    while !text.is_char_boundary(index) {
        index -= 1;
    }
    index
}

fn ceil_boundary(text: &str, mut index: usize) -> usize {
    while !text.is_char_boundary(index) {
        index += 1;
    }
    index
}

/// Number of digits after the decimal point in a numeric literal.
pub(crate) fn decimal_places(literal: &str) -> usize {
    literal.split_once('.').map_or(0, |(_, frac)| frac.len())
}
