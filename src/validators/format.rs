//! Notation detectors.
//!
//! House style: imperial values use fractions (`1-1/2"`), metric values use
//! decimals with at most one place (`38.1mm`), every measurement carries a
//! unit, inches use `"` and temperatures use `°F`/`°C`.

use super::fractions::{decimal_to_fraction, fraction_to_decimal};
use super::{ci, context_around, exception_window, is_exception};
use crate::review::findings::{Finding, Severity};
use regex::{Match, Regex};
use std::sync::LazyLock;

static IMPERIAL_DECIMAL_REGEX: LazyLock<Regex> =
    LazyLock::new(|| ci(r#"\b(\d+\.\d+)\s*(?:inches|inch|in\b|")"#));

static METRIC_FRACTION_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    ci(r"\b(\d+(?:\s*-\s*)?\d*/\d+)\s*(mm|cm|millimeters?|centimeters?)\b")
});

static METRIC_PRECISION_REGEX: LazyLock<Regex> =
    LazyLock::new(|| ci(r"\b(\d+\.\d{2,})\s*(mm|cm|millimeters?|centimeters?)\b"));

static MEASUREMENT_NOUN_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    ci(concat!(
        r"\b(?:diameter|length|width|height|distance|gap|clearance|spacing|thickness|depth)",
        r"\s+(?:of\s+)?",
        r"(\d+(?:/\d+|\.\d+)?(?:\s*-\s*\d+(?:/\d+|\.\d+)?)?)",
    ))
});

static INCH_SYMBOL_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\d+(?:\.\d+)?\s*(?:″|“|”|'')").unwrap());

static TEMPERATURE_SYMBOL_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b\d+\s*(?:(deg(?:rees?)?\s*[FC])|([FC]))").unwrap());

fn measurement_finding(
    severity: Severity,
    category: &str,
    description: String,
    whole: &Match<'_>,
    suggestion: String,
    confidence: f64,
) -> Finding {
    Finding::new(
        severity,
        category,
        description,
        format!("Measurement: {}", whole.as_str()),
    )
    .with_suggestion(suggestion)
    .with_confidence(confidence)
}

/// Imperial values written as decimals (`1.5"`). Suggests the nearest sixteenth.
pub fn check_imperial_decimals(text: &str) -> Vec<Finding> {
    IMPERIAL_DECIMAL_REGEX
        .captures_iter(text)
        .filter_map(|caps| {
            let whole = caps.get(0)?;
            let value: f64 = caps.get(1)?.as_str().parse().ok()?;
            Some(measurement_finding(
                Severity::Warning,
                "standards",
                format!("Imperial measurement using decimal notation: '{}'", whole.as_str()),
                &whole,
                format!("Use fractional notation: {}\"", decimal_to_fraction(value)),
                0.9,
            ))
        })
        .collect()
}

/// Metric values written as fractions (`25-1/2mm`). Suggests a one-place decimal.
pub fn check_metric_fractions(text: &str) -> Vec<Finding> {
    METRIC_FRACTION_REGEX
        .captures_iter(text)
        .filter_map(|caps| {
            let whole = caps.get(0)?;
            let fraction = caps.get(1)?;
            let unit = caps.get(2)?.as_str();
            if is_exception(exception_window(text, whole.range())) {
                return None;
            }

            let finding = match fraction_to_decimal(fraction.as_str()) {
                Ok(value) => measurement_finding(
                    Severity::Warning,
                    "standards",
                    format!("Metric measurement using fraction notation: '{}'", whole.as_str()),
                    &whole,
                    format!("Use decimal notation: {:.1}{}", value, unit),
                    0.9,
                ),
                Err(err) => {
                    tracing::debug!(error = %err, "Unparseable metric fraction");
                    measurement_finding(
                        Severity::Warning,
                        "standards",
                        format!(
                            "Metric measurement using non-standard notation: '{}'",
                            whole.as_str()
                        ),
                        &whole,
                        "Use decimal notation for metric measurements".to_string(),
                        0.8,
                    )
                }
            };
            Some(finding)
        })
        .collect()
}

/// Metric values with more than one decimal place (`25.40mm`).
pub fn check_metric_precision(text: &str) -> Vec<Finding> {
    METRIC_PRECISION_REGEX
        .captures_iter(text)
        .filter_map(|caps| {
            let whole = caps.get(0)?;
            let value: f64 = caps.get(1)?.as_str().parse().ok()?;
            let unit = caps.get(2)?.as_str();
            Some(measurement_finding(
                Severity::Info,
                "precision",
                format!("Metric measurement with excessive precision: '{}'", whole.as_str()),
                &whole,
                format!("Round to 1 decimal place: {:.1}{}", value, unit),
                0.8,
            ))
        })
        .collect()
}

const UNIT_WORDS: &[&str] = &[
    "mm", "cm", "m", "in", "inch", "inches", "ft", "foot", "feet", "yd", "yard", "yards",
    "meter", "meters", "metre", "metres", "millimeter", "millimeters", "centimeter",
    "centimeters", "awg", "gauge", "ga",
];

fn starts_with_unit(rest: &str) -> bool {
    let rest = rest.trim_start();
    if rest.starts_with(['"', '″', '”', '\'', '°']) {
        return true;
    }
    let word: String = rest
        .chars()
        .take_while(|c| c.is_alphabetic())
        .collect::<String>()
        .to_lowercase();
    UNIT_WORDS.contains(&word.as_str())
}

/// A measurement noun followed by a bare number (`diameter of 2`).
pub fn check_missing_units(text: &str) -> Vec<Finding> {
    let mut findings = Vec::new();

    for caps in MEASUREMENT_NOUN_REGEX.captures_iter(text) {
        let (Some(whole), Some(number)) = (caps.get(0), caps.get(1)) else {
            continue;
        };
        if starts_with_unit(&text[number.end()..])
            || is_exception(exception_window(text, number.range()))
        {
            continue;
        }

        findings.push(
            Finding::new(
                Severity::Warning,
                "formatting",
                format!("Measurement value without units specified: '{}'", whole.as_str()),
                format!("Text: {}", context_around(text, whole.range(), 30)),
            )
            .with_suggestion("Always specify units: 2\", 15mm, 1-1/2\"")
            .with_confidence(0.9),
        );
    }

    findings
}

/// Curly quotes, double primes or doubled apostrophes used as inch marks.
pub fn check_inch_symbols(text: &str) -> Vec<Finding> {
    INCH_SYMBOL_REGEX
        .find_iter(text)
        .map(|m| {
            measurement_finding(
                Severity::Warning,
                "standards",
                format!("Non-standard inch symbol used: '{}'", m.as_str()),
                &m,
                "Use standard \" symbol for inches".to_string(),
                0.9,
            )
        })
        .collect()
}

/// Temperatures written `72F`, `72 deg F` or `72 degrees C` instead of `72°F`.
///
/// A bare `F`/`C` followed by a lower-case letter is a word (`5 Ft`,
/// `3 Connect`), not a temperature.
pub fn check_temperature_symbols(text: &str) -> Vec<Finding> {
    let mut findings = Vec::new();

    for caps in TEMPERATURE_SYMBOL_REGEX.captures_iter(text) {
        let Some(whole) = caps.get(0) else { continue };
        if let Some(bare) = caps.get(2) {
            let next = text[bare.end()..].trim_start().chars().next();
            if matches!(next, Some(c) if c.is_lowercase()) {
                continue;
            }
        }

        findings.push(
            Finding::new(
                Severity::Warning,
                "standards",
                format!("Non-standard temperature format: '{}'", whole.as_str()),
                format!("Temperature: {}", whole.as_str()),
            )
            .with_suggestion("Use standard °F or °C symbols for temperature")
            .with_confidence(0.9),
        );
    }

    findings
}

#[cfg(test)]
mod tests {
    use super::*;

    // =========================================
    // Imperial decimal tests
    // =========================================

    #[test]
    fn test_imperial_decimal_suggests_fraction() {
        let findings = check_imperial_decimals("Set the gap to 1.5\" before tightening.");
        assert_eq!(findings.len(), 1);
        assert_eq!(findings[0].severity(), Severity::Warning);
        assert_eq!(findings[0].category(), "standards");
        assert_eq!(findings[0].suggestion(), Some("Use fractional notation: 1-1/2\""));
    }

    #[test]
    fn test_imperial_decimal_word_units() {
        let findings = check_imperial_decimals("A 2.25 inch or 3.75 inches bolt");
        assert_eq!(findings.len(), 2);
        assert_eq!(findings[1].suggestion(), Some("Use fractional notation: 3-3/4\""));
    }

    #[test]
    fn test_imperial_fraction_not_flagged() {
        assert!(check_imperial_decimals("Use a 1-1/2\" bit").is_empty());
        assert!(check_imperial_decimals("Version 2.5 installer").is_empty());
    }

    // =========================================
    // Metric fraction tests
    // =========================================

    #[test]
    fn test_metric_fraction_suggests_decimal() {
        let findings = check_metric_fractions("Offset 25-1/2 mm from the edge");
        assert_eq!(findings.len(), 1);
        assert_eq!(findings[0].suggestion(), Some("Use decimal notation: 25.5mm"));
        assert_eq!(findings[0].confidence(), 0.9);
    }

    #[test]
    fn test_metric_simple_fraction() {
        let findings = check_metric_fractions("Recess 3/4 cm deep");
        assert_eq!(findings.len(), 1);
        assert_eq!(findings[0].suggestion(), Some("Use decimal notation: 0.8cm"));
    }

    #[test]
    fn test_metric_fraction_unparseable_still_flagged() {
        let findings = check_metric_fractions("Offset 25-/2 mm from the edge");
        assert_eq!(findings.len(), 1);
        assert!(findings[0].description().contains("non-standard notation"));
        assert_eq!(findings[0].confidence(), 0.8);
    }

    // =========================================
    // Metric precision tests
    // =========================================

    #[test]
    fn test_metric_precision_flags_two_places() {
        let findings = check_metric_precision("Hole diameter 12.345mm and 25.4mm");
        assert_eq!(findings.len(), 1);
        assert_eq!(findings[0].severity(), Severity::Info);
        assert_eq!(findings[0].category(), "precision");
        assert_eq!(findings[0].suggestion(), Some("Round to 1 decimal place: 12.3mm"));
    }

    // =========================================
    // Missing unit tests
    // =========================================

    #[test]
    fn test_missing_units_flagged() {
        let findings = check_missing_units("Drill to a diameter of 2 and check it.");
        assert_eq!(findings.len(), 1);
        assert!(findings[0].description().contains("diameter of 2"));
        assert!(findings[0].location().starts_with("Text: "));
    }

    #[test]
    fn test_missing_units_at_end_of_text() {
        assert_eq!(check_missing_units("Set spacing 1-1/2").len(), 1);
    }

    #[test]
    fn test_units_present_not_flagged() {
        assert!(check_missing_units("length 15 mm").is_empty());
        assert!(check_missing_units("length 15mm").is_empty());
        assert!(check_missing_units("spacing 1-1/2\" apart").is_empty());
        assert!(check_missing_units("width of 3/4 inch").is_empty());
        assert!(check_missing_units("height 2.5 ft").is_empty());
        assert!(check_missing_units("gap of 12 AWG wire").is_empty());
    }

    #[test]
    fn test_starts_with_unit() {
        assert!(starts_with_unit(" mm apart"));
        assert!(starts_with_unit("\" deep"));
        assert!(starts_with_unit("Inches"));
        assert!(!starts_with_unit(" and then"));
        assert!(!starts_with_unit(""));
    }

    // =========================================
    // Symbol tests
    // =========================================

    #[test]
    fn test_curly_inch_symbols_flagged() {
        let findings = check_inch_symbols("Use a 2” bit and a 3″ screw, not 4'' either");
        assert_eq!(findings.len(), 3);
    }

    #[test]
    fn test_straight_inch_symbol_accepted() {
        assert!(check_inch_symbols("Use a 2\" bit").is_empty());
    }

    #[test]
    fn test_temperature_symbols() {
        assert_eq!(check_temperature_symbols("Store below 72F.").len(), 1);
        assert_eq!(check_temperature_symbols("Store below 72 deg F").len(), 1);
        assert_eq!(check_temperature_symbols("Operates at 20 degrees C").len(), 1);
    }

    #[test]
    fn test_temperature_symbol_words_ignored() {
        assert!(check_temperature_symbols("Store below 72°F").is_empty());
        assert!(check_temperature_symbols("Step 3 Connect the leads").is_empty());
        assert!(check_temperature_symbols("Mount 5 Ft above").is_empty());
    }
}
