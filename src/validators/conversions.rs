//! Unit conversion arithmetic checks.
//!
//! Each [`ConversionRule`] pairs a source value with a converted value on the
//! same line (`100°F (37.8°C)`, `2" [50.8mm]`) and checks the arithmetic.

use super::{ci, fractions::fraction_to_decimal};
use crate::review::findings::{Finding, Severity};
use regex::Regex;
use std::sync::LazyLock;

const CONVERSION_CONFIDENCE: f64 = 0.95;

/// A static pattern plus the numeric relationship between its two captures.
#[derive(Debug)]
pub struct ConversionRule {
    /// Captures the source value in group 1 and the converted value in group 2.
    pub pattern: Regex,
    pub from_unit: &'static str,
    pub to_unit: &'static str,
    /// Linear factor, or `None` for Fahrenheit to Celsius.
    pub conversion_factor: Option<f64>,
    /// Largest accepted absolute difference from the expected value.
    pub tolerance: f64,
}

impl ConversionRule {
    /// The value `from` should convert to.
    pub fn expected(&self, from: f64) -> f64 {
        match self.conversion_factor {
            Some(factor) => from * factor,
            None => (from - 32.0) * 5.0 / 9.0,
        }
    }

    fn finding(&self, whole: &str, from_text: &str, to_text: &str, expected: f64) -> Finding {
        let location = format!("Conversion: {}", whole);
        match self.conversion_factor {
            None => Finding::new(
                Severity::Error,
                "conversion",
                format!(
                    "Incorrect temperature conversion: {}°F should be {:.1}°C, not {}°C",
                    from_text, expected, to_text
                ),
                location,
            )
            .with_suggestion(format!(
                "Correct conversion: {}°F = {:.1}°C",
                from_text, expected
            )),
            Some(_) => Finding::new(
                Severity::Error,
                "conversion",
                format!(
                    "Incorrect conversion: {} {} should be {:.1} {}, not {} {}",
                    from_text, self.from_unit, expected, self.to_unit, to_text, self.to_unit
                ),
                location,
            )
            .with_suggestion(format!(
                "Correct conversion: {} {} = {:.1} {}",
                from_text, self.from_unit, expected, self.to_unit
            )),
        }
        .with_confidence(CONVERSION_CONFIDENCE)
    }

    /// Check every pairing of this rule in `text`.
    pub fn check(&self, text: &str) -> Vec<Finding> {
        let mut findings = Vec::new();

        for caps in self.pattern.captures_iter(text) {
            let (Some(all), Some(from), Some(to)) = (caps.get(0), caps.get(1), caps.get(2))
            else {
                continue;
            };
            let whole = &text[from.start()..all.end()];

            let from_value = match fraction_to_decimal(from.as_str())
                .ok()
                .or_else(|| from.as_str().parse::<f64>().ok())
            {
                Some(v) => v,
                None => {
                    tracing::warn!(value = from.as_str(), "Could not validate conversion");
                    continue;
                }
            };
            let Ok(to_value) = to.as_str().parse::<f64>() else {
                tracing::warn!(value = to.as_str(), "Could not validate conversion");
                continue;
            };

            let expected = self.expected(from_value);
            if (to_value - expected).abs() > self.tolerance {
                findings.push(self.finding(whole, from.as_str(), to.as_str(), expected));
            }
        }

        findings
    }
}

/// Fahrenheit to Celsius, inch to millimetre and foot to metre.
pub static CONVERSION_RULES: LazyLock<Vec<ConversionRule>> = LazyLock::new(|| {
    vec![
        ConversionRule {
            // A sign directly after a digit is a range dash, not a minus
            pattern: ci(
                r"(?:^|[^\d.\n])(-?\d+(?:\.\d+)?)\s*°?F\b.*?[^\d.\n](-?\d+(?:\.\d+)?)\s*°?C\b",
            ),
            from_unit: "F",
            to_unit: "C",
            conversion_factor: None,
            tolerance: 0.5,
        },
        ConversionRule {
            pattern: ci(
                r#"(\d+(?:\s*-\s*\d+/\d+|/\d+|\.\d+)?)\s*(?:inches|inch|in\b|").*?(\d+(?:\.\d+)?)\s*(?:mm|millimeters?)\b"#,
            ),
            from_unit: "inch",
            to_unit: "mm",
            conversion_factor: Some(25.4),
            tolerance: 0.5,
        },
        ConversionRule {
            pattern: ci(
                r"(\d+(?:\.\d+)?)\s*(?:ft|foot|feet)\b.*?(\d+(?:\.\d+)?)\s*(?:m|meters?)\b",
            ),
            from_unit: "ft",
            to_unit: "m",
            conversion_factor: Some(0.3048),
            tolerance: 0.01,
        },
    ]
});

/// Check every conversion rule against `text`.
pub fn check_conversions(text: &str) -> Vec<Finding> {
    CONVERSION_RULES
        .iter()
        .flat_map(|rule| rule.check(text))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temperature_rule() -> &'static ConversionRule {
        &CONVERSION_RULES[0]
    }

    // =========================================
    // Temperature tests
    // =========================================

    #[test]
    fn test_temperature_mismatch_flagged() {
        let findings = check_conversions("Do not exceed 100°F ... 37°C in storage.");
        assert_eq!(findings.len(), 1);
        let finding = &findings[0];
        assert_eq!(finding.severity(), Severity::Error);
        assert_eq!(finding.category(), "conversion");
        assert_eq!(finding.confidence(), 0.95);
        assert!(finding.description().contains("should be 37.8°C, not 37°C"));
        assert_eq!(finding.suggestion(), Some("Correct conversion: 100°F = 37.8°C"));
    }

    #[test]
    fn test_temperature_correct_pair_passes() {
        assert!(check_conversions("Freezing point 32°F ... 0°C.").is_empty());
        assert!(check_conversions("Rated to 212°F (100°C).").is_empty());
    }

    #[test]
    fn test_temperature_within_tolerance_passes() {
        // -40°F is exactly -40°C; 100°F is 37.78°C
        assert!(check_conversions("Range -40°F to -40°C").is_empty());
        assert!(check_conversions("Up to 100°F (37.8°C)").is_empty());
    }

    #[test]
    fn test_temperature_range_dash_is_not_a_minus_sign() {
        assert!(check_conversions("Operating temperature: 32-120°F (0-49°C).").is_empty());
        assert!(check_conversions("Operating temperature: -4 to 120°F (-20 to 49°C).").is_empty());

        let findings = check_conversions("Operating temperature: 32-120°F (0-40°C).");
        assert_eq!(findings.len(), 1);
        assert!(findings[0].description().contains("120°F should be 48.9°C, not 40°C"));
        assert_eq!(findings[0].location(), "Conversion: 120°F (0-40°C");
    }

    #[test]
    fn test_temperature_pair_must_share_a_line() {
        assert!(check_conversions("100°F\n37°C").is_empty());
    }

    #[test]
    fn test_expected_temperature_formula() {
        let expected = temperature_rule().expected(212.0);
        assert!((expected - 100.0).abs() < 1e-9);
    }

    // =========================================
    // Linear conversion tests
    // =========================================

    #[test]
    fn test_inch_to_mm_mismatch_flagged() {
        let findings = check_conversions("Drill a 2\" [45mm] hole.");
        assert_eq!(findings.len(), 1);
        assert!(findings[0]
            .description()
            .contains("2 inch should be 50.8 mm, not 45 mm"));
    }

    #[test]
    fn test_inch_to_mm_correct_passes() {
        assert!(check_conversions("Drill a 2\" [50.8mm] hole.").is_empty());
        assert!(check_conversions("Use 1 inch (25.4 mm) spacing.").is_empty());
    }

    #[test]
    fn test_mixed_fraction_inch_is_understood() {
        assert!(check_conversions("Backset 1-1/2\" [38.1mm]").is_empty());
        assert_eq!(check_conversions("Backset 1-1/2\" [25.4mm]").len(), 1);
    }

    #[test]
    fn test_feet_to_meters() {
        assert!(check_conversions("Run up to 10 ft (3.048 m) of cable").is_empty());
        let findings = check_conversions("Run up to 10 ft (3.5 m) of cable");
        assert_eq!(findings.len(), 1);
        assert!(findings[0].description().contains("should be 3.0 m"));
    }

    #[test]
    fn test_words_containing_unit_letters_ignored() {
        // "feet" and "cm" must not pair as Fahrenheit/Celsius
        assert!(check_conversions("Mount 5 feet high, 10 cm from the frame").is_empty());
        // "install" is not "in"
        assert!(check_conversions("Step 2 install the 5mm screw").is_empty());
    }
}
