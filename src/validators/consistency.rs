//! Document-wide consistency checks.
//!
//! Unlike the detectors in [`super::format`], these look at tallies over the
//! whole text and emit at most one finding each (except pairing precision).

use super::{ci, decimal_places, exception_window, is_exception};
use crate::review::findings::{Finding, Severity};
use regex::Regex;
use std::collections::BTreeSet;
use std::fmt;
use std::sync::LazyLock;

static IMPERIAL_INCH_REGEX: LazyLock<Regex> =
    LazyLock::new(|| ci(r#"\b\d+(?:\.\d+|\s*-\s*\d+/\d+|/\d+)?\s*(?:inches|inch|in\b|")"#));

static IMPERIAL_FOOT_REGEX: LazyLock<Regex> =
    LazyLock::new(|| ci(r"\b\d+(?:\.\d+|\s*-\s*\d+/\d+)?\s*(?:ft|foot|feet)\b"));

static METRIC_MM_REGEX: LazyLock<Regex> =
    LazyLock::new(|| ci(r"\b\d+(?:\.\d+)?\s*(?:mm|millimeters?)\b"));

static METRIC_CM_REGEX: LazyLock<Regex> =
    LazyLock::new(|| ci(r"\b\d+(?:\.\d+)?\s*(?:cm|centimeters?)\b"));

static METRIC_M_REGEX: LazyLock<Regex> =
    LazyLock::new(|| ci(r"\b\d+(?:\.\d+)?\s*(?:m|meters?)\b"));

static BRACKETED_METRIC_REGEX: LazyLock<Regex> =
    LazyLock::new(|| ci(r"\[\d+(?:\.\d+)?\s*(?:mm|cm|m)\]"));

static FAHRENHEIT_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"-?\d+(?:\.\d+)?\s*°?F\b").unwrap());

static CELSIUS_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"-?\d+(?:\.\d+)?\s*°?C\b").unwrap());

static PAIRING_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    ci(r#"(\d+(?:\s*-\s*\d+/\d+)?)\s*(?:inches|inch|in|")\s*\[(\d+(?:\.\d+)?)\s*(mm|cm)\]"#)
});

// Alternation order matters: a mixed fraction must win over its pieces
static NUMBER_NOTATION_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\b(?:(\d+\s*-\s*\d+/\d+)|(\d+/\d+)|(\d+\.\d+)|(\d+\s*-\s*\d+))\b").unwrap()
});

const MEASUREMENT_WORDS: &[&str] = &[
    "inch",
    "inches",
    "mm",
    "millimeter",
    "cm",
    "centimeter",
    "diameter",
    "length",
    "width",
    "height",
    "clearance",
    "gap",
    "spacing",
    "distance",
    "thickness",
    "depth",
    "size",
];

/// Tallies of measurement occurrences per unit.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct UnitTally {
    pub inches: usize,
    pub feet: usize,
    pub millimeters: usize,
    pub centimeters: usize,
    pub meters: usize,
    /// Metric values written as `[38.1mm]` next to an imperial value.
    pub bracketed_metric: usize,
}

impl UnitTally {
    pub fn count(text: &str) -> Self {
        Self {
            inches: IMPERIAL_INCH_REGEX.find_iter(text).count(),
            feet: IMPERIAL_FOOT_REGEX.find_iter(text).count(),
            millimeters: METRIC_MM_REGEX.find_iter(text).count(),
            centimeters: METRIC_CM_REGEX.find_iter(text).count(),
            meters: METRIC_M_REGEX.find_iter(text).count(),
            bracketed_metric: BRACKETED_METRIC_REGEX.find_iter(text).count(),
        }
    }

    pub fn imperial(&self) -> usize {
        self.inches + self.feet
    }

    pub fn metric(&self) -> usize {
        self.millimeters + self.centimeters + self.meters
    }

    pub fn standalone_metric(&self) -> usize {
        self.metric().saturating_sub(self.bracketed_metric)
    }
}

/// Imperial and metric values mixed without bracket pairing.
pub fn check_unit_consistency(text: &str) -> Vec<Finding> {
    let tally = UnitTally::count(text);
    if tally.imperial() == 0 || tally.metric() == 0 || tally.standalone_metric() == 0 {
        return Vec::new();
    }

    vec![
        Finding::new(
            Severity::Warning,
            "consistency",
            format!(
                "Mixed unit systems detected: {} imperial units and {} metric units",
                tally.imperial(),
                tally.metric()
            ),
            "Document",
        )
        .with_suggestion(
            "Use imperial as primary with metric in brackets [25.4mm] or standardize on one system",
        )
        .with_confidence(0.8),
    ]
}

/// Both Fahrenheit and Celsius values present.
pub fn check_temperature_consistency(text: &str) -> Vec<Finding> {
    let fahrenheit = FAHRENHEIT_REGEX.find_iter(text).count();
    let celsius = CELSIUS_REGEX.find_iter(text).count();
    if fahrenheit == 0 || celsius == 0 {
        return Vec::new();
    }

    vec![
        Finding::new(
            Severity::Info,
            "consistency",
            format!(
                "Mixed temperature units: {} Fahrenheit, {} Celsius",
                fahrenheit, celsius
            ),
            "Temperature references",
        )
        .with_suggestion(
            "Consider standardizing on one temperature scale or clearly indicate conversions",
        )
        .with_confidence(0.7),
    ]
}

/// Bracketed metric conversions with more than one decimal place.
pub fn check_pairing_precision(text: &str) -> Vec<Finding> {
    PAIRING_REGEX
        .captures_iter(text)
        .filter_map(|caps| {
            let whole = caps.get(0)?;
            let metric = caps.get(2)?.as_str();
            let unit = caps.get(3)?.as_str().to_lowercase();
            if decimal_places(metric) <= 1 {
                return None;
            }
            let rounded: f64 = metric.parse().ok()?;
            Some(
                Finding::new(
                    Severity::Info,
                    "precision",
                    format!(
                        "Metric conversion has excessive precision: '[{}{}]'",
                        metric, unit
                    ),
                    format!("Conversion: {}", whole.as_str()),
                )
                .with_suggestion(format!("Round to 1 decimal place: [{:.1}{}]", rounded, unit))
                .with_confidence(0.8),
            )
        })
        .collect()
}

/// How a number is written.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum NotationStyle {
    /// `1-1/2`
    MixedFraction,
    /// `3/4`
    SimpleFraction,
    /// `1.5`
    Decimal,
    /// `1-2`, usually a typo for a mixed fraction
    DashNotation,
}

impl fmt::Display for NotationStyle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::MixedFraction => "mixed_fraction",
            Self::SimpleFraction => "simple_fraction",
            Self::Decimal => "decimal",
            Self::DashNotation => "dash_notation",
        };
        write!(f, "{}", s)
    }
}

fn looks_like_measurement(text: &str, start: usize, end: usize) -> bool {
    let mut from = start.saturating_sub(20);
    while !text.is_char_boundary(from) {
        from -= 1;
    }
    let mut to = (end + 20).min(text.len());
    while !text.is_char_boundary(to) {
        to += 1;
    }
    let window = text[from..to].to_lowercase();
    MEASUREMENT_WORDS.iter().any(|w| window.contains(w))
}

/// Notation styles used by measurement-looking numbers, in style order.
pub fn notation_styles(text: &str) -> (usize, BTreeSet<NotationStyle>) {
    let mut count = 0;
    let mut styles = BTreeSet::new();

    for caps in NUMBER_NOTATION_REGEX.captures_iter(text) {
        let Some(whole) = caps.get(0) else { continue };
        if !looks_like_measurement(text, whole.start(), whole.end())
            || is_exception(exception_window(text, whole.range()))
        {
            continue;
        }
        let style = if caps.get(1).is_some() {
            NotationStyle::MixedFraction
        } else if caps.get(2).is_some() {
            NotationStyle::SimpleFraction
        } else if caps.get(3).is_some() {
            NotationStyle::Decimal
        } else {
            NotationStyle::DashNotation
        };
        count += 1;
        styles.insert(style);
    }

    (count, styles)
}

/// More than one notation style used for measurements.
pub fn check_fraction_styles(text: &str) -> Vec<Finding> {
    let (count, styles) = notation_styles(text);
    if count < 2 || styles.len() < 2 {
        return Vec::new();
    }

    let names: Vec<String> = styles.iter().map(ToString::to_string).collect();
    vec![
        Finding::new(
            Severity::Info,
            "consistency",
            format!("Mixed fraction notation styles used: {}", names.join(", ")),
            "Throughout document",
        )
        .with_suggestion("Standardize on one fraction notation style (preferably 1-1/2 format)")
        .with_confidence(0.7),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    // =========================================
    // Unit system tests
    // =========================================

    #[test]
    fn test_unit_tally_counts() {
        let tally = UnitTally::count("Use 2\" screws, a 1-1/2\" bit, 10 ft cable and 38.1mm spacer");
        assert_eq!(tally.inches, 2);
        assert_eq!(tally.feet, 1);
        assert_eq!(tally.millimeters, 1);
        assert_eq!(tally.imperial(), 3);
        assert_eq!(tally.metric(), 1);
    }

    #[test]
    fn test_mm_is_not_counted_as_meters() {
        let tally = UnitTally::count("A 25mm hole and a 2 m run");
        assert_eq!(tally.millimeters, 1);
        assert_eq!(tally.meters, 1);
    }

    #[test]
    fn test_mixed_systems_flagged() {
        let findings = check_unit_consistency("Drill a 1/2\" hole then a 12mm hole.");
        assert_eq!(findings.len(), 1);
        assert_eq!(findings[0].severity(), Severity::Warning);
        assert!(findings[0]
            .description()
            .contains("1 imperial units and 1 metric units"));
    }

    #[test]
    fn test_bracketed_pairing_not_flagged() {
        let text = "Backset 1-1/2\" [38.1mm] and depth 2\" [50.8mm]";
        assert!(check_unit_consistency(text).is_empty());
    }

    #[test]
    fn test_single_system_not_flagged() {
        assert!(check_unit_consistency("Use 12mm and 25 mm anchors").is_empty());
        assert!(check_unit_consistency("Use 1/2\" and 3/4\" anchors").is_empty());
    }

    // =========================================
    // Temperature tests
    // =========================================

    #[test]
    fn test_mixed_temperature_units() {
        let findings = check_temperature_consistency("Store at 70°F. Operate at 0 to 49°C.");
        assert_eq!(findings.len(), 1);
        assert_eq!(findings[0].severity(), Severity::Info);
        assert_eq!(findings[0].confidence(), 0.7);
        assert!(findings[0].description().contains("1 Fahrenheit, 1 Celsius"));
    }

    #[test]
    fn test_single_temperature_scale() {
        assert!(check_temperature_consistency("Store at 70°F, run at 120°F").is_empty());
    }

    // =========================================
    // Pairing precision tests
    // =========================================

    #[test]
    fn test_pairing_precision_flags_two_places() {
        let findings = check_pairing_precision("Backset 1-1/2\" [38.10mm]");
        assert_eq!(findings.len(), 1);
        assert_eq!(findings[0].category(), "precision");
        assert_eq!(findings[0].suggestion(), Some("Round to 1 decimal place: [38.1mm]"));
    }

    #[test]
    fn test_pairing_precision_one_place_ok() {
        assert!(check_pairing_precision("Backset 1-1/2\" [38.1mm] and 2 inch [51mm]").is_empty());
    }

    // =========================================
    // Notation style tests
    // =========================================

    #[test]
    fn test_notation_styles_mixed_fraction_is_one_style() {
        let (count, styles) = notation_styles("Backset 1-1/2 inch, depth 2-3/4 inch");
        assert_eq!(count, 2);
        assert_eq!(styles.len(), 1);
        assert!(styles.contains(&NotationStyle::MixedFraction));
    }

    #[test]
    fn test_fraction_styles_flagged_when_mixed() {
        let findings = check_fraction_styles("Backset 1-1/2 inch, depth 2.75 inch");
        assert_eq!(findings.len(), 1);
        assert!(findings[0]
            .description()
            .contains("mixed_fraction, decimal"));
    }

    #[test]
    fn test_fraction_styles_ignore_non_measurements() {
        assert!(check_fraction_styles("Firmware 2.5 released 1-1/2 years ago").is_empty());
        assert!(check_fraction_styles("Input 12-24 VDC, hole depth 3/4 inch, width 1/2 inch").is_empty());
    }
}
