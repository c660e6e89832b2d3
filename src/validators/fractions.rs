//! Fraction and decimal conversion for imperial measurements.
//!
//! Imperial values are written as sixteenths (`1-1/2"`, `3/4"`); metric
//! values as decimals with one place (`38.1mm`).

use crate::errors::FractionError;

/// The fifteen non-zero sixteenths, with their reduced notation.
const SIXTEENTHS: [(f64, &str); 15] = [
    (0.0625, "1/16"),
    (0.125, "1/8"),
    (0.1875, "3/16"),
    (0.25, "1/4"),
    (0.3125, "5/16"),
    (0.375, "3/8"),
    (0.4375, "7/16"),
    (0.5, "1/2"),
    (0.5625, "9/16"),
    (0.625, "5/8"),
    (0.6875, "11/16"),
    (0.75, "3/4"),
    (0.8125, "13/16"),
    (0.875, "7/8"),
    (0.9375, "15/16"),
];

/// Fractional remainders at or below this are dropped.
const ROUNDING_THRESHOLD: f64 = 0.03;

/// Convert a decimal to the nearest sixteenth in `W-N/D` notation.
///
/// # Examples
///
/// ```
/// use redline::validators::fractions::decimal_to_fraction;
///
/// assert_eq!(decimal_to_fraction(1.5), "1-1/2");
/// assert_eq!(decimal_to_fraction(0.75), "3/4");
/// assert_eq!(decimal_to_fraction(2.01), "2");
/// ```
pub fn decimal_to_fraction(value: f64) -> String {
    let whole = value.trunc();
    let remainder = value - whole;

    let mut closest = SIXTEENTHS[0].1;
    let mut min_diff = f64::INFINITY;
    for (decimal, text) in SIXTEENTHS {
        let diff = (remainder - decimal).abs();
        if diff < min_diff {
            min_diff = diff;
            closest = text;
        }
    }

    let whole = whole as i64;
    if remainder <= ROUNDING_THRESHOLD {
        whole.to_string()
    } else if whole > 0 {
        format!("{}-{}", whole, closest)
    } else {
        closest.to_string()
    }
}

/// Parse `W-N/D`, `N/D` or a plain integer into a decimal value.
///
/// # Examples
///
/// ```
/// use redline::validators::fractions::fraction_to_decimal;
///
/// assert_eq!(fraction_to_decimal("1-1/2").unwrap(), 1.5);
/// assert_eq!(fraction_to_decimal("3/4").unwrap(), 0.75);
/// assert!(fraction_to_decimal("1/0").is_err());
/// ```
pub fn fraction_to_decimal(text: &str) -> Result<f64, FractionError> {
    let (whole_part, frac_part) = match text.split_once('-') {
        Some((whole, frac)) => (Some(whole.trim()), frac.trim()),
        None => (None, text.trim()),
    };

    let parse = |part: &str| -> Result<u64, FractionError> {
        part.trim()
            .parse::<u64>()
            .map_err(|_| FractionError::InvalidNumber {
                text: text.to_string(),
                part: part.to_string(),
            })
    };

    let whole = match whole_part {
        Some(w) => parse(w)? as f64,
        None => 0.0,
    };

    let fraction = match frac_part.split_once('/') {
        Some((num, den)) => {
            let numerator = parse(num)?;
            let denominator = parse(den)?;
            if denominator == 0 {
                return Err(FractionError::ZeroDenominator(text.to_string()));
            }
            numerator as f64 / denominator as f64
        }
        // "2" alone is a whole number, "2-" is not
        None if whole_part.is_none() => parse(frac_part)? as f64,
        None => {
            return Err(FractionError::InvalidNumber {
                text: text.to_string(),
                part: frac_part.to_string(),
            });
        }
    };

    Ok(whole + fraction)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decimal_to_fraction_mixed() {
        assert_eq!(decimal_to_fraction(2.25), "2-1/4");
        assert_eq!(decimal_to_fraction(3.75), "3-3/4");
        assert_eq!(decimal_to_fraction(1.0625), "1-1/16");
    }

    #[test]
    fn test_decimal_to_fraction_picks_nearest() {
        // 0.3 sits between 5/16 (0.3125) and 1/4 (0.25)
        assert_eq!(decimal_to_fraction(0.3), "5/16");
        assert_eq!(decimal_to_fraction(1.99), "1-15/16");
    }

    #[test]
    fn test_decimal_to_fraction_small_remainder_dropped() {
        assert_eq!(decimal_to_fraction(4.0), "4");
        assert_eq!(decimal_to_fraction(4.02), "4");
        assert_eq!(decimal_to_fraction(0.02), "0");
    }

    #[test]
    fn test_fraction_to_decimal_forms() {
        assert_eq!(fraction_to_decimal("2-1/4").unwrap(), 2.25);
        assert_eq!(fraction_to_decimal("25 - 1/2").unwrap(), 25.5);
        assert_eq!(fraction_to_decimal("7/8").unwrap(), 0.875);
        assert_eq!(fraction_to_decimal("12").unwrap(), 12.0);
    }

    #[test]
    fn test_fraction_to_decimal_errors() {
        assert!(matches!(
            fraction_to_decimal("25-/2"),
            Err(FractionError::InvalidNumber { .. })
        ));
        assert!(matches!(
            fraction_to_decimal("3/0"),
            Err(FractionError::ZeroDenominator(_))
        ));
        assert!(fraction_to_decimal("2-").is_err());
        assert!(fraction_to_decimal("abc").is_err());
    }

    #[test]
    fn test_sixteenths_survive_round_trip() {
        for k in 1..16u32 {
            let x = f64::from(k) / 16.0;
            for whole in [0.0, 1.0, 3.0] {
                let value = whole + x;
                let back = fraction_to_decimal(&decimal_to_fraction(value)).unwrap();
                assert!(
                    (back - value).abs() <= 1.0 / 32.0,
                    "{} round-tripped to {}",
                    value,
                    back
                );
            }
        }
    }
}
