//! Money helpers shared by the allocation engine, reporting and the CLI.
//!
//! Every numeric value that can come from a person typing into a form or
//! from an extraction service passes through [`normalize_amount`] (or the
//! [`lenient`] serde adapter built on it) before any arithmetic sees it.

use rust_decimal::prelude::*;
use rust_decimal::RoundingStrategy;

/// Rounds to currency cents, half away from zero.
///
/// Non-finite input collapses to `0.0` so that a bad value never reaches a
/// rendered total as `NaN`.
pub fn round2(value: f64) -> f64 {
    if !value.is_finite() {
        return 0.0;
    }
    Decimal::from_f64(value)
        .map(|d| d.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero))
        .and_then(|d| d.to_f64())
        .unwrap_or(0.0)
}

/// Canonicalises a free-form numeric input.
///
/// Blank, non-numeric, `NaN` and infinite inputs all become `None`.
/// Surrounding whitespace and `,` thousands separators are ignored.
pub fn normalize_amount(raw: &str) -> Option<f64> {
    let cleaned: String = raw.trim().chars().filter(|c| *c != ',').collect();
    if cleaned.is_empty() {
        return None;
    }
    cleaned.parse::<f64>().ok().filter(|v| v.is_finite())
}

/// Drops non-finite values from an already-numeric input.
pub fn finite(value: Option<f64>) -> Option<f64> {
    value.filter(|v| v.is_finite())
}

/// Currency converter: `amount * rate`.
///
/// A rate that is missing, non-finite or not strictly positive is treated
/// as zero rather than rejected.
pub fn convert(amount: f64, rate: f64) -> f64 {
    amount * usable_rate(Some(rate))
}

/// The exchange rate the engine will actually multiply by.
pub fn usable_rate(rate: Option<f64>) -> f64 {
    finite(rate).filter(|r| *r > 0.0).unwrap_or(0.0)
}

/// Supply surcharge per sold item: packaging cost per unit of material times
/// the units of material one item consumes.
pub fn supply_cost_per_item(cost_per_unit: f64, units_per_item: f64) -> f64 {
    let cost = finite(Some(cost_per_unit)).unwrap_or(0.0).max(0.0);
    let units = finite(Some(units_per_item)).unwrap_or(0.0).max(0.0);
    cost * units
}

/// Serde adapter for optional amounts that may arrive as a number, a numeric
/// string, a blank string or `null`.
pub mod lenient {
    use serde::{Deserialize, Deserializer, Serializer};

    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Number(f64),
        Text(String),
        Flag(bool),
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw: Option<Raw> = Option::deserialize(deserializer)?;
        Ok(match raw {
            Some(Raw::Number(n)) => super::finite(Some(n)),
            Some(Raw::Text(s)) => super::normalize_amount(&s),
            Some(Raw::Flag(_)) | None => None,
        })
    }

    pub fn serialize<S>(value: &Option<f64>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match value {
            Some(v) => serializer.serialize_f64(*v),
            None => serializer.serialize_none(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[test]
    fn rounds_half_away_from_zero() {
        assert_eq!(round2(2905.0), 2905.0);
        assert_eq!(round2(0.125), 0.13);
        assert_eq!(round2(-0.125), -0.13);
        assert_eq!(round2(1.004), 1.0);
        assert_eq!(round2(f64::NAN), 0.0);
        assert_eq!(round2(f64::INFINITY), 0.0);
    }

    #[test]
    fn normalizes_blank_and_garbage_to_none() {
        assert_eq!(normalize_amount(""), None);
        assert_eq!(normalize_amount("   "), None);
        assert_eq!(normalize_amount("abc"), None);
        assert_eq!(normalize_amount("NaN"), None);
        assert_eq!(normalize_amount("inf"), None);
        assert_eq!(normalize_amount(" 42.5 "), Some(42.5));
        assert_eq!(normalize_amount("1,250"), Some(1250.0));
    }

    #[test]
    fn converter_treats_bad_rates_as_zero() {
        assert_eq!(convert(10.0, 58.0), 580.0);
        assert_eq!(convert(10.0, 0.0), 0.0);
        assert_eq!(convert(10.0, -3.0), 0.0);
        assert_eq!(convert(10.0, f64::NAN), 0.0);
    }

    #[test]
    fn supply_surcharge_is_cost_times_units() {
        assert_eq!(supply_cost_per_item(2.5, 2.0), 5.0);
        assert_eq!(supply_cost_per_item(-1.0, 2.0), 0.0);
        assert_eq!(supply_cost_per_item(3.0, f64::NAN), 0.0);
    }

    #[derive(Deserialize)]
    struct Form {
        #[serde(default, with = "lenient")]
        amount: Option<f64>,
    }

    #[test]
    fn lenient_accepts_every_blank_shape() {
        let cases = [
            ("amount: 12.5", Some(12.5)),
            ("amount: \"7\"", Some(7.0)),
            ("amount: \"\"", None),
            ("amount: ~", None),
            ("amount: \"n/a\"", None),
            ("{}", None),
        ];
        for (yaml, expected) in cases {
            let form: Form = serde_yaml::from_str(yaml).unwrap();
            assert_eq!(form.amount, expected, "input: {yaml}");
        }
    }
}
