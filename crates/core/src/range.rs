//! Reference-range parsing and result classification.
//!
//! Lab results arrive with their reference range as free text (`"3.5 - 5.3"`, `">60"`,
//! `"<200"`). Classification never fails: anything that cannot be parsed, on either the value
//! or the range side, classifies as [`RangeClass::Unknown`], which renders like a normal result.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Outcome of classifying a value against a reference range.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RangeClass {
    Normal,
    Abnormal,
    Unknown,
}

impl RangeClass {
    /// Whether default styling should treat this outcome as normal.
    ///
    /// `Unknown` is styled as normal; only `Abnormal` is flagged.
    pub fn renders_as_normal(self) -> bool {
        !matches!(self, RangeClass::Abnormal)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            RangeClass::Normal => "normal",
            RangeClass::Abnormal => "abnormal",
            RangeClass::Unknown => "unknown",
        }
    }
}

impl fmt::Display for RangeClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A lab value as received.
///
/// Upstream converters normally emit JSON numbers or strings. Anything else is kept as `Other`
/// and never yields a reading.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum LabValue {
    Number(f64),
    Text(String),
    Other(serde_json::Value),
}

impl LabValue {
    /// Numeric reading of the value, if it has one.
    ///
    /// Text is trimmed before parsing. Non-finite numbers (`NaN`, `inf`) are not readings.
    pub fn as_number(&self) -> Option<f64> {
        match self {
            LabValue::Number(n) => finite(*n),
            LabValue::Text(s) => parse_number(s),
            LabValue::Other(_) => None,
        }
    }

    /// The value as display text.
    pub fn to_text(&self) -> String {
        match self {
            LabValue::Number(n) => n.to_string(),
            LabValue::Text(s) => s.clone(),
            LabValue::Other(serde_json::Value::Null) => String::new(),
            LabValue::Other(other) => {
                crate::value::scalar_text(other).unwrap_or_else(|| other.to_string())
            }
        }
    }
}

impl From<f64> for LabValue {
    fn from(value: f64) -> Self {
        LabValue::Number(value)
    }
}

impl From<&str> for LabValue {
    fn from(value: &str) -> Self {
        LabValue::Text(value.to_string())
    }
}

/// A parsed reference range.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum ReferenceRange {
    /// `"min - max"`, inclusive at both ends.
    Between { min: f64, max: f64 },
    /// `">bound"`, exclusive.
    Above(f64),
    /// `"<bound"`, exclusive.
    Below(f64),
}

impl ReferenceRange {
    /// Parse a textual range. Notations are tried in order and the first one that applies
    /// decides: `" - "` separated bounds, then a `>` prefix, then a `<` prefix.
    ///
    /// Returns `None` for blank text, unrecognised notation or bounds that are not numbers.
    pub fn parse(text: &str) -> Option<Self> {
        let text = text.trim();
        if text.is_empty() {
            return None;
        }

        if let Some((low, high)) = text.split_once(" - ") {
            let min = parse_number(low)?;
            let max = parse_number(high)?;
            return Some(ReferenceRange::Between { min, max });
        }

        if let Some(rest) = text.strip_prefix('>') {
            return parse_number(rest).map(ReferenceRange::Above);
        }

        if let Some(rest) = text.strip_prefix('<') {
            return parse_number(rest).map(ReferenceRange::Below);
        }

        None
    }

    /// Whether `value` lies inside this range.
    pub fn contains(&self, value: f64) -> bool {
        match *self {
            ReferenceRange::Between { min, max } => min <= value && value <= max,
            ReferenceRange::Above(bound) => value > bound,
            ReferenceRange::Below(bound) => value < bound,
        }
    }
}

/// Classify `value` against the textual reference `range`.
pub fn classify(value: &LabValue, range: Option<&str>) -> RangeClass {
    let Some(range) = range.and_then(ReferenceRange::parse) else {
        return RangeClass::Unknown;
    };
    let Some(reading) = value.as_number() else {
        return RangeClass::Unknown;
    };

    if range.contains(reading) {
        RangeClass::Normal
    } else {
        RangeClass::Abnormal
    }
}

fn parse_number(text: &str) -> Option<f64> {
    text.trim().parse::<f64>().ok().and_then(finite)
}

fn finite(n: f64) -> Option<f64> {
    n.is_finite().then_some(n)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn text(s: &str) -> LabValue {
        LabValue::from(s)
    }

    #[test]
    fn between_is_inclusive() {
        let range = Some("3.5 - 5.3");
        assert_eq!(classify(&text("3.5"), range), RangeClass::Normal);
        assert_eq!(classify(&text("4.0"), range), RangeClass::Normal);
        assert_eq!(classify(&text("5.3"), range), RangeClass::Normal);
        assert_eq!(classify(&text("3.4"), range), RangeClass::Abnormal);
        assert_eq!(classify(&text("5.31"), range), RangeClass::Abnormal);
    }

    #[test]
    fn between_agrees_with_bounds_over_a_grid() {
        let bounds = [(0.0, 0.0), (-2.5, 1.0), (3.5, 5.3), (136.0, 145.0)];
        for (a, b) in bounds {
            let range = format!("{a} - {b}");
            let mut v = a - 3.0;
            while v <= b + 3.0 {
                let expected = if a <= v && v <= b {
                    RangeClass::Normal
                } else {
                    RangeClass::Abnormal
                };
                assert_eq!(classify(&LabValue::Number(v), Some(&range)), expected, "{v} in {range}");
                v += 0.25;
            }
        }
    }

    #[test]
    fn open_bounds_are_exclusive() {
        assert_eq!(classify(&text("61"), Some(">60")), RangeClass::Normal);
        assert_eq!(classify(&text("60"), Some(">60")), RangeClass::Abnormal);
        assert_eq!(classify(&text("199"), Some("< 200")), RangeClass::Normal);
        assert_eq!(classify(&text("200"), Some("<200")), RangeClass::Abnormal);
    }

    #[test]
    fn numbers_and_padded_text_are_readings() {
        assert_eq!(classify(&LabValue::Number(138.0), Some("136 - 145")), RangeClass::Normal);
        assert_eq!(classify(&text("  3.9 "), Some(" 3.5 - 5.3 ")), RangeClass::Normal);
    }

    #[test]
    fn malformed_ranges_are_unknown() {
        for range in ["", "   ", "abc", "> ", "<", "3.5 -", "3.5 - x", "a - 5", "3.5-5.3", ">=5", "1 - 2 - 3"] {
            assert_eq!(classify(&text("4.0"), Some(range)), RangeClass::Unknown, "{range:?}");
        }
        assert_eq!(classify(&text("4.0"), None), RangeClass::Unknown);
    }

    #[test]
    fn non_numeric_values_are_unknown() {
        for value in ["", "positive", "NaN", "inf", "4,0"] {
            assert_eq!(classify(&text(value), Some("3.5 - 5.3")), RangeClass::Unknown, "{value:?}");
        }
        assert_eq!(classify(&LabValue::Number(f64::NAN), Some(">1")), RangeClass::Unknown);
    }

    #[test]
    fn other_json_values_are_kept_but_never_readings() {
        let values: Vec<LabValue> = serde_json::from_str(r#"[true, {"v": 4}, [4]]"#).unwrap();
        assert!(values.iter().all(|v| matches!(v, LabValue::Other(_))));
        assert!(values.iter().all(|v| v.as_number().is_none()));
        assert_eq!(values[0].to_text(), "true");
        assert_eq!(values[1].to_text(), r#"{"v":4}"#);
        assert_eq!(classify(&values[0], Some("3.5 - 5.3")), RangeClass::Unknown);
    }

    #[test]
    fn unknown_renders_like_normal() {
        assert!(RangeClass::Normal.renders_as_normal());
        assert!(RangeClass::Unknown.renders_as_normal());
        assert!(!RangeClass::Abnormal.renders_as_normal());
    }

    #[test]
    fn lab_values_deserialise_from_numbers_or_strings() {
        let values: Vec<LabValue> = serde_json::from_str(r#"[4.0, "4.0", "n/a"]"#).unwrap();
        assert_eq!(values[0], LabValue::Number(4.0));
        assert_eq!(values[1].as_number(), Some(4.0));
        assert_eq!(values[2].as_number(), None);
        assert_eq!(serde_json::to_string(&RangeClass::Abnormal).unwrap(), "\"abnormal\"");
    }
}
