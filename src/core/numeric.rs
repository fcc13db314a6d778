//! Numeric field input parsed at the record boundary
//!
//! Operators type values into free-form fields, so every numeric field in a
//! record is either a number, left blank, or something that is not a number.
//! Blank and invalid input carry no verdict anywhere in the engine.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

/// A numeric-like value as entered by an operator
#[derive(Debug, Clone, PartialEq, Default)]
pub enum NumericInput {
    /// A finite number
    Numeric(f64),
    /// Empty field
    #[default]
    Blank,
    /// Text that does not parse as a finite number (kept verbatim)
    Invalid(String),
}

impl NumericInput {
    /// Parse operator text, trimming surrounding whitespace
    pub fn parse(text: &str) -> Self {
        let trimmed = text.trim();
        if trimmed.is_empty() {
            return NumericInput::Blank;
        }
        match trimmed.parse::<f64>() {
            Ok(v) if v.is_finite() => NumericInput::Numeric(v),
            _ => NumericInput::Invalid(trimmed.to_string()),
        }
    }

    /// The parsed number, if any
    pub fn value(&self) -> Option<f64> {
        match self {
            NumericInput::Numeric(v) => Some(*v),
            _ => None,
        }
    }

    /// The parsed number, or `fallback` for blank/invalid input
    pub fn value_or(&self, fallback: f64) -> f64 {
        self.value().unwrap_or(fallback)
    }

    pub fn is_blank(&self) -> bool {
        matches!(self, NumericInput::Blank)
    }
}

impl From<f64> for NumericInput {
    fn from(v: f64) -> Self {
        if v.is_finite() {
            NumericInput::Numeric(v)
        } else {
            NumericInput::Invalid(v.to_string())
        }
    }
}

impl From<Option<f64>> for NumericInput {
    fn from(v: Option<f64>) -> Self {
        v.map_or(NumericInput::Blank, NumericInput::from)
    }
}

impl From<&str> for NumericInput {
    fn from(s: &str) -> Self {
        NumericInput::parse(s)
    }
}

impl FromStr for NumericInput {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(NumericInput::parse(s))
    }
}

impl fmt::Display for NumericInput {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NumericInput::Numeric(v) => write!(f, "{}", v),
            NumericInput::Blank => Ok(()),
            NumericInput::Invalid(s) => write!(f, "{}", s),
        }
    }
}

impl Serialize for NumericInput {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match self {
            NumericInput::Numeric(v) => serializer.serialize_f64(*v),
            NumericInput::Blank => serializer.serialize_none(),
            NumericInput::Invalid(s) => serializer.serialize_str(s),
        }
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawInput {
    Number(f64),
    Text(String),
}

impl<'de> Deserialize<'de> for NumericInput {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = Option::<RawInput>::deserialize(deserializer)?;
        Ok(match raw {
            None => NumericInput::Blank,
            Some(RawInput::Number(v)) => NumericInput::from(v),
            Some(RawInput::Text(s)) => NumericInput::parse(&s),
        })
    }
}

/// Round to a fixed number of decimal places
pub fn round_to(value: f64, places: i32) -> f64 {
    let factor = 10f64.powi(places);
    (value * factor).round() / factor
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_numeric() {
        assert_eq!(NumericInput::parse("20.025"), NumericInput::Numeric(20.025));
        assert_eq!(NumericInput::parse("  -0.05 "), NumericInput::Numeric(-0.05));
        assert_eq!(NumericInput::parse("0"), NumericInput::Numeric(0.0));
    }

    #[test]
    fn test_parse_blank_and_invalid() {
        assert_eq!(NumericInput::parse(""), NumericInput::Blank);
        assert_eq!(NumericInput::parse("   "), NumericInput::Blank);
        assert_eq!(
            NumericInput::parse("abc"),
            NumericInput::Invalid("abc".to_string())
        );
        assert!(matches!(NumericInput::parse("NaN"), NumericInput::Invalid(_)));
        assert!(matches!(NumericInput::parse("inf"), NumericInput::Invalid(_)));
    }

    #[test]
    fn test_value_or_fallback() {
        assert_eq!(NumericInput::Blank.value_or(0.0), 0.0);
        assert_eq!(NumericInput::Invalid("x".into()).value_or(1.5), 1.5);
        assert_eq!(NumericInput::Numeric(2.0).value_or(0.0), 2.0);
    }

    #[test]
    fn test_deserialize_number_string_and_null() {
        #[derive(Deserialize)]
        struct Row {
            a: NumericInput,
            b: NumericInput,
            c: NumericInput,
            d: NumericInput,
            #[serde(default)]
            e: NumericInput,
        }

        let row: Row = serde_yml::from_str("a: 10\nb: \"10.05\"\nc: null\nd: n/a\n").unwrap();
        assert_eq!(row.a, NumericInput::Numeric(10.0));
        assert_eq!(row.b, NumericInput::Numeric(10.05));
        assert_eq!(row.c, NumericInput::Blank);
        assert_eq!(row.d, NumericInput::Invalid("n/a".to_string()));
        assert_eq!(row.e, NumericInput::Blank);
    }

    #[test]
    fn test_serialize_keeps_operator_text() {
        let yaml = serde_yml::to_string(&vec![
            NumericInput::Numeric(1.5),
            NumericInput::Blank,
            NumericInput::Invalid("abc".into()),
        ])
        .unwrap();
        assert!(yaml.contains("1.5"));
        assert!(yaml.contains("null"));
        assert!(yaml.contains("abc"));
    }

    #[test]
    fn test_round_to() {
        assert_eq!(round_to(6.0553007081949835, 6), 6.055301);
        assert_eq!(round_to(5.5, 6), 5.5);
    }
}
