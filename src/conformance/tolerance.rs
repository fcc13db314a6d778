//! Tolerance evaluation for a single dimensional measurement

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::core::numeric::NumericInput;

/// Classification of a measured value against its tolerance band
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum MeasurementStatus {
    /// Within tolerance
    #[serde(rename = "OK")]
    Ok,
    /// Outside tolerance
    #[serde(rename = "NOK")]
    Nok,
    /// Not yet measured, or inputs do not parse
    #[default]
    #[serde(rename = "")]
    Empty,
}

impl MeasurementStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            MeasurementStatus::Ok => "OK",
            MeasurementStatus::Nok => "NOK",
            MeasurementStatus::Empty => "",
        }
    }

    /// True when an evaluation produced a verdict
    pub fn is_determined(&self) -> bool {
        !matches!(self, MeasurementStatus::Empty)
    }
}

impl fmt::Display for MeasurementStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Inclusive acceptance band around a nominal value
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ToleranceBand {
    pub lower: f64,
    pub upper: f64,
}

impl ToleranceBand {
    /// Build a band from a nominal and tolerance magnitudes.
    /// Signs on the tolerances are ignored.
    pub fn new(nominal: f64, plus_tol: f64, minus_tol: f64) -> Self {
        Self {
            lower: nominal - minus_tol.abs(),
            upper: nominal + plus_tol.abs(),
        }
    }

    pub fn contains(&self, value: f64) -> bool {
        self.lower <= value && value <= self.upper
    }

    pub fn width(&self) -> f64 {
        self.upper - self.lower
    }
}

impl fmt::Display for ToleranceBand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{:.4}, {:.4}]", self.lower, self.upper)
    }
}

/// Acceptance band for the given inputs, if the nominal parses.
/// Blank or unparseable tolerances contribute no slack.
pub fn band(
    nominal: &NumericInput,
    tolerance_positive: &NumericInput,
    tolerance_negative: &NumericInput,
) -> Option<ToleranceBand> {
    let nominal = nominal.value()?;
    Some(ToleranceBand::new(
        nominal,
        tolerance_positive.value_or(0.0),
        tolerance_negative.value_or(0.0),
    ))
}

/// Classify a measured value against nominal and tolerances.
///
/// Returns [`MeasurementStatus::Empty`] when either the nominal or the
/// measured value is blank or not a number. Both band edges are inclusive.
pub fn evaluate(
    nominal: &NumericInput,
    tolerance_positive: &NumericInput,
    tolerance_negative: &NumericInput,
    measured: &NumericInput,
) -> MeasurementStatus {
    let Some(measured) = measured.value() else {
        return MeasurementStatus::Empty;
    };
    let Some(band) = band(nominal, tolerance_positive, tolerance_negative) else {
        return MeasurementStatus::Empty;
    };

    if band.contains(measured) {
        MeasurementStatus::Ok
    } else {
        MeasurementStatus::Nok
    }
}
