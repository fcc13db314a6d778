//! Axis deviation tests for probe-repair certificates

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::core::numeric::NumericInput;

/// Default symmetric deviation limit per axis, in millimetres
pub const DEFAULT_DEVIATION_LIMIT_MM: f64 = 0.0025;

/// Machine axis
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Axis {
    X,
    Y,
    Z,
}

impl Axis {
    pub fn all() -> &'static [Axis] {
        &[Axis::X, Axis::Y, Axis::Z]
    }
}

impl fmt::Display for Axis {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Axis::X => write!(f, "X"),
            Axis::Y => write!(f, "Y"),
            Axis::Z => write!(f, "Z"),
        }
    }
}

impl std::str::FromStr for Axis {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_uppercase().as_str() {
            "X" => Ok(Axis::X),
            "Y" => Ok(Axis::Y),
            "Z" => Ok(Axis::Z),
            _ => Err(format!("Unknown axis: {} (valid: X, Y, Z)", s)),
        }
    }
}

/// Deviation check on one axis
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeviationTest {
    pub axis: Axis,

    /// Deviation in the positive direction (fixed at 0 on Z)
    #[serde(default)]
    pub deviation_positive: NumericInput,

    /// Deviation in the negative direction (stored with its sign)
    #[serde(default)]
    pub deviation_negative: NumericInput,

    /// Upper bound for the positive deviation
    #[serde(default = "default_limit_max")]
    pub limit_max: f64,

    /// Lower bound for the negative deviation
    #[serde(default = "default_limit_min")]
    pub limit_min: f64,

    /// `deviation_positive` was filled from a probing series
    #[serde(default, skip_serializing_if = "is_false")]
    pub positive_from_series: bool,

    /// `deviation_negative` was filled from a probing series
    #[serde(default, skip_serializing_if = "is_false")]
    pub negative_from_series: bool,
}

fn is_false(flag: &bool) -> bool {
    !*flag
}

fn default_limit_max() -> f64 {
    DEFAULT_DEVIATION_LIMIT_MM
}

fn default_limit_min() -> f64 {
    -DEFAULT_DEVIATION_LIMIT_MM
}

impl DeviationTest {
    /// New test with a symmetric limit of `±limit`
    pub fn new(axis: Axis, limit: f64) -> Self {
        let deviation_positive = match axis {
            Axis::Z => NumericInput::Numeric(0.0),
            _ => NumericInput::Blank,
        };
        Self {
            axis,
            deviation_positive,
            deviation_negative: NumericInput::Blank,
            limit_max: limit.abs(),
            limit_min: -limit.abs(),
            positive_from_series: false,
            negative_from_series: false,
        }
    }

    /// Whether the axis is within its limits.
    /// `None` while either deviation is missing or unparseable.
    pub fn within_limits(&self) -> Option<bool> {
        let positive = self.deviation_positive.value()?;
        let negative = self.deviation_negative.value()?;
        Some(positive <= self.limit_max && negative >= self.limit_min)
    }

    /// True only for an axis with complete data outside its limits
    pub fn blocks(&self) -> bool {
        self.within_limits() == Some(false)
    }
}
