//! Repeatability statistics for repeated touch-probe readings
//!
//! Each probing direction is analyzed on its own. The expanded deviation is
//! twice the sample standard deviation (n - 1 denominator) and is the figure
//! compared against [`REPEATABILITY_LIMIT_MM`].

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::core::numeric::{round_to, NumericInput};

/// Acceptance limit for the expanded deviation, in millimetres (5 µm)
pub const REPEATABILITY_LIMIT_MM: f64 = 0.005;

/// Maximum number of readings in one series
pub const MAX_POINTS: usize = 10;

/// Minimum number of valid readings for a computed result
pub const MIN_POINTS: usize = 2;

/// Decimal places kept on mean and expanded deviation
pub const RESULT_PLACES: i32 = 6;

/// Probing direction of a repeatability series
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Direction {
    #[serde(rename = "+X")]
    PlusX,
    #[serde(rename = "-X")]
    MinusX,
    #[serde(rename = "+Y")]
    PlusY,
    #[serde(rename = "-Y")]
    MinusY,
    #[serde(rename = "-Z")]
    MinusZ,
}

impl Direction {
    pub fn as_str(&self) -> &'static str {
        match self {
            Direction::PlusX => "+X",
            Direction::MinusX => "-X",
            Direction::PlusY => "+Y",
            Direction::MinusY => "-Y",
            Direction::MinusZ => "-Z",
        }
    }

    /// All directions probed on a repair certificate, in report order
    pub fn all() -> &'static [Direction] {
        &[
            Direction::PlusX,
            Direction::MinusX,
            Direction::PlusY,
            Direction::MinusY,
            Direction::MinusZ,
        ]
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for Direction {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_uppercase().as_str() {
            "+X" | "X+" | "PX" => Ok(Direction::PlusX),
            "-X" | "X-" | "MX" => Ok(Direction::MinusX),
            "+Y" | "Y+" | "PY" => Ok(Direction::PlusY),
            "-Y" | "Y-" | "MY" => Ok(Direction::MinusY),
            "-Z" | "Z-" | "MZ" | "Z" => Ok(Direction::MinusZ),
            _ => Err(format!(
                "Unknown direction: {} (valid: +X, -X, +Y, -Y, -Z)",
                s
            )),
        }
    }
}

/// Result of analyzing one series
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct RepeatabilityStats {
    /// Mean of the valid readings (0 with insufficient data)
    pub mean: f64,

    /// Twice the sample standard deviation (0 with insufficient data)
    pub expanded_deviation: f64,

    /// Number of valid readings that went into the result
    #[serde(default)]
    pub samples: usize,
}

impl RepeatabilityStats {
    /// At least [`MIN_POINTS`] readings were available
    pub fn has_sufficient_data(&self) -> bool {
        self.samples >= MIN_POINTS
    }

    /// Expanded deviation within the fixed acceptance limit.
    /// `None` when there is not enough data for a verdict.
    pub fn within_limit(&self) -> Option<bool> {
        self.has_sufficient_data()
            .then(|| self.expanded_deviation <= REPEATABILITY_LIMIT_MM)
    }
}

/// Compute mean and expanded deviation for a series of readings.
///
/// Blank and invalid readings are dropped, and readings past [`MAX_POINTS`]
/// are ignored. With fewer than [`MIN_POINTS`] valid readings both figures
/// are 0.
pub fn analyze(points: &[NumericInput]) -> RepeatabilityStats {
    let values: Vec<f64> = points
        .iter()
        .take(MAX_POINTS)
        .filter_map(NumericInput::value)
        .collect();

    let n = values.len();
    if n < MIN_POINTS {
        tracing::trace!(samples = n, "insufficient readings for repeatability");
        return RepeatabilityStats {
            mean: 0.0,
            expanded_deviation: 0.0,
            samples: n,
        };
    }

    let count = n as f64;
    let mean = values.iter().sum::<f64>() / count;
    let variance = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / (count - 1.0);
    let std_dev = variance.sqrt();

    RepeatabilityStats {
        mean: round_to(mean, RESULT_PLACES),
        expanded_deviation: round_to(2.0 * std_dev, RESULT_PLACES),
        samples: n,
    }
}
