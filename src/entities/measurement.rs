//! Measurement row of a dimensional inspection table

use serde::{Deserialize, Serialize};

use crate::conformance::tolerance::{self, MeasurementStatus, ToleranceBand};
use crate::core::numeric::NumericInput;

/// One inspected characteristic.
///
/// The status is derived from the four numeric inputs. Every setter
/// re-derives it, and a status read from a file is discarded and recomputed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "MeasurementRecord")]
pub struct Measurement {
    description: String,
    nominal: NumericInput,
    tolerance_positive: NumericInput,
    tolerance_negative: NumericInput,
    measured: NumericInput,
    status: MeasurementStatus,
}

/// On-disk shape of a row; any stored status is ignored
#[derive(Deserialize)]
struct MeasurementRecord {
    #[serde(default)]
    description: String,
    #[serde(default)]
    nominal: NumericInput,
    #[serde(default)]
    tolerance_positive: NumericInput,
    #[serde(default)]
    tolerance_negative: NumericInput,
    #[serde(default)]
    measured: NumericInput,
}

impl From<MeasurementRecord> for Measurement {
    fn from(record: MeasurementRecord) -> Self {
        let mut row = Self {
            description: record.description,
            nominal: record.nominal,
            tolerance_positive: record.tolerance_positive,
            tolerance_negative: record.tolerance_negative,
            measured: record.measured,
            status: MeasurementStatus::Empty,
        };
        row.refresh();
        row
    }
}

impl Measurement {
    /// New unmeasured row
    pub fn new(
        description: impl Into<String>,
        nominal: impl Into<NumericInput>,
        tolerance_positive: impl Into<NumericInput>,
        tolerance_negative: impl Into<NumericInput>,
    ) -> Self {
        let mut row = Self {
            description: description.into(),
            nominal: nominal.into(),
            tolerance_positive: tolerance_positive.into(),
            tolerance_negative: tolerance_negative.into(),
            measured: NumericInput::Blank,
            status: MeasurementStatus::Empty,
        };
        row.refresh();
        row
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn nominal(&self) -> &NumericInput {
        &self.nominal
    }

    pub fn tolerance_positive(&self) -> &NumericInput {
        &self.tolerance_positive
    }

    pub fn tolerance_negative(&self) -> &NumericInput {
        &self.tolerance_negative
    }

    pub fn measured(&self) -> &NumericInput {
        &self.measured
    }

    pub fn status(&self) -> MeasurementStatus {
        self.status
    }

    /// Acceptance band, when the nominal parses
    pub fn band(&self) -> Option<ToleranceBand> {
        tolerance::band(&self.nominal, &self.tolerance_positive, &self.tolerance_negative)
    }

    pub fn set_description(&mut self, description: impl Into<String>) {
        self.description = description.into();
    }

    pub fn set_nominal(&mut self, nominal: impl Into<NumericInput>) -> MeasurementStatus {
        self.nominal = nominal.into();
        self.refresh()
    }

    pub fn set_tolerances(
        &mut self,
        positive: impl Into<NumericInput>,
        negative: impl Into<NumericInput>,
    ) -> MeasurementStatus {
        self.tolerance_positive = positive.into();
        self.tolerance_negative = negative.into();
        self.refresh()
    }

    pub fn set_measured(&mut self, measured: impl Into<NumericInput>) -> MeasurementStatus {
        self.measured = measured.into();
        self.refresh()
    }

    /// Re-derive the status from the current inputs
    pub fn refresh(&mut self) -> MeasurementStatus {
        self.status = tolerance::evaluate(
            &self.nominal,
            &self.tolerance_positive,
            &self.tolerance_negative,
            &self.measured,
        );
        self.status
    }
}
