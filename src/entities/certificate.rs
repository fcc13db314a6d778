//! Certificate entity - touch-probe repair certificate
//!
//! A certificate carries five repeatability series (+X, -X, +Y, -Y, -Z),
//! three axis deviation tests and a functional inspection checklist.
//! `refresh` recomputes the series statistics, copies them into the axis
//! tests and re-derives the outcome.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::conformance::aggregate::{probe_repair_outcome, ProbeRepairOutcome, Verdict};
use crate::conformance::checklist::{ChecklistItem, InspectionChecklist};
use crate::conformance::deviation::{Axis, DeviationTest, DEFAULT_DEVIATION_LIMIT_MM};
use crate::conformance::repeatability::{analyze, Direction, RepeatabilityStats, MAX_POINTS};
use crate::core::entity::Entity;
use crate::core::identity::{EntityId, EntityPrefix};
use crate::core::numeric::NumericInput;
use crate::entities::RecordError;

/// Probe identification
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProbeInfo {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub serial_number: Option<String>,
}

/// Repeated readings in one probing direction
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProbeSeries {
    pub direction: Direction,

    #[serde(default)]
    pub points: Vec<NumericInput>,

    /// Derived statistics
    #[serde(default)]
    pub stats: RepeatabilityStats,
}

impl ProbeSeries {
    pub fn new(direction: Direction) -> Self {
        Self {
            direction,
            points: Vec::new(),
            stats: RepeatabilityStats::default(),
        }
    }
}

/// A probe-repair certificate
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Certificate {
    /// Unique identifier (CERT-...)
    pub id: EntityId,

    pub title: String,

    #[serde(default)]
    pub client: String,

    #[serde(default)]
    pub probe: ProbeInfo,

    #[serde(default)]
    pub deviation_tests: Vec<DeviationTest>,

    #[serde(default)]
    pub series: Vec<ProbeSeries>,

    #[serde(default)]
    pub checklist: InspectionChecklist,

    /// Derived sub-verdicts and overall verdict
    #[serde(default)]
    pub outcome: ProbeRepairOutcome,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,

    pub created: DateTime<Utc>,

    pub author: String,

    #[serde(default = "default_revision")]
    pub entity_revision: u32,
}

fn default_revision() -> u32 {
    1
}

impl Entity for Certificate {
    const PREFIX: &'static str = "CERT";

    fn id(&self) -> &EntityId {
        &self.id
    }

    fn title(&self) -> &str {
        &self.title
    }

    fn client(&self) -> &str {
        &self.client
    }

    fn verdict(&self) -> Verdict {
        self.outcome.verdict
    }

    fn created(&self) -> DateTime<Utc> {
        self.created
    }

    fn author(&self) -> &str {
        &self.author
    }

    fn refresh(&mut self) {
        self.ensure_layout();

        for series in self.series.iter_mut() {
            series.stats = analyze(&series.points);
        }
        self.populate_deviations();

        self.outcome = probe_repair_outcome(
            &self.deviation_tests,
            self.series.iter().map(|s| s.stats.expanded_deviation),
            &self.checklist,
        );
    }
}

impl Certificate {
    /// New certificate with empty series and axes limited to `±deviation_limit`
    pub fn new(
        title: impl Into<String>,
        client: impl Into<String>,
        author: impl Into<String>,
        deviation_limit: f64,
    ) -> Self {
        let mut cert = Self {
            id: EntityId::new(EntityPrefix::Cert),
            title: title.into(),
            client: client.into(),
            probe: ProbeInfo::default(),
            deviation_tests: Axis::all()
                .iter()
                .map(|axis| DeviationTest::new(*axis, deviation_limit))
                .collect(),
            series: Direction::all().iter().map(|d| ProbeSeries::new(*d)).collect(),
            checklist: InspectionChecklist::default(),
            outcome: ProbeRepairOutcome::default(),
            notes: None,
            tags: Vec::new(),
            created: Utc::now(),
            author: author.into(),
            entity_revision: 1,
        };
        cert.refresh();
        cert
    }

    /// Replace the readings of one direction and re-derive
    pub fn record_series(
        &mut self,
        direction: Direction,
        points: Vec<NumericInput>,
    ) -> Result<RepeatabilityStats, RecordError> {
        if points.len() > MAX_POINTS {
            return Err(RecordError::TooManyPoints {
                direction,
                count: points.len(),
                max: MAX_POINTS,
            });
        }
        self.ensure_layout();
        if let Some(series) = self.series.iter_mut().find(|s| s.direction == direction) {
            series.points = points;
        }
        self.refresh();
        Ok(self.stats(direction))
    }

    /// Set a checklist gate or communication channel and re-derive
    pub fn set_check(&mut self, item: ChecklistItem, value: bool) {
        self.checklist.set(item, value);
        self.refresh();
    }

    /// Change the limits of an axis and re-derive
    pub fn set_axis_limits(&mut self, axis: Axis, limit_max: f64, limit_min: f64) -> Result<(), RecordError> {
        if !limit_max.is_finite() || !limit_min.is_finite() || limit_min > limit_max {
            return Err(RecordError::InvalidLimits {
                axis,
                limit_max,
                limit_min,
            });
        }
        self.ensure_layout();
        if let Some(test) = self.deviation_tests.iter_mut().find(|t| t.axis == axis) {
            test.limit_max = limit_max;
            test.limit_min = limit_min;
        }
        self.refresh();
        Ok(())
    }

    /// Statistics of one direction as last derived
    pub fn stats(&self, direction: Direction) -> RepeatabilityStats {
        self.series
            .iter()
            .find(|s| s.direction == direction)
            .map(|s| s.stats)
            .unwrap_or_default()
    }

    pub fn deviation_test(&self, axis: Axis) -> Option<&DeviationTest> {
        self.deviation_tests.iter().find(|t| t.axis == axis)
    }

    /// Restore missing axes/directions and keep them in report order
    fn ensure_layout(&mut self) {
        let limit = self
            .deviation_tests
            .first()
            .map(|t| t.limit_max)
            .unwrap_or(DEFAULT_DEVIATION_LIMIT_MM);

        for axis in Axis::all() {
            if !self.deviation_tests.iter().any(|t| t.axis == *axis) {
                self.deviation_tests.push(DeviationTest::new(*axis, limit));
            }
        }
        for direction in Direction::all() {
            if !self.series.iter().any(|s| s.direction == *direction) {
                self.series.push(ProbeSeries::new(*direction));
            }
        }
        self.deviation_tests.sort_by_key(|t| t.axis);
        self.deviation_tests.dedup_by_key(|t| t.axis);
        self.series.sort_by_key(|s| s.direction);
        self.series.dedup_by_key(|s| s.direction);
    }

    /// Copy series results into the axis tests. A series without enough
    /// readings leaves an operator-entered value in place and clears a value
    /// it filled in earlier. Negative-direction deviations are stored negated
    /// so they compare against `limit_min`.
    fn populate_deviations(&mut self) {
        let pairs = [
            (Axis::X, Some(Direction::PlusX), Direction::MinusX),
            (Axis::Y, Some(Direction::PlusY), Direction::MinusY),
            (Axis::Z, None, Direction::MinusZ),
        ];

        for (axis, positive, negative) in pairs {
            let positive_stats = positive.map(|d| self.stats(d));
            let negative_stats = self.stats(negative);

            let Some(test) = self.deviation_tests.iter_mut().find(|t| t.axis == axis) else {
                continue;
            };

            match positive_stats {
                Some(stats) if stats.has_sufficient_data() => {
                    test.deviation_positive = NumericInput::Numeric(stats.expanded_deviation);
                    test.positive_from_series = true;
                }
                Some(_) if test.positive_from_series => {
                    test.deviation_positive = NumericInput::Blank;
                    test.positive_from_series = false;
                }
                Some(_) => {}
                None => {
                    test.deviation_positive = NumericInput::Numeric(0.0);
                    test.positive_from_series = false;
                }
            }

            if negative_stats.has_sufficient_data() {
                // 0.0 - x keeps a zero deviation positive
                test.deviation_negative =
                    NumericInput::Numeric(0.0 - negative_stats.expanded_deviation);
                test.negative_from_series = true;
            } else if test.negative_from_series {
                tracing::debug!(axis = %axis, "series lost its readings, clearing deviation");
                test.deviation_negative = NumericInput::Blank;
                test.negative_from_series = false;
            }
        }
    }
}
