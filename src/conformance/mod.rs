//! Conformance engine - tolerance, repeatability and verdict evaluation
//!
//! Everything in this module is a pure function over caller-owned data.
//! Blank or unparseable input never errors; it yields an undetermined
//! result that does not block approval.

pub mod aggregate;
pub mod checklist;
pub mod deviation;
pub mod repeatability;
pub mod tolerance;

pub use aggregate::{probe_repair_outcome, standard_verdict, ProbeRepairOutcome, Verdict};
pub use checklist::{ChecklistItem, CommunicationChannels, InspectionChecklist};
pub use deviation::{Axis, DeviationTest, DEFAULT_DEVIATION_LIMIT_MM};
pub use repeatability::{analyze, Direction, RepeatabilityStats, REPEATABILITY_LIMIT_MM};
pub use tolerance::{evaluate, MeasurementStatus, ToleranceBand};
