//! Record types that own the engine inputs and their derived results

pub mod certificate;
pub mod measurement;
pub mod report;

pub use certificate::{Certificate, ProbeInfo, ProbeSeries};
pub use measurement::Measurement;
pub use report::{Report, ReportSummary};

use thiserror::Error;

use crate::conformance::{Axis, Direction};

/// Errors raised when editing a record
#[derive(Debug, Error, PartialEq)]
pub enum RecordError {
    #[error("row {row} does not exist (report has {len} rows, numbered from 1)")]
    RowOutOfRange { row: usize, len: usize },

    #[error("{direction} series has {count} readings; at most {max} are allowed")]
    TooManyPoints {
        direction: Direction,
        count: usize,
        max: usize,
    },

    #[error("invalid limits for axis {axis}: max {limit_max}, min {limit_min}")]
    InvalidLimits {
        axis: Axis,
        limit_max: f64,
        limit_min: f64,
    },
}
