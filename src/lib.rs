//! MCT: Metrology Conformance Toolkit
//!
//! Tolerance, repeatability and conformance evaluation for dimensional
//! inspection reports and touch-probe repair certificates, kept as plain
//! YAML records.

pub mod cli;
pub mod conformance;
pub mod core;
pub mod entities;
pub mod schema;
pub mod yaml;
