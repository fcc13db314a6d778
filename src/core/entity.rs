//! Entity trait - common interface for persisted records

use chrono::{DateTime, Utc};
use serde::{de::DeserializeOwned, Serialize};

use crate::conformance::Verdict;
use crate::core::identity::EntityId;

/// Common trait for all MCT records
pub trait Entity: Serialize + DeserializeOwned {
    /// The record type prefix (e.g., "RPT", "CERT")
    const PREFIX: &'static str;

    fn id(&self) -> &EntityId;

    fn title(&self) -> &str;

    /// Client the record was produced for
    fn client(&self) -> &str;

    /// The verdict as last derived by `refresh`
    fn verdict(&self) -> Verdict;

    fn created(&self) -> DateTime<Utc>;

    fn author(&self) -> &str;

    /// Re-derive every computed field from the record's inputs
    fn refresh(&mut self);
}
