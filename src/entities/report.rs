//! Report entity - dimensional inspection / calibration report

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::conformance::aggregate::{standard_verdict, Verdict};
use crate::conformance::tolerance::MeasurementStatus;
use crate::core::entity::Entity;
use crate::core::identity::{EntityId, EntityPrefix};
use crate::core::numeric::NumericInput;
use crate::entities::measurement::Measurement;
use crate::entities::RecordError;

/// Row counts by status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ReportSummary {
    pub ok: usize,
    pub nok: usize,
    pub pending: usize,
}

impl ReportSummary {
    pub fn total(&self) -> usize {
        self.ok + self.nok + self.pending
    }
}

/// A dimensional inspection report
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Report {
    /// Unique identifier (RPT-...)
    pub id: EntityId,

    pub title: String,

    /// Client the inspection was carried out for
    #[serde(default)]
    pub client: String,

    /// Part or instrument inspected
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub instrument: Option<String>,

    /// Measurement table
    #[serde(default)]
    pub rows: Vec<Measurement>,

    /// Derived overall verdict
    #[serde(default)]
    pub verdict: Verdict,

    /// Derived row counts
    #[serde(default)]
    pub summary: ReportSummary,

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

impl Entity for Report {
    const PREFIX: &'static str = "RPT";

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
        self.verdict
    }

    fn created(&self) -> DateTime<Utc> {
        self.created
    }

    fn author(&self) -> &str {
        &self.author
    }

    fn refresh(&mut self) {
        for row in self.rows.iter_mut() {
            row.refresh();
        }
        self.summary = self.compute_summary();
        self.verdict = standard_verdict(self.rows.iter().map(Measurement::status));
        tracing::debug!(id = %self.id, verdict = %self.verdict, rows = self.rows.len(), "report refreshed");
    }
}

impl Report {
    pub fn new(
        title: impl Into<String>,
        client: impl Into<String>,
        author: impl Into<String>,
    ) -> Self {
        Self {
            id: EntityId::new(EntityPrefix::Rpt),
            title: title.into(),
            client: client.into(),
            instrument: None,
            rows: Vec::new(),
            verdict: Verdict::default(),
            summary: ReportSummary::default(),
            notes: None,
            tags: Vec::new(),
            created: Utc::now(),
            author: author.into(),
            entity_revision: 1,
        }
    }

    /// Append a row and re-derive the verdict. Returns the 1-based row number.
    pub fn add_row(&mut self, row: Measurement) -> usize {
        self.rows.push(row);
        self.refresh();
        self.rows.len()
    }

    /// Set the measured value of a row (1-based) and re-derive
    pub fn set_measured(
        &mut self,
        row: usize,
        measured: impl Into<NumericInput>,
    ) -> Result<MeasurementStatus, RecordError> {
        let status = self.row_mut(row)?.set_measured(measured);
        self.refresh();
        Ok(status)
    }

    /// Change a row's tolerances (1-based) and re-derive
    pub fn set_tolerances(
        &mut self,
        row: usize,
        positive: impl Into<NumericInput>,
        negative: impl Into<NumericInput>,
    ) -> Result<MeasurementStatus, RecordError> {
        let status = self.row_mut(row)?.set_tolerances(positive, negative);
        self.refresh();
        Ok(status)
    }

    /// Change a row's nominal (1-based) and re-derive
    pub fn set_nominal(
        &mut self,
        row: usize,
        nominal: impl Into<NumericInput>,
    ) -> Result<MeasurementStatus, RecordError> {
        let status = self.row_mut(row)?.set_nominal(nominal);
        self.refresh();
        Ok(status)
    }

    pub fn set_description(
        &mut self,
        row: usize,
        description: impl Into<String>,
    ) -> Result<(), RecordError> {
        self.row_mut(row)?.set_description(description);
        Ok(())
    }

    /// Remove a row (1-based)
    pub fn remove_row(&mut self, row: usize) -> Result<Measurement, RecordError> {
        self.row_mut(row)?;
        let removed = self.rows.remove(row - 1);
        self.refresh();
        Ok(removed)
    }

    fn row_mut(&mut self, row: usize) -> Result<&mut Measurement, RecordError> {
        let len = self.rows.len();
        row.checked_sub(1)
            .and_then(|i| self.rows.get_mut(i))
            .ok_or(RecordError::RowOutOfRange { row, len })
    }

    fn compute_summary(&self) -> ReportSummary {
        self.rows
            .iter()
            .fold(ReportSummary::default(), |mut acc, row| {
                match row.status() {
                    MeasurementStatus::Ok => acc.ok += 1,
                    MeasurementStatus::Nok => acc.nok += 1,
                    MeasurementStatus::Empty => acc.pending += 1,
                }
                acc
            })
    }

    /// Every row has a verdict
    pub fn is_complete(&self) -> bool {
        !self.rows.is_empty() && self.summary.pending == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_report() -> Report {
        let mut report = Report::new("Housing inspection", "Acme Tooling", "Inspector");
        report.add_row(Measurement::new("Bore", 20.0, 0.05, 0.05));
        report.add_row(Measurement::new("Depth", 8.0, 0.1, 0.0));
        report
    }

    #[test]
    fn test_report_creation() {
        let report = Report::new("Title", "Client", "Author");
        assert!(report.id.to_string().starts_with("RPT-"));
        assert_eq!(report.verdict, Verdict::Approved);
        assert_eq!(Report::PREFIX, "RPT");
        assert_eq!(report.entity_revision, 1);
    }

    #[test]
    fn test_one_nok_row_rejects() {
        let mut report = sample_report();
        report.set_measured(1, 20.025).unwrap();
        report.set_measured(2, 8.05).unwrap();
        assert_eq!(report.verdict, Verdict::Approved);
        assert!(report.is_complete());

        report.set_measured(1, 20.08).unwrap();
        assert_eq!(report.verdict, Verdict::Rejected);
        assert_eq!(report.summary, ReportSummary { ok: 1, nok: 1, pending: 0 });
    }

    #[test]
    fn test_pending_rows_do_not_reject() {
        let mut report = sample_report();
        report.set_measured(2, 8.0).unwrap();
        assert_eq!(report.verdict, Verdict::Approved);
        assert_eq!(report.summary.pending, 1);
        assert!(!report.is_complete());
    }

    #[test]
    fn test_row_numbers_are_one_based() {
        let mut report = sample_report();
        assert!(matches!(
            report.set_measured(0, 1.0),
            Err(RecordError::RowOutOfRange { row: 0, len: 2 })
        ));
        assert!(matches!(
            report.set_measured(3, 1.0),
            Err(RecordError::RowOutOfRange { row: 3, len: 2 })
        ));
    }

    #[test]
    fn test_remove_row_rederives() {
        let mut report = sample_report();
        report.set_measured(1, 25.0).unwrap();
        assert_eq!(report.verdict, Verdict::Rejected);

        let removed = report.remove_row(1).unwrap();
        assert_eq!(removed.description(), "Bore");
        assert_eq!(report.verdict, Verdict::Approved);
        assert_eq!(report.rows.len(), 1);
    }

    #[test]
    fn test_tightened_tolerance_rejects() {
        let mut report = sample_report();
        report.set_measured(2, 8.08).unwrap();
        assert_eq!(report.verdict, Verdict::Approved);

        report.set_tolerances(2, 0.05, 0.05).unwrap();
        assert_eq!(report.verdict, Verdict::Rejected);
    }

    #[test]
    fn test_nominal_and_description_edits() {
        let mut report = sample_report();
        report.set_measured(1, 20.5).unwrap();
        assert_eq!(report.verdict, Verdict::Rejected);

        let status = report.set_nominal(1, 20.5).unwrap();
        assert_eq!(status, MeasurementStatus::Ok);
        assert_eq!(report.verdict, Verdict::Approved);

        report.set_description(2, "Pocket depth").unwrap();
        assert_eq!(report.rows[1].description(), "Pocket depth");
        assert!(report.set_description(3, "Missing").is_err());
    }

    #[test]
    fn test_roundtrip_rederives_after_refresh() {
        let mut report = sample_report();
        report.set_measured(1, 20.08).unwrap();

        let mut yaml = serde_yml::to_string(&report).unwrap();
        // A hand edit that claims approval without fixing the row
        yaml = yaml.replace("verdict: REJECTED", "verdict: APPROVED");

        let mut parsed: Report = serde_yml::from_str(&yaml).unwrap();
        assert_eq!(parsed.rows[0].status(), MeasurementStatus::Nok);
        parsed.refresh();
        assert_eq!(parsed.verdict, Verdict::Rejected);
        assert_eq!(parsed.title, "Housing inspection");
    }
}
