//! Report-level conformance verdicts
//!
//! Two policies exist. Standard dimensional reports are rejected by any
//! out-of-tolerance row. Probe-repair certificates combine three
//! sub-verdicts: axis deviations, repeatability and the inspection checklist.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::conformance::checklist::InspectionChecklist;
use crate::conformance::deviation::DeviationTest;
use crate::conformance::repeatability::REPEATABILITY_LIMIT_MM;
use crate::conformance::tolerance::MeasurementStatus;

/// Overall verdict for a report
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Verdict {
    #[default]
    Approved,
    Rejected,
}

impl Verdict {
    pub fn from_pass(pass: bool) -> Self {
        if pass {
            Verdict::Approved
        } else {
            Verdict::Rejected
        }
    }

    pub fn is_approved(&self) -> bool {
        matches!(self, Verdict::Approved)
    }
}

impl fmt::Display for Verdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Verdict::Approved => write!(f, "APPROVED"),
            Verdict::Rejected => write!(f, "REJECTED"),
        }
    }
}

impl std::str::FromStr for Verdict {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_uppercase().as_str() {
            "APPROVED" => Ok(Verdict::Approved),
            "REJECTED" => Ok(Verdict::Rejected),
            _ => Err(format!("Unknown verdict: {}", s)),
        }
    }
}

/// Verdict for a dimensional report from its row statuses.
///
/// Rejected when any row is NOK. Rows without a verdict never reject, so a
/// report with no completed rows is approved.
pub fn standard_verdict<I>(statuses: I) -> Verdict
where
    I: IntoIterator<Item = MeasurementStatus>,
{
    let rejected = statuses
        .into_iter()
        .any(|status| status == MeasurementStatus::Nok);
    Verdict::from_pass(!rejected)
}

/// Sub-verdict A: no axis with complete data is outside its limits
pub fn deviation_check(tests: &[DeviationTest]) -> bool {
    tests.iter().all(|test| !test.blocks())
}

/// Sub-verdict B: every computed expanded deviation is within the
/// repeatability limit. Zero values are treated as not computed, and with no
/// computed values the check passes.
pub fn repeatability_check<I>(expanded_deviations: I) -> bool
where
    I: IntoIterator<Item = f64>,
{
    expanded_deviations
        .into_iter()
        .filter(|d| *d > 0.0)
        .all(|d| d <= REPEATABILITY_LIMIT_MM)
}

/// Sub-verdicts and overall verdict of a probe-repair certificate
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ProbeRepairOutcome {
    /// Axis deviations within limits
    pub deviation: bool,

    /// Repeatability within the fixed limit
    pub repeatability: bool,

    /// Inspection checklist passed
    pub checklist: bool,

    pub verdict: Verdict,
}

/// Evaluate a probe-repair certificate
pub fn probe_repair_outcome<I>(
    deviation_tests: &[DeviationTest],
    expanded_deviations: I,
    checklist: &InspectionChecklist,
) -> ProbeRepairOutcome
where
    I: IntoIterator<Item = f64>,
{
    let deviation = deviation_check(deviation_tests);
    let repeatability = repeatability_check(expanded_deviations);
    let checklist = checklist.passes();

    let outcome = ProbeRepairOutcome {
        deviation,
        repeatability,
        checklist,
        verdict: Verdict::from_pass(deviation && repeatability && checklist),
    };
    tracing::debug!(
        deviation,
        repeatability,
        checklist,
        verdict = %outcome.verdict,
        "probe repair outcome"
    );
    outcome
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::conformance::checklist::CommunicationChannels;
    use crate::conformance::deviation::{Axis, DEFAULT_DEVIATION_LIMIT_MM};
    use crate::conformance::tolerance::evaluate;
    use crate::core::numeric::NumericInput;

    fn axes() -> Vec<DeviationTest> {
        Axis::all()
            .iter()
            .map(|axis| DeviationTest::new(*axis, DEFAULT_DEVIATION_LIMIT_MM))
            .collect()
    }

    #[test]
    fn test_standard_any_nok_rejects() {
        let statuses = [
            MeasurementStatus::Ok,
            MeasurementStatus::Nok,
            MeasurementStatus::Ok,
        ];
        assert_eq!(standard_verdict(statuses), Verdict::Rejected);
    }

    #[test]
    fn test_standard_all_ok_approves() {
        let statuses = [MeasurementStatus::Ok, MeasurementStatus::Ok];
        assert_eq!(standard_verdict(statuses), Verdict::Approved);
    }

    #[test]
    fn test_standard_empty_rows_do_not_reject() {
        assert_eq!(
            standard_verdict([MeasurementStatus::Empty, MeasurementStatus::Ok]),
            Verdict::Approved
        );
        assert_eq!(standard_verdict(Vec::<MeasurementStatus>::new()), Verdict::Approved);
    }

    #[test]
    fn test_single_row_scenario() {
        let nominal = NumericInput::from(20.0);
        let tol = NumericInput::from(0.05);

        let ok = evaluate(&nominal, &tol, &tol, &20.025.into());
        assert_eq!(ok, MeasurementStatus::Ok);

        let nok = evaluate(&nominal, &tol, &tol, &20.08.into());
        assert_eq!(nok, MeasurementStatus::Nok);
        assert_eq!(standard_verdict([nok]), Verdict::Rejected);
    }

    #[test]
    fn test_repeatability_vacuous_pass() {
        assert!(repeatability_check([0.0, 0.0, 0.0, 0.0, 0.0]));
        assert!(repeatability_check(Vec::<f64>::new()));
    }

    #[test]
    fn test_repeatability_limit_inclusive() {
        assert!(repeatability_check([0.005, 0.001, 0.0]));
        assert!(!repeatability_check([0.0051, 0.001]));
    }

    #[test]
    fn test_deviation_check_ignores_incomplete_axes() {
        let mut tests = axes();
        tests[0].deviation_positive = 1.0.into();
        assert!(deviation_check(&tests));

        tests[0].deviation_negative = (-0.001).into();
        assert!(!deviation_check(&tests));
    }

    #[test]
    fn test_probe_repair_all_pass() {
        let mut tests = axes();
        for t in tests.iter_mut() {
            t.deviation_positive = 0.001.into();
            t.deviation_negative = (-0.001).into();
        }
        let outcome = probe_repair_outcome(
            &tests,
            [0.002, 0.003, 0.001, 0.002, 0.004],
            &InspectionChecklist::all_passing(),
        );
        assert!(outcome.deviation && outcome.repeatability && outcome.checklist);
        assert_eq!(outcome.verdict, Verdict::Approved);
    }

    #[test]
    fn test_probe_repair_communication_or() {
        let mut checklist = InspectionChecklist::all_passing();
        checklist.communication = CommunicationChannels {
            radio: false,
            optical: true,
            cable: false,
        };
        let outcome = probe_repair_outcome(&axes(), Vec::<f64>::new(), &checklist);
        assert!(outcome.checklist);
        assert_eq!(outcome.verdict, Verdict::Approved);

        checklist.communication.optical = false;
        let outcome = probe_repair_outcome(&axes(), Vec::<f64>::new(), &checklist);
        assert!(!outcome.checklist);
        assert_eq!(outcome.verdict, Verdict::Rejected);
    }

    #[test]
    fn test_probe_repair_single_failing_subverdict_rejects() {
        let outcome = probe_repair_outcome(
            &axes(),
            [0.002, 0.006],
            &InspectionChecklist::all_passing(),
        );
        assert!(outcome.deviation);
        assert!(!outcome.repeatability);
        assert!(outcome.checklist);
        assert_eq!(outcome.verdict, Verdict::Rejected);
    }

    #[test]
    fn test_verdict_serialization() {
        assert_eq!(serde_yml::to_string(&Verdict::Approved).unwrap().trim(), "APPROVED");
        assert_eq!("rejected".parse::<Verdict>().unwrap(), Verdict::Rejected);
    }
}
