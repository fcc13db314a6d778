//! Integration tests for the MCT CLI
//!
//! These tests exercise the CLI commands end-to-end using assert_cmd.

use assert_cmd::Command;
use predicates::prelude::*;
use serde_json::Value;
use std::fs;
use std::path::Path;
use tempfile::TempDir;

/// Helper to get an mct command isolated from the user's environment
fn mct(home: &Path) -> Command {
    let mut cmd = Command::cargo_bin("mct").unwrap();
    cmd.env("HOME", home)
        .env("XDG_CONFIG_HOME", home.join(".config"))
        .env("MCT_AUTHOR", "Test Inspector")
        .env_remove("MCT_LOG")
        .env_remove("MCT_EDITOR");
    cmd
}

/// Helper to create a test project in a temp directory
fn setup_test_project() -> TempDir {
    let tmp = TempDir::new().unwrap();
    mct(tmp.path())
        .current_dir(tmp.path())
        .arg("init")
        .assert()
        .success();
    tmp
}

fn run_in(tmp: &TempDir, args: &[&str]) -> String {
    let output = mct(tmp.path())
        .current_dir(tmp.path())
        .args(args)
        .output()
        .unwrap();
    assert!(
        output.status.success(),
        "mct {:?} failed: {}",
        args,
        String::from_utf8_lossy(&output.stderr)
    );
    String::from_utf8_lossy(&output.stdout).to_string()
}

fn run_json(tmp: &TempDir, args: &[&str]) -> Value {
    let stdout = run_in(tmp, args);
    serde_json::from_str(&stdout).unwrap()
}

/// Create a report and return its ID
fn create_report(tmp: &TempDir, title: &str) -> String {
    run_in(tmp, &["rpt", "new", "--title", title, "--client", "Acme", "-q"])
        .trim()
        .to_string()
}

/// Create a certificate and return its ID
fn create_certificate(tmp: &TempDir, extra: &[&str]) -> String {
    let mut args = vec!["cert", "new", "--title", "Probe repair", "--serial", "SN-100", "-q"];
    args.extend_from_slice(extra);
    run_in(tmp, &args).trim().to_string()
}

const TIGHT: [&str; 5] = ["10.0000", "10.0004", "10.0002", "10.0001", "10.0003"];

// ============================================================================
// CLI Basic Tests
// ============================================================================

#[test]
fn test_help_displays() {
    let tmp = TempDir::new().unwrap();
    mct(tmp.path())
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("probe repair certificates"));
}

#[test]
fn test_version_displays() {
    let tmp = TempDir::new().unwrap();
    mct(tmp.path())
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("mct"));
}

#[test]
fn test_unknown_command_fails() {
    let tmp = TempDir::new().unwrap();
    mct(tmp.path())
        .arg("unknown-command")
        .assert()
        .failure()
        .stderr(predicate::str::contains("error"));
}

#[test]
fn test_completions_generate() {
    let tmp = TempDir::new().unwrap();
    mct(tmp.path())
        .args(["completions", "bash"])
        .assert()
        .success()
        .stdout(predicate::str::contains("mct"));
}

// ============================================================================
// Init Command Tests
// ============================================================================

#[test]
fn test_init_creates_project_structure() {
    let tmp = TempDir::new().unwrap();

    mct(tmp.path())
        .current_dir(tmp.path())
        .arg("init")
        .assert()
        .success()
        .stdout(predicate::str::contains("Initialized"));

    assert!(tmp.path().join(".mct/config.yaml").exists());
    assert!(tmp.path().join("reports").is_dir());
    assert!(tmp.path().join("certificates").is_dir());
}

#[test]
fn test_init_twice_reports_existing_project() {
    let tmp = setup_test_project();

    mct(tmp.path())
        .current_dir(tmp.path())
        .arg("init")
        .assert()
        .success()
        .stdout(predicate::str::contains("already exists"));
}

#[test]
fn test_commands_outside_project_fail() {
    let tmp = TempDir::new().unwrap();

    mct(tmp.path())
        .current_dir(tmp.path())
        .args(["rpt", "list"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("not an MCT project"));
}

// ============================================================================
// Report Command Tests
// ============================================================================

#[test]
fn test_rpt_new_creates_file() {
    let tmp = setup_test_project();
    let id = create_report(&tmp, "Housing inspection");

    assert!(id.starts_with("RPT-"));
    let path = tmp.path().join("reports").join(format!("{}.mct.yaml", id));
    let content = fs::read_to_string(path).unwrap();
    assert!(content.contains("title: \"Housing inspection\""));
    assert!(content.contains("author: \"Test Inspector\""));
}

#[test]
fn test_rpt_list_empty_project() {
    let tmp = setup_test_project();

    mct(tmp.path())
        .current_dir(tmp.path())
        .args(["rpt", "list"])
        .assert()
        .success()
        .stdout(predicate::str::contains("No reports found"));
}

#[test]
fn test_rpt_out_of_tolerance_row_rejects_report() {
    let tmp = setup_test_project();
    let id = create_report(&tmp, "Flange");

    run_in(
        &tmp,
        &[
            "rpt", "row", &id, "-d", "Bore", "--nominal", "20", "--plus", "0.05", "--minus",
            "0.05", "--measured", "20.025",
        ],
    );
    run_in(
        &tmp,
        &["rpt", "row", &id, "-d", "Depth", "--nominal", "8", "--plus", "0.1", "--minus", "0"],
    );

    let evaluation = run_json(&tmp, &["rpt", "evaluate", &id, "-f", "json"]);
    assert_eq!(evaluation["verdict"], "APPROVED");
    assert_eq!(evaluation["summary"]["ok"], 1);
    assert_eq!(evaluation["summary"]["pending"], 1);

    let status = run_in(&tmp, &["rpt", "measure", &id, "2", "8.2", "-q"]);
    assert_eq!(status.trim(), "NOK");

    let evaluation = run_json(&tmp, &["rpt", "evaluate", &id, "-f", "json"]);
    assert_eq!(evaluation["verdict"], "REJECTED");
    assert_eq!(evaluation["summary"]["nok"], 1);

    mct(tmp.path())
        .current_dir(tmp.path())
        .args(["rpt", "evaluate", &id, "--strict"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("REJECTED"));

    // Clearing the offending reading brings the verdict back
    run_in(&tmp, &["rpt", "measure", &id, "2"]);
    let evaluation = run_json(&tmp, &["rpt", "evaluate", &id, "-f", "json"]);
    assert_eq!(evaluation["verdict"], "APPROVED");
}

#[test]
fn test_rpt_measure_unknown_row_fails() {
    let tmp = setup_test_project();
    let id = create_report(&tmp, "Empty");

    mct(tmp.path())
        .current_dir(tmp.path())
        .args(["rpt", "measure", &id, "5", "1.0"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("row 5 does not exist"));
}

#[test]
fn test_rpt_row_remove() {
    let tmp = setup_test_project();
    let id = create_report(&tmp, "Removal");
    run_in(
        &tmp,
        &[
            "rpt", "row", &id, "-d", "Slot", "--nominal", "5", "--plus", "0.01", "--minus",
            "0.01", "--measured", "6",
        ],
    );

    run_in(&tmp, &["rpt", "row", &id, "--remove", "1"]);
    let report = run_json(&tmp, &["rpt", "show", &id, "-f", "json"]);
    assert_eq!(report["rows"].as_array().unwrap().len(), 0);
    assert_eq!(report["verdict"], "APPROVED");
}

#[test]
fn test_rpt_update_changes_tolerances() {
    let tmp = setup_test_project();
    let id = create_report(&tmp, "Shaft");
    run_in(
        &tmp,
        &[
            "rpt", "row", &id, "-d", "Diameter", "--nominal", "20", "--plus", "0.05",
            "--minus", "0.05", "--measured", "20.08",
        ],
    );

    let status = run_in(&tmp, &["rpt", "update", &id, "1", "--plus", "0.1", "--minus", "0.1", "-q"]);
    assert_eq!(status.trim(), "OK");

    let evaluation = run_json(&tmp, &["rpt", "evaluate", &id, "-f", "json"]);
    assert_eq!(evaluation["verdict"], "APPROVED");
}

#[test]
fn test_rpt_update_keeps_unspecified_tolerance() {
    let tmp = setup_test_project();
    let id = create_report(&tmp, "Pin");
    run_in(
        &tmp,
        &[
            "rpt", "row", &id, "-d", "Diameter", "--nominal", "20", "--plus", "0.05",
            "--minus", "0.05", "--measured", "19.97",
        ],
    );

    let status = run_in(&tmp, &["rpt", "update", &id, "1", "--plus", "0.1", "-q"]);
    assert_eq!(status.trim(), "OK");

    let report = run_json(&tmp, &["rpt", "show", &id, "-f", "json"]);
    assert_eq!(report["rows"][0]["tolerance_positive"], 0.1);
    assert_eq!(report["rows"][0]["tolerance_negative"], 0.05);
    assert_eq!(report["rows"][0]["status"], "OK");
}

#[test]
fn test_rpt_update_nominal_and_description() {
    let tmp = setup_test_project();
    let id = create_report(&tmp, "Plate");
    run_in(
        &tmp,
        &[
            "rpt", "row", &id, "-d", "Width", "--nominal", "12", "--plus", "0.1", "--minus",
            "0.1", "--measured", "12.5",
        ],
    );

    run_in(&tmp, &["rpt", "update", &id, "1", "-d", "Overall width", "--nominal", "12.5"]);
    let report = run_json(&tmp, &["rpt", "show", &id, "-f", "json"]);
    assert_eq!(report["rows"][0]["description"], "Overall width");
    assert_eq!(report["rows"][0]["tolerance_negative"], 0.1);
    assert_eq!(report["verdict"], "APPROVED");

    // Nothing to change is a usage error
    mct(tmp.path())
        .current_dir(tmp.path())
        .args(["rpt", "update", &id, "1"])
        .assert()
        .failure();
}

#[test]
fn test_rpt_show_by_partial_id() {
    let tmp = setup_test_project();
    let id = create_report(&tmp, "Partial lookup");
    run_in(
        &tmp,
        &["rpt", "row", &id, "-d", "Chamfer", "--nominal", "1", "--plus", "0.2", "--minus", "0.2"],
    );

    mct(tmp.path())
        .current_dir(tmp.path())
        .args(["rpt", "show", &id[..12]])
        .assert()
        .success()
        .stdout(predicate::str::contains("Partial lookup"))
        .stdout(predicate::str::contains("Chamfer"));
}

#[test]
fn test_rpt_show_not_found() {
    let tmp = setup_test_project();

    mct(tmp.path())
        .current_dir(tmp.path())
        .args(["rpt", "show", "RPT-NOPE"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("no record found"));
}

#[test]
fn test_rpt_list_filters_and_formats() {
    let tmp = setup_test_project();
    let good = create_report(&tmp, "Good part");
    let bad = create_report(&tmp, "Bad part");
    run_in(
        &tmp,
        &[
            "rpt", "row", &bad, "-d", "Length", "--nominal", "50", "--plus", "0.1", "--minus",
            "0.1", "--measured", "51",
        ],
    );

    let count = run_in(&tmp, &["rpt", "list", "--count"]);
    assert_eq!(count.trim(), "2");

    let rejected = run_json(&tmp, &["rpt", "list", "--verdict", "rejected", "-f", "json"]);
    let rejected = rejected.as_array().unwrap();
    assert_eq!(rejected.len(), 1);
    assert_eq!(rejected[0]["id"], bad.as_str());

    let ids = run_in(&tmp, &["rpt", "list", "--verdict", "approved", "-f", "id"]);
    assert_eq!(ids.trim(), good);

    mct(tmp.path())
        .current_dir(tmp.path())
        .args(["rpt", "list", "-f", "csv"])
        .assert()
        .success()
        .stdout(predicate::str::starts_with("id,title,client,rows,nok,verdict,created"));
}

#[test]
fn test_rpt_stale_status_is_recomputed() {
    let tmp = setup_test_project();
    let path = tmp
        .path()
        .join("reports/RPT-01HC2JB7SMQX7RS1Y0GFKBHPTD.mct.yaml");
    fs::write(
        &path,
        r#"id: RPT-01HC2JB7SMQX7RS1Y0GFKBHPTD
title: Hand edited
rows:
  - description: Width
    nominal: 12
    tolerance_positive: 0.1
    tolerance_negative: 0.1
    measured: 12.5
    status: OK
verdict: APPROVED
created: 2024-01-01T00:00:00Z
author: Someone
"#,
    )
    .unwrap();

    let report = run_json(&tmp, &["rpt", "show", "RPT-01HC2JB7", "-f", "json"]);
    assert_eq!(report["rows"][0]["status"], "NOK");
    assert_eq!(report["verdict"], "REJECTED");
}

#[test]
fn test_rpt_invalid_yaml_reports_diagnostic() {
    let tmp = setup_test_project();
    let path = tmp
        .path()
        .join("reports/RPT-01HC2JB7SMQX7RS1Y0GFKBHPTD.mct.yaml");
    fs::write(&path, "id: RPT-01HC2JB7SMQX7RS1Y0GFKBHPTD\nrows: [unclosed\n").unwrap();

    mct(tmp.path())
        .current_dir(tmp.path())
        .args(["rpt", "show", "RPT-01HC2JB7"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("invalid record"));
}

#[test]
fn test_project_flag_from_other_directory() {
    let tmp = setup_test_project();
    create_report(&tmp, "Remote");
    let elsewhere = TempDir::new().unwrap();

    mct(tmp.path())
        .current_dir(elsewhere.path())
        .args(["--project", tmp.path().to_str().unwrap(), "rpt", "list", "--count"])
        .assert()
        .success()
        .stdout(predicate::str::contains("1"));
}

// ============================================================================
// Certificate Command Tests
// ============================================================================

#[test]
fn test_cert_new_is_rejected_until_inspected() {
    let tmp = setup_test_project();
    let id = create_certificate(&tmp, &[]);
    assert!(id.starts_with("CERT-"));

    let evaluation = run_json(&tmp, &["cert", "evaluate", &id, "-f", "json"]);
    assert_eq!(evaluation["outcome"]["deviation"], true);
    assert_eq!(evaluation["outcome"]["repeatability"], true);
    assert_eq!(evaluation["outcome"]["checklist"], false);
    assert_eq!(evaluation["outcome"]["verdict"], "REJECTED");
    assert_eq!(evaluation["failing_gates"].as_array().unwrap().len(), 6);
}

#[test]
fn test_cert_repair_workflow() {
    let tmp = setup_test_project();
    let id = create_certificate(&tmp, &[]);

    let mut args = vec!["cert", "record", id.as_str(), "+X"];
    args.extend_from_slice(&TIGHT);
    run_in(&tmp, &args);
    run_in(&tmp, &["cert", "check", &id, "all", "true"]);

    let evaluation = run_json(&tmp, &["cert", "evaluate", &id, "-f", "json"]);
    assert_eq!(evaluation["outcome"]["verdict"], "APPROVED");

    let cert = run_json(&tmp, &["cert", "show", &id, "-f", "json"]);
    let x_positive = cert["deviation_tests"][0]["deviation_positive"].as_f64().unwrap();
    assert!(x_positive > 0.0 && x_positive < 0.001);

    // A scattered series fails repeatability and the axis limit
    run_in(&tmp, &["cert", "record", &id, "+Y", "10.0", "10.01", "9.99", "10.005"]);
    let evaluation = run_json(&tmp, &["cert", "evaluate", &id, "-f", "json"]);
    assert_eq!(evaluation["outcome"]["repeatability"], false);
    assert_eq!(evaluation["outcome"]["deviation"], false);
    assert_eq!(evaluation["outcome"]["verdict"], "REJECTED");

    mct(tmp.path())
        .current_dir(tmp.path())
        .args(["cert", "evaluate", &id, "--strict"])
        .assert()
        .failure();
}

#[test]
fn test_cert_communication_needs_one_channel() {
    let tmp = setup_test_project();
    let id = create_certificate(&tmp, &[]);
    run_in(&tmp, &["cert", "check", &id, "all", "true"]);
    run_in(&tmp, &["cert", "check", &id, "radio", "false"]);
    run_in(&tmp, &["cert", "check", &id, "cable", "false"]);

    let evaluation = run_json(&tmp, &["cert", "evaluate", &id, "-f", "json"]);
    assert_eq!(evaluation["outcome"]["checklist"], true);

    run_in(&tmp, &["cert", "check", &id, "optical", "fail"]);
    let evaluation = run_json(&tmp, &["cert", "evaluate", &id, "-f", "json"]);
    assert_eq!(evaluation["outcome"]["checklist"], false);
    assert_eq!(evaluation["failing_gates"][0], "communication");
}

#[test]
fn test_cert_check_unknown_item_fails() {
    let tmp = setup_test_project();
    let id = create_certificate(&tmp, &[]);

    mct(tmp.path())
        .current_dir(tmp.path())
        .args(["cert", "check", &id, "paint", "true"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Unknown checklist item"));
}

#[test]
fn test_cert_record_too_many_points_fails() {
    let tmp = setup_test_project();
    let id = create_certificate(&tmp, &[]);
    let mut args = vec!["cert", "record", id.as_str(), "+X"];
    args.extend(std::iter::repeat("1.0").take(11));

    mct(tmp.path())
        .current_dir(tmp.path())
        .args(&args)
        .assert()
        .failure()
        .stderr(predicate::str::contains("at most 10"));
}

#[test]
fn test_cert_limit_tightens_deviation() {
    let tmp = setup_test_project();
    let id = create_certificate(&tmp, &[]);
    let mut args = vec!["cert", "record", id.as_str(), "+X"];
    args.extend_from_slice(&TIGHT);
    run_in(&tmp, &args);

    let evaluation = run_json(&tmp, &["cert", "evaluate", &id, "-f", "json"]);
    assert_eq!(evaluation["outcome"]["deviation"], true);

    run_in(&tmp, &["cert", "limit", &id, "X", "--max", "0.0001"]);
    let evaluation = run_json(&tmp, &["cert", "evaluate", &id, "-f", "json"]);
    assert_eq!(evaluation["outcome"]["deviation"], false);
}

#[test]
fn test_cert_new_uses_configured_limit() {
    let tmp = setup_test_project();
    run_in(&tmp, &["config", "set", "deviation_limit", "0.004"]);

    let limit = run_in(&tmp, &["config", "show", "deviation_limit"]);
    assert_eq!(limit.trim(), "0.004");

    let id = create_certificate(&tmp, &[]);
    let cert = run_json(&tmp, &["cert", "show", &id, "-f", "json"]);
    assert_eq!(cert["deviation_tests"][0]["limit_max"], 0.004);
    assert_eq!(cert["deviation_tests"][0]["limit_min"], -0.004);

    let id = create_certificate(&tmp, &["--limit", "0.001"]);
    let cert = run_json(&tmp, &["cert", "show", &id, "-f", "json"]);
    assert_eq!(cert["deviation_tests"][2]["limit_max"], 0.001);
}

#[test]
fn test_cert_list_by_serial() {
    let tmp = setup_test_project();
    create_certificate(&tmp, &[]);

    let count = run_in(&tmp, &["cert", "list", "--serial", "SN-100", "--count"]);
    assert_eq!(count.trim(), "1");
    let count = run_in(&tmp, &["cert", "list", "--serial", "SN-999", "--count"]);
    assert_eq!(count.trim(), "0");
}

// ============================================================================
// Eval Command Tests
// ============================================================================

#[test]
fn test_eval_tolerance() {
    let tmp = TempDir::new().unwrap();
    let base = ["eval", "tolerance", "--nominal", "20", "--plus", "0.05", "--minus", "0.05"];

    let mut args = base.to_vec();
    args.extend(["--measured", "20.025", "-f", "json"]);
    let result = run_json(&tmp, &args);
    assert_eq!(result["status"], "OK");
    assert!(result["band"]["lower"].as_f64().unwrap() < 20.0);

    let mut args = base.to_vec();
    args.extend(["--measured", "20.08", "-q"]);
    assert_eq!(run_in(&tmp, &args).trim(), "NOK");
}

#[test]
fn test_eval_tolerance_without_nominal_is_empty() {
    let tmp = TempDir::new().unwrap();
    let result = run_json(
        &tmp,
        &["eval", "tolerance", "--measured", "5", "--plus", "1", "-f", "json"],
    );
    assert_eq!(result["status"], "");
    assert!(result["band"].is_null());
}

#[test]
fn test_eval_repeatability() {
    let tmp = TempDir::new().unwrap();
    let mut args = vec!["eval", "repeatability"];
    args.extend_from_slice(&TIGHT);
    args.extend(["-f", "json"]);

    let result = run_json(&tmp, &args);
    assert_eq!(result["samples"], 5);
    assert_eq!(result["within_limit"], true);
    let spread = result["expanded_deviation"].as_f64().unwrap();
    assert!((spread - 0.000316).abs() < 1e-6);
}

#[test]
fn test_eval_repeatability_single_reading() {
    let tmp = TempDir::new().unwrap();
    let result = run_json(&tmp, &["eval", "repeatability", "7.5", "-f", "json"]);
    assert_eq!(result["samples"], 1);
    assert_eq!(result["expanded_deviation"], 0.0);
    assert!(result["within_limit"].is_null());
}

// ============================================================================
// Config Command Tests
// ============================================================================

#[test]
fn test_config_rejects_bad_values() {
    let tmp = setup_test_project();

    mct(tmp.path())
        .current_dir(tmp.path())
        .args(["config", "set", "deviation_limit", "wide"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("must be a number"));

    mct(tmp.path())
        .current_dir(tmp.path())
        .args(["config", "set", "colour", "blue"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Unknown config key"));
}

#[test]
fn test_config_keys_lists_deviation_limit() {
    let tmp = TempDir::new().unwrap();
    mct(tmp.path())
        .args(["config", "keys"])
        .assert()
        .success()
        .stdout(predicate::str::contains("deviation_limit"));
}
