//! Shared helper functions for CLI commands
//!
//! Record lookup, loading and saving live here so every command goes
//! through the same refresh-on-load path.

use console::style;
use miette::{IntoDiagnostic, Result};
use std::path::{Path, PathBuf};

use crate::cli::{GlobalOpts, OutputFormat};
use crate::conformance::{MeasurementStatus, Verdict};
use crate::core::entity::Entity;
use crate::core::identity::{EntityId, EntityPrefix};
use crate::core::numeric::NumericInput;
use crate::core::project::Project;
use crate::core::Config;
use crate::yaml::{read_record, write_record};

/// Format an EntityId for display, truncating if too long
///
/// IDs longer than 16 characters are truncated to 13 chars with "..." suffix.
pub fn format_short_id(id: &EntityId) -> String {
    let s = id.to_string();
    if s.len() > 16 {
        format!("{}...", &s[..13])
    } else {
        s
    }
}

/// Truncate a string to max_len, adding "..." if truncated
pub fn truncate_str(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let kept: String = s.chars().take(max_len.saturating_sub(3)).collect();
        format!("{}...", kept)
    }
}

/// Escape a string for CSV output
///
/// Handles commas, quotes, and newlines according to RFC 4180.
pub fn escape_csv(s: &str) -> String {
    if s.contains(',') || s.contains('"') || s.contains('\n') {
        format!("\"{}\"", s.replace('"', "\"\""))
    } else {
        s.to_string()
    }
}

/// Open the project named by `--project` or discovered from the working directory
pub fn open_project(global: &GlobalOpts) -> Result<Project> {
    Project::open(global.project.as_deref()).map_err(|e| miette::miette!("{}", e))
}

/// Pick the output format: explicit flag, then configured default, then `fallback`
pub fn resolve_format(global: &GlobalOpts, config: &Config, fallback: OutputFormat) -> OutputFormat {
    let configured = config
        .default_format
        .as_deref()
        .and_then(|f| f.parse::<OutputFormat>().ok());

    match (global.format, configured) {
        (OutputFormat::Auto, Some(f)) if f != OutputFormat::Auto => f,
        (OutputFormat::Auto, _) => fallback,
        (f, _) => f,
    }
}

/// Find the file of a record by full or partial ID
pub fn find_record(project: &Project, prefix: EntityPrefix, query: &str) -> Result<PathBuf> {
    project
        .find_entity(prefix, query)
        .map_err(|e| miette::miette!("{}", e))
}

/// Read a record and re-derive its computed fields
pub fn load_record<T: Entity + 'static>(path: &Path) -> Result<T> {
    let mut record: T = read_record(path)?;
    record.refresh();
    Ok(record)
}

/// Load every record of one type, reporting unreadable files without aborting
pub fn load_all<T: Entity + 'static>(project: &Project, prefix: EntityPrefix) -> Vec<T> {
    let mut records = Vec::new();
    for path in project.iter_entity_files(prefix) {
        match load_record::<T>(&path) {
            Ok(record) => records.push(record),
            Err(e) => {
                tracing::warn!(path = %path.display(), "skipping unreadable record");
                eprintln!("{} {}: {}", style("!").yellow(), path.display(), e);
            }
        }
    }
    records
}

/// Re-derive and write a record back to its file
pub fn save_record<T: Entity>(path: &Path, record: &mut T) -> Result<()> {
    record.refresh();
    write_record(path, record)?;
    Ok(())
}

/// Parse a form-style numeric argument; a missing value is blank
pub fn numeric_arg(value: Option<&str>) -> NumericInput {
    value.map(NumericInput::parse).unwrap_or_default()
}

/// Parse a pass/fail flag for checklist commands
pub fn parse_flag(s: &str) -> std::result::Result<bool, String> {
    match s.to_lowercase().as_str() {
        "true" | "yes" | "y" | "pass" | "ok" | "1" => Ok(true),
        "false" | "no" | "n" | "fail" | "nok" | "0" => Ok(false),
        _ => Err(format!("expected true or false, got '{}'", s)),
    }
}

pub fn styled_verdict(verdict: Verdict) -> String {
    match verdict {
        Verdict::Approved => style(verdict.to_string()).green().bold().to_string(),
        Verdict::Rejected => style(verdict.to_string()).red().bold().to_string(),
    }
}

pub fn styled_status(status: MeasurementStatus) -> String {
    match status {
        MeasurementStatus::Ok => style("OK").green().to_string(),
        MeasurementStatus::Nok => style("NOK").red().bold().to_string(),
        MeasurementStatus::Empty => style("-").dim().to_string(),
    }
}

pub fn styled_pass(pass: bool) -> String {
    if pass {
        style("pass").green().to_string()
    } else {
        style("fail").red().bold().to_string()
    }
}

/// Print a serializable value as JSON or YAML
pub fn print_structured<T: serde::Serialize>(value: &T, format: OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(value).into_diagnostic()?);
        }
        _ => {
            print!("{}", serde_yml::to_string(value).into_diagnostic()?);
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn global(format: OutputFormat) -> GlobalOpts {
        GlobalOpts {
            format,
            quiet: false,
            verbose: false,
            project: None,
        }
    }

    #[test]
    fn test_format_short_id() {
        let id = EntityId::new(EntityPrefix::Rpt);
        let formatted = format_short_id(&id);
        assert!(formatted.len() <= 16);
        assert!(formatted.ends_with("..."));
    }

    #[test]
    fn test_truncate_str() {
        assert_eq!(truncate_str("hello", 10), "hello");
        assert_eq!(truncate_str("hello world", 8), "hello...");
        assert_eq!(truncate_str("Ø20 bore", 5), "Ø2...");
    }

    #[test]
    fn test_escape_csv() {
        assert_eq!(escape_csv("simple"), "simple");
        assert_eq!(escape_csv("with,comma"), "\"with,comma\"");
        assert_eq!(escape_csv("with\"quote"), "\"with\"\"quote\"");
    }

    #[test]
    fn test_resolve_format() {
        let mut config = Config::default();
        assert_eq!(
            resolve_format(&global(OutputFormat::Auto), &config, OutputFormat::Tsv),
            OutputFormat::Tsv
        );

        config.default_format = Some("json".into());
        assert_eq!(
            resolve_format(&global(OutputFormat::Auto), &config, OutputFormat::Tsv),
            OutputFormat::Json
        );
        assert_eq!(
            resolve_format(&global(OutputFormat::Csv), &config, OutputFormat::Tsv),
            OutputFormat::Csv
        );
    }

    #[test]
    fn test_parse_flag() {
        assert_eq!(parse_flag("TRUE"), Ok(true));
        assert_eq!(parse_flag("fail"), Ok(false));
        assert!(parse_flag("maybe").is_err());
    }

    #[test]
    fn test_numeric_arg() {
        assert!(numeric_arg(None).is_blank());
        assert_eq!(numeric_arg(Some("2.5")), NumericInput::Numeric(2.5));
        assert!(numeric_arg(Some("  ")).is_blank());
    }
}
