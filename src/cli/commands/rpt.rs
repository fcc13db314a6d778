//! `mct rpt` command - Dimensional inspection report management

use chrono::{Duration, Utc};
use clap::{ArgGroup, Subcommand, ValueEnum};
use console::style;
use miette::{IntoDiagnostic, Result};
use std::fs;

use crate::cli::helpers::{
    find_record, load_all, load_record, numeric_arg, open_project, print_structured,
    resolve_format, save_record, styled_status, styled_verdict,
};
use crate::cli::table::{boxed_table, short_id_cell, status_label, CellValue, ColumnDef, TableFormatter, TableRow};
use crate::cli::{GlobalOpts, OutputFormat};
use crate::core::entity::Entity;
use crate::core::identity::{EntityId, EntityPrefix};
use crate::core::Config;
use crate::core::numeric::NumericInput;
use crate::entities::{Measurement, RecordError, Report};
use crate::schema::template::{TemplateContext, TemplateGenerator};
use crate::yaml::parse_record;

#[derive(Subcommand, Debug)]
pub enum RptCommands {
    /// List reports with filtering
    List(ListArgs),

    /// Create a new report
    New(NewArgs),

    /// Show a report with its measurement table
    Show(ShowArgs),

    /// Edit a report in your editor
    Edit(EditArgs),

    /// Append a measurement row (or remove one with --remove)
    Row(RowArgs),

    /// Set the measured value of a row
    Measure(MeasureArgs),

    /// Change the description, nominal or tolerances of a row
    Update(UpdateArgs),

    /// Re-derive row statuses and the verdict, then save
    Evaluate(EvaluateArgs),
}

/// Verdict filter
#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum VerdictFilter {
    Approved,
    Rejected,
    All,
}

/// List column selection
#[derive(Debug, Clone, Copy, ValueEnum, PartialEq, Eq)]
pub enum ListColumn {
    Id,
    Title,
    Client,
    Rows,
    Nok,
    Verdict,
    Author,
    Created,
}

#[derive(clap::Args, Debug)]
pub struct ListArgs {
    /// Filter by verdict
    #[arg(long, default_value = "all")]
    pub verdict: VerdictFilter,

    /// Filter by client (substring, case-insensitive)
    #[arg(long, short = 'c')]
    pub client: Option<String>,

    /// Search in title
    #[arg(long)]
    pub search: Option<String>,

    /// Show only reports with rows still to measure
    #[arg(long)]
    pub incomplete: bool,

    /// Show only reports created in the last N days
    #[arg(long)]
    pub recent: Option<u32>,

    /// Sort by column
    #[arg(long)]
    pub sort: Option<ListColumn>,

    /// Reverse sort order
    #[arg(long)]
    pub reverse: bool,

    /// Limit number of results
    #[arg(long, short = 'n')]
    pub limit: Option<usize>,

    /// Show only count
    #[arg(long)]
    pub count: bool,
}

#[derive(clap::Args, Debug)]
pub struct NewArgs {
    /// Report title
    #[arg(long, short = 't')]
    pub title: String,

    /// Client the inspection is for
    #[arg(long, short = 'c', default_value = "")]
    pub client: String,

    /// Part or instrument inspected
    #[arg(long)]
    pub instrument: Option<String>,

    /// Tags (repeatable)
    #[arg(long = "tag")]
    pub tags: Vec<String>,

    /// Open in editor after creation
    #[arg(long, short = 'e')]
    pub edit: bool,
}

#[derive(clap::Args, Debug)]
pub struct ShowArgs {
    /// Report ID or unique prefix
    pub id: String,
}

#[derive(clap::Args, Debug)]
pub struct EditArgs {
    /// Report ID or unique prefix
    pub id: String,
}

#[derive(clap::Args, Debug)]
pub struct RowArgs {
    /// Report ID or unique prefix
    pub id: String,

    /// Characteristic being measured
    #[arg(long, short = 'd', default_value = "")]
    pub description: String,

    /// Nominal value
    #[arg(long, allow_hyphen_values = true)]
    pub nominal: Option<String>,

    /// Upper tolerance (magnitude)
    #[arg(long, allow_hyphen_values = true)]
    pub plus: Option<String>,

    /// Lower tolerance (magnitude)
    #[arg(long, allow_hyphen_values = true)]
    pub minus: Option<String>,

    /// Measured value, if already known
    #[arg(long, allow_hyphen_values = true)]
    pub measured: Option<String>,

    /// Remove row N instead of appending
    #[arg(long, conflicts_with_all = ["nominal", "plus", "minus", "measured"])]
    pub remove: Option<usize>,
}

#[derive(clap::Args, Debug)]
pub struct MeasureArgs {
    /// Report ID or unique prefix
    pub id: String,

    /// Row number (from 1)
    pub row: usize,

    /// Measured value; omit to clear the row
    #[arg(allow_hyphen_values = true)]
    pub value: Option<String>,
}

#[derive(clap::Args, Debug)]
#[command(group(
    ArgGroup::new("change")
        .required(true)
        .multiple(true)
        .args(["description", "nominal", "plus", "minus"])
))]
pub struct UpdateArgs {
    /// Report ID or unique prefix
    pub id: String,

    /// Row number (from 1)
    pub row: usize,

    /// New description
    #[arg(long, short = 'd')]
    pub description: Option<String>,

    /// New nominal value
    #[arg(long, allow_hyphen_values = true)]
    pub nominal: Option<String>,

    /// New upper tolerance (magnitude)
    #[arg(long, allow_hyphen_values = true)]
    pub plus: Option<String>,

    /// New lower tolerance (magnitude)
    #[arg(long, allow_hyphen_values = true)]
    pub minus: Option<String>,
}

#[derive(clap::Args, Debug)]
pub struct EvaluateArgs {
    /// Report ID or unique prefix
    pub id: String,

    /// Exit with an error when the report is rejected
    #[arg(long)]
    pub strict: bool,
}

/// Run an rpt subcommand
pub fn run(cmd: RptCommands, global: &GlobalOpts) -> Result<()> {
    match cmd {
        RptCommands::List(args) => run_list(args, global),
        RptCommands::New(args) => run_new(args, global),
        RptCommands::Show(args) => run_show(args, global),
        RptCommands::Edit(args) => run_edit(args, global),
        RptCommands::Row(args) => run_row(args, global),
        RptCommands::Measure(args) => run_measure(args, global),
        RptCommands::Update(args) => run_update(args, global),
        RptCommands::Evaluate(args) => run_evaluate(args, global),
    }
}

const LIST_COLUMNS: &[ColumnDef] = &[
    ColumnDef::new("id", "ID", 18),
    ColumnDef::new("title", "TITLE", 30),
    ColumnDef::new("client", "CLIENT", 20),
    ColumnDef::new("rows", "ROWS", 6),
    ColumnDef::new("nok", "NOK", 5),
    ColumnDef::new("verdict", "VERDICT", 10),
    ColumnDef::new("created", "CREATED", 12),
];

fn run_list(args: ListArgs, global: &GlobalOpts) -> Result<()> {
    let project = open_project(global)?;
    let config = Config::load_with_project(Some(&project));

    let mut reports: Vec<Report> = load_all::<Report>(&project, EntityPrefix::Rpt)
        .into_iter()
        .filter(|r| match args.verdict {
            VerdictFilter::Approved => r.verdict.is_approved(),
            VerdictFilter::Rejected => !r.verdict.is_approved(),
            VerdictFilter::All => true,
        })
        .filter(|r| {
            args.client
                .as_ref()
                .map_or(true, |c| r.client.to_lowercase().contains(&c.to_lowercase()))
        })
        .filter(|r| {
            args.search
                .as_ref()
                .map_or(true, |s| r.title.to_lowercase().contains(&s.to_lowercase()))
        })
        .filter(|r| !args.incomplete || !r.is_complete())
        .filter(|r| {
            args.recent
                .map_or(true, |days| r.created >= Utc::now() - Duration::days(days as i64))
        })
        .collect();

    let sort = args.sort.unwrap_or(ListColumn::Created);
    reports.sort_by(|a, b| {
        let cmp = match sort {
            ListColumn::Id => a.id.to_string().cmp(&b.id.to_string()),
            ListColumn::Title => a.title.cmp(&b.title),
            ListColumn::Client => a.client.cmp(&b.client),
            ListColumn::Rows => a.rows.len().cmp(&b.rows.len()),
            ListColumn::Nok => b.summary.nok.cmp(&a.summary.nok),
            ListColumn::Verdict => a.verdict.to_string().cmp(&b.verdict.to_string()),
            ListColumn::Author => a.author.cmp(&b.author),
            ListColumn::Created => a.created.cmp(&b.created),
        };
        if args.reverse {
            cmp.reverse()
        } else {
            cmp
        }
    });

    if let Some(limit) = args.limit {
        reports.truncate(limit);
    }

    if args.count {
        println!("{}", reports.len());
        return Ok(());
    }

    let format = resolve_format(global, &config, OutputFormat::Tsv);
    if matches!(format, OutputFormat::Json | OutputFormat::Yaml) {
        return print_structured(&reports, format);
    }

    if reports.is_empty() && format == OutputFormat::Tsv {
        println!("No reports found.");
        return Ok(());
    }

    let rows: Vec<TableRow> = reports
        .iter()
        .map(|r| {
            TableRow::new(r.id.to_string())
                .cell("id", short_id_cell(&r.id))
                .cell("title", CellValue::Text(r.title.clone()))
                .cell("client", CellValue::Text(r.client.clone()))
                .cell("rows", CellValue::Number(r.rows.len()))
                .cell("nok", CellValue::Number(r.summary.nok))
                .cell("verdict", CellValue::Verdict(r.verdict))
                .cell("created", CellValue::Date(r.created))
        })
        .collect();

    let formatter = TableFormatter::new(LIST_COLUMNS, "report");
    let formatter = if global.quiet {
        formatter.without_summary()
    } else {
        formatter
    };
    formatter.output(&rows, format);
    Ok(())
}

fn run_new(args: NewArgs, global: &GlobalOpts) -> Result<()> {
    let project = open_project(global)?;
    let config = Config::load_with_project(Some(&project));

    let id = EntityId::new(EntityPrefix::Rpt);
    let generator = TemplateGenerator::new().map_err(|e| miette::miette!("{}", e))?;
    let mut ctx = TemplateContext::new(id.clone(), config.author())
        .with_title(&args.title)
        .with_client(&args.client)
        .with_tags(args.tags);
    if let Some(instrument) = &args.instrument {
        ctx = ctx.with_instrument(instrument);
    }

    let yaml_content = generator
        .generate_report(&ctx)
        .map_err(|e| miette::miette!("{}", e))?;

    let file_path = project.entity_path(&id);
    let file_name = file_path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    // The rendered template must load as a report before it is written
    parse_record::<Report>(&yaml_content, &file_name)?;

    if let Some(dir) = file_path.parent() {
        fs::create_dir_all(dir).into_diagnostic()?;
    }
    fs::write(&file_path, &yaml_content).into_diagnostic()?;
    tracing::debug!(id = %id, path = %file_path.display(), "created report");

    if global.quiet {
        println!("{}", id);
    } else {
        println!("{} Created report {}", style("✓").green(), style(&id).cyan());
        println!("   {}", style(file_path.display()).dim());
    }

    if args.edit {
        println!("Opening in {}...", style(config.editor()).yellow());
        config.run_editor(&file_path).into_diagnostic()?;
    }

    Ok(())
}

fn run_show(args: ShowArgs, global: &GlobalOpts) -> Result<()> {
    let project = open_project(global)?;
    let config = Config::load_with_project(Some(&project));
    let path = find_record(&project, EntityPrefix::Rpt, &args.id)?;
    let report: Report = load_record(&path)?;

    match resolve_format(global, &config, OutputFormat::Auto) {
        format @ (OutputFormat::Json | OutputFormat::Yaml) => print_structured(&report, format),
        OutputFormat::Id => {
            println!("{}", report.id);
            Ok(())
        }
        OutputFormat::Auto => {
            print_report(&report);
            Ok(())
        }
        format => {
            output_rows(&report, format);
            Ok(())
        }
    }
}

fn run_edit(args: EditArgs, global: &GlobalOpts) -> Result<()> {
    let project = open_project(global)?;
    let config = Config::load_with_project(Some(&project));
    let path = find_record(&project, EntityPrefix::Rpt, &args.id)?;

    println!(
        "Opening {} in {}...",
        style(path.display()).cyan(),
        style(config.editor()).yellow()
    );
    config.run_editor(&path).into_diagnostic()?;

    let mut report: Report = load_record(&path)?;
    save_record(&path, &mut report)?;
    println!(
        "{} Saved {} ({})",
        style("✓").green(),
        style(&report.id).cyan(),
        styled_verdict(report.verdict)
    );
    Ok(())
}

fn run_row(args: RowArgs, global: &GlobalOpts) -> Result<()> {
    let project = open_project(global)?;
    let path = find_record(&project, EntityPrefix::Rpt, &args.id)?;
    let mut report: Report = load_record(&path)?;

    if let Some(row) = args.remove {
        let removed = report
            .remove_row(row)
            .map_err(|e| miette::miette!("{}", e))?;
        save_record(&path, &mut report)?;
        if !global.quiet {
            println!(
                "{} Removed row {} ({}) from {}",
                style("✓").green(),
                row,
                removed.description(),
                style(&report.id).cyan()
            );
            println!("   Verdict: {}", styled_verdict(report.verdict));
        }
        return Ok(());
    }

    let measurement = Measurement::new(
        args.description,
        numeric_arg(args.nominal.as_deref()),
        numeric_arg(args.plus.as_deref()),
        numeric_arg(args.minus.as_deref()),
    );
    let row = report.add_row(measurement);
    let status = report
        .set_measured(row, numeric_arg(args.measured.as_deref()))
        .map_err(|e| miette::miette!("{}", e))?;
    save_record(&path, &mut report)?;

    if global.quiet {
        println!("{}", row);
    } else {
        println!(
            "{} Added row {} to {}: {}",
            style("✓").green(),
            row,
            style(&report.id).cyan(),
            styled_status(status)
        );
        println!("   Verdict: {}", styled_verdict(report.verdict));
    }
    Ok(())
}

fn run_measure(args: MeasureArgs, global: &GlobalOpts) -> Result<()> {
    let project = open_project(global)?;
    let path = find_record(&project, EntityPrefix::Rpt, &args.id)?;
    let mut report: Report = load_record(&path)?;

    let status = report
        .set_measured(args.row, numeric_arg(args.value.as_deref()))
        .map_err(|e| miette::miette!("{}", e))?;
    save_record(&path, &mut report)?;

    if global.quiet {
        println!("{}", status_label(status));
        return Ok(());
    }

    let row = &report.rows[args.row - 1];
    let band = row
        .band()
        .map(|b| b.to_string())
        .unwrap_or_else(|| "-".to_string());
    println!(
        "Row {} {}: {} in {} -> {}",
        args.row,
        style(row.description()).bold(),
        row.measured(),
        band,
        styled_status(status)
    );
    println!(
        "Report {}: {} ({} ok, {} nok, {} pending)",
        style(&report.id).cyan(),
        styled_verdict(report.verdict),
        report.summary.ok,
        report.summary.nok,
        report.summary.pending
    );
    Ok(())
}

/// Apply only the fields given on the command line; the rest keep their values
fn run_update(args: UpdateArgs, global: &GlobalOpts) -> Result<()> {
    let project = open_project(global)?;
    let path = find_record(&project, EntityPrefix::Rpt, &args.id)?;
    let mut report: Report = load_record(&path)?;

    let current = report
        .rows
        .get(args.row.wrapping_sub(1))
        .cloned()
        .ok_or_else(|| {
            miette::miette!(
                "{}",
                RecordError::RowOutOfRange {
                    row: args.row,
                    len: report.rows.len(),
                }
            )
        })?;

    if let Some(description) = args.description {
        report
            .set_description(args.row, description)
            .map_err(|e| miette::miette!("{}", e))?;
    }
    if let Some(nominal) = args.nominal.as_deref() {
        report
            .set_nominal(args.row, NumericInput::parse(nominal))
            .map_err(|e| miette::miette!("{}", e))?;
    }
    if args.plus.is_some() || args.minus.is_some() {
        let plus = args
            .plus
            .as_deref()
            .map_or_else(|| current.tolerance_positive().clone(), NumericInput::parse);
        let minus = args
            .minus
            .as_deref()
            .map_or_else(|| current.tolerance_negative().clone(), NumericInput::parse);
        report
            .set_tolerances(args.row, plus, minus)
            .map_err(|e| miette::miette!("{}", e))?;
    }
    save_record(&path, &mut report)?;

    let row = &report.rows[args.row - 1];
    if global.quiet {
        println!("{}", status_label(row.status()));
    } else {
        let band = row
            .band()
            .map(|b| b.to_string())
            .unwrap_or_else(|| "-".to_string());
        println!(
            "{} Row {} {}: band {} -> {}",
            style("✓").green(),
            args.row,
            style(row.description()).bold(),
            band,
            styled_status(row.status())
        );
        println!("   Verdict: {}", styled_verdict(report.verdict));
    }
    Ok(())
}

fn run_evaluate(args: EvaluateArgs, global: &GlobalOpts) -> Result<()> {
    let project = open_project(global)?;
    let config = Config::load_with_project(Some(&project));
    let path = find_record(&project, EntityPrefix::Rpt, &args.id)?;
    let mut report: Report = load_record(&path)?;
    save_record(&path, &mut report)?;

    match resolve_format(global, &config, OutputFormat::Auto) {
        format @ (OutputFormat::Json | OutputFormat::Yaml) => {
            #[derive(serde::Serialize)]
            struct Evaluation<'a> {
                id: String,
                verdict: crate::conformance::Verdict,
                summary: &'a crate::entities::ReportSummary,
            }
            print_structured(
                &Evaluation {
                    id: report.id.to_string(),
                    verdict: report.verdict,
                    summary: &report.summary,
                },
                format,
            )?;
        }
        _ if global.quiet => println!("{}", report.verdict),
        _ => print_report(&report),
    }

    if args.strict && !report.verdict.is_approved() {
        return Err(miette::miette!("report {} is {}", report.id, report.verdict));
    }
    Ok(())
}

fn measurement_cells(index: usize, row: &Measurement) -> Vec<String> {
    vec![
        (index + 1).to_string(),
        row.description().to_string(),
        row.nominal().to_string(),
        row.tolerance_positive().to_string(),
        row.tolerance_negative().to_string(),
        row.band().map(|b| b.to_string()).unwrap_or_else(|| "-".to_string()),
        row.measured().to_string(),
        status_label(row.status()),
    ]
}

fn print_report(report: &Report) {
    println!("{}", style(&report.id).cyan().bold());
    println!("{}: {}", style("Title").bold(), report.title);
    if !report.client.is_empty() {
        println!("{}: {}", style("Client").bold(), report.client);
    }
    if let Some(instrument) = &report.instrument {
        println!("{}: {}", style("Instrument").bold(), instrument);
    }
    println!(
        "{}: {} on {}",
        style("Author").bold(),
        report.author(),
        report.created.format("%Y-%m-%d")
    );
    println!();

    if report.rows.is_empty() {
        println!("{}", style("No measurement rows yet.").dim());
    } else {
        let table = boxed_table(
            &["#", "Description", "Nominal", "+Tol", "-Tol", "Band", "Measured", "Status"],
            report
                .rows
                .iter()
                .enumerate()
                .map(|(i, row)| measurement_cells(i, row)),
        );
        println!("{}", table);
    }

    println!();
    println!(
        "{} ok, {} nok, {} pending",
        style(report.summary.ok).green(),
        style(report.summary.nok).red(),
        style(report.summary.pending).dim()
    );
    println!("{}: {}", style("Verdict").bold(), styled_verdict(report.verdict));
}

const ROW_COLUMNS: &[ColumnDef] = &[
    ColumnDef::new("row", "#", 4),
    ColumnDef::new("description", "DESCRIPTION", 30),
    ColumnDef::new("nominal", "NOMINAL", 12),
    ColumnDef::new("plus", "+TOL", 10),
    ColumnDef::new("minus", "-TOL", 10),
    ColumnDef::new("measured", "MEASURED", 12),
    ColumnDef::new("status", "STATUS", 8),
];

fn output_rows(report: &Report, format: OutputFormat) {
    let rows: Vec<TableRow> = report
        .rows
        .iter()
        .enumerate()
        .map(|(i, row)| {
            TableRow::new((i + 1).to_string())
                .cell("row", CellValue::Number(i + 1))
                .cell("description", CellValue::Text(row.description().to_string()))
                .cell("nominal", CellValue::Text(row.nominal().to_string()))
                .cell("plus", CellValue::Text(row.tolerance_positive().to_string()))
                .cell("minus", CellValue::Text(row.tolerance_negative().to_string()))
                .cell("measured", CellValue::Text(row.measured().to_string()))
                .cell("status", CellValue::Text(status_label(row.status())))
        })
        .collect();

    TableFormatter::new(ROW_COLUMNS, "row")
        .without_summary()
        .output(&rows, format);
}
