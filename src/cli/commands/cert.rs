//! `mct cert` command - Touch-probe repair certificate management

use clap::{Subcommand, ValueEnum};
use console::style;
use miette::{IntoDiagnostic, Result};
use serde::Serialize;
use std::fs;

use crate::cli::helpers::{
    find_record, load_all, load_record, open_project, parse_flag, print_structured,
    resolve_format, save_record, styled_pass, styled_verdict,
};
use crate::cli::table::{boxed_table, short_id_cell, CellValue, ColumnDef, TableFormatter, TableRow};
use crate::cli::{GlobalOpts, OutputFormat};
use crate::conformance::{
    Axis, ChecklistItem, Direction, ProbeRepairOutcome, RepeatabilityStats, REPEATABILITY_LIMIT_MM,
};
use crate::core::identity::{EntityId, EntityPrefix};
use crate::core::numeric::NumericInput;
use crate::core::Config;
use crate::entities::Certificate;
use crate::schema::template::{TemplateContext, TemplateGenerator};
use crate::yaml::parse_record;

#[derive(Subcommand, Debug)]
pub enum CertCommands {
    /// List certificates with filtering
    List(ListArgs),

    /// Create a new certificate
    New(NewArgs),

    /// Show a certificate
    Show(ShowArgs),

    /// Edit a certificate in your editor
    Edit(EditArgs),

    /// Record the readings of one probing direction (up to 10)
    Record(RecordArgs),

    /// Set an inspection checklist gate or communication channel
    Check(CheckArgs),

    /// Change the deviation limits of an axis
    Limit(LimitArgs),

    /// Re-derive statistics, axis deviations and the verdict, then save
    Evaluate(EvaluateArgs),
}

/// Verdict filter
#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum VerdictFilter {
    Approved,
    Rejected,
    All,
}

#[derive(clap::Args, Debug)]
pub struct ListArgs {
    /// Filter by verdict
    #[arg(long, default_value = "all")]
    pub verdict: VerdictFilter,

    /// Filter by client (substring, case-insensitive)
    #[arg(long, short = 'c')]
    pub client: Option<String>,

    /// Filter by probe serial number (substring)
    #[arg(long)]
    pub serial: Option<String>,

    /// Search in title
    #[arg(long)]
    pub search: Option<String>,

    /// Reverse order (newest first)
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
    /// Certificate title
    #[arg(long, short = 't')]
    pub title: String,

    /// Client the probe belongs to
    #[arg(long, short = 'c', default_value = "")]
    pub client: String,

    /// Probe model
    #[arg(long)]
    pub model: Option<String>,

    /// Probe serial number
    #[arg(long)]
    pub serial: Option<String>,

    /// Symmetric axis deviation limit in mm (default: config deviation_limit)
    #[arg(long)]
    pub limit: Option<f64>,

    /// Tags (repeatable)
    #[arg(long = "tag")]
    pub tags: Vec<String>,

    /// Open in editor after creation
    #[arg(long, short = 'e')]
    pub edit: bool,
}

#[derive(clap::Args, Debug)]
pub struct ShowArgs {
    /// Certificate ID or unique prefix
    pub id: String,
}

#[derive(clap::Args, Debug)]
pub struct EditArgs {
    /// Certificate ID or unique prefix
    pub id: String,
}

#[derive(clap::Args, Debug)]
pub struct RecordArgs {
    /// Certificate ID or unique prefix
    pub id: String,

    /// Probing direction (+X, -X, +Y, -Y, -Z)
    #[arg(allow_hyphen_values = true)]
    pub direction: Direction,

    /// Readings; blanks and non-numbers are kept but ignored. None clears the series.
    #[arg(allow_hyphen_values = true, num_args = 0..)]
    pub values: Vec<String>,
}

#[derive(clap::Args, Debug)]
pub struct CheckArgs {
    /// Certificate ID or unique prefix
    pub id: String,

    /// Gate (seal-integrity, kinematic-module, trigger-force, structural-damage,
    /// touch-capability), channel (radio, optical, cable) or "all"
    pub item: String,

    /// Whether the check passed
    #[arg(value_parser = parse_flag, action = clap::ArgAction::Set)]
    pub passed: bool,
}

#[derive(clap::Args, Debug)]
pub struct LimitArgs {
    /// Certificate ID or unique prefix
    pub id: String,

    /// Axis (X, Y, Z)
    pub axis: Axis,

    /// Upper limit for the positive deviation (mm)
    #[arg(long, allow_hyphen_values = true)]
    pub max: f64,

    /// Lower limit for the negative deviation (mm, default: -max)
    #[arg(long, allow_hyphen_values = true)]
    pub min: Option<f64>,
}

#[derive(clap::Args, Debug)]
pub struct EvaluateArgs {
    /// Certificate ID or unique prefix
    pub id: String,

    /// Exit with an error when the certificate is rejected
    #[arg(long)]
    pub strict: bool,
}

/// Run a cert subcommand
pub fn run(cmd: CertCommands, global: &GlobalOpts) -> Result<()> {
    match cmd {
        CertCommands::List(args) => run_list(args, global),
        CertCommands::New(args) => run_new(args, global),
        CertCommands::Show(args) => run_show(args, global),
        CertCommands::Edit(args) => run_edit(args, global),
        CertCommands::Record(args) => run_record(args, global),
        CertCommands::Check(args) => run_check(args, global),
        CertCommands::Limit(args) => run_limit(args, global),
        CertCommands::Evaluate(args) => run_evaluate(args, global),
    }
}

const LIST_COLUMNS: &[ColumnDef] = &[
    ColumnDef::new("id", "ID", 18),
    ColumnDef::new("title", "TITLE", 28),
    ColumnDef::new("client", "CLIENT", 18),
    ColumnDef::new("serial", "SERIAL", 14),
    ColumnDef::new("deviation", "DEV", 6),
    ColumnDef::new("repeatability", "REP", 6),
    ColumnDef::new("checklist", "CHECK", 6),
    ColumnDef::new("verdict", "VERDICT", 10),
];

fn run_list(args: ListArgs, global: &GlobalOpts) -> Result<()> {
    let project = open_project(global)?;
    let config = Config::load_with_project(Some(&project));

    let mut certs: Vec<Certificate> = load_all::<Certificate>(&project, EntityPrefix::Cert)
        .into_iter()
        .filter(|c| match args.verdict {
            VerdictFilter::Approved => c.outcome.verdict.is_approved(),
            VerdictFilter::Rejected => !c.outcome.verdict.is_approved(),
            VerdictFilter::All => true,
        })
        .filter(|c| {
            args.client
                .as_ref()
                .map_or(true, |q| c.client.to_lowercase().contains(&q.to_lowercase()))
        })
        .filter(|c| {
            args.serial.as_ref().map_or(true, |q| {
                c.probe
                    .serial_number
                    .as_deref()
                    .is_some_and(|s| s.contains(q.as_str()))
            })
        })
        .filter(|c| {
            args.search
                .as_ref()
                .map_or(true, |q| c.title.to_lowercase().contains(&q.to_lowercase()))
        })
        .collect();

    certs.sort_by_key(|c| c.created);
    if args.reverse {
        certs.reverse();
    }
    if let Some(limit) = args.limit {
        certs.truncate(limit);
    }

    if args.count {
        println!("{}", certs.len());
        return Ok(());
    }

    let format = resolve_format(global, &config, OutputFormat::Tsv);
    if matches!(format, OutputFormat::Json | OutputFormat::Yaml) {
        return print_structured(&certs, format);
    }

    if certs.is_empty() && format == OutputFormat::Tsv {
        println!("No certificates found.");
        return Ok(());
    }

    let rows: Vec<TableRow> = certs
        .iter()
        .map(|c| {
            let serial = c
                .probe
                .serial_number
                .clone()
                .map_or(CellValue::Empty, CellValue::Text);
            TableRow::new(c.id.to_string())
                .cell("id", short_id_cell(&c.id))
                .cell("title", CellValue::Text(c.title.clone()))
                .cell("client", CellValue::Text(c.client.clone()))
                .cell("serial", serial)
                .cell("deviation", CellValue::Pass(c.outcome.deviation))
                .cell("repeatability", CellValue::Pass(c.outcome.repeatability))
                .cell("checklist", CellValue::Pass(c.outcome.checklist))
                .cell("verdict", CellValue::Verdict(c.outcome.verdict))
        })
        .collect();

    let formatter = TableFormatter::new(LIST_COLUMNS, "certificate");
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

    let limit = match args.limit {
        Some(limit) if limit.is_finite() && limit > 0.0 => limit,
        Some(limit) => {
            return Err(miette::miette!(
                "deviation limit must be a positive number, got {}",
                limit
            ))
        }
        None => config.deviation_limit(),
    };

    let id = EntityId::new(EntityPrefix::Cert);
    let generator = TemplateGenerator::new().map_err(|e| miette::miette!("{}", e))?;
    let ctx = TemplateContext::new(id.clone(), config.author())
        .with_title(&args.title)
        .with_client(&args.client)
        .with_probe(args.model, args.serial)
        .with_deviation_limit(limit)
        .with_tags(args.tags);

    let yaml_content = generator
        .generate_certificate(&ctx)
        .map_err(|e| miette::miette!("{}", e))?;

    let file_path = project.entity_path(&id);
    let file_name = file_path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    parse_record::<Certificate>(&yaml_content, &file_name)?;

    if let Some(dir) = file_path.parent() {
        fs::create_dir_all(dir).into_diagnostic()?;
    }
    fs::write(&file_path, &yaml_content).into_diagnostic()?;
    tracing::debug!(id = %id, limit, "created certificate");

    if global.quiet {
        println!("{}", id);
    } else {
        println!("{} Created certificate {}", style("✓").green(), style(&id).cyan());
        println!("   {}", style(file_path.display()).dim());
        println!("   Axis limits: ±{} mm", limit);
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
    let path = find_record(&project, EntityPrefix::Cert, &args.id)?;
    let cert: Certificate = load_record(&path)?;

    match resolve_format(global, &config, OutputFormat::Auto) {
        format @ (OutputFormat::Json | OutputFormat::Yaml) => print_structured(&cert, format),
        OutputFormat::Id => {
            println!("{}", cert.id);
            Ok(())
        }
        _ => {
            print_certificate(&cert);
            Ok(())
        }
    }
}

fn run_edit(args: EditArgs, global: &GlobalOpts) -> Result<()> {
    let project = open_project(global)?;
    let config = Config::load_with_project(Some(&project));
    let path = find_record(&project, EntityPrefix::Cert, &args.id)?;

    println!(
        "Opening {} in {}...",
        style(path.display()).cyan(),
        style(config.editor()).yellow()
    );
    config.run_editor(&path).into_diagnostic()?;

    let mut cert: Certificate = load_record(&path)?;
    save_record(&path, &mut cert)?;
    println!(
        "{} Saved {} ({})",
        style("✓").green(),
        style(&cert.id).cyan(),
        styled_verdict(cert.outcome.verdict)
    );
    Ok(())
}

fn run_record(args: RecordArgs, global: &GlobalOpts) -> Result<()> {
    let project = open_project(global)?;
    let path = find_record(&project, EntityPrefix::Cert, &args.id)?;
    let mut cert: Certificate = load_record(&path)?;

    let points: Vec<NumericInput> = args.values.iter().map(|v| NumericInput::parse(v)).collect();
    let stats = cert
        .record_series(args.direction, points)
        .map_err(|e| miette::miette!("{}", e))?;
    save_record(&path, &mut cert)?;

    if global.quiet {
        println!("{}", stats.expanded_deviation);
        return Ok(());
    }

    println!(
        "{} Recorded {} readings for {} on {}",
        style("✓").green(),
        args.values.len(),
        style(args.direction).bold(),
        style(&cert.id).cyan()
    );
    println!("   {}", describe_stats(&stats));
    println!("   Verdict: {}", styled_verdict(cert.outcome.verdict));
    Ok(())
}

fn run_check(args: CheckArgs, global: &GlobalOpts) -> Result<()> {
    let project = open_project(global)?;
    let path = find_record(&project, EntityPrefix::Cert, &args.id)?;
    let mut cert: Certificate = load_record(&path)?;

    let items: Vec<ChecklistItem> = if args.item.eq_ignore_ascii_case("all") {
        ChecklistItem::all().to_vec()
    } else {
        vec![args
            .item
            .parse::<ChecklistItem>()
            .map_err(|e| miette::miette!("{}", e))?]
    };
    for item in &items {
        cert.set_check(*item, args.passed);
    }
    save_record(&path, &mut cert)?;

    if !global.quiet {
        let names: Vec<String> = items.iter().map(|i| i.to_string()).collect();
        println!(
            "{} {} = {} on {}",
            style("✓").green(),
            names.join(", "),
            styled_pass(args.passed),
            style(&cert.id).cyan()
        );
        println!(
            "   Checklist: {}  Verdict: {}",
            styled_pass(cert.outcome.checklist),
            styled_verdict(cert.outcome.verdict)
        );
    }
    Ok(())
}

fn run_limit(args: LimitArgs, global: &GlobalOpts) -> Result<()> {
    let project = open_project(global)?;
    let path = find_record(&project, EntityPrefix::Cert, &args.id)?;
    let mut cert: Certificate = load_record(&path)?;

    let limit_min = args.min.unwrap_or(-args.max.abs());
    cert.set_axis_limits(args.axis, args.max, limit_min)
        .map_err(|e| miette::miette!("{}", e))?;
    save_record(&path, &mut cert)?;

    if !global.quiet {
        println!(
            "{} Axis {} limits set to [{}, {}] on {}",
            style("✓").green(),
            style(args.axis).bold(),
            limit_min,
            args.max,
            style(&cert.id).cyan()
        );
        println!(
            "   Deviation: {}  Verdict: {}",
            styled_pass(cert.outcome.deviation),
            styled_verdict(cert.outcome.verdict)
        );
    }
    Ok(())
}

fn run_evaluate(args: EvaluateArgs, global: &GlobalOpts) -> Result<()> {
    let project = open_project(global)?;
    let config = Config::load_with_project(Some(&project));
    let path = find_record(&project, EntityPrefix::Cert, &args.id)?;
    let mut cert: Certificate = load_record(&path)?;
    save_record(&path, &mut cert)?;

    match resolve_format(global, &config, OutputFormat::Auto) {
        format @ (OutputFormat::Json | OutputFormat::Yaml) => {
            #[derive(Serialize)]
            struct Evaluation<'a> {
                id: String,
                outcome: &'a ProbeRepairOutcome,
                failing_gates: Vec<&'static str>,
            }
            print_structured(
                &Evaluation {
                    id: cert.id.to_string(),
                    outcome: &cert.outcome,
                    failing_gates: cert.checklist.failing_gates(),
                },
                format,
            )?;
        }
        _ if global.quiet => println!("{}", cert.outcome.verdict),
        _ => print_certificate(&cert),
    }

    if args.strict && !cert.outcome.verdict.is_approved() {
        return Err(miette::miette!(
            "certificate {} is {}",
            cert.id,
            cert.outcome.verdict
        ));
    }
    Ok(())
}

fn describe_stats(stats: &RepeatabilityStats) -> String {
    if !stats.has_sufficient_data() {
        return format!(
            "{} valid reading(s): not enough for repeatability",
            stats.samples
        );
    }
    format!(
        "mean {:.6}  2σ {:.6} (limit {}) {}",
        stats.mean,
        stats.expanded_deviation,
        REPEATABILITY_LIMIT_MM,
        styled_pass(stats.expanded_deviation <= REPEATABILITY_LIMIT_MM)
    )
}

fn print_certificate(cert: &Certificate) {
    println!("{}", style(&cert.id).cyan().bold());
    println!("{}: {}", style("Title").bold(), cert.title);
    if !cert.client.is_empty() {
        println!("{}: {}", style("Client").bold(), cert.client);
    }
    let probe: Vec<&str> = [cert.probe.model.as_deref(), cert.probe.serial_number.as_deref()]
        .into_iter()
        .flatten()
        .collect();
    if !probe.is_empty() {
        println!("{}: {}", style("Probe").bold(), probe.join(" / "));
    }
    println!();

    println!("{}", style("Repeatability").bold());
    let series = boxed_table(
        &["Direction", "Readings", "Mean", "2σ", "Result"],
        cert.series.iter().map(|s| {
            let result = match s.stats.within_limit() {
                Some(true) => "pass".to_string(),
                Some(false) => "fail".to_string(),
                None => "-".to_string(),
            };
            let (mean, spread) = if s.stats.has_sufficient_data() {
                (format!("{:.6}", s.stats.mean), format!("{:.6}", s.stats.expanded_deviation))
            } else {
                ("-".to_string(), "-".to_string())
            };
            vec![
                s.direction.to_string(),
                s.stats.samples.to_string(),
                mean,
                spread,
                result,
            ]
        }),
    );
    println!("{}", series);
    println!();

    println!("{}", style("Axis deviation").bold());
    let axes = boxed_table(
        &["Axis", "Positive", "Negative", "Max", "Min", "Result"],
        cert.deviation_tests.iter().map(|t| {
            let result = match t.within_limits() {
                Some(true) => "pass",
                Some(false) => "fail",
                None => "-",
            };
            vec![
                t.axis.to_string(),
                t.deviation_positive.to_string(),
                t.deviation_negative.to_string(),
                t.limit_max.to_string(),
                t.limit_min.to_string(),
                result.to_string(),
            ]
        }),
    );
    println!("{}", axes);
    println!();

    println!("{}", style("Inspection checklist").bold());
    for (name, ok) in cert.checklist.gates() {
        println!("  {:<20} {}", name, styled_pass(ok));
    }
    let channels = cert.checklist.communication;
    println!(
        "  {:<20} radio {} / optical {} / cable {}",
        "",
        styled_pass(channels.radio),
        styled_pass(channels.optical),
        styled_pass(channels.cable)
    );
    println!();

    println!(
        "Deviation {}  Repeatability {}  Checklist {}",
        styled_pass(cert.outcome.deviation),
        styled_pass(cert.outcome.repeatability),
        styled_pass(cert.outcome.checklist)
    );
    println!(
        "{}: {}",
        style("Verdict").bold(),
        styled_verdict(cert.outcome.verdict)
    );
}
