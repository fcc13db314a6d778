//! `mct eval` command - one-off engine calculations without a project

use clap::Subcommand;
use console::style;
use miette::Result;
use serde::Serialize;

use crate::cli::helpers::{numeric_arg, print_structured, styled_pass, styled_status};
use crate::cli::{GlobalOpts, OutputFormat};
use crate::conformance::tolerance::band;
use crate::conformance::{analyze, evaluate, MeasurementStatus, ToleranceBand, REPEATABILITY_LIMIT_MM};
use crate::core::numeric::NumericInput;

#[derive(Subcommand, Debug)]
pub enum EvalCommands {
    /// Classify a measured value against nominal and tolerances
    Tolerance(ToleranceArgs),

    /// Mean and expanded deviation (2σ) of repeated readings
    Repeatability(RepeatabilityArgs),
}

#[derive(clap::Args, Debug)]
pub struct ToleranceArgs {
    /// Nominal value
    #[arg(long, allow_hyphen_values = true)]
    pub nominal: Option<String>,

    /// Upper tolerance (magnitude)
    #[arg(long, allow_hyphen_values = true)]
    pub plus: Option<String>,

    /// Lower tolerance (magnitude)
    #[arg(long, allow_hyphen_values = true)]
    pub minus: Option<String>,

    /// Measured value
    #[arg(long, allow_hyphen_values = true)]
    pub measured: Option<String>,
}

#[derive(clap::Args, Debug)]
pub struct RepeatabilityArgs {
    /// Readings (at most 10 are used)
    #[arg(allow_hyphen_values = true, num_args = 0..)]
    pub values: Vec<String>,
}

#[derive(Serialize)]
struct ToleranceResult {
    status: MeasurementStatus,
    band: Option<ToleranceBand>,
}

#[derive(Serialize)]
struct RepeatabilityResult {
    mean: f64,
    expanded_deviation: f64,
    samples: usize,
    limit: f64,
    within_limit: Option<bool>,
}

pub fn run(cmd: EvalCommands, global: &GlobalOpts) -> Result<()> {
    match cmd {
        EvalCommands::Tolerance(args) => run_tolerance(args, global),
        EvalCommands::Repeatability(args) => run_repeatability(args, global),
    }
}

fn run_tolerance(args: ToleranceArgs, global: &GlobalOpts) -> Result<()> {
    let nominal = numeric_arg(args.nominal.as_deref());
    let plus = numeric_arg(args.plus.as_deref());
    let minus = numeric_arg(args.minus.as_deref());
    let measured = numeric_arg(args.measured.as_deref());

    let result = ToleranceResult {
        status: evaluate(&nominal, &plus, &minus, &measured),
        band: band(&nominal, &plus, &minus),
    };

    match global.format {
        format @ (OutputFormat::Json | OutputFormat::Yaml) => print_structured(&result, format),
        _ if global.quiet => {
            println!("{}", result.status.as_str());
            Ok(())
        }
        _ => {
            match &result.band {
                Some(b) => println!("Band:   {} (width {:.4})", b, b.width()),
                None => println!("Band:   {}", style("no nominal").dim()),
            }
            println!("Status: {}", styled_status(result.status));
            Ok(())
        }
    }
}

fn run_repeatability(args: RepeatabilityArgs, global: &GlobalOpts) -> Result<()> {
    let points: Vec<NumericInput> = args.values.iter().map(|v| NumericInput::parse(v)).collect();
    let stats = analyze(&points);

    let result = RepeatabilityResult {
        mean: stats.mean,
        expanded_deviation: stats.expanded_deviation,
        samples: stats.samples,
        limit: REPEATABILITY_LIMIT_MM,
        within_limit: stats.within_limit(),
    };

    match global.format {
        format @ (OutputFormat::Json | OutputFormat::Yaml) => print_structured(&result, format),
        _ if global.quiet => {
            println!("{}", result.expanded_deviation);
            Ok(())
        }
        _ => {
            println!("Samples: {}", result.samples);
            println!("Mean:    {:.6}", result.mean);
            println!("2σ:      {:.6}", result.expanded_deviation);
            match result.within_limit {
                Some(ok) => println!("Limit:   {} {}", result.limit, styled_pass(ok)),
                None => println!("Limit:   {} {}", result.limit, style("insufficient data").dim()),
            }
            Ok(())
        }
    }
}
