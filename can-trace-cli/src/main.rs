//! CAN Trace Decoder CLI Application
//!
//! This is the command-line interface for the text CAN trace decoder.
//! It uses the can-trace-decoder library and adds:
//! - config.toml loading with command-line overrides
//! - CSV/JSON export of the decoded table
//! - Per-lift-side exports
//! - Column selection of numeric signals

use anyhow::{anyhow, Context, Result};
use can_trace_decoder::{CategoryTag, DecodeReport, Decoder, MachineVariant, NumericField};
use clap::{Parser, ValueEnum};
use std::path::PathBuf;

mod config;
mod export;

use config::{AppConfig, OutputFormat};

/// CAN Trace Decoder - Decode text CAN traces with a schema
#[derive(Parser, Debug)]
#[command(name = "can-trace-cli")]
#[command(about = "Decode text CAN traces into typed records", long_about = None)]
#[command(version)]
struct Args {
    /// Path to the trace (text log) to decode
    #[arg(short, long, value_name = "FILE")]
    log: Option<PathBuf>,

    /// Path to the schema file (.toml or .json)
    #[arg(short, long, value_name = "FILE")]
    schema: Option<PathBuf>,

    /// Machine the trace was captured on
    #[arg(short, long, value_enum)]
    machine: Option<MachineArg>,

    /// Path to configuration file (config.toml)
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Directory for exported tables
    #[arg(short, long, value_name = "DIR")]
    output_dir: Option<PathBuf>,

    /// Export format
    #[arg(short, long, value_enum)]
    format: Option<OutputFormat>,

    /// Also export one table per lift side
    #[arg(long)]
    split: bool,

    /// Numeric fields to print as (index, value) series, comma separated
    #[arg(long, value_delimiter = ',', value_name = "FIELDS")]
    columns: Vec<String>,

    /// Restrict printed series to one lift side
    #[arg(long, value_enum, default_value_t = LiftArg::All)]
    lift: LiftArg,

    /// Decode on a single thread
    #[arg(long)]
    sequential: bool,

    /// Maximum number of line issues to print
    #[arg(long, value_name = "COUNT", default_value_t = 20)]
    max_issues: usize,

    /// Verbosity level (can be repeated: -v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress all output except errors
    #[arg(short, long)]
    quiet: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum MachineArg {
    Carding,
    Df,
    Flyer,
}

impl From<MachineArg> for MachineVariant {
    fn from(arg: MachineArg) -> Self {
        match arg {
            MachineArg::Carding => MachineVariant::Carding,
            MachineArg::Df => MachineVariant::DrawFrame,
            MachineArg::Flyer => MachineVariant::Flyer,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum LiftArg {
    All,
    Right,
    Left,
}

impl LiftArg {
    fn category(&self) -> Option<CategoryTag> {
        match self {
            LiftArg::All => None,
            LiftArg::Right => Some(CategoryTag::RightLift),
            LiftArg::Left => Some(CategoryTag::LeftLift),
        }
    }
}

fn main() -> Result<()> {
    // Parse command line arguments
    let args = Args::parse();

    // Initialize logging
    init_logging(args.verbose, args.quiet);

    log::info!("CAN Trace Decoder CLI v{}", env!("CARGO_PKG_VERSION"));
    log::info!("Using decoder library v{}", can_trace_decoder::VERSION);

    let config = merge_config(&args)?;

    let (Some(log_path), Some(schema_path)) = (&config.input.log, &config.input.schema) else {
        println!("CAN Trace Decoder - No input specified");
        println!("\nQuick Start:");
        println!("  can-trace-cli --log flyer.log --schema dbc.toml --machine flyer");
        println!("  can-trace-cli --log flyer.log --schema dbc.toml --split --columns targetPosition,presentRPM");
        println!("\nWith a configuration file:");
        println!("  can-trace-cli --config config.toml");
        println!("\nUse --help for more options");
        return Ok(());
    };

    let fields = parse_fields(&config.output.columns)?;

    let decoder = Decoder::from_schema_file(schema_path, config.decoder.clone())
        .with_context(|| format!("Failed to load schema: {:?}", schema_path))?;

    let schema_stats = decoder.schema_stats();
    println!("Schema: {:?}", schema_path);
    println!("  Function codes: {}", schema_stats.num_functions);
    println!(
        "  Addresses: carding={} df={} flyer={}",
        schema_stats.num_carding_addresses,
        schema_stats.num_df_addresses,
        schema_stats.num_flyer_addresses
    );
    println!("  Operations: {}", schema_stats.num_operations);
    println!("  Errors: {}", schema_stats.num_errors);
    println!("Machine: {}", config.decoder.variant);

    let report = decoder
        .decode_file(log_path)
        .with_context(|| format!("Failed to decode trace: {:?}", log_path))?;

    print_summary(&report, args.max_issues);

    let written = export::export_report(
        &report,
        &config.output.output_dir,
        config.output.format,
        config.output.split_by_category,
    )?;
    for path in &written {
        println!("Wrote {:?}", path);
    }

    if !fields.is_empty() {
        print_series(&report, &fields, args.lift.category());
    }

    Ok(())
}

/// Apply command-line overrides on top of the optional config file
fn merge_config(args: &Args) -> Result<AppConfig> {
    let mut config = match &args.config {
        Some(path) => {
            log::info!("Loading configuration from: {:?}", path);
            config::load_config(path)?
        }
        None => AppConfig::default(),
    };

    if let Some(log) = &args.log {
        config.input.log = Some(log.clone());
    }
    if let Some(schema) = &args.schema {
        config.input.schema = Some(schema.clone());
    }
    if let Some(machine) = args.machine {
        config.decoder.variant = machine.into();
    }
    if args.sequential {
        config.decoder.parallel = false;
    }
    if let Some(dir) = &args.output_dir {
        config.output.output_dir = dir.clone();
    }
    if let Some(format) = args.format {
        config.output.format = format;
    }
    if args.split {
        config.output.split_by_category = true;
    }
    if !args.columns.is_empty() {
        config.output.columns = args.columns.clone();
    }

    log::debug!("Effective configuration: {:?}", config);
    Ok(config)
}

fn parse_fields(names: &[String]) -> Result<Vec<NumericField>> {
    names
        .iter()
        .filter(|name| !name.trim().is_empty())
        .map(|name| {
            name.parse::<NumericField>().map_err(|e| {
                let known: Vec<&str> = NumericField::ALL.iter().map(|f| f.name()).collect();
                anyhow!("{} (known fields: {})", e, known.join(", "))
            })
        })
        .collect()
}

fn print_summary(report: &DecodeReport, max_issues: usize) {
    let stats = report.stats();
    println!("\nDecoded trace:");
    println!("  Lines:      {}", stats.total_lines);
    println!("  Candidates: {}", stats.candidate_lines);
    println!("  Records:    {}", stats.records);
    println!("  Skipped:    {}", stats.skipped);
    println!("  Degraded:   {}", stats.degraded);

    for (category, records) in report.partition_by_category() {
        println!("  {}: {} records", category, records.len());
    }

    let issues = report.issues();
    if !issues.is_empty() {
        println!("\nIssues ({}):", issues.len());
        for issue in issues.iter().take(max_issues) {
            println!("  {}", issue);
        }
        if issues.len() > max_issues {
            println!("  ... and {} more", issues.len() - max_issues);
        }
    }
    println!();
}

fn print_series(report: &DecodeReport, fields: &[NumericField], category: Option<CategoryTag>) {
    let label = category.map_or("All", |c| c.label());
    for series in report.project(fields, category) {
        println!("# {} ({}, {} points)", series.field, label, series.points.len());
        for (index, value) in series.points {
            println!("{}\t{}", index, value);
        }
    }
}

/// Initialize logging based on verbosity level
fn init_logging(verbose: u8, quiet: bool) {
    use env_logger::Builder;
    use log::LevelFilter;
    use std::io::Write;

    let level = if quiet {
        LevelFilter::Error
    } else {
        match verbose {
            0 => LevelFilter::Info,
            1 => LevelFilter::Debug,
            _ => LevelFilter::Trace,
        }
    };

    Builder::new()
        .filter_level(level)
        .format(|buf, record| {
            writeln!(
                buf,
                "[{} {}] {}",
                record.level(),
                record.target(),
                record.args()
            )
        })
        .init();
}
