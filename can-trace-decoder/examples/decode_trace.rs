//! Standalone CAN trace decoder tool
//!
//! Decodes a text trace with a TOML/JSON schema and prints each record, the
//! per-line issues, and a short summary.
//!
//! Usage:
//!   decode_trace <trace.txt> --schema <schema.toml> [--machine carding|df|flyer] [--limit <count>] [--verbose]
//!
//! Example:
//!   decode_trace flyer.log --schema dbc.toml --machine flyer --limit 100

use can_trace_decoder::{DecodedRecord, Decoder, DecoderConfig, MachineVariant};
use std::collections::HashMap;
use std::env;
use std::path::PathBuf;

struct TraceStats {
    messages_by_type: HashMap<String, usize>,
    nodes: HashMap<String, usize>,
    records_with_signals: usize,
}

impl TraceStats {
    fn new() -> Self {
        Self {
            messages_by_type: HashMap::new(),
            nodes: HashMap::new(),
            records_with_signals: 0,
        }
    }

    fn add(&mut self, record: &DecodedRecord) {
        let msg_type = record
            .message_type
            .as_ref()
            .map_or_else(|| "Unknown".to_string(), |t| t.to_string());
        *self.messages_by_type.entry(msg_type).or_insert(0) += 1;
        if let Some(source) = &record.source_name {
            *self.nodes.entry(source.clone()).or_insert(0) += 1;
        }
        if record.signals.is_some() {
            self.records_with_signals += 1;
        }
    }

    fn print_summary(&self) {
        println!("\n=== DECODING SUMMARY ===");
        println!("Records with lift signals: {}", self.records_with_signals);

        if !self.messages_by_type.is_empty() {
            println!("\nMessage types:");
            let mut sorted: Vec<_> = self.messages_by_type.iter().collect();
            sorted.sort_by(|a, b| b.1.cmp(a.1));
            for (name, count) in sorted {
                println!("  {}: {} times", name, count);
            }
        }

        if !self.nodes.is_empty() {
            println!("\nTop 10 Most Active Source Nodes:");
            let mut sorted: Vec<_> = self.nodes.iter().collect();
            sorted.sort_by(|a, b| b.1.cmp(a.1));
            for (name, count) in sorted.iter().take(10) {
                println!("  {}: {} frames", name, count);
            }
        }
    }
}

fn print_record(record: &DecodedRecord, verbose: bool) {
    println!(
        "[{} {}] {} {} {} -> {}{}{}",
        record.header.date,
        record.header.time,
        record.header.extended_id,
        record.message_type.as_ref().map_or("?".to_string(), |t| t.to_string()),
        record.source_name.as_deref().unwrap_or("?"),
        record.destination_name.as_deref().unwrap_or("?"),
        record
            .operation_name
            .as_deref()
            .map(|op| format!(" op={}", op))
            .unwrap_or_default(),
        record
            .error_name
            .as_deref()
            .map(|err| format!(" error={}", err))
            .unwrap_or_default(),
    );

    if verbose {
        if let Some(signals) = &record.signals {
            for (field, value) in signals.fields() {
                println!("    {}: {}", field, value);
            }
        }
        if let Some(category) = record.category {
            println!("    side: {}", category);
        }
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();

    let args: Vec<String> = env::args().collect();

    if args.len() < 2 {
        eprintln!("Usage: {} <trace.txt> --schema <schema.toml> [--machine carding|df|flyer] [--limit <count>] [--verbose]", args[0]);
        eprintln!("\nExample:");
        eprintln!("  {} flyer.log --schema dbc.toml --machine flyer --limit 100", args[0]);
        std::process::exit(1);
    }

    let trace_file = PathBuf::from(&args[1]);
    let mut schema_file: Option<PathBuf> = None;
    let mut variant = MachineVariant::Flyer;
    let mut limit: Option<usize> = None;
    let mut verbose = false;

    // Parse arguments
    let mut i = 2;
    while i < args.len() {
        match args[i].as_str() {
            "--schema" => {
                i += 1;
                if i < args.len() {
                    schema_file = Some(PathBuf::from(&args[i]));
                }
            }
            "--machine" => {
                i += 1;
                if i < args.len() {
                    variant = match args[i].to_lowercase().as_str() {
                        "carding" => MachineVariant::Carding,
                        "df" => MachineVariant::DrawFrame,
                        "flyer" => MachineVariant::Flyer,
                        other => return Err(format!("unknown machine '{}'", other).into()),
                    };
                }
            }
            "--limit" => {
                i += 1;
                if i < args.len() {
                    limit = Some(args[i].parse()?);
                }
            }
            "--verbose" | "-v" => {
                verbose = true;
            }
            _ => {
                eprintln!("Unknown argument: {}", args[i]);
            }
        }
        i += 1;
    }

    let schema_file = schema_file.ok_or("--schema is required")?;

    println!("=== CAN Trace Decoder ===");
    println!("Trace file: {:?}", trace_file);
    println!("Schema: {:?}", schema_file);
    println!("Machine: {}", variant);
    println!();

    let config = DecoderConfig::new().with_variant(variant);
    let decoder = Decoder::from_schema_file(&schema_file, config)?;

    let schema_stats = decoder.schema_stats();
    println!("=== SCHEMA ===");
    println!("Function codes: {}", schema_stats.num_functions);
    println!("Operations: {}", schema_stats.num_operations);
    println!("Errors: {}", schema_stats.num_errors);
    println!();

    println!("=== DECODING TRACE ===\n");
    let report = decoder.decode_file(&trace_file)?;

    let mut stats = TraceStats::new();
    for (count, record) in report.records().iter().enumerate() {
        stats.add(record);
        match limit {
            Some(max) if count == max => println!("\n... (limit of {} records reached)", max),
            Some(max) if count > max => {}
            _ => print_record(record, verbose),
        }
    }

    if !report.issues().is_empty() {
        println!("\n=== ISSUES ===");
        for issue in report.issues() {
            println!("  {}", issue);
        }
    }

    let run = report.stats();
    println!("\nLines: {}  candidates: {}  records: {}  skipped: {}  degraded: {}",
        run.total_lines, run.candidate_lines, run.records, run.skipped, run.degraded);
    stats.print_summary();

    Ok(())
}
