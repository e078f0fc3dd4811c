//! Export of decoded tables (CSV / JSON)
//!
//! Writes the full record table plus, optionally, one table per lift side.

use crate::config::OutputFormat;
use anyhow::{Context, Result};
use can_trace_decoder::{CategoryTag, DecodeReport, FlatTable};
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

/// Base name of the full-table export
pub const DECODED_FILE_STEM: &str = "decoded_log";

/// Write the full table, and the per-category tables if requested
///
/// Returns the paths written, full table first.
pub fn export_report(
    report: &DecodeReport,
    dir: &Path,
    format: OutputFormat,
    split_by_category: bool,
) -> Result<Vec<PathBuf>> {
    std::fs::create_dir_all(dir)
        .with_context(|| format!("Failed to create output directory: {:?}", dir))?;

    let mut written = Vec::new();

    let path = dir.join(format!("{}.{}", DECODED_FILE_STEM, format.extension()));
    write_table(&report.to_table(), &path, format)?;
    written.push(path);

    if split_by_category {
        for (category, records) in report.partition_by_category() {
            let path = dir.join(format!("{}.{}", category_file_stem(category), format.extension()));
            write_table(&FlatTable::for_records(records), &path, format)?;
            written.push(path);
        }
    }

    Ok(written)
}

/// File stem for one lift side ("Right Lift" → "right_lift")
pub fn category_file_stem(category: CategoryTag) -> String {
    category.label().to_lowercase().replace(' ', "_")
}

fn write_table(table: &FlatTable, path: &Path, format: OutputFormat) -> Result<()> {
    log::debug!("Writing {} rows to {:?}", table.rows.len(), path);

    let file = File::create(path).with_context(|| format!("Failed to create {:?}", path))?;
    let mut writer = BufWriter::new(file);

    match format {
        OutputFormat::Csv => write_csv(table, &mut writer),
        OutputFormat::Json => serde_json::to_writer_pretty(&mut writer, table)
            .map_err(anyhow::Error::from),
    }
    .with_context(|| format!("Failed to write {:?}", path))?;

    writer.flush()?;
    Ok(())
}

/// RFC 4180 style CSV: header row, cells quoted only when needed
pub fn write_csv(table: &FlatTable, out: &mut impl Write) -> Result<()> {
    write_csv_row(out, &table.columns)?;
    for row in &table.rows {
        write_csv_row(out, row)?;
    }
    Ok(())
}

fn write_csv_row(out: &mut impl Write, cells: &[String]) -> Result<()> {
    let line = cells
        .iter()
        .map(|cell| escape_csv(cell))
        .collect::<Vec<_>>()
        .join(",");
    writeln!(out, "{}", line)?;
    Ok(())
}

fn escape_csv(cell: &str) -> String {
    if cell.contains([',', '"', '\n', '\r']) {
        format!("\"{}\"", cell.replace('"', "\"\""))
    } else {
        cell.to_string()
    }
}
