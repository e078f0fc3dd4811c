//! Record aggregation
//!
//! Reduces per-line outcomes into a [`DecodeReport`]: the ordered record
//! collection, every skipped or degraded line, and simple run counters.

use crate::payload::NumericField;
use crate::table::FlatTable;
use crate::types::{CategoryTag, DecodedRecord, LineError};
use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;

/// Result of running one line through the pipeline
#[derive(Debug, Clone, PartialEq)]
pub enum LineOutcome {
    /// Not a receive frame
    Ignored { line_index: usize },
    /// Receive frame dropped before a record could be built
    Skipped { line_index: usize, error: LineError },
    /// Record built; `warnings` lists stages that degraded it
    Decoded {
        record: DecodedRecord,
        warnings: Vec<LineError>,
    },
}

impl LineOutcome {
    pub fn line_index(&self) -> usize {
        match self {
            LineOutcome::Ignored { line_index } => *line_index,
            LineOutcome::Skipped { line_index, .. } => *line_index,
            LineOutcome::Decoded { record, .. } => record.header.line_index,
        }
    }
}

/// What happened to a line with a problem
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum IssueAction {
    /// No record was produced
    Skipped,
    /// A record was produced with some fields omitted
    Degraded,
}

impl fmt::Display for IssueAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IssueAction::Skipped => write!(f, "skipped"),
            IssueAction::Degraded => write!(f, "degraded"),
        }
    }
}

/// One skipped or degraded line
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LineIssue {
    pub line_index: usize,
    pub action: IssueAction,
    pub error: LineError,
}

impl fmt::Display for LineIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "line {} {}: {}", self.line_index + 1, self.action, self.error)
    }
}

/// Run counters
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct RunStats {
    /// Lines seen, including ignored ones
    pub total_lines: usize,
    /// Lines carrying the receive marker
    pub candidate_lines: usize,
    /// Records produced
    pub records: usize,
    /// Candidate lines dropped
    pub skipped: usize,
    /// Records with at least one warning
    pub degraded: usize,
}

/// Ordered numeric series for one field
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FieldSeries {
    pub field: NumericField,
    /// (record index, value); indices refer to the full record collection
    pub points: Vec<(usize, f64)>,
}

/// Everything produced by one decode run
#[derive(Debug, Clone, Default)]
pub struct DecodeReport {
    records: Vec<DecodedRecord>,
    issues: Vec<LineIssue>,
    stats: RunStats,
}

impl DecodeReport {
    /// Reduce line outcomes into a report
    ///
    /// Outcomes may arrive in any order; they are put back into input line
    /// order first.
    pub fn from_outcomes(mut outcomes: Vec<LineOutcome>) -> Self {
        outcomes.sort_by_key(LineOutcome::line_index);

        let mut report = DecodeReport {
            stats: RunStats {
                total_lines: outcomes.len(),
                ..RunStats::default()
            },
            ..DecodeReport::default()
        };

        for outcome in outcomes {
            match outcome {
                LineOutcome::Ignored { .. } => {}
                LineOutcome::Skipped { line_index, error } => {
                    report.stats.candidate_lines += 1;
                    report.stats.skipped += 1;
                    report.issues.push(LineIssue {
                        line_index,
                        action: IssueAction::Skipped,
                        error,
                    });
                }
                LineOutcome::Decoded { record, warnings } => {
                    report.stats.candidate_lines += 1;
                    report.stats.records += 1;
                    if !warnings.is_empty() {
                        report.stats.degraded += 1;
                    }
                    let line_index = record.header.line_index;
                    report.issues.extend(warnings.into_iter().map(|error| LineIssue {
                        line_index,
                        action: IssueAction::Degraded,
                        error,
                    }));
                    report.records.push(record);
                }
            }
        }

        report
    }

    /// All records, in input order
    pub fn records(&self) -> &[DecodedRecord] {
        &self.records
    }

    /// Consume the report, keeping only the records
    pub fn into_records(self) -> Vec<DecodedRecord> {
        self.records
    }

    /// Skipped and degraded lines, in input order
    pub fn issues(&self) -> &[LineIssue] {
        &self.issues
    }

    pub fn stats(&self) -> RunStats {
        self.stats
    }

    /// Group records by lift side; untagged records are left out
    pub fn partition_by_category(&self) -> BTreeMap<CategoryTag, Vec<&DecodedRecord>> {
        let mut partitions: BTreeMap<CategoryTag, Vec<&DecodedRecord>> = BTreeMap::new();
        for record in &self.records {
            if let Some(category) = record.category {
                partitions.entry(category).or_default().push(record);
            }
        }
        partitions
    }

    /// Project numeric fields into (index, value) series
    ///
    /// With a category filter, only records of that category contribute, but
    /// indices still refer to positions in the full collection. Records
    /// without a field are skipped for that field.
    pub fn project(
        &self,
        fields: &[NumericField],
        category: Option<CategoryTag>,
    ) -> Vec<FieldSeries> {
        let selected: Vec<(usize, &DecodedRecord)> = self
            .records
            .iter()
            .enumerate()
            .filter(|(_, record)| category.map_or(true, |c| record.category == Some(c)))
            .collect();

        fields
            .iter()
            .map(|&field| FieldSeries {
                field,
                points: selected
                    .iter()
                    .filter_map(|(index, record)| {
                        let signals = record.signals.as_ref()?;
                        signals.value(field).map(|value| (*index, value.as_f64()))
                    })
                    .collect(),
            })
            .collect()
    }

    /// Flat table of all records
    pub fn to_table(&self) -> FlatTable {
        FlatTable::for_records(&self.records)
    }
}
