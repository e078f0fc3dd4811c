//! Flat tabular view of decoded records
//!
//! Columns are the union of every field populated by any record, in order of
//! first appearance; a record missing a column gets an empty cell.

use crate::types::DecodedRecord;
use serde::Serialize;

pub const COL_DATE: &str = "date";
pub const COL_TIME: &str = "time";
pub const COL_EXTENDED_ID: &str = "extID";
pub const COL_PAYLOAD: &str = "hexData";
pub const COL_MESSAGE_TYPE: &str = "msgType";
pub const COL_SOURCE: &str = "source";
pub const COL_DESTINATION: &str = "dst";
pub const COL_OPERATION: &str = "OperationCommand";
pub const COL_ERROR: &str = "ErrorCommand";
pub const COL_CATEGORY: &str = "LiftSide";

impl DecodedRecord {
    /// Populated fields of this record as (column, text) pairs
    pub fn cells(&self) -> Vec<(&'static str, String)> {
        let mut cells = vec![
            (COL_DATE, self.header.date.clone()),
            (COL_TIME, self.header.time.clone()),
            (COL_EXTENDED_ID, self.header.extended_id.clone()),
            (COL_PAYLOAD, self.header.payload_hex.clone()),
        ];

        let optional = [
            (COL_MESSAGE_TYPE, self.message_type.as_ref().map(|t| t.to_string())),
            (COL_SOURCE, self.source_name.clone()),
            (COL_DESTINATION, self.destination_name.clone()),
            (COL_OPERATION, self.operation_name.clone()),
            (COL_ERROR, self.error_name.clone()),
        ];
        cells.extend(
            optional
                .into_iter()
                .filter_map(|(column, value)| value.map(|v| (column, v))),
        );

        if let Some(signals) = &self.signals {
            cells.extend(
                signals
                    .fields()
                    .into_iter()
                    .map(|(field, value)| (field.name(), value.to_string())),
            );
        }

        if let Some(category) = self.category {
            cells.push((COL_CATEGORY, category.label().to_string()));
        }

        cells
    }
}

/// Rows and columns ready for CSV/JSON export
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct FlatTable {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl FlatTable {
    /// Build a table from any subset of records, keeping their order
    pub fn for_records<'a>(records: impl IntoIterator<Item = &'a DecodedRecord>) -> Self {
        let mut columns: Vec<&'static str> = Vec::new();
        let record_cells: Vec<Vec<(&'static str, String)>> = records
            .into_iter()
            .map(|record| {
                let cells = record.cells();
                for (column, _) in &cells {
                    if !columns.contains(column) {
                        columns.push(*column);
                    }
                }
                cells
            })
            .collect();

        let rows = record_cells
            .into_iter()
            .map(|cells| {
                columns
                    .iter()
                    .map(|column| {
                        cells
                            .iter()
                            .find(|(name, _)| name == column)
                            .map(|(_, value)| value.clone())
                            .unwrap_or_default()
                    })
                    .collect()
            })
            .collect();

        Self {
            columns: columns.into_iter().map(str::to_string).collect(),
            rows,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Index of a column by name
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }
}
