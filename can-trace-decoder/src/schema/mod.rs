//! Schema tables and their sources
//!
//! The decoder never reads schema files itself: it builds a [`SchemaStore`]
//! from anything implementing [`SchemaSource`]. [`SchemaDocument`] is the
//! serde-backed source used by the CLI (TOML or JSON).

pub mod document;
pub mod store;

pub use document::{CellValue, SchemaDocument};
pub use store::{SchemaStats, SchemaStore};

use std::collections::BTreeMap;

/// Table of function codes (column `msgType`)
pub const FUNCTION_TABLE: &str = "FunctionID";
/// Table of operation payloads (column `msgType`)
pub const OPERATION_TABLE: &str = "Operation";
/// Table of decimal error values (column `msgType`)
pub const ERROR_TABLE: &str = "Error";

/// Value column of the function, operation and error tables
pub const MSG_TYPE_COLUMN: &str = "msgType";
/// Value column of the address tables
pub const NAME_COLUMN: &str = "name";

/// One row of a named table: the index cell plus the other columns
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableRow {
    pub index: String,
    pub columns: BTreeMap<String, String>,
}

impl TableRow {
    pub fn column(&self, name: &str) -> Option<&str> {
        self.columns.get(name).map(String::as_str)
    }
}

/// Abstract tabular source the schema store is built from
pub trait SchemaSource {
    /// Rows of the named table, or `None` if the source has no such table
    fn table(&self, name: &str) -> Option<Vec<TableRow>>;
}
