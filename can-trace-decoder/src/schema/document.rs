//! Serde-backed schema document
//!
//! A schema document is a map of table name → row index → column → cell:
//!
//! ```toml
//! [FunctionID."01"]
//! msgType = "Telemetry"
//!
//! [FF_IDs."03"]
//! name = "Right Motor"
//!
//! [Error."17"]
//! msgType = "Overcurrent"
//! ```

use super::{SchemaSource, TableRow};
use crate::types::{DecoderError, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::path::Path;

/// A single cell; spreadsheets exported to TOML/JSON often carry numbers
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CellValue {
    Text(String),
    Integer(i64),
    Float(f64),
    Boolean(bool),
}

impl fmt::Display for CellValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CellValue::Text(v) => f.write_str(v),
            CellValue::Integer(v) => write!(f, "{}", v),
            CellValue::Float(v) => write!(f, "{}", v),
            CellValue::Boolean(v) => write!(f, "{}", v),
        }
    }
}

type Rows = BTreeMap<String, BTreeMap<String, CellValue>>;

/// In-memory schema document
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SchemaDocument {
    tables: BTreeMap<String, Rows>,
}

impl SchemaDocument {
    /// Create an empty document
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a document from TOML text
    pub fn from_toml_str(content: &str) -> Result<Self> {
        toml::from_str(content)
            .map_err(|e| DecoderError::SchemaLoad(format!("Invalid TOML schema: {}", e)))
    }

    /// Parse a document from JSON text
    pub fn from_json_str(content: &str) -> Result<Self> {
        serde_json::from_str(content)
            .map_err(|e| DecoderError::SchemaLoad(format!("Invalid JSON schema: {}", e)))
    }

    /// Load a schema file, picking the format from its extension
    pub fn load(path: &Path) -> Result<Self> {
        log::info!("Loading schema file: {:?}", path);

        let extension = path
            .extension()
            .and_then(|s| s.to_str())
            .map(|s| s.to_lowercase());

        let content = std::fs::read_to_string(path).map_err(|e| {
            DecoderError::SchemaLoad(format!("Failed to read file {:?}: {}", path, e))
        })?;

        match extension.as_deref() {
            Some("toml") => Self::from_toml_str(&content),
            Some("json") => Self::from_json_str(&content),
            _ => Err(DecoderError::UnsupportedFormat(format!(
                "schema {:?} (expected .toml or .json)",
                path
            ))),
        }
    }

    /// Builder method: set one cell, creating the table and row as needed
    pub fn with_cell(
        mut self,
        table: &str,
        index: &str,
        column: &str,
        value: impl Into<String>,
    ) -> Self {
        self.tables
            .entry(table.to_string())
            .or_default()
            .entry(index.to_string())
            .or_default()
            .insert(column.to_string(), CellValue::Text(value.into()));
        self
    }

    /// Builder method: declare a table even if it stays empty
    pub fn with_table(mut self, table: &str) -> Self {
        self.tables.entry(table.to_string()).or_default();
        self
    }

    /// Names of all tables in the document
    pub fn table_names(&self) -> impl Iterator<Item = &str> {
        self.tables.keys().map(String::as_str)
    }
}

impl SchemaSource for SchemaDocument {
    fn table(&self, name: &str) -> Option<Vec<TableRow>> {
        let rows = self.tables.get(name)?;
        Some(
            rows.iter()
                .map(|(index, cells)| TableRow {
                    index: index.clone(),
                    columns: cells
                        .iter()
                        .map(|(column, cell)| (column.clone(), cell.to_string()))
                        .collect(),
                })
                .collect(),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const SAMPLE: &str = r#"
        [FunctionID."01"]
        msgType = "Telemetry"

        [FF_IDs."03"]
        name = "Right Motor"

        [Error."17"]
        msgType = "Overcurrent"
        code = 17
    "#;

    #[test]
    fn test_toml_document() {
        let doc = SchemaDocument::from_toml_str(SAMPLE).unwrap();
        let rows = doc.table("FunctionID").unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].index, "01");
        assert_eq!(rows[0].column("msgType"), Some("Telemetry"));

        let errors = doc.table("Error").unwrap();
        assert_eq!(errors[0].column("code"), Some("17"));

        assert!(doc.table("DF_IDs").is_none());
    }

    #[test]
    fn test_json_document() {
        let doc = SchemaDocument::from_json_str(
            r#"{"Operation": {"A1B2": {"msgType": "Start"}}}"#,
        )
        .unwrap();
        let rows = doc.table("Operation").unwrap();
        assert_eq!(rows[0].index, "A1B2");
        assert_eq!(rows[0].column("msgType"), Some("Start"));
    }

    #[test]
    fn test_invalid_document() {
        let result = SchemaDocument::from_toml_str("[FunctionID\nmsgType =");
        assert!(matches!(result, Err(DecoderError::SchemaLoad(_))));
    }

    #[test]
    fn test_load_by_extension() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        file.write_all(SAMPLE.as_bytes()).unwrap();

        let doc = SchemaDocument::load(file.path()).unwrap();
        assert_eq!(doc.table_names().count(), 3);

        let other = tempfile::Builder::new().suffix(".ods").tempfile().unwrap();
        assert!(matches!(
            SchemaDocument::load(other.path()),
            Err(DecoderError::UnsupportedFormat(_))
        ));
    }

    #[test]
    fn test_builder() {
        let doc = SchemaDocument::new()
            .with_cell("FF_IDs", "02", "name", "Controller")
            .with_table("DF_IDs");
        assert_eq!(doc.table("FF_IDs").unwrap()[0].column("name"), Some("Controller"));
        assert!(doc.table("DF_IDs").unwrap().is_empty());
    }
}
