//! Immutable schema lookup tables
//!
//! Built once from a [`SchemaSource`] and shared read-only by every line of a
//! decode run. Lookups never fail: unknown codes are expected in real traces
//! and simply resolve to `None`.

use super::{
    SchemaSource, TableRow, ERROR_TABLE, FUNCTION_TABLE, MSG_TYPE_COLUMN, NAME_COLUMN,
    OPERATION_TABLE,
};
use crate::types::{DecoderError, MachineVariant, MessageType, Result};
use std::collections::hash_map::Entry;
use std::collections::HashMap;
use std::hash::Hash;

/// The schema lookup tables
#[derive(Debug, Clone, Default)]
pub struct SchemaStore {
    /// Function code → declared message type
    functions: HashMap<u8, MessageType>,
    /// Per-variant address code → node name
    addresses: HashMap<MachineVariant, HashMap<u8, String>>,
    /// Normalised hex payload → operation name
    operations: HashMap<String, String>,
    /// Decimal payload value → error name
    ///
    /// Keyed by integer while operations are keyed by hex text; both follow
    /// how the schema tables are authored.
    errors: HashMap<i64, String>,
}

impl SchemaStore {
    /// Build all lookup tables from a source
    ///
    /// Fails with `SchemaLoad` if a table or value column is missing, a key
    /// cannot be parsed, or a key appears twice.
    pub fn from_source(source: &dyn SchemaSource) -> Result<Self> {
        let functions = build_table(source, FUNCTION_TABLE, MSG_TYPE_COLUMN, parse_code)?
            .into_iter()
            .map(|(code, name)| (code, MessageType::parse(&name)))
            .collect();

        let mut addresses = HashMap::new();
        for variant in MachineVariant::ALL {
            let table = build_table(source, variant.address_table_name(), NAME_COLUMN, parse_code)?;
            addresses.insert(variant, table);
        }

        let operations = build_table(source, OPERATION_TABLE, MSG_TYPE_COLUMN, |index| {
            Some(normalize_payload(index))
        })?;
        let errors = build_table(source, ERROR_TABLE, MSG_TYPE_COLUMN, |index| {
            index.trim().parse::<i64>().ok()
        })?;

        let store = Self {
            functions,
            addresses,
            operations,
            errors,
        };

        let stats = store.stats();
        log::info!(
            "Schema loaded: {} function codes, {} operations, {} errors, addresses carding={} df={} flyer={}",
            stats.num_functions,
            stats.num_operations,
            stats.num_errors,
            stats.num_carding_addresses,
            stats.num_df_addresses,
            stats.num_flyer_addresses,
        );

        Ok(store)
    }

    /// Message type declared for a function code
    pub fn resolve_function(&self, code: u8) -> Option<&MessageType> {
        self.functions.get(&code)
    }

    /// Node name for an address code in the given variant's table
    pub fn resolve_address(&self, variant: MachineVariant, code: u8) -> Option<&str> {
        self.addresses
            .get(&variant)
            .and_then(|table| table.get(&code))
            .map(String::as_str)
    }

    /// Operation name for a payload hex string
    pub fn resolve_operation(&self, payload_hex: &str) -> Option<&str> {
        self.operations
            .get(&normalize_payload(payload_hex))
            .map(String::as_str)
    }

    /// Error name for a decimal payload value
    pub fn resolve_error(&self, value: i64) -> Option<&str> {
        self.errors.get(&value).map(String::as_str)
    }

    fn num_addresses(&self, variant: MachineVariant) -> usize {
        self.addresses.get(&variant).map_or(0, HashMap::len)
    }

    /// Get schema statistics
    pub fn stats(&self) -> SchemaStats {
        SchemaStats {
            num_functions: self.functions.len(),
            num_carding_addresses: self.num_addresses(MachineVariant::Carding),
            num_df_addresses: self.num_addresses(MachineVariant::DrawFrame),
            num_flyer_addresses: self.num_addresses(MachineVariant::Flyer),
            num_operations: self.operations.len(),
            num_errors: self.errors.len(),
        }
    }
}

/// Schema statistics
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SchemaStats {
    pub num_functions: usize,
    pub num_carding_addresses: usize,
    pub num_df_addresses: usize,
    pub num_flyer_addresses: usize,
    pub num_operations: usize,
    pub num_errors: usize,
}

/// Parse a one-byte hex code ("3", "03", "0x03")
pub(crate) fn parse_code(text: &str) -> Option<u8> {
    let text = text.trim();
    let digits = text
        .strip_prefix("0x")
        .or_else(|| text.strip_prefix("0X"))
        .unwrap_or(text);
    if digits.is_empty() || digits.len() > 2 {
        return None;
    }
    u8::from_str_radix(digits, 16).ok()
}

/// Canonical form of a payload hex string used as an operation key
fn normalize_payload(text: &str) -> String {
    let text = text.trim();
    text.strip_prefix("0x")
        .or_else(|| text.strip_prefix("0X"))
        .unwrap_or(text)
        .to_ascii_uppercase()
}

fn build_table<K, F>(
    source: &dyn SchemaSource,
    table: &str,
    column: &str,
    parse_key: F,
) -> Result<HashMap<K, String>>
where
    K: Eq + Hash,
    F: Fn(&str) -> Option<K>,
{
    let rows = source
        .table(table)
        .ok_or_else(|| DecoderError::SchemaLoad(format!("Missing table '{}'", table)))?;

    let mut map = HashMap::with_capacity(rows.len());
    for TableRow { index, columns } in rows {
        let key = parse_key(&index).ok_or_else(|| {
            DecoderError::SchemaLoad(format!("Invalid key {:?} in table '{}'", index, table))
        })?;
        let value = columns.get(column).cloned().ok_or_else(|| {
            DecoderError::SchemaLoad(format!(
                "Row {:?} in table '{}' has no '{}' column",
                index, table, column
            ))
        })?;

        match map.entry(key) {
            Entry::Occupied(_) => {
                return Err(DecoderError::SchemaLoad(format!(
                    "Duplicate key {:?} in table '{}'",
                    index, table
                )));
            }
            Entry::Vacant(slot) => {
                slot.insert(value);
            }
        }
    }

    log::debug!("Table '{}': {} rows", table, map.len());
    Ok(map)
}
