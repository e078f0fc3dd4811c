//! Core types for the CAN trace decoder library
//!
//! This module defines the fundamental types that flow through the decoding
//! pipeline: frame headers produced by the tokenizer, the decoded record
//! emitted per line, and the error kinds raised along the way.

use crate::payload::PayloadSignals;
use crate::resolver::IdentifierCodes;
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Timestamp type used throughout the decoder (trace logs carry no zone)
pub type Timestamp = NaiveDateTime;

/// Result type for decoder operations
pub type Result<T> = std::result::Result<T, DecoderError>;

/// Recoverable errors scoped to a single log line
///
/// None of these abort a run: the line is either skipped or its record is
/// emitted without the part that failed.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LineError {
    #[error("Malformed line: {0}")]
    MalformedLine(String),

    #[error("Malformed extended identifier: {0:?}")]
    MalformedIdentifier(String),

    #[error("Payload decode error: {0}")]
    PayloadDecode(String),
}

/// Errors that can occur while loading a schema or decoding a trace
#[derive(Debug, thiserror::Error)]
pub enum DecoderError {
    #[error("Failed to load schema: {0}")]
    SchemaLoad(String),

    #[error("Unsupported file format: {0}")]
    UnsupportedFormat(String),

    #[error("Failed to read log: {0}")]
    LogRead(#[from] std::io::Error),

    #[error(transparent)]
    Line(#[from] LineError),
}

/// Machine type the trace was captured on
///
/// Selects which address table names the nodes and whether the fixed-layout
/// payload decoder applies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MachineVariant {
    Carding,
    #[serde(rename = "df")]
    DrawFrame,
    #[default]
    Flyer,
}

impl MachineVariant {
    /// All variants, in schema table order
    pub const ALL: [MachineVariant; 3] = [
        MachineVariant::Carding,
        MachineVariant::DrawFrame,
        MachineVariant::Flyer,
    ];

    /// Name of the address table this variant resolves nodes against
    pub fn address_table_name(&self) -> &'static str {
        match self {
            MachineVariant::Carding => "Carding_IDs",
            MachineVariant::DrawFrame => "DF_IDs",
            MachineVariant::Flyer => "FF_IDs",
        }
    }

    /// Whether frames on this machine carry the fixed-layout lift payload
    pub fn decodes_payload(&self) -> bool {
        matches!(self, MachineVariant::Flyer)
    }
}

impl fmt::Display for MachineVariant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MachineVariant::Carding => write!(f, "CARDING"),
            MachineVariant::DrawFrame => write!(f, "DF"),
            MachineVariant::Flyer => write!(f, "FLYER"),
        }
    }
}

/// One tokenized receive frame
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FrameHeader {
    /// Zero-based position of the line in the input
    pub line_index: usize,
    /// Date token with its leading delimiter stripped
    pub date: String,
    /// Time token with its trailing delimiter stripped
    pub time: String,
    /// Extended identifier exactly as logged (e.g. "0x18010203")
    pub extended_id: String,
    /// Payload as logged, hex characters
    pub payload_hex: String,
}

impl FrameHeader {
    /// Parse `date` and `time` into a timestamp
    ///
    /// Returns `None` when the tokens are not a recognised datetime; the
    /// textual fields stay authoritative either way.
    pub fn timestamp(&self) -> Option<Timestamp> {
        let joined = format!("{} {}", self.date, self.time);
        ["%Y-%m-%d %H:%M:%S%.f", "%d-%m-%Y %H:%M:%S%.f", "%Y/%m/%d %H:%M:%S%.f"]
            .iter()
            .find_map(|fmt| NaiveDateTime::parse_from_str(&joined, fmt).ok())
    }
}

/// Message type declared for a function code
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub enum MessageType {
    /// Payload names an operation (looked up by hex string)
    Operation,
    /// Payload names an error (looked up by decimal value)
    Error,
    /// Any other declared type; no payload lookup
    Other(String),
}

impl MessageType {
    pub fn parse(name: &str) -> Self {
        match name {
            "Operation" => MessageType::Operation,
            "Error" => MessageType::Error,
            other => MessageType::Other(other.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            MessageType::Operation => "Operation",
            MessageType::Error => "Error",
            MessageType::Other(name) => name,
        }
    }
}

impl fmt::Display for MessageType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Signal value types produced by the payload decoder
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(untagged)]
pub enum SignalValue {
    /// Unscaled integer value
    Integer(i64),
    /// Floating-point value (after scaling)
    Float(f64),
}

impl fmt::Display for SignalValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SignalValue::Integer(v) => write!(f, "{}", v),
            SignalValue::Float(v) => write!(f, "{}", v),
        }
    }
}

impl SignalValue {
    /// Convert signal value to f64 for plotting/projection
    pub fn as_f64(&self) -> f64 {
        match self {
            SignalValue::Integer(v) => *v as f64,
            SignalValue::Float(v) => *v,
        }
    }

    /// Convert signal value to i64, truncating scaled values
    pub fn as_i64(&self) -> i64 {
        match self {
            SignalValue::Integer(v) => *v,
            SignalValue::Float(v) => *v as i64,
        }
    }
}

/// Physical side of the lift a frame belongs to
///
/// Derived from node names, not authoritative.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum CategoryTag {
    RightLift,
    LeftLift,
    UnknownLift,
}

impl CategoryTag {
    pub fn label(&self) -> &'static str {
        match self {
            CategoryTag::RightLift => "Right Lift",
            CategoryTag::LeftLift => "Left Lift",
            CategoryTag::UnknownLift => "Unknown Lift",
        }
    }
}

impl fmt::Display for CategoryTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// One decoded trace line - the primary output of the decoder
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DecodedRecord {
    /// Tokenized header fields
    pub header: FrameHeader,
    /// Function/destination/source codes taken from the identifier
    pub codes: IdentifierCodes,
    /// Message type of the function code (None if the code is unknown)
    pub message_type: Option<MessageType>,
    /// Source node name (None if the code is unknown)
    pub source_name: Option<String>,
    /// Destination node name (None if the code is unknown)
    pub destination_name: Option<String>,
    /// Operation name for `Operation` messages with a known payload
    pub operation_name: Option<String>,
    /// Error name for `Error` messages with a known payload value
    pub error_name: Option<String>,
    /// Decoded fixed-layout payload, when the variant has one
    pub signals: Option<PayloadSignals>,
    /// Derived lift side
    pub category: Option<CategoryTag>,
}
