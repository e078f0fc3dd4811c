//! Extended identifier decomposition and name resolution
//!
//! The last six hex characters of a 29-bit identifier carry three one-byte
//! codes:
//!
//! ```text
//!   ... F F D D S S
//!       │   │   └── source address       (offset -2..)
//!       │   └────── destination address  (offset -4..-2)
//!       └────────── function code        (offset -6..-4)
//! ```
//!
//! Anything before those six characters (priority bits, a `0x` prefix) is
//! irrelevant to decoding.

use crate::schema::SchemaStore;
use crate::types::{FrameHeader, LineError, MachineVariant, MessageType};
use serde::Serialize;

/// Number of trailing hex characters that carry the codes
const CODE_CHARS: usize = 6;

/// The three codes carried by an extended identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct IdentifierCodes {
    pub function: u8,
    pub destination: u8,
    pub source: u8,
}

impl IdentifierCodes {
    /// Decompose an extended identifier string
    pub fn parse(extended_id: &str) -> Result<Self, LineError> {
        let malformed = || LineError::MalformedIdentifier(extended_id.to_string());

        let bytes = extended_id.as_bytes();
        if bytes.len() < CODE_CHARS {
            return Err(malformed());
        }
        let tail = &bytes[bytes.len() - CODE_CHARS..];
        if !tail.iter().all(u8::is_ascii_hexdigit) {
            return Err(malformed());
        }

        let code_at = |offset: usize| -> Result<u8, LineError> {
            let pair = std::str::from_utf8(&tail[offset..offset + 2]).map_err(|_| malformed())?;
            u8::from_str_radix(pair, 16).map_err(|_| malformed())
        };

        Ok(Self {
            function: code_at(0)?,
            destination: code_at(2)?,
            source: code_at(4)?,
        })
    }
}

/// Header-level fields resolved against the schema
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedIdentity {
    pub codes: IdentifierCodes,
    pub message_type: Option<MessageType>,
    pub source_name: Option<String>,
    pub destination_name: Option<String>,
}

/// Decompose a header's identifier and resolve its codes
///
/// Unknown codes leave the matching name as `None`; only a malformed
/// identifier fails.
pub fn resolve(
    header: &FrameHeader,
    schema: &SchemaStore,
    variant: MachineVariant,
) -> Result<ResolvedIdentity, LineError> {
    let codes = IdentifierCodes::parse(&header.extended_id)?;

    let message_type = schema.resolve_function(codes.function).cloned();
    if message_type.is_none() {
        log::trace!(
            "line {}: unknown function code 0x{:02X}",
            header.line_index,
            codes.function
        );
    }

    let lookup_node = |code: u8| {
        let name = schema.resolve_address(variant, code).map(str::to_string);
        if name.is_none() {
            log::trace!(
                "line {}: unknown {} address 0x{:02X}",
                header.line_index,
                variant,
                code
            );
        }
        name
    };

    Ok(ResolvedIdentity {
        codes,
        message_type,
        source_name: lookup_node(codes.source),
        destination_name: lookup_node(codes.destination),
    })
}
