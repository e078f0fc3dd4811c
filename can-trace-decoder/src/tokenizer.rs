//! Trace line tokenizer
//!
//! Splits one text line of a CAN trace into a [`FrameHeader`]. Only receive
//! frames are candidates; everything else (blank lines, transmit frames,
//! banners) is ignored without a warning.
//!
//! Expected layout of a receive line:
//!
//! ```text
//! [2024-01-01 12:00:00] rcv 0x18010203 0102030405060708090A0B0C0D0E0F1011121314
//! ```

use crate::types::{FrameHeader, LineError};

/// Default token that marks a receive frame
pub const RECEIVE_MARKER: &str = "rcv";

const DATE_TOKEN: usize = 0;
const TIME_TOKEN: usize = 1;
const IDENTIFIER_TOKEN: usize = 3;
const PAYLOAD_TOKEN: usize = 4;
const MIN_TOKENS: usize = PAYLOAD_TOKEN + 1;

/// Tokenize one line
///
/// # Returns
/// * `Ok(None)` if the line carries no receive marker
/// * `Ok(Some(header))` for a well-formed receive frame
/// * `Err(LineError::MalformedLine)` for a receive frame missing fields
pub fn tokenize(
    line_index: usize,
    line: &str,
    receive_marker: &str,
) -> Result<Option<FrameHeader>, LineError> {
    let tokens: Vec<&str> = line.split_whitespace().collect();

    if !tokens.iter().any(|token| *token == receive_marker) {
        return Ok(None);
    }

    if tokens.len() < MIN_TOKENS {
        return Err(LineError::MalformedLine(format!(
            "expected at least {} tokens, found {}",
            MIN_TOKENS,
            tokens.len()
        )));
    }

    let date = strip_first(tokens[DATE_TOKEN]);
    let time = strip_last(tokens[TIME_TOKEN]);
    let extended_id = tokens[IDENTIFIER_TOKEN];
    let payload_hex = tokens[PAYLOAD_TOKEN];

    for (field, value) in [
        ("date", date),
        ("time", time),
        ("identifier", extended_id),
        ("payload", payload_hex),
    ] {
        if value.is_empty() {
            return Err(LineError::MalformedLine(format!("empty {} field", field)));
        }
    }

    Ok(Some(FrameHeader {
        line_index,
        date: date.to_string(),
        time: time.to_string(),
        extended_id: extended_id.to_string(),
        payload_hex: payload_hex.to_string(),
    }))
}

/// Drop the leading delimiter ('[' in most traces)
fn strip_first(token: &str) -> &str {
    let mut chars = token.chars();
    chars.next();
    chars.as_str()
}

/// Drop the trailing delimiter (']' in most traces)
fn strip_last(token: &str) -> &str {
    let mut chars = token.chars();
    chars.next_back();
    chars.as_str()
}
