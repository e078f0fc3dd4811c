//! Message-type branching
//!
//! `Operation` frames name their operation by the raw payload hex string,
//! while `Error` frames name their error by the payload read as a *decimal*
//! integer. The two keyings differ because the schema tables do; they are
//! kept apart here rather than unified.

use crate::schema::SchemaStore;
use crate::types::MessageType;

/// Names attached by the classifier
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Classification {
    pub operation_name: Option<String>,
    pub error_name: Option<String>,
}

/// Look up the operation or error named by a frame's payload
pub fn classify(
    message_type: Option<&MessageType>,
    payload_hex: &str,
    schema: &SchemaStore,
) -> Classification {
    match message_type {
        Some(MessageType::Operation) => Classification {
            operation_name: schema.resolve_operation(payload_hex).map(str::to_string),
            error_name: None,
        },
        Some(MessageType::Error) => match payload_hex.parse::<i64>() {
            Ok(value) => Classification {
                operation_name: None,
                error_name: schema.resolve_error(value).map(str::to_string),
            },
            Err(_) => {
                log::debug!("Error payload {:?} is not a decimal value", payload_hex);
                Classification::default()
            }
        },
        Some(MessageType::Other(_)) | None => Classification::default(),
    }
}
