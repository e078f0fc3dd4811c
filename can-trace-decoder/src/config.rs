//! Decoder configuration types
//!
//! Everything here is fixed for the lifetime of a [`Decoder`](crate::Decoder);
//! the machine variant in particular is dispatched once at construction.

use crate::category::CategoryScope;
use crate::tokenizer::RECEIVE_MARKER;
use crate::types::MachineVariant;
use serde::{Deserialize, Serialize};

/// Configuration for the decoder library
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DecoderConfig {
    /// Token that marks a receive frame
    #[serde(default = "default_receive_marker")]
    pub receive_marker: String,

    /// Machine the trace was captured on
    #[serde(default)]
    pub variant: MachineVariant,

    /// Decode lines on the rayon thread pool
    #[serde(default = "default_true")]
    pub parallel: bool,

    /// Which records receive a lift-side tag
    #[serde(default)]
    pub category_scope: CategoryScope,
}

fn default_true() -> bool {
    true
}

fn default_receive_marker() -> String {
    RECEIVE_MARKER.to_string()
}

impl Default for DecoderConfig {
    fn default() -> Self {
        Self {
            receive_marker: default_receive_marker(),
            variant: MachineVariant::default(),
            parallel: true,
            category_scope: CategoryScope::default(),
        }
    }
}

impl DecoderConfig {
    /// Create a new decoder configuration with default settings
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder method: select the machine variant
    pub fn with_variant(mut self, variant: MachineVariant) -> Self {
        self.variant = variant;
        self
    }

    /// Builder method: set the receive marker token
    pub fn with_receive_marker(mut self, marker: impl Into<String>) -> Self {
        self.receive_marker = marker.into();
        self
    }

    /// Builder method: enable or disable parallel decoding
    pub fn with_parallel(mut self, enabled: bool) -> Self {
        self.parallel = enabled;
        self
    }

    /// Builder method: set which records get a lift-side tag
    pub fn with_category_scope(mut self, scope: CategoryScope) -> Self {
        self.category_scope = scope;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decoder_config_builder() {
        let config = DecoderConfig::new()
            .with_variant(MachineVariant::Carding)
            .with_receive_marker("RX")
            .with_parallel(false)
            .with_category_scope(CategoryScope::SignalRecords);

        assert_eq!(config.variant, MachineVariant::Carding);
        assert_eq!(config.receive_marker, "RX");
        assert!(!config.parallel);
        assert_eq!(config.category_scope, CategoryScope::SignalRecords);
    }

    #[test]
    fn test_defaults() {
        let config = DecoderConfig::new();
        assert_eq!(config.receive_marker, "rcv");
        assert_eq!(config.variant, MachineVariant::Flyer);
        assert!(config.parallel);
        assert_eq!(config.category_scope, CategoryScope::AllRecords);
    }

    #[test]
    fn test_deserialize_partial() {
        let config: DecoderConfig =
            serde_json::from_str(r#"{"variant": "df", "category_scope": "signal_records"}"#)
                .unwrap();
        assert_eq!(config.variant, MachineVariant::DrawFrame);
        assert_eq!(config.category_scope, CategoryScope::SignalRecords);
        assert_eq!(config.receive_marker, "rcv");
        assert!(config.parallel);
    }
}
