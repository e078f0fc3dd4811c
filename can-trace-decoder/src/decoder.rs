//! Main decoder API
//!
//! This module provides the primary interface for the decoder library.
//! The Decoder struct owns the schema store and the per-variant pipeline, and
//! turns trace lines into a [`DecodeReport`].

use crate::aggregate::{DecodeReport, LineOutcome};
use crate::category::{derive_category, CategoryScope};
use crate::classifier::classify;
use crate::config::DecoderConfig;
use crate::payload::{FlyerLiftDecoder, PayloadDecoder};
use crate::resolver::resolve;
use crate::schema::{SchemaDocument, SchemaStats, SchemaStore};
use crate::tokenizer::tokenize;
use crate::types::{DecodedRecord, MachineVariant, Result};
use rayon::prelude::*;
use std::path::Path;

/// The main decoder struct - entry point for all decoding operations
///
/// Immutable once built, so one decoder can be shared across threads.
pub struct Decoder {
    /// Lookup tables, read-only for the whole run
    schema: SchemaStore,
    config: DecoderConfig,
    /// Payload layout of the configured variant, if it has one
    payload_decoder: Option<Box<dyn PayloadDecoder>>,
}

impl Decoder {
    /// Create a decoder for an already-built schema
    pub fn new(schema: SchemaStore, config: DecoderConfig) -> Self {
        let payload_decoder = payload_decoder_for(config.variant);
        log::debug!(
            "Decoder for {} (payload layout: {})",
            config.variant,
            payload_decoder.as_ref().map_or("none", |d| d.name())
        );

        Self {
            schema,
            config,
            payload_decoder,
        }
    }

    /// Load a TOML/JSON schema file and create a decoder for it
    ///
    /// # Example
    /// ```no_run
    /// use can_trace_decoder::{Decoder, DecoderConfig};
    /// use std::path::Path;
    ///
    /// let decoder = Decoder::from_schema_file(Path::new("schema.toml"), DecoderConfig::new()).unwrap();
    /// let report = decoder.decode_file(Path::new("trace.txt")).unwrap();
    /// println!("{} records", report.records().len());
    /// ```
    pub fn from_schema_file(path: &Path, config: DecoderConfig) -> Result<Self> {
        let document = SchemaDocument::load(path)?;
        let schema = SchemaStore::from_source(&document)?;
        Ok(Self::new(schema, config))
    }

    pub fn config(&self) -> &DecoderConfig {
        &self.config
    }

    pub fn schema(&self) -> &SchemaStore {
        &self.schema
    }

    /// Get statistics about the loaded schema
    pub fn schema_stats(&self) -> SchemaStats {
        self.schema.stats()
    }

    /// Run one line through the whole pipeline
    ///
    /// Never fails: problems become a `Skipped` outcome or warnings on a
    /// `Decoded` one, and each is logged once.
    pub fn decode_line(&self, line_index: usize, line: &str) -> LineOutcome {
        let header = match tokenize(line_index, line, &self.config.receive_marker) {
            Ok(Some(header)) => header,
            Ok(None) => return LineOutcome::Ignored { line_index },
            Err(error) => {
                log::warn!("Line {} skipped: {}", line_index + 1, error);
                return LineOutcome::Skipped { line_index, error };
            }
        };

        let identity = match resolve(&header, &self.schema, self.config.variant) {
            Ok(identity) => identity,
            Err(error) => {
                log::warn!("Line {} skipped: {}", line_index + 1, error);
                return LineOutcome::Skipped { line_index, error };
            }
        };

        let classification = classify(
            identity.message_type.as_ref(),
            &header.payload_hex,
            &self.schema,
        );

        let mut warnings = Vec::new();
        let signals = self
            .payload_decoder
            .as_ref()
            .and_then(|decoder| match decoder.decode(&header.payload_hex) {
                Ok(signals) => Some(signals),
                Err(error) => {
                    log::warn!("Line {} degraded: {}", line_index + 1, error);
                    warnings.push(error);
                    None
                }
            });

        let category = match self.config.category_scope {
            CategoryScope::SignalRecords if signals.is_none() => None,
            _ => Some(derive_category(
                identity.source_name.as_deref(),
                identity.destination_name.as_deref(),
            )),
        };

        LineOutcome::Decoded {
            record: DecodedRecord {
                header,
                codes: identity.codes,
                message_type: identity.message_type,
                source_name: identity.source_name,
                destination_name: identity.destination_name,
                operation_name: classification.operation_name,
                error_name: classification.error_name,
                signals,
                category,
            },
            warnings,
        }
    }

    /// Decode a batch of lines already in memory
    pub fn decode_lines<S>(&self, lines: &[S]) -> DecodeReport
    where
        S: AsRef<str> + Sync,
    {
        let outcomes: Vec<LineOutcome> = if self.config.parallel {
            lines
                .par_iter()
                .enumerate()
                .map(|(index, line)| self.decode_line(index, line.as_ref()))
                .collect()
        } else {
            lines
                .iter()
                .enumerate()
                .map(|(index, line)| self.decode_line(index, line.as_ref()))
                .collect()
        };

        let report = DecodeReport::from_outcomes(outcomes);
        let stats = report.stats();
        log::info!(
            "Decoded {} records from {} lines ({} candidates, {} skipped, {} degraded)",
            stats.records,
            stats.total_lines,
            stats.candidate_lines,
            stats.skipped,
            stats.degraded
        );
        report
    }

    /// Decode a whole trace held in a string
    pub fn decode_str(&self, content: &str) -> DecodeReport {
        let lines: Vec<&str> = content.lines().collect();
        self.decode_lines(&lines)
    }

    /// Read a trace file fully into memory, then decode it
    ///
    /// Bytes that are not valid UTF-8 are replaced rather than failing the run.
    pub fn decode_file(&self, path: &Path) -> Result<DecodeReport> {
        log::info!("Decoding trace file: {:?}", path);
        let bytes = std::fs::read(path)?;
        let content = String::from_utf8_lossy(&bytes);
        Ok(self.decode_str(&content))
    }
}

/// Pick the payload layout for a machine variant
fn payload_decoder_for(variant: MachineVariant) -> Option<Box<dyn PayloadDecoder>> {
    match variant {
        MachineVariant::Flyer => Some(Box::new(FlyerLiftDecoder)),
        MachineVariant::Carding | MachineVariant::DrawFrame => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{CategoryTag, LineError, MessageType};

    const LIFT_PAYLOAD: &str = "0102030405060708090A0B0C0D0E0F1011121314";

    fn schema() -> SchemaStore {
        let doc = SchemaDocument::new()
            .with_cell("FunctionID", "01", "msgType", "Telemetry")
            .with_cell("FunctionID", "05", "msgType", "Operation")
            .with_cell("FunctionID", "06", "msgType", "Error")
            .with_cell("Carding_IDs", "03", "name", "Feed Roller")
            .with_table("DF_IDs")
            .with_cell("FF_IDs", "02", "name", "Controller")
            .with_cell("FF_IDs", "03", "name", "Right Motor")
            .with_cell("FF_IDs", "04", "name", "left_sensor")
            .with_cell("Operation", "A1B2", "msgType", "Start")
            .with_cell("Error", "17", "msgType", "Overcurrent");
        SchemaStore::from_source(&doc).unwrap()
    }

    fn decoder(config: DecoderConfig) -> Decoder {
        Decoder::new(schema(), config)
    }

    fn decoded(outcome: LineOutcome) -> (DecodedRecord, Vec<LineError>) {
        match outcome {
            LineOutcome::Decoded { record, warnings } => (record, warnings),
            other => panic!("expected a decoded record, got {:?}", other),
        }
    }

    #[test]
    fn test_decode_lift_frame() {
        let line = format!("[2024-01-01 12:00:00] rcv 0x010203 {}", LIFT_PAYLOAD);
        let (record, warnings) = decoded(decoder(DecoderConfig::new()).decode_line(0, &line));

        assert!(warnings.is_empty());
        assert_eq!(
            record.message_type,
            Some(MessageType::Other("Telemetry".to_string()))
        );
        assert_eq!(record.source_name.as_deref(), Some("Right Motor"));
        assert_eq!(record.destination_name.as_deref(), Some("Controller"));
        assert_eq!(record.category, Some(CategoryTag::RightLift));
        assert!(record.signals.is_some());
    }

    #[test]
    fn test_operation_and_error_frames() {
        let d = decoder(DecoderConfig::new().with_variant(MachineVariant::Carding));

        let (record, _) = decoded(d.decode_line(0, "[2024-01-01 12:00:00] rcv 0x050203 a1b2"));
        assert_eq!(record.message_type, Some(MessageType::Operation));
        assert_eq!(record.operation_name.as_deref(), Some("Start"));
        assert_eq!(record.error_name, None);

        let (record, _) = decoded(d.decode_line(1, "[2024-01-01 12:00:00] rcv 0x060203 17"));
        assert_eq!(record.error_name.as_deref(), Some("Overcurrent"));
        assert_eq!(record.operation_name, None);
    }

    #[test]
    fn test_non_lift_variant_has_no_signals_or_warnings() {
        let d = decoder(DecoderConfig::new().with_variant(MachineVariant::Carding));
        let line = format!("[2024-01-01 12:00:00] rcv 0x010203 {}", LIFT_PAYLOAD);
        let (record, warnings) = decoded(d.decode_line(0, &line));

        assert!(warnings.is_empty());
        assert_eq!(record.signals, None);
        assert_eq!(record.source_name.as_deref(), Some("Feed Roller"));
        assert_eq!(record.category, Some(CategoryTag::UnknownLift));
    }

    #[test]
    fn test_short_payload_degrades() {
        let (record, warnings) = decoded(
            decoder(DecoderConfig::new())
                .decode_line(0, "[2024-01-01 12:00:00] rcv 0x010403 0102030405"),
        );
        assert_eq!(record.signals, None);
        assert_eq!(record.category, Some(CategoryTag::RightLift));
        assert_eq!(warnings.len(), 1);
        assert!(matches!(warnings[0], LineError::PayloadDecode(_)));
    }

    #[test]
    fn test_signal_records_scope() {
        let d = decoder(
            DecoderConfig::new().with_category_scope(CategoryScope::SignalRecords),
        );
        let (record, _) = decoded(d.decode_line(0, "[2024-01-01 12:00:00] rcv 0x010203 0102"));
        assert_eq!(record.category, None);

        let line = format!("[2024-01-01 12:00:00] rcv 0x010402 {}", LIFT_PAYLOAD);
        let (record, _) = decoded(d.decode_line(1, &line));
        assert_eq!(record.category, Some(CategoryTag::LeftLift));
    }

    #[test]
    fn test_skipped_lines() {
        let d = decoder(DecoderConfig::new());
        assert_eq!(
            d.decode_line(4, "[2024-01-01 12:00:00] rcv"),
            LineOutcome::Skipped {
                line_index: 4,
                error: LineError::MalformedLine("expected at least 5 tokens, found 3".to_string()),
            }
        );
        assert!(matches!(
            d.decode_line(5, "[2024-01-01 12:00:00] rcv 0x0102 00"),
            LineOutcome::Skipped {
                error: LineError::MalformedIdentifier(_),
                ..
            }
        ));
        assert_eq!(
            d.decode_line(6, "[2024-01-01 12:00:00] snd 0x010203 00"),
            LineOutcome::Ignored { line_index: 6 }
        );
    }

    #[test]
    fn test_parallel_matches_sequential() {
        let lines: Vec<String> = (0..200)
            .map(|i| match i % 4 {
                0 => format!("[2024-01-01 12:00:{:02}] rcv 0x010203 {}", i % 60, LIFT_PAYLOAD),
                1 => "garbage".to_string(),
                2 => format!("[2024-01-01 12:00:{:02}] rcv 0x01", i % 60),
                _ => format!("[2024-01-01 12:00:{:02}] rcv 0x0104{:02X} 0102", i % 60, i),
            })
            .collect();

        let parallel = decoder(DecoderConfig::new()).decode_lines(&lines);
        let sequential = decoder(DecoderConfig::new().with_parallel(false)).decode_lines(&lines);

        assert_eq!(parallel.records(), sequential.records());
        assert_eq!(parallel.issues(), sequential.issues());
        assert_eq!(parallel.stats(), sequential.stats());

        let indices: Vec<usize> = parallel.records().iter().map(|r| r.header.line_index).collect();
        let mut sorted = indices.clone();
        sorted.sort_unstable();
        assert_eq!(indices, sorted);
        assert_eq!(parallel.stats().records, 100);
        assert_eq!(parallel.stats().skipped, 50);
    }
}
