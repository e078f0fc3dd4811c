// End-to-end decoding of a small flyer trace against a TOML schema
use can_trace_decoder::{
    CategoryTag, DecodeReport, Decoder, DecoderConfig, DecoderError, IssueAction, LineError,
    MachineVariant, MessageType, NumericField, SchemaDocument, SchemaStore, SignalValue,
};
use std::io::Write;

const SCHEMA: &str = r#"
[FunctionID."01"]
msgType = "Telemetry"

[FunctionID."05"]
msgType = "Operation"

[FunctionID."06"]
msgType = "Error"

[Carding_IDs."03"]
name = "Doffer"

[DF_IDs."03"]
name = "Coiler"

[FF_IDs."02"]
name = "Controller"

[FF_IDs."03"]
name = "Right Motor"

[FF_IDs."04"]
name = "Left Motor"

[Operation.A1B2]
msgType = "Start"

[Error.17]
msgType = "Overcurrent"
"#;

const LIFT_PAYLOAD: &str = "0102030405060708090A0B0C0D0E0F1011121314";

fn decoder(variant: MachineVariant) -> Decoder {
    let doc = SchemaDocument::from_toml_str(SCHEMA).unwrap();
    let schema = SchemaStore::from_source(&doc).unwrap();
    Decoder::new(schema, DecoderConfig::new().with_variant(variant))
}

fn trace() -> String {
    [
        "--- capture start ---".to_string(),
        format!("[2024-01-01 12:00:00] rcv 0x010203 {}", LIFT_PAYLOAD),
        "[2024-01-01 12:00:01] rcv 0x010203".to_string(),
        format!("[2024-01-01 12:00:02] rcv 0x18010402 {}", LIFT_PAYLOAD),
        "[2024-01-01 12:00:03] snd 0x010203 00".to_string(),
        "[2024-01-01 12:00:04] rcv 0x050203 A1B2".to_string(),
        "[2024-01-01 12:00:05] rcv 0x060302 17".to_string(),
        "[2024-01-01 12:00:06] rcv 0x0102 00".to_string(),
        format!("[2024-01-01 12:00:07] rcv 0x7F0203 {}", LIFT_PAYLOAD),
        String::new(),
    ]
    .join("\n")
}

fn decode_trace() -> DecodeReport {
    decoder(MachineVariant::Flyer).decode_str(&trace())
}

#[test]
fn example_frame_decodes_fully() {
    let report = decoder(MachineVariant::Flyer)
        .decode_str(&format!("[2024-01-01 12:00:00] rcv 0x010203 {}", LIFT_PAYLOAD));

    assert_eq!(report.records().len(), 1);
    let record = &report.records()[0];
    assert_eq!(record.header.date, "2024-01-01");
    assert_eq!(record.header.time, "12:00:00");
    assert_eq!(record.message_type, Some(MessageType::Other("Telemetry".to_string())));
    assert_eq!(record.source_name.as_deref(), Some("Right Motor"));
    assert_eq!(record.destination_name.as_deref(), Some("Controller"));
    assert_eq!(record.category, Some(CategoryTag::RightLift));

    let signals = record.signals.as_ref().unwrap();
    // 0x0102 = 258
    assert_eq!(
        signals.value(NumericField::TargetPosition),
        Some(SignalValue::Float(2.58))
    );
    assert!(report.issues().is_empty());
}

#[test]
fn malformed_lines_do_not_stop_the_run() {
    let report = decode_trace();
    let stats = report.stats();

    assert_eq!(stats.total_lines, 9);
    assert_eq!(stats.candidate_lines, 7);
    assert_eq!(stats.skipped, 2);
    assert_eq!(stats.records, stats.candidate_lines - stats.skipped);

    let skipped: Vec<(usize, &LineError)> = report
        .issues()
        .iter()
        .filter(|issue| issue.action == IssueAction::Skipped)
        .map(|issue| (issue.line_index, &issue.error))
        .collect();
    assert_eq!(skipped.len(), 2);
    assert_eq!(skipped[0].0, 2);
    assert!(matches!(skipped[0].1, LineError::MalformedLine(_)));
    assert_eq!(skipped[1].0, 7);
    assert!(matches!(skipped[1].1, LineError::MalformedIdentifier(_)));
}

#[test]
fn records_keep_input_order() {
    let indices: Vec<usize> = decode_trace()
        .records()
        .iter()
        .map(|r| r.header.line_index)
        .collect();
    assert_eq!(indices, vec![1, 3, 5, 6, 8]);
}

#[test]
fn unknown_function_code_keeps_other_fields() {
    let report = decode_trace();
    let record = report.records().last().unwrap();

    assert_eq!(record.message_type, None);
    assert_eq!(record.source_name.as_deref(), Some("Right Motor"));
    assert_eq!(record.destination_name.as_deref(), Some("Controller"));
    assert!(record.signals.is_some());
}

#[test]
fn operation_and_error_names_attached() {
    let report = decode_trace();
    let records = report.records();

    assert_eq!(records[2].operation_name.as_deref(), Some("Start"));
    assert_eq!(records[3].error_name.as_deref(), Some("Overcurrent"));

    // Both are short payloads on a flyer, so they are degraded, not dropped
    let degraded: Vec<usize> = report
        .issues()
        .iter()
        .filter(|issue| issue.action == IssueAction::Degraded)
        .map(|issue| issue.line_index)
        .collect();
    assert_eq!(degraded, vec![5, 6]);
    assert_eq!(records[2].signals, None);
}

#[test]
fn decoding_is_deterministic() {
    let first = decode_trace();
    let second = decode_trace();
    assert_eq!(first.records(), second.records());
    assert_eq!(first.issues(), second.issues());
}

#[test]
fn partitions_and_projection() {
    let report = decode_trace();
    let partitions = report.partition_by_category();

    let right: Vec<usize> = partitions[&CategoryTag::RightLift]
        .iter()
        .map(|r| r.header.line_index)
        .collect();
    assert_eq!(right, vec![1, 5, 6, 8]);
    assert_eq!(partitions[&CategoryTag::LeftLift].len(), 1);

    let series = report.project(&[NumericField::PresentRpm], Some(CategoryTag::LeftLift));
    assert_eq!(series[0].points, vec![(1, f64::from(0x0506u16))]);
}

#[test]
fn carding_variant_skips_payload_decoding() {
    let report = decoder(MachineVariant::Carding).decode_str(&trace());
    assert!(report.records().iter().all(|r| r.signals.is_none()));
    assert!(report
        .issues()
        .iter()
        .all(|issue| issue.action == IssueAction::Skipped));
    assert_eq!(report.records()[0].source_name.as_deref(), Some("Doffer"));
    assert_eq!(report.records()[0].destination_name, None);
}

#[test]
fn decode_from_files() {
    let mut schema_file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
    schema_file.write_all(SCHEMA.as_bytes()).unwrap();

    let mut trace_file = tempfile::NamedTempFile::new().unwrap();
    trace_file.write_all(trace().as_bytes()).unwrap();
    // Stray non-UTF-8 byte on an ignored line
    trace_file.write_all(b"\xff\xfe junk\n").unwrap();

    let decoder = Decoder::from_schema_file(schema_file.path(), DecoderConfig::new()).unwrap();
    let report = decoder.decode_file(trace_file.path()).unwrap();
    assert_eq!(report.records().len(), 5);

    let table = report.to_table();
    assert_eq!(table.rows.len(), 5);
    assert_eq!(&table.columns[..4], ["date", "time", "extID", "hexData"]);
}

#[test]
fn missing_schema_table_is_fatal() {
    let doc = SchemaDocument::from_toml_str("[FunctionID.\"01\"]\nmsgType = \"Telemetry\"").unwrap();
    assert!(matches!(
        SchemaStore::from_source(&doc),
        Err(DecoderError::SchemaLoad(_))
    ));
}
