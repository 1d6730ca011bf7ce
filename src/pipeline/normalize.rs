// normalize.rs
// Phase 2: Decode nested sub-documents that arrive string-encoded

use super::literal::parse_literal;
use crate::record::RawProjectRecord;
use serde_json::Value;
use tracing::{debug, info, warn};

/// Sub-documents that may arrive as encoded strings.
pub const ENCODED_FIELDS: [&str; 4] = ["team", "vacancyData", "detailed_team", "leaders"];

/// How a field was decoded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decoded {
    Json,
    Literal,
}

/// A field that stayed in raw form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodeFailure {
    pub record_id: String,
    pub field: &'static str,
    pub reason: String,
}

/// Per-batch normalization counts.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NormalizationReport {
    pub records: usize,
    pub decoded_json: usize,
    pub decoded_literal: usize,
    pub failures: Vec<DecodeFailure>,
}

/// Normalize every record in place.
pub fn normalize_records(records: &mut [RawProjectRecord]) -> NormalizationReport {
    let mut report = NormalizationReport::default();
    for record in records.iter_mut() {
        normalize_record(record, &mut report);
    }

    info!(
        records = report.records,
        json = report.decoded_json,
        literal = report.decoded_literal,
        failures = report.failures.len(),
        "normalized nested fields"
    );
    report
}

/// Decode each encoded field of one record. Fields that cannot be decoded are
/// left as they are and recorded in `report`.
pub fn normalize_record(record: &mut RawProjectRecord, report: &mut NormalizationReport) {
    report.records += 1;

    for field in ENCODED_FIELDS {
        let Some(Value::String(raw)) = record.get(field) else {
            continue;
        };
        if raw.is_empty() {
            continue;
        }

        match decode_field(raw) {
            Ok((decoded, how)) => {
                match how {
                    Decoded::Json => report.decoded_json += 1,
                    Decoded::Literal => report.decoded_literal += 1,
                }
                record.insert(field, decoded);
            }
            Err(reason) => {
                let record_id = record.id_label();
                warn!(
                    record_id = %record_id,
                    field,
                    error = %reason,
                    "could not decode nested field; leaving it raw"
                );
                report.failures.push(DecodeFailure {
                    record_id,
                    field,
                    reason,
                });
            }
        }
    }
}

/// JSON after swapping single quotes for double quotes, then the permissive
/// literal parser. The error names both failures.
pub fn decode_field(raw: &str) -> Result<(Value, Decoded), String> {
    let json_err = match serde_json::from_str(&raw.replace('\'', "\"")) {
        Ok(value) => return Ok((value, Decoded::Json)),
        Err(e) => e,
    };
    debug!(error = %json_err, "json decode failed, trying literal parser");

    parse_literal(raw)
        .map(|value| (value, Decoded::Literal))
        .map_err(|literal_err| format!("json: {json_err}; literal: {literal_err}"))
}
