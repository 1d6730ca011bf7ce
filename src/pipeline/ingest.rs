// ingest.rs
// Phase 1: Load the full snapshot of project records into memory

use crate::error::{PipelineError, Result};
use crate::record::RawProjectRecord;
use serde_json::Value;
use std::io::Read;
use std::path::PathBuf;
use tracing::info;

/// Where the record snapshot comes from.
#[derive(Debug, Clone)]
pub enum InputSource {
    Path(PathBuf),
    Stdin,
    Bytes(Vec<u8>),
}

impl InputSource {
    /// `-` selects stdin, anything else is a file path.
    pub fn from_arg(arg: &str) -> Self {
        if arg == "-" {
            InputSource::Stdin
        } else {
            InputSource::Path(PathBuf::from(arg))
        }
    }
}

/// Collaborator delivering one complete batch of records.
pub trait RecordSource {
    fn fetch_project_records(&self) -> Result<Vec<RawProjectRecord>>;
}

impl RecordSource for InputSource {
    fn fetch_project_records(&self) -> Result<Vec<RawProjectRecord>> {
        let records = match self {
            InputSource::Path(path) => {
                info!(path = %path.display(), "reading project records");
                let bytes = std::fs::read(path).map_err(|e| PipelineError::io(path, e))?;
                parse_records(&bytes)?
            }
            InputSource::Stdin => {
                info!("reading project records from stdin");
                let mut bytes = Vec::new();
                std::io::stdin()
                    .read_to_end(&mut bytes)
                    .map_err(|e| PipelineError::io("<stdin>", e))?;
                parse_records(&bytes)?
            }
            InputSource::Bytes(bytes) => {
                info!(bytes = bytes.len(), "processing project records from memory");
                parse_records(bytes)?
            }
        };
        info!(records = records.len(), "loaded project records");
        Ok(records)
    }
}

impl RecordSource for Vec<RawProjectRecord> {
    fn fetch_project_records(&self) -> Result<Vec<RawProjectRecord>> {
        Ok(self.clone())
    }
}

/// Parse a snapshot: a JSON array of objects, or an object wrapping one
/// under `"projects"`. Anything else is malformed input.
pub fn parse_records(bytes: &[u8]) -> Result<Vec<RawProjectRecord>> {
    let value: Value = serde_json::from_slice(bytes)
        .map_err(|e| PipelineError::MalformedInput(format!("records are not valid JSON: {e}")))?;

    let items = match value {
        Value::Array(items) => items,
        Value::Object(mut wrapper) => match wrapper.remove("projects") {
            Some(Value::Array(items)) => items,
            _ => {
                return Err(PipelineError::MalformedInput(
                    "expected an array of projects or an object with a \"projects\" array".into(),
                ))
            }
        },
        other => {
            return Err(PipelineError::MalformedInput(format!(
                "expected an array of projects, got {}",
                json_kind(&other)
            )))
        }
    };

    items
        .into_iter()
        .enumerate()
        .map(|(position, item)| match item {
            Value::Object(fields) => Ok(RawProjectRecord::new(fields)),
            other => Err(PipelineError::MalformedInput(format!(
                "project at position {position} is {}, not an object",
                json_kind(&other)
            ))),
        })
        .collect()
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
