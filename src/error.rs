// error.rs
// Batch-level pipeline errors; per-record problems are counted, not raised

use std::path::PathBuf;
use thiserror::Error;

/// Errors that abort a pipeline run.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// Reading input or writing output failed.
    #[error("i/o error on {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Top-level input is not a collection of project records.
    #[error("malformed input: {0}")]
    MalformedInput(String),

    /// JSON encoding or decoding of a whole document failed.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// A configuration value could not be interpreted.
    #[error("invalid config: {0}")]
    InvalidConfig(String),

    /// The run did not finish before the caller's deadline.
    #[error("pipeline exceeded deadline of {seconds}s; result discarded")]
    Deadline { seconds: u64 },

    /// The blocking task running the pipeline died.
    #[error("pipeline task failed: {0}")]
    TaskFailed(String),
}

impl PipelineError {
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// True when the caller handed us something that is not a record batch.
    pub fn is_input_error(&self) -> bool {
        matches!(
            self,
            PipelineError::MalformedInput(_) | PipelineError::InvalidConfig(_)
        )
    }
}

pub type Result<T> = std::result::Result<T, PipelineError>;
