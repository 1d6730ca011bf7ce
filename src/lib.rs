// lib.rs
// People x projects graph builder: normalize raw project records, then
// group, color, lay out and serialize the graph the front end renders

pub mod config;
pub mod error;
pub mod graph;
pub mod pipeline;
pub mod record;

pub use error::{PipelineError, Result};
pub use graph::GroupBy;
pub use pipeline::document::GraphDocument;
pub use pipeline::{
    run_groupings, run_pipeline, run_with_deadline, PipelineConfig, PipelineOutput, PipelineReport,
};
pub use record::RawProjectRecord;
