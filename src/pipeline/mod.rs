// Pipeline module declarations
// Each phase is a separate module; `run_pipeline` drives them in order

pub mod ingest; // Phase 1: Load the record snapshot
pub mod literal; // Permissive literal parser used by normalize
pub mod normalize; // Phase 2: Decode string-encoded sub-documents
pub mod names; // Short display names
pub mod extract; // Phase 3: Per-project persons, project and edges
pub mod layout; // Phase 5: Seeded force-directed layout
pub mod document; // Phase 6: Front-end document
pub mod enrich; // Phase 7: Interests per person

use crate::error::{PipelineError, Result};
use crate::graph::builder::GraphBuilder;
use crate::graph::GroupBy;
use crate::record::RawProjectRecord;
use chrono::{Local, NaiveDateTime};
use document::{build_document, GraphDocument};
use extract::{extract_edges, ExtractContext, ExtractionStats};
use layout::{compute_layout, LayoutConfig};
use normalize::{normalize_records, NormalizationReport};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{info, warn};

/// Library-level run configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    pub group_by: GroupBy,
    pub layout: LayoutConfig,
    /// Reference clock for membership durations; wall clock at run start when unset.
    pub now: Option<NaiveDateTime>,
}

impl PipelineConfig {
    /// The instant every duration in this run is measured to.
    pub fn reference_time(&self) -> NaiveDateTime {
        self.now.unwrap_or_else(|| Local::now().naive_local())
    }
}

/// Counts for one built document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PipelineReport {
    pub group_by: GroupBy,
    pub records: usize,
    pub decode_failures: usize,
    pub records_skipped: usize,
    pub members_skipped: usize,
    pub leaders_skipped: usize,
    pub person_nodes: usize,
    pub project_nodes: usize,
    pub edges: usize,
    pub clusters: usize,
}

#[derive(Debug, Clone)]
pub struct PipelineOutput {
    pub document: GraphDocument,
    pub report: PipelineReport,
}

/// Normalize `records` and build the document for `config.group_by`.
pub fn run_pipeline(mut records: Vec<RawProjectRecord>, config: &PipelineConfig) -> PipelineOutput {
    info!("Phase 2: Normalizing {} project records", records.len());
    let normalization = normalize_records(&mut records);
    build_document_for(
        &records,
        &normalization,
        config.group_by,
        config.reference_time(),
        &config.layout,
    )
}

/// Normalize once, then build one document per grouping, all against the
/// same reference time.
pub fn run_groupings(
    mut records: Vec<RawProjectRecord>,
    config: &PipelineConfig,
    groupings: &[GroupBy],
) -> Vec<PipelineOutput> {
    info!("Phase 2: Normalizing {} project records", records.len());
    let normalization = normalize_records(&mut records);
    let now = config.reference_time();

    groupings
        .iter()
        .map(|&group_by| {
            build_document_for(&records, &normalization, group_by, now, &config.layout)
        })
        .collect()
}

/// `run_groupings` on a blocking thread, bounded by `deadline`.
///
/// On timeout the partial result is dropped and `Deadline` is returned. The
/// blocking thread is not interrupted; the caller decides whether to wait for
/// it when shutting its runtime down.
pub async fn run_with_deadline(
    records: Vec<RawProjectRecord>,
    config: &PipelineConfig,
    groupings: &[GroupBy],
    deadline: Option<Duration>,
) -> Result<Vec<PipelineOutput>> {
    let config = config.clone();
    let groupings = groupings.to_vec();
    let task = tokio::task::spawn_blocking(move || run_groupings(records, &config, &groupings));

    let joined = match deadline {
        Some(limit) => match tokio::time::timeout(limit, task).await {
            Ok(joined) => joined,
            Err(_) => {
                warn!(limit_ms = limit.as_millis() as u64, "deadline exceeded, dropping results");
                return Err(PipelineError::Deadline {
                    seconds: limit.as_secs(),
                });
            }
        },
        None => task.await,
    };
    joined.map_err(|e| PipelineError::TaskFailed(e.to_string()))
}

/// Extract, assemble, lay out and serialize already-normalized records.
pub fn build_document_for(
    records: &[RawProjectRecord],
    normalization: &NormalizationReport,
    group_by: GroupBy,
    now: NaiveDateTime,
    layout_config: &LayoutConfig,
) -> PipelineOutput {
    info!("Phase 3: Extracting memberships grouped by {group_by}");
    let ctx = ExtractContext { group_by, now };
    let mut stats = ExtractionStats::default();
    let mut builder = GraphBuilder::new();
    for record in records {
        if let Some(extraction) = extract_edges(record, &ctx, &mut stats) {
            builder.add_extraction(extraction);
        }
    }

    info!("Phase 4: Assembling graph");
    let graph = builder.build();
    info!(
        nodes = graph.node_count(),
        edges = graph.edge_count(),
        groups = graph.groups.len(),
        "graph assembled"
    );

    info!("Phase 5: Computing layout ({} iterations)", layout_config.iterations);
    let layout = compute_layout(&graph, layout_config);

    info!("Phase 6: Building document");
    let document = build_document(&graph, &layout);

    let report = PipelineReport {
        group_by,
        records: records.len(),
        decode_failures: normalization.failures.len(),
        records_skipped: stats.records_skipped,
        members_skipped: stats.members_skipped,
        leaders_skipped: stats.leaders_skipped,
        person_nodes: graph.person_count(),
        project_nodes: graph.project_count(),
        edges: document.edges.len(),
        clusters: document.clusters.len(),
    };
    info!(
        group_by = %report.group_by,
        records = report.records,
        decode_failures = report.decode_failures,
        members_skipped = report.members_skipped,
        leaders_skipped = report.leaders_skipped,
        person_nodes = report.person_nodes,
        project_nodes = report.project_nodes,
        edges = report.edges,
        clusters = report.clusters,
        "document built"
    );

    PipelineOutput { document, report }
}
