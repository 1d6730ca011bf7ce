// document.rs
// Phase 6: The visualization document handed to the front end.
// Field names and nesting are the front end's contract.

use super::layout::Layout;
use crate::error::{PipelineError, Result};
use crate::graph::SocialGraph;
use petgraph::visit::EdgeRef;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::Path;

/// Entity kind marker on a node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum NodeTag {
    Person,
    Tool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocumentNode {
    pub key: String,
    pub label: String,
    pub tag: NodeTag,
    #[serde(rename = "URL", default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub interests: Option<String>,
    pub cluster: String,
    pub x: f64,
    pub y: f64,
    pub score: f64,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Cluster {
    pub key: String,
    pub color: String,
    #[serde(rename = "clusterLabel")]
    pub label: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tag {
    pub key: NodeTag,
    pub image: String,
}

/// The two fixed tags; not derived from data.
pub fn static_tags() -> Vec<Tag> {
    vec![
        Tag {
            key: NodeTag::Person,
            image: "person.svg".to_string(),
        },
        Tag {
            key: NodeTag::Tool,
            image: "tool.svg".to_string(),
        },
    ]
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GraphDocument {
    pub nodes: Vec<DocumentNode>,
    /// `[source_key, target_key]` pairs of dense node keys
    pub edges: Vec<[usize; 2]>,
    pub clusters: Vec<Cluster>,
    pub tags: Vec<Tag>,
}

/// Serialize the laid-out graph.
///
/// Edges keep graph order. A node appears once, at its first edge, and takes
/// that edge's group as its cluster; a cluster appears once per group id.
pub fn build_document(graph: &SocialGraph, layout: &Layout) -> GraphDocument {
    let mut nodes = Vec::with_capacity(graph.node_count());
    let mut edges = Vec::with_capacity(graph.edge_count());
    let mut clusters = Vec::new();
    let mut seen_nodes = HashSet::new();
    let mut seen_clusters = HashSet::new();

    for edge in graph.graph.edge_references() {
        let (source, target) = (edge.source(), edge.target());
        let data = edge.weight();
        edges.push([source.index(), target.index()]);

        for idx in [source, target] {
            if !seen_nodes.insert(idx) {
                continue;
            }
            let node = &graph.graph[idx];
            let position = layout.position(idx.index()).unwrap_or(super::layout::Position {
                x: 0.0,
                y: 0.0,
            });
            nodes.push(DocumentNode {
                key: idx.index().to_string(),
                label: node.display.label.clone(),
                tag: if node.kind.is_person() {
                    NodeTag::Person
                } else {
                    NodeTag::Tool
                },
                url: Some(String::new()),
                interests: None,
                cluster: data.group_id.to_string(),
                x: position.x,
                y: position.y,
                score: node.display.size,
            });
        }

        if seen_clusters.insert(data.group_id) {
            clusters.push(Cluster {
                key: data.group_id.to_string(),
                color: data.color.to_string(),
                label: data.group.clone(),
            });
        }
    }

    GraphDocument {
        nodes,
        edges,
        clusters,
        tags: static_tags(),
    }
}

impl GraphDocument {
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }

    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Write the document as UTF-8 JSON; non-ASCII labels are kept as-is.
    pub fn save_to_file(&self, path: &Path) -> Result<()> {
        let json = self.to_json()?;
        std::fs::write(path, json).map_err(|e| PipelineError::io(path, e))
    }

    pub fn load_from_file(path: &Path) -> Result<Self> {
        let json = std::fs::read_to_string(path).map_err(|e| PipelineError::io(path, e))?;
        Self::from_json(&json)
    }
}
