// graph/mod.rs
// The people x projects graph: entities, edges, groups and display attributes

pub mod builder;
pub mod palette;

use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::Direction;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

/// Unique identifier for graph nodes (`user_<id>` or `project_<id>`)
pub type NodeId = String;

/// Group label used when a record lacks the grouping field.
pub const UNKNOWN_GROUP: &str = "Неизвестно";

/// Record attribute that edges are clustered by.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum GroupBy {
    #[serde(rename = "id")]
    ProjectId,
    #[serde(rename = "typeDesc")]
    TypeDescription,
    #[default]
    #[serde(rename = "projectIndustryLabel")]
    IndustryLabel,
}

impl GroupBy {
    pub const ALL: [GroupBy; 3] = [
        GroupBy::ProjectId,
        GroupBy::TypeDescription,
        GroupBy::IndustryLabel,
    ];

    /// Record field holding the group value.
    pub fn field(self) -> &'static str {
        match self {
            GroupBy::ProjectId => "id",
            GroupBy::TypeDescription => "typeDesc",
            GroupBy::IndustryLabel => "projectIndustryLabel",
        }
    }
}

impl fmt::Display for GroupBy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.field())
    }
}

impl FromStr for GroupBy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "id" | "project-id" | "project" => Ok(GroupBy::ProjectId),
            "typeDesc" | "type-description" | "type" => Ok(GroupBy::TypeDescription),
            "projectIndustryLabel" | "industry-label" | "industry" => Ok(GroupBy::IndustryLabel),
            other => Err(format!(
                "unknown grouping {other:?}; expected id, typeDesc or projectIndustryLabel"
            )),
        }
    }
}

/// A team member or leader.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PersonNode {
    pub id: NodeId,
    pub full_name: String,
    pub short_name: String,
    pub role: String,
    pub membership_duration_days: i64,
}

/// One project.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectNode {
    pub id: NodeId,
    pub name: String,
    #[serde(rename = "type")]
    pub project_type: String,
}

/// Person -> project membership as extracted from a single record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Edge {
    pub source: PersonNode,
    pub target: ProjectNode,
    /// `membership_duration_days / 100`; never negative, not clamped
    pub weight: f64,
    pub group: String,
}

impl Edge {
    pub fn new(source: PersonNode, target: ProjectNode, group: String) -> Self {
        let weight = source.membership_duration_days as f64 / 100.0;
        Self {
            source,
            target,
            weight,
            group,
        }
    }
}

/// Types of nodes in the graph
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NodeKind {
    Person(PersonNode),
    Project(ProjectNode),
}

impl NodeKind {
    pub fn id(&self) -> &str {
        match self {
            NodeKind::Person(p) => &p.id,
            NodeKind::Project(p) => &p.id,
        }
    }

    pub fn is_person(&self) -> bool {
        matches!(self, NodeKind::Person(_))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Shape {
    #[default]
    Disc,
    Square,
}

/// Derived display attributes of a node.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct NodeDisplay {
    pub label: String,
    /// Tooltip, lines separated by `</br>`
    pub title: String,
    pub color: &'static str,
    pub shape: Shape,
    pub size: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct GraphNode {
    pub kind: NodeKind,
    pub display: NodeDisplay,
}

impl GraphNode {
    pub fn id(&self) -> &str {
        self.kind.id()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct GraphEdge {
    pub weight: f64,
    pub group: String,
    pub group_id: usize,
    pub color: &'static str,
}

/// Group value -> integer id, in first-seen order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GroupTable {
    ids: HashMap<String, usize>,
    labels: Vec<String>,
}

impl GroupTable {
    /// Id of `group`, assigning the next one if it is new.
    pub fn assign(&mut self, group: &str) -> usize {
        if let Some(&id) = self.ids.get(group) {
            return id;
        }
        let id = self.labels.len();
        self.ids.insert(group.to_string(), id);
        self.labels.push(group.to_string());
        id
    }

    pub fn label(&self, id: usize) -> Option<&str> {
        self.labels.get(id).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    /// `(id, label)` in id order.
    pub fn iter(&self) -> impl Iterator<Item = (usize, &str)> {
        self.labels.iter().map(String::as_str).enumerate()
    }
}

/// The assembled directed multigraph. Node indices are dense, in first-seen
/// order, and double as the integer keys of the output document.
#[derive(Debug, Clone, Default)]
pub struct SocialGraph {
    pub graph: DiGraph<GraphNode, GraphEdge>,
    pub index: HashMap<NodeId, NodeIndex>,
    pub groups: GroupTable,
}

impl SocialGraph {
    pub fn node(&self, id: &str) -> Option<&GraphNode> {
        self.index.get(id).map(|&idx| &self.graph[idx])
    }

    /// In + out degree, counting parallel edges.
    pub fn degree(&self, idx: NodeIndex) -> usize {
        self.graph.edges_directed(idx, Direction::Incoming).count()
            + self.graph.edges_directed(idx, Direction::Outgoing).count()
    }

    pub fn node_count(&self) -> usize {
        self.graph.node_count()
    }

    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }

    pub fn person_count(&self) -> usize {
        self.graph
            .node_weights()
            .filter(|n| n.kind.is_person())
            .count()
    }

    pub fn project_count(&self) -> usize {
        self.node_count() - self.person_count()
    }
}

/// `clamp(degree / 2, 2, 10)`, for people and projects alike.
pub fn display_size(degree: usize) -> f64 {
    (degree as f64 / 2.0).clamp(2.0, 10.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn group_by_round_trips_through_text() {
        for group_by in GroupBy::ALL {
            assert_eq!(group_by.to_string().parse::<GroupBy>(), Ok(group_by));
        }
        assert_eq!("industry".parse::<GroupBy>(), Ok(GroupBy::IndustryLabel));
        assert!("color".parse::<GroupBy>().is_err());
    }

    #[test]
    fn group_table_is_first_seen_order() {
        let mut table = GroupTable::default();
        assert_eq!(table.assign("b"), 0);
        assert_eq!(table.assign("a"), 1);
        assert_eq!(table.assign("b"), 0);
        assert_eq!(table.len(), 2);
        assert_eq!(table.label(1), Some("a"));
        assert_eq!(table.iter().collect::<Vec<_>>(), vec![(0, "b"), (1, "a")]);
    }

    #[test]
    fn display_size_clamps() {
        assert_eq!(display_size(0), 2.0);
        assert_eq!(display_size(1), 2.0);
        assert_eq!(display_size(5), 2.5);
        assert_eq!(display_size(20), 10.0);
        assert_eq!(display_size(300), 10.0);
    }

    #[test]
    fn edge_weight_is_days_over_hundred() {
        let person = PersonNode {
            id: "user_1".into(),
            full_name: "Ivan".into(),
            short_name: "Ivan".into(),
            role: "dev".into(),
            membership_duration_days: 250,
        };
        let project = ProjectNode {
            id: "project_1".into(),
            name: "P".into(),
            project_type: "t".into(),
        };
        assert_eq!(Edge::new(person, project, "g".into()).weight, 2.5);
    }
}
