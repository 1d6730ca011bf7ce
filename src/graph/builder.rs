// graph/builder.rs
// Graph builder - assembles per-project extractions into one directed graph

use super::palette::color;
use super::{
    display_size, GraphEdge, GraphNode, GroupTable, NodeDisplay, NodeId, NodeKind, PersonNode,
    ProjectNode, Shape, SocialGraph,
};
use crate::pipeline::extract::Extraction;
use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::visit::EdgeRef;
use std::collections::HashMap;

pub struct GraphBuilder {
    graph: DiGraph<GraphNode, GraphEdge>,
    index: HashMap<NodeId, NodeIndex>,
    groups: GroupTable,
    // Latest definition of each entity; a later project overwrites an earlier one
    people: HashMap<NodeId, PersonNode>,
    projects: HashMap<NodeId, ProjectNode>,
}

impl GraphBuilder {
    pub fn new() -> Self {
        Self {
            graph: DiGraph::new(),
            index: HashMap::new(),
            groups: GroupTable::default(),
            people: HashMap::new(),
            projects: HashMap::new(),
        }
    }

    /// Add one project's edges, in extraction order.
    pub fn add_extraction(&mut self, extraction: Extraction) {
        let Extraction {
            edges,
            nodes_by_id,
            project,
        } = extraction;

        for edge in edges {
            let group_id = self.groups.assign(&edge.group);
            let source = self.ensure_node(NodeKind::Person(edge.source));
            let target = self.ensure_node(NodeKind::Project(edge.target));
            self.graph.add_edge(
                source,
                target,
                GraphEdge {
                    weight: edge.weight,
                    group: edge.group,
                    group_id,
                    color: color(group_id),
                },
            );
        }

        self.people.extend(nodes_by_id);
        self.projects.insert(project.id.clone(), project);
    }

    /// Finish the graph: refresh entity data and derive display attributes.
    pub fn build(mut self) -> SocialGraph {
        self.refresh_entities();
        self.derive_display();

        SocialGraph {
            graph: self.graph,
            index: self.index,
            groups: self.groups,
        }
    }

    fn ensure_node(&mut self, kind: NodeKind) -> NodeIndex {
        if let Some(&idx) = self.index.get(kind.id()) {
            return idx;
        }
        let id = kind.id().to_string();
        let idx = self.graph.add_node(GraphNode {
            kind,
            display: NodeDisplay::default(),
        });
        self.index.insert(id, idx);
        idx
    }

    fn refresh_entities(&mut self) {
        for node in self.graph.node_weights_mut() {
            let latest = match &node.kind {
                NodeKind::Person(p) => self.people.get(&p.id).cloned().map(NodeKind::Person),
                NodeKind::Project(p) => self.projects.get(&p.id).cloned().map(NodeKind::Project),
            };
            if let Some(kind) = latest {
                node.kind = kind;
            }
        }
    }

    fn derive_display(&mut self) {
        let degrees: Vec<usize> = self
            .graph
            .node_indices()
            .map(|idx| self.graph.neighbors_undirected(idx).count())
            .collect();

        for (idx, node) in self.graph.node_weights_mut().enumerate() {
            node.display = match &node.kind {
                NodeKind::Person(p) => NodeDisplay {
                    label: p.short_name.clone(),
                    title: format!(
                        "{}</br>{}</br>{}",
                        p.full_name, p.role, p.membership_duration_days
                    ),
                    color: "",
                    shape: Shape::Disc,
                    size: display_size(degrees[idx]),
                },
                NodeKind::Project(p) => NodeDisplay {
                    label: p.name.clone(),
                    title: format!("{}</br>{}", p.name, p.project_type),
                    color: "",
                    shape: Shape::Square,
                    size: display_size(degrees[idx]),
                },
            };
        }

        // Each node keeps the color of the last edge touching it
        let touches: Vec<(NodeIndex, NodeIndex, &'static str)> = self
            .graph
            .edge_references()
            .map(|e| (e.source(), e.target(), e.weight().color))
            .collect();
        for (source, target, edge_color) in touches {
            self.graph[source].display.color = edge_color;
            self.graph[target].display.color = edge_color;
        }
    }
}

impl Default for GraphBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Assemble extractions, in record order, into one graph.
pub fn build_graph(extractions: impl IntoIterator<Item = Extraction>) -> SocialGraph {
    let mut builder = GraphBuilder::new();
    for extraction in extractions {
        builder.add_extraction(extraction);
    }
    builder.build()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::palette::PALETTE;
    use crate::graph::Edge;
    use pretty_assertions::assert_eq;

    fn person(id: &str, days: i64) -> PersonNode {
        PersonNode {
            id: format!("user_{id}"),
            full_name: format!("Person {id}"),
            short_name: format!("P {id}."),
            role: "dev".into(),
            membership_duration_days: days,
        }
    }

    fn project(id: &str) -> ProjectNode {
        ProjectNode {
            id: format!("project_{id}"),
            name: format!("Project {id}"),
            project_type: "research".into(),
        }
    }

    fn extraction(project_id: &str, group: &str, people: &[PersonNode]) -> Extraction {
        let target = project(project_id);
        Extraction {
            edges: people
                .iter()
                .map(|p| Edge::new(p.clone(), target.clone(), group.to_string()))
                .collect(),
            nodes_by_id: people.iter().map(|p| (p.id.clone(), p.clone())).collect(),
            project: target,
        }
    }

    fn sample() -> Vec<Extraction> {
        vec![
            extraction("1", "AI", &[person("a", 100), person("b", 200)]),
            extraction("2", "IoT", &[person("a", 300)]),
            extraction("3", "AI", &[person("c", 0)]),
        ]
    }

    #[test]
    fn group_ids_follow_first_seen_order() {
        let graph = build_graph(sample());
        assert_eq!(graph.groups.iter().collect::<Vec<_>>(), vec![(0, "AI"), (1, "IoT")]);
        let ai = graph.graph.edge_weights().find(|e| e.group == "AI").unwrap();
        assert_eq!(ai.color, PALETTE[0]);
    }

    #[test]
    fn grouping_is_idempotent_for_same_order() {
        let first = build_graph(sample());
        let second = build_graph(sample());
        assert_eq!(first.groups, second.groups);
        let colors = |g: &SocialGraph| g.graph.edge_weights().map(|e| e.color).collect::<Vec<_>>();
        assert_eq!(colors(&first), colors(&second));
    }

    #[test]
    fn shared_person_is_one_node_with_latest_attributes() {
        let graph = build_graph(sample());
        assert_eq!(graph.person_count(), 3);
        assert_eq!(graph.project_count(), 3);
        assert_eq!(graph.edge_count(), 4);

        let a = graph.node("user_a").unwrap();
        match &a.kind {
            NodeKind::Person(p) => assert_eq!(p.membership_duration_days, 300),
            other => panic!("expected person, got {other:?}"),
        }
        assert_eq!(a.display.title, "Person a</br>dev</br>300");
        assert_eq!(a.display.shape, Shape::Disc);
    }

    #[test]
    fn node_color_is_last_edge_touching_it() {
        let graph = build_graph(sample());
        // user_a: AI edge first, then IoT edge
        assert_eq!(graph.node("user_a").unwrap().display.color, PALETTE[1]);
        assert_eq!(graph.node("user_b").unwrap().display.color, PALETTE[0]);
        assert_eq!(graph.node("project_2").unwrap().display.color, PALETTE[1]);
    }

    #[test]
    fn sizes_use_total_degree() {
        let many: Vec<PersonNode> = (0..24).map(|i| person(&i.to_string(), 1)).collect();
        let graph = build_graph(vec![extraction("big", "g", &many), extraction("1", "AI", &[person("x", 5)])]);

        let big = graph.node("project_big").unwrap();
        assert_eq!(big.display.size, 10.0);
        assert_eq!(big.display.shape, Shape::Square);
        assert_eq!(big.display.title, "Project big</br>research");
        assert_eq!(graph.node("user_x").unwrap().display.size, 2.0);
        assert_eq!(graph.degree(graph.index["project_big"]), 24);
    }

    #[test]
    fn node_indices_are_first_seen_order() {
        let graph = build_graph(sample());
        let ids: Vec<&str> = graph.graph.node_weights().map(GraphNode::id).collect();
        assert_eq!(
            ids,
            vec!["user_a", "project_1", "user_b", "project_2", "user_c", "project_3"]
        );
    }

    #[test]
    fn projects_without_edges_are_not_in_the_graph() {
        let graph = build_graph(vec![extraction("empty", "g", &[])]);
        assert_eq!(graph.node_count(), 0);
        assert!(graph.groups.is_empty());
    }
}
