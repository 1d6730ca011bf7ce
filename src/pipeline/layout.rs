// layout.rs
// Phase 5: Deterministic 2D layout (seeded Fruchterman-Reingold)

use crate::graph::{NodeId, SocialGraph};
use petgraph::visit::EdgeRef;
use rand::{rngs::StdRng, Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::info;

pub const DEFAULT_SEED: u64 = 10;
pub const DEFAULT_ITERATIONS: usize = 2000;

/// Layout configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LayoutConfig {
    /// Relaxation steps; the layout always returns after exactly this many.
    pub iterations: usize,
    /// Seed for start positions and tie-breaking jitter.
    pub seed: u64,
    /// Maximum per-axis movement in the first step. Defaults to `sqrt(n) / 10`.
    pub start_temperature: Option<f64>,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            iterations: DEFAULT_ITERATIONS,
            seed: DEFAULT_SEED,
            start_temperature: None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Position {
    pub x: f64,
    pub y: f64,
}

/// Weighted edge between dense node keys.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WeightedEdge {
    pub source: usize,
    pub target: usize,
    pub weight: f64,
}

/// Layout algorithm trait.
pub trait LayoutAlgorithm {
    /// Move `positions` (indexed by dense node key) to their final place.
    fn relax(&self, positions: &mut [Position], edges: &[WeightedEdge], rng: &mut StdRng);
}

/// Fruchterman-Reingold without grid acceleration: all-pairs repulsion,
/// attraction along edges scaled by edge weight, linear cooling.
#[derive(Debug, Clone)]
pub struct FruchtermanReingold {
    pub iterations: usize,
    pub start_temperature: Option<f64>,
}

impl LayoutAlgorithm for FruchtermanReingold {
    fn relax(&self, positions: &mut [Position], edges: &[WeightedEdge], rng: &mut StdRng) {
        let n = positions.len();
        if n == 0 || self.iterations == 0 {
            return;
        }

        let mut temperature = self
            .start_temperature
            .unwrap_or_else(|| (n as f64).sqrt() / 10.0);
        let cooling = temperature / self.iterations as f64;
        let mut displacement = vec![(0.0f64, 0.0f64); n];

        for _ in 0..self.iterations {
            displacement.fill((0.0, 0.0));

            for v in 0..n {
                for u in (v + 1)..n {
                    let mut dx = positions[v].x - positions[u].x;
                    let mut dy = positions[v].y - positions[u].y;
                    let mut dlen = dx * dx + dy * dy;
                    // Coincident nodes get pushed apart in a random direction
                    while dlen == 0.0 {
                        dx = rng.gen_range(-1e-9..1e-9);
                        dy = rng.gen_range(-1e-9..1e-9);
                        dlen = dx * dx + dy * dy;
                    }
                    displacement[v].0 += dx / dlen;
                    displacement[v].1 += dy / dlen;
                    displacement[u].0 -= dx / dlen;
                    displacement[u].1 -= dy / dlen;
                }
            }

            for edge in edges {
                let (v, u) = (edge.source, edge.target);
                if v == u {
                    continue;
                }
                let dx = positions[v].x - positions[u].x;
                let dy = positions[v].y - positions[u].y;
                let pull = (dx * dx + dy * dy).sqrt() * edge.weight;
                displacement[v].0 -= dx * pull;
                displacement[v].1 -= dy * pull;
                displacement[u].0 += dx * pull;
                displacement[u].1 += dy * pull;
            }

            for (position, &(dx, dy)) in positions.iter_mut().zip(&displacement) {
                let dx = dx + rng.gen_range(-1e-9..1e-9);
                let dy = dy + rng.gen_range(-1e-9..1e-9);
                let len = (dx * dx + dy * dy).sqrt();
                if len == 0.0 {
                    continue;
                }
                let scale = if len > temperature { temperature / len } else { 1.0 };
                position.x += dx * scale;
                position.y += dy * scale;
            }

            temperature -= cooling;
        }
    }
}

/// Final coordinates, indexed by dense node key, with the way back to
/// original node ids.
#[derive(Debug, Clone, PartialEq)]
pub struct Layout {
    positions: Vec<Position>,
    original_ids: Vec<NodeId>,
    keys: HashMap<NodeId, usize>,
}

impl Layout {
    pub fn position(&self, key: usize) -> Option<Position> {
        self.positions.get(key).copied()
    }

    pub fn original_id(&self, key: usize) -> Option<&str> {
        self.original_ids.get(key).map(String::as_str)
    }

    pub fn key_of(&self, id: &str) -> Option<usize> {
        self.keys.get(id).copied()
    }

    pub fn len(&self) -> usize {
        self.positions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }

    pub fn positions(&self) -> &[Position] {
        &self.positions
    }
}

/// Lay out `graph` with the default algorithm.
pub fn compute_layout(graph: &SocialGraph, config: &LayoutConfig) -> Layout {
    let algorithm = FruchtermanReingold {
        iterations: config.iterations,
        start_temperature: config.start_temperature,
    };
    compute_layout_with(graph, config.seed, &algorithm)
}

/// Seeded start positions in [0, 1)², then `algorithm`.
pub fn compute_layout_with(
    graph: &SocialGraph,
    seed: u64,
    algorithm: &dyn LayoutAlgorithm,
) -> Layout {
    // Node indices are already dense and in first-seen order
    let original_ids: Vec<NodeId> = graph
        .graph
        .node_weights()
        .map(|n| n.id().to_string())
        .collect();
    let keys = original_ids
        .iter()
        .enumerate()
        .map(|(key, id)| (id.clone(), key))
        .collect();

    let edges: Vec<WeightedEdge> = graph
        .graph
        .edge_references()
        .map(|e| WeightedEdge {
            source: e.source().index(),
            target: e.target().index(),
            weight: e.weight().weight,
        })
        .collect();

    let mut rng = StdRng::seed_from_u64(seed);
    let mut positions: Vec<Position> = (0..original_ids.len())
        .map(|_| Position {
            x: rng.gen::<f64>(),
            y: rng.gen::<f64>(),
        })
        .collect();

    algorithm.relax(&mut positions, &edges, &mut rng);
    info!(nodes = positions.len(), edges = edges.len(), "layout computed");

    Layout {
        positions,
        original_ids,
        keys,
    }
}
