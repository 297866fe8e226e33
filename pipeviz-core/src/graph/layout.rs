//! Layout Engines
//!
//! A layout engine is a pure function from [`GraphInput`] to
//! [`ComputedGraph`]. The dispatcher runs it on a blocking worker, so an
//! engine may take as long as it needs but must not touch the store.
//!
//! # Layered layout
//!
//! The bundled [`LayeredLayout`] assigns ranks by longest path:
//!
//! 1. Compute in-degrees over the visible edges
//! 2. Process nodes in topological order (Kahn's algorithm)
//! 3. A node's rank is one more than the highest rank among its sources
//! 4. Nodes left unprocessed sit on a cycle and fail the layout
//!
//! Within a rank nodes keep their input order, so the output is
//! deterministic for a given input.

use std::collections::{HashMap, VecDeque};

use serde::{Deserialize, Serialize};

use super::input::{GraphInput, InputNode};
use crate::config::LayoutConfig;
use crate::error::LayoutError;

/// A node with its final position. `x`/`y` is the top-left corner.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PositionedNode {
    pub id: String,
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
    pub rank: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PositionedEdge {
    pub source: String,
    pub target: String,
    pub points: Vec<Point>,
}

/// Vertical band occupied by the nodes of one layer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LayerBand {
    pub id: String,
    pub y: f64,
    pub height: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct GraphSize {
    pub width: f64,
    pub height: f64,
}

/// Output of a layout engine.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ComputedGraph {
    pub nodes: Vec<PositionedNode>,
    pub edges: Vec<PositionedEdge>,
    pub layers: Vec<LayerBand>,
    pub size: GraphSize,
}

impl ComputedGraph {
    pub fn node(&self, id: &str) -> Option<&PositionedNode> {
        self.nodes.iter().find(|node| node.id == id)
    }
}

/// Turns a graph input into positioned nodes and edges.
pub trait LayoutEngine: Send + Sync + 'static {
    fn layout(&self, input: &GraphInput) -> Result<ComputedGraph, LayoutError>;
}

impl<F> LayoutEngine for F
where
    F: Fn(&GraphInput) -> Result<ComputedGraph, LayoutError> + Send + Sync + 'static,
{
    fn layout(&self, input: &GraphInput) -> Result<ComputedGraph, LayoutError> {
        self(input)
    }
}

/// Top-to-bottom layered layout.
#[derive(Debug, Clone, Default)]
pub struct LayeredLayout {
    config: LayoutConfig,
}

impl LayeredLayout {
    pub fn new(config: LayoutConfig) -> Self {
        Self { config }
    }

    /// Longest-path rank of every node, indexed like `input.nodes`.
    fn ranks(&self, input: &GraphInput) -> Result<Vec<usize>, LayoutError> {
        let index: HashMap<&str, usize> = input
            .nodes
            .iter()
            .enumerate()
            .map(|(i, node)| (node.id.as_str(), i))
            .collect();

        let mut dependents: Vec<Vec<usize>> = vec![Vec::new(); input.nodes.len()];
        let mut in_degree = vec![0usize; input.nodes.len()];
        for edge in &input.edges {
            let source = *index
                .get(edge.source.as_str())
                .ok_or_else(|| LayoutError::UnknownNode(edge.source.clone()))?;
            let target = *index
                .get(edge.target.as_str())
                .ok_or_else(|| LayoutError::UnknownNode(edge.target.clone()))?;
            dependents[source].push(target);
            in_degree[target] += 1;
        }

        let mut ranks = vec![0usize; input.nodes.len()];
        let mut queue: VecDeque<usize> = (0..input.nodes.len())
            .filter(|&i| in_degree[i] == 0)
            .collect();
        let mut processed = 0;

        // Kahn's algorithm
        while let Some(node) = queue.pop_front() {
            processed += 1;
            for &dependent in &dependents[node] {
                ranks[dependent] = ranks[dependent].max(ranks[node] + 1);
                in_degree[dependent] -= 1;
                if in_degree[dependent] == 0 {
                    queue.push_back(dependent);
                }
            }
        }

        if processed < input.nodes.len() {
            return Err(LayoutError::Cycle {
                remaining: input.nodes.len() - processed,
            });
        }
        Ok(ranks)
    }
}

impl LayoutEngine for LayeredLayout {
    fn layout(&self, input: &GraphInput) -> Result<ComputedGraph, LayoutError> {
        let ranks = self.ranks(input)?;
        let rank_count = ranks.iter().max().map_or(0, |max| max + 1);

        let mut rows: Vec<Vec<usize>> = vec![Vec::new(); rank_count];
        for (i, &rank) in ranks.iter().enumerate() {
            rows[rank].push(i);
        }

        let row_width = |row: &[usize]| -> f64 {
            let widths: f64 = row.iter().map(|&i| f64::from(input.nodes[i].width)).sum();
            widths + self.config.node_spacing * row.len().saturating_sub(1) as f64
        };
        let total_width = rows.iter().map(|row| row_width(row)).fold(0.0, f64::max);
        let row_height = input
            .nodes
            .iter()
            .map(|node| f64::from(node.height))
            .fold(0.0, f64::max);

        let mut nodes: Vec<Option<PositionedNode>> = vec![None; input.nodes.len()];
        for (rank, row) in rows.iter().enumerate() {
            let y = rank as f64 * (row_height + self.config.rank_spacing);
            // Centre each row under the widest one.
            let mut x = (total_width - row_width(row)) / 2.0;
            for &i in row {
                let node: &InputNode = &input.nodes[i];
                nodes[i] = Some(PositionedNode {
                    id: node.id.clone(),
                    x,
                    y,
                    width: f64::from(node.width),
                    height: f64::from(node.height),
                    rank,
                });
                x += f64::from(node.width) + self.config.node_spacing;
            }
        }
        let nodes: Vec<PositionedNode> = nodes.into_iter().flatten().collect();

        let by_id: HashMap<&str, &PositionedNode> =
            nodes.iter().map(|node| (node.id.as_str(), node)).collect();
        let edges = input
            .edges
            .iter()
            .filter_map(|edge| {
                let source = by_id.get(edge.source.as_str())?;
                let target = by_id.get(edge.target.as_str())?;
                Some(PositionedEdge {
                    source: edge.source.clone(),
                    target: edge.target.clone(),
                    points: vec![
                        Point {
                            x: source.x + source.width / 2.0,
                            y: source.y + source.height,
                        },
                        Point {
                            x: target.x + target.width / 2.0,
                            y: target.y,
                        },
                    ],
                })
            })
            .collect();

        let layers = input
            .layers
            .iter()
            .filter_map(|layer| {
                let members = input
                    .nodes
                    .iter()
                    .zip(&nodes)
                    .filter(|(node, _)| node.layer.as_deref() == Some(layer.as_str()))
                    .map(|(_, positioned)| positioned);
                let (top, bottom) = members.fold(None, |acc: Option<(f64, f64)>, node| {
                    let (top, bottom) = acc.unwrap_or((node.y, node.y + node.height));
                    Some((top.min(node.y), bottom.max(node.y + node.height)))
                })?;
                Some(LayerBand {
                    id: layer.clone(),
                    y: top,
                    height: bottom - top,
                })
            })
            .collect();

        let height = if rank_count == 0 {
            0.0
        } else {
            rank_count as f64 * row_height + (rank_count - 1) as f64 * self.config.rank_spacing
        };

        Ok(ComputedGraph {
            nodes,
            edges,
            layers,
            size: GraphSize {
                width: total_width,
                height,
            },
        })
    }
}
