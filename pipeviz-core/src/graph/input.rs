//! Graph Input Projection
//!
//! The minimal slice of state the layout engine needs. It is recomputed from
//! scratch on every store notification, so two projections are compared by
//! value, never by identity.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::state::{ApplicationState, NodeRecord, NodeType};

/// Height of every node box.
pub const NODE_HEIGHT: u32 = 36;

/// Width of a node box without a label (icon only).
pub const NODE_BASE_WIDTH: u32 = 40;

/// Horizontal space taken by one label character.
pub const LABEL_CHAR_WIDTH: u32 = 7;

/// A node as seen by the layout engine.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct InputNode {
    pub id: String,
    pub node_type: NodeType,
    /// Present only when text labels are shown.
    pub label: Option<String>,
    /// Present only when layers are shown.
    pub layer: Option<String>,
    pub width: u32,
    pub height: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct InputEdge {
    pub source: String,
    pub target: String,
}

/// Everything that affects the layout, and nothing else.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct GraphInput {
    pub nodes: Vec<InputNode>,
    pub edges: Vec<InputEdge>,
    /// Visible layers, in declared order.
    pub layers: Vec<String>,
}

impl GraphInput {
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}

/// Project `state` into the layout input.
///
/// A node is visible when it belongs to the active pipeline, is not disabled
/// by itself or by its type, carries an enabled tag (if any tag filter is
/// on), and sits inside the focused modular pipeline (if focus mode is on).
pub fn graph_input(state: &ApplicationState) -> GraphInput {
    let enabled_tags: HashSet<&str> = state.tag.enabled_ids().collect();
    let focus = state.visible.modular_pipeline_focus_mode.as_deref();
    let active = state.pipeline.active.as_deref();

    let nodes: Vec<InputNode> = state
        .node
        .records
        .values()
        .filter(|node| is_node_visible(state, node, active, &enabled_tags, focus))
        .map(|node| input_node(state, node))
        .collect();

    let visible: HashSet<&str> = nodes.iter().map(|node| node.id.as_str()).collect();
    let mut seen = HashSet::new();
    let edges = state
        .edge
        .records
        .iter()
        .filter(|edge| {
            visible.contains(edge.source.as_str()) && visible.contains(edge.target.as_str())
        })
        .filter(|edge| seen.insert((edge.source.as_str(), edge.target.as_str())))
        .map(|edge| InputEdge {
            source: edge.source.clone(),
            target: edge.target.clone(),
        })
        .collect();

    let layers = if state.layer.visible {
        let used: HashSet<&str> = nodes.iter().filter_map(|node| node.layer.as_deref()).collect();
        state
            .layer
            .ids
            .iter()
            .filter(|layer| used.contains(layer.as_str()))
            .cloned()
            .collect()
    } else {
        Vec::new()
    };

    GraphInput {
        nodes,
        edges,
        layers,
    }
}

fn is_node_visible(
    state: &ApplicationState,
    node: &NodeRecord,
    active: Option<&str>,
    enabled_tags: &HashSet<&str>,
    focus: Option<&str>,
) -> bool {
    // Nodes that list no pipeline belong to all of them.
    if let Some(active) = active {
        if !node.pipelines.is_empty() && !node.pipelines.iter().any(|p| p == active) {
            return false;
        }
    }
    if state.node.disabled.get(&node.id).copied().unwrap_or(false) {
        return false;
    }
    if state.is_type_disabled(node.node_type) {
        return false;
    }
    if !enabled_tags.is_empty() && !node.tags.iter().any(|tag| enabled_tags.contains(tag.as_str())) {
        return false;
    }
    if let Some(focus) = focus {
        if !node.modular_pipelines.iter().any(|mp| mp == focus) {
            return false;
        }
    }
    true
}

fn input_node(state: &ApplicationState, node: &NodeRecord) -> InputNode {
    let label = state
        .text_labels
        .then(|| node.display_name(state.pretty_name).to_string());
    let width = match &label {
        Some(label) => NODE_BASE_WIDTH + LABEL_CHAR_WIDTH * label.chars().count() as u32,
        None => NODE_BASE_WIDTH,
    };

    InputNode {
        id: node.id.clone(),
        node_type: node.node_type,
        label,
        layer: if state.layer.visible {
            node.layer.clone()
        } else {
            None
        },
        width,
        height: NODE_HEIGHT,
    }
}
