//! Application State
//!
//! This module defines the single state tree owned by the store, the actions
//! that transition it, and the pure reducer that applies them.
//!
//! # Slices
//!
//! The tree is split into named slices:
//!
//! - `node`, `edge`: pipeline graph data plus per-node UI flags
//! - `node_type`, `tag`, `layer`, `pipeline`: filters over the graph
//! - `text_labels`, `pretty_name`, `theme`, `flags`: display preferences
//! - `visible`: panel and modal visibility
//! - `graph`: the last accepted layout result
//! - `runs`: run comparison data supplied by the query layer
//!
//! A state value is never mutated in place once the store has committed it.
//! The reducer clones and returns the next revision; the large slices are
//! behind `Arc` and shared until an action replaces them.

mod action;
mod initial;
mod reducer;
mod runs;

pub use action::Action;
pub use initial::{InitialProps, PipelineData, PipelineRecord, TagRecord, VisibleOverrides};
pub use reducer::reduce;
pub use runs::{
    RunId, RunMetadata, RunSummary, RunTrackingQuery, RunsState, TrackingDataset, MAX_COMPARED_RUNS,
};

use std::sync::Arc;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::graph::ComputedGraph;

/// The kind of a pipeline node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum NodeType {
    Task,
    Data,
    Parameters,
    ModularPipeline,
}

impl NodeType {
    /// All node types, in display order.
    pub const ALL: [NodeType; 4] = [
        NodeType::Task,
        NodeType::Data,
        NodeType::Parameters,
        NodeType::ModularPipeline,
    ];
}

/// Colour theme.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    #[default]
    Dark,
    Light,
}

/// A single node as supplied by the pipeline data.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NodeRecord {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub pretty_name: Option<String>,
    #[serde(rename = "type")]
    pub node_type: NodeType,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub pipelines: Vec<String>,
    #[serde(default)]
    pub layer: Option<String>,
    #[serde(default)]
    pub modular_pipelines: Vec<String>,
}

impl NodeRecord {
    /// The label shown for this node given the pretty-name preference.
    pub fn display_name(&self, pretty: bool) -> &str {
        match (&self.pretty_name, pretty) {
            (Some(pretty_name), true) => pretty_name,
            _ => &self.name,
        }
    }
}

/// A directed edge between two nodes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EdgeRecord {
    pub source: String,
    pub target: String,
}

impl EdgeRecord {
    /// Stable identifier for the edge.
    pub fn id(&self) -> String {
        format!("{}|{}", self.source, self.target)
    }
}

/// Node data and per-node UI flags.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NodeState {
    /// Node records keyed by id, in declaration order. Shared between
    /// revisions until the data itself changes.
    pub records: Arc<IndexMap<String, NodeRecord>>,
    /// Nodes hidden by the user. `false` entries are kept until persisted.
    pub disabled: IndexMap<String, bool>,
    pub hovered: Option<String>,
    pub clicked: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct EdgeState {
    pub records: Arc<Vec<EdgeRecord>>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct NodeTypeState {
    pub disabled: IndexMap<NodeType, bool>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct PipelineState {
    pub ids: Vec<String>,
    pub names: IndexMap<String, String>,
    pub main: Option<String>,
    pub active: Option<String>,
}

impl PipelineState {
    /// Whether `id` names a known pipeline.
    pub fn contains(&self, id: &str) -> bool {
        self.ids.iter().any(|known| known == id)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LayerState {
    pub ids: Vec<String>,
    pub visible: bool,
}

impl Default for LayerState {
    fn default() -> Self {
        Self {
            ids: Vec::new(),
            visible: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct TagState {
    pub names: IndexMap<String, String>,
    pub enabled: IndexMap<String, bool>,
}

impl TagState {
    /// Ids of tags currently used as a filter.
    pub fn enabled_ids(&self) -> impl Iterator<Item = &str> {
        self.enabled
            .iter()
            .filter(|(_, on)| **on)
            .map(|(id, _)| id.as_str())
    }
}

/// Panel, button and modal visibility.
///
/// The modal flags and the focus mode are transient and never persisted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VisibleState {
    pub graph: bool,
    pub label_btn: bool,
    pub layer_btn: bool,
    pub export_btn: bool,
    pub pretty_name_btn: bool,
    pub sidebar: bool,
    pub mini_map: bool,
    pub code: bool,
    pub export_modal: bool,
    pub plot_modal: bool,
    pub settings_modal: bool,
    pub modular_pipeline_focus_mode: Option<String>,
}

impl Default for VisibleState {
    fn default() -> Self {
        Self {
            graph: true,
            label_btn: true,
            layer_btn: true,
            export_btn: true,
            pretty_name_btn: true,
            sidebar: true,
            mini_map: true,
            code: false,
            export_modal: false,
            plot_modal: false,
            settings_modal: false,
            modular_pipeline_focus_mode: None,
        }
    }
}

/// The last accepted layout result.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct GraphState {
    pub layout: Arc<ComputedGraph>,
    /// Sequence number of the job that produced `layout`, 0 before any.
    pub sequence: u64,
}

/// The whole state tree.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApplicationState {
    pub node: NodeState,
    pub edge: EdgeState,
    pub node_type: NodeTypeState,
    pub pipeline: PipelineState,
    pub layer: LayerState,
    pub tag: TagState,
    pub text_labels: bool,
    pub visible: VisibleState,
    pub theme: Theme,
    pub pretty_name: bool,
    pub flags: IndexMap<String, bool>,
    pub graph: GraphState,
    pub runs: RunsState,
}

impl Default for ApplicationState {
    fn default() -> Self {
        let mut node_type = NodeTypeState::default();
        for kind in NodeType::ALL {
            // Parameters are hidden until the user asks for them.
            node_type.disabled.insert(kind, kind == NodeType::Parameters);
        }

        Self {
            node: NodeState::default(),
            edge: EdgeState::default(),
            node_type,
            pipeline: PipelineState::default(),
            layer: LayerState::default(),
            tag: TagState::default(),
            text_labels: true,
            visible: VisibleState::default(),
            theme: Theme::default(),
            pretty_name: true,
            flags: IndexMap::new(),
            graph: GraphState::default(),
            runs: RunsState::default(),
        }
    }
}

impl ApplicationState {
    /// Build a state tree from pipeline data with every preference at its
    /// default.
    pub fn from_data(data: &PipelineData) -> Self {
        let mut state = Self::default();

        state.node.records = Arc::new(
            data.nodes
                .iter()
                .map(|record| (record.id.clone(), record.clone()))
                .collect(),
        );
        state.edge.records = Arc::new(data.edges.clone());

        for pipeline in &data.pipelines {
            state.pipeline.ids.push(pipeline.id.clone());
            state
                .pipeline
                .names
                .insert(pipeline.id.clone(), pipeline.name.clone());
        }
        state.pipeline.main = data
            .main_pipeline
            .clone()
            .or_else(|| state.pipeline.ids.first().cloned());
        state.pipeline.active = data
            .selected_pipeline
            .clone()
            .or_else(|| state.pipeline.main.clone());

        for tag in &data.tags {
            state.tag.names.insert(tag.id.clone(), tag.name.clone());
            state.tag.enabled.insert(tag.id.clone(), false);
        }
        state.layer.ids = data.layers.clone();

        state
    }

    /// Whether a node type is hidden.
    pub fn is_type_disabled(&self, kind: NodeType) -> bool {
        self.node_type.disabled.get(&kind).copied().unwrap_or(false)
    }
}
