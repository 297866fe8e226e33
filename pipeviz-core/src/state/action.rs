//! Store actions.
//!
//! Actions are plain data and round-trip through JSON so that a view layer
//! can dispatch them as `{"type": "TOGGLE_THEME", "theme": "light"}`.
//! Any `type` the reducer does not know deserializes to [`Action::Unknown`].

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use super::runs::{RunId, RunMetadata, RunSummary, TrackingDataset};
use super::{NodeType, Theme};
use crate::graph::ComputedGraph;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Action {
    #[serde(rename_all = "camelCase")]
    ToggleNodesDisabled {
        #[serde(rename = "nodeIDs")]
        node_ids: Vec<String>,
        is_disabled: bool,
    },
    ToggleTypeDisabled {
        #[serde(rename = "typeIDs")]
        type_ids: IndexMap<NodeType, bool>,
    },
    UpdateActivePipeline {
        pipeline: String,
    },
    ToggleLayers {
        visible: bool,
    },
    ToggleTagFilter {
        #[serde(rename = "tagIDs")]
        tag_ids: Vec<String>,
        enabled: bool,
    },
    #[serde(rename_all = "camelCase")]
    ToggleTextLabels {
        text_labels: bool,
    },
    ToggleTheme {
        theme: Theme,
    },
    #[serde(rename_all = "camelCase")]
    TogglePrettyName {
        pretty_name: bool,
    },
    ChangeFlag {
        name: String,
        value: bool,
    },
    ToggleExportModal {
        visible: bool,
    },
    TogglePlotModal {
        visible: bool,
    },
    ToggleSettingsModal {
        visible: bool,
    },
    ToggleSidebar {
        visible: bool,
    },
    ToggleMiniMap {
        visible: bool,
    },
    ToggleCode {
        visible: bool,
    },
    #[serde(rename_all = "camelCase")]
    ToggleModularPipelineFocusMode {
        modular_pipeline: Option<String>,
    },
    #[serde(rename_all = "camelCase")]
    ToggleNodeHovered {
        node_id: Option<String>,
    },
    #[serde(rename_all = "camelCase")]
    ToggleNodeClicked {
        node_id: Option<String>,
    },
    /// Result of a background layout job. `sequence` is `None` when the
    /// result should be applied regardless of ordering.
    UpdateGraphLayout {
        graph: ComputedGraph,
        #[serde(default)]
        sequence: Option<u64>,
    },
    UpdateRunList {
        runs: Vec<RunSummary>,
    },
    #[serde(rename_all = "camelCase")]
    UpdateSelectedRuns {
        run_ids: Vec<RunId>,
    },
    #[serde(rename_all = "camelCase")]
    ToggleShowDiff {
        show_diff: bool,
    },
    /// Enter or leave run comparison mode.
    ToggleComparisonView {
        enabled: bool,
    },
    #[serde(rename_all = "camelCase")]
    UpdatePinnedRun {
        run_id: Option<RunId>,
    },
    #[serde(rename_all = "camelCase")]
    ToggleRunBookmark {
        run_id: RunId,
        bookmark: bool,
    },
    UpdateRunMetadata {
        metadata: Vec<RunMetadata>,
    },
    UpdateRunTrackingData {
        datasets: Vec<TrackingDataset>,
    },
    #[serde(other)]
    Unknown,
}

impl Action {
    /// Parse an action from its JSON form.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// Short name used in logs.
    pub fn kind(&self) -> &'static str {
        match self {
            Action::ToggleNodesDisabled { .. } => "TOGGLE_NODES_DISABLED",
            Action::ToggleTypeDisabled { .. } => "TOGGLE_TYPE_DISABLED",
            Action::UpdateActivePipeline { .. } => "UPDATE_ACTIVE_PIPELINE",
            Action::ToggleLayers { .. } => "TOGGLE_LAYERS",
            Action::ToggleTagFilter { .. } => "TOGGLE_TAG_FILTER",
            Action::ToggleTextLabels { .. } => "TOGGLE_TEXT_LABELS",
            Action::ToggleTheme { .. } => "TOGGLE_THEME",
            Action::TogglePrettyName { .. } => "TOGGLE_PRETTY_NAME",
            Action::ChangeFlag { .. } => "CHANGE_FLAG",
            Action::ToggleExportModal { .. } => "TOGGLE_EXPORT_MODAL",
            Action::TogglePlotModal { .. } => "TOGGLE_PLOT_MODAL",
            Action::ToggleSettingsModal { .. } => "TOGGLE_SETTINGS_MODAL",
            Action::ToggleSidebar { .. } => "TOGGLE_SIDEBAR",
            Action::ToggleMiniMap { .. } => "TOGGLE_MINI_MAP",
            Action::ToggleCode { .. } => "TOGGLE_CODE",
            Action::ToggleModularPipelineFocusMode { .. } => "TOGGLE_MODULAR_PIPELINE_FOCUS_MODE",
            Action::ToggleNodeHovered { .. } => "TOGGLE_NODE_HOVERED",
            Action::ToggleNodeClicked { .. } => "TOGGLE_NODE_CLICKED",
            Action::UpdateGraphLayout { .. } => "UPDATE_GRAPH_LAYOUT",
            Action::UpdateRunList { .. } => "UPDATE_RUN_LIST",
            Action::UpdateSelectedRuns { .. } => "UPDATE_SELECTED_RUNS",
            Action::ToggleShowDiff { .. } => "TOGGLE_SHOW_DIFF",
            Action::ToggleComparisonView { .. } => "TOGGLE_COMPARISON_VIEW",
            Action::UpdatePinnedRun { .. } => "UPDATE_PINNED_RUN",
            Action::ToggleRunBookmark { .. } => "TOGGLE_RUN_BOOKMARK",
            Action::UpdateRunMetadata { .. } => "UPDATE_RUN_METADATA",
            Action::UpdateRunTrackingData { .. } => "UPDATE_RUN_TRACKING_DATA",
            Action::Unknown => "UNKNOWN",
        }
    }
}
