//! Run comparison data.
//!
//! Supplied by the query layer and stored as-is. It is never persisted and
//! never feeds the graph layout.
//!
//! Selection rules:
//!
//! - Outside comparison mode at most one run is selected.
//! - In comparison mode up to [`MAX_COMPARED_RUNS`] runs are selected.
//! - The pinned run is always one of the selected runs, falling back to the
//!   first selected run when it is deselected.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

/// Most runs that can be compared side by side.
pub const MAX_COMPARED_RUNS: usize = 3;

/// Opaque identifier of an experiment run.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RunId(String);

impl RunId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for RunId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

/// An entry of the run list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RunSummary {
    pub id: RunId,
    pub title: String,
    pub timestamp: String,
    #[serde(default)]
    pub git_sha: Option<String>,
    #[serde(default)]
    pub bookmark: bool,
}

/// Detailed metadata of a single run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RunMetadata {
    pub id: RunId,
    pub title: String,
    pub timestamp: String,
    #[serde(default)]
    pub author: Option<String>,
    #[serde(default)]
    pub git_branch: Option<String>,
    #[serde(default)]
    pub git_sha: Option<String>,
    #[serde(default)]
    pub notes: Option<String>,
    #[serde(default)]
    pub run_command: Option<String>,
    #[serde(default)]
    pub bookmark: bool,
}

/// Tracked dataset values for the selected runs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrackingDataset {
    pub dataset_name: String,
    pub dataset_type: String,
    pub data: serde_json::Value,
}

/// Variables of the run tracking query.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RunTrackingQuery {
    pub run_ids: Vec<RunId>,
    pub show_diff: bool,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RunsState {
    pub list: Vec<RunSummary>,
    pub selected: Vec<RunId>,
    pub metadata: Vec<RunMetadata>,
    pub tracking: Arc<Vec<TrackingDataset>>,
    pub show_diff: bool,
    pub comparison_mode: bool,
    /// Reference run of a comparison.
    pub pinned: Option<RunId>,
}

impl RunsState {
    pub fn is_single_run(&self) -> bool {
        self.selected.len() == 1
    }

    /// How many runs may be selected in the current mode.
    pub fn max_selected(&self) -> usize {
        if self.comparison_mode {
            MAX_COMPARED_RUNS
        } else {
            1
        }
    }

    /// Whether unselected runs can no longer be added to the selection.
    pub fn selection_full(&self) -> bool {
        self.selected.len() >= self.max_selected()
    }

    /// Replace the selection, dropping duplicates and anything past the cap.
    pub fn select(&mut self, run_ids: &[RunId]) {
        let max = self.max_selected();
        self.selected.clear();
        for id in run_ids {
            if self.selected.len() == max {
                break;
            }
            if !self.selected.contains(id) {
                self.selected.push(id.clone());
            }
        }
        self.repin();
    }

    /// Enter or leave comparison mode. Leaving keeps only the first run.
    pub fn set_comparison_mode(&mut self, enabled: bool) {
        self.comparison_mode = enabled;
        self.selected.truncate(self.max_selected());
        self.repin();
    }

    /// Pin `run_id` if it is selected; `None` falls back to the first run.
    ///
    /// Returns whether the pin was accepted.
    pub fn pin(&mut self, run_id: Option<&RunId>) -> bool {
        match run_id {
            Some(id) if !self.selected.contains(id) => false,
            Some(id) => {
                self.pinned = Some(id.clone());
                true
            }
            None => {
                self.pinned = None;
                self.repin();
                true
            }
        }
    }

    /// Set the bookmark flag of a run in the list and in its metadata.
    pub fn set_bookmark(&mut self, run_id: &RunId, bookmark: bool) {
        for run in self.list.iter_mut().filter(|run| &run.id == run_id) {
            run.bookmark = bookmark;
        }
        for run in self.metadata.iter_mut().filter(|run| &run.id == run_id) {
            run.bookmark = bookmark;
        }
    }

    fn repin(&mut self) {
        let still_selected = self
            .pinned
            .as_ref()
            .is_some_and(|pinned| self.selected.contains(pinned));
        if !still_selected {
            self.pinned = self.selected.first().cloned();
        }
    }

    /// Query variables for the currently selected runs.
    pub fn tracking_query(&self) -> RunTrackingQuery {
        RunTrackingQuery {
            run_ids: self.selected.clone(),
            show_diff: self.show_diff,
        }
    }

    /// Metadata for the selected runs, in selection order.
    ///
    /// Selected runs without metadata are skipped.
    pub fn selected_metadata(&self) -> Vec<&RunMetadata> {
        self.selected
            .iter()
            .filter_map(|id| self.metadata.iter().find(|run| &run.id == id))
            .collect()
    }
}
