//! The state reducer.
//!
//! `reduce` is a pure transition: it never touches the current revision and
//! returns the next one, or `None` when the action leaves the state as it is.

use std::sync::Arc;

use super::{Action, ApplicationState};

/// Apply `action` to `state`.
///
/// Returns `None` for unknown actions and for layout results older than the
/// one already applied.
pub fn reduce(state: &ApplicationState, action: &Action) -> Option<ApplicationState> {
    match action {
        Action::Unknown => return None,
        Action::UpdateGraphLayout {
            sequence: Some(sequence),
            ..
        } if *sequence < state.graph.sequence => return None,
        _ => {}
    }

    // Node, edge, layout and tracking data sit behind `Arc`, so this copies
    // only the small slices.
    let mut next = state.clone();
    match action {
        Action::ToggleNodesDisabled {
            node_ids,
            is_disabled,
        } => {
            for id in node_ids {
                next.node.disabled.insert(id.clone(), *is_disabled);
            }
        }
        Action::ToggleTypeDisabled { type_ids } => {
            for (kind, disabled) in type_ids {
                next.node_type.disabled.insert(*kind, *disabled);
            }
        }
        Action::UpdateActivePipeline { pipeline } => {
            next.pipeline.active = Some(pipeline.clone());
        }
        Action::ToggleLayers { visible } => next.layer.visible = *visible,
        Action::ToggleTagFilter { tag_ids, enabled } => {
            for id in tag_ids {
                next.tag.enabled.insert(id.clone(), *enabled);
            }
        }
        Action::ToggleTextLabels { text_labels } => next.text_labels = *text_labels,
        Action::ToggleTheme { theme } => next.theme = *theme,
        Action::TogglePrettyName { pretty_name } => next.pretty_name = *pretty_name,
        Action::ChangeFlag { name, value } => {
            next.flags.insert(name.clone(), *value);
        }
        Action::ToggleExportModal { visible } => next.visible.export_modal = *visible,
        Action::TogglePlotModal { visible } => next.visible.plot_modal = *visible,
        Action::ToggleSettingsModal { visible } => next.visible.settings_modal = *visible,
        Action::ToggleSidebar { visible } => next.visible.sidebar = *visible,
        Action::ToggleMiniMap { visible } => next.visible.mini_map = *visible,
        Action::ToggleCode { visible } => next.visible.code = *visible,
        Action::ToggleModularPipelineFocusMode { modular_pipeline } => {
            next.visible.modular_pipeline_focus_mode = modular_pipeline.clone();
        }
        Action::ToggleNodeHovered { node_id } => next.node.hovered = node_id.clone(),
        Action::ToggleNodeClicked { node_id } => next.node.clicked = node_id.clone(),
        Action::UpdateGraphLayout { graph, sequence } => {
            // Replaced wholesale, never patched.
            next.graph.layout = Arc::new(graph.clone());
            if let Some(sequence) = sequence {
                next.graph.sequence = *sequence;
            }
        }
        Action::UpdateRunList { runs } => next.runs.list = runs.clone(),
        Action::UpdateSelectedRuns { run_ids } => next.runs.select(run_ids),
        Action::ToggleShowDiff { show_diff } => next.runs.show_diff = *show_diff,
        Action::ToggleComparisonView { enabled } => next.runs.set_comparison_mode(*enabled),
        Action::UpdatePinnedRun { run_id } => {
            if !next.runs.pin(run_id.as_ref()) {
                return None;
            }
        }
        Action::ToggleRunBookmark { run_id, bookmark } => next.runs.set_bookmark(run_id, *bookmark),
        Action::UpdateRunMetadata { metadata } => next.runs.metadata = metadata.clone(),
        Action::UpdateRunTrackingData { datasets } => {
            next.runs.tracking = Arc::new(datasets.clone());
        }
        Action::Unknown => return None,
    }

    Some(next)
}
