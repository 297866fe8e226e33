//! Startup loading.
//!
//! The initial state is layered, lowest first:
//!
//! 1. defaults built from the pipeline data
//! 2. the persisted snapshot, if one can be read and parsed
//! 3. the statically supplied props
//!
//! so explicit props always beat stale preferences, and preferences fill
//! whatever the props leave unset.

use tracing::{debug, warn};

use super::snapshot::PersistedSnapshot;
use super::storage::Storage;
use crate::state::{ApplicationState, InitialProps};

/// Read and parse the snapshot under `key`.
///
/// Missing, unreadable and corrupt snapshots all yield `None`; the latter two
/// are logged.
pub fn load_snapshot(storage: &dyn Storage, key: &str) -> Option<PersistedSnapshot> {
    let raw = match storage.read(key) {
        Ok(Some(raw)) => raw,
        Ok(None) => {
            debug!(key, "no persisted state");
            return None;
        }
        Err(err) => {
            warn!(key, error = %err, "failed to read persisted state");
            return None;
        }
    };

    match PersistedSnapshot::from_json(&raw) {
        Ok(snapshot) => Some(snapshot),
        Err(err) => {
            warn!(key, error = %err, "ignoring corrupt persisted state");
            None
        }
    }
}

/// Build the startup state from `props` and an optional snapshot.
pub fn initial_state(props: &InitialProps, snapshot: Option<&PersistedSnapshot>) -> ApplicationState {
    let data = props.data.clone().unwrap_or_default();
    let mut state = ApplicationState::from_data(&data);

    if let Some(snapshot) = snapshot {
        snapshot.apply_to(&mut state);
    }

    // Explicit props win over persisted preferences.
    if let Some(selected) = &data.selected_pipeline {
        state.pipeline.active = Some(selected.clone());
    }
    if let Some(theme) = props.theme {
        state.theme = theme;
    }
    if let Some(text_labels) = props.text_labels {
        state.text_labels = text_labels;
    }
    if let Some(pretty_name) = props.pretty_name {
        state.pretty_name = pretty_name;
    }
    props.visible.apply(&mut state.visible);
    state
        .flags
        .extend(props.flags.iter().map(|(name, on)| (name.clone(), *on)));

    state
}

/// [`load_snapshot`] followed by [`initial_state`].
pub fn load_initial_state(
    props: &InitialProps,
    storage: &dyn Storage,
    key: &str,
) -> ApplicationState {
    let snapshot = load_snapshot(storage, key);
    initial_state(props, snapshot.as_ref())
}
