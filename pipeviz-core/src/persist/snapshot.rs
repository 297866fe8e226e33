//! Persisted snapshot.
//!
//! A [`PersistedSnapshot`] is built field by field from an explicit list of
//! slices. Transient UI state has no field here, so it cannot leak into
//! storage: the visible slice is stored as [`VisibleOverrides`], which has
//! no modal or focus-mode field.

use indexmap::IndexMap;
use serde::de::value::StrDeserializer;
use serde::de::IntoDeserializer;
use serde::{Deserialize, Deserializer, Serialize};
use tracing::debug;

use crate::state::{ApplicationState, NodeType, Theme, VisibleOverrides};

/// Visible-slice fields that are never persisted.
pub const EXCLUDED_VISIBLE_FIELDS: [&str; 4] = [
    "exportModal",
    "plotModal",
    "settingsModal",
    "modularPipelineFocusMode",
];

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PersistedNode {
    pub disabled: IndexMap<String, bool>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PersistedNodeType {
    /// Node types this build does not know are dropped on load.
    #[serde(deserialize_with = "known_node_types")]
    pub disabled: IndexMap<NodeType, bool>,
}

fn known_node_types<'de, D>(deserializer: D) -> Result<IndexMap<NodeType, bool>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = IndexMap::<String, bool>::deserialize(deserializer)?;
    Ok(raw
        .into_iter()
        .filter_map(|(key, disabled)| {
            let name: StrDeserializer<'_, serde::de::value::Error> = key.as_str().into_deserializer();
            match NodeType::deserialize(name) {
                Ok(kind) => Some((kind, disabled)),
                Err(_) => {
                    debug!(node_type = %key, "skipping unknown persisted node type");
                    None
                }
            }
        })
        .collect())
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PersistedPipeline {
    pub active: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PersistedLayer {
    pub visible: Option<bool>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PersistedTag {
    pub enabled: IndexMap<String, bool>,
}

/// The subset of state that survives a reload.
///
/// Scalar preferences are optional so that a snapshot written by an older
/// build, missing some field, leaves that field at its default on load.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PersistedSnapshot {
    pub node: PersistedNode,
    pub node_type: PersistedNodeType,
    pub pipeline: PersistedPipeline,
    pub layer: PersistedLayer,
    pub tag: PersistedTag,
    pub text_labels: Option<bool>,
    pub visible: VisibleOverrides,
    pub theme: Option<Theme>,
    pub pretty_name: Option<bool>,
    pub flags: IndexMap<String, bool>,
}

impl PersistedSnapshot {
    /// Build the snapshot of `state`.
    pub fn from_state(state: &ApplicationState) -> Self {
        let visible = &state.visible;
        Self {
            node: PersistedNode {
                disabled: prune_falsey(&state.node.disabled),
            },
            node_type: PersistedNodeType {
                disabled: state.node_type.disabled.clone(),
            },
            pipeline: PersistedPipeline {
                active: state.pipeline.active.clone(),
            },
            layer: PersistedLayer {
                visible: Some(state.layer.visible),
            },
            tag: PersistedTag {
                enabled: state.tag.enabled.clone(),
            },
            text_labels: Some(state.text_labels),
            visible: VisibleOverrides {
                graph: Some(visible.graph),
                label_btn: Some(visible.label_btn),
                layer_btn: Some(visible.layer_btn),
                export_btn: Some(visible.export_btn),
                pretty_name_btn: Some(visible.pretty_name_btn),
                sidebar: Some(visible.sidebar),
                mini_map: Some(visible.mini_map),
                code: Some(visible.code),
            },
            theme: Some(state.theme),
            pretty_name: Some(state.pretty_name),
            flags: state.flags.clone(),
        }
    }

    /// Lay the persisted preferences over `state`.
    ///
    /// Map slices merge per key. A persisted active pipeline is only used
    /// if `state` knows that pipeline.
    pub fn apply_to(&self, state: &mut ApplicationState) {
        state.node.disabled.extend(
            self.node
                .disabled
                .iter()
                .map(|(id, disabled)| (id.clone(), *disabled)),
        );
        state.node_type.disabled.extend(self.node_type.disabled.iter().map(|(k, v)| (*k, *v)));
        if let Some(active) = &self.pipeline.active {
            if state.pipeline.contains(active) {
                state.pipeline.active = Some(active.clone());
            }
        }
        if let Some(visible) = self.layer.visible {
            state.layer.visible = visible;
        }
        state.tag.enabled.extend(
            self.tag
                .enabled
                .iter()
                .map(|(id, enabled)| (id.clone(), *enabled)),
        );
        if let Some(text_labels) = self.text_labels {
            state.text_labels = text_labels;
        }
        self.visible.apply(&mut state.visible);
        if let Some(theme) = self.theme {
            state.theme = theme;
        }
        if let Some(pretty_name) = self.pretty_name {
            state.pretty_name = pretty_name;
        }
        state
            .flags
            .extend(self.flags.iter().map(|(name, on)| (name.clone(), *on)));
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }
}

/// Keep only the `true` entries of a flag map.
pub fn prune_falsey(map: &IndexMap<String, bool>) -> IndexMap<String, bool> {
    map.iter()
        .filter(|(_, on)| **on)
        .map(|(key, on)| (key.clone(), *on))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn busy_state() -> ApplicationState {
        let mut state = ApplicationState::default();
        state.node.disabled.insert("a".into(), true);
        state.node.disabled.insert("b".into(), false);
        state.node.disabled.insert("c".into(), true);
        state.visible.export_modal = true;
        state.visible.plot_modal = true;
        state.visible.settings_modal = true;
        state.visible.modular_pipeline_focus_mode = Some("prep".into());
        state.visible.sidebar = false;
        state.node.hovered = Some("a".into());
        state
    }

    #[test]
    fn prune_keeps_truthy_entries_in_order() {
        let state = busy_state();
        let pruned = prune_falsey(&state.node.disabled);
        let keys: Vec<&str> = pruned.keys().map(String::as_str).collect();
        assert_eq!(keys, vec!["a", "c"]);
    }

    #[test]
    fn excluded_fields_never_serialized() {
        let json = PersistedSnapshot::from_state(&busy_state()).to_json().unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        let visible = value["visible"].as_object().unwrap();

        for field in EXCLUDED_VISIBLE_FIELDS {
            assert!(!visible.contains_key(field), "{field} leaked into snapshot");
            assert!(!json.contains(field));
        }
        assert_eq!(visible["sidebar"], false);
        assert!(value.get("graph").is_none());
        assert!(value.get("runs").is_none());
        assert!(!json.contains("hovered"));
    }

    #[test]
    fn snapshot_uses_camel_case_slices() {
        let value = serde_json::to_value(PersistedSnapshot::from_state(&ApplicationState::default()))
            .unwrap();
        assert!(value.get("nodeType").is_some());
        assert_eq!(value["textLabels"], true);
        assert_eq!(value["theme"], "dark");
    }

    #[test]
    fn apply_merges_maps_per_key() {
        let mut snapshot = PersistedSnapshot::default();
        snapshot.flags.insert("expandAll".into(), true);
        snapshot.node_type.disabled.insert(NodeType::Parameters, false);

        let mut state = ApplicationState::default();
        state.flags.insert("sizewarning".into(), true);
        snapshot.apply_to(&mut state);

        assert_eq!(state.flags.len(), 2);
        assert!(!state.is_type_disabled(NodeType::Parameters));
        assert_eq!(state.node_type.disabled.len(), NodeType::ALL.len());
    }

    #[test]
    fn unknown_active_pipeline_is_ignored() {
        let snapshot = PersistedSnapshot {
            pipeline: PersistedPipeline {
                active: Some("deleted".into()),
            },
            ..PersistedSnapshot::default()
        };
        let mut state = ApplicationState::default();
        state.pipeline.ids = vec!["__default__".into()];
        state.pipeline.active = Some("__default__".into());
        snapshot.apply_to(&mut state);

        assert_eq!(state.pipeline.active.as_deref(), Some("__default__"));
    }

    #[test]
    fn partial_json_leaves_missing_fields_unset() {
        let snapshot = PersistedSnapshot::from_json(r#"{"theme": "light"}"#).unwrap();
        assert_eq!(snapshot.theme, Some(Theme::Light));
        assert!(snapshot.text_labels.is_none());
        assert!(snapshot.layer.visible.is_none());
    }

    #[test]
    fn unknown_node_types_are_skipped() {
        let snapshot = PersistedSnapshot::from_json(
            r#"{"nodeType": {"disabled": {"parameters": false, "pipelineModule": true}}, "theme": "light"}"#,
        )
        .unwrap();

        assert_eq!(snapshot.theme, Some(Theme::Light));
        assert_eq!(snapshot.node_type.disabled.len(), 1);
        assert_eq!(snapshot.node_type.disabled.get(&NodeType::Parameters), Some(&false));
    }
}
