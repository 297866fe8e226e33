//! Statically supplied initial data.
//!
//! These are the values an embedding application passes in at startup. Every
//! preference is optional: an unset field lets a persisted preference (or the
//! default) through, a set field always wins.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use super::{EdgeRecord, NodeRecord, Theme, VisibleState};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PipelineRecord {
    pub id: String,
    pub name: String,
}

impl PipelineRecord {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TagRecord {
    pub id: String,
    pub name: String,
}

/// Pipeline graph data as loaded from the backend or a static file.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PipelineData {
    pub nodes: Vec<NodeRecord>,
    pub edges: Vec<EdgeRecord>,
    pub pipelines: Vec<PipelineRecord>,
    pub main_pipeline: Option<String>,
    pub selected_pipeline: Option<String>,
    pub tags: Vec<TagRecord>,
    pub layers: Vec<String>,
}

impl PipelineData {
    /// Parse pipeline data from JSON.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }
}

/// Partial override of [`VisibleState`].
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct VisibleOverrides {
    pub graph: Option<bool>,
    pub label_btn: Option<bool>,
    pub layer_btn: Option<bool>,
    pub export_btn: Option<bool>,
    pub pretty_name_btn: Option<bool>,
    pub sidebar: Option<bool>,
    pub mini_map: Option<bool>,
    pub code: Option<bool>,
}

impl VisibleOverrides {
    pub(crate) fn apply(&self, visible: &mut VisibleState) {
        let pairs = [
            (self.graph, &mut visible.graph),
            (self.label_btn, &mut visible.label_btn),
            (self.layer_btn, &mut visible.layer_btn),
            (self.export_btn, &mut visible.export_btn),
            (self.pretty_name_btn, &mut visible.pretty_name_btn),
            (self.sidebar, &mut visible.sidebar),
            (self.mini_map, &mut visible.mini_map),
            (self.code, &mut visible.code),
        ];
        for (value, slot) in pairs {
            if let Some(value) = value {
                *slot = value;
            }
        }
    }
}

/// Everything supplied by the embedder at startup.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct InitialProps {
    pub data: Option<PipelineData>,
    pub theme: Option<Theme>,
    pub text_labels: Option<bool>,
    pub pretty_name: Option<bool>,
    pub visible: VisibleOverrides,
    pub flags: IndexMap<String, bool>,
}

impl InitialProps {
    /// Parse initial props from JSON.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// Props carrying only pipeline data.
    pub fn with_data(data: PipelineData) -> Self {
        Self {
            data: Some(data),
            ..Self::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn overrides_touch_only_set_fields() {
        let mut visible = VisibleState::default();
        let overrides = VisibleOverrides {
            sidebar: Some(false),
            code: Some(true),
            ..VisibleOverrides::default()
        };
        overrides.apply(&mut visible);

        assert!(!visible.sidebar);
        assert!(visible.code);
        assert!(visible.graph);
        assert!(visible.mini_map);
    }

    #[test]
    fn props_parse_with_missing_fields() {
        let props = InitialProps::from_json(r#"{"theme": "light"}"#).unwrap();
        assert_eq!(props.theme, Some(Theme::Light));
        assert!(props.data.is_none());
        assert!(props.text_labels.is_none());
    }

    #[test]
    fn pipeline_data_parses_camel_case() {
        let data = PipelineData::from_json(
            r#"{
                "nodes": [{"id": "a", "name": "a", "type": "task", "modularPipelines": ["ingest"]}],
                "edges": [],
                "pipelines": [{"id": "__default__", "name": "Default"}],
                "mainPipeline": "__default__"
            }"#,
        )
        .unwrap();
        assert_eq!(data.nodes[0].modular_pipelines, vec!["ingest".to_string()]);
        assert_eq!(data.main_pipeline.as_deref(), Some("__default__"));
    }
}
