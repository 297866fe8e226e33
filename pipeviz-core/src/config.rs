//! Sync configuration.
//!
//! All fields have defaults, so an empty JSON object is a valid config.

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// What to do with a layout result that was superseded by a newer request
/// before it finished.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StaleResultPolicy {
    /// Drop results whose sequence number is lower than the latest request.
    #[default]
    Discard,
    /// Apply every result in completion order, stale or not.
    Accept,
}

/// Spacing used by the layered layout engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct LayoutConfig {
    /// Horizontal gap between nodes of the same rank.
    pub node_spacing: f64,
    /// Vertical gap between ranks.
    pub rank_spacing: f64,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            node_spacing: 20.0,
            rank_spacing: 60.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SyncConfig {
    /// Key the persisted snapshot is stored under.
    pub storage_key: String,
    pub stale_results: StaleResultPolicy,
    /// Write a snapshot of the initial state when the session starts.
    pub persist_on_start: bool,
    pub layout: LayoutConfig,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            storage_key: "PipelineViz".to_string(),
            stale_results: StaleResultPolicy::default(),
            persist_on_start: true,
            layout: LayoutConfig::default(),
        }
    }
}

impl SyncConfig {
    /// Parse and validate a config from JSON.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.storage_key.trim().is_empty() {
            return Err(ConfigError::Invalid("storage key must not be empty".into()));
        }
        for (name, value) in [
            ("nodeSpacing", self.layout.node_spacing),
            ("rankSpacing", self.layout.rank_spacing),
        ] {
            if !value.is_finite() || value < 0.0 {
                return Err(ConfigError::Invalid(format!(
                    "{name} must be a non-negative number, got {value}"
                )));
            }
        }
        Ok(())
    }
}
