//! Application configuration

use serde::{Deserialize, Serialize};

use crate::Error;

/// Settings of one application run
///
/// Every field has a default, so a JSON document only needs the fields it
/// changes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Application name, part of storage keys
    pub app_name: String,
    /// Prefix of generated view ids
    pub id_prefix: String,
    pub storage_prefix: String,
    pub storage_suffix: String,
    /// Theme swatch applied by the default theme engine
    pub default_swatch: String,
    /// Delay between layout polls of widgets waiting to be measured
    pub layout_poll_interval_ms: u64,
    pub layout_poll_max_attempts: u32,
    /// Length of CSS transitions such as a dialog fading out
    pub transition_ms: u64,
    /// Hold time that turns a touch into a long press
    pub taphold_ms: u64,
    /// Menu width of a split view in landscape, in percent
    pub split_landscape_ratio: u32,
    /// Height reserved for header and footer toolbars
    pub toolbar_height: f64,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            app_name: "orbit".to_string(),
            id_prefix: "m_".to_string(),
            storage_prefix: "#m#".to_string(),
            storage_suffix: "_".to_string(),
            default_swatch: "c".to_string(),
            layout_poll_interval_ms: 100,
            layout_poll_max_attempts: 20,
            transition_ms: 300,
            taphold_ms: 750,
            split_landscape_ratio: 30,
            toolbar_height: 44.0,
        }
    }
}

impl AppConfig {
    /// Parse and validate a JSON configuration
    pub fn from_json(json: &str) -> Result<Self, Error> {
        let config: AppConfig =
            serde_json::from_str(json).map_err(|e| Error::Config(e.to_string()))?;
        let problems = config.validate();
        if !problems.is_empty() {
            return Err(Error::Config(problems.join("; ")));
        }
        Ok(config)
    }

    /// Problems with the configured values
    pub fn validate(&self) -> Vec<String> {
        let mut problems = Vec::new();
        if self.id_prefix.is_empty() {
            problems.push("id_prefix must not be empty".to_string());
        }
        if self.layout_poll_max_attempts == 0 {
            problems.push("layout_poll_max_attempts must be > 0".to_string());
        }
        if self.split_landscape_ratio > 100 {
            problems.push("split_landscape_ratio must be at most 100".to_string());
        }
        if self.toolbar_height < 0.0 {
            problems.push("toolbar_height must not be negative".to_string());
        }
        problems
    }

    /// Namespaced storage key, e.g. `#m#orbit_dashboard`
    pub fn storage_key(&self, name: &str) -> String {
        format!(
            "{}{}{}{}",
            self.storage_prefix, self.app_name, self.storage_suffix, name
        )
    }
}
