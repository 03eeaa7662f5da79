//! Keyprint configuration.
//!
//! Covers host-side concerns only (logging, output). Scoring constants are
//! fixed in their modules and are not configurable.

use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::warn;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct KeyprintConfig {
    /// Logging
    pub log: LogConfig,
    /// Output formatting
    pub output: OutputConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LogConfig {
    /// Default filter when RUST_LOG is unset
    pub level: String,
    /// Emit JSON lines instead of human-readable logs
    pub json: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Pretty-print JSON output
    pub pretty: bool,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: "warn".to_string(),
            json: false,
        }
    }
}

impl KeyprintConfig {
    /// Load from a JSON file if present; otherwise return defaults
    pub fn load(path: &Path) -> Self {
        if !path.exists() {
            return Self::default();
        }
        let parsed = std::fs::read_to_string(path)
            .map_err(|e| e.to_string())
            .and_then(|data| serde_json::from_str::<KeyprintConfig>(&data).map_err(|e| e.to_string()));
        match parsed {
            Ok(config) => config,
            Err(error) => {
                warn!(path = %path.display(), %error, "unusable config file, using defaults");
                Self::default()
            }
        }
    }
}
