// TOML config adapter - Reads the `[timelapse]` table of a config file

use std::path::Path;

use serde::Deserialize;

use crate::config_initialization::SettingsOverlay;
use crate::error::{TimelapseError, TimelapseResult};

#[derive(Debug, Default, Deserialize)]
struct ConfigDocument {
    #[serde(default)]
    timelapse: Option<SettingsOverlay>,
}

/// TOML configuration adapter
pub struct TomlConfigAdapter;

impl TomlConfigAdapter {
    /// Read and parse a config file
    pub fn load(path: &Path) -> TimelapseResult<SettingsOverlay> {
        let content = std::fs::read_to_string(path).map_err(|e| TimelapseError::InvalidConfig {
            message: format!("failed to read {}: {}", path.display(), e),
        })?;
        Self::parse(&content).map_err(|e| match e {
            TimelapseError::InvalidConfig { message } => TimelapseError::InvalidConfig {
                message: format!("{}: {}", path.display(), message),
            },
            other => other,
        })
    }

    /// Parse config text; a file without a `[timelapse]` table is an empty layer
    pub fn parse(content: &str) -> TimelapseResult<SettingsOverlay> {
        let document: ConfigDocument =
            toml::from_str(content).map_err(|e| TimelapseError::InvalidConfig {
                message: format!("failed to parse TOML config: {}", e),
            })?;
        Ok(document.timelapse.unwrap_or_default())
    }
}
