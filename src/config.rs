use crate::error::ConfigError;
use chrono::format::{Item, StrftimeItems};
use serde::Deserialize;
use std::path::{Path, PathBuf};

const DEFAULT_TIME_FORMAT: &str = "%H:%M";

/// Settings for a monitoring session. Every field has a default, so an empty
/// TOML file is a valid config.
#[derive(Clone, Debug, Deserialize, PartialEq)]
#[serde(default)]
pub struct MonitorConfig {
    pub chart: ChartConfig,
    pub storage: StorageConfig,
    /// chrono format of record time labels. Two logs rendering to the same
    /// label land in the same record.
    pub time_format: String,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        MonitorConfig {
            chart: ChartConfig::default(),
            storage: StorageConfig::default(),
            time_format: DEFAULT_TIME_FORMAT.to_string(),
        }
    }
}

#[derive(Clone, Debug, Deserialize, PartialEq)]
#[serde(default)]
pub struct ChartConfig {
    /// The label axis is padded to at least this many slots.
    pub min_slots: usize,
    /// Pixels per slot once the chart grows past `min_slots`.
    pub slot_width_px: u32,
    pub vitals_axis_max: f64,
    pub vitals_axis_step: f64,
    pub fluid_axis_max: f64,
    pub fluid_axis_step: f64,
    pub gas_axis_max: f64,
}

impl Default for ChartConfig {
    fn default() -> Self {
        ChartConfig {
            min_slots: 20,
            slot_width_px: 40,
            vitals_axis_max: 200.0,
            vitals_axis_step: 20.0,
            fluid_axis_max: 50.0,
            fluid_axis_step: 10.0,
            gas_axis_max: 5.0,
        }
    }
}

#[derive(Clone, Debug, Deserialize, PartialEq)]
#[serde(default)]
pub struct StorageConfig {
    pub data_dir: PathBuf,
    pub export_dir: PathBuf,
}

impl Default for StorageConfig {
    fn default() -> Self {
        StorageConfig {
            data_dir: PathBuf::from("."),
            export_dir: PathBuf::from("exports"),
        }
    }
}

impl MonitorConfig {
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let config = Self::from_toml_str(&contents)?;
        log::debug!("loaded config from {}", path.display());
        Ok(config)
    }

    pub fn from_toml_str(contents: &str) -> Result<Self, ConfigError> {
        let config: MonitorConfig = toml::from_str(contents)?;
        if !is_valid_time_format(&config.time_format) {
            return Err(ConfigError::TimeFormat(config.time_format));
        }
        Ok(config)
    }
}

/// Whether chrono can render `format` without failing.
pub fn is_valid_time_format(format: &str) -> bool {
    !StrftimeItems::new(format).any(|item| matches!(item, Item::Error))
}
