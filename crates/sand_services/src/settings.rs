//! Settings management
//!
//! JSON on disk. Every section and field is optional; missing values fall
//! back to the defaults below.

use sand_core::config::{Brush, SimulationConfig};
use sand_core::time::DEFAULT_TICK_PERIOD_MS;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("failed to read settings from {path}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to write settings to {path}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid settings in {path}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("failed to encode settings")]
    Encode(#[from] serde_json::Error),
}

/// Application settings
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub window: WindowSettings,
    pub simulation: SimulationSettings,
    pub brush: Brush,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WindowSettings {
    pub width: u32,
    pub height: u32,
    pub title: String,
}

impl Default for WindowSettings {
    fn default() -> Self {
        Self {
            width: 960,
            height: 720,
            title: "Falling Sand".to_string(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationSettings {
    pub grid_width: u32,
    pub grid_height: u32,
    pub tick_period_ms: u32,
}

impl Default for SimulationSettings {
    fn default() -> Self {
        Self {
            grid_width: 480,
            grid_height: 360,
            tick_period_ms: DEFAULT_TICK_PERIOD_MS,
        }
    }
}

impl Settings {
    pub fn load(path: &Path) -> Result<Self, SettingsError> {
        let json = std::fs::read_to_string(path).map_err(|source| SettingsError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let settings = serde_json::from_str(&json).map_err(|source| SettingsError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        tracing::info!(path = %path.display(), "settings loaded");
        Ok(settings)
    }

    /// Load from `path` when given, defaults otherwise.
    pub fn load_or_default(path: Option<&Path>) -> Result<Self, SettingsError> {
        match path {
            Some(path) => Self::load(path),
            None => {
                tracing::info!("no settings file given, using defaults");
                Ok(Self::default())
            }
        }
    }

    /// Write pretty-printed JSON.
    pub fn save(&self, path: &Path) -> Result<(), SettingsError> {
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json).map_err(|source| SettingsError::Write {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Runtime configuration with out-of-range values clamped.
    pub fn simulation_config(&self) -> SimulationConfig {
        let mut config = SimulationConfig {
            tick_period_ms: DEFAULT_TICK_PERIOD_MS,
            brush: self.brush,
        };
        config.set_tick_period_ms(self.simulation.tick_period_ms);
        config.brush.set_radius(self.brush.radius);
        config
    }
}
