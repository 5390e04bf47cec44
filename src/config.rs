use anyhow::{Context, Result};
use rand::seq::IndexedRandom;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs::{self, File};
use std::path::{Path, PathBuf};

use crate::core::oscillator::Waveform;
use crate::core::view::{DEFAULT_ZOOM_X, DEFAULT_ZOOM_Y};

const CONFIG_DIR_NAME: &str = "jamline";
const CONFIG_FILE_NAME: &str = "session.json";

/// Colors handed out to users who did not pick one.
pub const USER_PALETTE: [&str; 8] = [
    "#e8590c", "#1c7ed6", "#2f9e44", "#ae3ec9", "#f08c00", "#0ca678", "#e03131", "#5c7cfa",
];

/// Session settings supplied from outside the engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// World-time origin in epoch ms; session start when absent.
    pub base_time: Option<i64>,
    pub zoom_x: f64,
    pub zoom_y: f64,
    pub user_color: Option<String>,
    pub waveform: Waveform,
    pub volume_db: f32,
    pub frame_rate: u32,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            base_time: None,
            zoom_x: DEFAULT_ZOOM_X,
            zoom_y: DEFAULT_ZOOM_Y,
            user_color: None,
            waveform: Waveform::Sine,
            volume_db: 0.0,
            frame_rate: 60,
        }
    }
}

impl SessionConfig {
    pub fn config_dir() -> Result<PathBuf> {
        let mut path = dirs::config_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not find config directory"))?;
        path.push(CONFIG_DIR_NAME);
        Ok(path)
    }

    pub fn default_path() -> Result<PathBuf> {
        Ok(Self::config_dir()?.join(CONFIG_FILE_NAME))
    }

    pub fn load(path: &Path) -> Result<Self> {
        let file = File::open(path)
            .with_context(|| format!("Failed to open config {}", path.display()))?;
        let config = serde_json::from_reader(file)
            .with_context(|| format!("Failed to parse config {}", path.display()))?;
        Ok(config)
    }

    /// Load from the user config directory; any problem yields defaults.
    pub fn load_or_default() -> Self {
        let path = match Self::default_path() {
            Ok(path) => path,
            Err(e) => {
                log::warn!("{:#}, using default settings", e);
                return Self::default();
            },
        };
        if !path.exists() {
            return Self::default();
        }
        match Self::load(&path) {
            Ok(config) => config,
            Err(e) => {
                log::warn!("{:#}, using default settings", e);
                Self::default()
            },
        }
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(dir) = path.parent() {
            fs::create_dir_all(dir).context("Failed to create config directory")?;
        }
        let file = File::create(path).context("Failed to create config file")?;
        serde_json::to_writer_pretty(file, self).context("Failed to write config")?;
        Ok(())
    }

    /// The configured color, or a random palette entry.
    pub fn resolve_user_color(&self) -> String {
        self.user_color
            .clone()
            .filter(|c| !c.trim().is_empty())
            .unwrap_or_else(random_user_color)
    }
}

pub fn random_user_color() -> String {
    USER_PALETTE
        .choose(&mut rand::rng())
        .copied()
        .unwrap_or("#ccc")
        .to_string()
}

/// View parameters as loosely-typed host attributes (`base-time`, `zoom-x`, ...).
#[derive(Debug, Clone, PartialEq)]
pub struct ViewConfig {
    pub base_time: Option<i64>,
    pub zoom_x: f64,
    pub zoom_y: f64,
    pub user_color: Option<String>,
    pub waveform: Waveform,
}

impl ViewConfig {
    /// Missing, non-numeric or non-positive zoom values fall back to defaults.
    pub fn from_attributes(attrs: &HashMap<String, String>) -> Self {
        let get = |key: &str| attrs.get(key).map(|s| s.trim()).filter(|s| !s.is_empty());

        Self {
            base_time: get("base-time").and_then(|s| s.parse::<i64>().ok()),
            zoom_x: parse_scale(get("zoom-x"), DEFAULT_ZOOM_X),
            zoom_y: parse_scale(get("zoom-y"), DEFAULT_ZOOM_Y),
            user_color: get("user-color").map(str::to_string),
            waveform: Waveform::from_tag_or_sine(get("waveform")),
        }
    }

    pub fn apply_to(&self, config: &mut SessionConfig) {
        if self.base_time.is_some() {
            config.base_time = self.base_time;
        }
        config.zoom_x = self.zoom_x;
        config.zoom_y = self.zoom_y;
        if self.user_color.is_some() {
            config.user_color = self.user_color.clone();
        }
        config.waveform = self.waveform;
    }
}

fn parse_scale(raw: Option<&str>, default: f64) -> f64 {
    raw.and_then(|s| s.parse::<f64>().ok())
        .filter(|v| v.is_finite() && *v > 0.0)
        .unwrap_or(default)
}
