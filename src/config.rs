//! Timeline tuning parameters.
//!
//! Loaded once at startup from `config.json` in the platform config
//! directory. Every field is defaulted so a partial file is valid.

use std::path::{Path, PathBuf};

use chrono::Weekday;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::error::ConfigError;

pub const APP_NAME: &str = "TimelinePlanner";
const CONFIG_FILE: &str = "config.json";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TimelineConfig {
    /// Pixels per day in week granularity (room for weekday labels).
    pub week_day_width: f32,
    /// Pixels per day in month granularity.
    pub month_day_width: f32,
    /// Width of the resize grab zone on each edge of a bar.
    pub edge_margin: f32,
    /// Pointer travel below which a press/release counts as a click.
    pub drag_threshold: f32,
    /// How long a synthetic click is ignored after a drag ends.
    pub click_suppress_ms: u64,
    /// Span in days of an item created by clicking empty canvas.
    pub quick_create_days: i64,
    pub week_padding_days: i64,
    pub month_padding_days: i64,
    #[serde(with = "weekday_serde")]
    pub week_start: Weekday,
}

impl Default for TimelineConfig {
    fn default() -> Self {
        Self {
            week_day_width: 120.0,
            month_day_width: 40.0,
            edge_margin: 20.0,
            drag_threshold: 5.0,
            click_suppress_ms: 100,
            quick_create_days: 3,
            week_padding_days: 7,
            month_padding_days: 15,
            week_start: Weekday::Sun,
        }
    }
}

impl TimelineConfig {
    /// Read a config file. A missing file yields the defaults.
    pub fn from_path(path: &Path) -> Result<Self, ConfigError> {
        let json = match std::fs::read_to_string(path) {
            Ok(json) => json,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Self::default()),
            Err(source) => {
                return Err(ConfigError::Io {
                    path: path.to_path_buf(),
                    source,
                })
            }
        };
        serde_json::from_str(&json).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Load from the platform config dir, falling back to defaults on any error.
    pub fn load() -> Self {
        let path = config_path();
        match Self::from_path(&path) {
            Ok(config) => {
                info!(path = %path.display(), "loaded timeline config");
                config
            }
            Err(e) => {
                warn!(error = %e, "using default timeline config");
                Self::default()
            }
        }
    }
}

pub fn config_path() -> PathBuf {
    match directories::ProjectDirs::from("", "", APP_NAME) {
        Some(dirs) => dirs.config_dir().join(CONFIG_FILE),
        None => PathBuf::from(".").join(CONFIG_FILE),
    }
}

/// Weekdays as their English short names ("Sun", "Mon").
mod weekday_serde {
    use chrono::Weekday;
    use serde::{self, Deserialize, Deserializer, Serializer};

    pub fn serialize<S>(day: &Weekday, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&day.to_string())
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Weekday, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        s.parse::<Weekday>()
            .map_err(|_| serde::de::Error::custom(format!("invalid weekday '{}'", s)))
    }
}
