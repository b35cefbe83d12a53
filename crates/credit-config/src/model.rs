use serde::{Deserialize, Serialize};
use std::{
    path::{Path, PathBuf},
    str::FromStr,
};

use crate::ConfigError;

pub const HOME_DIR_NAME: &str = ".credit_tracker";

/// Tracker preferences. Unknown or missing fields fall back to defaults.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default = "Config::default_forecast_horizon_years")]
    pub forecast_horizon_years: i32,
    #[serde(default = "Config::default_projection_days")]
    pub projection_days: u32,
    #[serde(default = "Config::default_history_days")]
    pub history_days: u32,
    /// How far past the wall clock a fresh simulation clock starts.
    #[serde(default = "Config::default_clock_offset_years")]
    pub clock_offset_years: u32,
    #[serde(default = "Config::default_ui_color_enabled")]
    pub ui_color_enabled: bool,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    /// Optional directory for the ledger document. Defaults to the tracker home.
    pub data_dir: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            forecast_horizon_years: Self::default_forecast_horizon_years(),
            projection_days: Self::default_projection_days(),
            history_days: Self::default_history_days(),
            clock_offset_years: Self::default_clock_offset_years(),
            ui_color_enabled: Self::default_ui_color_enabled(),
            data_dir: None,
        }
    }
}

impl Config {
    pub fn default_forecast_horizon_years() -> i32 {
        5
    }

    pub fn default_projection_days() -> u32 {
        60
    }

    pub fn default_history_days() -> u32 {
        30
    }

    pub fn default_clock_offset_years() -> u32 {
        500
    }

    pub fn default_ui_color_enabled() -> bool {
        true
    }

    /// `~/.credit_tracker`, or `./.credit_tracker` without a home directory.
    pub fn default_home() -> PathBuf {
        dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(HOME_DIR_NAME)
    }

    /// Where the ledger document lives: `home_override` first, then
    /// `data_dir`, then `fallback_home`.
    pub fn resolve_data_dir(&self, home_override: Option<&Path>, fallback_home: &Path) -> PathBuf {
        if let Some(home) = home_override {
            return home.to_path_buf();
        }
        if let Some(path) = &self.data_dir {
            return path.clone();
        }
        fallback_home.to_path_buf()
    }

    /// Every setting as `(key, rendered value)`, in declaration order.
    pub fn settings(&self) -> Vec<(&'static str, String)> {
        vec![
            ("forecast_horizon_years", self.forecast_horizon_years.to_string()),
            ("projection_days", self.projection_days.to_string()),
            ("history_days", self.history_days.to_string()),
            ("clock_offset_years", self.clock_offset_years.to_string()),
            ("ui_color_enabled", self.ui_color_enabled.to_string()),
            (
                "data_dir",
                self.data_dir
                    .as_ref()
                    .map(|dir| dir.display().to_string())
                    .unwrap_or_default(),
            ),
        ]
    }

    /// Sets one setting from its text form. An empty `data_dir` clears it.
    pub fn set(&mut self, key: &str, value: &str) -> Result<(), ConfigError> {
        let value = value.trim();
        match key {
            "forecast_horizon_years" => {
                let years: i32 = parse_value(key, value)?;
                if years <= 0 {
                    return Err(invalid(key, "must be at least one year"));
                }
                self.forecast_horizon_years = years;
            }
            "projection_days" => self.projection_days = parse_value(key, value)?,
            "history_days" => self.history_days = parse_value(key, value)?,
            "clock_offset_years" => self.clock_offset_years = parse_value(key, value)?,
            "ui_color_enabled" => self.ui_color_enabled = parse_value(key, value)?,
            "data_dir" => {
                self.data_dir = (!value.is_empty()).then(|| PathBuf::from(value));
            }
            other => return Err(ConfigError::UnknownSetting(other.to_string())),
        }
        Ok(())
    }
}

fn parse_value<T: FromStr>(key: &str, value: &str) -> Result<T, ConfigError> {
    value
        .parse()
        .map_err(|_| invalid(key, &format!("`{}` cannot be parsed", value)))
}

fn invalid(key: &str, reason: &str) -> ConfigError {
    ConfigError::InvalidValue {
        key: key.to_string(),
        reason: reason.to_string(),
    }
}
