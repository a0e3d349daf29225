//! TOML-based application configuration.
//!
//! Stores tunables for:
//! - Alarm behavior (snooze interval, snooze limit, defaults for new alarms)
//! - Shake detection (sensor polling rate, debounce, threshold override)
//! - Vibration fallback pattern
//!
//! Configuration is stored at `~/.config/wakeup/config.toml`.

use std::path::{Path, PathBuf};

use chrono::Duration;
use serde::{Deserialize, Serialize};

use super::data_dir;
use crate::alarm::{Difficulty, TriggerType};
use crate::error::ConfigError;
use crate::notify::VibrationPattern;

/// Alarm scheduling configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AlarmConfig {
    #[serde(default = "default_snooze_interval_min")]
    pub snooze_interval_min: u32,
    #[serde(default = "default_max_snooze_count")]
    pub max_snooze_count: u32,
    #[serde(default)]
    pub default_difficulty: Difficulty,
    #[serde(default)]
    pub default_trigger_type: TriggerType,
}

/// Shake detection configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ShakeSettings {
    /// Requested accelerometer polling interval.
    #[serde(default = "default_update_interval_ms")]
    pub update_interval_ms: u64,
    /// Debounce between two accepted shakes.
    #[serde(default = "default_shake_interval_ms")]
    pub shake_interval_ms: u64,
    /// User override of the difficulty preset threshold. Clamped to the
    /// preset's range when applied.
    #[serde(default)]
    pub threshold_override: Option<f64>,
    /// Rolling window used for intensity and pattern.
    #[serde(default = "default_window_secs")]
    pub window_secs: u64,
}

/// Vibration fallback used when the alarm sound cannot play.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VibrationConfig {
    #[serde(default = "default_vibration_on_ms")]
    pub on_ms: u64,
    #[serde(default = "default_vibration_off_ms")]
    pub off_ms: u64,
}

/// Application configuration.
///
/// Serialized to/from TOML at `~/.config/wakeup/config.toml`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub alarm: AlarmConfig,
    #[serde(default)]
    pub shake: ShakeSettings,
    #[serde(default)]
    pub vibration: VibrationConfig,
}

// Default functions
fn default_snooze_interval_min() -> u32 {
    5
}
fn default_max_snooze_count() -> u32 {
    3
}
fn default_update_interval_ms() -> u64 {
    100
}
fn default_shake_interval_ms() -> u64 {
    500
}
fn default_window_secs() -> u64 {
    10
}
fn default_vibration_on_ms() -> u64 {
    1000
}
fn default_vibration_off_ms() -> u64 {
    500
}

impl Default for AlarmConfig {
    fn default() -> Self {
        Self {
            snooze_interval_min: default_snooze_interval_min(),
            max_snooze_count: default_max_snooze_count(),
            default_difficulty: Difficulty::default(),
            default_trigger_type: TriggerType::default(),
        }
    }
}

impl Default for ShakeSettings {
    fn default() -> Self {
        Self {
            update_interval_ms: default_update_interval_ms(),
            shake_interval_ms: default_shake_interval_ms(),
            threshold_override: None,
            window_secs: default_window_secs(),
        }
    }
}

impl Default for VibrationConfig {
    fn default() -> Self {
        Self {
            on_ms: default_vibration_on_ms(),
            off_ms: default_vibration_off_ms(),
        }
    }
}

impl AlarmConfig {
    pub fn snooze_interval(&self) -> Duration {
        Duration::minutes(self.snooze_interval_min as i64)
    }
}

impl VibrationConfig {
    pub fn pattern(&self) -> VibrationPattern {
        VibrationPattern::new(self.on_ms, self.off_ms)
    }
}

impl Config {
    fn get_json_value_by_path<'a>(
        root: &'a serde_json::Value,
        key: &str,
    ) -> Option<&'a serde_json::Value> {
        if key.is_empty() {
            return None;
        }

        let mut current = root;
        for part in key.split('.') {
            current = current.get(part)?;
        }
        Some(current)
    }

    fn set_json_value_by_path(
        root: &mut serde_json::Value,
        key: &str,
        value: &str,
    ) -> Result<(), ConfigError> {
        let unknown = || ConfigError::UnknownKey(key.to_string());
        let parse_failed = |what: &str| ConfigError::ParseFailed(format!("cannot parse '{value}' as {what}"));

        let mut parts = key.split('.').peekable();
        if parts.peek().is_none() {
            return Err(unknown());
        }

        let mut current = root;
        while let Some(part) = parts.next() {
            let is_leaf = parts.peek().is_none();
            if is_leaf {
                let obj = current.as_object_mut().ok_or_else(unknown)?;
                let existing = obj.get(part).ok_or_else(unknown)?;

                let new_value = match existing {
                    serde_json::Value::Bool(_) => serde_json::Value::Bool(
                        value.parse::<bool>().map_err(|_| parse_failed("bool"))?,
                    ),
                    // Optional fields serialize as null; "none" clears them.
                    serde_json::Value::Number(_) | serde_json::Value::Null => match value {
                        "none" | "null" => serde_json::Value::Null,
                        _ => parse_number(value).ok_or_else(|| parse_failed("number"))?,
                    },
                    serde_json::Value::Object(_) | serde_json::Value::Array(_) => {
                        serde_json::from_str(value).map_err(|e| ConfigError::ParseFailed(e.to_string()))?
                    }
                    _ => serde_json::Value::String(value.into()),
                };

                obj.insert(part.to_string(), new_value);
                return Ok(());
            }

            current = current.get_mut(part).ok_or_else(unknown)?;
        }

        Err(unknown())
    }

    fn path() -> Result<PathBuf, ConfigError> {
        let dir = data_dir().map_err(|e| ConfigError::LoadFailed {
            path: PathBuf::from("config.toml"),
            message: e.to_string(),
        })?;
        Ok(dir.join("config.toml"))
    }

    /// Load from the data directory, writing defaults when absent.
    ///
    /// # Errors
    ///
    /// Returns an error if the config file exists but cannot be parsed,
    /// or if the default config cannot be written to disk.
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from(&Self::path()?)
    }

    /// Load from an explicit path, writing defaults when absent.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        match std::fs::read_to_string(path) {
            Ok(content) => toml::from_str(&content).map_err(|e| ConfigError::LoadFailed {
                path: path.to_path_buf(),
                message: e.to_string(),
            }),
            Err(_) => {
                let cfg = Self::default();
                cfg.save_to(path)?;
                Ok(cfg)
            }
        }
    }

    /// Persist to the data directory.
    pub fn save(&self) -> Result<(), ConfigError> {
        self.save_to(&Self::path()?)
    }

    /// Persist to an explicit path.
    pub fn save_to(&self, path: &Path) -> Result<(), ConfigError> {
        let save_failed = |message: String| ConfigError::SaveFailed {
            path: path.to_path_buf(),
            message,
        };
        let content = toml::to_string_pretty(self).map_err(|e| save_failed(e.to_string()))?;
        std::fs::write(path, content).map_err(|e| save_failed(e.to_string()))?;
        Ok(())
    }

    /// Get a config value as string by dot-separated key.
    pub fn get(&self, key: &str) -> Option<String> {
        let json = serde_json::to_value(self).ok()?;
        let val = Self::get_json_value_by_path(&json, key)?;
        match val {
            serde_json::Value::String(s) => Some(s.clone()),
            other => Some(other.to_string()),
        }
    }

    /// Set a config value by key without saving. Returns error if the key is
    /// unknown or the value does not fit the field.
    pub fn set(&mut self, key: &str, value: &str) -> Result<(), ConfigError> {
        let mut json =
            serde_json::to_value(&*self).map_err(|e| ConfigError::ParseFailed(e.to_string()))?;
        Self::set_json_value_by_path(&mut json, key, value)?;
        *self = serde_json::from_value(json).map_err(|e| ConfigError::ParseFailed(e.to_string()))?;
        Ok(())
    }

    /// Load from disk, returning default on error.
    /// This is a convenience method that never fails.
    pub fn load_or_default() -> Self {
        Self::load().unwrap_or_else(|e| {
            tracing::warn!("using default configuration: {e}");
            Self::default()
        })
    }
}

fn parse_number(value: &str) -> Option<serde_json::Value> {
    if let Ok(n) = value.parse::<u64>() {
        Some(serde_json::Value::Number(n.into()))
    } else {
        value
            .parse::<f64>()
            .ok()
            .and_then(serde_json::Number::from_f64)
            .map(serde_json::Value::Number)
    }
}
