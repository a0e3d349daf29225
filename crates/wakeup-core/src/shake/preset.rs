use serde::{Deserialize, Serialize};

use crate::alarm::Difficulty;

/// Allowed detection threshold range for one difficulty.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ThresholdPreset {
    pub min: f64,
    pub max: f64,
    pub default: f64,
}

/// How readily a threshold registers shakes, relative to its preset range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SensitivityLevel {
    VerySensitive,
    Sensitive,
    Standard,
    Insensitive,
    VeryInsensitive,
}

impl ThresholdPreset {
    pub fn for_difficulty(difficulty: Difficulty) -> Self {
        match difficulty {
            Difficulty::Easy => Self {
                min: 8.0,
                max: 15.0,
                default: 12.0,
            },
            Difficulty::Normal => Self {
                min: 12.0,
                max: 20.0,
                default: 15.0,
            },
            Difficulty::Hard => Self {
                min: 15.0,
                max: 25.0,
                default: 18.0,
            },
        }
    }

    /// Clamp a requested threshold into range. Non-finite input yields the
    /// preset default.
    pub fn clamp(&self, requested: f64) -> f64 {
        if requested.is_finite() {
            requested.clamp(self.min, self.max)
        } else {
            self.default
        }
    }

    /// Threshold to use given an optional user override.
    pub fn resolve(&self, override_value: Option<f64>) -> f64 {
        override_value.map_or(self.default, |v| self.clamp(v))
    }

    pub fn sensitivity_level(&self, threshold: f64) -> SensitivityLevel {
        let ratio = (self.clamp(threshold) - self.min) / (self.max - self.min);
        if ratio < 0.3 {
            SensitivityLevel::VerySensitive
        } else if ratio < 0.5 {
            SensitivityLevel::Sensitive
        } else if ratio < 0.7 {
            SensitivityLevel::Standard
        } else if ratio < 0.9 {
            SensitivityLevel::Insensitive
        } else {
            SensitivityLevel::VeryInsensitive
        }
    }
}
