use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

/// Cost-growth policy applied per snooze.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PenaltyType {
    /// Every snooze costs `base_amount`.
    Fixed,
    /// `base_amount * snooze_count * progressive_rate`.
    #[default]
    Progressive,
    /// `base_amount * 2^(snooze_count - 1)`.
    Exponential,
    /// Any stored policy name we do not recognise: `base_amount * snooze_count`.
    #[serde(other)]
    Linear,
}

impl PenaltyType {
    pub fn as_str(self) -> &'static str {
        match self {
            PenaltyType::Fixed => "fixed",
            PenaltyType::Progressive => "progressive",
            PenaltyType::Exponential => "exponential",
            PenaltyType::Linear => "linear",
        }
    }
}

impl fmt::Display for PenaltyType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PenaltyType {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "fixed" => Ok(PenaltyType::Fixed),
            "progressive" => Ok(PenaltyType::Progressive),
            "exponential" => Ok(PenaltyType::Exponential),
            "linear" => Ok(PenaltyType::Linear),
            other => Err(ValidationError::invalid_value(
                "penalty_type",
                format!("expected fixed, progressive or exponential, got '{other}'"),
            )),
        }
    }
}

/// Editable fields of [`PenaltySettings`] with their editor bounds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PenaltyField {
    BaseAmount,
    ProgressiveRate,
    MaxPenalty,
    MaxSnoozes,
}

impl PenaltyField {
    /// Inclusive `(min, max)` the settings editor clamps to.
    pub fn bounds(self) -> (f64, f64) {
        match self {
            PenaltyField::BaseAmount => (1.0, 100.0),
            PenaltyField::ProgressiveRate => (1.0, 5.0),
            PenaltyField::MaxPenalty => (10.0, 500.0),
            PenaltyField::MaxSnoozes => (1.0, 10.0),
        }
    }
}

impl FromStr for PenaltyField {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "base_amount" => Ok(PenaltyField::BaseAmount),
            "progressive_rate" => Ok(PenaltyField::ProgressiveRate),
            "max_penalty" => Ok(PenaltyField::MaxPenalty),
            "max_snoozes" => Ok(PenaltyField::MaxSnoozes),
            other => Err(ValidationError::invalid_value(other, "not an adjustable penalty field")),
        }
    }
}

/// User-configurable penalty parameters. Read fresh on every computation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PenaltySettings {
    pub base_amount: f64,
    pub penalty_type: PenaltyType,
    pub progressive_rate: f64,
    pub max_penalty: f64,
    pub max_snoozes: u32,
    pub enabled: bool,
}

impl Default for PenaltySettings {
    fn default() -> Self {
        Self {
            base_amount: 5.0,
            penalty_type: PenaltyType::Progressive,
            progressive_rate: 1.5,
            max_penalty: 50.0,
            max_snoozes: 3,
            enabled: true,
        }
    }
}

impl PenaltySettings {
    /// Reject non-positive or non-finite parameters.
    pub fn validate(&self) -> Result<(), ValidationError> {
        let positive = |field: &str, value: f64| {
            if value.is_finite() && value > 0.0 {
                Ok(())
            } else {
                Err(ValidationError::invalid_value(
                    field,
                    format!("must be a positive number, got {value}"),
                ))
            }
        };
        positive("base_amount", self.base_amount)?;
        positive("progressive_rate", self.progressive_rate)?;
        positive("max_penalty", self.max_penalty)?;
        if self.max_snoozes == 0 {
            return Err(ValidationError::invalid_value("max_snoozes", "must be at least 1"));
        }
        Ok(())
    }

    /// Step a field by `delta`, clamping to the editor bounds.
    /// Returns the value that was stored.
    pub fn adjust(&mut self, field: PenaltyField, delta: f64) -> f64 {
        let (min, max) = field.bounds();
        match field {
            PenaltyField::BaseAmount => {
                self.base_amount = (self.base_amount + delta).clamp(min, max);
                self.base_amount
            }
            PenaltyField::ProgressiveRate => {
                self.progressive_rate = (self.progressive_rate + delta).clamp(min, max);
                self.progressive_rate
            }
            PenaltyField::MaxPenalty => {
                self.max_penalty = (self.max_penalty + delta).clamp(min, max);
                self.max_penalty
            }
            PenaltyField::MaxSnoozes => {
                let next = (self.max_snoozes as f64 + delta).round().clamp(min, max);
                self.max_snoozes = next as u32;
                next
            }
        }
    }
}
