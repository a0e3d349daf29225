//! Alarm record and its value types.

use std::fmt;
use std::str::FromStr;

use chrono::{Duration, NaiveDateTime, NaiveTime, Timelike};
use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

/// Local time of day an alarm rings at, recurring daily.
///
/// Serialized as the `HH:MM` string it was parsed from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct AlarmTime {
    hour: u8,
    minute: u8,
}

impl AlarmTime {
    pub fn new(hour: u8, minute: u8) -> Result<Self, ValidationError> {
        if hour > 23 || minute > 59 {
            return Err(ValidationError::InvalidTime(format!("{hour}:{minute:02}")));
        }
        Ok(Self { hour, minute })
    }

    /// Parse `HH:MM`. A single-digit hour (`7:05`) is accepted; minutes
    /// always need two digits.
    pub fn parse(input: &str) -> Result<Self, ValidationError> {
        let invalid = || ValidationError::InvalidTime(input.to_string());
        let (h, m) = input.split_once(':').ok_or_else(invalid)?;
        let digits = |s: &str| !s.is_empty() && s.bytes().all(|b| b.is_ascii_digit());
        if !digits(h) || h.len() > 2 || !digits(m) || m.len() != 2 {
            return Err(invalid());
        }
        let hour: u8 = h.parse().map_err(|_| invalid())?;
        let minute: u8 = m.parse().map_err(|_| invalid())?;
        Self::new(hour, minute).map_err(|_| invalid())
    }

    pub fn hour(&self) -> u8 {
        self.hour
    }

    pub fn minute(&self) -> u8 {
        self.minute
    }

    pub fn from_datetime(at: NaiveDateTime) -> Self {
        Self {
            hour: at.hour() as u8,
            minute: at.minute() as u8,
        }
    }

    pub fn as_naive_time(&self) -> NaiveTime {
        NaiveTime::from_hms_opt(self.hour as u32, self.minute as u32, 0)
            .unwrap_or(NaiveTime::MIN)
    }

    /// Today's occurrence of this time, which may already be in the past.
    pub fn occurrence_on(&self, now: NaiveDateTime) -> NaiveDateTime {
        now.date().and_time(self.as_naive_time())
    }

    /// Next strictly-future occurrence. A time equal to `now` (or earlier
    /// today) rolls to tomorrow.
    pub fn next_occurrence(&self, now: NaiveDateTime) -> NaiveDateTime {
        let today = self.occurrence_on(now);
        if today <= now {
            today + Duration::days(1)
        } else {
            today
        }
    }

    /// Delay until the next occurrence; always in `(0, 24h]`.
    pub fn time_until(&self, now: NaiveDateTime) -> Duration {
        self.next_occurrence(now) - now
    }
}

impl fmt::Display for AlarmTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02}:{:02}", self.hour, self.minute)
    }
}

impl FromStr for AlarmTime {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl Serialize for AlarmTime {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for AlarmTime {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        AlarmTime::parse(&raw).map_err(serde::de::Error::custom)
    }
}

/// Dismissal mechanic required to silence the alarm.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TriggerType {
    #[default]
    Shake,
    /// Accepted but not implemented; behaves like `Shake`.
    Gps,
    /// Accepted but not implemented; behaves like `Shake`.
    Both,
}

impl TriggerType {
    /// The mechanic actually enforced.
    pub fn effective(self) -> TriggerType {
        TriggerType::Shake
    }
}

impl FromStr for TriggerType {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "shake" => Ok(TriggerType::Shake),
            "gps" => Ok(TriggerType::Gps),
            "both" => Ok(TriggerType::Both),
            other => Err(ValidationError::invalid_value(
                "trigger_type",
                format!("expected shake, gps or both, got '{other}'"),
            )),
        }
    }
}

/// How hard the dismissal challenge is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Difficulty {
    Easy,
    #[default]
    Normal,
    Hard,
}

impl Difficulty {
    /// Shakes needed to dismiss the alarm.
    pub fn required_shakes(self) -> u32 {
        match self {
            Difficulty::Easy => 10,
            Difficulty::Normal => 20,
            Difficulty::Hard => 30,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Difficulty::Easy => "easy",
            Difficulty::Normal => "normal",
            Difficulty::Hard => "hard",
        }
    }
}

impl fmt::Display for Difficulty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Difficulty {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "easy" => Ok(Difficulty::Easy),
            "normal" => Ok(Difficulty::Normal),
            "hard" => Ok(Difficulty::Hard),
            other => Err(ValidationError::invalid_value(
                "difficulty",
                format!("expected easy, normal or hard, got '{other}'"),
            )),
        }
    }
}

fn default_label() -> String {
    "Wake up".to_string()
}

fn default_sound_id() -> String {
    "default".to_string()
}

/// The single persisted alarm.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Alarm {
    pub id: String,
    pub time: AlarmTime,
    pub is_active: bool,
    #[serde(default)]
    pub trigger_type: TriggerType,
    #[serde(default)]
    pub difficulty: Difficulty,
    /// Snoozes used in the current wake cycle.
    #[serde(default)]
    pub snooze_count: u32,
    #[serde(default)]
    pub last_snooze_time: Option<NaiveDateTime>,
    #[serde(default = "default_label")]
    pub label: String,
    #[serde(default = "default_sound_id")]
    pub sound_id: String,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

impl Alarm {
    /// Build a fresh, active alarm.
    pub fn new(time: AlarmTime, options: AlarmOptions, now: NaiveDateTime) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            time,
            is_active: true,
            trigger_type: options.trigger_type.unwrap_or_default(),
            difficulty: options.difficulty.unwrap_or_default(),
            snooze_count: 0,
            last_snooze_time: None,
            label: options.label.unwrap_or_else(default_label),
            sound_id: options.sound_id.unwrap_or_else(default_sound_id),
            created_at: now,
            updated_at: now,
        }
    }

    /// Apply a partial update and bump `updated_at` to the patch's stamp,
    /// or `now` when the patch carries none.
    pub fn apply(&mut self, patch: &AlarmPatch, now: NaiveDateTime) {
        if let Some(time) = patch.time {
            self.time = time;
        }
        if let Some(active) = patch.is_active {
            self.is_active = active;
        }
        if let Some(trigger_type) = patch.trigger_type {
            self.trigger_type = trigger_type;
        }
        if let Some(difficulty) = patch.difficulty {
            self.difficulty = difficulty;
        }
        if let Some(count) = patch.snooze_count {
            self.snooze_count = count;
        }
        if let Some(last) = patch.last_snooze_time {
            self.last_snooze_time = last;
        }
        if let Some(label) = &patch.label {
            self.label = label.clone();
        }
        self.updated_at = patch.updated_at.unwrap_or(now);
    }
}

/// Optional attributes accepted by `create_alarm`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AlarmOptions {
    pub trigger_type: Option<TriggerType>,
    pub difficulty: Option<Difficulty>,
    pub label: Option<String>,
    pub sound_id: Option<String>,
}

impl AlarmOptions {
    pub fn difficulty(mut self, difficulty: Difficulty) -> Self {
        self.difficulty = Some(difficulty);
        self
    }

    pub fn trigger_type(mut self, trigger_type: TriggerType) -> Self {
        self.trigger_type = Some(trigger_type);
        self
    }

    pub fn label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }
}

/// Partial update for `AlarmStore::update_alarm`. `None` leaves a field
/// untouched; `last_snooze_time: Some(None)` clears it.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AlarmPatch {
    pub time: Option<AlarmTime>,
    pub is_active: Option<bool>,
    pub trigger_type: Option<TriggerType>,
    pub difficulty: Option<Difficulty>,
    pub snooze_count: Option<u32>,
    pub last_snooze_time: Option<Option<NaiveDateTime>>,
    pub label: Option<String>,
    pub updated_at: Option<NaiveDateTime>,
}

impl AlarmPatch {
    pub fn active(is_active: bool) -> Self {
        Self {
            is_active: Some(is_active),
            ..Self::default()
        }
    }

    /// Stamp the patch with the caller's clock.
    pub fn at(mut self, now: NaiveDateTime) -> Self {
        self.updated_at = Some(now);
        self
    }
}

/// Render a millisecond delay as `"7h 5m"` / `"42s"`.
pub fn format_duration(ms: i64) -> String {
    let secs = ms.max(0) / 1000;
    let (h, m, s) = (secs / 3600, (secs % 3600) / 60, secs % 60);
    match (h, m) {
        (0, 0) => format!("{s}s"),
        (0, _) => format!("{m}m {s}s"),
        _ => format!("{h}h {m}m"),
    }
}
