use std::collections::BTreeMap;

use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

use crate::alarm::TriggerType;

/// All persisted daily records keyed by calendar day. A `BTreeMap` keeps
/// them in chronological order, which the streak and trend scans rely on.
pub type StatsMap = BTreeMap<NaiveDate, DailyStat>;

/// Outcome of one calendar day.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailyStat {
    pub date: NaiveDate,
    /// `None` until the day has an outcome.
    #[serde(default)]
    pub wake_up_success: Option<bool>,
    #[serde(default)]
    pub snooze_count: u32,
    #[serde(default)]
    pub penalty_amount: f64,
    #[serde(default)]
    pub trigger_time: Option<NaiveDateTime>,
    #[serde(default)]
    pub complete_time: Option<NaiveDateTime>,
    #[serde(default)]
    pub trigger_type: TriggerType,
}

impl DailyStat {
    /// Placeholder for a day with no record.
    pub fn empty(date: NaiveDate) -> Self {
        Self {
            date,
            wake_up_success: None,
            snooze_count: 0,
            penalty_amount: 0.0,
            trigger_time: None,
            complete_time: None,
            trigger_type: TriggerType::Shake,
        }
    }

    /// Record created when the alarm first rings on `date`.
    pub fn triggered(date: NaiveDate, at: NaiveDateTime, trigger_type: TriggerType) -> Self {
        Self {
            wake_up_success: Some(false),
            trigger_time: Some(at),
            trigger_type,
            ..Self::empty(date)
        }
    }

    pub fn has_outcome(&self) -> bool {
        self.wake_up_success.is_some()
    }

    /// Woke up on the first ring.
    pub fn is_streak_day(&self) -> bool {
        self.wake_up_success == Some(true) && self.snooze_count == 0
    }

    /// Count one snooze and add its cost. The amount never decreases.
    pub fn record_snooze(&mut self, penalty: f64) {
        self.snooze_count += 1;
        self.penalty_amount += penalty.max(0.0);
    }

    pub fn record_success(&mut self, at: NaiveDateTime) {
        self.wake_up_success = Some(true);
        self.complete_time = Some(at);
    }
}
