use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use crate::alarm::{Difficulty, SchedulerState, TriggerType};
use crate::shake::ShakePattern;

/// Why a timer was armed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ArmReason {
    /// Next daily occurrence of the alarm time.
    Daily,
    /// Re-ring after a snooze.
    Snooze,
}

/// Every state change in the core produces an Event.
/// UI and audio collaborators drain them; the core never calls them directly.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Event {
    AlarmScheduled {
        alarm_id: String,
        fires_at: NaiveDateTime,
        delay_ms: i64,
        reason: ArmReason,
    },
    /// Alarm time reached; the trigger screen should be shown.
    AlarmTriggered {
        alarm_id: String,
        trigger_type: TriggerType,
        difficulty: Difficulty,
        at: NaiveDateTime,
    },
    /// Audio collaborator should start the alarm sound.
    SoundRequested {
        sound_id: String,
        at: NaiveDateTime,
    },
    /// Audio collaborator should silence sound and vibration.
    SoundStopRequested {
        at: NaiveDateTime,
    },
    AlarmSnoozed {
        alarm_id: String,
        snooze_count: u32,
        penalty_amount: f64,
        total_penalty: f64,
        next_alarm_time: NaiveDateTime,
        at: NaiveDateTime,
    },
    AlarmCompleted {
        alarm_id: String,
        at: NaiveDateTime,
    },
    AlarmCancelled {
        previous_state: SchedulerState,
        at: NaiveDateTime,
    },
    ShakeProgress {
        count: u32,
        required: u32,
        intensity: f64,
        pattern: ShakePattern,
    },
    ShakeCompleted {
        count: u32,
        intensity: f64,
    },
}
