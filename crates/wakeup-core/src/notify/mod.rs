//! Routing of core events to the UI and audio collaborators.
//!
//! The scheduler and shake monitor only append [`Event`]s to their outboxes.
//! Whoever drives them drains the outbox and hands the batch to
//! [`dispatch`], which fans it out to an [`AlarmListener`] and an
//! [`AlarmAudio`].

mod audio;

pub use audio::{AlarmAudio, AudioState, NullSound, SoundOutput, VibrationPattern};

use crate::alarm::{Difficulty, TriggerType};
use crate::events::Event;

/// Payload shown on the trigger screen.
#[derive(Debug, Clone, PartialEq)]
pub struct TriggerInfo {
    pub alarm_id: String,
    pub trigger_type: TriggerType,
    pub difficulty: Difficulty,
}

/// UI-side subscriber. Every hook defaults to a no-op.
pub trait AlarmListener {
    fn on_triggered(&mut self, _info: &TriggerInfo) {}

    fn on_snoozed(&mut self, _snooze_count: u32, _penalty_amount: f64) {}

    fn on_completed(&mut self, _alarm_id: &str) {}

    fn on_shake_progress(&mut self, _count: u32, _intensity: f64) {}

    fn on_shake_complete(&mut self) {}
}

/// Listener that ignores everything.
#[derive(Debug, Default)]
pub struct NoopListener;

impl AlarmListener for NoopListener {}

/// Fan a batch of events out to the collaborators.
pub fn dispatch<L, S>(events: &[Event], listener: &mut L, audio: &mut AlarmAudio<S>)
where
    L: AlarmListener + ?Sized,
    S: SoundOutput,
{
    for event in events {
        match event {
            Event::AlarmTriggered {
                alarm_id,
                trigger_type,
                difficulty,
                ..
            } => listener.on_triggered(&TriggerInfo {
                alarm_id: alarm_id.clone(),
                trigger_type: *trigger_type,
                difficulty: *difficulty,
            }),
            Event::SoundRequested { sound_id, .. } => audio.request_play_alarm_sound(sound_id),
            Event::SoundStopRequested { .. } => audio.request_stop_alarm_sound(),
            Event::AlarmSnoozed {
                snooze_count,
                penalty_amount,
                ..
            } => listener.on_snoozed(*snooze_count, *penalty_amount),
            Event::AlarmCompleted { alarm_id, .. } => listener.on_completed(alarm_id),
            Event::ShakeProgress {
                count, intensity, ..
            } => listener.on_shake_progress(*count, *intensity),
            Event::ShakeCompleted { .. } => listener.on_shake_complete(),
            Event::AlarmScheduled { .. } | Event::AlarmCancelled { .. } => {}
        }
    }
}
