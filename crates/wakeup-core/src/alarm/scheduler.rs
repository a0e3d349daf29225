//! Alarm scheduler.
//!
//! A wall-clock state machine that owns at most one pending timer. It does
//! not spawn tasks or sleep: the caller drives it with `tick()` and drains
//! the emitted events with `drain_events()`.
//!
//! ## State Transitions
//!
//! ```text
//! Idle -> Armed -> Triggered -> Snoozed -> Triggered -> ...
//!                            -> Completed (re-armed for the next day)
//! any non-Idle --cancel--> Idle
//! ```
//!
//! ## Restoring after a restart
//!
//! The persisted alarm carries no explicit state, so `restore_schedule`
//! reconstructs it:
//! - a snooze whose re-ring is pending resumes as `Snoozed`, or triggers
//!   immediately if that re-ring was due earlier today;
//! - if today's occurrence passed after the alarm was last touched, the
//!   ring was missed and the alarm triggers immediately;
//! - otherwise the alarm is armed for its next occurrence.

use std::fmt;
use std::sync::Arc;

use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

use super::model::{Alarm, AlarmOptions, AlarmPatch, AlarmTime};
use crate::clock::Clock;
use crate::error::{CoreError, Result};
use crate::events::{ArmReason, Event};
use crate::penalty::calculate_penalty;
use crate::stats::{DailyStat, StatsMap};
use crate::storage::{AlarmConfig, AlarmStore};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SchedulerState {
    /// No armed alarm.
    Idle,
    /// Timer running toward the daily alarm time.
    Armed,
    /// Ringing, waiting for snooze or completion.
    Triggered,
    /// Timer running toward the snooze re-ring.
    Snoozed,
    /// Dismissed for today; timer running toward tomorrow.
    Completed,
}

impl SchedulerState {
    pub fn as_str(self) -> &'static str {
        match self {
            SchedulerState::Idle => "idle",
            SchedulerState::Armed => "armed",
            SchedulerState::Triggered => "triggered",
            SchedulerState::Snoozed => "snoozed",
            SchedulerState::Completed => "completed",
        }
    }
}

impl fmt::Display for SchedulerState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The single outstanding timer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PendingTimer {
    pub id: u64,
    pub fires_at: NaiveDateTime,
    pub reason: ArmReason,
}

/// Answer to `get_alarm_status`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AlarmStatus {
    pub has_alarm: bool,
    pub is_active: bool,
    /// Configured `HH:MM`.
    pub next_alarm_time: Option<String>,
    /// When the pending timer (or the next daily occurrence) fires.
    pub next_fire_at: Option<NaiveDateTime>,
    pub time_until_alarm_ms: Option<i64>,
    pub state: SchedulerState,
    pub alarm: Option<Alarm>,
}

/// Outcome of a successful snooze.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SnoozeResult {
    pub snooze_count: u32,
    pub penalty_amount: f64,
    /// Penalty accumulated today, including this snooze.
    pub total_penalty: f64,
    pub next_alarm_time: NaiveDateTime,
}

enum Resume {
    Fire(ArmReason),
    Arm(NaiveDateTime, ArmReason),
}

pub struct AlarmScheduler {
    store: Arc<dyn AlarmStore>,
    clock: Arc<dyn Clock>,
    config: AlarmConfig,
    state: SchedulerState,
    timer: Option<PendingTimer>,
    next_timer_id: u64,
    alarm: Option<Alarm>,
    outbox: Vec<Event>,
}

impl AlarmScheduler {
    pub fn new(store: Arc<dyn AlarmStore>, clock: Arc<dyn Clock>, config: AlarmConfig) -> Self {
        Self {
            store,
            clock,
            config,
            state: SchedulerState::Idle,
            timer: None,
            next_timer_id: 1,
            alarm: None,
            outbox: Vec::new(),
        }
    }

    // ── Queries ──────────────────────────────────────────────────────

    pub fn state(&self) -> SchedulerState {
        self.state
    }

    pub fn alarm(&self) -> Option<&Alarm> {
        self.alarm.as_ref()
    }

    pub fn config(&self) -> &AlarmConfig {
        &self.config
    }

    /// Number of pending timers; never more than one.
    pub fn outstanding_timers(&self) -> usize {
        usize::from(self.timer.is_some())
    }

    pub fn pending_timer(&self) -> Option<&PendingTimer> {
        self.timer.as_ref()
    }

    pub fn pending_fire_time(&self) -> Option<NaiveDateTime> {
        self.timer.as_ref().map(|t| t.fires_at)
    }

    /// Status from the scheduler's in-memory view. Call `restore_schedule`
    /// first in a fresh process.
    pub fn get_alarm_status(&self) -> AlarmStatus {
        let Some(alarm) = &self.alarm else {
            return AlarmStatus {
                has_alarm: false,
                is_active: false,
                next_alarm_time: None,
                next_fire_at: None,
                time_until_alarm_ms: None,
                state: self.state,
                alarm: None,
            };
        };

        let now = self.clock.now();
        let next_fire_at = match (&self.timer, alarm.is_active) {
            (Some(timer), _) => Some(timer.fires_at),
            (None, true) if self.state != SchedulerState::Triggered => {
                Some(alarm.time.next_occurrence(now))
            }
            _ => None,
        };

        AlarmStatus {
            has_alarm: true,
            is_active: alarm.is_active,
            next_alarm_time: Some(alarm.time.to_string()),
            next_fire_at,
            time_until_alarm_ms: next_fire_at.map(|at| (at - now).num_milliseconds().max(0)),
            state: self.state,
            alarm: Some(alarm.clone()),
        }
    }

    pub fn drain_events(&mut self) -> Vec<Event> {
        std::mem::take(&mut self.outbox)
    }

    // ── Commands ─────────────────────────────────────────────────────

    /// Replace the alarm with a new one at `time` and arm it.
    pub async fn create_alarm(&mut self, time: &str, options: AlarmOptions) -> Result<Alarm> {
        let time = AlarmTime::parse(time)?;
        let now = self.clock.now();

        let options = AlarmOptions {
            difficulty: options.difficulty.or(Some(self.config.default_difficulty)),
            trigger_type: options
                .trigger_type
                .or(Some(self.config.default_trigger_type)),
            ..options
        };
        let alarm = Alarm::new(time, options, now);

        self.store.save_alarm(&alarm).await?;
        if self.state == SchedulerState::Triggered {
            self.outbox.push(Event::SoundStopRequested { at: now });
        }
        self.clear_timer();
        tracing::info!("alarm {} created for {}", alarm.id, alarm.time);

        self.alarm = Some(alarm.clone());
        self.state = SchedulerState::Idle;
        self.schedule(&alarm);
        Ok(alarm)
    }

    /// Arm the daily timer for `alarm`. Inactive alarms are left alone.
    pub fn schedule(&mut self, alarm: &Alarm) -> Option<NaiveDateTime> {
        if !alarm.is_active {
            tracing::info!("alarm {} inactive, not scheduling", alarm.id);
            return None;
        }
        let now = self.clock.now();
        let fires_at = alarm.time.next_occurrence(now);
        self.arm(&alarm.id, fires_at, ArmReason::Daily, now);
        self.state = SchedulerState::Armed;
        Some(fires_at)
    }

    /// Ring now. Valid while a timer is pending.
    pub async fn trigger(&mut self) -> Result<()> {
        match self.state {
            SchedulerState::Armed | SchedulerState::Snoozed | SchedulerState::Completed => {
                let reason = self
                    .timer
                    .as_ref()
                    .map_or(ArmReason::Daily, |t| t.reason);
                self.fire(reason).await
            }
            state => Err(invalid_state("trigger", state)),
        }
    }

    /// Fire the pending timer if it is due. Returns whether it fired.
    pub async fn tick(&mut self) -> Result<bool> {
        let Some(timer) = &self.timer else {
            return Ok(false);
        };
        if timer.fires_at > self.clock.now() {
            return Ok(false);
        }
        let reason = timer.reason;
        self.fire(reason).await?;
        Ok(true)
    }

    pub async fn handle_snooze(&mut self, alarm_id: &str) -> Result<SnoozeResult> {
        if self.state != SchedulerState::Triggered {
            return Err(invalid_state("snooze", self.state));
        }
        let alarm = self.matching_alarm(alarm_id)?;

        let max = self.config.max_snooze_count;
        if alarm.snooze_count >= max {
            tracing::warn!("snooze refused: {} of {max} used", alarm.snooze_count);
            return Err(CoreError::SnoozeLimitExceeded {
                snooze_count: alarm.snooze_count,
                max,
            });
        }

        let now = self.clock.now();
        let today = now.date();
        let snooze_count = alarm.snooze_count + 1;
        let settings = self.store.get_penalty_settings().await?.unwrap_or_default();
        let penalty_amount = if settings.enabled {
            calculate_penalty(snooze_count, &settings)
        } else {
            0.0
        };

        let mut stats = self.store.get_stats().await?;
        let before = stats.clone();
        let stat = today_entry(&mut stats, today, &alarm, now);
        stat.record_snooze(penalty_amount);
        let total_penalty = stat.penalty_amount;
        self.store.save_stats(&stats).await?;

        let patch = AlarmPatch {
            snooze_count: Some(snooze_count),
            last_snooze_time: Some(Some(now)),
            ..AlarmPatch::default()
        }
        .at(now);
        let alarm = self.update_alarm_or_revert(&patch, &before).await?;

        let next_alarm_time = now + self.config.snooze_interval();
        self.arm(&alarm.id, next_alarm_time, ArmReason::Snooze, now);
        self.state = SchedulerState::Snoozed;
        self.alarm = Some(alarm.clone());

        tracing::info!(
            "snooze {snooze_count}/{max}: penalty {penalty_amount:.2}, rings again at {}",
            next_alarm_time.format("%H:%M:%S")
        );
        self.outbox.push(Event::SoundStopRequested { at: now });
        self.outbox.push(Event::AlarmSnoozed {
            alarm_id: alarm.id,
            snooze_count,
            penalty_amount,
            total_penalty,
            next_alarm_time,
            at: now,
        });

        Ok(SnoozeResult {
            snooze_count,
            penalty_amount,
            total_penalty,
            next_alarm_time,
        })
    }

    /// Record a successful wake-up and re-arm for tomorrow.
    pub async fn complete_alarm(&mut self, alarm_id: &str) -> Result<Alarm> {
        if self.state != SchedulerState::Triggered {
            return Err(invalid_state("complete", self.state));
        }
        let alarm = self.matching_alarm(alarm_id)?;
        let now = self.clock.now();

        let mut stats = self.store.get_stats().await?;
        let before = stats.clone();
        today_entry(&mut stats, now.date(), &alarm, now).record_success(now);
        self.store.save_stats(&stats).await?;

        let patch = AlarmPatch {
            snooze_count: Some(0),
            last_snooze_time: Some(None),
            ..AlarmPatch::default()
        }
        .at(now);
        let alarm = self.update_alarm_or_revert(&patch, &before).await?;
        self.alarm = Some(alarm.clone());

        self.clear_timer();
        self.outbox.push(Event::SoundStopRequested { at: now });
        self.outbox.push(Event::AlarmCompleted {
            alarm_id: alarm.id.clone(),
            at: now,
        });
        tracing::info!("alarm {} completed", alarm.id);

        if alarm.is_active {
            let fires_at = alarm.time.next_occurrence(now);
            self.arm(&alarm.id, fires_at, ArmReason::Daily, now);
        }
        self.state = SchedulerState::Completed;
        Ok(alarm)
    }

    /// Disarm and mark the alarm inactive. Calling it again is a no-op.
    pub async fn cancel(&mut self) -> Result<()> {
        let previous_state = self.state;
        let stored_active = self.load_alarm().await?.is_some_and(|a| a.is_active);
        if previous_state == SchedulerState::Idle && !stored_active && self.timer.is_none() {
            return Ok(());
        }

        let now = self.clock.now();
        if stored_active {
            let alarm = self
                .store
                .update_alarm(&AlarmPatch::active(false).at(now))
                .await?;
            self.alarm = Some(alarm);
        }

        self.clear_timer();
        if previous_state == SchedulerState::Triggered {
            self.outbox.push(Event::SoundStopRequested { at: now });
        }
        self.state = SchedulerState::Idle;
        self.outbox.push(Event::AlarmCancelled {
            previous_state,
            at: now,
        });
        tracing::info!("alarm cancelled (was {previous_state})");
        Ok(())
    }

    /// Enable (re-arm from the stored time) or disable (cancel).
    pub async fn toggle(&mut self, is_active: bool) -> Result<Alarm> {
        if self.load_alarm().await?.is_none() {
            return Err(CoreError::NotFound("no alarm configured".into()));
        }
        if !is_active {
            self.cancel().await?;
            return self
                .alarm
                .clone()
                .ok_or_else(|| CoreError::NotFound("no alarm configured".into()));
        }

        let now = self.clock.now();
        let alarm = self
            .store
            .update_alarm(&AlarmPatch::active(true).at(now))
            .await?;
        self.alarm = Some(alarm.clone());
        if self.state != SchedulerState::Triggered {
            self.clear_timer();
            self.schedule(&alarm);
        }
        Ok(alarm)
    }

    /// Move the alarm to a new time of day and re-arm it.
    pub async fn update_alarm_time(&mut self, new_time: &str) -> Result<Alarm> {
        let time = AlarmTime::parse(new_time)?;
        if self.load_alarm().await?.is_none() {
            return Err(CoreError::NotFound("no alarm to update".into()));
        }

        let now = self.clock.now();
        let patch = AlarmPatch {
            time: Some(time),
            is_active: Some(true),
            ..AlarmPatch::default()
        }
        .at(now);
        let alarm = self.store.update_alarm(&patch).await?;

        if self.state == SchedulerState::Triggered {
            self.outbox.push(Event::SoundStopRequested { at: now });
        }
        self.clear_timer();
        self.state = SchedulerState::Idle;
        self.alarm = Some(alarm.clone());
        self.schedule(&alarm);
        tracing::info!("alarm moved to {}", alarm.time);
        Ok(alarm)
    }

    /// Rebuild the in-memory state from the persisted alarm. Safe to call
    /// repeatedly: any pending timer is replaced, never duplicated. Storage
    /// failures degrade to `Idle` with a warning.
    pub async fn restore_schedule(&mut self) -> SchedulerState {
        if self.state == SchedulerState::Triggered {
            tracing::debug!("restore skipped, alarm is ringing");
            return self.state;
        }
        self.clear_timer();

        let alarm = match self.store.get_alarm().await {
            Ok(alarm) => alarm,
            Err(e) => {
                tracing::warn!("could not restore alarm: {e}");
                self.state = SchedulerState::Idle;
                return self.state;
            }
        };
        self.alarm = alarm.clone();
        self.state = SchedulerState::Idle;

        let Some(alarm) = alarm.filter(|a| a.is_active) else {
            return self.state;
        };

        let now = self.clock.now();
        match self.resume_point(&alarm, now) {
            Resume::Arm(fires_at, reason) => {
                self.arm(&alarm.id, fires_at, reason, now);
                self.state = match reason {
                    ArmReason::Daily => SchedulerState::Armed,
                    ArmReason::Snooze => SchedulerState::Snoozed,
                };
            }
            Resume::Fire(reason) => {
                tracing::info!("alarm {} was due while not running", alarm.id);
                if let Err(e) = self.fire(reason).await {
                    tracing::warn!("restored alarm failed to trigger: {e}");
                }
            }
        }
        self.state
    }

    /// Drop the timer and silence any ringing. Repeated calls do nothing.
    pub fn shutdown(&mut self) {
        self.clear_timer();
        if self.state == SchedulerState::Triggered {
            self.outbox.push(Event::SoundStopRequested {
                at: self.clock.now(),
            });
        }
        self.state = SchedulerState::Idle;
    }

    // ── Internal ─────────────────────────────────────────────────────

    fn resume_point(&self, alarm: &Alarm, now: NaiveDateTime) -> Resume {
        let today = now.date();
        if alarm.snooze_count > 0 {
            if let Some(snoozed_at) = alarm.last_snooze_time {
                let re_ring = snoozed_at + self.config.snooze_interval();
                // A re-ring due today still counts when the snooze itself
                // was taken before midnight.
                let current = snoozed_at >= alarm.updated_at
                    && (re_ring.date() == today || re_ring > now);
                if current {
                    return if re_ring > now {
                        Resume::Arm(re_ring, ArmReason::Snooze)
                    } else {
                        Resume::Fire(ArmReason::Snooze)
                    };
                }
            }
        }

        let occurrence = alarm.time.occurrence_on(now);
        if alarm.updated_at < occurrence && occurrence <= now {
            return Resume::Fire(ArmReason::Daily);
        }
        Resume::Arm(alarm.time.next_occurrence(now), ArmReason::Daily)
    }

    /// Transition to `Triggered`: clear the timer, request sound, make sure
    /// today's record exists.
    async fn fire(&mut self, reason: ArmReason) -> Result<()> {
        let mut alarm = match self.alarm.clone() {
            Some(alarm) => alarm,
            None => self
                .store
                .get_alarm()
                .await?
                .ok_or_else(|| CoreError::NotFound("no alarm to trigger".into()))?,
        };
        let now = self.clock.now();
        let today = now.date();

        self.clear_timer();
        self.state = SchedulerState::Triggered;

        // Yesterday's snoozes do not count against today. The stored record
        // is corrected by the next snooze or completion.
        if reason == ArmReason::Daily && is_stale_snooze(&alarm, today) {
            tracing::debug!("resetting {} snoozes from an earlier day", alarm.snooze_count);
            alarm.snooze_count = 0;
            alarm.last_snooze_time = None;
        }
        self.alarm = Some(alarm.clone());

        tracing::info!("alarm {} triggered at {}", alarm.id, now.format("%H:%M:%S"));
        self.outbox.push(Event::SoundRequested {
            sound_id: alarm.sound_id.clone(),
            at: now,
        });
        self.outbox.push(Event::AlarmTriggered {
            alarm_id: alarm.id.clone(),
            trigger_type: alarm.trigger_type,
            difficulty: alarm.difficulty,
            at: now,
        });

        if let Err(e) = self.ensure_today_stat(&alarm, now).await {
            tracing::warn!("could not record trigger for {today}: {e}");
        }
        Ok(())
    }

    /// Apply `patch` to the stored alarm. If that fails, put the stats map
    /// back to `before` so the two records never disagree.
    async fn update_alarm_or_revert(
        &self,
        patch: &AlarmPatch,
        before: &StatsMap,
    ) -> Result<Alarm> {
        match self.store.update_alarm(patch).await {
            Ok(alarm) => Ok(alarm),
            Err(e) => {
                if let Err(revert) = self.store.save_stats(before).await {
                    tracing::error!("alarm update failed ({e}) and stats revert failed: {revert}");
                }
                Err(e.into())
            }
        }
    }

    async fn ensure_today_stat(&self, alarm: &Alarm, now: NaiveDateTime) -> Result<()> {
        let mut stats = self.store.get_stats().await?;
        if !stats.contains_key(&now.date()) {
            today_entry(&mut stats, now.date(), alarm, now);
            self.store.save_stats(&stats).await?;
        }
        Ok(())
    }

    fn arm(
        &mut self,
        alarm_id: &str,
        fires_at: NaiveDateTime,
        reason: ArmReason,
        now: NaiveDateTime,
    ) {
        let id = self.next_timer_id;
        self.next_timer_id += 1;
        if let Some(previous) = self.timer.replace(PendingTimer {
            id,
            fires_at,
            reason,
        }) {
            tracing::debug!("timer {} replaced by {id}", previous.id);
        }

        let delay_ms = (fires_at - now).num_milliseconds();
        tracing::info!(
            "alarm {alarm_id} armed for {fires_at} ({})",
            super::model::format_duration(delay_ms)
        );
        self.outbox.push(Event::AlarmScheduled {
            alarm_id: alarm_id.to_string(),
            fires_at,
            delay_ms,
            reason,
        });
    }

    fn clear_timer(&mut self) {
        if let Some(timer) = self.timer.take() {
            tracing::debug!("timer {} cleared", timer.id);
        }
    }

    async fn load_alarm(&mut self) -> Result<Option<&Alarm>> {
        if self.alarm.is_none() {
            self.alarm = self.store.get_alarm().await?;
        }
        Ok(self.alarm.as_ref())
    }

    fn matching_alarm(&self, alarm_id: &str) -> Result<Alarm> {
        match &self.alarm {
            Some(alarm) if alarm.id == alarm_id => Ok(alarm.clone()),
            Some(alarm) => Err(CoreError::NotFound(format!(
                "alarm {alarm_id} (current alarm is {})",
                alarm.id
            ))),
            None => Err(CoreError::NotFound(format!("alarm {alarm_id}"))),
        }
    }
}

fn invalid_state(operation: &'static str, state: SchedulerState) -> CoreError {
    CoreError::InvalidState {
        operation,
        state: state.to_string(),
    }
}

/// Snoozes left over from an earlier day.
fn is_stale_snooze(alarm: &Alarm, today: NaiveDate) -> bool {
    alarm.snooze_count > 0
        && !matches!(alarm.last_snooze_time, Some(at) if at.date() >= today)
}

/// Today's record, created with `wake_up_success = false` if missing.
fn today_entry<'a>(
    stats: &'a mut StatsMap,
    today: NaiveDate,
    alarm: &Alarm,
    now: NaiveDateTime,
) -> &'a mut DailyStat {
    stats
        .entry(today)
        .or_insert_with(|| DailyStat::triggered(today, now, alarm.trigger_type))
}
