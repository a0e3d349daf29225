//! End-to-end alarm lifecycle tests.
//!
//! Each "process" is a fresh `AlarmScheduler` over a shared store, the way
//! the CLI runs one scheduler per invocation.

use std::sync::Arc;

use chrono::{NaiveDate, NaiveDateTime};
use wakeup_core::alarm::{AlarmOptions, Difficulty, SchedulerState};
use wakeup_core::clock::ManualClock;
use wakeup_core::events::{ArmReason, Event};
use wakeup_core::storage::{AlarmConfig, AlarmStore, MemoryStore};
use wakeup_core::{AlarmScheduler, CoreError};

// ============================================================================
// Test Helpers
// ============================================================================

fn at(day: u32, h: u32, m: u32, s: u32) -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2024, 5, day)
        .unwrap()
        .and_hms_opt(h, m, s)
        .unwrap()
}

fn process(store: &Arc<MemoryStore>, now: NaiveDateTime) -> AlarmScheduler {
    AlarmScheduler::new(
        store.clone(),
        Arc::new(ManualClock::new(now)),
        AlarmConfig::default(),
    )
}

// ============================================================================
// Lifecycle
// ============================================================================

#[tokio::test]
async fn ring_snooze_ring_complete_across_restarts() {
    let store = Arc::new(MemoryStore::new());

    let mut setup = process(&store, at(10, 6, 0, 0));
    let alarm = setup
        .create_alarm("07:00", AlarmOptions::default())
        .await
        .unwrap();
    assert_eq!(setup.state(), SchedulerState::Armed);

    // Process started just after the ring time: missed ring fires at once.
    let mut ringing = process(&store, at(10, 7, 0, 1));
    assert_eq!(ringing.restore_schedule().await, SchedulerState::Triggered);
    let events = ringing.drain_events();
    assert!(events
        .iter()
        .any(|e| matches!(e, Event::SoundRequested { .. })));

    let snooze = ringing.handle_snooze(&alarm.id).await.unwrap();
    assert_eq!(snooze.snooze_count, 1);
    assert_eq!(snooze.penalty_amount, 7.5);
    assert_eq!(snooze.total_penalty, 7.5);
    assert_eq!(snooze.next_alarm_time, at(10, 7, 5, 1));
    assert_eq!(ringing.state(), SchedulerState::Snoozed);

    // Still inside the snooze window: resumes as Snoozed.
    let mut waiting = process(&store, at(10, 7, 3, 0));
    assert_eq!(waiting.restore_schedule().await, SchedulerState::Snoozed);
    assert_eq!(waiting.pending_fire_time(), Some(at(10, 7, 5, 1)));

    // Re-ring already due.
    let mut again = process(&store, at(10, 7, 6, 0));
    assert_eq!(again.restore_schedule().await, SchedulerState::Triggered);
    let completed = again.complete_alarm(&alarm.id).await.unwrap();
    assert_eq!(completed.snooze_count, 0);
    assert_eq!(completed.last_snooze_time, None);
    assert!(completed.is_active);
    assert_eq!(again.state(), SchedulerState::Completed);
    assert_eq!(again.pending_fire_time(), Some(at(11, 7, 0, 0)));

    let stats = store.get_stats().await.unwrap();
    let today = stats.get(&at(10, 0, 0, 0).date()).unwrap();
    assert_eq!(today.wake_up_success, Some(true));
    assert_eq!(today.snooze_count, 1);
    assert_eq!(today.penalty_amount, 7.5);
    assert_eq!(today.trigger_time, Some(at(10, 7, 0, 1)));
    assert_eq!(today.complete_time, Some(at(10, 7, 6, 0)));

    // Later the same day nothing is due.
    let mut later = process(&store, at(10, 9, 0, 0));
    assert_eq!(later.restore_schedule().await, SchedulerState::Armed);
    assert_eq!(later.pending_fire_time(), Some(at(11, 7, 0, 0)));
}

#[tokio::test]
async fn in_process_tick_drives_the_same_flow() {
    let store = Arc::new(MemoryStore::new());
    let clock = ManualClock::new(at(10, 6, 59, 0));
    let mut s = AlarmScheduler::new(
        store.clone(),
        Arc::new(clock.clone()),
        AlarmConfig::default(),
    );
    let alarm = s
        .create_alarm("07:00", AlarmOptions::default())
        .await
        .unwrap();

    assert!(!s.tick().await.unwrap());
    clock.set(at(10, 7, 0, 0));
    assert!(s.tick().await.unwrap());
    assert_eq!(s.state(), SchedulerState::Triggered);
    assert_eq!(s.outstanding_timers(), 0);

    s.handle_snooze(&alarm.id).await.unwrap();
    clock.set(at(10, 7, 4, 59));
    assert!(!s.tick().await.unwrap());
    clock.set(at(10, 7, 5, 0));
    assert!(s.tick().await.unwrap());

    let armed: Vec<ArmReason> = s
        .drain_events()
        .iter()
        .filter_map(|e| match e {
            Event::AlarmScheduled { reason, .. } => Some(*reason),
            _ => None,
        })
        .collect();
    assert_eq!(armed, vec![ArmReason::Daily, ArmReason::Snooze]);
}

#[tokio::test]
async fn repeated_restore_keeps_one_timer() {
    let store = Arc::new(MemoryStore::new());
    let mut setup = process(&store, at(10, 6, 0, 0));
    setup
        .create_alarm("07:00", AlarmOptions::default())
        .await
        .unwrap();

    let mut s = process(&store, at(10, 6, 30, 0));
    s.restore_schedule().await;
    s.restore_schedule().await;
    s.restore_schedule().await;
    assert_eq!(s.outstanding_timers(), 1);
    assert_eq!(s.pending_fire_time(), Some(at(10, 7, 0, 0)));
}

#[tokio::test]
async fn fourth_snooze_is_refused_without_touching_stats() {
    let store = Arc::new(MemoryStore::new());
    let clock = ManualClock::new(at(10, 6, 0, 0));
    let mut s = AlarmScheduler::new(
        store.clone(),
        Arc::new(clock.clone()),
        AlarmConfig::default(),
    );
    let alarm = s
        .create_alarm("07:00", AlarmOptions::default())
        .await
        .unwrap();

    clock.set(at(10, 7, 0, 0));
    s.tick().await.unwrap();
    let mut penalties = Vec::new();
    for _ in 0..3 {
        penalties.push(s.handle_snooze(&alarm.id).await.unwrap().penalty_amount);
        clock.advance(chrono::Duration::minutes(5));
        assert!(s.tick().await.unwrap());
    }
    assert_eq!(penalties, vec![7.5, 15.0, 22.5]);

    let before = store.get_stats().await.unwrap();
    let err = s.handle_snooze(&alarm.id).await.unwrap_err();
    assert!(matches!(
        err,
        CoreError::SnoozeLimitExceeded {
            snooze_count: 3,
            max: 3
        }
    ));
    assert_eq!(store.get_stats().await.unwrap(), before);
    assert_eq!(s.state(), SchedulerState::Triggered);

    let today = before.get(&at(10, 0, 0, 0).date()).unwrap();
    assert_eq!(today.snooze_count, 3);
    assert_eq!(today.penalty_amount, 45.0);
}

#[tokio::test]
async fn created_alarm_shows_in_status() {
    let store = Arc::new(MemoryStore::new());
    let mut s = process(&store, at(10, 22, 0, 0));
    s.create_alarm("07:30", AlarmOptions::default().difficulty(Difficulty::Hard))
        .await
        .unwrap();

    let mut fresh = process(&store, at(10, 22, 0, 0));
    assert!(!fresh.get_alarm_status().has_alarm);

    fresh.restore_schedule().await;
    let status = fresh.get_alarm_status();
    assert!(status.has_alarm);
    assert!(status.is_active);
    assert_eq!(status.next_alarm_time.as_deref(), Some("07:30"));
    assert_eq!(status.next_fire_at, Some(at(11, 7, 30, 0)));
    assert_eq!(status.time_until_alarm_ms, Some(9 * 3_600_000 + 30 * 60_000));
    assert_eq!(status.alarm.unwrap().difficulty, Difficulty::Hard);
}

#[tokio::test]
async fn cancelled_alarm_stays_idle_after_restart() {
    let store = Arc::new(MemoryStore::new());
    let mut s = process(&store, at(10, 6, 0, 0));
    s.create_alarm("07:00", AlarmOptions::default())
        .await
        .unwrap();
    s.cancel().await.unwrap();

    let mut next = process(&store, at(10, 7, 30, 0));
    assert_eq!(next.restore_schedule().await, SchedulerState::Idle);
    assert_eq!(next.outstanding_timers(), 0);
    assert!(store.get_stats().await.unwrap().is_empty());
}
