//! A simulated week of mornings persisted through `SqliteStore`.
//!
//! Every morning reopens the database file, so the scheduler and the stats
//! accumulator only see what actually reached disk.

use std::path::Path;
use std::sync::Arc;

use chrono::{Duration, NaiveDate, NaiveDateTime};
use tempfile::TempDir;
use wakeup_core::alarm::{AlarmOptions, SchedulerState};
use wakeup_core::clock::ManualClock;
use wakeup_core::penalty::{PenaltySettings, PenaltyType};
use wakeup_core::stats::{Period, StatsAccumulator};
use wakeup_core::storage::{AlarmConfig, AlarmStore, SqliteStore};
use wakeup_core::AlarmScheduler;

fn day(d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 5, d).unwrap()
}

fn at(d: u32, h: u32, m: u32) -> NaiveDateTime {
    day(d).and_hms_opt(h, m, 0).unwrap()
}

fn open(path: &Path) -> Arc<SqliteStore> {
    Arc::new(SqliteStore::open_at(path).unwrap())
}

/// One morning: ring at 07:00, snooze `snoozes` times, optionally get up.
async fn morning(db: &Path, d: u32, snoozes: u32, get_up: bool) {
    let store = open(db);
    let clock = ManualClock::new(at(d, 6, 59));
    let mut s = AlarmScheduler::new(store, Arc::new(clock.clone()), AlarmConfig::default());
    assert_eq!(s.restore_schedule().await, SchedulerState::Armed);

    clock.set(at(d, 7, 0));
    assert!(s.tick().await.unwrap());
    let id = s.alarm().unwrap().id.clone();

    for _ in 0..snoozes {
        s.handle_snooze(&id).await.unwrap();
        clock.advance(Duration::minutes(5));
        assert!(s.tick().await.unwrap());
    }
    if get_up {
        s.complete_alarm(&id).await.unwrap();
    }
    s.shutdown();
}

#[tokio::test]
async fn week_of_mornings_feeds_reports() {
    let dir = TempDir::new().unwrap();
    let db = dir.path().join("wakeup.db");

    {
        let store = open(&db);
        let clock = ManualClock::new(at(5, 22, 0));
        let mut s = AlarmScheduler::new(store, Arc::new(clock), AlarmConfig::default());
        s.create_alarm("07:00", AlarmOptions::default())
            .await
            .unwrap();
    }

    morning(&db, 6, 0, true).await;
    morning(&db, 7, 0, true).await;
    morning(&db, 8, 1, true).await;
    // Slept through: two snoozes, never completed.
    morning(&db, 9, 2, false).await;
    morning(&db, 10, 0, true).await;
    morning(&db, 11, 0, true).await;
    morning(&db, 12, 0, true).await;

    let store = open(&db);
    let stats = store.get_stats().await.unwrap();
    assert_eq!(stats.len(), 7);
    assert_eq!(stats[&day(9)].wake_up_success, Some(false));
    assert_eq!(stats[&day(9)].penalty_amount, 22.5);
    // The unfinished snoozes from the 9th were not charged again on the 10th.
    assert_eq!(stats[&day(10)].snooze_count, 0);

    let clock = ManualClock::new(at(12, 9, 0));
    let acc = StatsAccumulator::new(store, Arc::new(clock));

    let totals = acc.total_stats().await.unwrap();
    assert_eq!(totals.total_days, 7);
    assert_eq!(totals.success_days, 6);
    assert_eq!(totals.failure_days, 1);
    assert_eq!(totals.total_snoozes, 3);
    assert_eq!(totals.total_penalty, 30.0);
    assert_eq!(totals.success_rate, 85.7);
    assert_eq!(totals.current_streak, 3);
    assert_eq!(totals.best_streak, 3);

    let week = acc.weekly_stats(7).await.unwrap();
    assert_eq!(week.len(), 7);
    assert_eq!(week[0].date, day(6));
    assert_eq!(week[0].weekday, "Mon");
    assert!(week[6].is_today);

    let analysis = acc.snooze_analysis().await.unwrap();
    assert_eq!(analysis.max_snoozes, 2);
    assert_eq!(analysis.worst_day.unwrap().date, day(9));

    let weekly = acc.period_stats(Period::Weekly).await.unwrap();
    assert_eq!(weekly.total_penalty, 30.0);

    let report = acc.penalty_report().await.unwrap();
    assert!(report
        .milestones
        .achieved
        .iter()
        .any(|m| m.name == "One week in"));
}

#[tokio::test]
async fn penalty_settings_are_read_at_snooze_time() {
    let dir = TempDir::new().unwrap();
    let db = dir.path().join("wakeup.db");
    let store = open(&db);
    let clock = ManualClock::new(at(10, 6, 0));
    let mut s = AlarmScheduler::new(
        store.clone(),
        Arc::new(clock.clone()),
        AlarmConfig::default(),
    );
    let alarm = s
        .create_alarm("07:00", AlarmOptions::default())
        .await
        .unwrap();

    clock.set(at(10, 7, 0));
    s.tick().await.unwrap();
    assert_eq!(s.handle_snooze(&alarm.id).await.unwrap().penalty_amount, 7.5);

    // Changed while the alarm is snoozed; the next snooze uses it.
    store
        .save_penalty_settings(&PenaltySettings {
            penalty_type: PenaltyType::Fixed,
            base_amount: 3.0,
            ..PenaltySettings::default()
        })
        .await
        .unwrap();

    clock.set(at(10, 7, 5));
    s.tick().await.unwrap();
    let second = s.handle_snooze(&alarm.id).await.unwrap();
    assert_eq!(second.penalty_amount, 3.0);
    assert_eq!(second.total_penalty, 10.5);
}
