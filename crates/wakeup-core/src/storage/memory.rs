//! In-process store.
//!
//! Holds the same three records as the SQLite backend. Tests flip it into a
//! failing mode to exercise persistence-error paths.

use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use chrono::Local;
use tokio::sync::Mutex;

use super::AlarmStore;
use crate::alarm::{Alarm, AlarmPatch};
use crate::error::StorageError;
use crate::penalty::PenaltySettings;
use crate::stats::StatsMap;

#[derive(Debug, Default)]
struct Records {
    alarm: Option<Alarm>,
    stats: StatsMap,
    penalty_settings: Option<PenaltySettings>,
}

#[derive(Debug, Default)]
pub struct MemoryStore {
    records: Mutex<Records>,
    fail_writes: AtomicBool,
    fail_alarm_updates: AtomicBool,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every subsequent write fail with `StorageError::Unavailable`.
    pub fn set_fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    /// Make only `update_alarm` fail, leaving the other writes working.
    pub fn set_fail_alarm_updates(&self, fail: bool) {
        self.fail_alarm_updates.store(fail, Ordering::SeqCst);
    }

    fn check_writable(&self) -> Result<(), StorageError> {
        if self.fail_writes.load(Ordering::SeqCst) {
            Err(StorageError::Unavailable("writes disabled".into()))
        } else {
            Ok(())
        }
    }
}

#[async_trait]
impl AlarmStore for MemoryStore {
    async fn get_alarm(&self) -> Result<Option<Alarm>, StorageError> {
        Ok(self.records.lock().await.alarm.clone())
    }

    async fn save_alarm(&self, alarm: &Alarm) -> Result<(), StorageError> {
        self.check_writable()?;
        self.records.lock().await.alarm = Some(alarm.clone());
        Ok(())
    }

    async fn update_alarm(&self, patch: &AlarmPatch) -> Result<Alarm, StorageError> {
        self.check_writable()?;
        if self.fail_alarm_updates.load(Ordering::SeqCst) {
            return Err(StorageError::Unavailable("alarm updates disabled".into()));
        }
        let mut records = self.records.lock().await;
        let alarm = records
            .alarm
            .as_mut()
            .ok_or_else(|| StorageError::Query("no alarm to update".into()))?;
        alarm.apply(patch, Local::now().naive_local());
        Ok(alarm.clone())
    }

    async fn remove_alarm(&self) -> Result<(), StorageError> {
        self.check_writable()?;
        self.records.lock().await.alarm = None;
        Ok(())
    }

    async fn get_stats(&self) -> Result<StatsMap, StorageError> {
        Ok(self.records.lock().await.stats.clone())
    }

    async fn save_stats(&self, stats: &StatsMap) -> Result<(), StorageError> {
        self.check_writable()?;
        self.records.lock().await.stats = stats.clone();
        Ok(())
    }

    async fn get_penalty_settings(&self) -> Result<Option<PenaltySettings>, StorageError> {
        Ok(self.records.lock().await.penalty_settings.clone())
    }

    async fn save_penalty_settings(&self, settings: &PenaltySettings) -> Result<(), StorageError> {
        self.check_writable()?;
        self.records.lock().await.penalty_settings = Some(settings.clone());
        Ok(())
    }

    async fn clear_all(&self) -> Result<(), StorageError> {
        self.check_writable()?;
        *self.records.lock().await = Records::default();
        Ok(())
    }
}
