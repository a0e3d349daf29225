mod config;
pub mod database;
pub mod memory;

pub use config::{AlarmConfig, Config, ShakeSettings, VibrationConfig};
pub use database::SqliteStore;
pub use memory::MemoryStore;

use std::path::PathBuf;

use async_trait::async_trait;

use crate::alarm::{Alarm, AlarmPatch};
use crate::error::StorageError;
use crate::penalty::PenaltySettings;
use crate::stats::StatsMap;

/// Key under which the single alarm is stored.
pub const ALARM_KEY: &str = "current_alarm";
/// Key under which the daily stats map is stored.
pub const STATS_KEY: &str = "stats_data";
/// Key under which penalty settings are stored.
pub const PENALTY_SETTINGS_KEY: &str = "penalty_settings";

/// Persistence collaborator. Every call may be slow and may fail.
#[async_trait]
pub trait AlarmStore: Send + Sync {
    async fn get_alarm(&self) -> Result<Option<Alarm>, StorageError>;

    async fn save_alarm(&self, alarm: &Alarm) -> Result<(), StorageError>;

    /// Apply `patch` to the stored alarm and return the result.
    /// Fails with `StorageError::Query` when there is no alarm.
    async fn update_alarm(&self, patch: &AlarmPatch) -> Result<Alarm, StorageError>;

    async fn remove_alarm(&self) -> Result<(), StorageError>;

    async fn get_stats(&self) -> Result<StatsMap, StorageError>;

    async fn save_stats(&self, stats: &StatsMap) -> Result<(), StorageError>;

    async fn get_penalty_settings(&self) -> Result<Option<PenaltySettings>, StorageError>;

    async fn save_penalty_settings(&self, settings: &PenaltySettings) -> Result<(), StorageError>;

    async fn clear_all(&self) -> Result<(), StorageError>;
}

/// Returns `~/.config/wakeup[-dev]/`, or `$WAKEUP_DATA_DIR` when set.
///
/// Set WAKEUP_ENV=dev to use the development data directory.
///
/// # Errors
/// Returns an error if creating the directory fails.
pub fn data_dir() -> std::io::Result<PathBuf> {
    let dir = match std::env::var_os("WAKEUP_DATA_DIR") {
        Some(custom) => PathBuf::from(custom),
        None => {
            let base_dir = dirs::home_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join(".config");
            let env = std::env::var("WAKEUP_ENV").unwrap_or_else(|_| "production".to_string());
            if env == "dev" {
                base_dir.join("wakeup-dev")
            } else {
                base_dir.join("wakeup")
            }
        }
    };

    std::fs::create_dir_all(&dir)?;
    Ok(dir)
}
