//! SQLite-backed record store.
//!
//! Every record is a JSON document in a single key-value table:
//! - `current_alarm`: the one [`Alarm`]
//! - `stats_data`: map of ISO date to [`DailyStat`](crate::stats::DailyStat)
//! - `penalty_settings`: the user's [`PenaltySettings`]

use std::path::Path;
use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;
use chrono::Local;
use rusqlite::{params, Connection};
use serde::de::DeserializeOwned;
use serde::Serialize;

use super::{data_dir, AlarmStore, ALARM_KEY, PENALTY_SETTINGS_KEY, STATS_KEY};
use crate::alarm::{Alarm, AlarmPatch};
use crate::error::StorageError;
use crate::penalty::PenaltySettings;
use crate::stats::StatsMap;

/// SQLite database holding the alarm, stats and penalty settings.
pub struct SqliteStore {
    conn: Mutex<Connection>,
}

impl SqliteStore {
    /// Open the store at `<data_dir>/wakeup.db`.
    ///
    /// Creates the database file and schema if they don't exist.
    ///
    /// # Errors
    /// Returns an error if the database cannot be opened or migrated.
    pub fn open() -> Result<Self, StorageError> {
        let dir = data_dir().map_err(|e| StorageError::Unavailable(e.to_string()))?;
        Self::open_at(dir.join("wakeup.db"))
    }

    /// Open (or create) the store at an explicit path.
    pub fn open_at(path: impl AsRef<Path>) -> Result<Self, StorageError> {
        let path = path.as_ref();
        let conn = Connection::open(path).map_err(|source| StorageError::Open {
            path: path.to_path_buf(),
            source,
        })?;
        Self::with_connection(conn)
    }

    /// Open an in-memory database (for tests and dry runs).
    pub fn open_memory() -> Result<Self, StorageError> {
        Self::with_connection(Connection::open_in_memory()?)
    }

    fn with_connection(conn: Connection) -> Result<Self, StorageError> {
        let store = Self {
            conn: Mutex::new(conn),
        };
        store.migrate()?;
        Ok(store)
    }

    fn migrate(&self) -> Result<(), StorageError> {
        self.conn()?.execute_batch(
            "CREATE TABLE IF NOT EXISTS kv (
                key        TEXT PRIMARY KEY,
                value      TEXT NOT NULL,
                updated_at TEXT NOT NULL
            );",
        )?;
        Ok(())
    }

    fn conn(&self) -> Result<MutexGuard<'_, Connection>, StorageError> {
        self.conn.lock().map_err(|_| StorageError::Locked)
    }

    /// Get a raw value from the kv store.
    pub fn kv_get(&self, key: &str) -> Result<Option<String>, StorageError> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare("SELECT value FROM kv WHERE key = ?1")?;
        let result = stmt.query_row(params![key], |row| row.get::<_, String>(0));
        match result {
            Ok(v) => Ok(Some(v)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// Set a raw value in the kv store.
    pub fn kv_set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        self.conn()?.execute(
            "INSERT OR REPLACE INTO kv (key, value, updated_at) VALUES (?1, ?2, ?3)",
            params![key, value, Local::now().naive_local().to_string()],
        )?;
        Ok(())
    }

    fn kv_delete(&self, key: &str) -> Result<(), StorageError> {
        self.conn()?
            .execute("DELETE FROM kv WHERE key = ?1", params![key])?;
        Ok(())
    }

    fn get_json<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>, StorageError> {
        match self.kv_get(key)? {
            Some(json) => Ok(Some(serde_json::from_str(&json)?)),
            None => Ok(None),
        }
    }

    fn set_json<T: Serialize>(&self, key: &str, value: &T) -> Result<(), StorageError> {
        let json = serde_json::to_string(value)?;
        self.kv_set(key, &json)
    }
}

#[async_trait]
impl AlarmStore for SqliteStore {
    async fn get_alarm(&self) -> Result<Option<Alarm>, StorageError> {
        self.get_json(ALARM_KEY)
    }

    async fn save_alarm(&self, alarm: &Alarm) -> Result<(), StorageError> {
        self.set_json(ALARM_KEY, alarm)
    }

    async fn update_alarm(&self, patch: &AlarmPatch) -> Result<Alarm, StorageError> {
        let mut alarm: Alarm = self
            .get_json(ALARM_KEY)?
            .ok_or_else(|| StorageError::Query("no alarm to update".into()))?;
        alarm.apply(patch, Local::now().naive_local());
        self.set_json(ALARM_KEY, &alarm)?;
        Ok(alarm)
    }

    async fn remove_alarm(&self) -> Result<(), StorageError> {
        self.kv_delete(ALARM_KEY)
    }

    async fn get_stats(&self) -> Result<StatsMap, StorageError> {
        Ok(self.get_json(STATS_KEY)?.unwrap_or_default())
    }

    async fn save_stats(&self, stats: &StatsMap) -> Result<(), StorageError> {
        self.set_json(STATS_KEY, stats)
    }

    async fn get_penalty_settings(&self) -> Result<Option<PenaltySettings>, StorageError> {
        self.get_json(PENALTY_SETTINGS_KEY)
    }

    async fn save_penalty_settings(&self, settings: &PenaltySettings) -> Result<(), StorageError> {
        self.set_json(PENALTY_SETTINGS_KEY, settings)
    }

    async fn clear_all(&self) -> Result<(), StorageError> {
        let conn = self.conn()?;
        conn.execute(
            "DELETE FROM kv WHERE key IN (?1, ?2, ?3)",
            params![ALARM_KEY, STATS_KEY, PENALTY_SETTINGS_KEY],
        )?;
        Ok(())
    }
}
