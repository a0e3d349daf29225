//! # Wakeup Core Library
//!
//! Core logic for a wake-up alarm that has to be shaken off. Snoozing costs
//! a simulated penalty. Everything runs through a standalone CLI binary that
//! sits on top of this library.
//!
//! ## Architecture
//!
//! - **Scheduler**: a clock-driven state machine holding at most one pending
//!   timer. The caller drives it with `tick()`.
//! - **Shake detection**: accelerometer samples pass through a debounced,
//!   windowed detector with difficulty-specific thresholds.
//! - **Penalties**: pure functions over [`PenaltySettings`].
//! - **Stats**: per-day records plus streaks, trends, insights and reports.
//! - **Storage**: SQLite key/value persistence and TOML configuration.
//!
//! ## Key Components
//!
//! - [`AlarmScheduler`]: alarm lifecycle and timer ownership
//! - [`ShakeDetector`]: sample-to-shake classification
//! - [`StatsAccumulator`]: read-side aggregation over daily records
//! - [`SqliteStore`]: persistence behind the [`AlarmStore`] trait
//! - [`Config`]: application configuration management

pub mod alarm;
pub mod clock;
pub mod error;
pub mod events;
pub mod notify;
pub mod penalty;
pub mod shake;
pub mod stats;
pub mod storage;

pub use alarm::{
    Alarm, AlarmOptions, AlarmScheduler, AlarmStatus, AlarmTime, Difficulty, SchedulerState,
    SnoozeResult, TriggerType,
};
pub use clock::{Clock, ManualClock, SystemClock};
pub use error::{ConfigError, CoreError, Result, SensorError, StorageError, ValidationError};
pub use events::{ArmReason, Event};
pub use notify::{AlarmAudio, AlarmListener, SoundOutput};
pub use penalty::{PenaltySettings, PenaltyType};
pub use shake::{Sample, ShakeDetector, ShakeMonitor, ShakePattern};
pub use stats::{DailyStat, StatsAccumulator};
pub use storage::{AlarmStore, Config, MemoryStore, SqliteStore};
