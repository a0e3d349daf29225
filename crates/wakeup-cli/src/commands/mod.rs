pub mod alarm;
pub mod completions;
pub mod config;
pub mod data;
pub mod penalty;
pub mod shake;
pub mod stats;

use std::error::Error;
use std::sync::Arc;

use chrono::NaiveDateTime;
use serde::Serialize;
use wakeup_core::clock::{Clock, ManualClock, SystemClock};
use wakeup_core::storage::SqliteStore;

pub type CmdResult = Result<(), Box<dyn Error>>;

/// Process-wide options shared by every subcommand.
#[derive(Debug, Clone, Default)]
pub struct Context {
    /// Pretend the local time is this instant.
    pub now: Option<NaiveDateTime>,
}

impl Context {
    pub fn clock(&self) -> Arc<dyn Clock> {
        match self.now {
            Some(at) => Arc::new(ManualClock::new(at)),
            None => Arc::new(SystemClock),
        }
    }

    pub fn store(&self) -> Result<Arc<SqliteStore>, Box<dyn Error>> {
        Ok(Arc::new(SqliteStore::open()?))
    }
}

pub fn print_json<T: Serialize + ?Sized>(value: &T) -> CmdResult {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
