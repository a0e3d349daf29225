mod model;
mod scheduler;

pub use model::{
    format_duration, Alarm, AlarmOptions, AlarmPatch, AlarmTime, Difficulty, TriggerType,
};
pub use scheduler::{AlarmScheduler, AlarmStatus, PendingTimer, SchedulerState, SnoozeResult};
