//! Snooze penalty engine.
//!
//! Computes the simulated cost of each snooze from the user's
//! [`PenaltySettings`] and projects preview schedules for settings screens.

mod engine;
mod settings;

pub use engine::{
    calculate_penalty, calculate_total_penalty, get_penalty_schedule, penalty_description,
    PenaltyStep,
};
pub use settings::{PenaltyField, PenaltySettings, PenaltyType};
