//! Snooze cost computation.
//!
//! Every function here is pure: the same snooze count and settings always
//! produce the same amount, and nothing is read from or written to storage.

use serde::{Deserialize, Serialize};

use super::settings::{PenaltySettings, PenaltyType};

/// One row of a settings-preview table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PenaltyStep {
    pub snooze_count: u32,
    pub penalty_amount: f64,
    pub total_penalty: f64,
    pub description: String,
}

/// Cost of the `snooze_count`-th snooze (1-indexed), clamped to
/// `[0, max_penalty]`.
pub fn calculate_penalty(snooze_count: u32, settings: &PenaltySettings) -> f64 {
    let base = settings.base_amount;
    let count = snooze_count as f64;

    let amount = match settings.penalty_type {
        PenaltyType::Fixed => base,
        PenaltyType::Progressive => base * count * settings.progressive_rate,
        PenaltyType::Exponential => {
            let exp = (i64::from(snooze_count) - 1).min(1023) as i32;
            base * 2f64.powi(exp)
        }
        PenaltyType::Linear => base * count,
    };

    amount.min(settings.max_penalty).max(0.0)
}

/// Sum of each step `1..=snooze_count`.
///
/// Step costs never decrease with the count, so once a step reaches
/// `max_penalty` the remaining steps are added in one go.
pub fn calculate_total_penalty(snooze_count: u32, settings: &PenaltySettings) -> f64 {
    if settings.penalty_type == PenaltyType::Fixed {
        return calculate_penalty(1, settings) * f64::from(snooze_count);
    }

    let cap = settings.max_penalty.max(0.0);
    let mut total = 0.0;
    for i in 1..=snooze_count {
        let amount = calculate_penalty(i, settings);
        if amount >= cap {
            return total + cap * f64::from(snooze_count - i + 1);
        }
        total += amount;
    }
    total
}

/// Preview rows for `1..=max_snoozes`.
pub fn get_penalty_schedule(settings: &PenaltySettings) -> Vec<PenaltyStep> {
    let mut total = 0.0;
    (1..=settings.max_snoozes)
        .map(|i| {
            let penalty_amount = calculate_penalty(i, settings);
            total += penalty_amount;
            PenaltyStep {
                snooze_count: i,
                penalty_amount,
                total_penalty: total,
                description: penalty_description(i),
            }
        })
        .collect()
}

/// Label for the `snooze_count`-th snooze.
pub fn penalty_description(snooze_count: u32) -> String {
    match snooze_count {
        1 => "Snooze #1".to_string(),
        2 => "Snooze #2 (rate increase)".to_string(),
        3 => "Snooze #3 (serious warning)".to_string(),
        4 => "Snooze #4 (heavy penalty)".to_string(),
        5 => "Snooze #5 (maximum penalty)".to_string(),
        n => format!("Snooze #{n}"),
    }
}
