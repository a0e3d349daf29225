use clap::Subcommand;
use serde::Serialize;
use wakeup_core::penalty::{
    calculate_penalty, calculate_total_penalty, get_penalty_schedule, penalty_description,
    PenaltyField, PenaltySettings, PenaltyType,
};
use wakeup_core::storage::AlarmStore;

use super::{print_json, CmdResult, Context};

#[derive(Subcommand)]
pub enum PenaltyAction {
    /// Print the current penalty settings
    Show,
    /// Replace individual settings
    Set {
        /// fixed, progressive, exponential or linear
        #[arg(long = "type")]
        penalty_type: Option<PenaltyType>,
        #[arg(long)]
        base_amount: Option<f64>,
        #[arg(long)]
        progressive_rate: Option<f64>,
        #[arg(long)]
        max_penalty: Option<f64>,
        #[arg(long)]
        max_snoozes: Option<u32>,
        /// Turn penalties on or off
        #[arg(long)]
        enabled: Option<bool>,
    },
    /// Step one field up or down within its editor bounds
    Adjust {
        /// base_amount, progressive_rate, max_penalty or max_snoozes
        field: PenaltyField,
        #[arg(allow_hyphen_values = true)]
        delta: f64,
    },
    /// Preview the cost of each snooze
    Schedule,
    /// Cost of the n-th snooze
    Calc {
        snooze_count: u32,
    },
}

#[derive(Serialize)]
struct Calculation {
    snooze_count: u32,
    penalty_amount: f64,
    total_penalty: f64,
    description: String,
}

pub async fn run(action: PenaltyAction, ctx: &Context) -> CmdResult {
    let store = ctx.store()?;
    let mut settings = store.get_penalty_settings().await?.unwrap_or_default();

    match action {
        PenaltyAction::Show => print_json(&settings)?,
        PenaltyAction::Set {
            penalty_type,
            base_amount,
            progressive_rate,
            max_penalty,
            max_snoozes,
            enabled,
        } => {
            let updated = PenaltySettings {
                penalty_type: penalty_type.unwrap_or(settings.penalty_type),
                base_amount: base_amount.unwrap_or(settings.base_amount),
                progressive_rate: progressive_rate.unwrap_or(settings.progressive_rate),
                max_penalty: max_penalty.unwrap_or(settings.max_penalty),
                max_snoozes: max_snoozes.unwrap_or(settings.max_snoozes),
                enabled: enabled.unwrap_or(settings.enabled),
            };
            updated.validate()?;
            store.save_penalty_settings(&updated).await?;
            print_json(&updated)?;
        }
        PenaltyAction::Adjust { field, delta } => {
            let stored = settings.adjust(field, delta);
            tracing::debug!("{field:?} adjusted to {stored}");
            store.save_penalty_settings(&settings).await?;
            print_json(&settings)?;
        }
        PenaltyAction::Schedule => print_json(&get_penalty_schedule(&settings))?,
        PenaltyAction::Calc { snooze_count } => print_json(&Calculation {
            snooze_count,
            penalty_amount: calculate_penalty(snooze_count, &settings),
            total_penalty: calculate_total_penalty(snooze_count, &settings),
            description: penalty_description(snooze_count),
        })?,
    }
    Ok(())
}
