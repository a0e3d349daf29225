use clap::Subcommand;
use wakeup_core::stats::{Period, StatsAccumulator};

use super::{print_json, CmdResult, Context};

#[derive(Subcommand)]
pub enum StatsAction {
    /// The last N days, oldest first
    Week {
        #[arg(long, default_value = "7")]
        days: u32,
    },
    /// All-time totals, streaks and trend
    Total,
    /// Today's record
    Today,
    /// Current calendar month
    Month,
    /// Snooze distribution and worst day
    Snoozes,
    /// Totals for a daily, weekly or monthly window
    Period {
        #[arg(value_parser = parse_period)]
        period: Period,
    },
    /// Summary report with insights, or the penalty report
    Report {
        #[arg(long)]
        penalty: bool,
    },
}

fn parse_period(s: &str) -> Result<Period, String> {
    match s {
        "daily" => Ok(Period::Daily),
        "weekly" => Ok(Period::Weekly),
        "monthly" => Ok(Period::Monthly),
        other => Err(format!("expected daily, weekly or monthly, got '{other}'")),
    }
}

pub async fn run(action: StatsAction, ctx: &Context) -> CmdResult {
    let stats = StatsAccumulator::new(ctx.store()?, ctx.clock());

    match action {
        StatsAction::Week { days } => print_json(&stats.weekly_stats(days).await?)?,
        StatsAction::Total => print_json(&stats.total_stats().await?)?,
        StatsAction::Today => print_json(&stats.today_stats().await?)?,
        StatsAction::Month => print_json(&stats.monthly_stats().await?)?,
        StatsAction::Snoozes => print_json(&stats.snooze_analysis().await?)?,
        StatsAction::Period { period } => print_json(&stats.period_stats(period).await?)?,
        StatsAction::Report { penalty: true } => print_json(&stats.penalty_report().await?)?,
        StatsAction::Report { penalty: false } => print_json(&stats.summary_report().await?)?,
    }
    Ok(())
}
