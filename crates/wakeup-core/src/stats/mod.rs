//! Wake-up statistics.
//!
//! [`DailyStat`] is the persisted per-day record. [`StatsAccumulator`]
//! reads the full record set from the store on every call and derives
//! weekly, monthly and lifetime views from it.

mod accumulator;
mod analysis;
mod daily;
mod report;

pub use accumulator::StatsAccumulator;
pub use analysis::{
    BreakdownEntry, DayView, MonthlyStats, PenaltyBreakdown, Period, PeriodStats, SnoozeAnalysis,
    TotalStats, Trend, WeekdayBreakdown, WorstDay,
};
pub use daily::{DailyStat, StatsMap};
pub use report::{
    Insight, InsightKind, Milestone, Milestones, PenaltyReport, Priority, Recommendation,
    SummaryReport,
};
