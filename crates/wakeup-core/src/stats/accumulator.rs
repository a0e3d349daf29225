use std::sync::Arc;

use super::analysis::{
    self, DayView, MonthlyStats, PenaltyBreakdown, Period, PeriodStats, SnoozeAnalysis,
    TotalStats,
};
use super::daily::{DailyStat, StatsMap};
use super::report::{self, Insight, Milestones, PenaltyReport, Recommendation, SummaryReport};
use crate::clock::Clock;
use crate::error::Result;
use crate::storage::AlarmStore;

/// Read-only aggregation over persisted daily records.
pub struct StatsAccumulator {
    store: Arc<dyn AlarmStore>,
    clock: Arc<dyn Clock>,
}

impl StatsAccumulator {
    pub fn new(store: Arc<dyn AlarmStore>, clock: Arc<dyn Clock>) -> Self {
        Self { store, clock }
    }

    async fn load(&self) -> Result<StatsMap> {
        Ok(self.store.get_stats().await?)
    }

    /// Last `days` calendar days, oldest first.
    pub async fn weekly_stats(&self, days: u32) -> Result<Vec<DayView>> {
        let stats = self.load().await?;
        Ok(analysis::weekly_window(&stats, self.clock.today(), days))
    }

    pub async fn total_stats(&self) -> Result<TotalStats> {
        Ok(analysis::total_stats(&self.load().await?))
    }

    /// Today's record, or an empty one.
    pub async fn today_stats(&self) -> Result<DailyStat> {
        let today = self.clock.today();
        let stats = self.load().await?;
        Ok(stats
            .get(&today)
            .cloned()
            .unwrap_or_else(|| DailyStat::empty(today)))
    }

    pub async fn monthly_stats(&self) -> Result<MonthlyStats> {
        Ok(analysis::monthly_stats(&self.load().await?, self.clock.today()))
    }

    pub async fn snooze_analysis(&self) -> Result<SnoozeAnalysis> {
        Ok(analysis::snooze_analysis(&self.load().await?))
    }

    pub async fn period_stats(&self, period: Period) -> Result<PeriodStats> {
        Ok(analysis::period_stats(
            &self.load().await?,
            period,
            self.clock.today(),
        ))
    }

    pub async fn penalty_breakdown(&self) -> Result<PenaltyBreakdown> {
        Ok(analysis::penalty_breakdown(&self.load().await?))
    }

    pub async fn insights(&self) -> Result<Vec<Insight>> {
        let stats = self.load().await?;
        Ok(report::insights(
            &analysis::total_stats(&stats),
            &analysis::snooze_analysis(&stats),
        ))
    }

    pub async fn recommendations(&self) -> Result<Vec<Recommendation>> {
        Ok(report::recommendations(&self.load().await?))
    }

    pub async fn milestones(&self) -> Result<Milestones> {
        Ok(report::milestones(&self.load().await?))
    }

    /// Totals, today, this month, snooze analysis and insights in one read.
    pub async fn summary_report(&self) -> Result<SummaryReport> {
        let stats = self.load().await?;
        let today = self.clock.today();
        let totals = analysis::total_stats(&stats);
        let snoozes = analysis::snooze_analysis(&stats);
        let insights = report::insights(&totals, &snoozes);

        Ok(SummaryReport {
            today: stats
                .get(&today)
                .cloned()
                .unwrap_or_else(|| DailyStat::empty(today)),
            this_month: analysis::monthly_stats(&stats, today),
            totals,
            analysis: snoozes,
            insights,
        })
    }

    pub async fn penalty_report(&self) -> Result<PenaltyReport> {
        let stats = self.load().await?;
        let today = self.clock.today();
        Ok(PenaltyReport {
            weekly: analysis::period_stats(&stats, Period::Weekly, today),
            monthly: analysis::period_stats(&stats, Period::Monthly, today),
            breakdown: analysis::penalty_breakdown(&stats),
            recommendations: report::recommendations(&stats),
            milestones: report::milestones(&stats),
        })
    }
}
