//! Pure aggregations over the persisted daily records.
//!
//! Every function recomputes from the full map; nothing is cached.

use std::collections::BTreeMap;

use chrono::{Datelike, Duration, Months, NaiveDate, Weekday};
use serde::{Deserialize, Serialize};

use super::daily::{DailyStat, StatsMap};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Trend {
    Increasing,
    Decreasing,
    Stable,
}

/// One day in the weekly chart. Days without a record are synthesized
/// with no outcome and zero cost.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DayView {
    pub date: NaiveDate,
    pub weekday: String,
    pub is_today: bool,
    pub wake_up_success: Option<bool>,
    pub snooze_count: u32,
    pub penalty_amount: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TotalStats {
    pub total_penalty: f64,
    pub total_snoozes: u32,
    /// Percent of days with an outcome that were successes, one decimal.
    pub success_rate: f64,
    pub success_days: u32,
    pub total_days: u32,
    pub failure_days: u32,
    pub avg_penalty: f64,
    pub avg_snoozes: f64,
    pub current_streak: u32,
    pub best_streak: u32,
    pub trend: Trend,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MonthlyStats {
    pub year: i32,
    pub month: u32,
    pub penalty: f64,
    pub snoozes: u32,
    pub success_days: u32,
    pub days: u32,
    pub success_rate: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorstDay {
    pub date: NaiveDate,
    pub snoozes: u32,
    pub penalty: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SnoozeAnalysis {
    /// Number of days per snooze count.
    pub distribution: BTreeMap<u32, u32>,
    pub max_snoozes: u32,
    pub worst_day: Option<WorstDay>,
    pub best_streak: u32,
    pub average_snoozes: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Period {
    Daily,
    Weekly,
    Monthly,
}

impl Period {
    /// First day included in the window ending `today`.
    pub fn start(self, today: NaiveDate) -> NaiveDate {
        match self {
            Period::Daily => today,
            Period::Weekly => today - Duration::days(7),
            Period::Monthly => today
                .checked_sub_months(Months::new(1))
                .unwrap_or(NaiveDate::MIN),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PeriodStats {
    pub period: Period,
    pub total_penalty: f64,
    pub total_snoozes: u32,
    pub average_penalty: f64,
    pub worst_day: Option<DailyStat>,
    pub current_streak: u32,
    pub best_streak: u32,
    pub penalty_trend: Trend,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BreakdownEntry {
    pub count: u32,
    pub total_penalty: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeekdayBreakdown {
    pub weekday: String,
    #[serde(flatten)]
    pub entry: BreakdownEntry,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PenaltyBreakdown {
    pub by_snooze_count: BTreeMap<u32, BreakdownEntry>,
    /// Monday first; only weekdays with records.
    pub by_weekday: Vec<WeekdayBreakdown>,
}

pub(crate) fn round1(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

fn mean_penalty(days: &[&DailyStat]) -> f64 {
    if days.is_empty() {
        return 0.0;
    }
    days.iter().map(|d| d.penalty_amount).sum::<f64>() / days.len() as f64
}

pub fn weekday_name(date: NaiveDate) -> String {
    date.format("%a").to_string()
}

/// The `days` calendar days ending today, oldest first.
pub fn weekly_window(stats: &StatsMap, today: NaiveDate, days: u32) -> Vec<DayView> {
    (0..days)
        .rev()
        .map(|back| {
            let date = today - Duration::days(i64::from(back));
            let stat = stats
                .get(&date)
                .cloned()
                .unwrap_or_else(|| DailyStat::empty(date));
            DayView {
                date,
                weekday: weekday_name(date),
                is_today: date == today,
                wake_up_success: stat.wake_up_success,
                snooze_count: stat.snooze_count,
                penalty_amount: stat.penalty_amount,
            }
        })
        .collect()
}

/// Streak days counted backward from the most recent record.
pub fn current_streak<'a>(days: impl DoubleEndedIterator<Item = &'a DailyStat>) -> u32 {
    days.rev().take_while(|d| d.is_streak_day()).count() as u32
}

pub fn best_streak<'a>(days: impl Iterator<Item = &'a DailyStat>) -> u32 {
    let mut best = 0;
    let mut run = 0;
    for day in days {
        if day.is_streak_day() {
            run += 1;
            best = best.max(run);
        } else {
            run = 0;
        }
    }
    best
}

/// Mean penalty of the last 7 records against the 7 before them.
/// Fewer than 3 records is always stable.
pub fn penalty_trend(days: &[&DailyStat]) -> Trend {
    if days.len() < 3 {
        return Trend::Stable;
    }
    let split = days.len().saturating_sub(7);
    let recent = mean_penalty(&days[split..]);
    let earlier_days = &days[split.saturating_sub(7)..split];
    let earlier = if earlier_days.is_empty() {
        recent
    } else {
        mean_penalty(earlier_days)
    };

    let base = if earlier == 0.0 { 1.0 } else { earlier };
    let change = (recent - earlier) / base;
    if change > 0.2 {
        Trend::Increasing
    } else if change < -0.2 {
        Trend::Decreasing
    } else {
        Trend::Stable
    }
}

pub fn total_stats(stats: &StatsMap) -> TotalStats {
    let mut total_penalty = 0.0;
    let mut total_snoozes = 0;
    let mut success_days = 0;
    let mut total_days = 0;

    for day in stats.values() {
        total_penalty += day.penalty_amount;
        total_snoozes += day.snooze_count;
        if day.wake_up_success == Some(true) {
            success_days += 1;
        }
        if day.has_outcome() {
            total_days += 1;
        }
    }

    let per_day = |value: f64| {
        if total_days > 0 {
            round1(value / f64::from(total_days))
        } else {
            0.0
        }
    };
    let ordered: Vec<&DailyStat> = stats.values().collect();

    TotalStats {
        total_penalty,
        total_snoozes,
        success_rate: per_day(f64::from(success_days) * 100.0),
        success_days,
        total_days,
        failure_days: total_days - success_days,
        avg_penalty: per_day(total_penalty),
        avg_snoozes: per_day(f64::from(total_snoozes)),
        current_streak: current_streak(stats.values()),
        best_streak: best_streak(stats.values()),
        trend: penalty_trend(&ordered),
    }
}

pub fn monthly_stats(stats: &StatsMap, today: NaiveDate) -> MonthlyStats {
    let mut month = MonthlyStats {
        year: today.year(),
        month: today.month(),
        penalty: 0.0,
        snoozes: 0,
        success_days: 0,
        days: 0,
        success_rate: 0.0,
    };

    for day in stats
        .values()
        .filter(|d| d.date.year() == today.year() && d.date.month() == today.month())
    {
        month.penalty += day.penalty_amount;
        month.snoozes += day.snooze_count;
        if day.wake_up_success == Some(true) {
            month.success_days += 1;
        }
        if day.has_outcome() {
            month.days += 1;
        }
    }
    if month.days > 0 {
        month.success_rate =
            round1(f64::from(month.success_days) / f64::from(month.days) * 100.0);
    }
    month
}

pub fn snooze_analysis(stats: &StatsMap) -> SnoozeAnalysis {
    let mut distribution = BTreeMap::new();
    let mut max_snoozes = 0;
    let mut worst_day = None;

    for day in stats.values() {
        *distribution.entry(day.snooze_count).or_insert(0) += 1;
        if day.snooze_count > max_snoozes {
            max_snoozes = day.snooze_count;
            worst_day = Some(WorstDay {
                date: day.date,
                snoozes: day.snooze_count,
                penalty: day.penalty_amount,
            });
        }
    }

    let with_outcome: Vec<&DailyStat> = stats.values().filter(|d| d.has_outcome()).collect();
    let average_snoozes = if with_outcome.is_empty() {
        0.0
    } else {
        let total: u32 = with_outcome.iter().map(|d| d.snooze_count).sum();
        (f64::from(total) / with_outcome.len() as f64 * 100.0).round() / 100.0
    };

    SnoozeAnalysis {
        distribution,
        max_snoozes,
        worst_day,
        best_streak: best_streak(stats.values()),
        average_snoozes,
    }
}

pub fn period_stats(stats: &StatsMap, period: Period, today: NaiveDate) -> PeriodStats {
    let days: Vec<&DailyStat> = stats.range(period.start(today)..).map(|(_, d)| d).collect();

    let total_penalty: f64 = days.iter().map(|d| d.penalty_amount).sum();
    let worst_day = days
        .iter()
        .copied()
        .filter(|d| d.penalty_amount > 0.0)
        .fold(None::<&DailyStat>, |worst, day| match worst {
            Some(w) if w.penalty_amount >= day.penalty_amount => Some(w),
            _ => Some(day),
        })
        .cloned();

    PeriodStats {
        period,
        total_penalty,
        total_snoozes: days.iter().map(|d| d.snooze_count).sum(),
        average_penalty: mean_penalty(&days),
        worst_day,
        current_streak: current_streak(days.iter().copied()),
        best_streak: best_streak(days.iter().copied()),
        penalty_trend: penalty_trend(&days),
    }
}

pub fn penalty_breakdown(stats: &StatsMap) -> PenaltyBreakdown {
    let mut by_snooze_count: BTreeMap<u32, BreakdownEntry> = BTreeMap::new();
    let mut by_weekday: BTreeMap<u32, BreakdownEntry> = BTreeMap::new();

    for day in stats.values() {
        for entry in [
            by_snooze_count.entry(day.snooze_count).or_default(),
            by_weekday
                .entry(day.date.weekday().num_days_from_monday())
                .or_default(),
        ] {
            entry.count += 1;
            entry.total_penalty += day.penalty_amount;
        }
    }

    PenaltyBreakdown {
        by_snooze_count,
        by_weekday: by_weekday
            .into_iter()
            .map(|(index, entry)| WeekdayBreakdown {
                weekday: weekday_label(index),
                entry,
            })
            .collect(),
    }
}

fn weekday_label(days_from_monday: u32) -> String {
    let weekday = match days_from_monday {
        0 => Weekday::Mon,
        1 => Weekday::Tue,
        2 => Weekday::Wed,
        3 => Weekday::Thu,
        4 => Weekday::Fri,
        5 => Weekday::Sat,
        _ => Weekday::Sun,
    };
    weekday.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 5, d).unwrap()
    }

    fn record(d: u32, success: bool, snoozes: u32, penalty: f64) -> DailyStat {
        DailyStat {
            wake_up_success: Some(success),
            snooze_count: snoozes,
            penalty_amount: penalty,
            ..DailyStat::empty(date(d))
        }
    }

    fn map(records: Vec<DailyStat>) -> StatsMap {
        records.into_iter().map(|r| (r.date, r)).collect()
    }

    #[test]
    fn weekly_window_synthesizes_missing_days() {
        let stats = map(vec![record(8, true, 0, 0.0), record(10, false, 2, 22.5)]);
        let week = weekly_window(&stats, date(10), 7);

        assert_eq!(week.len(), 7);
        assert_eq!(week[0].date, date(4));
        assert_eq!(week[6].date, date(10));
        assert!(week[6].is_today);
        assert_eq!(week[6].penalty_amount, 22.5);
        assert_eq!(week[5].wake_up_success, None);
        assert_eq!(week[5].snooze_count, 0);
        assert_eq!(week[4].wake_up_success, Some(true));
        // 2024-05-10 was a Friday.
        assert_eq!(week[6].weekday, "Fri");
    }

    #[test]
    fn totals_and_rate_rounding() {
        let stats = map(vec![
            record(1, true, 0, 0.0),
            record(2, false, 1, 7.5),
            record(3, true, 2, 22.5),
        ]);
        let totals = total_stats(&stats);
        assert_eq!(totals.total_penalty, 30.0);
        assert_eq!(totals.total_snoozes, 3);
        assert_eq!(totals.success_days, 2);
        assert_eq!(totals.total_days, 3);
        assert_eq!(totals.failure_days, 1);
        assert_eq!(totals.success_rate, 66.7);
        assert_eq!(totals.avg_penalty, 10.0);
    }

    #[test]
    fn empty_stats_are_zero() {
        let totals = total_stats(&StatsMap::new());
        assert_eq!(totals.success_rate, 0.0);
        assert_eq!(totals.current_streak, 0);
        assert_eq!(totals.trend, Trend::Stable);
    }

    #[test]
    fn streaks_need_zero_snoozes() {
        let stats = map(vec![
            record(1, true, 0, 0.0),
            record(2, true, 0, 0.0),
            record(3, true, 0, 0.0),
            record(4, true, 1, 7.5),
            record(5, true, 0, 0.0),
            record(6, true, 0, 0.0),
        ]);
        assert_eq!(current_streak(stats.values()), 2);
        assert_eq!(best_streak(stats.values()), 3);
    }

    #[test]
    fn trend_compares_recent_week_with_previous() {
        let mut records: Vec<DailyStat> = (1..=7).map(|d| record(d, false, 1, 5.0)).collect();
        records.extend((8..=14).map(|d| record(d, false, 1, 10.0)));
        let stats = map(records);
        let days: Vec<&DailyStat> = stats.values().collect();
        assert_eq!(penalty_trend(&days), Trend::Increasing);

        let stats = map((1..=14).map(|d| record(d, false, 1, 15.0 - d as f64)).collect());
        let days: Vec<&DailyStat> = stats.values().collect();
        assert_eq!(penalty_trend(&days), Trend::Decreasing);

        let short = map(vec![record(1, false, 3, 50.0), record(2, true, 0, 0.0)]);
        let days: Vec<&DailyStat> = short.values().collect();
        assert_eq!(penalty_trend(&days), Trend::Stable);
    }

    #[test]
    fn snooze_analysis_finds_worst_day() {
        let stats = map(vec![
            record(1, true, 0, 0.0),
            record(2, false, 3, 45.0),
            record(3, true, 1, 7.5),
        ]);
        let analysis = snooze_analysis(&stats);
        assert_eq!(analysis.max_snoozes, 3);
        assert_eq!(analysis.worst_day.unwrap().date, date(2));
        assert_eq!(analysis.distribution.get(&0), Some(&1));
        assert_eq!(analysis.average_snoozes, 1.33);
    }

    #[test]
    fn monthly_only_counts_current_month() {
        let mut stats = map(vec![record(1, true, 0, 0.0), record(2, false, 1, 7.5)]);
        let april = NaiveDate::from_ymd_opt(2024, 4, 30).unwrap();
        stats.insert(april, DailyStat { date: april, ..record(1, false, 2, 22.5) });
        let month = monthly_stats(&stats, date(10));
        assert_eq!(month.days, 2);
        assert_eq!(month.penalty, 7.5);
        assert_eq!(month.success_rate, 50.0);
    }

    #[test]
    fn period_and_breakdown() {
        let stats = map(vec![
            record(1, false, 2, 22.5),
            record(6, false, 1, 7.5),
            record(9, true, 0, 0.0),
            record(10, true, 0, 0.0),
        ]);
        let weekly = period_stats(&stats, Period::Weekly, date(10));
        assert_eq!(weekly.total_penalty, 7.5);
        assert_eq!(weekly.current_streak, 2);
        assert_eq!(weekly.worst_day.unwrap().date, date(6));

        let breakdown = penalty_breakdown(&stats);
        assert_eq!(breakdown.by_snooze_count[&0].count, 2);
        assert_eq!(breakdown.by_snooze_count[&2].total_penalty, 22.5);
        // 2024-05-06 was a Monday.
        assert_eq!(breakdown.by_weekday[0].weekday, "Mon");
    }
}
