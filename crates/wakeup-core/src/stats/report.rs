use serde::{Deserialize, Serialize};

use super::analysis::{
    current_streak, MonthlyStats, PenaltyBreakdown, PeriodStats, SnoozeAnalysis, TotalStats,
};
use super::daily::{DailyStat, StatsMap};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InsightKind {
    Success,
    Warning,
    Danger,
    Financial,
    Achievement,
    Motivation,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Insight {
    pub kind: InsightKind,
    pub title: String,
    pub message: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    High,
    Medium,
    Low,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Recommendation {
    pub kind: InsightKind,
    pub title: String,
    pub message: String,
    pub priority: Priority,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Milestone {
    pub name: String,
    pub description: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Milestones {
    pub achieved: Vec<Milestone>,
    pub upcoming: Vec<Milestone>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SummaryReport {
    pub totals: TotalStats,
    pub today: DailyStat,
    pub this_month: MonthlyStats,
    pub analysis: SnoozeAnalysis,
    pub insights: Vec<Insight>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PenaltyReport {
    pub weekly: PeriodStats,
    pub monthly: PeriodStats,
    pub breakdown: PenaltyBreakdown,
    pub recommendations: Vec<Recommendation>,
    pub milestones: Milestones,
}

fn insight(kind: InsightKind, title: &str, message: String) -> Insight {
    Insight {
        kind,
        title: title.to_string(),
        message,
    }
}

pub fn insights(totals: &TotalStats, analysis: &SnoozeAnalysis) -> Vec<Insight> {
    let rate = totals.success_rate;
    let mut out = vec![if rate >= 80.0 {
        insight(
            InsightKind::Success,
            "Great form",
            format!("Success rate is {rate}%. Keep the habit going."),
        )
    } else if rate >= 50.0 {
        insight(
            InsightKind::Warning,
            "Room to improve",
            format!("Success rate is {rate}%. You can do better."),
        )
    } else {
        insight(
            InsightKind::Danger,
            "Needs work",
            format!("Success rate is only {rate}%. Consider adjusting your sleep schedule."),
        )
    }];

    if totals.total_penalty > 100.0 {
        out.push(insight(
            InsightKind::Financial,
            "Penalty reminder",
            format!(
                "Simulated penalties have reached {:.2}. Getting up saves money.",
                totals.total_penalty
            ),
        ));
    }

    if analysis.best_streak >= 7 {
        out.push(insight(
            InsightKind::Achievement,
            "Milestone",
            format!("Best streak is {} days.", analysis.best_streak),
        ));
    }
    out
}

/// Advice drawn from the most recent 7 records.
pub fn recommendations(stats: &StatsMap) -> Vec<Recommendation> {
    let recent: Vec<&DailyStat> = stats.values().rev().take(7).collect();
    if recent.is_empty() {
        return Vec::new();
    }
    let n = recent.len() as f64;
    let avg_snoozes = recent.iter().map(|d| f64::from(d.snooze_count)).sum::<f64>() / n;
    let avg_penalty = recent.iter().map(|d| d.penalty_amount).sum::<f64>() / n;
    let success_rate =
        recent.iter().filter(|d| d.wake_up_success == Some(true)).count() as f64 / n;

    let mut out = Vec::new();
    if avg_snoozes > 2.0 {
        out.push(Recommendation {
            kind: InsightKind::Warning,
            title: "Snoozing too often".into(),
            message: "More than 2 snoozes per day over the last week. Try an earlier bedtime or a later alarm.".into(),
            priority: Priority::High,
        });
    }
    if avg_penalty > 15.0 {
        out.push(Recommendation {
            kind: InsightKind::Financial,
            title: "High penalties".into(),
            message: "Recent penalties are high. Consider a lower rate or going to bed earlier.".into(),
            priority: Priority::Medium,
        });
    }
    if success_rate < 0.5 {
        out.push(Recommendation {
            kind: InsightKind::Motivation,
            title: "Low success rate".into(),
            message: "Fewer than half of recent mornings succeeded. Start on easy difficulty and work up.".into(),
            priority: Priority::High,
        });
    }
    out
}

pub fn milestones(stats: &StatsMap) -> Milestones {
    let total_days = stats.len();
    let success_days = stats
        .values()
        .filter(|d| d.wake_up_success == Some(true))
        .count();
    let streak = current_streak(stats.values());
    let total_penalty: f64 = stats.values().map(|d| d.penalty_amount).sum();

    let defs = [
        ("First day", "Used the alarm for 1 day", total_days >= 1),
        ("One week in", "Used the alarm for 7 days", total_days >= 7),
        ("First success", "Woke up successfully once", success_days >= 1),
        ("Three in a row", "3-day success streak", streak >= 3),
        ("Penny saver", "No penalties recorded", total_penalty == 0.0),
        ("Monthly challenge", "Used the alarm for 30 days", total_days >= 30),
    ];

    let mut out = Milestones::default();
    for (name, description, reached) in defs {
        let milestone = Milestone {
            name: name.to_string(),
            description: description.to_string(),
        };
        if reached {
            out.achieved.push(milestone);
        } else {
            out.upcoming.push(milestone);
        }
    }
    out
}
