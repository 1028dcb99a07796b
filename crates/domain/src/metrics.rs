//! Derived dashboard and analytics data.
//!
//! Every function here is pure over the canonical in-memory collections; the
//! clock is always injected so month boundaries are testable.

use std::collections::BTreeMap;

use chrono::{DateTime, Datelike, Utc};

use crate::identity::Employee;
use crate::prospect::{InterestLevel, LeadSource, Prospect, ProspectStatus};

/// Headline dashboard counters with month-over-month growth.
#[derive(Debug, Clone, PartialEq)]
pub struct DashboardMetrics {
    /// Total prospects in the canonical list.
    pub total_prospects: usize,
    /// Prospects considered engaged (contacted, or high interest).
    pub engaged_prospects: usize,
    /// Prospects with joined status.
    pub joined_members: usize,
    /// Active employees available for assignment.
    pub active_employees: usize,
    /// Growth of the total prospect count, percent.
    pub prospect_growth_pct: f64,
    /// Growth of the engaged subset, percent.
    pub engaged_growth_pct: f64,
    /// Growth of the joined subset, percent.
    pub joined_growth_pct: f64,
}

/// One trailing-month additions data point.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MonthlyAdditions {
    /// Three-letter month label.
    pub month: &'static str,
    /// Prospects created in that month of the current year.
    pub count: usize,
}

/// One leaderboard row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LeaderboardEntry {
    /// Employee display name.
    pub name: String,
    /// Score: 100 per conversion plus 10 per assigned prospect.
    pub points: u64,
    /// Prospects converted to joined.
    pub conversions: usize,
    /// Prospects currently assigned.
    pub assigned: usize,
}

/// Analytics page summary rates.
#[derive(Debug, Clone, PartialEq)]
pub struct AnalyticsSummary {
    /// Joined over total, percent.
    pub conversion_rate_pct: f64,
    /// Prospects neither joined nor lost.
    pub active_prospects: usize,
    /// Joined over settled (total minus active, floored at one), percent.
    pub success_rate_pct: f64,
}

/// One employee-performance report row.
#[derive(Debug, Clone, PartialEq)]
pub struct PerformanceRow {
    /// Employee display name.
    pub name: String,
    /// Prospects assigned to the employee.
    pub assigned: usize,
    /// Assigned prospects that joined.
    pub conversions: usize,
    /// Conversions over assigned, percent; zero when nothing is assigned.
    pub conversion_rate_pct: f64,
}

fn is_engaged(prospect: &Prospect) -> bool {
    prospect.status == ProspectStatus::Contacted || prospect.interest_level == InterestLevel::High
}

/// Computes the headline dashboard counters.
#[must_use]
pub fn dashboard_metrics(
    prospects: &[Prospect],
    employees: &[Employee],
    now: DateTime<Utc>,
) -> DashboardMetrics {
    let engaged: Vec<&Prospect> = prospects.iter().filter(|p| is_engaged(p)).collect();
    let joined: Vec<&Prospect> = prospects
        .iter()
        .filter(|p| p.status == ProspectStatus::Joined)
        .collect();

    DashboardMetrics {
        total_prospects: prospects.len(),
        engaged_prospects: engaged.len(),
        joined_members: joined.len(),
        active_employees: employees.iter().filter(|e| e.is_active()).count(),
        prospect_growth_pct: month_over_month_growth(
            prospects.iter().map(|p| p.created_at),
            now,
        ),
        engaged_growth_pct: month_over_month_growth(
            engaged.iter().map(|p| p.created_at),
            now,
        ),
        joined_growth_pct: month_over_month_growth(joined.iter().map(|p| p.created_at), now),
    }
}

/// Month-over-month growth of a dated record set, in percent.
///
/// Undated records are skipped. A previous month of zero yields 100% when the
/// current month has anything at all, else 0%.
#[must_use]
pub fn month_over_month_growth(
    created: impl Iterator<Item = Option<DateTime<Utc>>>,
    now: DateTime<Utc>,
) -> f64 {
    let current_month = now.month();
    let current_year = now.year();
    let (previous_month, previous_year) = if current_month == 1 {
        (12, current_year - 1)
    } else {
        (current_month - 1, current_year)
    };

    let mut current_count = 0_usize;
    let mut previous_count = 0_usize;
    for date in created.flatten() {
        if date.month() == current_month && date.year() == current_year {
            current_count += 1;
        } else if date.month() == previous_month && date.year() == previous_year {
            previous_count += 1;
        }
    }

    if previous_count == 0 {
        return if current_count > 0 { 100.0 } else { 0.0 };
    }

    (current_count as f64 - previous_count as f64) / previous_count as f64 * 100.0
}

const MONTH_LABELS: [&str; 12] = [
    "Jan", "Feb", "Mar", "Apr", "May", "Jun", "Jul", "Aug", "Sep", "Oct", "Nov", "Dec",
];

/// Prospect additions for the trailing six months of the current year.
#[must_use]
pub fn monthly_additions(prospects: &[Prospect], now: DateTime<Utc>) -> Vec<MonthlyAdditions> {
    let mut counts = [0_usize; 12];
    for prospect in prospects {
        if let Some(created) = prospect.created_at
            && created.year() == now.year()
        {
            counts[created.month0() as usize] += 1;
        }
    }

    let current = now.month0() as usize;
    let start = current.saturating_sub(5);
    (start..=current)
        .map(|index| MonthlyAdditions {
            month: MONTH_LABELS[index],
            count: counts[index],
        })
        .collect()
}

/// Prospect count per status label.
#[must_use]
pub fn status_distribution(prospects: &[Prospect]) -> BTreeMap<ProspectStatus, usize> {
    let mut distribution = BTreeMap::new();
    for prospect in prospects {
        *distribution.entry(prospect.status).or_insert(0) += 1;
    }

    distribution
}

/// Prospect count per acquisition channel.
#[must_use]
pub fn source_distribution(prospects: &[Prospect]) -> BTreeMap<LeadSource, usize> {
    let mut distribution = BTreeMap::new();
    for prospect in prospects {
        *distribution.entry(prospect.lead_source).or_insert(0) += 1;
    }

    distribution
}

/// Funnel counts from new through joined (lost is excluded from the funnel).
#[must_use]
pub fn funnel_counts(prospects: &[Prospect]) -> Vec<(ProspectStatus, usize)> {
    let distribution = status_distribution(prospects);
    [
        ProspectStatus::New,
        ProspectStatus::Contacted,
        ProspectStatus::FollowUp,
        ProspectStatus::Interested,
        ProspectStatus::Joined,
    ]
    .into_iter()
    .map(|status| (status, distribution.get(&status).copied().unwrap_or(0)))
    .collect()
}

/// Top-five leaderboard over the active employee set.
///
/// Points are 100 per conversion plus 10 per assigned prospect; zero-point
/// employees are dropped.
#[must_use]
pub fn leaderboard(employees: &[Employee], prospects: &[Prospect]) -> Vec<LeaderboardEntry> {
    let mut entries: Vec<LeaderboardEntry> = employees
        .iter()
        .filter(|employee| employee.is_active())
        .map(|employee| {
            let assigned: Vec<&Prospect> = prospects
                .iter()
                .filter(|p| p.assigned_to.as_ref() == Some(&employee.id))
                .collect();
            let conversions = assigned
                .iter()
                .filter(|p| p.status == ProspectStatus::Joined)
                .count();
            LeaderboardEntry {
                name: employee.full_name.clone(),
                points: conversions as u64 * 100 + assigned.len() as u64 * 10,
                conversions,
                assigned: assigned.len(),
            }
        })
        .filter(|entry| entry.points > 0)
        .collect();

    entries.sort_by(|left, right| right.points.cmp(&left.points));
    entries.truncate(5);
    entries
}

/// Computes the analytics page summary.
#[must_use]
pub fn analytics_summary(prospects: &[Prospect]) -> AnalyticsSummary {
    let total = prospects.len();
    if total == 0 {
        return AnalyticsSummary {
            conversion_rate_pct: 0.0,
            active_prospects: 0,
            success_rate_pct: 0.0,
        };
    }

    let joined = prospects
        .iter()
        .filter(|p| p.status == ProspectStatus::Joined)
        .count();
    let active = prospects.iter().filter(|p| p.status.is_active()).count();
    let settled = (total - active).max(1);

    AnalyticsSummary {
        conversion_rate_pct: joined as f64 / total as f64 * 100.0,
        active_prospects: active,
        success_rate_pct: joined as f64 / settled as f64 * 100.0,
    }
}

/// Per-employee assignment and conversion figures for the performance report.
#[must_use]
pub fn employee_performance(employees: &[Employee], prospects: &[Prospect]) -> Vec<PerformanceRow> {
    employees
        .iter()
        .map(|employee| {
            let assigned = prospects
                .iter()
                .filter(|p| p.assigned_to.as_ref() == Some(&employee.id))
                .count();
            let conversions = prospects
                .iter()
                .filter(|p| {
                    p.assigned_to.as_ref() == Some(&employee.id)
                        && p.status == ProspectStatus::Joined
                })
                .count();
            let conversion_rate_pct = if assigned > 0 {
                conversions as f64 / assigned as f64 * 100.0
            } else {
                0.0
            };

            PerformanceRow {
                name: employee.full_name.clone(),
                assigned,
                conversions,
                conversion_rate_pct,
            }
        })
        .collect()
}
