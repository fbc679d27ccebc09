//! Hours aggregation shared by every dashboard.
//!
//! Only approved logs with a recorded time-out count toward rendered hours,
//! and only `member`/`admin` rows take part in rollups.

use std::collections::{BTreeMap, HashMap};

use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::FromRow;
use utoipa::ToSchema;

use crate::model::attendance::{AttendanceLog, AttendanceStatus};
use crate::model::department::UNASSIGNED;

const SECONDS_PER_HOUR: f64 = 3600.0;

/// Anything carrying a time-in/time-out pair and an approval status.
pub trait Interval {
    fn time_in(&self) -> DateTime<Utc>;
    fn time_out(&self) -> Option<DateTime<Utc>>;
    fn status(&self) -> AttendanceStatus;
}

impl Interval for AttendanceLog {
    fn time_in(&self) -> DateTime<Utc> {
        self.time_in
    }
    fn time_out(&self) -> Option<DateTime<Utc>> {
        self.time_out
    }
    fn status(&self) -> AttendanceStatus {
        self.status
    }
}

/// The columns aggregation needs from `attendance_logs`.
#[derive(Debug, Clone, FromRow)]
pub struct LogInterval {
    pub member_id: u64,
    pub time_in: DateTime<Utc>,
    pub time_out: Option<DateTime<Utc>>,
    #[sqlx(try_from = "String")]
    pub status: AttendanceStatus,
}

impl Interval for LogInterval {
    fn time_in(&self) -> DateTime<Utc> {
        self.time_in
    }
    fn time_out(&self) -> Option<DateTime<Utc>> {
        self.time_out
    }
    fn status(&self) -> AttendanceStatus {
        self.status
    }
}

/// The columns aggregation needs from `members`.
#[derive(Debug, Clone, FromRow)]
pub struct TrackedMember {
    pub id: u64,
    pub department: String,
    pub total_required_hours: u32,
    pub is_active: bool,
}

/// Length of an interval in fractional hours. Negative intervals count as zero.
pub fn interval_hours(time_in: DateTime<Utc>, time_out: DateTime<Utc>) -> f64 {
    let seconds = (time_out - time_in).num_milliseconds() as f64 / 1000.0;
    (seconds / SECONDS_PER_HOUR).max(0.0)
}

pub fn counts_toward_hours<I: Interval>(log: &I) -> bool {
    log.status() == AttendanceStatus::Approved && log.time_out().is_some()
}

fn credited_hours<I: Interval>(log: &I) -> f64 {
    match log.time_out() {
        Some(out) if counts_toward_hours(log) => interval_hours(log.time_in(), out),
        _ => 0.0,
    }
}

pub fn hours_rendered<'a, I, It>(logs: It) -> f64
where
    I: Interval + 'a,
    It: IntoIterator<Item = &'a I>,
{
    logs.into_iter().map(credited_hours).sum()
}

/// Rendered hours keyed by member, in a single pass over mixed logs.
pub fn hours_by_member<'a, It>(logs: It) -> HashMap<u64, f64>
where
    It: IntoIterator<Item = &'a LogInterval>,
{
    let mut totals = HashMap::new();
    for log in logs {
        let hours = credited_hours(log);
        if hours > 0.0 {
            *totals.entry(log.member_id).or_insert(0.0) += hours;
        }
    }
    totals
}

/// `round(rendered / required * 100)`, or 0 without a target. Not capped at 100.
pub fn completion_percentage(rendered: f64, required: u32) -> u32 {
    if required == 0 {
        return 0;
    }
    (rendered / required as f64 * 100.0).round() as u32
}

pub fn hours_remaining(rendered: f64, required: u32) -> f64 {
    (required as f64 - rendered).max(0.0)
}

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
#[schema(example = json!({
    "hours_rendered": 120.5,
    "total_required": 486,
    "completion_percentage": 25,
    "hours": "121/486",
    "progress": "25%"
}))]
pub struct MemberProgress {
    pub hours_rendered: f64,
    pub total_required: u32,
    pub completion_percentage: u32,
    /// `"<rounded rendered>/<required>"`
    pub hours: String,
    /// `"<percentage>%"`
    pub progress: String,
}

impl MemberProgress {
    pub fn new(rendered: f64, required: u32) -> Self {
        let pct = completion_percentage(rendered, required);
        Self {
            hours_rendered: rendered,
            total_required: required,
            completion_percentage: pct,
            hours: format!("{}/{}", rendered.round() as u64, required),
            progress: format!("{pct}%"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
#[schema(example = json!({
    "department": "IT",
    "total_interns": 4,
    "active_interns": 3,
    "total_required_hours": 1944,
    "total_hours_rendered": 612,
    "avg_completion": 31
}))]
pub struct DepartmentPerformance {
    pub department: String,
    pub total_interns: u32,
    pub active_interns: u32,
    pub total_required_hours: u64,
    /// Rounded to whole hours
    pub total_hours_rendered: u64,
    pub avg_completion: u32,
}

#[derive(Default)]
struct DepartmentTally {
    total_interns: u32,
    active_interns: u32,
    total_required_hours: u64,
    total_hours_rendered: f64,
}

/// Per-department rollup sorted by department name.
pub fn department_performance(
    members: &[TrackedMember],
    hours: &HashMap<u64, f64>,
) -> Vec<DepartmentPerformance> {
    let mut tallies: BTreeMap<&str, DepartmentTally> = BTreeMap::new();

    for member in members {
        let department = match member.department.trim() {
            "" => UNASSIGNED,
            name => name,
        };
        let tally = tallies.entry(department).or_default();
        tally.total_interns += 1;
        if member.is_active {
            tally.active_interns += 1;
        }
        tally.total_required_hours += u64::from(member.total_required_hours);
        tally.total_hours_rendered += hours.get(&member.id).copied().unwrap_or(0.0);
    }

    tallies
        .into_iter()
        .map(|(department, t)| DepartmentPerformance {
            department: department.to_string(),
            total_interns: t.total_interns,
            active_interns: t.active_interns,
            total_required_hours: t.total_required_hours,
            total_hours_rendered: t.total_hours_rendered.round() as u64,
            avg_completion: ratio_percentage(t.total_hours_rendered, t.total_required_hours),
        })
        .collect()
}

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
#[schema(example = json!({
    "total_interns": 12,
    "active_interns": 10,
    "avg_completion": "42%",
    "total_hours": 2480
}))]
pub struct DashboardStats {
    pub total_interns: u32,
    pub active_interns: u32,
    /// `"<percentage>%"` of all rendered over all required hours
    pub avg_completion: String,
    /// Rounded to whole hours
    pub total_hours: u64,
}

pub fn dashboard_stats(members: &[TrackedMember], hours: &HashMap<u64, f64>) -> DashboardStats {
    let total_interns = members.len() as u32;
    let active_interns = members.iter().filter(|m| m.is_active).count() as u32;
    let required: u64 = members
        .iter()
        .map(|m| u64::from(m.total_required_hours))
        .sum();
    let rendered: f64 = members
        .iter()
        .filter_map(|m| hours.get(&m.id))
        .sum();

    DashboardStats {
        total_interns,
        active_interns,
        avg_completion: format!("{}%", ratio_percentage(rendered, required)),
        total_hours: rendered.round() as u64,
    }
}

fn ratio_percentage(rendered: f64, required: u64) -> u32 {
    if required == 0 {
        return 0;
    }
    (rendered / required as f64 * 100.0).round() as u32
}
