//! Grouping and aggregation over fetched records.
//!
//! All functions are pure: they take the caller's record set and return new
//! values. Nothing here touches the backend.

use std::collections::BTreeMap;
use std::str::FromStr;

use chrono::{DateTime, Duration, NaiveDate, TimeZone, Utc};
use serde::Serialize;

use crate::error::{Error, Result};
use crate::model::{Handover, HandoverId, Priority, Task, TaskStatus};

/// Fixed width of the daily chart, independent of the selected range.
pub const DAILY_WINDOW_DAYS: i64 = 7;

/// A closed set of histogram buckets.
pub trait Bucket: Copy + Eq + 'static {
    fn buckets() -> &'static [Self];
    fn bucket_label(self) -> &'static str;
}

impl Bucket for Priority {
    fn buckets() -> &'static [Self] {
        &Priority::ALL
    }

    fn bucket_label(self) -> &'static str {
        self.label()
    }
}

impl Bucket for TaskStatus {
    fn buckets() -> &'static [Self] {
        &TaskStatus::ALL
    }

    fn bucket_label(self) -> &'static str {
        self.label()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HistogramBucket<K> {
    pub key: K,
    pub label: &'static str,
    pub count: usize,
}

/// Counts per bucket. Every bucket is present, zero counts included.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct Histogram<K> {
    buckets: Vec<HistogramBucket<K>>,
}

impl<K: Bucket> Histogram<K> {
    pub fn count(&self, key: K) -> usize {
        self.buckets
            .iter()
            .find(|bucket| bucket.key == key)
            .map(|bucket| bucket.count)
            .unwrap_or(0)
    }

    pub fn total(&self) -> usize {
        self.buckets.iter().map(|bucket| bucket.count).sum()
    }

    pub fn iter(&self) -> impl Iterator<Item = &HistogramBucket<K>> {
        self.buckets.iter()
    }
}

pub fn histogram<'a, T, K>(
    items: impl IntoIterator<Item = &'a T>,
    classify: impl Fn(&T) -> K,
) -> Histogram<K>
where
    T: 'a,
    K: Bucket,
{
    let mut buckets: Vec<HistogramBucket<K>> = K::buckets()
        .iter()
        .map(|&key| HistogramBucket {
            key,
            label: key.bucket_label(),
            count: 0,
        })
        .collect();
    for item in items {
        let key = classify(item);
        if let Some(bucket) = buckets.iter_mut().find(|bucket| bucket.key == key) {
            bucket.count += 1;
        }
    }
    Histogram { buckets }
}

/// Stable partition of `items` by parent key. Order inside each group
/// follows input order.
pub fn group_by_parent<T, K: Ord>(
    items: impl IntoIterator<Item = T>,
    parent: impl Fn(&T) -> K,
) -> BTreeMap<K, Vec<T>> {
    let mut grouped: BTreeMap<K, Vec<T>> = BTreeMap::new();
    for item in items {
        grouped.entry(parent(&item)).or_default().push(item);
    }
    grouped
}

pub fn group_tasks_by_handover(
    tasks: impl IntoIterator<Item = Task>,
) -> BTreeMap<HandoverId, Vec<Task>> {
    group_by_parent(tasks, |task| task.handover_id)
}

/// First task carrying the group's maximum priority.
pub fn highest_priority_task(tasks: &[Task]) -> Option<&Task> {
    tasks.iter().fold(None, |best: Option<&Task>, task| match best {
        Some(current) if current.priority >= task.priority => Some(current),
        _ => Some(task),
    })
}

/// Highest priority in a group; `Medium` for an empty group.
pub fn highest_priority(tasks: &[Task]) -> Priority {
    highest_priority_task(tasks)
        .map(|task| task.priority)
        .unwrap_or(Priority::Medium)
}

/// Overall status of a handover: pending while any task is pending, then
/// in progress while any task is in progress, otherwise completed.
pub fn derived_status(tasks: &[Task]) -> TaskStatus {
    if tasks.iter().any(|task| task.status == TaskStatus::Pending) {
        TaskStatus::Pending
    } else if tasks.iter().any(|task| task.status == TaskStatus::InProgress) {
        TaskStatus::InProgress
    } else {
        TaskStatus::Completed
    }
}

/// Trailing report window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Default)]
pub enum DateRange {
    #[default]
    #[serde(rename = "7")]
    Last7,
    #[serde(rename = "30")]
    Last30,
    #[serde(rename = "90")]
    Last90,
    #[serde(rename = "all")]
    All,
}

impl DateRange {
    pub fn days(self) -> Option<i64> {
        match self {
            DateRange::Last7 => Some(7),
            DateRange::Last30 => Some(30),
            DateRange::Last90 => Some(90),
            DateRange::All => None,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            DateRange::Last7 => "Last 7 Days",
            DateRange::Last30 => "Last 30 Days",
            DateRange::Last90 => "Last 90 Days",
            DateRange::All => "All Time",
        }
    }

    /// Whether a record stamped `ts` falls inside the window ending at `now`.
    /// Records without a usable timestamp only match `All`.
    pub fn contains<Tz: TimeZone>(self, ts: Option<DateTime<Utc>>, now: &DateTime<Tz>) -> bool {
        let Some(days) = self.days() else {
            return true;
        };
        let cutoff = now.with_timezone(&Utc) - Duration::days(days);
        ts.map(|ts| ts >= cutoff).unwrap_or(false)
    }
}

impl FromStr for DateRange {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "7" => Ok(DateRange::Last7),
            "30" => Ok(DateRange::Last30),
            "90" => Ok(DateRange::Last90),
            "all" => Ok(DateRange::All),
            other => Err(Error::InvalidArgument(format!(
                "invalid range '{other}' (expected 7|30|90|all)"
            ))),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DayBucket {
    pub date: NaiveDate,
    pub label: String,
    pub count: usize,
}

/// One bucket per calendar day for the last seven days ending today in
/// `now`'s timezone, oldest first. Items without a timestamp are skipped.
pub fn daily_counts<'a, T, Tz>(
    items: impl IntoIterator<Item = &'a T>,
    timestamp: impl Fn(&T) -> Option<DateTime<Utc>>,
    now: &DateTime<Tz>,
) -> Vec<DayBucket>
where
    T: 'a,
    Tz: TimeZone,
{
    let tz = now.timezone();
    let today = now.date_naive();
    let mut buckets: Vec<DayBucket> = (0..DAILY_WINDOW_DAYS)
        .map(|offset| {
            let date = today - Duration::days(DAILY_WINDOW_DAYS - 1 - offset);
            DayBucket {
                date,
                label: date.format("%a").to_string(),
                count: 0,
            }
        })
        .collect();

    for item in items {
        let Some(ts) = timestamp(item) else {
            continue;
        };
        let day = ts.with_timezone(&tz).date_naive();
        if let Some(bucket) = buckets.iter_mut().find(|bucket| bucket.date == day) {
            bucket.count += 1;
        }
    }
    buckets
}

/// Handover list filter: `None` means "all".
#[derive(Debug, Clone, Copy, Default)]
pub struct HandoverFilter {
    pub status: Option<TaskStatus>,
    pub priority: Option<Priority>,
}

impl HandoverFilter {
    pub fn matches(&self, handover: &Handover) -> bool {
        let status_ok = self
            .status
            .map(|status| derived_status(&handover.tasks) == status)
            .unwrap_or(true);
        let priority_ok = self
            .priority
            .map(|priority| highest_priority(&handover.tasks) == priority)
            .unwrap_or(true);
        status_ok && priority_ok
    }

    pub fn apply<'a>(&self, handovers: &'a [Handover]) -> Vec<&'a Handover> {
        handovers.iter().filter(|h| self.matches(h)).collect()
    }
}

/// Aggregate view behind the reports screen.
#[derive(Debug, Clone, Serialize)]
pub struct Report {
    pub range: DateRange,
    pub total_handovers: usize,
    pub total_tasks: usize,
    pub task_status: Histogram<TaskStatus>,
    pub task_priority: Histogram<Priority>,
    pub handover_status: Histogram<TaskStatus>,
    pub handover_priority: Histogram<Priority>,
    pub daily: Vec<DayBucket>,
}

pub fn build_report<Tz: TimeZone>(
    handovers: &[Handover],
    range: DateRange,
    now: &DateTime<Tz>,
) -> Report {
    let in_range: Vec<&Handover> = handovers
        .iter()
        .filter(|handover| range.contains(handover.created_at, now))
        .collect();
    let tasks: Vec<&Task> = in_range
        .iter()
        .flat_map(|handover| handover.tasks.iter())
        .collect();

    Report {
        range,
        total_handovers: in_range.len(),
        total_tasks: tasks.len(),
        task_status: histogram(tasks.iter().copied(), |task| task.status),
        task_priority: histogram(tasks.iter().copied(), |task| task.priority),
        handover_status: histogram(in_range.iter().copied(), |h| derived_status(&h.tasks)),
        handover_priority: histogram(in_range.iter().copied(), |h| highest_priority(&h.tasks)),
        daily: daily_counts(in_range.iter().copied(), |h| h.created_at, now),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{AckStatus, ShiftRef};
    use chrono::FixedOffset;

    fn task(id: i64, handover_id: i64, priority: Priority, status: TaskStatus) -> Task {
        Task {
            id,
            handover_id,
            title: format!("task {id}"),
            description: String::new(),
            priority,
            status,
            ack_status: AckStatus::Pending,
            created_at: None,
            status_updated_at: None,
            acknowledgments: Vec::new(),
        }
    }

    fn handover(id: i64, created_at: Option<DateTime<Utc>>, tasks: Vec<Task>) -> Handover {
        let mut handover = Handover::new(id, ShiftRef::default(), ShiftRef::default());
        handover.created_at = created_at;
        handover.tasks = tasks;
        handover
    }

    fn utc(raw: &str) -> DateTime<Utc> {
        crate::normalize::parse_timestamp(raw).expect("timestamp")
    }

    #[test]
    fn grouping_preserves_order_within_groups() {
        let tasks = vec![
            task(1, 10, Priority::Low, TaskStatus::Pending),
            task(2, 11, Priority::Low, TaskStatus::Pending),
            task(3, 10, Priority::Low, TaskStatus::Pending),
        ];
        let grouped = group_tasks_by_handover(tasks);
        let ids: Vec<(i64, Vec<i64>)> = grouped
            .iter()
            .map(|(k, v)| (*k, v.iter().map(|t| t.id).collect()))
            .collect();
        assert_eq!(ids, vec![(10, vec![1, 3]), (11, vec![2])]);
    }

    #[test]
    fn histogram_keeps_zero_buckets_and_sums_to_len() {
        let tasks = vec![
            task(1, 1, Priority::High, TaskStatus::Pending),
            task(2, 1, Priority::High, TaskStatus::Completed),
            task(3, 1, Priority::Low, TaskStatus::Completed),
        ];
        let by_priority = histogram(&tasks, |t| t.priority);
        assert_eq!(by_priority.iter().count(), 4);
        assert_eq!(by_priority.count(Priority::High), 2);
        assert_eq!(by_priority.count(Priority::Critical), 0);
        assert_eq!(by_priority.total(), tasks.len());

        let by_status = histogram(&tasks, |t| t.status);
        assert_eq!(by_status.count(TaskStatus::InProgress), 0);
        assert_eq!(by_status.total(), tasks.len());

        let empty: Vec<Task> = Vec::new();
        let none = histogram(&empty, |t| t.status);
        assert_eq!(none.iter().count(), 3);
        assert_eq!(none.total(), 0);
    }

    #[test]
    fn highest_priority_dominates_and_keeps_first_tie() {
        let tasks = vec![
            task(1, 1, Priority::Low, TaskStatus::Pending),
            task(2, 1, Priority::Critical, TaskStatus::Pending),
            task(3, 1, Priority::High, TaskStatus::Pending),
            task(4, 1, Priority::Critical, TaskStatus::Pending),
        ];
        assert_eq!(highest_priority(&tasks), Priority::Critical);
        for member in &tasks {
            assert!(highest_priority(&tasks) >= member.priority);
        }
        assert_eq!(highest_priority_task(&tasks).map(|t| t.id), Some(2));
    }

    #[test]
    fn highest_priority_of_empty_group_is_medium() {
        assert_eq!(highest_priority(&[]), Priority::Medium);
        assert!(highest_priority_task(&[]).is_none());
        let low = vec![task(1, 1, Priority::Low, TaskStatus::Pending)];
        assert_eq!(highest_priority(&low), Priority::Low);
    }

    #[test]
    fn derived_status_follows_least_complete_task() {
        let mixed = vec![
            task(1, 1, Priority::Low, TaskStatus::InProgress),
            task(2, 1, Priority::Low, TaskStatus::Pending),
        ];
        assert_eq!(derived_status(&mixed), TaskStatus::Pending);
        let working = vec![
            task(1, 1, Priority::Low, TaskStatus::Completed),
            task(2, 1, Priority::Low, TaskStatus::InProgress),
        ];
        assert_eq!(derived_status(&working), TaskStatus::InProgress);
        assert_eq!(derived_status(&[]), TaskStatus::Completed);
    }

    #[test]
    fn daily_counts_over_empty_list_has_seven_zero_buckets() {
        let now = utc("2025-08-10T12:00:00Z");
        let empty: Vec<Handover> = Vec::new();
        let buckets = daily_counts(&empty, |h| h.created_at, &now);
        assert_eq!(buckets.len(), 7);
        assert!(buckets.iter().all(|b| b.count == 0));
        assert_eq!(buckets[0].date, NaiveDate::from_ymd_opt(2025, 8, 4).expect("date"));
        assert_eq!(buckets[6].date, NaiveDate::from_ymd_opt(2025, 8, 10).expect("date"));
        assert_eq!(buckets[6].label, "Sun");
    }

    #[test]
    fn daily_counts_use_local_day_and_skip_missing_timestamps() {
        // 2025-08-09T20:00Z is already 2025-08-10 at +05:30.
        let tz = FixedOffset::east_opt(5 * 3600 + 1800).expect("offset");
        let now = utc("2025-08-10T12:00:00Z").with_timezone(&tz);
        let items = vec![
            handover(1, Some(utc("2025-08-09T20:00:00Z")), Vec::new()),
            handover(2, Some(utc("2025-08-10T01:00:00Z")), Vec::new()),
            handover(3, None, Vec::new()),
            handover(4, Some(utc("2025-07-01T01:00:00Z")), Vec::new()),
        ];
        let buckets = daily_counts(&items, |h| h.created_at, &now);
        assert_eq!(buckets[6].count, 2);
        assert_eq!(buckets.iter().map(|b| b.count).sum::<usize>(), 2);
    }

    #[test]
    fn date_range_parses_and_filters() {
        assert_eq!("7".parse::<DateRange>().expect("range"), DateRange::Last7);
        assert_eq!("ALL".parse::<DateRange>().expect("range"), DateRange::All);
        assert!("14".parse::<DateRange>().is_err());

        let now = utc("2025-08-10T12:00:00Z");
        assert!(DateRange::Last7.contains(Some(utc("2025-08-04T00:00:00Z")), &now));
        assert!(!DateRange::Last7.contains(Some(utc("2025-08-01T00:00:00Z")), &now));
        assert!(DateRange::Last30.contains(Some(utc("2025-08-01T00:00:00Z")), &now));
        assert!(!DateRange::Last7.contains(None, &now));
        assert!(DateRange::All.contains(None, &now));
    }

    #[test]
    fn filter_matches_derived_values() {
        let handovers = vec![
            handover(
                1,
                None,
                vec![task(1, 1, Priority::High, TaskStatus::Completed)],
            ),
            handover(
                2,
                None,
                vec![
                    task(2, 2, Priority::Low, TaskStatus::Pending),
                    task(3, 2, Priority::Critical, TaskStatus::Completed),
                ],
            ),
        ];
        let filter = HandoverFilter {
            status: Some(TaskStatus::Pending),
            priority: None,
        };
        let ids: Vec<i64> = filter.apply(&handovers).iter().map(|h| h.id).collect();
        assert_eq!(ids, vec![2]);

        let filter = HandoverFilter {
            status: None,
            priority: Some(Priority::High),
        };
        let ids: Vec<i64> = filter.apply(&handovers).iter().map(|h| h.id).collect();
        assert_eq!(ids, vec![1]);

        let all = HandoverFilter::default().apply(&handovers);
        assert_eq!(all.len(), 2);
    }

    #[test]
    fn report_applies_range_then_fixed_daily_window() {
        let now = utc("2025-08-10T12:00:00Z");
        let handovers = vec![
            handover(
                1,
                Some(utc("2025-08-09T08:00:00Z")),
                vec![
                    task(1, 1, Priority::High, TaskStatus::Pending),
                    task(2, 1, Priority::Low, TaskStatus::Completed),
                ],
            ),
            handover(
                2,
                Some(utc("2025-07-25T08:00:00Z")),
                vec![task(3, 2, Priority::Critical, TaskStatus::InProgress)],
            ),
        ];

        let weekly = build_report(&handovers, DateRange::Last7, &now);
        assert_eq!(weekly.total_handovers, 1);
        assert_eq!(weekly.total_tasks, 2);
        assert_eq!(weekly.task_priority.count(Priority::Critical), 0);
        assert_eq!(weekly.handover_status.count(TaskStatus::Pending), 1);
        assert_eq!(weekly.daily.len(), 7);
        assert_eq!(weekly.daily[5].count, 1);

        let monthly = build_report(&handovers, DateRange::Last30, &now);
        assert_eq!(monthly.total_handovers, 2);
        assert_eq!(monthly.task_status.total(), 3);
        assert_eq!(monthly.handover_priority.count(Priority::Critical), 1);
        // The older handover is outside the seven-day chart.
        assert_eq!(monthly.daily.iter().map(|b| b.count).sum::<usize>(), 1);
    }
}
