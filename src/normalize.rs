//! Record normalization.
//!
//! Backend records spell statuses and priorities in several ways and
//! sometimes omit them. Every function here is total: unknown input maps to
//! a default bucket instead of an error.

use chrono::{DateTime, NaiveDate, NaiveDateTime, TimeZone, Utc};

use crate::model::{Priority, TaskStatus};

const DEFAULT_STATUS: TaskStatus = TaskStatus::Pending;
const DEFAULT_PRIORITY: Priority = Priority::Medium;

/// Map a raw status onto the three canonical buckets. Unknown or missing
/// values are `Pending`.
pub fn normalize_status(raw: Option<&str>) -> TaskStatus {
    raw.and_then(known_status).unwrap_or(DEFAULT_STATUS)
}

/// Recognize a status synonym, or `None` when the value is not one.
pub fn known_status(raw: &str) -> Option<TaskStatus> {
    let lowered = raw.trim().to_ascii_lowercase();
    match lowered.as_str() {
        "open" | "pending" | "incomplete" => Some(TaskStatus::Pending),
        "in progress" | "in-progress" | "in_progress" => Some(TaskStatus::InProgress),
        "completed" | "closed" => Some(TaskStatus::Completed),
        _ => None,
    }
}

/// Map a raw priority onto the four fixed levels. Missing or unknown values
/// are `Medium`.
pub fn normalize_priority(raw: Option<&str>) -> Priority {
    raw.and_then(|value| value.parse::<Priority>().ok())
        .unwrap_or(DEFAULT_PRIORITY)
}

/// Lenient timestamp parsing for backend fields.
///
/// Accepts RFC 3339, `YYYY-MM-DD HH:MM:SS[.fff]` / `YYYY-MM-DDTHH:MM:SS[.fff]`
/// without offset (read as UTC) and bare dates (midnight UTC). Anything else
/// is `None`.
pub fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }
    if let Ok(parsed) = DateTime::parse_from_rfc3339(trimmed) {
        return Some(parsed.with_timezone(&Utc));
    }
    for format in ["%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M:%S%.f"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(trimmed, format) {
            return Some(Utc.from_utc_datetime(&naive));
        }
    }
    NaiveDate::parse_from_str(trimmed, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|naive| Utc.from_utc_datetime(&naive))
}

/// Display form used in task tables, e.g. `Aug 4, 2025 10:30 PM`.
pub fn format_timestamp<Tz: TimeZone>(ts: &DateTime<Tz>) -> String
where
    Tz::Offset: std::fmt::Display,
{
    ts.format("%b %-d, %Y %-I:%M %p").to_string()
}
