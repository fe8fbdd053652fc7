//! Canonical handover/task model.
//!
//! Backend payloads use several naming variants for the same fields; those
//! are mapped onto these types in [`crate::wire`] and never reach the rest
//! of the crate.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

pub type HandoverId = i64;
pub type TaskId = i64;

/// Task priority. Variant order is the ordering used everywhere
/// (low < medium < high < critical).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    Low,
    Medium,
    High,
    Critical,
}

impl Priority {
    pub const ALL: [Priority; 4] = [
        Priority::Low,
        Priority::Medium,
        Priority::High,
        Priority::Critical,
    ];

    /// Strict ordering key, 0 (low) through 3 (critical).
    pub fn rank(self) -> u8 {
        match self {
            Priority::Low => 0,
            Priority::Medium => 1,
            Priority::High => 2,
            Priority::Critical => 3,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Priority::Low => "Low",
            Priority::Medium => "Medium",
            Priority::High => "High",
            Priority::Critical => "Critical",
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Priority::Low => "low",
            Priority::Medium => "medium",
            Priority::High => "high",
            Priority::Critical => "critical",
        }
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for Priority {
    type Err = Error;

    /// Strict parse for user input; backend values go through
    /// [`crate::normalize::normalize_priority`] instead.
    fn from_str(s: &str) -> Result<Self> {
        let trimmed = s.trim();
        Priority::ALL
            .iter()
            .copied()
            .find(|p| p.as_str().eq_ignore_ascii_case(trimmed))
            .ok_or_else(|| {
                Error::InvalidArgument(format!(
                    "invalid priority '{trimmed}' (expected low|medium|high|critical)"
                ))
            })
    }
}

/// Canonical three-state task status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TaskStatus {
    Pending,
    InProgress,
    Completed,
}

impl TaskStatus {
    pub const ALL: [TaskStatus; 3] = [
        TaskStatus::Pending,
        TaskStatus::InProgress,
        TaskStatus::Completed,
    ];

    pub fn label(self) -> &'static str {
        match self {
            TaskStatus::Pending => "Pending",
            TaskStatus::InProgress => "In Progress",
            TaskStatus::Completed => "Completed",
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            TaskStatus::Pending => "pending",
            TaskStatus::InProgress => "in-progress",
            TaskStatus::Completed => "completed",
        }
    }

    /// Spelling used by the acknowledgment status picker
    /// (`open | in progress | completed`).
    pub fn ack_label(self) -> &'static str {
        match self {
            TaskStatus::Pending => "open",
            TaskStatus::InProgress => "in progress",
            TaskStatus::Completed => "completed",
        }
    }
}

impl fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for TaskStatus {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        crate::normalize::known_status(s).ok_or_else(|| {
            Error::InvalidArgument(format!(
                "invalid status '{}' (expected open|in progress|completed)",
                s.trim()
            ))
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum AckStatus {
    #[default]
    Pending,
    Acknowledged,
}

impl AckStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            AckStatus::Pending => "Pending",
            AckStatus::Acknowledged => "Acknowledged",
        }
    }
}

/// One operator response to a task. Append-only.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Acknowledgment {
    pub id: i64,
    pub user: String,
    pub description: String,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Task {
    pub id: TaskId,
    pub handover_id: HandoverId,
    pub title: String,
    pub description: String,
    pub priority: Priority,
    pub status: TaskStatus,
    pub ack_status: AckStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status_updated_at: Option<DateTime<Utc>>,
    pub acknowledgments: Vec<Acknowledgment>,
}

impl Task {
    /// Timestamp shown as "last updated": status change, else creation.
    pub fn last_updated(&self) -> Option<DateTime<Utc>> {
        self.status_updated_at.or(self.created_at)
    }

    pub fn latest_acknowledgment(&self) -> Option<&Acknowledgment> {
        self.acknowledgments.last()
    }
}

/// Shift reference carried by a handover: name plus display time window.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Default)]
pub struct ShiftRef {
    pub name: String,
    pub time: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Attachment {
    pub name: String,
    pub kind: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Creator {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub name: String,
}

impl Default for Creator {
    fn default() -> Self {
        Self {
            id: None,
            name: "Unknown User".to_string(),
        }
    }
}

/// One shift-to-shift transfer. Shift references are fixed at construction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Handover {
    pub id: HandoverId,
    pub title: String,
    pub team: String,
    from_shift: ShiftRef,
    to_shift: ShiftRef,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    pub created_by: Creator,
    pub description: String,
    pub attachments: Vec<Attachment>,
    pub tasks: Vec<Task>,
}

impl Handover {
    pub fn new(id: HandoverId, from_shift: ShiftRef, to_shift: ShiftRef) -> Self {
        Self {
            id,
            title: String::new(),
            team: String::new(),
            from_shift,
            to_shift,
            created_at: None,
            created_by: Creator::default(),
            description: String::new(),
            attachments: Vec::new(),
            tasks: Vec::new(),
        }
    }

    pub fn from_shift(&self) -> &ShiftRef {
        &self.from_shift
    }

    pub fn to_shift(&self) -> &ShiftRef {
        &self.to_shift
    }

    pub fn task(&self, id: TaskId) -> Option<&Task> {
        self.tasks.iter().find(|task| task.id == id)
    }
}
