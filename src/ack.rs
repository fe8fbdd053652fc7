//! Task acknowledgment.
//!
//! An operator opens a draft for a task, writes a description, picks a
//! target status and commits. Committing never edits the task in place: it
//! returns a new `Task` with one more acknowledgment appended.
//!
//! ```text
//! Idle --begin--> Drafting(Describing) --validate_and_advance--> Drafting(SelectingStatus)
//!                       ^                                               |
//!                       +------------- commit fails (validation) -------+
//! Drafting --commit--> Committed --begin--> Drafting ...
//! ```

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::error::{Error, Result};
use crate::model::{AckStatus, Acknowledgment, Task, TaskId, TaskStatus};

/// Statuses offered once a draft has a description.
pub const ACK_TARGETS: [TaskStatus; 3] = TaskStatus::ALL;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DraftStage {
    Describing,
    SelectingStatus,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AckDraft {
    task_id: TaskId,
    description: String,
    status: TaskStatus,
    stage: DraftStage,
}

impl AckDraft {
    pub fn task_id(&self) -> TaskId {
        self.task_id
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn status(&self) -> TaskStatus {
        self.status
    }

    pub fn stage(&self) -> DraftStage {
        self.stage
    }

    /// Replace the draft text. Editing sends the draft back to the
    /// description stage.
    pub fn set_description(&mut self, text: impl Into<String>) {
        self.description = text.into();
        self.stage = DraftStage::Describing;
    }

    /// Check the description and unlock status selection.
    pub fn validate_and_advance(&mut self) -> Result<&'static [TaskStatus]> {
        validate_description(&self.description)?;
        self.stage = DraftStage::SelectingStatus;
        Ok(&ACK_TARGETS)
    }

    pub fn select_status(&mut self, status: TaskStatus) -> Result<()> {
        if self.stage != DraftStage::SelectingStatus {
            return Err(Error::Validation(
                "enter a description before choosing a status".to_string(),
            ));
        }
        self.status = status;
        Ok(())
    }
}

/// Open a draft for `task`, seeded with its current status and the most
/// recent acknowledgment text.
pub fn begin(task: &Task) -> AckDraft {
    AckDraft {
        task_id: task.id,
        description: task
            .latest_acknowledgment()
            .map(|ack| ack.description.clone())
            .unwrap_or_default(),
        status: task.status,
        stage: DraftStage::Describing,
    }
}

/// Produce the acknowledged version of `task`.
///
/// The new acknowledgment id is `now` in epoch milliseconds, bumped past the
/// previous id when two commits land in the same millisecond.
pub fn commit(task: &Task, draft: &AckDraft, user: &str, now: DateTime<Utc>) -> Result<Task> {
    if draft.task_id != task.id {
        return Err(Error::InvalidArgument(format!(
            "draft belongs to task {}, not task {}",
            draft.task_id, task.id
        )));
    }
    validate_description(&draft.description)?;

    let mut id = now.timestamp_millis();
    if let Some(last) = task.latest_acknowledgment() {
        id = id.max(last.id + 1);
    }

    let mut updated = task.clone();
    updated.status = draft.status;
    updated.ack_status = AckStatus::Acknowledged;
    updated.status_updated_at = Some(now);
    updated.acknowledgments.push(Acknowledgment {
        id,
        user: user.trim().to_string(),
        description: draft.description.trim().to_string(),
        timestamp: now,
    });
    Ok(updated)
}

/// Reject a blank acknowledgment description.
pub fn validate_description(text: &str) -> Result<()> {
    if text.trim().is_empty() {
        return Err(Error::Validation(
            "acknowledgment description cannot be empty".to_string(),
        ));
    }
    Ok(())
}

/// Per-task acknowledgment flow.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum AckState {
    #[default]
    Idle,
    Drafting(AckDraft),
    Committed { ack_id: i64 },
}

impl AckState {
    /// Start (or restart) a draft. Allowed from any state.
    pub fn begin(&mut self, task: &Task) {
        *self = AckState::Drafting(begin(task));
    }

    pub fn draft_mut(&mut self) -> Option<&mut AckDraft> {
        match self {
            AckState::Drafting(draft) => Some(draft),
            _ => None,
        }
    }

    pub fn cancel(&mut self) {
        *self = AckState::Idle;
    }

    pub fn draft(&self) -> Option<&AckDraft> {
        match self {
            AckState::Drafting(draft) => Some(draft),
            _ => None,
        }
    }

    /// Close the draft once `committed` has been accepted. Until then the
    /// draft stays open.
    pub fn mark_committed(&mut self, committed: &Task) {
        let ack_id = committed
            .latest_acknowledgment()
            .map(|ack| ack.id)
            .unwrap_or_default();
        *self = AckState::Committed { ack_id };
    }
}
