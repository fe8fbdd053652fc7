//! Task and handover creation.

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::error::{Error, Result};
use crate::model::{
    AckStatus, Attachment, Creator, Handover, HandoverId, Priority, ShiftRef, Task, TaskId,
    TaskStatus,
};
use crate::normalize::{normalize_priority, normalize_status};

/// Operator input for a new task.
#[derive(Debug, Clone, Default)]
pub struct TaskDraft {
    pub title: String,
    pub description: String,
    pub priority: Option<String>,
    pub status: Option<String>,
}

impl TaskDraft {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            ..Self::default()
        }
    }

    /// A draft needs a title or a description.
    pub fn validate(&self) -> Result<()> {
        if self.title.trim().is_empty() && self.description.trim().is_empty() {
            return Err(Error::Validation(
                "task needs a title or a description".to_string(),
            ));
        }
        Ok(())
    }

    pub fn priority(&self) -> Priority {
        normalize_priority(self.priority.as_deref())
    }

    pub fn status(&self) -> TaskStatus {
        normalize_status(self.status.as_deref())
    }
}

/// Next client-side task id: one past the current maximum in `tasks`.
/// Always derive it from the freshly fetched set; there is no counter.
pub fn next_task_id<'a>(tasks: impl IntoIterator<Item = &'a Task>) -> TaskId {
    tasks
        .into_iter()
        .map(|task| task.id)
        .max()
        .map(|max| max + 1)
        .unwrap_or(1)
}

pub fn build_task(
    draft: &TaskDraft,
    handover_id: HandoverId,
    id: TaskId,
    now: DateTime<Utc>,
) -> Result<Task> {
    draft.validate()?;
    Ok(Task {
        id,
        handover_id,
        title: draft.title.trim().to_string(),
        description: draft.description.trim().to_string(),
        priority: draft.priority(),
        status: draft.status(),
        ack_status: AckStatus::Pending,
        created_at: Some(now),
        status_updated_at: Some(now),
        acknowledgments: Vec::new(),
    })
}

/// Body of the backend `create task` call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CreateTaskPayload {
    pub title: String,
    pub description: String,
    pub priority: String,
    pub status: String,
    pub handover_id_id: HandoverId,
}

impl CreateTaskPayload {
    pub fn from_draft(draft: &TaskDraft, handover_id: HandoverId) -> Result<Self> {
        draft.validate()?;
        Ok(Self {
            title: draft.title.trim().to_string(),
            description: draft.description.trim().to_string(),
            priority: draft.priority().label().to_string(),
            status: draft.status().ack_label().to_string(),
            handover_id_id: handover_id,
        })
    }
}

/// A handover being assembled before submission.
#[derive(Debug, Clone, Default)]
pub struct HandoverDraft {
    pub title: String,
    pub description: String,
    pub team: String,
    pub from_shift: Option<ShiftRef>,
    pub to_shift: Option<ShiftRef>,
    pub attachments: Vec<Attachment>,
    tasks: Vec<TaskDraft>,
}

impl HandoverDraft {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            ..Self::default()
        }
    }

    /// Queue a task. Drafts without a title are ignored; returns whether the
    /// task was added.
    pub fn add_task(&mut self, draft: TaskDraft) -> bool {
        if draft.title.trim().is_empty() {
            return false;
        }
        self.tasks.push(draft);
        true
    }

    pub fn remove_task(&mut self, index: usize) -> Option<TaskDraft> {
        if index < self.tasks.len() {
            Some(self.tasks.remove(index))
        } else {
            None
        }
    }

    pub fn tasks(&self) -> &[TaskDraft] {
        &self.tasks
    }

    /// Attach a file by name; the type is the MIME subtype (`file` when
    /// unknown).
    pub fn attach(&mut self, name: impl Into<String>, mime: &str) {
        let kind = mime
            .split_once('/')
            .map(|(_, subtype)| subtype.trim())
            .filter(|subtype| !subtype.is_empty())
            .unwrap_or("file");
        self.attachments.push(Attachment {
            name: name.into(),
            kind: kind.to_string(),
        });
    }

    pub fn validate(&self) -> Result<()> {
        if self.title.trim().is_empty() {
            return Err(Error::Validation("handover title is required".to_string()));
        }
        if self.from_shift.is_none() {
            return Err(Error::Validation("from shift is required".to_string()));
        }
        if self.to_shift.is_none() {
            return Err(Error::Validation("to shift is required".to_string()));
        }
        Ok(())
    }

    /// Build the local handover. Its id is `now` in epoch milliseconds and
    /// task ids count up from 1.
    pub fn build(&self, created_by: Creator, now: DateTime<Utc>) -> Result<Handover> {
        self.validate()?;
        let (Some(from), Some(to)) = (self.from_shift.clone(), self.to_shift.clone()) else {
            return Err(Error::Validation("both shifts are required".to_string()));
        };

        let id = now.timestamp_millis();
        let mut handover = Handover::new(id, from, to);
        handover.title = self.title.trim().to_string();
        handover.description = self.description.trim().to_string();
        handover.team = self.team.trim().to_string();
        handover.created_at = Some(now);
        handover.created_by = created_by;
        handover.attachments = self.attachments.clone();
        for draft in &self.tasks {
            let task_id = next_task_id(&handover.tasks);
            let task = build_task(draft, id, task_id, now)?;
            handover.tasks.push(task);
        }
        Ok(handover)
    }
}
