//! In-memory record set shared by every view.
//!
//! The board owns the canonical [`RecordSet`] and is the only place it
//! changes:
//! - a load replaces it wholesale;
//! - an acknowledgment swaps in the one task the backend echoed back;
//! - task creation refetches everything.
//!
//! Each load is tagged with a generation. A result that arrives after a
//! newer load started, or after [`Board::reset`], is dropped.

use chrono::{DateTime, Utc};

use crate::ack::{self, AckState};
use crate::client::HandoverBackend;
use crate::create::{CreateTaskPayload, TaskDraft};
use crate::error::{Error, Result};
use crate::model::{HandoverId, Task, TaskId};
use crate::session::Session;
use crate::wire::{RecordSet, UpdateTaskPayload};

/// Which backend collection a load reads.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Source {
    #[default]
    Active,
    History,
}

/// Handle for one in-flight load.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoadTicket {
    generation: u64,
    source: Source,
}

impl LoadTicket {
    pub fn source(&self) -> Source {
        self.source
    }
}

/// What happened to a finished load.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadOutcome {
    Applied,
    /// The response had the wrong shape; the board now shows nothing.
    Emptied,
    Stale,
}

#[derive(Debug, Default)]
pub struct Board {
    records: RecordSet,
    generation: u64,
    source: Source,
}

impl Board {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn records(&self) -> &RecordSet {
        &self.records
    }

    pub fn source(&self) -> Source {
        self.source
    }

    /// Clear the board; loads already in flight become stale.
    pub fn reset(&mut self) {
        self.generation += 1;
        self.records = RecordSet::default();
    }

    pub fn begin_load(&mut self, source: Source) -> LoadTicket {
        self.generation += 1;
        LoadTicket {
            generation: self.generation,
            source,
        }
    }

    /// Apply the result of a load started with `ticket`.
    ///
    /// Backend failures are returned and leave the board untouched. A
    /// malformed response empties the board instead of failing.
    pub fn finish_load(
        &mut self,
        ticket: LoadTicket,
        result: Result<RecordSet>,
    ) -> Result<LoadOutcome> {
        if ticket.generation != self.generation {
            tracing::debug!(
                ticket = ticket.generation,
                current = self.generation,
                "discarding stale load"
            );
            return Ok(LoadOutcome::Stale);
        }

        match result {
            Ok(records) => {
                tracing::debug!(
                    handovers = records.handovers.len(),
                    source = ?ticket.source,
                    "record set loaded"
                );
                self.records = records;
                self.source = ticket.source;
                Ok(LoadOutcome::Applied)
            }
            Err(Error::DataShape(message)) => {
                tracing::warn!(%message, "malformed record set; showing empty board");
                self.records = RecordSet::default();
                self.source = ticket.source;
                Ok(LoadOutcome::Emptied)
            }
            Err(err) => Err(err),
        }
    }

    pub async fn load(
        &mut self,
        backend: &dyn HandoverBackend,
        session: &Session,
        source: Source,
    ) -> Result<LoadOutcome> {
        let ticket = self.begin_load(source);
        let result = match source {
            Source::Active => backend.fetch_handovers(session).await,
            Source::History => backend.fetch_history(session).await,
        };
        self.finish_load(ticket, result)
    }

    /// Find a task. Task ids restart per handover, so an id held by more than
    /// one handover needs `handover` to pick one.
    pub fn task(&self, handover: Option<HandoverId>, task_id: TaskId) -> Result<&Task> {
        let Some(handover_id) = handover else {
            let found: Vec<&Task> = self.records.tasks_with_id(task_id).collect();
            return match found.as_slice() {
                [] => Err(Error::TaskNotFound(task_id)),
                [task] => Ok(*task),
                many => {
                    let owners: Vec<String> =
                        many.iter().map(|task| task.handover_id.to_string()).collect();
                    Err(Error::InvalidArgument(format!(
                        "task id {task_id} exists in handovers {}; pass --handover",
                        owners.join(", ")
                    )))
                }
            };
        };
        self.records
            .handover(handover_id)
            .ok_or(Error::HandoverNotFound(handover_id))?
            .task(task_id)
            .ok_or(Error::TaskNotFound(task_id))
    }

    /// Commit the draft held by `state` and persist it. The board and the
    /// state only move on once the backend has accepted the update.
    pub async fn acknowledge(
        &mut self,
        backend: &dyn HandoverBackend,
        handover: Option<HandoverId>,
        state: &mut AckState,
        user: &str,
        now: DateTime<Utc>,
    ) -> Result<Task> {
        let Some(draft) = state.draft() else {
            return Err(Error::Validation("no acknowledgment in progress".to_string()));
        };
        let current = self.task(handover, draft.task_id())?;
        let committed = ack::commit(current, draft, user, now)?;
        let payload = UpdateTaskPayload::from(&committed);

        let saved = backend.update_task(&payload).await?;
        if saved.id != committed.id || saved.handover_id != committed.handover_id {
            return Err(Error::DataShape(format!(
                "update for task {} returned task {}",
                committed.id, saved.id
            )));
        }
        if !self.records.replace_task(saved.clone()) {
            tracing::warn!(task = saved.id, "acknowledged task vanished from board");
        }
        state.mark_committed(&committed);
        Ok(saved)
    }

    /// Create a task under `handover_id`, then reload the active set.
    pub async fn create_task(
        &mut self,
        backend: &dyn HandoverBackend,
        session: &Session,
        handover_id: HandoverId,
        draft: &TaskDraft,
    ) -> Result<Task> {
        let payload = CreateTaskPayload::from_draft(draft, handover_id)?;
        if self.records.handover(handover_id).is_none() {
            return Err(Error::HandoverNotFound(handover_id));
        }

        let created = backend.create_task(&payload).await?;
        self.load(backend, session, Source::Active).await?;
        Ok(created)
    }
}
