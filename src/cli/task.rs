//! handover task command implementation
//!
//! Provides task listing, creation and acknowledgment.

use chrono::Utc;
use serde::Serialize;

use crate::ack::{self, AckState};
use crate::board::Source;
use crate::cli::handover::task_line;
use crate::cli::Context;
use crate::create::TaskDraft;
use crate::error::{Error, Result};
use crate::model::{HandoverId, Task, TaskId, TaskStatus};
use crate::output::{emit_success, HumanOutput};

/// Options for `handover task new`
pub struct NewOptions {
    pub handover: HandoverId,
    pub title: String,
    pub description: String,
    pub priority: Option<String>,
    pub status: Option<String>,
}

/// Options for `handover task ack`
pub struct AckOptions {
    pub task_id: TaskId,
    pub handover: Option<HandoverId>,
    pub description: String,
    pub status: Option<String>,
    pub user: Option<String>,
}

#[derive(Serialize)]
struct TaskListReport<'a> {
    total: usize,
    tasks: Vec<&'a Task>,
}

pub async fn run_list(ctx: &Context, handover: Option<HandoverId>) -> Result<()> {
    let loaded = ctx.load_board(Source::Active).await?;
    let records = loaded.board.records();

    let tasks: Vec<&Task> = match handover {
        Some(id) => records
            .handover(id)
            .ok_or(Error::HandoverNotFound(id))?
            .tasks
            .iter()
            .collect(),
        None => records.tasks().collect(),
    };

    let report = TaskListReport {
        total: tasks.len(),
        tasks,
    };

    let header = match handover {
        Some(id) => format!("task list: {} task(s) in handover #{id}", report.total),
        None => format!("task list: {} task(s)", report.total),
    };
    let mut human = HumanOutput::new(header);
    for status in TaskStatus::ALL {
        let count = report.tasks.iter().filter(|task| task.status == status).count();
        human.push_summary(status.label(), count.to_string());
    }
    for task in &report.tasks {
        human.push_detail(task_line(task));
    }
    for warning in &loaded.warnings {
        human.push_warning(warning.clone());
    }

    emit_success(ctx.output, "task list", &report, Some(&human))
}

#[derive(Serialize)]
struct TaskReport<'a> {
    task: &'a Task,
}

pub async fn run_new(ctx: &Context, options: NewOptions) -> Result<()> {
    let draft = TaskDraft {
        title: options.title,
        description: options.description,
        priority: options.priority,
        status: options.status,
    };
    draft.validate()?;

    let mut loaded = ctx.load_board(Source::Active).await?;
    let created = loaded
        .board
        .create_task(&loaded.backend, &loaded.session, options.handover, &draft)
        .await?;

    let report = TaskReport { task: &created };
    let mut human = HumanOutput::new(format!(
        "task new: task {} added to handover #{}",
        created.id, created.handover_id
    ));
    human.push_summary("priority", created.priority.label());
    human.push_summary("status", created.status.label());
    human.push_next_step(format!("handover handover show {}", created.handover_id));

    emit_success(ctx.output, "task new", &report, Some(&human))
}

pub async fn run_ack(ctx: &Context, options: AckOptions) -> Result<()> {
    let target = options
        .status
        .as_deref()
        .map(str::parse::<TaskStatus>)
        .transpose()?;
    ack::validate_description(&options.description)?;

    let mut loaded = ctx.load_board(Source::Active).await?;
    let current = loaded.board.task(options.handover, options.task_id)?;

    let mut state = AckState::default();
    state.begin(current);
    if let Some(draft) = state.draft_mut() {
        draft.set_description(options.description);
        draft.validate_and_advance()?;
        if let Some(status) = target {
            draft.select_status(status)?;
        }
    }

    let user = options
        .user
        .as_deref()
        .map(str::trim)
        .filter(|user| !user.is_empty())
        .unwrap_or_else(|| loaded.session.uid())
        .to_string();

    let saved = loaded
        .board
        .acknowledge(&loaded.backend, options.handover, &mut state, &user, Utc::now())
        .await?;

    let report = TaskReport { task: &saved };
    let mut human = HumanOutput::new(format!(
        "task ack: task {} is {}",
        saved.id,
        saved.status.label()
    ));
    human.push_summary("handover", saved.handover_id.to_string());
    human.push_summary("acknowledged by", user);
    human.push_summary("acknowledgments", saved.acknowledgments.len().to_string());

    emit_success(ctx.output, "task ack", &report, Some(&human))
}
