//! handover list/show/history implementation

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::aggregate::{derived_status, highest_priority, HandoverFilter};
use crate::board::Source;
use crate::cli::Context;
use crate::create::{HandoverDraft, TaskDraft};
use crate::error::{Error, Result};
use crate::model::{Creator, Handover, HandoverId, Priority, ShiftRef, Task, TaskStatus};
use crate::shift::ShiftCatalog;
use crate::normalize::format_timestamp;
use crate::output::{emit_success, HumanOutput};

/// Options for `handover handover draft`
pub struct DraftOptions {
    pub title: String,
    pub from: String,
    pub to: String,
    pub team: String,
    pub description: String,
    pub tasks: Vec<String>,
    pub attachments: Vec<String>,
}

/// Options for `handover handover list`
pub struct ListOptions {
    pub status: Option<String>,
    pub priority: Option<String>,
}

#[derive(Serialize)]
struct HandoverSummary<'a> {
    id: HandoverId,
    title: &'a str,
    team: &'a str,
    from_shift: &'a ShiftRef,
    to_shift: &'a ShiftRef,
    #[serde(skip_serializing_if = "Option::is_none")]
    created_at: Option<DateTime<Utc>>,
    created_by: &'a str,
    status: TaskStatus,
    priority: Priority,
    task_count: usize,
}

impl<'a> From<&'a Handover> for HandoverSummary<'a> {
    fn from(handover: &'a Handover) -> Self {
        Self {
            id: handover.id,
            title: &handover.title,
            team: &handover.team,
            from_shift: handover.from_shift(),
            to_shift: handover.to_shift(),
            created_at: handover.created_at,
            created_by: &handover.created_by.name,
            status: derived_status(&handover.tasks),
            priority: highest_priority(&handover.tasks),
            task_count: handover.tasks.len(),
        }
    }
}

#[derive(Serialize)]
struct ListReport<'a> {
    total: usize,
    handovers: Vec<HandoverSummary<'a>>,
}

pub async fn run_list(ctx: &Context, options: ListOptions) -> Result<()> {
    let filter = HandoverFilter {
        status: options.status.as_deref().map(str::parse::<TaskStatus>).transpose()?,
        priority: options.priority.as_deref().map(str::parse::<Priority>).transpose()?,
    };

    let loaded = ctx.load_board(Source::Active).await?;
    let handovers = &loaded.board.records().handovers;
    let matching = filter.apply(handovers);

    let report = ListReport {
        total: handovers.len(),
        handovers: matching.iter().map(|h| HandoverSummary::from(*h)).collect(),
    };

    let mut human = HumanOutput::new(format!("handover list: {} handover(s)", matching.len()));
    human.push_summary("total", handovers.len().to_string());
    if let Some(status) = filter.status {
        human.push_summary("status", status.label());
    }
    if let Some(priority) = filter.priority {
        human.push_summary("priority", priority.label());
    }
    for summary in &report.handovers {
        human.push_detail(summary_line(summary));
    }
    for warning in &loaded.warnings {
        human.push_warning(warning.clone());
    }
    if let Some(first) = report.handovers.first() {
        human.push_next_step(format!("handover handover show {}", first.id));
    }

    emit_success(ctx.output, "handover list", &report, Some(&human))
}

pub async fn run_history(ctx: &Context) -> Result<()> {
    let loaded = ctx.load_board(Source::History).await?;
    let handovers = &loaded.board.records().handovers;

    let report = ListReport {
        total: handovers.len(),
        handovers: handovers.iter().map(HandoverSummary::from).collect(),
    };

    let mut human = HumanOutput::new(format!(
        "handover history: {} handover(s)",
        handovers.len()
    ));
    for summary in &report.handovers {
        human.push_detail(summary_line(summary));
    }
    for warning in &loaded.warnings {
        human.push_warning(warning.clone());
    }

    emit_success(ctx.output, "handover history", &report, Some(&human))
}

#[derive(Serialize)]
struct ShowReport<'a> {
    #[serde(flatten)]
    summary: HandoverSummary<'a>,
    description: &'a str,
    attachments: &'a [crate::model::Attachment],
    tasks: &'a [Task],
}

pub async fn run_show(ctx: &Context, id: HandoverId) -> Result<()> {
    let loaded = ctx.load_board(Source::Active).await?;
    let handover = loaded
        .board
        .records()
        .handover(id)
        .ok_or(Error::HandoverNotFound(id))?;

    let report = ShowReport {
        summary: HandoverSummary::from(handover),
        description: &handover.description,
        attachments: &handover.attachments,
        tasks: &handover.tasks,
    };

    let mut human = HumanOutput::new(format!("handover #{}: {}", handover.id, handover.title));
    human.push_summary("team", handover.team.clone());
    human.push_summary(
        "shifts",
        format!(
            "{} ({}) -> {} ({})",
            handover.from_shift().name,
            handover.from_shift().time,
            handover.to_shift().name,
            handover.to_shift().time
        ),
    );
    human.push_summary(
        "created",
        handover
            .created_at
            .map(|ts| format_timestamp(&ts))
            .unwrap_or_else(|| "unknown".to_string()),
    );
    human.push_summary("created by", handover.created_by.name.clone());
    human.push_summary("status", report.summary.status.label());
    human.push_summary("priority", report.summary.priority.label());
    if !handover.description.is_empty() {
        human.push_summary("description", handover.description.clone());
    }
    for attachment in &handover.attachments {
        human.push_summary("attachment", format!("{} ({})", attachment.name, attachment.kind));
    }
    for task in &handover.tasks {
        human.push_detail(task_line(task));
    }
    if handover.tasks.is_empty() {
        human.push_next_step(format!("handover task new --handover {id} --title \"...\""));
    } else {
        human.push_next_step(format!(
            "handover task ack <task-id> --handover {id} --description \"...\""
        ));
    }

    emit_success(ctx.output, "handover show", &report, Some(&human))
}

/// Assemble a handover locally from the configured shift catalog and print
/// it. Nothing is sent to the backend.
pub fn run_draft(ctx: &Context, options: DraftOptions) -> Result<()> {
    let catalog = ShiftCatalog::new(ctx.config()?.shifts);
    let shift_ref = |key: &str| {
        catalog
            .find(key)
            .map(|shift| shift.to_ref())
            .ok_or_else(|| Error::InvalidArgument(format!("unknown shift '{key}'")))
    };

    let mut draft = HandoverDraft::new(options.title);
    draft.description = options.description;
    draft.team = options.team;
    draft.from_shift = Some(shift_ref(&options.from)?);
    draft.to_shift = Some(shift_ref(&options.to)?);

    let mut skipped = 0;
    for title in options.tasks {
        if !draft.add_task(TaskDraft::new(title)) {
            skipped += 1;
        }
    }
    for attachment in &options.attachments {
        let (name, mime) = attachment.split_once(':').unwrap_or((attachment.as_str(), ""));
        draft.attach(name.trim(), mime);
    }

    let created_by = match ctx.session() {
        Ok(session) => Creator {
            id: None,
            name: session.uid().to_string(),
        },
        Err(Error::MissingSession) => Creator::default(),
        Err(err) => return Err(err),
    };
    let handover = draft.build(created_by, Utc::now())?;

    let mut human = HumanOutput::new(format!(
        "handover draft: {} ({} task(s), not submitted)",
        handover.title,
        handover.tasks.len()
    ));
    human.push_summary(
        "shifts",
        format!(
            "{} ({}) -> {} ({})",
            handover.from_shift().name,
            handover.from_shift().time,
            handover.to_shift().name,
            handover.to_shift().time
        ),
    );
    human.push_summary("created by", handover.created_by.name.clone());
    for attachment in &handover.attachments {
        human.push_summary("attachment", format!("{} ({})", attachment.name, attachment.kind));
    }
    for task in &handover.tasks {
        human.push_detail(task_line(task));
    }
    if skipped > 0 {
        human.push_warning(format!("{skipped} task(s) without a title were skipped"));
    }

    emit_success(ctx.output, "handover draft", &handover, Some(&human))
}

fn summary_line(summary: &HandoverSummary<'_>) -> String {
    let team = if summary.team.is_empty() {
        String::new()
    } else {
        format!(" [{}]", summary.team)
    };
    format!(
        "#{} {}{} | {} -> {} | {} | {} | {} task(s)",
        summary.id,
        summary.title,
        team,
        summary.from_shift.name,
        summary.to_shift.name,
        summary.status.label(),
        summary.priority.label(),
        summary.task_count
    )
}

pub(crate) fn task_line(task: &Task) -> String {
    let title = if task.title.is_empty() {
        task.description.as_str()
    } else {
        task.title.as_str()
    };
    let mut line = format!(
        "task {} (handover {}): {} | {} | {} | {}",
        task.id,
        task.handover_id,
        title,
        task.priority.label(),
        task.status.label(),
        task.ack_status.as_str()
    );
    if let Some(ack) = task.latest_acknowledgment() {
        line.push_str(&format!(
            " | last ack by {} on {}: {}",
            ack.user,
            format_timestamp(&ack.timestamp),
            ack.description
        ));
    }
    line
}
