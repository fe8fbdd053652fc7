//! handover report command implementation

use chrono::Local;

use crate::aggregate::{build_report, Bucket, DateRange, Histogram};
use crate::board::Source;
use crate::cli::Context;
use crate::error::Result;
use crate::output::{emit_success, HumanOutput};

pub async fn run(ctx: &Context, range: Option<String>) -> Result<()> {
    let range: DateRange = match range {
        Some(raw) => raw.parse()?,
        None => ctx.config()?.reports.range()?,
    };
    let loaded = ctx.load_board(Source::Active).await?;

    let now = Local::now();
    let report = build_report(&loaded.board.records().handovers, range, &now);

    let mut human = HumanOutput::new(format!("report: {}", range.label()));
    human.push_summary("handovers", report.total_handovers.to_string());
    human.push_summary("tasks", report.total_tasks.to_string());
    human.push_summary("task status", histogram_line(&report.task_status));
    human.push_summary("task priority", histogram_line(&report.task_priority));
    human.push_summary("handover status", histogram_line(&report.handover_status));
    human.push_summary("handover priority", histogram_line(&report.handover_priority));
    for day in &report.daily {
        human.push_detail(format!(
            "{} {}: {}",
            day.label,
            day.date.format("%Y-%m-%d"),
            day.count
        ));
    }
    for warning in &loaded.warnings {
        human.push_warning(warning.clone());
    }

    emit_success(ctx.output, "report", &report, Some(&human))
}

fn histogram_line<K: Bucket>(histogram: &Histogram<K>) -> String {
    histogram
        .iter()
        .map(|bucket| format!("{} {}", bucket.label, bucket.count))
        .collect::<Vec<_>>()
        .join(", ")
}
