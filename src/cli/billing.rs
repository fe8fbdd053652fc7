//! handover billing command implementation

use std::path::PathBuf;

use serde::Serialize;

use crate::billing::{load_billing_file, parse_date, BillingQuery, BillingRecord};
use crate::cli::Context;
use crate::client::HandoverBackend;
use crate::error::Result;
use crate::output::{emit_success, HumanOutput};

/// Options for `handover billing`
pub struct BillingOptions {
    pub search: String,
    pub from: Option<String>,
    pub to: Option<String>,
    pub file: Option<PathBuf>,
}

#[derive(Serialize)]
struct BillingReport<'a> {
    search: &'a str,
    source: String,
    total: usize,
    records: Vec<&'a BillingRecord>,
}

pub async fn run(ctx: &Context, options: BillingOptions) -> Result<()> {
    let from = options.from.as_deref().map(parse_date).transpose()?;
    let to = options.to.as_deref().map(parse_date).transpose()?;
    let query = BillingQuery::new(&options.search, from, to)?;

    let (records, source) = match &options.file {
        Some(path) => (load_billing_file(path)?, path.display().to_string()),
        None => {
            let session = ctx.session()?;
            let backend = ctx.backend()?;
            let records = backend.fetch_billing(&session, query.search()).await?;
            (records, "backend".to_string())
        }
    };

    let matching = if options.file.is_some() {
        query.apply(&records)
    } else {
        query.apply_window(&records)
    };
    let report = BillingReport {
        search: query.search(),
        source,
        total: records.len(),
        records: matching,
    };

    let mut human = HumanOutput::new(format!(
        "billing: {} record(s) for '{}'",
        report.records.len(),
        query.search()
    ));
    human.push_summary("source", report.source.clone());
    if let Some(from) = query.from {
        human.push_summary("from", from.to_string());
    }
    if let Some(to) = query.to {
        human.push_summary("to", to.to_string());
    }
    for record in &report.records {
        let [department, first_in, last_out, gross, net, ooo_time, ooo_count] =
            record.attendance.cells();
        human.push_detail(format!(
            "{} {} [{}] {} | dept {department} | in {first_in} | out {last_out} | gross {gross} | net {net} | away {ooo_time} ({ooo_count})",
            record.date, record.name, record.team, record.schedule
        ));
    }
    if report.records.is_empty() {
        human.push_warning("no records match the search and date range".to_string());
    }

    emit_success(ctx.output, "billing", &report, Some(&human))
}
