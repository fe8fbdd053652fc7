//! handover shift command implementation

use chrono::Utc;
use serde::Serialize;

use crate::cli::Context;
use crate::config::Config;
use crate::error::Result;
use crate::output::{emit_success, HumanOutput};
use crate::shift::{Shift, ShiftCatalog};

/// Options for `handover shift add`
pub struct AddOptions {
    pub name: String,
    pub start: String,
    pub end: String,
    pub description: String,
}

#[derive(Serialize)]
struct ShiftListReport<'a> {
    shifts: &'a [Shift],
}

#[derive(Serialize)]
struct ShiftAddReport<'a> {
    shift: &'a Shift,
    path: String,
}

pub fn run_list(ctx: &Context) -> Result<()> {
    let config = ctx.config()?;
    let catalog = ShiftCatalog::new(config.shifts);

    let report = ShiftListReport {
        shifts: catalog.shifts(),
    };

    let mut human = HumanOutput::new(format!("shift list: {} shift(s)", catalog.shifts().len()));
    for shift in catalog.shifts() {
        let mut line = format!("{} {} ({})", shift.id, shift.name, shift.window());
        if !shift.description.is_empty() {
            line.push_str(&format!(": {}", shift.description));
        }
        human.push_detail(line);
    }

    emit_success(ctx.output, "shift list", &report, Some(&human))
}

pub fn run_add(ctx: &Context, options: AddOptions) -> Result<()> {
    let mut config = Config::load_from_dir(&ctx.dir)?;
    let mut catalog = ShiftCatalog::new(std::mem::take(&mut config.shifts));
    let added = catalog
        .add(
            &options.name,
            &options.start,
            &options.end,
            &options.description,
            Utc::now(),
        )?
        .clone();
    config.shifts = catalog.into_shifts();

    let path = Config::path_in(&ctx.dir);
    config.save(&path)?;
    tracing::debug!(path = %path.display(), shift = %added.id, "shift saved");

    let report = ShiftAddReport {
        shift: &added,
        path: path.display().to_string(),
    };

    let mut human = HumanOutput::new(format!("shift add: {}", added.name));
    human.push_summary("id", added.id.clone());
    human.push_summary("window", added.window());
    human.push_summary("path", report.path.clone());
    human.push_next_step("handover shift list");

    emit_success(ctx.output, "shift add", &report, Some(&human))
}
