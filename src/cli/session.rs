//! handover session command implementation
//!
//! Provides credential helpers (set/show).

use serde::Serialize;

use crate::cli::Context;
use crate::error::{Error, Result};
use crate::output::{emit_success, HumanOutput};
use crate::session::{persist_session, Session};

#[derive(Serialize)]
struct SessionReport {
    uid: String,
    token: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    path: Option<String>,
}

impl SessionReport {
    fn new(session: &Session, path: Option<String>) -> Self {
        Self {
            uid: session.uid().to_string(),
            token: session.redacted_token(),
            path,
        }
    }
}

pub fn run_set(ctx: &Context) -> Result<()> {
    let (Some(uid), Some(token)) = (ctx.uid.as_deref(), ctx.token.as_deref()) else {
        return Err(Error::InvalidArgument(
            "session set needs both --uid and --token".to_string(),
        ));
    };
    let session = Session::new(uid, token)?;
    let path = persist_session(&ctx.dir, &session)?;

    let report = SessionReport::new(&session, Some(path.display().to_string()));

    let mut human = HumanOutput::new(format!("session set: {}", session.uid()));
    human.push_summary("uid", session.uid());
    human.push_summary("token", report.token.clone());
    human.push_summary("path", path.display().to_string());
    human.push_next_step("handover handover list");

    emit_success(ctx.output, "session set", &report, Some(&human))
}

pub fn run_show(ctx: &Context) -> Result<()> {
    let session = ctx.session()?;
    let report = SessionReport::new(&session, None);

    let mut human = HumanOutput::new(format!("session: {}", session.uid()));
    human.push_summary("uid", session.uid());
    human.push_summary("token", report.token.clone());

    emit_success(ctx.output, "session show", &report, Some(&human))
}
