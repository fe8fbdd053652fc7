//! Command-line interface for handover
//!
//! This module defines the CLI structure using clap derive macros.
//! Each command group is implemented in its own submodule.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use crate::board::{Board, LoadOutcome, Source};
use crate::client::HttpBackend;
use crate::config::Config;
use crate::error::Result;
use crate::output::OutputOptions;
use crate::session::{resolve_session, Session};

mod billing;
mod handover;
mod report;
mod session;
mod shift;
mod task;

/// handover - shift handover tracking
///
/// Lists handovers and their tasks, records acknowledgments, creates tasks,
/// and summarizes activity over a trailing date range.
#[derive(Parser, Debug)]
#[command(name = "handover")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Working directory holding .handover.toml (defaults to current directory)
    #[arg(long, global = true, env = "HANDOVER_DIR")]
    pub dir: Option<PathBuf>,

    /// Backend user id
    #[arg(long, global = true, env = "HANDOVER_UID")]
    pub uid: Option<String>,

    /// Backend password or token
    #[arg(long, global = true, env = "HANDOVER_TOKEN", hide_env_values = true)]
    pub token: Option<String>,

    /// Override backend.base_url from the config file
    #[arg(long, global = true, env = "HANDOVER_BACKEND_URL")]
    pub backend_url: Option<String>,

    /// Output in JSON format
    #[arg(long, global = true)]
    pub json: bool,

    /// Suppress non-essential output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    #[command(subcommand)]
    pub command: Commands,
}

/// Available subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Browse handovers
    #[command(subcommand)]
    Handover(HandoverCommands),

    /// Task listing, creation and acknowledgment
    #[command(subcommand)]
    Task(TaskCommands),

    /// Status, priority and daily activity over a date range
    Report {
        /// Trailing range in days: 7, 30, 90 or all
        #[arg(long)]
        range: Option<String>,
    },

    /// Attendance and billing lookup
    Billing {
        /// Name or ADID to search for
        #[arg(long)]
        search: String,

        /// First day to include (YYYY-MM-DD)
        #[arg(long)]
        from: Option<String>,

        /// Last day to include (YYYY-MM-DD)
        #[arg(long)]
        to: Option<String>,

        /// Read records from a JSON export instead of the backend
        #[arg(long)]
        file: Option<PathBuf>,
    },

    /// Shift catalog
    #[command(subcommand)]
    Shift(ShiftCommands),

    /// Stored backend credentials
    #[command(subcommand)]
    Session(SessionCommands),
}

#[derive(Subcommand, Debug)]
pub enum HandoverCommands {
    /// List active handovers
    List {
        /// Filter by derived status (pending, in-progress, completed)
        #[arg(long)]
        status: Option<String>,

        /// Filter by highest task priority (low, medium, high, critical)
        #[arg(long)]
        priority: Option<String>,
    },

    /// Show one handover with its tasks
    Show {
        /// Handover id
        id: i64,
    },

    /// List closed handovers
    History,

    /// Assemble a handover locally and preview it
    Draft {
        #[arg(long)]
        title: String,

        /// Outgoing shift (id or name)
        #[arg(long)]
        from: String,

        /// Incoming shift (id or name)
        #[arg(long)]
        to: String,

        #[arg(long, default_value = "")]
        team: String,

        #[arg(long, default_value = "")]
        description: String,

        /// Task title; repeat for more tasks
        #[arg(long = "task")]
        tasks: Vec<String>,

        /// Attachment as NAME or NAME:MIME; repeatable
        #[arg(long = "attach")]
        attachments: Vec<String>,
    },
}

#[derive(Subcommand, Debug)]
pub enum TaskCommands {
    /// List tasks, optionally for one handover
    List {
        /// Handover id
        #[arg(long)]
        handover: Option<i64>,
    },

    /// Add a task to a handover
    New {
        /// Handover id
        #[arg(long)]
        handover: i64,

        #[arg(long, default_value = "")]
        title: String,

        #[arg(long, default_value = "")]
        description: String,

        /// low, medium, high or critical (default medium)
        #[arg(long)]
        priority: Option<String>,

        /// open, in progress or completed (default open)
        #[arg(long)]
        status: Option<String>,
    },

    /// Acknowledge a task
    Ack {
        /// Task id
        task_id: i64,

        /// Handover id, when task ids repeat across handovers
        #[arg(long)]
        handover: Option<i64>,

        /// What was done or observed
        #[arg(long)]
        description: String,

        /// New status: open, in progress or completed (defaults to current)
        #[arg(long)]
        status: Option<String>,

        /// Acknowledging user (defaults to the session uid)
        #[arg(long)]
        user: Option<String>,
    },
}

#[derive(Subcommand, Debug)]
pub enum ShiftCommands {
    /// List configured shifts
    List,

    /// Add a shift to .handover.toml
    Add {
        #[arg(long)]
        name: String,

        /// Start time (HH:MM)
        #[arg(long)]
        start: String,

        /// End time (HH:MM)
        #[arg(long)]
        end: String,

        #[arg(long, default_value = "")]
        description: String,
    },
}

#[derive(Subcommand, Debug)]
pub enum SessionCommands {
    /// Store --uid and --token in .handover/session.toml
    Set,

    /// Show the resolved session (token redacted)
    Show,
}

/// Values shared by every command.
#[derive(Debug, Clone)]
pub(crate) struct Context {
    pub dir: PathBuf,
    pub uid: Option<String>,
    pub token: Option<String>,
    pub backend_url: Option<String>,
    pub output: OutputOptions,
}

impl Context {
    pub fn config(&self) -> Result<Config> {
        let mut config = Config::load_from_dir(&self.dir)?;
        if let Some(url) = self.backend_url.as_deref().map(str::trim) {
            if !url.is_empty() {
                config.backend.base_url = url.to_string();
            }
        }
        Ok(config)
    }

    pub fn session(&self) -> Result<Session> {
        resolve_session(&self.dir, self.uid.as_deref(), self.token.as_deref())
    }

    pub fn backend(&self) -> Result<HttpBackend> {
        HttpBackend::new(self.config()?.backend)
    }

    /// Resolve credentials and load a board from `source`.
    pub async fn load_board(&self, source: Source) -> Result<Loaded> {
        let session = self.session()?;
        let backend = self.backend()?;
        let mut board = Board::new();
        let mut warnings = Vec::new();
        if board.load(&backend, &session, source).await? == LoadOutcome::Emptied {
            warnings.push("backend response was malformed; showing no records".to_string());
        }
        let orphans = board.records().orphans.len();
        if orphans > 0 {
            warnings.push(format!("{orphans} task(s) reference unknown handovers"));
        }
        Ok(Loaded {
            backend,
            session,
            board,
            warnings,
        })
    }
}

/// A board loaded for one command, with what it was loaded through.
pub(crate) struct Loaded {
    pub backend: HttpBackend,
    pub session: Session,
    pub board: Board,
    pub warnings: Vec<String>,
}

impl Cli {
    /// Execute the CLI command
    pub async fn run(self) -> Result<()> {
        let dir = self
            .dir
            .clone()
            .unwrap_or_else(|| std::env::current_dir().unwrap_or_else(|_| PathBuf::from(".")));
        let ctx = Context {
            dir,
            uid: self.uid,
            token: self.token,
            backend_url: self.backend_url,
            output: OutputOptions {
                json: self.json,
                quiet: self.quiet,
            },
        };

        match self.command {
            Commands::Handover(cmd) => match cmd {
                HandoverCommands::List { status, priority } => {
                    handover::run_list(&ctx, handover::ListOptions { status, priority }).await
                }
                HandoverCommands::Show { id } => handover::run_show(&ctx, id).await,
                HandoverCommands::History => handover::run_history(&ctx).await,
                HandoverCommands::Draft {
                    title,
                    from,
                    to,
                    team,
                    description,
                    tasks,
                    attachments,
                } => handover::run_draft(
                    &ctx,
                    handover::DraftOptions {
                        title,
                        from,
                        to,
                        team,
                        description,
                        tasks,
                        attachments,
                    },
                ),
            },
            Commands::Task(cmd) => match cmd {
                TaskCommands::List { handover } => task::run_list(&ctx, handover).await,
                TaskCommands::New {
                    handover,
                    title,
                    description,
                    priority,
                    status,
                } => {
                    task::run_new(
                        &ctx,
                        task::NewOptions {
                            handover,
                            title,
                            description,
                            priority,
                            status,
                        },
                    )
                    .await
                }
                TaskCommands::Ack {
                    task_id,
                    handover,
                    description,
                    status,
                    user,
                } => {
                    task::run_ack(
                        &ctx,
                        task::AckOptions {
                            task_id,
                            handover,
                            description,
                            status,
                            user,
                        },
                    )
                    .await
                }
            },
            Commands::Report { range } => report::run(&ctx, range).await,
            Commands::Billing {
                search,
                from,
                to,
                file,
            } => {
                billing::run(
                    &ctx,
                    billing::BillingOptions {
                        search,
                        from,
                        to,
                        file,
                    },
                )
                .await
            }
            Commands::Shift(cmd) => match cmd {
                ShiftCommands::List => shift::run_list(&ctx),
                ShiftCommands::Add {
                    name,
                    start,
                    end,
                    description,
                } => shift::run_add(
                    &ctx,
                    shift::AddOptions {
                        name,
                        start,
                        end,
                        description,
                    },
                ),
            },
            Commands::Session(cmd) => match cmd {
                SessionCommands::Set => session::run_set(&ctx),
                SessionCommands::Show => session::run_show(&ctx),
            },
        }
    }
}
