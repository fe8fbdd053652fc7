//! handover - Shift Handover Tracking Library
//!
//! This library provides the core functionality for the handover CLI: a
//! typed client for a shift-handover backend plus the pure logic that sits
//! on top of it.
//!
//! # Core Concepts
//!
//! - **Handovers**: Shift-to-shift transfers, each owning a list of tasks
//! - **Tasks**: Units of work with a priority, a status and an
//!   acknowledgment history
//! - **Acknowledgments**: Append-only records of who looked at a task and
//!   what they set its status to
//! - **Reports**: Status/priority histograms and daily counts over a
//!   trailing date range
//!
//! # Module Organization
//!
//! - `model`: Canonical handover, task and acknowledgment types
//! - `normalize`: Free-form status/priority/timestamp normalization
//! - `wire`: Backend payload adapter (field aliases, id coercion)
//! - `aggregate`: Grouping, histograms, derived status and reports
//! - `ack`: Acknowledgment drafts and commits
//! - `create`: Task and handover drafts
//! - `client`: Backend trait and HTTP implementation
//! - `board`: Owner of the fetched record set
//! - `shift`: Shift catalog
//! - `billing`: Attendance/billing lookup
//! - `session`: Backend credentials
//! - `config`: Configuration loading from `.handover.toml`
//! - `error`: Error types and result aliases
//! - `output`: Human and JSON output envelopes
//! - `cli`: Command-line interface using clap

pub mod ack;
pub mod aggregate;
pub mod billing;
pub mod board;
pub mod cli;
pub mod client;
pub mod config;
pub mod create;
pub mod error;
pub mod model;
pub mod normalize;
pub mod output;
pub mod session;
pub mod shift;
pub mod wire;

pub use error::{Error, Result};
