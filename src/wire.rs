//! Backend payload adapter.
//!
//! The `get_Handover` response is the reference contract:
//!
//! ```json
//! { "handoverRecords": [ { "id": 10, "teamName": "...", "fromShift": {...}, ... } ],
//!   "taskRecords":     [ { "id": 1, "handover_id_id": 10, "acknowledgeStatus": "Pending",
//!                          "acknowledgeDetails": [ { "id": 1722810000000, "ackDesc": "..." } ] } ] }
//! ```
//!
//! Older payload variants spell a few fields differently (`role`, `Taskid`,
//! `historyTaskId`, `acknowledgeDesc`). They are accepted here as aliases and
//! nothing outside this module sees them. Outgoing payloads always use the
//! reference names.

use std::collections::BTreeMap;
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::aggregate::group_tasks_by_handover;
use crate::create::next_task_id;
use crate::error::{Error, Result};
use crate::model::{
    AckStatus, Acknowledgment, Attachment, Creator, Handover, HandoverId, ShiftRef, Task, TaskId,
};
use crate::normalize::{normalize_priority, normalize_status, parse_timestamp};
use crate::session::Session;

const HANDOVER_RECORDS: &str = "handoverRecords";
const TASK_RECORDS: &str = "taskRecords";

/// Identifier that may arrive as a JSON number or a numeric string.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
enum FlexId {
    Num(i64),
    Text(String),
}

impl FlexId {
    fn value(&self) -> Option<i64> {
        match self {
            FlexId::Num(n) => Some(*n),
            FlexId::Text(s) => s.trim().parse().ok(),
        }
    }
}

fn flex(id: &Option<FlexId>) -> Option<i64> {
    id.as_ref().and_then(FlexId::value)
}

#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
enum RawShift {
    Name(String),
    Detailed {
        #[serde(default)]
        name: Option<String>,
        #[serde(default)]
        time: Option<String>,
        #[serde(default, rename = "startTime")]
        start_time: Option<String>,
        #[serde(default, rename = "endTime")]
        end_time: Option<String>,
    },
}

impl RawShift {
    fn into_ref(self) -> ShiftRef {
        match self {
            RawShift::Name(name) => ShiftRef {
                name,
                time: String::new(),
            },
            RawShift::Detailed {
                name,
                time,
                start_time,
                end_time,
            } => {
                let time = match (time, start_time, end_time) {
                    (Some(time), _, _) => time,
                    (None, Some(start), Some(end)) => format!("{start} - {end}"),
                    _ => String::new(),
                };
                ShiftRef {
                    name: name.unwrap_or_default(),
                    time,
                }
            }
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
enum RawCreator {
    Name(String),
    Detailed {
        #[serde(default)]
        id: Option<FlexId>,
        #[serde(default)]
        name: Option<String>,
    },
}

impl RawCreator {
    fn into_creator(self) -> Creator {
        match self {
            RawCreator::Name(name) => Creator { id: None, name },
            RawCreator::Detailed { id, name } => Creator {
                id: id.map(|id| match id {
                    FlexId::Num(n) => n.to_string(),
                    FlexId::Text(s) => s,
                }),
                name: name.unwrap_or_else(|| Creator::default().name),
            },
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
struct RawAttachment {
    #[serde(default)]
    name: Option<String>,
    #[serde(default, rename = "type")]
    kind: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
struct RawAck {
    #[serde(default, alias = "ackId")]
    id: Option<FlexId>,
    #[serde(default, alias = "uid", alias = "ackBy")]
    user: Option<String>,
    #[serde(default, rename = "ackDesc", alias = "acknowledgeDesc")]
    description: Option<String>,
    #[serde(default, alias = "ackTime")]
    timestamp: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
struct RawTask {
    #[serde(default, alias = "Taskid", alias = "historyTaskId")]
    id: Option<FlexId>,
    #[serde(default, rename = "handover_id_id", alias = "handoverId")]
    handover_id: Option<FlexId>,
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    description: Option<String>,
    #[serde(default)]
    priority: Option<String>,
    #[serde(default)]
    status: Option<String>,
    #[serde(default, rename = "acknowledgeStatus")]
    ack_status: Option<String>,
    #[serde(default, rename = "createdAt", alias = "created_at")]
    created_at: Option<String>,
    #[serde(default, rename = "lastUpdated", alias = "lastStatusUpdate")]
    last_updated: Option<String>,
    #[serde(default, rename = "acknowledgeDetails")]
    acknowledgments: Option<Vec<RawAck>>,
}

#[derive(Debug, Clone, Deserialize)]
struct RawHandover {
    #[serde(default)]
    id: Option<FlexId>,
    #[serde(default)]
    title: Option<String>,
    #[serde(default, rename = "teamName", alias = "role")]
    team: Option<String>,
    #[serde(default, rename = "fromShift")]
    from_shift: Option<RawShift>,
    #[serde(default, rename = "toShift")]
    to_shift: Option<RawShift>,
    #[serde(default, rename = "createdAt", alias = "created_at")]
    created_at: Option<String>,
    #[serde(default, rename = "createdBy")]
    created_by: Option<RawCreator>,
    #[serde(default)]
    description: Option<String>,
    #[serde(default)]
    attachments: Option<Vec<RawAttachment>>,
    #[serde(default)]
    tasks: Option<Vec<RawTask>>,
}

fn timestamp(raw: Option<&str>) -> Option<DateTime<Utc>> {
    raw.and_then(parse_timestamp)
}

fn ack_status(raw: Option<&str>) -> AckStatus {
    match raw.map(|value| value.trim().to_ascii_lowercase()) {
        Some(value) if value == "acknowledged" => AckStatus::Acknowledged,
        _ => AckStatus::Pending,
    }
}

impl RawAck {
    fn into_ack(self, fallback_id: i64) -> Acknowledgment {
        let timestamp = timestamp(self.timestamp.as_deref());
        let id = flex(&self.id)
            .or_else(|| timestamp.map(|ts| ts.timestamp_millis()))
            .unwrap_or(fallback_id);
        Acknowledgment {
            id,
            user: self.user.unwrap_or_default(),
            description: self.description.unwrap_or_default(),
            timestamp: timestamp.unwrap_or(DateTime::<Utc>::UNIX_EPOCH),
        }
    }
}

impl RawTask {
    fn into_task(self, id: i64, handover_id: HandoverId) -> Task {
        let acknowledgments = self
            .acknowledgments
            .unwrap_or_default()
            .into_iter()
            .enumerate()
            .map(|(idx, ack)| ack.into_ack(idx as i64 + 1))
            .collect();
        Task {
            id,
            handover_id,
            title: self.title.unwrap_or_default(),
            description: self.description.unwrap_or_default(),
            priority: normalize_priority(self.priority.as_deref()),
            status: normalize_status(self.status.as_deref()),
            ack_status: ack_status(self.ack_status.as_deref()),
            created_at: timestamp(self.created_at.as_deref()),
            status_updated_at: timestamp(self.last_updated.as_deref()),
            acknowledgments,
        }
    }
}

impl RawHandover {
    fn into_handover(self, id: HandoverId) -> Handover {
        let from = self.from_shift.map(RawShift::into_ref).unwrap_or_default();
        let to = self.to_shift.map(RawShift::into_ref).unwrap_or_default();
        let mut handover = Handover::new(id, from, to);
        handover.title = self
            .title
            .unwrap_or_else(|| "Untitled Handover".to_string());
        handover.team = self.team.unwrap_or_default();
        handover.created_at = timestamp(self.created_at.as_deref());
        handover.created_by = self
            .created_by
            .map(RawCreator::into_creator)
            .unwrap_or_default();
        handover.description = self.description.unwrap_or_default();
        handover.attachments = self
            .attachments
            .unwrap_or_default()
            .into_iter()
            .map(|raw| Attachment {
                name: raw.name.unwrap_or_default(),
                kind: raw.kind.unwrap_or_else(|| "file".to_string()),
            })
            .collect();

        // Embedded tasks belong to this handover regardless of their own key;
        // ones without an id are numbered after the highest known id.
        for raw in self.tasks.unwrap_or_default() {
            let task_id = match flex(&raw.id) {
                Some(task_id) => task_id,
                None => next_task_id(&handover.tasks),
            };
            let task = raw.into_task(task_id, id);
            handover.tasks.push(task);
        }
        handover
    }
}

/// Canonical view of one `fetch handovers`/`fetch history` response.
#[derive(Debug, Clone, Default, Serialize)]
pub struct RecordSet {
    pub handovers: Vec<Handover>,
    /// Tasks whose handover is not part of the response.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub orphans: Vec<Task>,
}

impl RecordSet {
    pub fn handover(&self, id: HandoverId) -> Option<&Handover> {
        self.handovers.iter().find(|handover| handover.id == id)
    }

    pub fn tasks(&self) -> impl Iterator<Item = &Task> {
        self.handovers.iter().flat_map(|handover| handover.tasks.iter())
    }

    /// Every task carrying `id`; ids restart per handover.
    pub fn tasks_with_id(&self, id: TaskId) -> impl Iterator<Item = &Task> {
        self.tasks().filter(move |task| task.id == id)
    }

    pub fn is_empty(&self) -> bool {
        self.handovers.is_empty() && self.orphans.is_empty()
    }

    /// Swap in an updated task, keyed by id and handover. Returns whether a
    /// task was replaced.
    pub fn replace_task(&mut self, updated: Task) -> bool {
        for handover in &mut self.handovers {
            if handover.id != updated.handover_id {
                continue;
            }
            if let Some(slot) = handover.tasks.iter_mut().find(|task| task.id == updated.id) {
                *slot = updated;
                return true;
            }
        }
        false
    }
}

fn records(body: &Value, key: &str) -> Result<Vec<Value>> {
    match body.get(key) {
        Some(Value::Array(items)) => Ok(items.clone()),
        Some(Value::Null) | None => Err(Error::DataShape(format!("missing '{key}' collection"))),
        Some(_) => Err(Error::DataShape(format!("'{key}' is not a list"))),
    }
}

/// Build the canonical record set from a handover/history response body.
///
/// A body without both record collections is a [`Error::DataShape`].
/// Individual records that cannot be read (or lack an id) are skipped.
pub fn parse_record_set(body: &Value) -> Result<RecordSet> {
    let raw_handovers = records(body, HANDOVER_RECORDS)?;
    let raw_tasks = records(body, TASK_RECORDS)?;

    let mut handovers: Vec<Handover> = Vec::with_capacity(raw_handovers.len());
    for value in raw_handovers {
        let raw: RawHandover = match serde_json::from_value(value) {
            Ok(raw) => raw,
            Err(err) => {
                tracing::warn!(error = %err, "skipping unreadable handover record");
                continue;
            }
        };
        let Some(id) = flex(&raw.id) else {
            tracing::warn!("skipping handover record without id");
            continue;
        };
        handovers.push(raw.into_handover(id));
    }

    let mut tasks: Vec<Task> = Vec::with_capacity(raw_tasks.len());
    for value in raw_tasks {
        let raw: RawTask = match serde_json::from_value(value) {
            Ok(raw) => raw,
            Err(err) => {
                tracing::warn!(error = %err, "skipping unreadable task record");
                continue;
            }
        };
        let (Some(id), Some(handover_id)) = (flex(&raw.id), flex(&raw.handover_id)) else {
            tracing::warn!("skipping task record without id or handover id");
            continue;
        };
        tasks.push(raw.into_task(id, handover_id));
    }

    let mut grouped: BTreeMap<HandoverId, Vec<Task>> = group_tasks_by_handover(tasks);
    for handover in &mut handovers {
        if let Some(group) = grouped.remove(&handover.id) {
            handover.tasks.extend(group);
        }
    }
    let orphans: Vec<Task> = grouped.into_values().flatten().collect();
    if !orphans.is_empty() {
        tracing::warn!(count = orphans.len(), "tasks reference unknown handovers");
    }

    Ok(RecordSet { handovers, orphans })
}

/// Read a single task returned by `create task`/`update task`. Accepts the
/// bare task object or one wrapped as `{"task": {...}}`.
pub fn parse_task(body: &Value) -> Result<Task> {
    let value = body.get("task").unwrap_or(body);
    let raw: RawTask = serde_json::from_value(value.clone())
        .map_err(|err| Error::DataShape(format!("unreadable task: {err}")))?;
    let id = flex(&raw.id).ok_or_else(|| Error::DataShape("task without id".to_string()))?;
    let handover_id = flex(&raw.handover_id)
        .ok_or_else(|| Error::DataShape("task without handover_id_id".to_string()))?;
    Ok(raw.into_task(id, handover_id))
}

/// Credentials body for the bulk fetch endpoints.
#[derive(Clone, Serialize)]
pub struct CredentialsPayload<'a> {
    pub uid: &'a str,
    pub password: &'a str,
}

impl<'a> From<&'a Session> for CredentialsPayload<'a> {
    fn from(session: &'a Session) -> Self {
        Self {
            uid: session.uid(),
            password: session.token(),
        }
    }
}

impl fmt::Debug for CredentialsPayload<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CredentialsPayload")
            .field("uid", &self.uid)
            .field("password", &"****")
            .finish()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WireAck {
    pub id: i64,
    pub uid: String,
    #[serde(rename = "ackDesc")]
    pub description: String,
    pub timestamp: DateTime<Utc>,
}

/// Body of the backend `update task` call: the full task in reference
/// naming plus the latest acknowledgment text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UpdateTaskPayload {
    pub id: i64,
    pub handover_id_id: HandoverId,
    pub title: String,
    pub description: String,
    pub priority: String,
    pub status: String,
    #[serde(rename = "acknowledgeStatus")]
    pub ack_status: String,
    #[serde(rename = "ackDesc", skip_serializing_if = "Option::is_none")]
    pub ack_description: Option<String>,
    #[serde(rename = "createdAt", skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(rename = "lastUpdated", skip_serializing_if = "Option::is_none")]
    pub last_updated: Option<DateTime<Utc>>,
    #[serde(rename = "acknowledgeDetails")]
    pub acknowledgments: Vec<WireAck>,
}

impl From<&Task> for UpdateTaskPayload {
    fn from(task: &Task) -> Self {
        Self {
            id: task.id,
            handover_id_id: task.handover_id,
            title: task.title.clone(),
            description: task.description.clone(),
            priority: task.priority.label().to_string(),
            status: task.status.ack_label().to_string(),
            ack_status: task.ack_status.as_str().to_string(),
            ack_description: task
                .latest_acknowledgment()
                .map(|ack| ack.description.clone()),
            created_at: task.created_at,
            last_updated: task.status_updated_at,
            acknowledgments: task
                .acknowledgments
                .iter()
                .map(|ack| WireAck {
                    id: ack.id,
                    uid: ack.user.clone(),
                    description: ack.description.clone(),
                    timestamp: ack.timestamp,
                })
                .collect(),
        }
    }
}
