#![allow(dead_code)]

use std::fs;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use assert_cmd::Command;
use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::post;
use axum::{Json, Router};
use serde_json::{json, Value};
use tempfile::TempDir;

pub struct TestDir {
    dir: TempDir,
}

impl TestDir {
    pub fn new() -> Self {
        let dir = tempfile::tempdir().expect("failed to create tempdir");
        Self { dir }
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    pub fn write_file(&self, rel_path: &str, contents: &str) -> std::io::Result<PathBuf> {
        let path = self.dir.path().join(rel_path);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&path, contents)?;
        Ok(path)
    }

    pub fn write_config(&self, contents: &str) -> std::io::Result<PathBuf> {
        self.write_file(".handover.toml", contents)
    }

    /// Point the config at `base_url` with a short timeout.
    pub fn use_backend(&self, base_url: &str) -> std::io::Result<PathBuf> {
        self.write_config(&format!(
            "[backend]\nbase_url = \"{base_url}\"\ntimeout_secs = 2\n"
        ))
    }
}

/// The `handover` binary with a clean environment, run inside `dir`.
pub fn handover_cmd(dir: &TestDir) -> Command {
    let mut cmd = Command::cargo_bin("handover").expect("handover binary");
    cmd.current_dir(dir.path())
        .env_remove("HANDOVER_DIR")
        .env_remove("HANDOVER_UID")
        .env_remove("HANDOVER_TOKEN")
        .env_remove("HANDOVER_BACKEND_URL")
        .env_remove("RUST_LOG");
    cmd
}

/// Parse the JSON envelope printed on stdout.
pub fn stdout_json(output: &std::process::Output) -> Value {
    serde_json::from_slice(&output.stdout).expect("stdout is a JSON envelope")
}

/// Request log shared with the mock backend.
#[derive(Clone, Default)]
pub struct Requests {
    inner: Arc<Mutex<Vec<(String, Value)>>>,
}

impl Requests {
    fn push(&self, path: &str, body: Value) {
        self.inner
            .lock()
            .expect("requests lock")
            .push((path.to_string(), body));
    }

    pub fn all(&self) -> Vec<(String, Value)> {
        self.inner.lock().expect("requests lock").clone()
    }

    pub fn bodies(&self, path: &str) -> Vec<Value> {
        self.all()
            .into_iter()
            .filter(|(p, _)| p == path)
            .map(|(_, body)| body)
            .collect()
    }
}

#[derive(Clone)]
struct MockState {
    requests: Requests,
    created: Arc<Mutex<Vec<Value>>>,
}

/// In-process backend on an ephemeral port.
///
/// Routes under `/shiftHandover` behave; `/broken` answers 503, `/slow`
/// sleeps past any short timeout and `/shape` returns a body without record
/// collections.
pub struct MockBackend {
    addr: SocketAddr,
    pub requests: Requests,
}

impl MockBackend {
    pub fn start() -> Self {
        let requests = Requests::default();
        let state = MockState {
            requests: requests.clone(),
            created: Arc::new(Mutex::new(Vec::new())),
        };

        let (tx, rx) = std::sync::mpsc::channel();
        std::thread::spawn(move || {
            let runtime = tokio::runtime::Builder::new_current_thread()
                .enable_all()
                .build()
                .expect("mock runtime");
            runtime.block_on(async move {
                let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
                    .await
                    .expect("bind mock backend");
                tx.send(listener.local_addr().expect("mock addr"))
                    .expect("send mock addr");
                axum::serve(listener, router(state))
                    .await
                    .expect("mock backend");
            });
        });

        let addr = rx.recv().expect("mock backend started");
        Self { addr, requests }
    }

    pub fn url(&self, prefix: &str) -> String {
        format!("http://{}{prefix}", self.addr)
    }

    pub fn base_url(&self) -> String {
        self.url("/shiftHandover")
    }
}

fn router(state: MockState) -> Router {
    let api = Router::new()
        .route("/get_Handover/", post(get_handover))
        .route("/get_history/", post(get_history))
        .route("/create_task/", post(create_task))
        .route("/update_task/", post(update_task))
        .route("/get_billing/", post(get_billing));

    Router::new()
        .nest("/shiftHandover", api)
        .route("/broken/get_Handover/", post(unavailable))
        .route("/slow/get_Handover/", post(slow))
        .route("/shape/get_Handover/", post(wrong_shape))
        .with_state(state)
}

pub fn handover_fixture() -> Value {
    let now = chrono::Utc::now().to_rfc3339();
    json!({
        "handoverRecords": [
            {
                "id": 10,
                "title": "MQ upgradation",
                "teamName": "Middleware",
                "fromShift": { "name": "Night Shift", "time": "22:00 - 07:00" },
                "toShift": { "name": "Morning Shift", "time": "07:00 - 15:00" },
                "createdAt": now,
                "createdBy": { "id": 7, "name": "Ravi" },
                "description": "Queue manager patching"
            },
            {
                "id": "11",
                "title": "DS agent checks",
                "role": "Platform",
                "fromShift": "Morning Shift",
                "toShift": "Afternoon Shift",
                "createdAt": now
            }
        ],
        "taskRecords": [
            {
                "id": 1,
                "handover_id_id": 10,
                "title": "ACE Upgradation",
                "priority": "high",
                "status": "open",
                "acknowledgeStatus": "Pending",
                "createdAt": now
            },
            {
                "id": 2,
                "handover_id_id": 10,
                "title": "Update System Log",
                "priority": "critical",
                "status": "in progress",
                "acknowledgeStatus": "Acknowledged",
                "acknowledgeDetails": [
                    { "id": 1722810000000_i64, "uid": "ops2", "ackDesc": "looking", "timestamp": now }
                ]
            },
            {
                "Taskid": "1",
                "handoverId": "11",
                "title": "Restart DS agent",
                "priority": "low",
                "status": "closed",
                "acknowledgeDetails": [
                    { "acknowledgeDesc": "restarted", "ackBy": "ops3", "ackTime": now }
                ]
            }
        ]
    })
}

async fn get_handover(State(state): State<MockState>, Json(body): Json<Value>) -> Json<Value> {
    state.requests.push("get_Handover", body);
    let mut fixture = handover_fixture();
    let created = state.created.lock().expect("created lock").clone();
    if let Some(tasks) = fixture["taskRecords"].as_array_mut() {
        tasks.extend(created);
    }
    Json(fixture)
}

async fn get_history(State(state): State<MockState>, Json(body): Json<Value>) -> Json<Value> {
    state.requests.push("get_history", body);
    Json(json!({
        "handoverRecords": [
            { "id": 3, "title": "Closed patch window", "teamName": "Middleware" }
        ],
        "taskRecords": [
            { "historyTaskId": 1, "handover_id_id": 3, "title": "Verify", "status": "completed" }
        ]
    }))
}

async fn create_task(State(state): State<MockState>, Json(body): Json<Value>) -> Json<Value> {
    state.requests.push("create_task", body.clone());
    let mut task = body;
    task["id"] = json!(3);
    state.created.lock().expect("created lock").push(task.clone());
    Json(json!({ "task": task }))
}

async fn update_task(State(state): State<MockState>, Json(body): Json<Value>) -> Json<Value> {
    state.requests.push("update_task", body.clone());
    Json(body)
}

async fn get_billing(State(state): State<MockState>, Json(body): Json<Value>) -> Json<Value> {
    state.requests.push("get_billing", body);
    Json(json!({
        "billingRecords": [
            {
                "name": "Affan MD ",
                "team": "team c",
                "date": "2025-09-05",
                "schedule": "WFO-N",
                "attendance": { "department": "xyz", "first_in": "10:30:00", "out_of_office_count": 0 }
            },
            { "name": "Priya K", "team": "team a", "date": "2025-09-05", "schedule": "WO" }
        ]
    }))
}

async fn unavailable(State(state): State<MockState>, Json(body): Json<Value>) -> StatusCode {
    state.requests.push("broken", body);
    StatusCode::SERVICE_UNAVAILABLE
}

async fn slow(State(state): State<MockState>, Json(body): Json<Value>) -> Json<Value> {
    state.requests.push("slow", body);
    tokio::time::sleep(Duration::from_secs(5)).await;
    Json(handover_fixture())
}

async fn wrong_shape(State(state): State<MockState>, Json(body): Json<Value>) -> Json<Value> {
    state.requests.push("shape", body);
    Json(json!({ "rows": [] }))
}
