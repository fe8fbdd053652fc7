mod support;

use handover::client::{HandoverBackend, HttpBackend};
use handover::config::BackendConfig;
use handover::create::{CreateTaskPayload, TaskDraft};
use handover::session::Session;
use handover::Error;

use support::MockBackend;

fn backend_at(base_url: String, timeout_secs: u64) -> HttpBackend {
    let config = BackendConfig {
        base_url,
        timeout_secs,
        ..BackendConfig::default()
    };
    HttpBackend::new(config).expect("client")
}

fn session() -> Session {
    Session::new("ops1", "secret").expect("session")
}

#[tokio::test]
async fn fetch_handovers_maps_aliases() {
    let mock = MockBackend::start();
    let client = backend_at(mock.base_url(), 5);

    let records = client.fetch_handovers(&session()).await.expect("fetch");
    assert_eq!(records.handovers.len(), 2);
    assert!(records.orphans.is_empty());

    let platform = records.handover(11).expect("handover 11");
    assert_eq!(platform.team, "Platform");
    assert_eq!(platform.from_shift().name, "Morning Shift");
    let restart = platform.task(1).expect("task 1");
    assert_eq!(restart.acknowledgments[0].description, "restarted");
    assert_eq!(restart.acknowledgments[0].user, "ops3");

    let mq = records.handover(10).expect("handover 10");
    assert_eq!(mq.created_by.name, "Ravi");
    assert_eq!(mq.created_by.id.as_deref(), Some("7"));
}

#[tokio::test]
async fn create_task_reads_wrapped_task() {
    let mock = MockBackend::start();
    let client = backend_at(mock.base_url(), 5);

    let draft = TaskDraft {
        description: "Check DS agent".to_string(),
        ..TaskDraft::default()
    };
    let payload = CreateTaskPayload::from_draft(&draft, 11).expect("payload");
    let task = client.create_task(&payload).await.expect("create");
    assert_eq!(task.id, 3);
    assert_eq!(task.handover_id, 11);
    assert_eq!(task.description, "Check DS agent");
}

#[tokio::test]
async fn fetch_billing_sends_search() {
    let mock = MockBackend::start();
    let client = backend_at(mock.base_url(), 5);

    let records = client
        .fetch_billing(&session(), "priya")
        .await
        .expect("billing");
    assert_eq!(records.len(), 2);
    assert_eq!(records[0].name, "Affan MD");
    assert_eq!(mock.requests.bodies("get_billing")[0]["search"], "priya");
}

#[tokio::test]
async fn slow_backend_times_out() {
    let mock = MockBackend::start();
    let client = backend_at(mock.url("/slow"), 1);

    let err = client
        .fetch_handovers(&session())
        .await
        .expect_err("timeout");
    assert!(matches!(err, Error::Timeout(1)), "got {err:?}");
    assert!(err.is_retryable());
}

#[tokio::test]
async fn error_status_and_bad_shape_are_distinct() {
    let mock = MockBackend::start();

    let err = backend_at(mock.url("/broken"), 5)
        .fetch_handovers(&session())
        .await
        .expect_err("503");
    assert!(matches!(err, Error::Backend { status: 503, .. }));

    let err = backend_at(mock.url("/shape"), 5)
        .fetch_handovers(&session())
        .await
        .expect_err("shape");
    assert!(matches!(err, Error::DataShape(_)));
    assert!(!err.is_retryable());
}

#[tokio::test]
async fn connection_refused_is_network_error() {
    let client = backend_at("http://127.0.0.1:9/shiftHandover".to_string(), 5);
    let err = client
        .fetch_history(&session())
        .await
        .expect_err("refused");
    assert!(matches!(err, Error::Network(_)), "got {err:?}");
}
