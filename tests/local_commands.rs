mod support;

use std::fs;

use predicates::prelude::PredicateBooleanExt;
use predicates::str::contains;

use support::{handover_cmd, stdout_json, TestDir};

const BILLING: &str = r#"[
  { "name": "Affan MD ", "team": "team c", "date": "2025-09-01", "schedule": "WFO-G",
    "attendance": { "department": null, "first_in": null, "last_out": null } },
  { "name": "Affan MD", "team": "team c", "date": "2025-09-05", "schedule": "WFO-N",
    "attendance": { "department": "xyz", "first_in": "10:30:00", "last_out": "06:30:00",
                    "gross_time": "08:00:00", "net_office_time": "08:00:00",
                    "out_of_office_time": "00:00:00", "out_of_office_count": 0 } },
  { "name": "Priya K", "team": "team a", "date": "2025-09-03", "schedule": "PL" }
]"#;

#[test]
fn shift_list_shows_default_catalog() -> Result<(), Box<dyn std::error::Error>> {
    let dir = TestDir::new();

    handover_cmd(&dir)
        .args(["shift", "list"])
        .assert()
        .success()
        .stdout(contains("Morning Shift (07:00 - 15:00)"))
        .stdout(contains("Night Shift (22:00 - 07:00)"));

    Ok(())
}

#[test]
fn shift_add_persists_to_config() -> Result<(), Box<dyn std::error::Error>> {
    let dir = TestDir::new();

    handover_cmd(&dir)
        .args([
            "shift",
            "add",
            "--name",
            "Weekend Shift",
            "--start",
            "08:00",
            "--end",
            "20:00",
        ])
        .assert()
        .success()
        .stdout(contains("shift add: Weekend Shift"));

    let config = fs::read_to_string(dir.path().join(".handover.toml"))?;
    assert!(config.contains("Weekend Shift"));

    let output = handover_cmd(&dir).args(["--json", "shift", "list"]).output()?;
    assert!(output.status.success());
    let json = stdout_json(&output);
    assert_eq!(json["schema_version"], "handover.v1");
    assert_eq!(json["command"], "shift list");
    assert_eq!(json["data"]["shifts"].as_array().map(Vec::len), Some(4));

    handover_cmd(&dir)
        .args([
            "shift",
            "add",
            "--name",
            "weekend shift",
            "--start",
            "08:00",
            "--end",
            "20:00",
        ])
        .assert()
        .code(2)
        .stderr(contains("already exists"));

    Ok(())
}

#[test]
fn shift_add_rejects_bad_time() -> Result<(), Box<dyn std::error::Error>> {
    let dir = TestDir::new();

    handover_cmd(&dir)
        .args(["shift", "add", "--name", "Late", "--start", "8pm", "--end", "20:00"])
        .assert()
        .code(2)
        .stderr(contains("HH:MM"));

    assert!(!dir.path().join(".handover.toml").exists());
    Ok(())
}

#[test]
fn session_set_persists_and_show_redacts() -> Result<(), Box<dyn std::error::Error>> {
    let dir = TestDir::new();

    handover_cmd(&dir)
        .args(["--uid", "ops1", "--token", "hunter22", "session", "set"])
        .assert()
        .success()
        .stdout(contains("session set: ops1"));

    let stored = fs::read_to_string(dir.path().join(".handover").join("session.toml"))?;
    assert!(stored.contains("ops1"));

    handover_cmd(&dir)
        .args(["session", "show"])
        .assert()
        .success()
        .stdout(contains("ops1").and(contains("****22")).and(contains("hunter22").not()));

    handover_cmd(&dir)
        .env("HANDOVER_UID", "env-user")
        .env("HANDOVER_TOKEN", "env-token")
        .args(["session", "show"])
        .assert()
        .success()
        .stdout(contains("env-user"));

    Ok(())
}

#[test]
fn session_show_without_credentials_fails() -> Result<(), Box<dyn std::error::Error>> {
    let dir = TestDir::new();

    let output = handover_cmd(&dir).args(["--json", "session", "show"]).output()?;
    assert_eq!(output.status.code(), Some(2));
    let json = stdout_json(&output);
    assert_eq!(json["status"], "error");
    assert_eq!(json["command"], "session show");
    assert_eq!(json["error"]["kind"], "user_error");
    assert_eq!(json["error"]["retryable"], false);
    assert!(json["warnings"].as_array().is_some_and(Vec::is_empty));
    assert!(json["next_steps"][0]
        .as_str()
        .unwrap_or_default()
        .contains("session set"));

    handover_cmd(&dir)
        .args(["--uid", "ops1", "session", "set"])
        .assert()
        .code(2);

    Ok(())
}

#[test]
fn billing_from_file_filters_inclusively() -> Result<(), Box<dyn std::error::Error>> {
    let dir = TestDir::new();
    dir.write_file("billing.json", BILLING)?;

    let output = handover_cmd(&dir)
        .args([
            "--json",
            "billing",
            "--search",
            "affan",
            "--from",
            "2025-09-01",
            "--to",
            "2025-09-05",
            "--file",
            "billing.json",
        ])
        .output()?;
    assert!(output.status.success());
    let json = stdout_json(&output);
    assert_eq!(json["data"]["total"], 3);
    assert_eq!(json["data"]["records"].as_array().map(Vec::len), Some(2));

    handover_cmd(&dir)
        .args([
            "billing",
            "--search",
            "affan",
            "--from",
            "2025-09-02",
            "--file",
            "billing.json",
        ])
        .assert()
        .success()
        .stdout(contains("billing: 1 record(s)"))
        .stdout(contains("dept xyz"));

    Ok(())
}

#[test]
fn billing_validates_input() -> Result<(), Box<dyn std::error::Error>> {
    let dir = TestDir::new();
    dir.write_file("billing.json", BILLING)?;

    handover_cmd(&dir)
        .args(["billing", "--search", "  ", "--file", "billing.json"])
        .assert()
        .code(2);

    handover_cmd(&dir)
        .args([
            "billing",
            "--search",
            "affan",
            "--from",
            "05/09/2025",
            "--file",
            "billing.json",
        ])
        .assert()
        .code(2)
        .stderr(contains("YYYY-MM-DD"));

    handover_cmd(&dir)
        .args(["billing", "--search", "affan", "--file", "missing.json"])
        .assert()
        .code(4);

    Ok(())
}

#[test]
fn task_new_without_content_fails_before_backend() -> Result<(), Box<dyn std::error::Error>> {
    let dir = TestDir::new();

    handover_cmd(&dir)
        .args(["--uid", "u", "--token", "t", "task", "new", "--handover", "10"])
        .assert()
        .code(2)
        .stderr(contains("title or a description"));

    Ok(())
}

#[test]
fn invalid_config_reports_user_error() -> Result<(), Box<dyn std::error::Error>> {
    let dir = TestDir::new();
    dir.write_config("[backend]\nbase_url = \"ftp://nowhere\"\n")?;

    handover_cmd(&dir)
        .args(["shift", "list"])
        .assert()
        .code(2)
        .stderr(contains("Invalid configuration"));

    Ok(())
}

#[test]
fn report_rejects_unknown_range() -> Result<(), Box<dyn std::error::Error>> {
    let dir = TestDir::new();

    handover_cmd(&dir)
        .args(["report", "--range", "14"])
        .assert()
        .code(2)
        .stderr(contains("7|30|90|all"));

    Ok(())
}

#[test]
fn handover_draft_resolves_shifts_from_catalog() -> Result<(), Box<dyn std::error::Error>> {
    let dir = TestDir::new();

    let output = handover_cmd(&dir)
        .args([
            "--uid",
            "ops1",
            "--token",
            "secret",
            "--json",
            "handover",
            "draft",
            "--title",
            "DB failover",
            "--from",
            "3",
            "--to",
            "morning shift",
            "--task",
            "Check replicas",
            "--task",
            "  ",
            "--attach",
            "runbook.pdf:application/pdf",
        ])
        .output()?;
    assert!(output.status.success());
    let json = stdout_json(&output);
    assert_eq!(json["command"], "handover draft");
    let data = &json["data"];
    assert_eq!(data["title"], "DB failover");
    assert_eq!(data["from_shift"]["name"], "Night Shift");
    assert_eq!(data["to_shift"]["time"], "07:00 - 15:00");
    assert_eq!(data["created_by"]["name"], "ops1");
    assert_eq!(data["tasks"].as_array().map(Vec::len), Some(1));
    assert_eq!(data["tasks"][0]["id"], 1);
    assert_eq!(data["attachments"][0]["kind"], "pdf");
    assert!(json["warnings"][0]
        .as_str()
        .unwrap_or_default()
        .contains("skipped"));

    handover_cmd(&dir)
        .args(["handover", "draft", "--title", "x", "--from", "Evening", "--to", "1"])
        .assert()
        .code(2)
        .stderr(contains("unknown shift 'Evening'"));

    handover_cmd(&dir)
        .args(["handover", "draft", "--title", " ", "--from", "1", "--to", "2"])
        .assert()
        .code(2)
        .stderr(contains("title is required"));

    Ok(())
}
