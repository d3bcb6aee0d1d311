//! REST client and command console against an in-process agent API.
use std::collections::HashMap;

use agentdash::api::{ApiClient, ApiError};
use agentdash::commands::{fetch_history, CommandConsole};
use agentdash::history::COMMAND_HISTORY_CAP;
use agentdash::types::CommandRecord;
use axum::extract::Query;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde_json::json;

type Params = Query<HashMap<String, String>>;

async fn execute(Query(q): Params) -> Response {
    let cmd = q.get("command").cloned().unwrap_or_default();
    match cmd.as_str() {
        "boom" => StatusCode::INTERNAL_SERVER_ERROR.into_response(),
        "fail" => Json(json!({ "success": false, "error": "could not parse command" }))
            .into_response(),
        _ => Json(json!({ "success": true, "response": format!("ran {cmd}") })).into_response(),
    }
}

async fn history(Query(q): Params) -> Json<serde_json::Value> {
    let limit: usize = q.get("limit").and_then(|v| v.parse().ok()).unwrap_or(50);
    let records: Vec<_> = (0..limit.min(3))
        .map(|i| {
            json!({
                "command": format!("cmd {i}"),
                "result": "ok",
                "success": true,
                "timestamp": "2024-05-01T10:00:00"
            })
        })
        .collect();
    Json(json!({ "history": records }))
}

async fn processes(Query(q): Params) -> Json<serde_json::Value> {
    match q.get("limit").map(String::as_str) {
        Some("0") => Json(json!({ "error": "process table unavailable" })),
        _ => Json(json!({ "processes": [
            { "pid": 1, "name": "init", "cpu_percent": 0.1, "memory_percent": 0.5, "status": "sleeping" },
            { "pid": 42, "name": "agent" }
        ]})),
    }
}

async fn search(Query(q): Params) -> Json<serde_json::Value> {
    let pattern = q.get("pattern").cloned().unwrap_or_default();
    let dir = q.get("directory").cloned().unwrap_or_else(|| "~".into());
    Json(json!({
        "results": [{ "path": format!("{dir}/{pattern}"), "name": pattern, "size": 10, "modified": "now" }],
        "count": 1
    }))
}

async fn serve() -> String {
    let app = Router::new()
        .route("/api/commands/execute", post(execute))
        .route("/api/commands/history", get(history))
        .route("/api/system/processes", get(processes))
        .route("/api/files/search", get(search))
        .route(
            "/api/system/stats",
            get(|| async {
                Json(json!({ "cpu": 5.0, "memory": 60.0, "disk": 91.0, "timestamp": "t0" }))
            }),
        )
        .route(
            "/api/system/info",
            get(|| async { Json(json!({ "hostname": "box", "cpu_count": 8 })) }),
        );
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{addr}")
}

fn refused_base() -> String {
    let l = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    format!("http://{}", l.local_addr().unwrap())
}

fn record(i: usize) -> CommandRecord {
    CommandRecord {
        command: format!("old {i}"),
        result: String::new(),
        success: true,
        timestamp: String::new(),
    }
}

#[tokio::test]
async fn successful_and_rejected_commands_become_records() {
    let api = ApiClient::new(&serve().await).unwrap();
    let mut console = CommandConsole::new();

    let r = console.execute(&api, "  list files ").await.unwrap();
    assert!(r.success);
    assert_eq!(r.command, "list files");
    assert_eq!(r.result, "ran list files");

    let r = console.execute(&api, "fail").await.unwrap();
    assert!(!r.success);
    assert_eq!(r.result, "could not parse command");

    assert_eq!(console.history().len(), 2);
    assert_eq!(console.history().front().unwrap().command, "fail");
    assert!(!console.in_flight());
    assert!(console.execute(&api, "   ").await.is_none());
}

#[tokio::test]
async fn transport_failures_skip_the_cap_but_successes_restore_it() {
    let api = ApiClient::new(&serve().await).unwrap();
    let mut console = CommandConsole::new();
    console.seed((0..COMMAND_HISTORY_CAP).map(record).collect());

    let r = console.execute(&api, "boom").await.unwrap();
    assert!(!r.success);
    assert!(!r.result.is_empty());
    assert_eq!(console.history().len(), COMMAND_HISTORY_CAP + 1);

    console.execute(&api, "uptime").await.unwrap();
    assert_eq!(console.history().len(), COMMAND_HISTORY_CAP);
    assert_eq!(console.history().front().unwrap().command, "uptime");
}

#[tokio::test]
async fn unreachable_agent_yields_a_failure_record() {
    let api = ApiClient::new(&refused_base()).unwrap();
    let mut console = CommandConsole::new();
    let r = console.execute(&api, "bogus").await.unwrap();
    assert_eq!(r.command, "bogus");
    assert!(!r.success);
    assert!(!r.timestamp.is_empty());
    assert!(fetch_history(&api, 20).await.is_empty());
}

#[tokio::test]
async fn history_and_stats_are_fetched() {
    let api = ApiClient::new(&serve().await).unwrap();
    let h = fetch_history(&api, 2).await;
    assert_eq!(h.len(), 2);
    assert_eq!(h[0].command, "cmd 0");

    let s = api.system_stats().await.unwrap();
    assert_eq!((s.cpu, s.memory, s.disk), (5.0, 60.0, 91.0));
    assert_eq!(api.system_info().await.unwrap()["hostname"], "box");
}

#[tokio::test]
async fn error_bodies_surface_as_remote_errors() {
    let api = ApiClient::new(&serve().await).unwrap();
    let ps = api.processes(5).await.unwrap();
    assert_eq!(ps.len(), 2);
    assert_eq!(ps[1].pid, 42);
    assert_eq!(ps[1].cpu_percent, None);

    match api.processes(0).await {
        Err(ApiError::Remote(msg)) => assert_eq!(msg, "process table unavailable"),
        other => panic!("expected remote error, got {other:?}"),
    }
}

#[tokio::test]
async fn search_passes_pattern_and_directory() {
    let api = ApiClient::new(&serve().await).unwrap();
    let hits = api.search_files("*.py", Some("/srv"), 10).await.unwrap();
    assert_eq!(hits.len(), 1);
    assert_eq!(hits[0].path, "/srv/*.py");
    let hits = api.search_files("notes.md", None, 10).await.unwrap();
    assert_eq!(hits[0].path, "~/notes.md");
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn one_shot_info_prints_json() {
    let base = serve().await;
    let td = tempfile::tempdir().unwrap();
    let out = tokio::task::spawn_blocking(move || {
        assert_cmd::Command::cargo_bin("agentdash")
            .unwrap()
            .env("XDG_CONFIG_HOME", td.path())
            .args(["--api", base.as_str(), "--info"])
            .output()
            .unwrap()
    })
    .await
    .unwrap();
    assert!(out.status.success(), "{}", String::from_utf8_lossy(&out.stderr));
    let v: serde_json::Value = serde_json::from_slice(&out.stdout).unwrap();
    assert_eq!(v["cpu_count"], 8);
}

#[test]
fn one_shot_failure_exits_non_zero() {
    let td = tempfile::tempdir().unwrap();
    let out = assert_cmd::Command::cargo_bin("agentdash")
        .unwrap()
        .env("XDG_CONFIG_HOME", td.path())
        .args(["--api", refused_base().as_str(), "--processes", "3"])
        .output()
        .unwrap();
    assert_eq!(out.status.code(), Some(1));
    assert!(String::from_utf8_lossy(&out.stderr).contains("request failed"));
}
