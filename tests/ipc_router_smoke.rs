mod test_support;

use serde_json::json;
use std::io::{BufRead, Write};
use test_support::{request, request_ok, spawn_sidecar, student, temp_dir};

#[test]
fn router_dispatch_smoke_covers_handler_families() {
    let workspace = temp_dir("erasmus-router-smoke");
    let (mut child, mut stdin, mut reader) = spawn_sidecar(&workspace);

    let health = request_ok(&mut stdin, &mut reader, "1", "health", json!({}));
    assert_eq!(health.get("backend").and_then(|v| v.as_str()), Some("file"));
    assert_eq!(health.get("lang").and_then(|v| v.as_str()), Some("es"));

    let methods = [
        ("2", "students.list", json!({})),
        ("3", "students.add", student("Smoke", "Dret", "Madrid")),
        ("4", "dashboard.summary", json!({})),
        ("5", "dashboard.cities", json!({})),
        ("6", "dashboard.careers", json!({})),
        ("7", "dashboard.suggest", json!({ "field": "city", "query": "ma" })),
        ("8", "dashboard.filter", json!({ "city": "mad" })),
        ("9", "dashboard.search", json!({ "term": "smoke" })),
        ("10", "dashboard.provinces", json!({})),
        ("11", "dashboard.province", json!({ "name": "Madrid" })),
        ("12", "dashboard.setLanguage", json!({ "lang": "ca" })),
    ];
    for (id, method, params) in methods {
        let resp = request(&mut stdin, &mut reader, id, method, params);
        assert_eq!(
            resp.get("ok").and_then(|v| v.as_bool()),
            Some(true),
            "{} failed: {}",
            method,
            resp
        );
    }

    let unknown = request(&mut stdin, &mut reader, "13", "students.frobnicate", json!({}));
    assert_eq!(
        unknown
            .get("error")
            .and_then(|e| e.get("code"))
            .and_then(|v| v.as_str()),
        Some("not_implemented")
    );

    drop(stdin);
    let status = child.wait().expect("wait for sidecar");
    assert!(status.success());
}

#[test]
fn malformed_line_gets_bad_json_and_the_loop_keeps_going() {
    let workspace = temp_dir("erasmus-bad-json");
    let (_child, mut stdin, mut reader) = spawn_sidecar(&workspace);

    writeln!(stdin, "{{not json").expect("write garbage");
    stdin.flush().expect("flush");
    let mut line = String::new();
    reader.read_line(&mut line).expect("read response");
    let value: serde_json::Value = serde_json::from_str(line.trim()).expect("parse");
    assert_eq!(value.get("ok").and_then(|v| v.as_bool()), Some(false));
    assert_eq!(
        value
            .get("error")
            .and_then(|e| e.get("code"))
            .and_then(|v| v.as_str()),
        Some("bad_json")
    );

    let _ = request_ok(&mut stdin, &mut reader, "1", "health", json!({}));
}

#[test]
fn workspace_select_repoints_the_file_store() {
    let first = temp_dir("erasmus-workspace-a");
    let second = temp_dir("erasmus-workspace-b");
    let (_child, mut stdin, mut reader) = spawn_sidecar(&first);

    let _ = request_ok(
        &mut stdin,
        &mut reader,
        "1",
        "students.add",
        student("Abril", "Dret", "Murcia"),
    );
    let selected = request_ok(
        &mut stdin,
        &mut reader,
        "2",
        "workspace.select",
        json!({ "path": second.to_string_lossy() }),
    );
    assert_eq!(selected.get("backend").and_then(|v| v.as_str()), Some("file"));

    let list = request_ok(&mut stdin, &mut reader, "3", "students.list", json!({}));
    assert_eq!(
        list.get("students").and_then(|v| v.as_array()).map(Vec::len),
        Some(0)
    );
    let summary = request_ok(&mut stdin, &mut reader, "4", "dashboard.summary", json!({}));
    assert_eq!(summary.get("students").and_then(|v| v.as_u64()), Some(0));

    assert!(first.join("data.json").exists());
    assert!(!second.join("data.json").exists());
}

#[test]
fn failed_workspace_select_restores_the_previous_store() {
    let workspace = temp_dir("erasmus-workspace-restore");
    let blocker = workspace.join("not-a-dir");
    std::fs::write(&blocker, "plain file").expect("write blocker");
    let (_child, mut stdin, mut reader) = spawn_sidecar(&workspace);

    let _ = request_ok(
        &mut stdin,
        &mut reader,
        "1",
        "students.add",
        student("Iu", "Dret", "Ceuta"),
    );
    let failed = request(
        &mut stdin,
        &mut reader,
        "2",
        "workspace.select",
        json!({ "path": blocker.join("nested").to_string_lossy() }),
    );
    assert_eq!(failed.get("ok").and_then(|v| v.as_bool()), Some(false));

    let list = request_ok(&mut stdin, &mut reader, "3", "students.list", json!({}));
    assert_eq!(
        list.get("students").and_then(|v| v.as_array()).map(Vec::len),
        Some(1)
    );
}
