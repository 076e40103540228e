use serde_json::json;
use std::io::{BufRead, BufReader, Write};
use std::path::PathBuf;
use std::process::{Child, ChildStdin, ChildStdout, Command, Stdio};
use std::time::{SystemTime, UNIX_EPOCH};

fn temp_dir(prefix: &str) -> PathBuf {
    let p = std::env::temp_dir().join(format!(
        "{}-{}",
        prefix,
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .expect("clock")
            .as_nanos()
    ));
    std::fs::create_dir_all(&p).expect("create temp dir");
    p
}

fn spawn_sidecar() -> (Child, ChildStdin, BufReader<ChildStdout>) {
    let exe = env!("CARGO_BIN_EXE_taqyeemd");
    let mut child = Command::new(exe)
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::null())
        .spawn()
        .expect("spawn taqyeemd");
    let stdin = child.stdin.take().expect("child stdin");
    let stdout = child.stdout.take().expect("child stdout");
    (child, stdin, BufReader::new(stdout))
}

fn request_ok(
    stdin: &mut ChildStdin,
    reader: &mut BufReader<ChildStdout>,
    id: &str,
    method: &str,
    params: serde_json::Value,
) -> serde_json::Value {
    let payload = json!({
        "id": id,
        "method": method,
        "params": params,
    });
    writeln!(stdin, "{}", payload).expect("write request");
    stdin.flush().expect("flush request");

    let mut line = String::new();
    reader.read_line(&mut line).expect("read response line");
    assert!(!line.trim().is_empty(), "empty response for {}", method);
    let value: serde_json::Value = serde_json::from_str(line.trim()).expect("parse response json");
    assert_eq!(value.get("id").and_then(|v| v.as_str()), Some(id));
    assert!(
        value.get("ok").and_then(|v| v.as_bool()).unwrap_or(false),
        "{} failed: {}",
        method,
        value
            .get("error")
            .and_then(|e| e.get("message"))
            .and_then(|v| v.as_str())
            .unwrap_or("unknown error")
    );
    value.get("result").cloned().unwrap_or_else(|| json!({}))
}

#[test]
fn report_lifecycle_over_ipc() {
    let workspace = temp_dir("taqyeem-lifecycle");
    let (mut child, mut stdin, mut reader) = spawn_sidecar();

    let _ = request_ok(
        &mut stdin,
        &mut reader,
        "1",
        "workspace.select",
        json!({ "path": workspace.to_string_lossy() }),
    );

    let added = request_ok(
        &mut stdin,
        &mut reader,
        "2",
        "teacher.add",
        json!({ "name": "أحمد الهاشمي" }),
    );
    let teacher_id = added
        .pointer("/teacher/id")
        .and_then(|v| v.as_str())
        .expect("teacher id")
        .to_string();

    // A fresh draft is the general template, unscored, with empty narratives.
    let draft_res = request_ok(
        &mut stdin,
        &mut reader,
        "3",
        "report.newDraft",
        json!({ "teacherId": teacher_id, "evaluationType": "general" }),
    );
    let mut draft = draft_res.get("report").cloned().expect("draft report");
    assert_eq!(
        draft.get("evaluationType").and_then(|v| v.as_str()),
        Some("general")
    );
    let criteria = draft
        .get("criteria")
        .and_then(|v| v.as_array())
        .expect("criteria")
        .clone();
    assert!(!criteria.is_empty());
    assert!(criteria
        .iter()
        .all(|c| c.get("score").and_then(|v| v.as_i64()) == Some(0)));
    assert_eq!(draft.get("strategies").and_then(|v| v.as_str()), Some(""));

    // Edit the draft: fill location fields and score two criteria.
    draft["school"] = json!("مدرسة النور");
    draft["subject"] = json!("رياضيات");
    draft["grades"] = json!("7-9");
    draft["criteria"][0]["score"] = json!(4);
    draft["criteria"][1]["score"] = json!(2);

    let saved = request_ok(
        &mut stdin,
        &mut reader,
        "4",
        "report.save",
        json!({ "report": draft }),
    );
    assert_eq!(saved.get("teacherUpdated").and_then(|v| v.as_bool()), Some(true));

    // Write-through: the teacher record now carries the report's location.
    let teachers = request_ok(&mut stdin, &mut reader, "5", "teacher.list", json!({}));
    let teacher = &teachers.get("teachers").and_then(|v| v.as_array()).expect("teachers")[0];
    assert_eq!(
        teacher.get("school").and_then(|v| v.as_str()),
        Some("مدرسة النور")
    );
    assert_eq!(teacher.get("grades").and_then(|v| v.as_str()), Some("7-9"));

    // Listing computes the percentage at render time.
    let listed = request_ok(
        &mut stdin,
        &mut reader,
        "6",
        "report.list",
        json!({ "teacherId": teacher_id }),
    );
    let rows = listed.get("reports").and_then(|v| v.as_array()).expect("rows");
    assert_eq!(rows.len(), 1);
    let expected = 100.0 * 6.0 / (criteria.len() as f64 * 4.0);
    let pct = rows[0].get("percentage").and_then(|v| v.as_f64()).expect("pct");
    assert!((pct - expected).abs() < 1e-9);

    // Saving the same id again replaces rather than duplicates.
    let _ = request_ok(
        &mut stdin,
        &mut reader,
        "7",
        "report.save",
        json!({ "report": rows[0] }),
    );
    let relisted = request_ok(
        &mut stdin,
        &mut reader,
        "8",
        "report.list",
        json!({ "teacherId": teacher_id }),
    );
    assert_eq!(
        relisted
            .get("reports")
            .and_then(|v| v.as_array())
            .expect("rows")
            .len(),
        1
    );

    // Health reflects the open workspace.
    let health = request_ok(&mut stdin, &mut reader, "9", "health", json!({}));
    assert_eq!(health.get("teacherCount").and_then(|v| v.as_u64()), Some(1));
    assert_eq!(health.get("reportCount").and_then(|v| v.as_u64()), Some(1));

    drop(stdin);
    let _ = child.wait();
}
