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
fn export_report_and_aggregated_artifacts() {
    let workspace = temp_dir("taqyeem-export");
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
        json!({ "name": "هدى المزروعي" }),
    );
    let teacher_id = added
        .pointer("/teacher/id")
        .and_then(|v| v.as_str())
        .expect("teacher id")
        .to_string();

    let mut report_ids = Vec::new();
    for (i, kind) in ["general", "class_session"].iter().enumerate() {
        let drafted = request_ok(
            &mut stdin,
            &mut reader,
            &format!("draft-{}", i),
            "report.newDraft",
            json!({ "teacherId": teacher_id, "evaluationType": kind }),
        );
        let mut report = drafted.get("report").cloned().expect("draft");
        report["school"] = json!("مدرسة الفجر");
        report_ids.push(
            report
                .get("id")
                .and_then(|v| v.as_str())
                .expect("report id")
                .to_string(),
        );
        let _ = request_ok(
            &mut stdin,
            &mut reader,
            &format!("save-{}", i),
            "report.save",
            json!({ "report": report }),
        );
    }

    // Single-report export in each format.
    let txt = request_ok(
        &mut stdin,
        &mut reader,
        "10",
        "export.report",
        json!({ "reportId": report_ids[0], "format": "txt" }),
    );
    let txt_path = PathBuf::from(txt.get("path").and_then(|v| v.as_str()).expect("path"));
    assert!(txt_path.starts_with(workspace.join("exports")));
    let file_name = txt.get("fileName").and_then(|v| v.as_str()).expect("name");
    assert!(file_name.starts_with("report_هدى المزروعي_"));
    assert!(file_name.ends_with(".txt"));
    let body = std::fs::read_to_string(&txt_path).expect("read txt artifact");
    assert!(body.contains("تقييم عام"));
    assert!(body.contains("هدى المزروعي"));
    assert!(body.contains("مدرسة الفجر"));

    let pdf = request_ok(
        &mut stdin,
        &mut reader,
        "11",
        "export.report",
        json!({ "reportId": report_ids[1], "format": "pdf" }),
    );
    let pdf_bytes = std::fs::read(
        pdf.get("path").and_then(|v| v.as_str()).expect("path"),
    )
    .expect("read pdf artifact");
    assert!(pdf_bytes.starts_with(b"%PDF-1.4"));

    let xlsx = request_ok(
        &mut stdin,
        &mut reader,
        "12",
        "export.report",
        json!({ "reportId": report_ids[0], "format": "xlsx" }),
    );
    let xlsx_bytes = std::fs::read(
        xlsx.get("path").and_then(|v| v.as_str()).expect("path"),
    )
    .expect("read xlsx artifact");
    assert!(xlsx_bytes.starts_with(b"PK\x03\x04"));

    let link = request_ok(
        &mut stdin,
        &mut reader,
        "13",
        "export.reportShareLink",
        json!({ "reportId": report_ids[0] }),
    );
    let url = link.get("url").and_then(|v| v.as_str()).expect("url");
    assert!(url.starts_with("https://api.whatsapp.com/send?text="));
    assert!(!url.contains(' '));

    // Aggregated export honouring the caller's ordering.
    let aggregated = request_ok(
        &mut stdin,
        &mut reader,
        "14",
        "export.aggregated",
        json!({ "reportIds": report_ids, "format": "txt" }),
    );
    assert_eq!(
        aggregated.get("renderedReports").and_then(|v| v.as_u64()),
        Some(2)
    );
    assert_eq!(
        aggregated.get("skippedReports").and_then(|v| v.as_u64()),
        Some(0)
    );
    let agg_name = aggregated
        .get("fileName")
        .and_then(|v| v.as_str())
        .expect("name");
    assert!(agg_name.starts_with("aggregated_reports_"));
    let agg_body = std::fs::read_to_string(
        aggregated.get("path").and_then(|v| v.as_str()).expect("path"),
    )
    .expect("read aggregated artifact");
    assert!(agg_body.contains("--- تقارير مجمعة ---"));
    assert!(agg_body.contains("تقييم عام"));
    assert!(agg_body.contains("تقييم حصة دراسية"));

    let agg_link = request_ok(
        &mut stdin,
        &mut reader,
        "15",
        "export.aggregatedShareLink",
        json!({ "reportIds": [report_ids[0]] }),
    );
    assert_eq!(
        agg_link.get("renderedReports").and_then(|v| v.as_u64()),
        Some(1)
    );
    assert!(agg_link
        .get("url")
        .and_then(|v| v.as_str())
        .expect("url")
        .starts_with("https://api.whatsapp.com/send?text="));

    // Unknown report ids fail loudly instead of being skipped.
    let bad = json!({
        "id": "16",
        "method": "export.aggregated",
        "params": { "reportIds": ["missing"], "format": "txt" },
    });
    writeln!(stdin, "{}", bad).expect("write request");
    stdin.flush().expect("flush request");
    let mut line = String::new();
    reader.read_line(&mut line).expect("read response line");
    let value: serde_json::Value = serde_json::from_str(line.trim()).expect("parse response json");
    assert_eq!(value.get("ok").and_then(|v| v.as_bool()), Some(false));
    assert_eq!(
        value.pointer("/error/code").and_then(|v| v.as_str()),
        Some("not_found")
    );

    drop(stdin);
    let _ = child.wait();
}
