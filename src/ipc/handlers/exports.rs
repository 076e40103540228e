use std::path::PathBuf;

use chrono::Local;
use serde_json::json;

use crate::db;
use crate::export::{self, doc, sheet, AggregateStats};
use crate::ipc::error::{err, ok};
use crate::ipc::helpers::{db_conn, optional_str, required_str, typed_param};
use crate::ipc::types::{AppState, Request};
use crate::model::{Report, Teacher};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ExportFormat {
    Txt,
    Pdf,
    Xlsx,
}

impl ExportFormat {
    fn ext(self) -> &'static str {
        match self {
            ExportFormat::Txt => "txt",
            ExportFormat::Pdf => "pdf",
            ExportFormat::Xlsx => "xlsx",
        }
    }
}

fn parse_format(req: &Request) -> Result<ExportFormat, serde_json::Value> {
    let raw = required_str(req, "format")?;
    match raw.as_str() {
        "txt" => Ok(ExportFormat::Txt),
        "pdf" => Ok(ExportFormat::Pdf),
        "xlsx" => Ok(ExportFormat::Xlsx),
        other => Err(err(
            &req.id,
            "bad_params",
            "format must be one of: txt, pdf, xlsx",
            Some(json!({ "format": other })),
        )),
    }
}

fn resolve_out_dir(state: &AppState, req: &Request) -> Result<PathBuf, serde_json::Value> {
    let dir = match optional_str(req, "outDir") {
        Some(d) => PathBuf::from(d),
        None => {
            let Some(workspace) = state.workspace.as_ref() else {
                return Err(err(&req.id, "no_workspace", "select a workspace first", None));
            };
            workspace.join("exports")
        }
    };
    std::fs::create_dir_all(&dir)
        .map_err(|e| err(&req.id, "io_failed", e.to_string(), None))?;
    Ok(dir)
}

fn load_report_pair(
    state: &AppState,
    req: &Request,
    report_id: &str,
) -> Result<(Report, Teacher), serde_json::Value> {
    let conn = db_conn(state, req)?;
    let report = match db::get_report(conn, report_id) {
        Ok(Some(r)) => r,
        Ok(None) => return Err(err(&req.id, "not_found", "report not found", None)),
        Err(e) => return Err(err(&req.id, "db_query_failed", e.to_string(), None)),
    };
    let teacher = match db::get_teacher(conn, &report.base().teacher_id) {
        Ok(Some(t)) => t,
        Ok(None) => {
            return Err(err(
                &req.id,
                "not_found",
                "teacher not found for report",
                Some(json!({ "teacherId": report.base().teacher_id })),
            ))
        }
        Err(e) => return Err(err(&req.id, "db_query_failed", e.to_string(), None)),
    };
    Ok((report, teacher))
}

/// Resolve the caller-ordered report id list; unknown ids are a caller bug,
/// not the tolerated missing-teacher case, and fail loudly.
fn load_reports_in_order(
    state: &AppState,
    req: &Request,
) -> Result<Vec<Report>, serde_json::Value> {
    let conn = db_conn(state, req)?;
    let report_ids: Vec<String> = typed_param(req, "reportIds")?;
    let mut reports = Vec::with_capacity(report_ids.len());
    for id in &report_ids {
        match db::get_report(conn, id) {
            Ok(Some(r)) => reports.push(r),
            Ok(None) => {
                return Err(err(
                    &req.id,
                    "not_found",
                    "report not found",
                    Some(json!({ "reportId": id })),
                ))
            }
            Err(e) => return Err(err(&req.id, "db_query_failed", e.to_string(), None)),
        }
    }
    Ok(reports)
}

fn write_artifact(
    req: &Request,
    dir: &PathBuf,
    file_name: &str,
    bytes: &[u8],
) -> Result<PathBuf, serde_json::Value> {
    let path = dir.join(file_name);
    std::fs::write(&path, bytes).map_err(|e| err(&req.id, "io_failed", e.to_string(), None))?;
    Ok(path)
}

fn handle_export_report(state: &mut AppState, req: &Request) -> serde_json::Value {
    let report_id = match required_str(req, "reportId") {
        Ok(v) => v,
        Err(e) => return e,
    };
    let format = match parse_format(req) {
        Ok(v) => v,
        Err(e) => return e,
    };
    let (report, teacher) = match load_report_pair(state, req, &report_id) {
        Ok(v) => v,
        Err(e) => return e,
    };
    let dir = match resolve_out_dir(state, req) {
        Ok(v) => v,
        Err(e) => return e,
    };

    let file_name = export::report_filename(&teacher, &report, format.ext());
    let bytes = match format {
        ExportFormat::Txt => export::render_text(&report, &teacher).into_bytes(),
        ExportFormat::Pdf => doc::render_report(&report, &teacher),
        ExportFormat::Xlsx => {
            let rows = sheet::report_rows(&report, &teacher);
            match sheet::write_workbook(sheet::SINGLE_SHEET_NAME, &rows) {
                Ok(v) => v,
                Err(e) => return err(&req.id, "io_failed", e.to_string(), None),
            }
        }
    };

    match write_artifact(req, &dir, &file_name, &bytes) {
        Ok(path) => ok(
            &req.id,
            json!({ "path": path.to_string_lossy(), "fileName": file_name }),
        ),
        Err(e) => e,
    }
}

fn handle_export_report_share_link(state: &mut AppState, req: &Request) -> serde_json::Value {
    let report_id = match required_str(req, "reportId") {
        Ok(v) => v,
        Err(e) => return e,
    };
    let (report, teacher) = match load_report_pair(state, req, &report_id) {
        Ok(v) => v,
        Err(e) => return e,
    };
    let content = export::render_text(&report, &teacher);
    ok(&req.id, json!({ "url": export::share_link(&content) }))
}

fn handle_export_aggregated(state: &mut AppState, req: &Request) -> serde_json::Value {
    let format = match parse_format(req) {
        Ok(v) => v,
        Err(e) => return e,
    };
    let reports = match load_reports_in_order(state, req) {
        Ok(v) => v,
        Err(e) => return e,
    };
    let teachers = {
        let conn = match db_conn(state, req) {
            Ok(v) => v,
            Err(e) => return e,
        };
        match db::load_teachers(conn) {
            Ok(v) => v,
            Err(e) => return err(&req.id, "db_query_failed", e.to_string(), None),
        }
    };
    let dir = match resolve_out_dir(state, req) {
        Ok(v) => v,
        Err(e) => return e,
    };

    let today = Local::now().date_naive();
    let file_name = export::aggregated_filename(today, format.ext());
    let (bytes, stats): (Vec<u8>, AggregateStats) = match format {
        ExportFormat::Txt => {
            let (text, stats) = export::render_aggregated_text(&reports, &teachers);
            (text.into_bytes(), stats)
        }
        ExportFormat::Pdf => doc::render_aggregated(&reports, &teachers),
        ExportFormat::Xlsx => {
            let (rows, stats) = sheet::aggregated_rows(&reports, &teachers);
            match sheet::write_workbook(sheet::AGGREGATED_SHEET_NAME, &rows) {
                Ok(v) => (v, stats),
                Err(e) => return err(&req.id, "io_failed", e.to_string(), None),
            }
        }
    };

    match write_artifact(req, &dir, &file_name, &bytes) {
        Ok(path) => ok(
            &req.id,
            json!({
                "path": path.to_string_lossy(),
                "fileName": file_name,
                "renderedReports": stats.rendered,
                "skippedReports": stats.skipped,
            }),
        ),
        Err(e) => e,
    }
}

fn handle_export_aggregated_share_link(state: &mut AppState, req: &Request) -> serde_json::Value {
    let reports = match load_reports_in_order(state, req) {
        Ok(v) => v,
        Err(e) => return e,
    };
    let teachers = {
        let conn = match db_conn(state, req) {
            Ok(v) => v,
            Err(e) => return e,
        };
        match db::load_teachers(conn) {
            Ok(v) => v,
            Err(e) => return err(&req.id, "db_query_failed", e.to_string(), None),
        }
    };

    let (content, stats) = export::render_aggregated_text(&reports, &teachers);
    ok(
        &req.id,
        json!({
            "url": export::share_link(&content),
            "renderedReports": stats.rendered,
            "skippedReports": stats.skipped,
        }),
    )
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "export.report" => Some(handle_export_report(state, req)),
        "export.reportShareLink" => Some(handle_export_report_share_link(state, req)),
        "export.aggregated" => Some(handle_export_aggregated(state, req)),
        "export.aggregatedShareLink" => Some(handle_export_aggregated_share_link(state, req)),
        _ => None,
    }
}
