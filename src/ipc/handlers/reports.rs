use chrono::Local;
use serde_json::json;

use crate::db;
use crate::ipc::error::{err, ok};
use crate::ipc::helpers::{db_conn, optional_str, required_str, typed_param};
use crate::ipc::types::{AppState, Request};
use crate::model::{EvaluationKind, Report};
use crate::prefill;
use crate::score;

fn handle_report_new_draft(state: &mut AppState, req: &Request) -> serde_json::Value {
    let conn = match db_conn(state, req) {
        Ok(v) => v,
        Err(e) => return e,
    };
    let teacher_id = match required_str(req, "teacherId") {
        Ok(v) => v,
        Err(e) => return e,
    };
    let kind_raw = match required_str(req, "evaluationType") {
        Ok(v) => v,
        Err(e) => return e,
    };
    let Some(kind) = EvaluationKind::parse(&kind_raw) else {
        return err(
            &req.id,
            "bad_params",
            "evaluationType must be one of: general, class_session",
            Some(json!({ "evaluationType": kind_raw })),
        );
    };

    let teacher = match db::get_teacher(conn, &teacher_id) {
        Ok(Some(t)) => t,
        Ok(None) => return err(&req.id, "not_found", "teacher not found", None),
        Err(e) => return err(&req.id, "db_query_failed", e.to_string(), None),
    };
    let reports = match db::load_reports(conn, Some(&teacher_id)) {
        Ok(v) => v,
        Err(e) => return err(&req.id, "db_query_failed", e.to_string(), None),
    };
    let custom_criteria = match db::load_custom_criteria(conn) {
        Ok(v) => v,
        Err(e) => return err(&req.id, "db_query_failed", e.to_string(), None),
    };

    let today = Local::now().date_naive();
    let draft = prefill::new_report_draft(&teacher, kind, &reports, &custom_criteria, today);
    ok(&req.id, json!({ "report": draft }))
}

fn handle_report_save(state: &mut AppState, req: &Request) -> serde_json::Value {
    let conn = match db_conn(state, req) {
        Ok(v) => v,
        Err(e) => return e,
    };
    let report: Report = match typed_param(req, "report") {
        Ok(v) => v,
        Err(e) => return e,
    };

    let base = report.base();
    let mut teacher = match db::get_teacher(conn, &base.teacher_id) {
        Ok(Some(t)) => t,
        Ok(None) => {
            return err(
                &req.id,
                "not_found",
                "report references an unknown teacher",
                Some(json!({ "teacherId": base.teacher_id })),
            )
        }
        Err(e) => return err(&req.id, "db_query_failed", e.to_string(), None),
    };

    // Write-through: the teacher record tracks the location fields of the
    // most recently saved report.
    let changed = teacher.school.as_deref() != Some(base.school.as_str())
        || teacher.subject.as_deref() != Some(base.subject.as_str())
        || teacher.grades.as_deref() != Some(base.grades.as_str())
        || teacher.branch.as_deref() != Some(base.branch.as_str());
    if changed {
        teacher.school = Some(base.school.clone());
        teacher.subject = Some(base.subject.clone());
        teacher.grades = Some(base.grades.clone());
        teacher.branch = Some(base.branch.clone());
        if let Err(e) = db::upsert_teacher(conn, &teacher) {
            return err(&req.id, "db_query_failed", e.to_string(), None);
        }
    }

    match db::upsert_report(conn, &report) {
        Ok(()) => ok(
            &req.id,
            json!({ "reportId": report.base().id, "teacherUpdated": changed }),
        ),
        Err(e) => err(&req.id, "db_query_failed", e.to_string(), None),
    }
}

fn handle_report_delete(state: &mut AppState, req: &Request) -> serde_json::Value {
    let conn = match db_conn(state, req) {
        Ok(v) => v,
        Err(e) => return e,
    };
    let report_id = match required_str(req, "reportId") {
        Ok(v) => v,
        Err(e) => return e,
    };
    match db::delete_report(conn, &report_id) {
        Ok(true) => ok(&req.id, json!({ "deleted": true })),
        Ok(false) => err(&req.id, "not_found", "report not found", None),
        Err(e) => err(&req.id, "db_query_failed", e.to_string(), None),
    }
}

fn handle_report_list(state: &mut AppState, req: &Request) -> serde_json::Value {
    let conn = match db_conn(state, req) {
        Ok(v) => v,
        Err(e) => return e,
    };
    let teacher_id = optional_str(req, "teacherId");

    let mut reports = match db::load_reports(conn, teacher_id.as_deref()) {
        Ok(v) => v,
        Err(e) => return err(&req.id, "db_query_failed", e.to_string(), None),
    };
    // Storage keeps insertion order; display order is always most recent
    // first, computed here rather than persisted.
    reports.sort_by(|a, b| b.base().date.cmp(&a.base().date));

    let rows: Vec<serde_json::Value> = reports
        .iter()
        .map(|r| {
            let mut row = json!(r);
            if let Some(obj) = row.as_object_mut() {
                obj.insert("percentage".to_string(), json!(score::report_percentage(r)));
            }
            row
        })
        .collect();

    ok(&req.id, json!({ "reports": rows }))
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "report.newDraft" => Some(handle_report_new_draft(state, req)),
        "report.save" => Some(handle_report_save(state, req)),
        "report.delete" => Some(handle_report_delete(state, req)),
        "report.list" => Some(handle_report_list(state, req)),
        _ => None,
    }
}
