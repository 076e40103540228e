use serde_json::json;
use uuid::Uuid;

use crate::db;
use crate::ipc::error::{err, ok};
use crate::ipc::helpers::{db_conn, required_str, typed_param};
use crate::ipc::types::{AppState, Request};
use crate::model::Teacher;

fn handle_teacher_add(state: &mut AppState, req: &Request) -> serde_json::Value {
    let conn = match db_conn(state, req) {
        Ok(v) => v,
        Err(e) => return e,
    };
    let name = match required_str(req, "name") {
        Ok(v) => v,
        Err(e) => return e,
    };
    if name.trim().is_empty() {
        return err(&req.id, "bad_params", "name must not be empty", None);
    }

    let teacher = Teacher {
        id: Uuid::new_v4().to_string(),
        name,
        school: None,
        subject: None,
        grades: None,
        branch: None,
    };
    match db::upsert_teacher(conn, &teacher) {
        Ok(()) => ok(&req.id, json!({ "teacher": teacher })),
        Err(e) => err(&req.id, "db_query_failed", e.to_string(), None),
    }
}

fn handle_teacher_update(state: &mut AppState, req: &Request) -> serde_json::Value {
    let conn = match db_conn(state, req) {
        Ok(v) => v,
        Err(e) => return e,
    };
    let teacher: Teacher = match typed_param(req, "teacher") {
        Ok(v) => v,
        Err(e) => return e,
    };

    let existing = match db::get_teacher(conn, &teacher.id) {
        Ok(v) => v,
        Err(e) => return err(&req.id, "db_query_failed", e.to_string(), None),
    };
    if existing.is_none() {
        return err(&req.id, "not_found", "teacher not found", None);
    }

    match db::upsert_teacher(conn, &teacher) {
        Ok(()) => ok(&req.id, json!({ "teacher": teacher })),
        Err(e) => err(&req.id, "db_query_failed", e.to_string(), None),
    }
}

fn handle_teacher_list(state: &mut AppState, req: &Request) -> serde_json::Value {
    let conn = match db_conn(state, req) {
        Ok(v) => v,
        Err(e) => return e,
    };
    match db::load_teachers(conn) {
        Ok(teachers) => ok(&req.id, json!({ "teachers": teachers })),
        Err(e) => err(&req.id, "db_query_failed", e.to_string(), None),
    }
}

fn handle_teacher_delete(state: &mut AppState, req: &Request) -> serde_json::Value {
    let conn = match db_conn(state, req) {
        Ok(v) => v,
        Err(e) => return e,
    };
    let teacher_id = match required_str(req, "teacherId") {
        Ok(v) => v,
        Err(e) => return e,
    };

    match db::delete_teacher_cascade(conn, &teacher_id) {
        Ok((true, deleted_reports)) => ok(
            &req.id,
            json!({ "deleted": true, "deletedReports": deleted_reports }),
        ),
        Ok((false, _)) => err(&req.id, "not_found", "teacher not found", None),
        Err(e) => err(&req.id, "db_query_failed", e.to_string(), None),
    }
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "teacher.add" => Some(handle_teacher_add(state, req)),
        "teacher.update" => Some(handle_teacher_update(state, req)),
        "teacher.list" => Some(handle_teacher_list(state, req)),
        "teacher.delete" => Some(handle_teacher_delete(state, req)),
        _ => None,
    }
}
