use std::path::PathBuf;

use serde_json::json;

use crate::db;
use crate::ipc::error::{err, ok};
use crate::ipc::types::{AppState, Request};

/// Liveness probe. Reports collection sizes when a workspace is open so the
/// host can sanity-check the database it ended up on.
fn handle_health(state: &mut AppState, req: &Request) -> serde_json::Value {
    let mut result = json!({
        "version": env!("CARGO_PKG_VERSION"),
        "workspacePath": state.workspace.as_ref().map(|p| p.to_string_lossy().to_string()),
    });
    if let Some(conn) = state.db.as_ref() {
        match (db::count_teachers(conn), db::count_reports(conn)) {
            (Ok(teachers), Ok(reports)) => {
                result["teacherCount"] = json!(teachers);
                result["reportCount"] = json!(reports);
            }
            (Err(e), _) | (_, Err(e)) => {
                return err(&req.id, "db_query_failed", e.to_string(), None)
            }
        }
    }
    ok(&req.id, result)
}

fn handle_workspace_select(state: &mut AppState, req: &Request) -> serde_json::Value {
    let path = match req.params.get("path").and_then(|v| v.as_str()) {
        Some(p) => PathBuf::from(p),
        None => return err(&req.id, "bad_params", "missing params.path", None),
    };

    match db::open_db(&path) {
        Ok(conn) => {
            state.workspace = Some(path.clone());
            state.db = Some(conn);
            ok(&req.id, json!({ "workspacePath": path.to_string_lossy() }))
        }
        Err(e) => err(&req.id, "db_open_failed", format!("{e:?}"), None),
    }
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "health" => Some(handle_health(state, req)),
        "workspace.select" => Some(handle_workspace_select(state, req)),
        _ => None,
    }
}
