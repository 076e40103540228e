use serde_json::json;
use uuid::Uuid;

use crate::db;
use crate::ipc::error::{err, ok};
use crate::ipc::helpers::{db_conn, optional_str, typed_param};
use crate::ipc::types::{AppState, Request};
use crate::model::CustomCriterion;

fn handle_criteria_add_custom(state: &mut AppState, req: &Request) -> serde_json::Value {
    let conn = match db_conn(state, req) {
        Ok(v) => v,
        Err(e) => return e,
    };
    let mut custom: CustomCriterion = match typed_param(req, "customCriterion") {
        Ok(v) => v,
        Err(e) => return e,
    };
    if custom.id.is_empty() {
        custom.id = Uuid::new_v4().to_string();
    }
    if custom.criterion.label.trim().is_empty() {
        return err(&req.id, "bad_params", "criterion label must not be empty", None);
    }
    if custom.criterion.id.is_empty() {
        custom.criterion.id = format!("custom-{}", Uuid::new_v4());
    }

    match db::insert_custom_criterion(conn, &custom) {
        Ok(()) => ok(&req.id, json!({ "customCriterion": custom })),
        Err(e) => err(&req.id, "db_query_failed", e.to_string(), None),
    }
}

fn handle_criteria_list(state: &mut AppState, req: &Request) -> serde_json::Value {
    let conn = match db_conn(state, req) {
        Ok(v) => v,
        Err(e) => return e,
    };
    let school = optional_str(req, "school");

    match db::load_custom_criteria(conn) {
        Ok(mut criteria) => {
            if let Some(school) = school {
                criteria.retain(|c| c.school == school);
            }
            ok(&req.id, json!({ "customCriteria": criteria }))
        }
        Err(e) => err(&req.id, "db_query_failed", e.to_string(), None),
    }
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "criteria.addCustom" => Some(handle_criteria_add_custom(state, req)),
        "criteria.list" => Some(handle_criteria_list(state, req)),
        _ => None,
    }
}
