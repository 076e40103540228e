use std::path::PathBuf;

use rusqlite::Connection;
use serde::Deserialize;

/// One request line from the host application.
#[derive(Debug, Deserialize, Clone)]
pub struct Request {
    pub id: String,
    pub method: String,
    #[serde(default)]
    pub params: serde_json::Value,
}

/// Mutable daemon state. Both fields are set together by
/// `workspace.select`; every other handler only reads them.
pub struct AppState {
    pub workspace: Option<PathBuf>,
    pub db: Option<Connection>,
}

impl AppState {
    pub fn new() -> Self {
        AppState {
            workspace: None,
            db: None,
        }
    }
}
