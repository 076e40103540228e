//! Response envelopes. Every reply is `{id, ok, result}` or
//! `{id, ok, error: {code, message, details?}}`, one JSON object per line.

use serde_json::{json, Map, Value};

pub fn ok(id: &str, result: Value) -> Value {
    json!({ "id": id, "ok": true, "result": result })
}

pub fn err(id: &str, code: &str, message: impl Into<String>, details: Option<Value>) -> Value {
    let mut error = Map::new();
    error.insert("code".to_string(), Value::String(code.to_string()));
    error.insert("message".to_string(), Value::String(message.into()));
    if let Some(d) = details {
        error.insert("details".to_string(), d);
    }
    json!({ "id": id, "ok": false, "error": Value::Object(error) })
}
