use crate::editor::EditorError;
use crate::service::ServiceError;
use serde_json::json;

pub fn ok(id: &str, result: serde_json::Value) -> serde_json::Value {
    json!({
        "id": id,
        "ok": true,
        "result": result
    })
}

pub fn err(
    id: &str,
    code: &str,
    message: impl Into<String>,
    details: Option<serde_json::Value>,
) -> serde_json::Value {
    let mut error = json!({
        "code": code,
        "message": message.into(),
    });
    if let Some(d) = details {
        error["details"] = d;
    }
    json!({
        "id": id,
        "ok": false,
        "error": error,
    })
}

pub fn service_err(id: &str, e: &ServiceError) -> serde_json::Value {
    err(id, e.code(), e.to_string(), None)
}

pub fn editor_err(id: &str, e: &EditorError) -> serde_json::Value {
    let details = match e {
        EditorError::InvalidInput { field, .. } => Some(json!({ "field": field })),
        _ => None,
    };
    err(id, e.code(), e.to_string(), details)
}
