use crate::db;
use crate::ipc::error::{err, ok, service_err};
use crate::ipc::types::{AppState, Request};
use crate::model::ClassRecord;
use crate::service::ServiceError;
use rusqlite::Connection;
use serde_json::json;

pub(super) fn required_str(req: &Request, key: &str) -> Result<String, serde_json::Value> {
    req.params
        .get(key)
        .and_then(|v| v.as_str())
        .map(|v| v.to_string())
        .ok_or_else(|| err(&req.id, "bad_params", format!("missing {}", key), None))
}

pub(super) fn db_conn<'a>(
    db: &'a Option<Connection>,
    req: &Request,
) -> Result<&'a Connection, serde_json::Value> {
    db.as_ref()
        .ok_or_else(|| err(&req.id, "no_workspace", "select a workspace first", None))
}

/// Reload the authoritative list from storage.
pub(super) fn refresh_classes(
    conn: &Connection,
    classes: &mut Vec<ClassRecord>,
) -> Result<(), ServiceError> {
    *classes = db::list_classes(conn)?;
    Ok(())
}

fn handle_classes_list(state: &mut AppState, req: &Request) -> serde_json::Value {
    let conn = match db_conn(&state.db, req) {
        Ok(c) => c,
        Err(e) => return e,
    };
    if let Err(e) = refresh_classes(conn, &mut state.classes) {
        return service_err(&req.id, &e);
    }
    ok(&req.id, json!({ "classes": state.classes }))
}

fn handle_enrollment(state: &mut AppState, req: &Request, enroll: bool) -> serde_json::Value {
    let conn = match db_conn(&state.db, req) {
        Ok(c) => c,
        Err(e) => return e,
    };
    let class_id = match required_str(req, "classId") {
        Ok(v) => v,
        Err(e) => return e,
    };
    let student_id = match required_str(req, "studentId") {
        Ok(v) => v,
        Err(e) => return e,
    };

    let changed = if enroll {
        db::enroll(conn, &class_id, &student_id)
    } else {
        db::unenroll(conn, &class_id, &student_id)
    };
    let changed = match changed {
        Ok(v) => v,
        Err(e) => return service_err(&req.id, &e),
    };

    if let Err(e) = refresh_classes(conn, &mut state.classes) {
        return service_err(&req.id, &e);
    }
    let enrolled = state
        .classes
        .iter()
        .find(|c| c.id == class_id)
        .map(|c| c.enrollments.len())
        .unwrap_or(0);
    ok(
        &req.id,
        json!({ "classId": class_id, "changed": changed, "enrolled": enrolled }),
    )
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "classes.list" => Some(handle_classes_list(state, req)),
        "classes.enroll" => Some(handle_enrollment(state, req, true)),
        "classes.unenroll" => Some(handle_enrollment(state, req, false)),
        _ => None,
    }
}
