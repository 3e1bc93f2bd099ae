use super::classes::{db_conn, refresh_classes, required_str};
use crate::db::SqliteClassService;
use crate::editor::{DeleteOutcome, EditorEvents, SubmitOutcome};
use crate::ipc::error::{editor_err, err, ok};
use crate::ipc::types::{AppState, Request};
use crate::model::ClassRecord;
use rusqlite::Connection;
use serde_json::json;

/// Owner side of the editor: keeps the authoritative list fresh and collects
/// what the editor reported during one request.
struct ClassesPage<'a> {
    conn: &'a Connection,
    classes: &'a mut Vec<ClassRecord>,
    notifications: Vec<&'static str>,
    errors: Vec<String>,
}

impl<'a> ClassesPage<'a> {
    fn new(conn: &'a Connection, classes: &'a mut Vec<ClassRecord>) -> Self {
        Self {
            conn,
            classes,
            notifications: Vec::new(),
            errors: Vec::new(),
        }
    }

    fn refresh(&mut self, notification: &'static str) {
        self.notifications.push(notification);
        if let Err(e) = refresh_classes(self.conn, self.classes) {
            tracing::warn!(error = %e, "class list refresh failed");
            self.errors.push(e.to_string());
        }
    }
}

impl EditorEvents for ClassesPage<'_> {
    fn class_added(&mut self) {
        self.refresh("classAdded");
    }

    fn class_updated(&mut self) {
        self.refresh("classUpdated");
    }

    fn class_deleted(&mut self) {
        self.refresh("classDeleted");
    }

    fn error(&mut self, message: &str) {
        self.errors.push(message.to_string());
    }
}

fn find_class(classes: &[ClassRecord], class_id: &str) -> Option<ClassRecord> {
    classes.iter().find(|c| c.class_id() == class_id).cloned()
}

/// `2024` and `2024.0` both mean 2024; other numbers pass through for the
/// editor to reject.
fn integral_number(n: &serde_json::Number) -> String {
    if let Some(v) = n.as_i64() {
        return v.to_string();
    }
    match n.as_f64() {
        Some(f) if f.fract() == 0.0 && f.abs() < i64::MAX as f64 => (f as i64).to_string(),
        _ => n.to_string(),
    }
}

fn view_json(state: &AppState) -> serde_json::Value {
    json!(state.editor.render(&state.classes))
}

fn handle_view(state: &mut AppState, req: &Request) -> serde_json::Value {
    if let Err(e) = db_conn(&state.db, req) {
        return e;
    }
    ok(&req.id, view_json(state))
}

fn handle_edit(state: &mut AppState, req: &Request) -> serde_json::Value {
    if let Err(e) = db_conn(&state.db, req) {
        return e;
    }
    let class_id = match required_str(req, "classId") {
        Ok(v) => v,
        Err(e) => return e,
    };
    let Some(record) = find_class(&state.classes, &class_id) else {
        return err(&req.id, "not_found", "class not found", Some(json!({ "classId": class_id })));
    };
    if let Err(e) = state.editor.edit(&record) {
        return editor_err(&req.id, &e);
    }
    ok(&req.id, view_json(state))
}

fn handle_cancel(state: &mut AppState, req: &Request) -> serde_json::Value {
    if let Err(e) = db_conn(&state.db, req) {
        return e;
    }
    if let Err(e) = state.editor.cancel() {
        return editor_err(&req.id, &e);
    }
    ok(&req.id, view_json(state))
}

fn handle_input(state: &mut AppState, req: &Request) -> serde_json::Value {
    if let Err(e) = db_conn(&state.db, req) {
        return e;
    }
    let name = match required_str(req, "name") {
        Ok(v) => v,
        Err(e) => return e,
    };
    // Select boxes may post numbers; text inputs post strings.
    let value = match req.params.get("value") {
        Some(serde_json::Value::String(s)) => s.clone(),
        Some(serde_json::Value::Number(n)) => integral_number(n),
        _ => return err(&req.id, "bad_params", "missing value", None),
    };
    if let Err(e) = state.editor.set_field(&name, &value) {
        return editor_err(&req.id, &e);
    }
    ok(&req.id, json!({ "draft": state.editor.draft() }))
}

fn handle_submit(state: &mut AppState, req: &Request) -> serde_json::Value {
    let AppState {
        db,
        classes,
        editor,
        ..
    } = state;
    let conn = match db_conn(db, req) {
        Ok(c) => c,
        Err(e) => return e,
    };
    let service = SqliteClassService::new(conn);
    let mut page = ClassesPage::new(conn, classes);
    let result = editor.submit(&service, &mut page);
    let notifications = page.notifications;
    let errors = page.errors;

    let (outcome, record) = match result {
        Ok(SubmitOutcome::Created(r)) => ("created", r),
        Ok(SubmitOutcome::Updated(r)) => ("updated", r),
        Err(e) => return editor_err(&req.id, &e),
    };
    ok(
        &req.id,
        json!({
            "outcome": outcome,
            "class": record,
            "notifications": notifications,
            "errors": errors,
            "view": editor.render(classes),
        }),
    )
}

fn handle_delete(state: &mut AppState, req: &Request) -> serde_json::Value {
    let AppState {
        db,
        classes,
        editor,
        ..
    } = state;
    let conn = match db_conn(db, req) {
        Ok(c) => c,
        Err(e) => return e,
    };
    let class_id = match required_str(req, "classId") {
        Ok(v) => v,
        Err(e) => return e,
    };
    let confirmed = match req.params.get("confirmed") {
        None | Some(serde_json::Value::Null) => false,
        Some(serde_json::Value::Bool(b)) => *b,
        Some(other) => {
            return err(
                &req.id,
                "bad_params",
                "confirmed must be a boolean",
                Some(json!({ "confirmed": other })),
            )
        }
    };
    let Some(record) = find_class(classes, &class_id) else {
        return err(&req.id, "not_found", "class not found", Some(json!({ "classId": class_id })));
    };

    // The shell has already asked the user; replay the answer.
    let mut prompt = String::new();
    let mut answer = |p: &str| {
        prompt = p.to_string();
        confirmed
    };
    let service = SqliteClassService::new(conn);
    let mut page = ClassesPage::new(conn, classes);
    let result = editor.delete(&record, &mut answer, &service, &mut page);
    let notifications = page.notifications;
    let errors = page.errors;

    match result {
        Ok(DeleteOutcome::Declined) => ok(
            &req.id,
            json!({ "deleted": false, "prompt": prompt }),
        ),
        Ok(DeleteOutcome::Deleted) => ok(
            &req.id,
            json!({
                "deleted": true,
                "prompt": prompt,
                "notifications": notifications,
                "errors": errors,
                "view": editor.render(classes),
            }),
        ),
        Err(e) => editor_err(&req.id, &e),
    }
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "editor.view" => Some(handle_view(state, req)),
        "editor.edit" => Some(handle_edit(state, req)),
        "editor.cancel" => Some(handle_cancel(state, req)),
        "editor.input" => Some(handle_input(state, req)),
        "editor.submit" => Some(handle_submit(state, req)),
        "editor.delete" => Some(handle_delete(state, req)),
        _ => None,
    }
}
