use crate::db;
use crate::editor::{ClassEditor, SystemClock};
use crate::ipc::error::{err, ok, service_err};
use crate::ipc::types::{AppState, Request};
use serde_json::json;
use std::path::{Path, PathBuf};

fn handle_health(state: &mut AppState, req: &Request) -> serde_json::Value {
    ok(
        &req.id,
        json!({
            "version": env!("CARGO_PKG_VERSION"),
            "workspacePath": state.workspace.as_ref().map(|p| p.to_string_lossy().to_string())
        }),
    )
}

/// Open (or create) the workspace database, load its classes and put the
/// editor back on a blank create form.
pub fn select_workspace(state: &mut AppState, path: &Path) -> anyhow::Result<usize> {
    let conn = db::open_db(path)?;
    let classes = db::list_classes(&conn)?;
    let count = classes.len();

    state.workspace = Some(path.to_path_buf());
    state.db = Some(conn);
    state.classes = classes;
    state.editor = ClassEditor::new(SystemClock);
    tracing::info!(workspace = %path.display(), classes = count, "workspace opened");
    Ok(count)
}

fn handle_workspace_select(state: &mut AppState, req: &Request) -> serde_json::Value {
    let p = req
        .params
        .get("path")
        .and_then(|v| v.as_str())
        .map(PathBuf::from);
    let Some(path) = p else {
        return err(&req.id, "bad_params", "missing params.path", None);
    };

    match select_workspace(state, &path) {
        Ok(count) => ok(
            &req.id,
            json!({ "workspacePath": path.to_string_lossy(), "classCount": count }),
        ),
        Err(e) => match e.downcast_ref::<crate::service::ServiceError>() {
            Some(se) => service_err(&req.id, se),
            None => err(&req.id, "db_open_failed", format!("{e:?}"), None),
        },
    }
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "health" => Some(handle_health(state, req)),
        "workspace.select" => Some(handle_workspace_select(state, req)),
        _ => None,
    }
}
