use std::path::PathBuf;

use rusqlite::Connection;
use serde::Deserialize;

use crate::editor::{ClassEditor, SystemClock};
use crate::model::ClassRecord;

#[derive(Debug, Deserialize, Clone)]
pub struct Request {
    pub id: String,
    pub method: String,
    #[serde(default)]
    pub params: serde_json::Value,
}

pub struct AppState {
    pub workspace: Option<PathBuf>,
    pub db: Option<Connection>,
    /// Authoritative class list handed to the editor on every render.
    pub classes: Vec<ClassRecord>,
    pub editor: ClassEditor,
}

impl Default for AppState {
    fn default() -> Self {
        Self {
            workspace: None,
            db: None,
            classes: Vec::new(),
            editor: ClassEditor::new(SystemClock),
        }
    }
}
