//! Class editor: a form bound to a local draft plus a read-only table of the
//! classes its owner passes in.
//!
//! The editor never owns the class list. It mutates only its draft and the
//! editing reference, calls a [`ClassService`] for persistence and tells its
//! owner through [`EditorEvents`] when the list must be refreshed or an error
//! shown.
//!
//! ```text
//!   Idle-Create --edit(r)--> Editing(r) --cancel--> Idle-Create
//!        |                      |
//!        +------submit----------+--> Submitting --ok--> Idle-Create
//!                                        |
//!                                        +--err--> state before submit
//! ```

use crate::model::{ClassDraft, ClassRecord, Semester};
use crate::service::{ClassService, ServiceError};
use chrono::Datelike;
use serde::Serialize;
use thiserror::Error;

pub const TOPIC_REQUIRED: &str = "Topic is required";

/// Number of entries offered by the year selector.
const YEAR_WINDOW: i32 = 10;
/// How many of those entries precede the current year.
const YEARS_BACK: i32 = 5;

pub trait Clock {
    fn current_year(&self) -> i32;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn current_year(&self) -> i32 {
        chrono::Local::now().year()
    }
}

/// Notifications sent to whoever owns the authoritative class list.
pub trait EditorEvents {
    fn class_added(&mut self);
    fn class_updated(&mut self);
    fn class_deleted(&mut self);
    fn error(&mut self, message: &str);
}

/// Blocking yes/no question asked before anything destructive happens.
pub trait Confirm {
    fn confirm(&mut self, prompt: &str) -> bool;
}

impl<F: FnMut(&str) -> bool> Confirm for F {
    fn confirm(&mut self, prompt: &str) -> bool {
        self(prompt)
    }
}

#[derive(Debug, Error)]
pub enum EditorError {
    #[error("{}", TOPIC_REQUIRED)]
    TopicRequired,
    #[error("invalid input for {field}: {reason}")]
    InvalidInput { field: String, reason: String },
    #[error("a save is already in progress")]
    Busy,
    #[error(transparent)]
    Service(#[from] ServiceError),
}

impl EditorError {
    pub fn code(&self) -> &'static str {
        match self {
            EditorError::TopicRequired => "validation_failed",
            EditorError::InvalidInput { .. } => "bad_params",
            EditorError::Busy => "busy",
            EditorError::Service(e) => e.code(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum EditorMode {
    IdleCreate,
    Editing,
    Submitting,
}

/// Collaborator call captured when a submit starts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmitRequest {
    Create(ClassDraft),
    Update { id: String, draft: ClassDraft },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmitOutcome {
    Created(ClassRecord),
    Updated(ClassRecord),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeleteOutcome {
    Deleted,
    Declined,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SemesterOption {
    pub value: i64,
    pub label: &'static str,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ClassRow {
    pub key: String,
    pub topic: String,
    pub year: i32,
    pub semester: &'static str,
    pub enrolled: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EditorView {
    pub mode: EditorMode,
    pub title: &'static str,
    pub submit_label: &'static str,
    pub submit_enabled: bool,
    pub show_cancel: bool,
    pub editing_id: Option<String>,
    pub draft: ClassDraft,
    pub year_options: Vec<i32>,
    pub semester_options: Vec<SemesterOption>,
    pub list_title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub empty_message: Option<&'static str>,
    pub rows: Vec<ClassRow>,
}

/// `[current_year - 5, current_year + 4]`.
pub fn year_options(current_year: i32) -> Vec<i32> {
    let first = current_year - YEARS_BACK;
    (first..first + YEAR_WINDOW).collect()
}

pub fn semester_options() -> Vec<SemesterOption> {
    [Semester::First, Semester::Second]
        .into_iter()
        .map(|s| SemesterOption {
            value: s.number(),
            label: s.label(),
        })
        .collect()
}

/// Table rows in the order received; keyed by the derived class id.
pub fn class_rows(classes: &[ClassRecord]) -> Vec<ClassRow> {
    classes
        .iter()
        .map(|c| ClassRow {
            key: c.class_id(),
            topic: c.topic.clone(),
            year: c.year,
            semester: c.semester.label(),
            enrolled: c.enrollments.len(),
        })
        .collect()
}

pub fn delete_prompt(record: &ClassRecord) -> String {
    format!(
        "Are you sure you want to delete the class \"{} ({}/{})\"?",
        record.topic, record.year, record.semester
    )
}

pub struct ClassEditor<C: Clock = SystemClock> {
    clock: C,
    draft: ClassDraft,
    editing: Option<ClassRecord>,
    submitting: bool,
}

impl<C: Clock> ClassEditor<C> {
    pub fn new(clock: C) -> Self {
        let draft = ClassDraft::blank(clock.current_year());
        Self {
            clock,
            draft,
            editing: None,
            submitting: false,
        }
    }

    pub fn draft(&self) -> &ClassDraft {
        &self.draft
    }

    pub fn editing(&self) -> Option<&ClassRecord> {
        self.editing.as_ref()
    }

    pub fn is_submitting(&self) -> bool {
        self.submitting
    }

    pub fn mode(&self) -> EditorMode {
        if self.submitting {
            EditorMode::Submitting
        } else if self.editing.is_some() {
            EditorMode::Editing
        } else {
            EditorMode::IdleCreate
        }
    }

    pub fn year_options(&self) -> Vec<i32> {
        year_options(self.clock.current_year())
    }

    fn reset_draft(&mut self) {
        self.draft = ClassDraft::blank(self.clock.current_year());
    }

    fn ensure_idle(&self) -> Result<(), EditorError> {
        if self.submitting {
            return Err(EditorError::Busy);
        }
        Ok(())
    }

    /// Start editing a copy of `record`; the draft mirrors its fields.
    pub fn edit(&mut self, record: &ClassRecord) -> Result<(), EditorError> {
        self.ensure_idle()?;
        self.draft = record.to_draft();
        self.editing = Some(record.clone());
        Ok(())
    }

    /// Drop the editing reference and any unsaved changes.
    pub fn cancel(&mut self) -> Result<(), EditorError> {
        self.ensure_idle()?;
        self.editing = None;
        self.reset_draft();
        Ok(())
    }

    /// Apply one form input. Numeric fields are parsed on every change; the
    /// topic is kept verbatim.
    pub fn set_field(&mut self, name: &str, value: &str) -> Result<(), EditorError> {
        self.ensure_idle()?;
        let invalid = |reason: String| EditorError::InvalidInput {
            field: name.to_string(),
            reason,
        };
        match name {
            "topic" => self.draft.topic = value.to_string(),
            "semester" => {
                let n: i64 = value
                    .trim()
                    .parse()
                    .map_err(|e: std::num::ParseIntError| invalid(e.to_string()))?;
                self.draft.semester = Semester::try_from(n).map_err(invalid)?;
            }
            "year" => {
                self.draft.year = value
                    .trim()
                    .parse()
                    .map_err(|e: std::num::ParseIntError| invalid(e.to_string()))?;
            }
            _ => return Err(invalid("unknown field".to_string())),
        }
        Ok(())
    }

    /// Validate the draft and enter `Submitting`. The returned request is the
    /// collaborator call the caller must make before [`Self::complete_submit`].
    ///
    /// While a submit is already in flight this is a no-op returning `Busy`;
    /// `events` is not notified. An empty topic is reported through `events`.
    pub fn begin_submit(
        &mut self,
        events: &mut dyn EditorEvents,
    ) -> Result<SubmitRequest, EditorError> {
        self.ensure_idle()?;
        if !self.draft.has_topic() {
            let e = EditorError::TopicRequired;
            events.error(&e.to_string());
            return Err(e);
        }
        self.submitting = true;
        Ok(match &self.editing {
            Some(rec) => SubmitRequest::Update {
                id: rec.id.clone(),
                draft: self.draft.clone(),
            },
            None => SubmitRequest::Create(self.draft.clone()),
        })
    }

    /// Settle an in-flight submit. On success the owner is told to refresh and
    /// the form returns to a blank create form. On failure the draft and the
    /// editing reference stay as they were.
    pub fn complete_submit(
        &mut self,
        result: Result<ClassRecord, ServiceError>,
        events: &mut dyn EditorEvents,
    ) -> Result<SubmitOutcome, EditorError> {
        self.submitting = false;
        match result {
            Ok(record) => {
                let outcome = if self.editing.take().is_some() {
                    events.class_updated();
                    SubmitOutcome::Updated(record)
                } else {
                    events.class_added();
                    SubmitOutcome::Created(record)
                };
                self.reset_draft();
                Ok(outcome)
            }
            Err(e) => {
                tracing::warn!(code = e.code(), error = %e, "class save failed");
                let e = EditorError::from(e);
                events.error(&e.to_string());
                Err(e)
            }
        }
    }

    pub fn submit<S: ClassService + ?Sized>(
        &mut self,
        service: &S,
        events: &mut dyn EditorEvents,
    ) -> Result<SubmitOutcome, EditorError> {
        let result = match self.begin_submit(events)? {
            SubmitRequest::Create(draft) => service.create_class(&draft),
            SubmitRequest::Update { id, draft } => service.update_class(&id, &draft),
        };
        self.complete_submit(result, events)
    }

    /// Delete `record` after confirmation. Editor state is left alone either
    /// way; the owner refreshes its list on `class_deleted`.
    pub fn delete<S: ClassService + ?Sized>(
        &self,
        record: &ClassRecord,
        confirm: &mut dyn Confirm,
        service: &S,
        events: &mut dyn EditorEvents,
    ) -> Result<DeleteOutcome, EditorError> {
        if !confirm.confirm(&delete_prompt(record)) {
            return Ok(DeleteOutcome::Declined);
        }
        match service.delete_class(&record.id) {
            Ok(()) => {
                events.class_deleted();
                Ok(DeleteOutcome::Deleted)
            }
            Err(e) => {
                tracing::warn!(class_id = %record.id, error = %e, "class delete failed");
                events.error(&e.to_string());
                Err(e.into())
            }
        }
    }

    pub fn render(&self, classes: &[ClassRecord]) -> EditorView {
        let editing = self.editing().is_some();
        let empty_message = classes
            .is_empty()
            .then_some("No classes created yet. Add your first class using the form above.");
        EditorView {
            mode: self.mode(),
            title: if editing { "Edit Class" } else { "Add New Class" },
            submit_label: if self.is_submitting() {
                "Saving..."
            } else if editing {
                "Update Class"
            } else {
                "Add Class"
            },
            submit_enabled: !self.submitting,
            show_cancel: editing,
            editing_id: self.editing.as_ref().map(|r| r.class_id()),
            draft: self.draft.clone(),
            year_options: self.year_options(),
            semester_options: semester_options(),
            list_title: format!("Existing Classes ({})", classes.len()),
            empty_message,
            rows: class_rows(classes),
        }
    }
}
