use crate::model::{ClassDraft, ClassRecord};
use thiserror::Error;

/// Failure raised by a persistence collaborator. The variant tells the caller
/// what went wrong; the message is what a user gets to see.
#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("{0}")]
    Validation(String),
    #[error("class not found: {0}")]
    NotFound(String),
    #[error("storage error: {0}")]
    Storage(String),
}

impl ServiceError {
    pub fn code(&self) -> &'static str {
        match self {
            ServiceError::Validation(_) => "bad_params",
            ServiceError::NotFound(_) => "not_found",
            ServiceError::Storage(_) => "db_failed",
        }
    }
}

impl From<rusqlite::Error> for ServiceError {
    fn from(e: rusqlite::Error) -> Self {
        match e {
            rusqlite::Error::QueryReturnedNoRows => ServiceError::NotFound(e.to_string()),
            other => ServiceError::Storage(other.to_string()),
        }
    }
}

/// Create/update/delete operations the class editor delegates to.
pub trait ClassService {
    fn create_class(&self, draft: &ClassDraft) -> Result<ClassRecord, ServiceError>;
    fn update_class(&self, id: &str, draft: &ClassDraft) -> Result<ClassRecord, ServiceError>;
    fn delete_class(&self, id: &str) -> Result<(), ServiceError>;
}
