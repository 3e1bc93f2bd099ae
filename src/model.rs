use serde::{Deserialize, Serialize};
use std::fmt;

/// Academic semester. Only the first and second semester exist; anything else
/// is rejected at the boundary so drafts and records never carry it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "i64", into = "i64")]
pub enum Semester {
    First,
    Second,
}

impl Semester {
    pub fn number(self) -> i64 {
        match self {
            Semester::First => 1,
            Semester::Second => 2,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Semester::First => "1st Semester",
            Semester::Second => "2nd Semester",
        }
    }
}

impl TryFrom<i64> for Semester {
    type Error = String;

    fn try_from(v: i64) -> Result<Self, Self::Error> {
        match v {
            1 => Ok(Semester::First),
            2 => Ok(Semester::Second),
            other => Err(format!("semester must be 1 or 2, got {}", other)),
        }
    }
}

impl From<Semester> for i64 {
    fn from(s: Semester) -> Self {
        s.number()
    }
}

impl fmt::Display for Semester {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.number())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EnrollmentRef {
    pub student_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub enrolled_at: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClassRecord {
    pub id: String,
    pub topic: String,
    pub semester: Semester,
    pub year: i32,
    #[serde(default)]
    pub enrollments: Vec<EnrollmentRef>,
}

impl ClassRecord {
    /// Key used for row identity and for resolving edit/delete targets.
    /// Records that arrive without an id fall back to a key built from their
    /// visible fields.
    pub fn class_id(&self) -> String {
        if !self.id.trim().is_empty() {
            return self.id.clone();
        }
        format!("{}-{}-{}", self.topic, self.year, self.semester)
    }

    pub fn to_draft(&self) -> ClassDraft {
        ClassDraft {
            topic: self.topic.clone(),
            semester: self.semester,
            year: self.year,
        }
    }
}

/// Unsaved form values for a class being created or edited.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClassDraft {
    pub topic: String,
    pub semester: Semester,
    pub year: i32,
}

impl ClassDraft {
    pub fn blank(current_year: i32) -> Self {
        Self {
            topic: String::new(),
            semester: Semester::First,
            year: current_year,
        }
    }

    pub fn has_topic(&self) -> bool {
        !self.topic.trim().is_empty()
    }
}
