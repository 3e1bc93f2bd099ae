use serde::{Deserialize, Serialize};

/// Counts of students per learning-goal concept:
/// MANA (goal not yet reached), MPA (partially reached), MA (reached).
#[allow(dead_code)]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GradeDistribution {
    #[serde(rename = "MANA")]
    pub mana: i64,
    #[serde(rename = "MPA")]
    pub mpa: i64,
    #[serde(rename = "MA")]
    pub ma: i64,
}

#[allow(dead_code)]
impl GradeDistribution {
    pub fn total(&self) -> i64 {
        self.mana + self.mpa + self.ma
    }
}

#[allow(dead_code)]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EvaluationPerformance {
    pub goal: String,
    pub average_grade: f64,
    pub grade_distribution: GradeDistribution,
    pub evaluated_students: i64,
}

/// Per-class summary produced by the reporting backend. This process only
/// carries the shape; it never computes one.
#[allow(dead_code)]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Report {
    pub class_id: String,
    pub topic: String,
    pub semester: i64,
    pub year: i32,
    pub total_enrolled: i64,
    pub students_average: f64,
    pub approved_count: i64,
    pub not_approved_count: i64,
    #[serde(default)]
    pub evaluation_performance: Vec<EvaluationPerformance>,
    pub generated_at: String,
}

#[allow(dead_code)]
impl Report {
    /// Upstream guarantees approved + not approved never exceeds enrollment.
    /// Not enforced here; callers may use this for diagnostics.
    pub fn counts_consistent(&self) -> bool {
        self.approved_count >= 0
            && self.not_approved_count >= 0
            && self.approved_count + self.not_approved_count <= self.total_enrolled
    }
}
