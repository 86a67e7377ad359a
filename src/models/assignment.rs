// src/models/assignment.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use crate::models::{assessment::AssessmentSummary, question::PublicQuestion};

/// Per-student attempt status: assigned -> started -> completed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "lowercase")]
#[sqlx(type_name = "assignment_status", rename_all = "lowercase")]
pub enum AssignmentStatus {
    Assigned,
    Started,
    Completed,
}

/// Represents the 'assignments' table: one row per (assessment, student).
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Assignment {
    pub id: i64,
    pub assessment_id: i64,
    pub student_id: i64,
    pub status: AssignmentStatus,
    /// Only meaningful once completed.
    pub score: i32,
    pub started_at: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
}

/// One row of a student's assessment list.
#[derive(Debug, Clone, Serialize)]
pub struct StudentAssessmentEntry {
    #[serde(flatten)]
    pub assessment: AssessmentSummary,
    pub student_status: AssignmentStatus,
    pub student_score: i32,
    pub started_at: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
}

impl StudentAssessmentEntry {
    pub fn new(assessment: AssessmentSummary, assignment: &Assignment) -> Self {
        StudentAssessmentEntry {
            assessment,
            student_status: assignment.status,
            student_score: assignment.score,
            started_at: assignment.started_at,
            completed_at: assignment.completed_at,
        }
    }
}

/// What an assigned student may see before grading.
#[derive(Debug, Serialize)]
pub struct StudentAssessmentView {
    pub assessment: AssessmentSummary,
    pub assignment: Assignment,
    pub questions: Vec<PublicQuestion>,
}
