// src/models/answer.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use validator::Validate;

/// Represents the 'answers' table. Correctness is decided once, at grading time.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Answer {
    pub id: i64,
    pub assignment_id: i64,
    pub question_id: i64,
    pub answer: String,
    pub is_correct: bool,
    pub created_at: DateTime<Utc>,
}

/// A graded answer about to be persisted.
#[derive(Debug, Clone)]
pub struct NewAnswer {
    pub question_id: i64,
    pub answer: String,
    pub is_correct: bool,
}

/// One item of a submission batch.
#[derive(Debug, Clone, Deserialize, Serialize, Validate)]
pub struct SubmittedAnswer {
    pub question_id: i64,
    #[validate(length(max = 500))]
    pub answer: String,
}

/// DTO for submitting an attempt. Items are graded in the order given.
#[derive(Debug, Clone, Deserialize, Serialize, Validate)]
pub struct SubmitRequest {
    #[validate(nested)]
    pub answers: Vec<SubmittedAnswer>,
}
