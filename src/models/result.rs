// src/models/result.rs

use chrono::{DateTime, Utc};
use serde::Serialize;

/// Per-question line of a graded attempt.
#[derive(Debug, Clone, Serialize)]
pub struct AnswerDetail {
    pub question_id: i64,
    pub content: String,
    /// Only present on the post-hoc review (`get_result`).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub options: Option<Vec<String>>,
    pub your_answer: String,
    pub correct_answer: String,
    pub is_correct: bool,
    pub score: i32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub explanation: Option<String>,
}

/// Outcome of `submit`, and the same structure rebuilt by `get_result`.
#[derive(Debug, Clone, Serialize)]
pub struct GradingResult {
    pub assessment_id: i64,
    pub title: String,
    pub description: String,
    pub total_score: i64,
    pub your_score: i32,
    pub completed_at: Option<DateTime<Utc>>,
    pub answers: Vec<AnswerDetail>,
    pub analysis: String,
}
