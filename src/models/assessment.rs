// src/models/assessment.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use validator::Validate;

use crate::{
    error::{AppError, AppResult},
    models::{assignment::Assignment, question::Question},
};

/// Lifecycle status. Only draft -> published -> closed is allowed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "lowercase")]
#[sqlx(type_name = "assessment_status", rename_all = "lowercase")]
pub enum AssessmentStatus {
    Draft,
    Published,
    Closed,
}

/// Represents the 'assessments' table in the database.
///
/// No total score column: the total is derived from the owned questions
/// whenever a view is built.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Assessment {
    pub id: i64,
    pub title: String,
    pub description: String,
    pub status: AssessmentStatus,
    pub creator_id: i64,
    /// Set once, at publish time.
    pub start_time: Option<DateTime<Utc>>,
    pub end_time: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl Assessment {
    pub fn is_created_by(&self, user_id: i64) -> bool {
        self.creator_id == user_id
    }

    /// True when `at` lies inside the inclusive [start_time, end_time] window.
    pub fn window_contains(&self, at: DateTime<Utc>) -> bool {
        match (self.start_time, self.end_time) {
            (Some(start), Some(end)) => start <= at && at <= end,
            _ => false,
        }
    }

    /// True when the assessment is published and `at` is not past end_time.
    pub fn accepts_submission_at(&self, at: DateTime<Utc>) -> bool {
        self.status == AssessmentStatus::Published && self.end_time.is_some_and(|end| at <= end)
    }
}

/// Summed in i64 so rows written outside request validation cannot overflow.
pub fn total_score(questions: &[Question]) -> i64 {
    questions.iter().map(|q| i64::from(q.score)).sum()
}

/// Assessment with its questions and the derived total score.
#[derive(Debug, Clone, Serialize)]
pub struct AssessmentView {
    #[serde(flatten)]
    pub assessment: Assessment,
    pub total_score: i64,
    pub questions: Vec<Question>,
}

impl AssessmentView {
    pub fn new(assessment: Assessment, questions: Vec<Question>) -> Self {
        AssessmentView {
            total_score: total_score(&questions),
            assessment,
            questions,
        }
    }
}

/// Creator's view: questions with answers plus every participation record.
#[derive(Debug, Clone, Serialize)]
pub struct AssessmentDetail {
    #[serde(flatten)]
    pub view: AssessmentView,
    pub students: Vec<Assignment>,
}

/// Compact listing row.
#[derive(Debug, Clone, Serialize)]
pub struct AssessmentSummary {
    pub id: i64,
    pub title: String,
    pub description: String,
    pub status: AssessmentStatus,
    pub start_time: Option<DateTime<Utc>>,
    pub end_time: Option<DateTime<Utc>>,
    pub total_score: i64,
    pub question_count: usize,
}

impl AssessmentSummary {
    pub fn new(assessment: Assessment, questions: &[Question]) -> Self {
        AssessmentSummary {
            id: assessment.id,
            title: assessment.title,
            description: assessment.description,
            status: assessment.status,
            start_time: assessment.start_time,
            end_time: assessment.end_time,
            total_score: total_score(questions),
            question_count: questions.len(),
        }
    }
}

/// DTO for creating a new assessment.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateAssessmentRequest {
    #[validate(length(min = 1, max = 200, message = "Title must be between 1 and 200 characters."))]
    pub title: String,
    #[serde(default)]
    #[validate(length(max = 2000))]
    pub description: String,
}

/// DTO for publishing. Times are RFC 3339 strings.
#[derive(Debug, Clone, Deserialize)]
pub struct PublishRequest {
    pub start_time: String,
    pub end_time: String,
    #[serde(default)]
    pub student_ids: Vec<i64>,
}

impl PublishRequest {
    /// Parses the window; an unparsable instant or start after end is a validation error.
    pub fn window(&self) -> AppResult<(DateTime<Utc>, DateTime<Utc>)> {
        let start = parse_instant("start_time", &self.start_time)?;
        let end = parse_instant("end_time", &self.end_time)?;
        if start > end {
            return Err(AppError::ValidationError(
                "start_time cannot be after end_time".to_string(),
            ));
        }
        Ok((start, end))
    }
}

fn parse_instant(field: &str, value: &str) -> AppResult<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(value)
        .map(|t| t.with_timezone(&Utc))
        .map_err(|_| AppError::ValidationError(format!("Invalid {} format: {}", field, value)))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn at(s: &str) -> DateTime<Utc> {
        DateTime::parse_from_rfc3339(s).unwrap().with_timezone(&Utc)
    }

    fn published(start: &str, end: &str) -> Assessment {
        Assessment {
            id: 1,
            title: "Unit 1".to_string(),
            description: String::new(),
            status: AssessmentStatus::Published,
            creator_id: 7,
            start_time: Some(at(start)),
            end_time: Some(at(end)),
            created_at: Utc::now(),
        }
    }

    fn scored(id: i64, score: i32) -> Question {
        Question {
            id,
            assessment_id: 1,
            question_type: crate::models::question::QuestionType::SingleChoice,
            content: format!("Q{}", id),
            options: sqlx::types::Json(vec!["A".to_string()]),
            answer: "A".to_string(),
            score,
            explanation: None,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_total_score_does_not_overflow_i32() {
        let questions = vec![scored(1, i32::MAX), scored(2, i32::MAX), scored(3, 1)];
        assert_eq!(total_score(&questions), 2 * i64::from(i32::MAX) + 1);

        let assessment = published("2025-03-01T09:00:00Z", "2025-03-01T10:00:00Z");
        let summary = AssessmentSummary::new(assessment, &questions);
        assert_eq!(summary.total_score, 2 * i64::from(i32::MAX) + 1);
    }

    #[test]
    fn test_window_is_inclusive() {
        let a = published("2025-03-01T09:00:00Z", "2025-03-01T10:00:00Z");
        assert!(a.window_contains(at("2025-03-01T09:00:00Z")));
        assert!(a.window_contains(at("2025-03-01T10:00:00Z")));
        assert!(!a.window_contains(at("2025-03-01T08:59:59Z")));
        assert!(!a.window_contains(at("2025-03-01T10:00:01Z")));
    }

    #[test]
    fn test_submission_allowed_before_start() {
        let a = published("2025-03-01T09:00:00Z", "2025-03-01T10:00:00Z");
        assert!(a.accepts_submission_at(at("2025-03-01T08:00:00Z")));
        assert!(!a.accepts_submission_at(at("2025-03-01T10:00:01Z")));
    }

    #[test]
    fn test_draft_has_no_window() {
        let mut a = published("2025-03-01T09:00:00Z", "2025-03-01T10:00:00Z");
        a.status = AssessmentStatus::Draft;
        a.start_time = None;
        a.end_time = None;
        assert!(!a.window_contains(at("2025-03-01T09:30:00Z")));
        assert!(!a.accepts_submission_at(at("2025-03-01T09:30:00Z")));
    }

    #[test]
    fn test_publish_window_parsing() {
        let req = PublishRequest {
            start_time: "2025-03-01T09:00:00+08:00".to_string(),
            end_time: "2025-03-01T10:00:00+08:00".to_string(),
            student_ids: vec![],
        };
        let (start, end) = req.window().unwrap();
        assert_eq!(start, at("2025-03-01T01:00:00Z"));
        assert_eq!(end, at("2025-03-01T02:00:00Z"));
    }

    #[test]
    fn test_publish_window_rejects_garbage_and_inverted() {
        let bad = PublishRequest {
            start_time: "tomorrow".to_string(),
            end_time: "2025-03-01T10:00:00Z".to_string(),
            student_ids: vec![],
        };
        assert!(matches!(bad.window(), Err(AppError::ValidationError(_))));

        let inverted = PublishRequest {
            start_time: "2025-03-01T11:00:00Z".to_string(),
            end_time: "2025-03-01T10:00:00Z".to_string(),
            student_ids: vec![],
        };
        assert!(matches!(inverted.window(), Err(AppError::ValidationError(_))));

        let instant = PublishRequest {
            start_time: "2025-03-01T10:00:00Z".to_string(),
            end_time: "2025-03-01T10:00:00Z".to_string(),
            student_ids: vec![],
        };
        assert!(instant.window().is_ok());
    }
}
