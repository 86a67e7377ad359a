// src/models/question.rs

use serde::{Deserialize, Serialize};
use sqlx::{prelude::FromRow, types::Json};
use validator::Validate;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "snake_case")]
#[sqlx(type_name = "question_type", rename_all = "snake_case")]
pub enum QuestionType {
    SingleChoice,
    MultipleChoice,
    TrueFalse,
    ShortAnswer,
}

/// Represents the 'questions' table in the database.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Question {
    pub id: i64,

    pub assessment_id: i64,

    /// Mapped from the database column 'type' since `type` is a reserved keyword in Rust.
    #[sqlx(rename = "type")]
    #[serde(rename = "type")]
    pub question_type: QuestionType,

    /// The text content of the question.
    pub content: String,

    /// List of options (e.g., ["Option A", "Option B"]).
    /// Stored as a JSON array in the database.
    pub options: Json<Vec<String>>,

    /// The canonical answer, compared verbatim at grading time.
    pub answer: String,

    /// Points awarded for a correct answer.
    pub score: i32,

    /// Explanation shown after grading.
    pub explanation: Option<String>,

    pub created_at: chrono::DateTime<chrono::Utc>,
}

impl Question {
    pub fn is_correct(&self, submitted: &str) -> bool {
        self.answer == submitted
    }
}

/// DTO for sending question to a student (excludes answer and explanation).
#[derive(Debug, Serialize)]
pub struct PublicQuestion {
    pub id: i64,
    #[serde(rename = "type")]
    pub question_type: QuestionType,
    pub content: String,
    pub options: Json<Vec<String>>,
    pub score: i32,
}

impl From<Question> for PublicQuestion {
    fn from(q: Question) -> Self {
        PublicQuestion {
            id: q.id,
            question_type: q.question_type,
            content: q.content,
            options: q.options,
            score: q.score,
        }
    }
}

/// Upper bound for a single question's score.
pub const MAX_QUESTION_SCORE: i32 = 10_000;

/// DTO for creating a new question.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateQuestionRequest {
    #[serde(rename = "type", default = "default_question_type")]
    pub question_type: QuestionType,
    #[validate(length(min = 1, max = 1000))]
    pub content: String,
    #[validate(custom(function = validate_options))]
    pub options: Vec<String>,
    #[validate(length(min = 1, max = 500))]
    pub answer: String,
    #[validate(range(min = 1, max = 10000, message = "Score must be between 1 and 10000."))]
    pub score: i32,
    #[validate(length(max = 2000))]
    pub explanation: Option<String>,
}

fn default_question_type() -> QuestionType {
    QuestionType::SingleChoice
}

fn validate_options(options: &[String]) -> Result<(), validator::ValidationError> {
    if options.is_empty() {
        return Err(validator::ValidationError::new("options_cannot_be_empty"));
    }
    for opt in options {
        if opt.len() > 500 {
            return Err(validator::ValidationError::new("option_too_long"));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(score: i32, options: Vec<&str>) -> CreateQuestionRequest {
        CreateQuestionRequest {
            question_type: QuestionType::SingleChoice,
            content: "2 + 2 = ?".to_string(),
            options: options.into_iter().map(String::from).collect(),
            answer: "B".to_string(),
            score,
            explanation: None,
        }
    }

    #[test]
    fn test_valid_question_request() {
        assert!(request(5, vec!["A. 3", "B. 4"]).validate().is_ok());
    }

    #[test]
    fn test_zero_score_rejected() {
        assert!(request(0, vec!["A. 3", "B. 4"]).validate().is_err());
    }

    #[test]
    fn test_score_upper_bound() {
        assert!(request(MAX_QUESTION_SCORE, vec!["A. 3", "B. 4"]).validate().is_ok());
        assert!(request(MAX_QUESTION_SCORE + 1, vec!["A. 3", "B. 4"]).validate().is_err());
        assert!(request(i32::MAX, vec!["A. 3", "B. 4"]).validate().is_err());
    }

    #[test]
    fn test_empty_options_rejected() {
        assert!(request(5, vec![]).validate().is_err());
    }

    #[test]
    fn test_question_type_defaults_to_single_choice() {
        let req: CreateQuestionRequest = serde_json::from_value(serde_json::json!({
            "content": "Capital of France?",
            "options": ["Paris", "Lyon"],
            "answer": "Paris",
            "score": 2
        }))
        .unwrap();
        assert_eq!(req.question_type, QuestionType::SingleChoice);
    }

    #[test]
    fn test_exact_match_grading() {
        let q = Question {
            id: 1,
            assessment_id: 1,
            question_type: QuestionType::SingleChoice,
            content: "Pick B".to_string(),
            options: Json(vec!["A".to_string(), "B".to_string()]),
            answer: "B".to_string(),
            score: 5,
            explanation: None,
            created_at: chrono::Utc::now(),
        };
        assert!(q.is_correct("B"));
        assert!(!q.is_correct("b"));
        assert!(!q.is_correct(" B"));
    }
}
