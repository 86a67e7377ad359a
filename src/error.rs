// src/error.rs

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;

/// Global Application Error Enum.
/// Every engine operation fails with exactly one of these kinds.
#[derive(Debug, Clone, Error)]
pub enum AppError {
    // 404: referenced assessment/question/assignment does not exist
    #[error("Not found: {0}")]
    NotFound(String),

    // 403: caller is not the assessment's creator
    #[error("Forbidden: {0}")]
    Forbidden(String),

    // 409: wrong lifecycle status for the operation
    #[error("Invalid state: {0}")]
    InvalidState(String),

    // 400: malformed or contradictory input
    #[error("Validation error: {0}")]
    ValidationError(String),

    // 400: student-side start/submit/result eligibility failed
    #[error("Not eligible: {0}")]
    NotEligible(String),

    // 500: the transactional store could not complete the operation
    #[error("Store failure: {0}")]
    StoreFailure(String),
}

impl AppError {
    /// Stable machine-readable kind, safe to expose to clients.
    pub fn code(&self) -> &'static str {
        match self {
            AppError::NotFound(_) => "NOT_FOUND",
            AppError::Forbidden(_) => "FORBIDDEN",
            AppError::InvalidState(_) => "INVALID_STATE",
            AppError::ValidationError(_) => "VALIDATION_ERROR",
            AppError::NotEligible(_) => "NOT_ELIGIBLE",
            AppError::StoreFailure(_) => "STORE_FAILURE",
        }
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Forbidden(_) => StatusCode::FORBIDDEN,
            AppError::InvalidState(_) => StatusCode::CONFLICT,
            AppError::ValidationError(_) => StatusCode::BAD_REQUEST,
            AppError::NotEligible(_) => StatusCode::BAD_REQUEST,
            AppError::StoreFailure(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

/// Implements `IntoResponse` for `AppError`.
/// Converts the error into a JSON response with appropriate HTTP status code.
/// Store errors are logged and replaced with a generic message.
impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let code = self.code();
        let message = match self {
            AppError::StoreFailure(msg) => {
                tracing::error!("Store failure: {}", msg);
                "Internal Server Error".to_string()
            }
            AppError::NotFound(msg)
            | AppError::Forbidden(msg)
            | AppError::InvalidState(msg)
            | AppError::ValidationError(msg)
            | AppError::NotEligible(msg) => msg,
        };
        let body = Json(json!({
            "error": code,
            "message": message,
        }));

        (status, body).into_response()
    }
}

/// Converts `sqlx::Error` into `AppError::StoreFailure`.
/// Allows using `?` operator on database queries.
impl From<sqlx::Error> for AppError {
    fn from(err: sqlx::Error) -> Self {
        AppError::StoreFailure(err.to_string())
    }
}

impl From<sqlx::migrate::MigrateError> for AppError {
    fn from(err: sqlx::migrate::MigrateError) -> Self {
        AppError::StoreFailure(err.to_string())
    }
}

impl From<validator::ValidationErrors> for AppError {
    fn from(err: validator::ValidationErrors) -> Self {
        AppError::ValidationError(err.to_string())
    }
}

pub type AppResult<T> = Result<T, AppError>;
