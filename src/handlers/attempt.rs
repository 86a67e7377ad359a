// src/handlers/attempt.rs

use axum::{
    Extension, Json,
    extract::{Path, State},
    response::IntoResponse,
};

use crate::{
    error::AppError, models::answer::SubmitRequest, state::AppState, store::Store,
    utils::jwt::Principal,
};

/// Lists every assessment assigned to the calling student.
pub async fn list_my_assessments<S: Store>(
    State(state): State<AppState<S>>,
    Extension(principal): Extension<Principal>,
) -> Result<impl IntoResponse, AppError> {
    let entries = state.attempts.list_for_student(principal.id).await?;
    Ok(Json(entries))
}

/// Returns the questions of an assigned assessment, canonical answers hidden.
pub async fn view_assessment<S: Store>(
    State(state): State<AppState<S>>,
    Extension(principal): Extension<Principal>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let view = state.attempts.student_view(id, principal.id).await?;
    Ok(Json(view))
}

pub async fn start<S: Store>(
    State(state): State<AppState<S>>,
    Extension(principal): Extension<Principal>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let summary = state.attempts.start(id, principal.id).await?;
    Ok(Json(summary))
}

/// Grades the submitted answers and completes the attempt.
pub async fn submit<S: Store>(
    State(state): State<AppState<S>>,
    Extension(principal): Extension<Principal>,
    Path(id): Path<i64>,
    Json(payload): Json<SubmitRequest>,
) -> Result<impl IntoResponse, AppError> {
    let result = state.attempts.submit(id, principal.id, payload).await?;
    Ok(Json(result))
}

pub async fn result<S: Store>(
    State(state): State<AppState<S>>,
    Extension(principal): Extension<Principal>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let result = state.attempts.get_result(id, principal.id).await?;
    Ok(Json(result))
}
