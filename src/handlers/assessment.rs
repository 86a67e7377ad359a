// src/handlers/assessment.rs

use axum::{
    Extension, Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};

use crate::{
    error::AppError,
    models::{
        assessment::{CreateAssessmentRequest, PublishRequest},
        question::CreateQuestionRequest,
    },
    state::AppState,
    store::Store,
    utils::jwt::Principal,
};

/// Creates a draft assessment owned by the caller.
pub async fn create_assessment<S: Store>(
    State(state): State<AppState<S>>,
    Extension(principal): Extension<Principal>,
    Json(payload): Json<CreateAssessmentRequest>,
) -> Result<impl IntoResponse, AppError> {
    let view = state
        .lifecycle
        .create_assessment(principal.id, payload)
        .await?;
    Ok((StatusCode::CREATED, Json(view)))
}

/// Lists the caller's assessments.
pub async fn list_assessments<S: Store>(
    State(state): State<AppState<S>>,
    Extension(principal): Extension<Principal>,
) -> Result<impl IntoResponse, AppError> {
    let summaries = state.lifecycle.list_assessments(principal.id).await?;
    Ok(Json(summaries))
}

pub async fn get_assessment<S: Store>(
    State(state): State<AppState<S>>,
    Extension(principal): Extension<Principal>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let detail = state.lifecycle.get_assessment(id, principal.id).await?;
    Ok(Json(detail))
}

pub async fn add_question<S: Store>(
    State(state): State<AppState<S>>,
    Extension(principal): Extension<Principal>,
    Path(id): Path<i64>,
    Json(payload): Json<CreateQuestionRequest>,
) -> Result<impl IntoResponse, AppError> {
    let question = state
        .lifecycle
        .add_question(id, principal.id, payload)
        .await?;
    Ok((StatusCode::CREATED, Json(question)))
}

/// Publishes a draft with its window and student roster.
pub async fn publish<S: Store>(
    State(state): State<AppState<S>>,
    Extension(principal): Extension<Principal>,
    Path(id): Path<i64>,
    Json(payload): Json<PublishRequest>,
) -> Result<impl IntoResponse, AppError> {
    let view = state.lifecycle.publish(id, principal.id, payload).await?;
    Ok(Json(view))
}

pub async fn close<S: Store>(
    State(state): State<AppState<S>>,
    Extension(principal): Extension<Principal>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let view = state.lifecycle.close(id, principal.id).await?;
    Ok(Json(view))
}

pub async fn list_students<S: Store>(
    State(state): State<AppState<S>>,
    Extension(principal): Extension<Principal>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let students = state.lifecycle.list_students(id, principal.id).await?;
    Ok(Json(students))
}
