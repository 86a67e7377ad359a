// src/services/mod.rs

pub mod analysis;
pub mod attempt;
pub mod lifecycle;

pub use attempt::AttemptController;
pub use lifecycle::LifecycleController;

use crate::{
    error::{AppError, AppResult},
    models::assessment::Assessment,
    store::AssessmentStore,
};

pub(crate) async fn require_assessment<T: AssessmentStore>(
    tx: &mut T,
    assessment_id: i64,
) -> AppResult<Assessment> {
    tx.find_assessment(assessment_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Assessment {} not found", assessment_id)))
}

pub(crate) async fn require_assessment_for_update<T: AssessmentStore>(
    tx: &mut T,
    assessment_id: i64,
) -> AppResult<Assessment> {
    tx.find_assessment_for_update(assessment_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Assessment {} not found", assessment_id)))
}
