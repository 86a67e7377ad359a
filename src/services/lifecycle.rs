// src/services/lifecycle.rs

use validator::Validate;

use crate::{
    error::{AppError, AppResult},
    models::{
        assessment::{
            Assessment, AssessmentDetail, AssessmentStatus, AssessmentSummary, AssessmentView,
            CreateAssessmentRequest, PublishRequest,
        },
        assignment::Assignment,
        question::{CreateQuestionRequest, Question},
    },
    services::{require_assessment, require_assessment_for_update},
    store::{AssessmentStore, AssignmentStore, QuestionStore, Store, Transaction},
};

/// Teacher-side operations: authoring, publishing and closing assessments.
pub struct LifecycleController<S: Store> {
    store: S,
}

impl<S: Store> LifecycleController<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// Creates a draft with no window and no questions.
    pub async fn create_assessment(
        &self,
        creator_id: i64,
        req: CreateAssessmentRequest,
    ) -> AppResult<AssessmentView> {
        req.validate()?;

        let mut tx = self.store.begin().await?;
        let assessment = tx
            .insert_assessment(creator_id, &req.title, &req.description)
            .await?;
        tx.commit().await?;

        tracing::info!(
            assessment_id = assessment.id,
            creator_id,
            action = "assessment_create",
            "Assessment created"
        );

        Ok(AssessmentView::new(assessment, Vec::new()))
    }

    /// Adds a question to a draft.
    ///
    /// The status check comes before the ownership check: a published
    /// assessment rejects new questions with `InvalidState` whoever asks.
    pub async fn add_question(
        &self,
        assessment_id: i64,
        caller_id: i64,
        req: CreateQuestionRequest,
    ) -> AppResult<Question> {
        let mut tx = self.store.begin().await?;
        let assessment = require_assessment_for_update(&mut tx, assessment_id).await?;

        if assessment.status != AssessmentStatus::Draft {
            return Err(AppError::InvalidState(
                "Questions can only be added to a draft assessment".to_string(),
            ));
        }
        ensure_creator(&assessment, caller_id)?;
        req.validate()?;

        let question = tx.insert_question(assessment_id, &req).await?;
        tx.commit().await?;

        tracing::info!(
            assessment_id,
            question_id = question.id,
            score = question.score,
            "Question added"
        );

        Ok(question)
    }

    /// Publishes a draft: stores the window and assigns the roster, all in one transaction.
    ///
    /// Students that already have an assignment for this assessment are left untouched.
    pub async fn publish(
        &self,
        assessment_id: i64,
        caller_id: i64,
        req: PublishRequest,
    ) -> AppResult<AssessmentView> {
        let mut tx = self.store.begin().await?;
        let assessment = require_assessment_for_update(&mut tx, assessment_id).await?;

        ensure_creator(&assessment, caller_id)?;
        if assessment.status != AssessmentStatus::Draft {
            return Err(AppError::InvalidState(
                "Only a draft assessment can be published".to_string(),
            ));
        }

        let questions = tx.questions_for_assessment(assessment_id).await?;
        if questions.is_empty() {
            return Err(AppError::ValidationError(
                "An assessment must contain at least one question".to_string(),
            ));
        }

        let (start_time, end_time) = req.window()?;

        if !tx
            .mark_published(assessment_id, start_time, end_time)
            .await?
        {
            tracing::warn!(assessment_id, "Publish lost a race with another transition");
            return Err(AppError::InvalidState(
                "Only a draft assessment can be published".to_string(),
            ));
        }

        let mut assigned = 0usize;
        for student_id in &req.student_ids {
            if tx
                .insert_assignment_if_absent(assessment_id, *student_id)
                .await?
            {
                assigned += 1;
            }
        }

        let published = require_assessment(&mut tx, assessment_id).await?;
        tx.commit().await?;

        tracing::info!(
            assessment_id,
            teacher_id = caller_id,
            roster = req.student_ids.len(),
            assigned,
            action = "assessment_publish",
            "Assessment published"
        );

        Ok(AssessmentView::new(published, questions))
    }

    /// Closes a published assessment. Assignments and answers are not touched.
    pub async fn close(&self, assessment_id: i64, caller_id: i64) -> AppResult<AssessmentView> {
        let mut tx = self.store.begin().await?;
        let assessment = require_assessment_for_update(&mut tx, assessment_id).await?;

        ensure_creator(&assessment, caller_id)?;
        if assessment.status != AssessmentStatus::Published {
            return Err(AppError::InvalidState(
                "Only a published assessment can be closed".to_string(),
            ));
        }

        if !tx.mark_closed(assessment_id).await? {
            tracing::warn!(assessment_id, "Close lost a race with another transition");
            return Err(AppError::InvalidState(
                "Only a published assessment can be closed".to_string(),
            ));
        }

        let closed = require_assessment(&mut tx, assessment_id).await?;
        let questions = tx.questions_for_assessment(assessment_id).await?;
        tx.commit().await?;

        tracing::info!(
            assessment_id,
            teacher_id = caller_id,
            action = "assessment_close",
            "Assessment closed"
        );

        Ok(AssessmentView::new(closed, questions))
    }

    pub async fn list_assessments(&self, creator_id: i64) -> AppResult<Vec<AssessmentSummary>> {
        let mut tx = self.store.begin().await?;
        let assessments = tx.list_assessments_by_creator(creator_id).await?;

        let mut summaries = Vec::with_capacity(assessments.len());
        for assessment in assessments {
            let questions = tx.questions_for_assessment(assessment.id).await?;
            summaries.push(AssessmentSummary::new(assessment, &questions));
        }
        tx.commit().await?;

        Ok(summaries)
    }

    /// Creator's full view, answers included.
    pub async fn get_assessment(
        &self,
        assessment_id: i64,
        caller_id: i64,
    ) -> AppResult<AssessmentDetail> {
        let mut tx = self.store.begin().await?;
        let assessment = require_assessment(&mut tx, assessment_id).await?;
        ensure_creator(&assessment, caller_id)?;

        let questions = tx.questions_for_assessment(assessment_id).await?;
        let students = tx.assignments_for_assessment(assessment_id).await?;
        tx.commit().await?;

        Ok(AssessmentDetail {
            view: AssessmentView::new(assessment, questions),
            students,
        })
    }

    pub async fn list_students(
        &self,
        assessment_id: i64,
        caller_id: i64,
    ) -> AppResult<Vec<Assignment>> {
        let mut tx = self.store.begin().await?;
        let assessment = require_assessment(&mut tx, assessment_id).await?;
        ensure_creator(&assessment, caller_id)?;

        let students = tx.assignments_for_assessment(assessment_id).await?;
        tx.commit().await?;

        Ok(students)
    }
}

fn ensure_creator(assessment: &Assessment, caller_id: i64) -> AppResult<()> {
    if !assessment.is_created_by(caller_id) {
        tracing::warn!(
            assessment_id = assessment.id,
            caller_id,
            "Rejected non-creator access"
        );
        return Err(AppError::Forbidden(
            "You do not have access to this assessment".to_string(),
        ));
    }
    Ok(())
}
