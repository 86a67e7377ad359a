// src/services/attempt.rs

use std::{collections::HashMap, sync::Arc};

use validator::Validate;

use crate::{
    error::{AppError, AppResult},
    models::{
        answer::{NewAnswer, SubmitRequest},
        assessment::{AssessmentStatus, AssessmentSummary, total_score},
        assignment::{AssignmentStatus, StudentAssessmentEntry, StudentAssessmentView},
        question::Question,
        result::{AnswerDetail, GradingResult},
    },
    services::{analysis::generate_analysis, require_assessment, require_assessment_for_update},
    store::{AnswerStore, AssessmentStore, AssignmentStore, QuestionStore, Store, Transaction},
    utils::clock::Clock,
};

/// Student-side operations: start, submit and review an attempt.
///
/// Eligibility failures are reported as a single `NotEligible` without
/// saying which condition failed.
pub struct AttemptController<S: Store> {
    store: S,
    clock: Arc<dyn Clock>,
}

impl<S: Store> AttemptController<S> {
    pub fn new(store: S, clock: Arc<dyn Clock>) -> Self {
        Self { store, clock }
    }

    /// assigned -> started, only inside the window of a published assessment.
    pub async fn start(&self, assessment_id: i64, student_id: i64) -> AppResult<AssessmentSummary> {
        let now = self.clock.now();
        let mut tx = self.store.begin().await?;
        // Row lock orders this start against a concurrent close.
        let assessment = require_assessment_for_update(&mut tx, assessment_id).await?;
        let assignment = tx.find_assignment(assessment_id, student_id).await?;

        let open = assessment.status == AssessmentStatus::Published && assessment.window_contains(now);
        let assignment = match assignment {
            Some(a) if open && a.status == AssignmentStatus::Assigned => a,
            _ => {
                tracing::warn!(assessment_id, student_id, "Start rejected");
                return Err(not_eligible("This assessment cannot be started"));
            }
        };

        if !tx.mark_started(assignment.id, now).await? {
            tracing::warn!(assessment_id, student_id, "Start lost a race");
            return Err(not_eligible("This assessment cannot be started"));
        }

        let questions = tx.questions_for_assessment(assessment_id).await?;
        tx.commit().await?;

        tracing::info!(
            assessment_id,
            student_id,
            action = "attempt_start",
            "Attempt started"
        );

        Ok(AssessmentSummary::new(assessment, &questions))
    }

    /// Grades the batch and completes the attempt in one transaction.
    ///
    /// Items referencing a question outside this assessment are skipped.
    /// Duplicate items are graded and stored independently. Any store
    /// failure rolls back every answer and leaves the assignment started.
    pub async fn submit(
        &self,
        assessment_id: i64,
        student_id: i64,
        req: SubmitRequest,
    ) -> AppResult<GradingResult> {
        req.validate()?;

        let now = self.clock.now();
        let mut tx = self.store.begin().await?;
        let assessment = require_assessment(&mut tx, assessment_id).await?;
        let assignment = tx.find_assignment(assessment_id, student_id).await?;

        let assignment = match assignment {
            Some(a) if assessment.accepts_submission_at(now) && a.status == AssignmentStatus::Started => a,
            _ => {
                tracing::warn!(assessment_id, student_id, "Submit rejected");
                return Err(not_eligible("This assessment cannot be submitted"));
            }
        };

        let questions = tx.questions_for_assessment(assessment_id).await?;
        let by_id: HashMap<i64, &Question> = questions.iter().map(|q| (q.id, q)).collect();

        let mut earned: i64 = 0;
        let mut details = Vec::with_capacity(req.answers.len());
        for item in &req.answers {
            let Some(question) = by_id.get(&item.question_id) else {
                tracing::debug!(
                    assessment_id,
                    question_id = item.question_id,
                    "Skipping answer for foreign question"
                );
                continue;
            };

            let is_correct = question.is_correct(&item.answer);
            if is_correct {
                earned += i64::from(question.score);
            }

            let new_answer = NewAnswer {
                question_id: question.id,
                answer: item.answer.clone(),
                is_correct,
            };
            tx.insert_answer(assignment.id, &new_answer).await?;
            details.push(answer_detail(question, &item.answer, is_correct, false));
        }

        // The stored score is an INTEGER column; dropping `tx` here rolls back the answers.
        let score = i32::try_from(earned).map_err(|_| {
            tracing::warn!(assessment_id, student_id, earned, "Earned score out of range");
            AppError::ValidationError("Earned score exceeds the supported range".to_string())
        })?;

        // Conditional on status = started; a concurrent submit that already
        // completed the attempt makes this return false.
        if !tx.mark_completed(assignment.id, score, now).await? {
            tx.rollback().await?;
            tracing::warn!(assessment_id, student_id, "Submit lost a race");
            return Err(not_eligible("This assessment cannot be submitted"));
        }

        tx.commit().await?;

        tracing::info!(
            assessment_id,
            student_id,
            graded = details.len(),
            score,
            action = "attempt_submit",
            "Attempt graded"
        );

        Ok(GradingResult {
            assessment_id,
            title: assessment.title,
            description: assessment.description,
            total_score: total_score(&questions),
            your_score: score,
            completed_at: Some(now),
            analysis: generate_analysis(&details),
            answers: details,
        })
    }

    /// Rebuilds the graded breakdown from stored answers, options included.
    pub async fn get_result(&self, assessment_id: i64, student_id: i64) -> AppResult<GradingResult> {
        let mut tx = self.store.begin().await?;
        let assessment = require_assessment(&mut tx, assessment_id).await?;

        let assignment = match tx.find_assignment(assessment_id, student_id).await? {
            Some(a) if a.status == AssignmentStatus::Completed => a,
            _ => return Err(not_eligible("This assessment has not been completed")),
        };

        let questions = tx.questions_for_assessment(assessment_id).await?;
        let answers = tx.answers_for_assignment(assignment.id).await?;
        tx.commit().await?;

        let by_id: HashMap<i64, &Question> = questions.iter().map(|q| (q.id, q)).collect();
        let details: Vec<AnswerDetail> = answers
            .iter()
            .filter_map(|answer| {
                by_id
                    .get(&answer.question_id)
                    .map(|q| answer_detail(q, &answer.answer, answer.is_correct, true))
            })
            .collect();

        Ok(GradingResult {
            assessment_id,
            title: assessment.title,
            description: assessment.description,
            total_score: total_score(&questions),
            your_score: assignment.score,
            completed_at: assignment.completed_at,
            analysis: generate_analysis(&details),
            answers: details,
        })
    }

    /// Every assessment the student is assigned to, newest first.
    pub async fn list_for_student(&self, student_id: i64) -> AppResult<Vec<StudentAssessmentEntry>> {
        let mut tx = self.store.begin().await?;
        let assignments = tx.assignments_for_student(student_id).await?;

        let mut entries = Vec::with_capacity(assignments.len());
        for assignment in &assignments {
            let Some(assessment) = tx.find_assessment(assignment.assessment_id).await? else {
                continue;
            };
            let questions = tx.questions_for_assessment(assessment.id).await?;
            entries.push(StudentAssessmentEntry::new(
                AssessmentSummary::new(assessment, &questions),
                assignment,
            ));
        }
        tx.commit().await?;

        Ok(entries)
    }

    /// Questions without answers, for an assigned student only.
    pub async fn student_view(
        &self,
        assessment_id: i64,
        student_id: i64,
    ) -> AppResult<StudentAssessmentView> {
        let mut tx = self.store.begin().await?;
        let assessment = require_assessment(&mut tx, assessment_id).await?;

        let Some(assignment) = tx.find_assignment(assessment_id, student_id).await? else {
            return Err(AppError::Forbidden(
                "You are not assigned to this assessment".to_string(),
            ));
        };

        let questions = tx.questions_for_assessment(assessment_id).await?;
        tx.commit().await?;

        Ok(StudentAssessmentView {
            assessment: AssessmentSummary::new(assessment, &questions),
            assignment,
            questions: questions.into_iter().map(Into::into).collect(),
        })
    }
}

fn not_eligible(message: &str) -> AppError {
    AppError::NotEligible(message.to_string())
}

fn answer_detail(
    question: &Question,
    submitted: &str,
    is_correct: bool,
    with_options: bool,
) -> AnswerDetail {
    AnswerDetail {
        question_id: question.id,
        content: question.content.clone(),
        options: with_options.then(|| question.options.0.clone()),
        your_answer: submitted.to_string(),
        correct_answer: question.answer.clone(),
        is_correct,
        score: question.score,
        explanation: question.explanation.clone().filter(|e| !e.is_empty()),
    }
}
