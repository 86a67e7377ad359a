// src/store/memory.rs

use std::{
    collections::BTreeMap,
    sync::{
        Arc,
        atomic::{AtomicUsize, Ordering},
    },
};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::types::Json;
use tokio::sync::{Mutex, OwnedMutexGuard};

use crate::{
    error::{AppError, AppResult},
    models::{
        answer::{Answer, NewAnswer},
        assessment::{Assessment, AssessmentStatus},
        assignment::{Assignment, AssignmentStatus},
        question::{CreateQuestionRequest, Question},
    },
    store::{AnswerStore, AssessmentStore, AssignmentStore, QuestionStore, Store, Transaction},
};

const NO_FAILURE: usize = usize::MAX;

#[derive(Debug, Default, Clone)]
struct MemoryState {
    next_id: i64,
    assessments: BTreeMap<i64, Assessment>,
    questions: BTreeMap<i64, Question>,
    assignments: BTreeMap<i64, Assignment>,
    answers: BTreeMap<i64, Answer>,
}

impl MemoryState {
    fn next_id(&mut self) -> i64 {
        self.next_id += 1;
        self.next_id
    }
}

/// In-process store with fully serialised transactions.
///
/// `begin` takes an exclusive lock and snapshots the state; the snapshot is
/// restored when the transaction is dropped without `commit`.
///
/// Backs the controller and HTTP tests. Because transactions never overlap,
/// it cannot reproduce lost-race outcomes; those are covered against
/// [`PgStore`](crate::store::PgStore) in `tests/postgres_tests.rs`.
#[derive(Clone)]
pub struct MemoryStore {
    state: Arc<Mutex<MemoryState>>,
    writes_before_failure: Arc<AtomicUsize>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self {
            state: Arc::new(Mutex::new(MemoryState::default())),
            writes_before_failure: Arc::new(AtomicUsize::new(NO_FAILURE)),
        }
    }

    /// Test support: let `n` more writes succeed, then fail every write with
    /// `StoreFailure` until [`MemoryStore::clear_failure`] is called.
    ///
    /// The budget is shared by every clone of this store. Used by the rollback
    /// tests; production code never calls it.
    pub fn fail_writes_after(&self, n: usize) {
        self.writes_before_failure.store(n, Ordering::SeqCst);
    }

    /// Test support: stop injecting write failures.
    pub fn clear_failure(&self) {
        self.writes_before_failure
            .store(NO_FAILURE, Ordering::SeqCst);
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Store for MemoryStore {
    type Tx = MemoryTransaction;

    async fn begin(&self) -> AppResult<MemoryTransaction> {
        let guard = self.state.clone().lock_owned().await;
        let snapshot = guard.clone();
        Ok(MemoryTransaction {
            guard,
            snapshot: Some(snapshot),
            writes_before_failure: self.writes_before_failure.clone(),
        })
    }
}

pub struct MemoryTransaction {
    guard: OwnedMutexGuard<MemoryState>,
    snapshot: Option<MemoryState>,
    writes_before_failure: Arc<AtomicUsize>,
}

impl MemoryTransaction {
    fn write(&mut self) -> AppResult<&mut MemoryState> {
        let budget = self
            .writes_before_failure
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| match n {
                NO_FAILURE => Some(NO_FAILURE),
                0 => None,
                n => Some(n - 1),
            });
        match budget {
            Ok(_) => Ok(&mut *self.guard),
            Err(_) => Err(AppError::StoreFailure("injected write failure".to_string())),
        }
    }

    fn state(&self) -> &MemoryState {
        &*self.guard
    }
}

impl Drop for MemoryTransaction {
    fn drop(&mut self) {
        if let Some(snapshot) = self.snapshot.take() {
            *self.guard = snapshot;
        }
    }
}

#[async_trait]
impl Transaction for MemoryTransaction {
    async fn commit(mut self) -> AppResult<()> {
        self.snapshot = None;
        Ok(())
    }

    async fn rollback(self) -> AppResult<()> {
        Ok(())
    }
}

#[async_trait]
impl AssessmentStore for MemoryTransaction {
    async fn insert_assessment(
        &mut self,
        creator_id: i64,
        title: &str,
        description: &str,
    ) -> AppResult<Assessment> {
        let state = self.write()?;
        let assessment = Assessment {
            id: state.next_id(),
            title: title.to_string(),
            description: description.to_string(),
            status: AssessmentStatus::Draft,
            creator_id,
            start_time: None,
            end_time: None,
            created_at: Utc::now(),
        };
        state.assessments.insert(assessment.id, assessment.clone());
        Ok(assessment)
    }

    async fn find_assessment(&mut self, id: i64) -> AppResult<Option<Assessment>> {
        Ok(self.state().assessments.get(&id).cloned())
    }

    async fn find_assessment_for_update(&mut self, id: i64) -> AppResult<Option<Assessment>> {
        // The whole store is already locked by this transaction.
        self.find_assessment(id).await
    }

    async fn list_assessments_by_creator(&mut self, creator_id: i64) -> AppResult<Vec<Assessment>> {
        Ok(self
            .state()
            .assessments
            .values()
            .rev()
            .filter(|a| a.creator_id == creator_id)
            .cloned()
            .collect())
    }

    async fn mark_published(
        &mut self,
        id: i64,
        start_time: DateTime<Utc>,
        end_time: DateTime<Utc>,
    ) -> AppResult<bool> {
        let state = self.write()?;
        match state.assessments.get_mut(&id) {
            Some(a) if a.status == AssessmentStatus::Draft => {
                a.status = AssessmentStatus::Published;
                a.start_time = Some(start_time);
                a.end_time = Some(end_time);
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn mark_closed(&mut self, id: i64) -> AppResult<bool> {
        let state = self.write()?;
        match state.assessments.get_mut(&id) {
            Some(a) if a.status == AssessmentStatus::Published => {
                a.status = AssessmentStatus::Closed;
                Ok(true)
            }
            _ => Ok(false),
        }
    }
}

#[async_trait]
impl QuestionStore for MemoryTransaction {
    async fn insert_question(
        &mut self,
        assessment_id: i64,
        question: &CreateQuestionRequest,
    ) -> AppResult<Question> {
        let state = self.write()?;
        let question = Question {
            id: state.next_id(),
            assessment_id,
            question_type: question.question_type,
            content: question.content.clone(),
            options: Json(question.options.clone()),
            answer: question.answer.clone(),
            score: question.score,
            explanation: question.explanation.clone(),
            created_at: Utc::now(),
        };
        state.questions.insert(question.id, question.clone());
        Ok(question)
    }

    async fn questions_for_assessment(&mut self, assessment_id: i64) -> AppResult<Vec<Question>> {
        Ok(self
            .state()
            .questions
            .values()
            .filter(|q| q.assessment_id == assessment_id)
            .cloned()
            .collect())
    }
}

#[async_trait]
impl AssignmentStore for MemoryTransaction {
    async fn insert_assignment_if_absent(
        &mut self,
        assessment_id: i64,
        student_id: i64,
    ) -> AppResult<bool> {
        let state = self.write()?;
        let exists = state
            .assignments
            .values()
            .any(|a| a.assessment_id == assessment_id && a.student_id == student_id);
        if exists {
            return Ok(false);
        }

        let assignment = Assignment {
            id: state.next_id(),
            assessment_id,
            student_id,
            status: AssignmentStatus::Assigned,
            score: 0,
            started_at: None,
            completed_at: None,
        };
        state.assignments.insert(assignment.id, assignment);
        Ok(true)
    }

    async fn find_assignment(
        &mut self,
        assessment_id: i64,
        student_id: i64,
    ) -> AppResult<Option<Assignment>> {
        Ok(self
            .state()
            .assignments
            .values()
            .find(|a| a.assessment_id == assessment_id && a.student_id == student_id)
            .cloned())
    }

    async fn assignments_for_assessment(&mut self, assessment_id: i64) -> AppResult<Vec<Assignment>> {
        Ok(self
            .state()
            .assignments
            .values()
            .filter(|a| a.assessment_id == assessment_id)
            .cloned()
            .collect())
    }

    async fn assignments_for_student(&mut self, student_id: i64) -> AppResult<Vec<Assignment>> {
        Ok(self
            .state()
            .assignments
            .values()
            .rev()
            .filter(|a| a.student_id == student_id)
            .cloned()
            .collect())
    }

    async fn mark_started(&mut self, id: i64, at: DateTime<Utc>) -> AppResult<bool> {
        let state = self.write()?;
        match state.assignments.get_mut(&id) {
            Some(a) if a.status == AssignmentStatus::Assigned => {
                a.status = AssignmentStatus::Started;
                a.started_at = Some(at);
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn mark_completed(&mut self, id: i64, score: i32, at: DateTime<Utc>) -> AppResult<bool> {
        let state = self.write()?;
        match state.assignments.get_mut(&id) {
            Some(a) if a.status == AssignmentStatus::Started => {
                a.status = AssignmentStatus::Completed;
                a.score = score;
                a.completed_at = Some(at);
                Ok(true)
            }
            _ => Ok(false),
        }
    }
}

#[async_trait]
impl AnswerStore for MemoryTransaction {
    async fn insert_answer(&mut self, assignment_id: i64, answer: &NewAnswer) -> AppResult<Answer> {
        let state = self.write()?;
        let answer = Answer {
            id: state.next_id(),
            assignment_id,
            question_id: answer.question_id,
            answer: answer.answer.clone(),
            is_correct: answer.is_correct,
            created_at: Utc::now(),
        };
        state.answers.insert(answer.id, answer.clone());
        Ok(answer)
    }

    async fn answers_for_assignment(&mut self, assignment_id: i64) -> AppResult<Vec<Answer>> {
        Ok(self
            .state()
            .answers
            .values()
            .filter(|a| a.assignment_id == assignment_id)
            .cloned()
            .collect())
    }
}
