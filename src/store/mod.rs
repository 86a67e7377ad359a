// src/store/mod.rs

//! Abstract transactional store.
//!
//! Controllers never talk to a database directly. They open a transaction
//! with [`Store::begin`], use the four store traits on it, and either
//! [`Transaction::commit`] or drop it. Dropping an uncommitted transaction
//! rolls back every write made through it.

pub mod memory;
pub mod postgres;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::{
    error::AppResult,
    models::{
        answer::{Answer, NewAnswer},
        assessment::Assessment,
        assignment::Assignment,
        question::{CreateQuestionRequest, Question},
    },
};

pub use memory::MemoryStore;
pub use postgres::PgStore;

#[async_trait]
pub trait AssessmentStore: Send {
    async fn insert_assessment(
        &mut self,
        creator_id: i64,
        title: &str,
        description: &str,
    ) -> AppResult<Assessment>;

    async fn find_assessment(&mut self, id: i64) -> AppResult<Option<Assessment>>;

    /// Like `find_assessment`, but holds a row lock until the transaction ends.
    async fn find_assessment_for_update(&mut self, id: i64) -> AppResult<Option<Assessment>>;

    async fn list_assessments_by_creator(&mut self, creator_id: i64) -> AppResult<Vec<Assessment>>;

    /// draft -> published, storing the window. Returns false if the row was not in draft.
    async fn mark_published(
        &mut self,
        id: i64,
        start_time: DateTime<Utc>,
        end_time: DateTime<Utc>,
    ) -> AppResult<bool>;

    /// published -> closed. Returns false if the row was not published.
    async fn mark_closed(&mut self, id: i64) -> AppResult<bool>;
}

#[async_trait]
pub trait QuestionStore: Send {
    async fn insert_question(
        &mut self,
        assessment_id: i64,
        question: &CreateQuestionRequest,
    ) -> AppResult<Question>;

    /// Ordered by id.
    async fn questions_for_assessment(&mut self, assessment_id: i64) -> AppResult<Vec<Question>>;
}

#[async_trait]
pub trait AssignmentStore: Send {
    /// Returns false when the (assessment, student) pair already exists.
    async fn insert_assignment_if_absent(
        &mut self,
        assessment_id: i64,
        student_id: i64,
    ) -> AppResult<bool>;

    async fn find_assignment(
        &mut self,
        assessment_id: i64,
        student_id: i64,
    ) -> AppResult<Option<Assignment>>;

    async fn assignments_for_assessment(&mut self, assessment_id: i64) -> AppResult<Vec<Assignment>>;

    async fn assignments_for_student(&mut self, student_id: i64) -> AppResult<Vec<Assignment>>;

    /// assigned -> started. Returns false if the row was not assigned.
    async fn mark_started(&mut self, id: i64, at: DateTime<Utc>) -> AppResult<bool>;

    /// started -> completed with the final score. Returns false if the row was not started.
    async fn mark_completed(&mut self, id: i64, score: i32, at: DateTime<Utc>) -> AppResult<bool>;
}

#[async_trait]
pub trait AnswerStore: Send {
    async fn insert_answer(&mut self, assignment_id: i64, answer: &NewAnswer) -> AppResult<Answer>;

    /// Ordered by id, i.e. submission order.
    async fn answers_for_assignment(&mut self, assignment_id: i64) -> AppResult<Vec<Answer>>;
}

#[async_trait]
pub trait Transaction:
    AssessmentStore + QuestionStore + AssignmentStore + AnswerStore + Send + Sized + 'static
{
    async fn commit(self) -> AppResult<()>;

    async fn rollback(self) -> AppResult<()>;
}

#[async_trait]
pub trait Store: Clone + Send + Sync + 'static {
    type Tx: Transaction;

    async fn begin(&self) -> AppResult<Self::Tx>;
}
