// src/store/postgres.rs

use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{PgPool, Postgres, postgres::PgPoolOptions, types::Json};

use crate::{
    config::Config,
    error::AppResult,
    models::{
        answer::{Answer, NewAnswer},
        assessment::{Assessment, AssessmentStatus},
        assignment::{Assignment, AssignmentStatus},
        question::{CreateQuestionRequest, Question},
    },
    store::{AnswerStore, AssessmentStore, AssignmentStore, QuestionStore, Store, Transaction},
};

const ASSESSMENT_COLUMNS: &str =
    "id, title, description, status, creator_id, start_time, end_time, created_at";

const QUESTION_COLUMNS: &str =
    "id, assessment_id, type, content, options, answer, score, explanation, created_at";

const ASSIGNMENT_COLUMNS: &str =
    "id, assessment_id, student_id, status, score, started_at, completed_at";

const ANSWER_COLUMNS: &str = "id, assignment_id, question_id, answer, is_correct, created_at";

/// PostgreSQL-backed store. Transactions run at the default READ COMMITTED level;
/// status transitions rely on conditional updates and `FOR UPDATE` row locks.
#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Connects with retry, so the service can start before the database is ready.
    pub async fn connect(config: &Config) -> AppResult<Self> {
        let mut retry_count = 0;
        let pool = loop {
            match PgPoolOptions::new()
                .max_connections(config.max_connections)
                .acquire_timeout(Duration::from_secs(3))
                .connect(&config.database_url)
                .await
            {
                Ok(pool) => break pool,
                Err(e) => {
                    retry_count += 1;
                    if retry_count > 5 {
                        tracing::error!("Failed to connect to database after 5 retries: {}", e);
                        return Err(e.into());
                    }
                    tracing::warn!(
                        "Database not ready, retrying in 2s... (Attempt {})",
                        retry_count
                    );
                    tokio::time::sleep(Duration::from_secs(2)).await;
                }
            }
        };

        tracing::info!("Database connected...");
        Ok(Self::new(pool))
    }

    pub async fn migrate(&self) -> AppResult<()> {
        tracing::info!("Running migrations...");
        sqlx::migrate!("./migrations").run(&self.pool).await?;
        tracing::info!("Migrations applied successfully.");
        Ok(())
    }
}

#[async_trait]
impl Store for PgStore {
    type Tx = PgTransaction;

    async fn begin(&self) -> AppResult<PgTransaction> {
        let tx = self.pool.begin().await?;
        Ok(PgTransaction { tx })
    }
}

pub struct PgTransaction {
    tx: sqlx::Transaction<'static, Postgres>,
}

#[async_trait]
impl Transaction for PgTransaction {
    async fn commit(self) -> AppResult<()> {
        self.tx.commit().await?;
        Ok(())
    }

    async fn rollback(self) -> AppResult<()> {
        self.tx.rollback().await?;
        Ok(())
    }
}

#[async_trait]
impl AssessmentStore for PgTransaction {
    async fn insert_assessment(
        &mut self,
        creator_id: i64,
        title: &str,
        description: &str,
    ) -> AppResult<Assessment> {
        let assessment = sqlx::query_as::<_, Assessment>(&format!(
            "INSERT INTO assessments (title, description, status, creator_id)
            VALUES ($1, $2, $3, $4)
            RETURNING {ASSESSMENT_COLUMNS}"
        ))
        .bind(title)
        .bind(description)
        .bind(AssessmentStatus::Draft)
        .bind(creator_id)
        .fetch_one(&mut *self.tx)
        .await?;

        Ok(assessment)
    }

    async fn find_assessment(&mut self, id: i64) -> AppResult<Option<Assessment>> {
        let assessment = sqlx::query_as::<_, Assessment>(&format!(
            "SELECT {ASSESSMENT_COLUMNS} FROM assessments WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&mut *self.tx)
        .await?;

        Ok(assessment)
    }

    async fn find_assessment_for_update(&mut self, id: i64) -> AppResult<Option<Assessment>> {
        let assessment = sqlx::query_as::<_, Assessment>(&format!(
            "SELECT {ASSESSMENT_COLUMNS} FROM assessments WHERE id = $1 FOR UPDATE"
        ))
        .bind(id)
        .fetch_optional(&mut *self.tx)
        .await?;

        Ok(assessment)
    }

    async fn list_assessments_by_creator(&mut self, creator_id: i64) -> AppResult<Vec<Assessment>> {
        let assessments = sqlx::query_as::<_, Assessment>(&format!(
            "SELECT {ASSESSMENT_COLUMNS} FROM assessments WHERE creator_id = $1 ORDER BY id DESC"
        ))
        .bind(creator_id)
        .fetch_all(&mut *self.tx)
        .await?;

        Ok(assessments)
    }

    async fn mark_published(
        &mut self,
        id: i64,
        start_time: DateTime<Utc>,
        end_time: DateTime<Utc>,
    ) -> AppResult<bool> {
        let result = sqlx::query(
            "UPDATE assessments
            SET status = $2, start_time = $3, end_time = $4, updated_at = NOW()
            WHERE id = $1 AND status = $5",
        )
        .bind(id)
        .bind(AssessmentStatus::Published)
        .bind(start_time)
        .bind(end_time)
        .bind(AssessmentStatus::Draft)
        .execute(&mut *self.tx)
        .await?;

        Ok(result.rows_affected() == 1)
    }

    async fn mark_closed(&mut self, id: i64) -> AppResult<bool> {
        let result = sqlx::query(
            "UPDATE assessments SET status = $2, updated_at = NOW() WHERE id = $1 AND status = $3",
        )
        .bind(id)
        .bind(AssessmentStatus::Closed)
        .bind(AssessmentStatus::Published)
        .execute(&mut *self.tx)
        .await?;

        Ok(result.rows_affected() == 1)
    }
}

#[async_trait]
impl QuestionStore for PgTransaction {
    async fn insert_question(
        &mut self,
        assessment_id: i64,
        question: &CreateQuestionRequest,
    ) -> AppResult<Question> {
        let question = sqlx::query_as::<_, Question>(&format!(
            "INSERT INTO questions (assessment_id, type, content, options, answer, score, explanation)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING {QUESTION_COLUMNS}"
        ))
        .bind(assessment_id)
        .bind(question.question_type)
        .bind(&question.content)
        .bind(Json(&question.options))
        .bind(&question.answer)
        .bind(question.score)
        .bind(&question.explanation)
        .fetch_one(&mut *self.tx)
        .await?;

        Ok(question)
    }

    async fn questions_for_assessment(&mut self, assessment_id: i64) -> AppResult<Vec<Question>> {
        let questions = sqlx::query_as::<_, Question>(&format!(
            "SELECT {QUESTION_COLUMNS} FROM questions WHERE assessment_id = $1 ORDER BY id"
        ))
        .bind(assessment_id)
        .fetch_all(&mut *self.tx)
        .await?;

        Ok(questions)
    }
}

#[async_trait]
impl AssignmentStore for PgTransaction {
    async fn insert_assignment_if_absent(
        &mut self,
        assessment_id: i64,
        student_id: i64,
    ) -> AppResult<bool> {
        let result = sqlx::query(
            "INSERT INTO assignments (assessment_id, student_id, status)
            VALUES ($1, $2, $3)
            ON CONFLICT (assessment_id, student_id) DO NOTHING",
        )
        .bind(assessment_id)
        .bind(student_id)
        .bind(AssignmentStatus::Assigned)
        .execute(&mut *self.tx)
        .await?;

        Ok(result.rows_affected() == 1)
    }

    async fn find_assignment(
        &mut self,
        assessment_id: i64,
        student_id: i64,
    ) -> AppResult<Option<Assignment>> {
        let assignment = sqlx::query_as::<_, Assignment>(&format!(
            "SELECT {ASSIGNMENT_COLUMNS} FROM assignments
            WHERE assessment_id = $1 AND student_id = $2"
        ))
        .bind(assessment_id)
        .bind(student_id)
        .fetch_optional(&mut *self.tx)
        .await?;

        Ok(assignment)
    }

    async fn assignments_for_assessment(&mut self, assessment_id: i64) -> AppResult<Vec<Assignment>> {
        let assignments = sqlx::query_as::<_, Assignment>(&format!(
            "SELECT {ASSIGNMENT_COLUMNS} FROM assignments WHERE assessment_id = $1 ORDER BY id"
        ))
        .bind(assessment_id)
        .fetch_all(&mut *self.tx)
        .await?;

        Ok(assignments)
    }

    async fn assignments_for_student(&mut self, student_id: i64) -> AppResult<Vec<Assignment>> {
        let assignments = sqlx::query_as::<_, Assignment>(&format!(
            "SELECT {ASSIGNMENT_COLUMNS} FROM assignments WHERE student_id = $1 ORDER BY id DESC"
        ))
        .bind(student_id)
        .fetch_all(&mut *self.tx)
        .await?;

        Ok(assignments)
    }

    async fn mark_started(&mut self, id: i64, at: DateTime<Utc>) -> AppResult<bool> {
        let result = sqlx::query(
            "UPDATE assignments SET status = $2, started_at = $3 WHERE id = $1 AND status = $4",
        )
        .bind(id)
        .bind(AssignmentStatus::Started)
        .bind(at)
        .bind(AssignmentStatus::Assigned)
        .execute(&mut *self.tx)
        .await?;

        Ok(result.rows_affected() == 1)
    }

    async fn mark_completed(&mut self, id: i64, score: i32, at: DateTime<Utc>) -> AppResult<bool> {
        // A concurrent submit blocks on the row lock here and then sees status != started.
        let result = sqlx::query(
            "UPDATE assignments SET status = $2, score = $3, completed_at = $4
            WHERE id = $1 AND status = $5",
        )
        .bind(id)
        .bind(AssignmentStatus::Completed)
        .bind(score)
        .bind(at)
        .bind(AssignmentStatus::Started)
        .execute(&mut *self.tx)
        .await?;

        Ok(result.rows_affected() == 1)
    }
}

#[async_trait]
impl AnswerStore for PgTransaction {
    async fn insert_answer(&mut self, assignment_id: i64, answer: &NewAnswer) -> AppResult<Answer> {
        let answer = sqlx::query_as::<_, Answer>(&format!(
            "INSERT INTO answers (assignment_id, question_id, answer, is_correct)
            VALUES ($1, $2, $3, $4)
            RETURNING {ANSWER_COLUMNS}"
        ))
        .bind(assignment_id)
        .bind(answer.question_id)
        .bind(&answer.answer)
        .bind(answer.is_correct)
        .fetch_one(&mut *self.tx)
        .await?;

        Ok(answer)
    }

    async fn answers_for_assignment(&mut self, assignment_id: i64) -> AppResult<Vec<Answer>> {
        let answers = sqlx::query_as::<_, Answer>(&format!(
            "SELECT {ANSWER_COLUMNS} FROM answers WHERE assignment_id = $1 ORDER BY id"
        ))
        .bind(assignment_id)
        .fetch_all(&mut *self.tx)
        .await?;

        Ok(answers)
    }
}
