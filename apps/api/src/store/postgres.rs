use async_trait::async_trait;
use sqlx::PgPool;
use tracing::info;
use uuid::Uuid;

use crate::models::answer::{NewUserAnswer, UserAnswerRow};
use crate::models::interview::InterviewRow;
use crate::store::{AnswerStore, InterviewStore, StoreError};

/// PostgreSQL-backed implementation of both store traits.
#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl InterviewStore for PgStore {
    async fn list_for_user(&self, user_id: &str) -> Result<Vec<InterviewRow>, StoreError> {
        Ok(sqlx::query_as::<_, InterviewRow>(
            "SELECT * FROM interviews WHERE user_id = $1 ORDER BY created_at DESC",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?)
    }

    async fn get(&self, id: Uuid) -> Result<Option<InterviewRow>, StoreError> {
        Ok(
            sqlx::query_as::<_, InterviewRow>("SELECT * FROM interviews WHERE id = $1")
                .bind(id)
                .fetch_optional(&self.pool)
                .await?,
        )
    }
}

#[async_trait]
impl AnswerStore for PgStore {
    async fn find_answer(
        &self,
        user_id: &str,
        question: &str,
    ) -> Result<Option<UserAnswerRow>, StoreError> {
        Ok(sqlx::query_as::<_, UserAnswerRow>(
            "SELECT * FROM user_answers WHERE user_id = $1 AND question = $2 LIMIT 1",
        )
        .bind(user_id)
        .bind(question)
        .fetch_optional(&self.pool)
        .await?)
    }

    async fn insert_answer(
        &self,
        answer: &NewUserAnswer,
    ) -> Result<Option<UserAnswerRow>, StoreError> {
        // The unique index on (user_id, question) turns a lost race into a no-op.
        let row = sqlx::query_as::<_, UserAnswerRow>(
            r#"
            INSERT INTO user_answers
                (mock_id_ref, question, correct_ans, user_ans, feedback, rating, user_id)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            ON CONFLICT (user_id, question) DO NOTHING
            RETURNING *
            "#,
        )
        .bind(answer.mock_id_ref)
        .bind(&answer.question)
        .bind(&answer.correct_ans)
        .bind(&answer.user_ans)
        .bind(&answer.feedback)
        .bind(answer.rating)
        .bind(&answer.user_id)
        .fetch_optional(&self.pool)
        .await?;

        if let Some(row) = &row {
            info!(
                "Inserted user answer {} for user {} on interview {}",
                row.id, row.user_id, row.mock_id_ref
            );
        }
        Ok(row)
    }

    async fn answers_for_interview(
        &self,
        user_id: &str,
        mock_id_ref: Uuid,
    ) -> Result<Vec<UserAnswerRow>, StoreError> {
        Ok(sqlx::query_as::<_, UserAnswerRow>(
            "SELECT * FROM user_answers WHERE user_id = $1 AND mock_id_ref = $2 ORDER BY created_at",
        )
        .bind(user_id)
        .bind(mock_id_ref)
        .fetch_all(&self.pool)
        .await?)
    }
}
