//! Persistence seams for interviews and user answers.
//!
//! Handlers and the practice workflow only see the traits. `AppState` carries
//! `Arc<dyn InterviewStore>` and `Arc<dyn AnswerStore>`, backed by PostgreSQL
//! in production and by the in-memory stores in tests.

use async_trait::async_trait;
use thiserror::Error;
use uuid::Uuid;

use crate::models::answer::{NewUserAnswer, UserAnswerRow};
use crate::models::interview::InterviewRow;

#[cfg(test)]
pub mod memory;
pub mod postgres;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Store unavailable: {0}")]
    Unavailable(String),
}

#[async_trait]
pub trait InterviewStore: Send + Sync {
    /// Interviews owned by `user_id`, newest first.
    async fn list_for_user(&self, user_id: &str) -> Result<Vec<InterviewRow>, StoreError>;

    async fn get(&self, id: Uuid) -> Result<Option<InterviewRow>, StoreError>;
}

#[async_trait]
pub trait AnswerStore: Send + Sync {
    /// Equality lookup on `(user_id, question)`.
    async fn find_answer(
        &self,
        user_id: &str,
        question: &str,
    ) -> Result<Option<UserAnswerRow>, StoreError>;

    /// Writes the answer unless one already exists for `(user_id, question)`.
    /// Returns `None` when an existing record won.
    async fn insert_answer(
        &self,
        answer: &NewUserAnswer,
    ) -> Result<Option<UserAnswerRow>, StoreError>;

    /// All answers a user saved for one interview, oldest first.
    async fn answers_for_interview(
        &self,
        user_id: &str,
        mock_id_ref: Uuid,
    ) -> Result<Vec<UserAnswerRow>, StoreError>;
}
