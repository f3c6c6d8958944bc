use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct UserAnswerRow {
    pub id: Uuid,
    pub mock_id_ref: Uuid,
    pub question: String,
    pub correct_ans: String,
    pub user_ans: String,
    pub feedback: String,
    pub rating: i32,
    pub user_id: String,
    pub created_at: DateTime<Utc>,
}

/// A user answer ready to be written. `id` and `created_at` are assigned by the store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewUserAnswer {
    pub mock_id_ref: Uuid,
    pub question: String,
    pub correct_ans: String,
    pub user_ans: String,
    pub feedback: String,
    pub rating: i32,
    pub user_id: String,
}
