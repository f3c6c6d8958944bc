use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::types::Json;
use sqlx::FromRow;
use uuid::Uuid;

/// One question/reference-answer pair of an interview.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Question {
    pub question: String,
    pub answer: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct InterviewRow {
    pub id: Uuid,
    pub user_id: String,
    pub position: String,
    pub description: String,
    pub experience: i32,
    /// Comma-separated tags, as entered when the interview was created.
    pub tech_stack: String,
    pub questions: Json<Vec<Question>>,
    pub created_at: DateTime<Utc>,
}

impl InterviewRow {
    pub fn tech_tags(&self) -> Vec<&str> {
        self.tech_stack
            .split(',')
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .collect()
    }
}
