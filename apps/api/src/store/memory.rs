use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::models::answer::{NewUserAnswer, UserAnswerRow};
use crate::models::interview::InterviewRow;
use crate::store::{AnswerStore, InterviewStore, StoreError};

/// In-memory store used by tests. Mirrors the PostgreSQL semantics,
/// including the conditional insert on `(user_id, question)`.
#[derive(Default)]
pub struct MemoryStore {
    interviews: RwLock<Vec<InterviewRow>>,
    answers: RwLock<Vec<UserAnswerRow>>,
    fail_writes: AtomicBool,
    lookups: AtomicUsize,
}

impl MemoryStore {
    pub fn with_interviews(interviews: Vec<InterviewRow>) -> Self {
        Self {
            interviews: RwLock::new(interviews),
            ..Default::default()
        }
    }

    /// Makes every subsequent insert fail until reset.
    pub fn set_fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    pub fn lookup_count(&self) -> usize {
        self.lookups.load(Ordering::SeqCst)
    }

    pub async fn answer_count(&self) -> usize {
        self.answers.read().await.len()
    }
}

#[async_trait]
impl InterviewStore for MemoryStore {
    async fn list_for_user(&self, user_id: &str) -> Result<Vec<InterviewRow>, StoreError> {
        let mut rows: Vec<InterviewRow> = self
            .interviews
            .read()
            .await
            .iter()
            .filter(|i| i.user_id == user_id)
            .cloned()
            .collect();
        rows.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(rows)
    }

    async fn get(&self, id: Uuid) -> Result<Option<InterviewRow>, StoreError> {
        Ok(self
            .interviews
            .read()
            .await
            .iter()
            .find(|i| i.id == id)
            .cloned())
    }
}

#[async_trait]
impl AnswerStore for MemoryStore {
    async fn find_answer(
        &self,
        user_id: &str,
        question: &str,
    ) -> Result<Option<UserAnswerRow>, StoreError> {
        self.lookups.fetch_add(1, Ordering::SeqCst);
        Ok(self
            .answers
            .read()
            .await
            .iter()
            .find(|a| a.user_id == user_id && a.question == question)
            .cloned())
    }

    async fn insert_answer(
        &self,
        answer: &NewUserAnswer,
    ) -> Result<Option<UserAnswerRow>, StoreError> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable("write rejected".to_string()));
        }
        let mut answers = self.answers.write().await;
        if answers
            .iter()
            .any(|a| a.user_id == answer.user_id && a.question == answer.question)
        {
            return Ok(None);
        }
        let row = UserAnswerRow {
            id: Uuid::new_v4(),
            mock_id_ref: answer.mock_id_ref,
            question: answer.question.clone(),
            correct_ans: answer.correct_ans.clone(),
            user_ans: answer.user_ans.clone(),
            feedback: answer.feedback.clone(),
            rating: answer.rating,
            user_id: answer.user_id.clone(),
            created_at: Utc::now(),
        };
        answers.push(row.clone());
        Ok(Some(row))
    }

    async fn answers_for_interview(
        &self,
        user_id: &str,
        mock_id_ref: Uuid,
    ) -> Result<Vec<UserAnswerRow>, StoreError> {
        Ok(self
            .answers
            .read()
            .await
            .iter()
            .filter(|a| a.user_id == user_id && a.mock_id_ref == mock_id_ref)
            .cloned()
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn answer(user: &str, question: &str) -> NewUserAnswer {
        NewUserAnswer {
            mock_id_ref: Uuid::nil(),
            question: question.to_string(),
            correct_ans: "ref".to_string(),
            user_ans: "mine".to_string(),
            feedback: "ok".to_string(),
            rating: 6,
            user_id: user.to_string(),
        }
    }

    #[tokio::test]
    async fn test_conditional_insert_keeps_first_record() {
        let store = MemoryStore::default();
        assert!(store.insert_answer(&answer("u1", "Q")).await.unwrap().is_some());
        assert!(store.insert_answer(&answer("u1", "Q")).await.unwrap().is_none());
        assert!(store.insert_answer(&answer("u2", "Q")).await.unwrap().is_some());
        assert_eq!(store.answer_count().await, 2);
    }

    #[tokio::test]
    async fn test_failing_writes_surface_unavailable() {
        let store = MemoryStore::default();
        store.set_fail_writes(true);
        let err = store.insert_answer(&answer("u1", "Q")).await.unwrap_err();
        assert!(matches!(err, StoreError::Unavailable(_)));
        assert_eq!(store.answer_count().await, 0);
    }
}
