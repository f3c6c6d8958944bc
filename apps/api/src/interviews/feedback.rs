use serde::Serialize;
use uuid::Uuid;

use crate::models::answer::UserAnswerRow;

#[derive(Debug, Serialize)]
pub struct FeedbackReport {
    pub interview_id: Uuid,
    /// Mean rating rounded to one decimal, `None` when nothing was answered.
    pub overall_rating: Option<f64>,
    pub answers: Vec<UserAnswerRow>,
}

pub fn build_feedback_report(interview_id: Uuid, answers: Vec<UserAnswerRow>) -> FeedbackReport {
    let overall_rating = if answers.is_empty() {
        None
    } else {
        let total: i64 = answers.iter().map(|a| a.rating as i64).sum();
        let mean = total as f64 / answers.len() as f64;
        Some((mean * 10.0).round() / 10.0)
    };

    FeedbackReport {
        interview_id,
        overall_rating,
        answers,
    }
}
