use axum::{
    extract::{Path, Query, State},
    Json,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::errors::AppError;
use crate::interviews::card::{build_card, InterviewCard};
use crate::interviews::feedback::{build_feedback_report, FeedbackReport};
use crate::models::interview::InterviewRow;
use crate::state::AppState;

#[derive(Deserialize)]
pub struct UserIdQuery {
    pub user_id: String,
}

#[derive(Serialize)]
pub struct InterviewDetailResponse {
    pub card: InterviewCard,
    pub experience: i32,
    pub question_count: usize,
}

/// Loads an interview owned by `user_id`. Interviews of other users are
/// reported as missing.
pub async fn load_owned_interview(
    state: &AppState,
    id: Uuid,
    user_id: &str,
) -> Result<InterviewRow, AppError> {
    state
        .interviews
        .get(id)
        .await?
        .filter(|i| i.user_id == user_id)
        .ok_or_else(|| AppError::NotFound(format!("Interview {id} not found")))
}

/// GET /api/v1/interviews
pub async fn handle_list_interviews(
    State(state): State<AppState>,
    Query(params): Query<UserIdQuery>,
) -> Result<Json<Vec<InterviewCard>>, AppError> {
    let interviews = state.interviews.list_for_user(&params.user_id).await?;
    Ok(Json(
        interviews.iter().map(|i| build_card(i, false)).collect(),
    ))
}

/// GET /api/v1/interviews/:id
pub async fn handle_get_interview(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Query(params): Query<UserIdQuery>,
) -> Result<Json<InterviewDetailResponse>, AppError> {
    let interview = load_owned_interview(&state, id, &params.user_id).await?;
    Ok(Json(InterviewDetailResponse {
        card: build_card(&interview, true),
        experience: interview.experience,
        question_count: interview.questions.0.len(),
    }))
}

/// GET /api/v1/interviews/:id/feedback
pub async fn handle_interview_feedback(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Query(params): Query<UserIdQuery>,
) -> Result<Json<FeedbackReport>, AppError> {
    let interview = load_owned_interview(&state, id, &params.user_id).await?;
    let answers = state
        .answers
        .answers_for_interview(&params.user_id, interview.id)
        .await?;
    Ok(Json(build_feedback_report(interview.id, answers)))
}
