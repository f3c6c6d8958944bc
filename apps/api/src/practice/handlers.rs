//! Axum route handlers for practice sessions and one-shot scoring.
//!
//! Workflow failures come back as notifications in a 200 response; only
//! unknown sessions, unknown questions, and malformed requests are HTTP errors.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::errors::AppError;
use crate::interviews::handlers::load_owned_interview;
use crate::practice::capture::InputMode;
use crate::practice::notify::Notification;
use crate::practice::scoring::{score_or_fallback, AiResponse, MIN_SPEECH_ANSWER_CHARS};
use crate::practice::session::{self, PracticeSession, SessionHandle, SessionResponse, SessionView};
use crate::practice::speech::{PermissionState, ReportedCameraPermission, UtteranceId};
use crate::practice::transcript::RecognitionResult;
use crate::state::AppState;

// ────────────────────────────────────────────────────────────────────────────
// Request / Response types
// ────────────────────────────────────────────────────────────────────────────

fn default_true() -> bool {
    true
}

#[derive(Debug, Deserialize)]
pub struct StartSessionRequest {
    pub user_id: String,
    pub interview_id: Uuid,
    /// Result of the browser's camera permission query, if it could run one.
    #[serde(default)]
    pub camera_permission: Option<PermissionState>,
    #[serde(default = "default_true")]
    pub speech_synthesis: bool,
}

#[derive(Debug, Deserialize)]
pub struct PlaybackEndedRequest {
    pub utterance_id: UtteranceId,
}

#[derive(Debug, Deserialize)]
pub struct CameraRequest {
    pub enabled: bool,
    /// Media-capture error reported by the browser.
    #[serde(default)]
    pub error: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ModeRequest {
    pub mode: InputMode,
}

#[derive(Debug, Deserialize)]
pub struct ResultsRequest {
    pub results: Vec<RecognitionResult>,
    #[serde(default)]
    pub interim: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct TextRequest {
    pub text: String,
}

#[derive(Debug, Deserialize)]
pub struct ScoreAnswerRequest {
    pub question: String,
    pub reference_answer: String,
    pub user_answer: String,
    #[serde(default)]
    pub mode: InputMode,
}

#[derive(Debug, Serialize)]
pub struct ScoreAnswerResponse {
    pub result: AiResponse,
    pub notification: Option<Notification>,
}

// ────────────────────────────────────────────────────────────────────────────
// Helpers
// ────────────────────────────────────────────────────────────────────────────

async fn find_session(state: &AppState, id: Uuid) -> Result<SessionHandle, AppError> {
    state
        .sessions
        .get(id)
        .await
        .ok_or_else(|| AppError::NotFound(format!("Session {id} not found")))
}

/// Runs a synchronous transition and returns the resulting response.
async fn apply(
    state: &AppState,
    id: Uuid,
    f: impl FnOnce(&mut PracticeSession),
) -> Result<Json<SessionResponse>, AppError> {
    let handle = find_session(state, id).await?;
    let mut session = handle.lock().await;
    f(&mut session);
    Ok(Json(session.respond()))
}

fn check_question_index(session: &PracticeSession, index: usize) -> Result<(), AppError> {
    if index < session.question_count() {
        Ok(())
    } else {
        Err(AppError::NotFound(format!("Question #{} not found", index + 1)))
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Handlers
// ────────────────────────────────────────────────────────────────────────────

/// POST /api/v1/sessions
///
/// Mounts the question panel for an interview: probes the camera and starts
/// reading the first question.
pub async fn handle_start_session(
    State(state): State<AppState>,
    Json(request): Json<StartSessionRequest>,
) -> Result<(StatusCode, Json<SessionResponse>), AppError> {
    if request.user_id.trim().is_empty() {
        return Err(AppError::Validation("user_id cannot be empty".to_string()));
    }

    let interview = load_owned_interview(&state, request.interview_id, &request.user_id).await?;
    let probe = ReportedCameraPermission(request.camera_permission);
    let session =
        PracticeSession::start(request.user_id, &interview, &probe, request.speech_synthesis).await;

    let handle = state.sessions.insert(session).await;
    let response = handle.lock().await.respond();
    Ok((StatusCode::CREATED, Json(response)))
}

/// GET /api/v1/sessions/:id
pub async fn handle_get_session(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<SessionView>, AppError> {
    let handle = find_session(&state, id).await?;
    let mut session = handle.lock().await;
    session.touch();
    Ok(Json(session.view()))
}

/// DELETE /api/v1/sessions/:id
pub async fn handle_end_session(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    if state.sessions.remove(id).await {
        tracing::info!("Ended practice session {id}");
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(AppError::NotFound(format!("Session {id} not found")))
    }
}

/// POST /api/v1/sessions/:id/questions/:index/activate
pub async fn handle_activate_question(
    State(state): State<AppState>,
    Path((id, index)): Path<(Uuid, usize)>,
) -> Result<Json<SessionResponse>, AppError> {
    let handle = find_session(&state, id).await?;
    let mut session = handle.lock().await;
    check_question_index(&session, index)?;
    session.activate(index);
    Ok(Json(session.respond()))
}

/// POST /api/v1/sessions/:id/questions/:index/playback
pub async fn handle_toggle_playback(
    State(state): State<AppState>,
    Path((id, index)): Path<(Uuid, usize)>,
) -> Result<Json<SessionResponse>, AppError> {
    let handle = find_session(&state, id).await?;
    let mut session = handle.lock().await;
    check_question_index(&session, index)?;
    session.toggle_playback(index);
    Ok(Json(session.respond()))
}

/// POST /api/v1/sessions/:id/playback/ended
pub async fn handle_playback_ended(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(request): Json<PlaybackEndedRequest>,
) -> Result<Json<SessionResponse>, AppError> {
    apply(&state, id, |s| s.playback_ended(request.utterance_id)).await
}

/// POST /api/v1/sessions/:id/camera
pub async fn handle_camera(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(request): Json<CameraRequest>,
) -> Result<Json<SessionResponse>, AppError> {
    apply(&state, id, |s| s.set_camera(request.enabled, request.error)).await
}

/// POST /api/v1/sessions/:id/capture/mode
pub async fn handle_set_mode(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(request): Json<ModeRequest>,
) -> Result<Json<SessionResponse>, AppError> {
    apply(&state, id, |s| s.set_mode(request.mode)).await
}

/// POST /api/v1/sessions/:id/capture/recording/start
pub async fn handle_start_recording(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<SessionResponse>, AppError> {
    apply(&state, id, |s| s.start_recording()).await
}

/// POST /api/v1/sessions/:id/capture/recording/restart
pub async fn handle_restart_recording(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<SessionResponse>, AppError> {
    apply(&state, id, |s| s.restart_recording()).await
}

/// POST /api/v1/sessions/:id/capture/recording/stop
///
/// In speech mode a non-empty transcript is scored before responding.
pub async fn handle_stop_recording(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<SessionResponse>, AppError> {
    let handle = find_session(&state, id).await?;
    Ok(Json(
        session::stop_recording(&handle, state.scorer.as_ref()).await,
    ))
}

/// POST /api/v1/sessions/:id/capture/results
pub async fn handle_results(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(request): Json<ResultsRequest>,
) -> Result<Json<SessionResponse>, AppError> {
    apply(&state, id, |s| s.apply_results(request.results, request.interim)).await
}

/// POST /api/v1/sessions/:id/capture/text
pub async fn handle_set_text(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(request): Json<TextRequest>,
) -> Result<Json<SessionResponse>, AppError> {
    apply(&state, id, |s| s.set_text(request.text)).await
}

/// POST /api/v1/sessions/:id/capture/score
pub async fn handle_score(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<SessionResponse>, AppError> {
    let handle = find_session(&state, id).await?;
    Ok(Json(
        session::request_score(&handle, state.scorer.as_ref()).await,
    ))
}

/// POST /api/v1/sessions/:id/capture/save
pub async fn handle_save(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<SessionResponse>, AppError> {
    let handle = find_session(&state, id).await?;
    Ok(Json(session::save(&handle, state.answers.as_ref()).await))
}

/// POST /api/v1/answers/score
///
/// Scores a single answer outside a session. Failures degrade to the
/// fallback result, reported through `notification`.
pub async fn handle_score_answer(
    State(state): State<AppState>,
    Json(request): Json<ScoreAnswerRequest>,
) -> Result<Json<ScoreAnswerResponse>, AppError> {
    if request.question.trim().is_empty() {
        return Err(AppError::Validation("question cannot be empty".to_string()));
    }
    if request.mode == InputMode::Speech
        && request.user_answer.chars().count() < MIN_SPEECH_ANSWER_CHARS
    {
        return Err(AppError::Validation(format!(
            "Your answer should be more than {MIN_SPEECH_ANSWER_CHARS} characters"
        )));
    }

    let (result, error) = score_or_fallback(
        state.scorer.as_ref(),
        &request.question,
        &request.reference_answer,
        &request.user_answer,
    )
    .await;

    Ok(Json(ScoreAnswerResponse {
        result,
        notification: error.map(|e| e.notification()),
    }))
}
