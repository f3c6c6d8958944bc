pub mod health;

use axum::{
    routing::{get, post},
    Router,
};

use crate::interviews::handlers as interviews;
use crate::practice::handlers as practice;
use crate::state::AppState;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health_handler))
        // Interviews
        .route("/api/v1/interviews", get(interviews::handle_list_interviews))
        .route("/api/v1/interviews/:id", get(interviews::handle_get_interview))
        .route(
            "/api/v1/interviews/:id/feedback",
            get(interviews::handle_interview_feedback),
        )
        // One-shot scoring
        .route("/api/v1/answers/score", post(practice::handle_score_answer))
        // Practice sessions
        .route("/api/v1/sessions", post(practice::handle_start_session))
        .route(
            "/api/v1/sessions/:id",
            get(practice::handle_get_session).delete(practice::handle_end_session),
        )
        .route(
            "/api/v1/sessions/:id/questions/:index/activate",
            post(practice::handle_activate_question),
        )
        .route(
            "/api/v1/sessions/:id/questions/:index/playback",
            post(practice::handle_toggle_playback),
        )
        .route(
            "/api/v1/sessions/:id/playback/ended",
            post(practice::handle_playback_ended),
        )
        .route("/api/v1/sessions/:id/camera", post(practice::handle_camera))
        .route(
            "/api/v1/sessions/:id/capture/mode",
            post(practice::handle_set_mode),
        )
        .route(
            "/api/v1/sessions/:id/capture/recording/start",
            post(practice::handle_start_recording),
        )
        .route(
            "/api/v1/sessions/:id/capture/recording/stop",
            post(practice::handle_stop_recording),
        )
        .route(
            "/api/v1/sessions/:id/capture/recording/restart",
            post(practice::handle_restart_recording),
        )
        .route(
            "/api/v1/sessions/:id/capture/results",
            post(practice::handle_results),
        )
        .route(
            "/api/v1/sessions/:id/capture/text",
            post(practice::handle_set_text),
        )
        .route(
            "/api/v1/sessions/:id/capture/score",
            post(practice::handle_score),
        )
        .route(
            "/api/v1/sessions/:id/capture/save",
            post(practice::handle_save),
        )
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use async_trait::async_trait;
    use axum::{
        body::{to_bytes, Body},
        http::{Request, StatusCode},
    };
    use chrono::Utc;
    use serde_json::{json, Value};
    use sqlx::types::Json;
    use tower::ServiceExt;
    use uuid::Uuid;

    use crate::config::Config;
    use crate::models::interview::{InterviewRow, Question};
    use crate::practice::scoring::{AiResponse, AnswerScorer, ScoringError};
    use crate::practice::session::SessionRegistry;
    use crate::store::memory::MemoryStore;

    struct EchoScorer;

    #[async_trait]
    impl AnswerScorer for EchoScorer {
        async fn score(&self, _: &str, _: &str, answer: &str) -> Result<AiResponse, ScoringError> {
            Ok(AiResponse {
                ratings: 6,
                feedback: format!("Scored: {answer}"),
            })
        }
    }

    fn test_config() -> Config {
        Config {
            database_url: "postgres://localhost/mockprep_test".to_string(),
            gemini_api_key: "test-key".to_string(),
            gemini_model: "gemini-1.5-flash".to_string(),
            gemini_base_url: "http://localhost:0".to_string(),
            port: 0,
            rust_log: "debug".to_string(),
            session_idle_minutes: 30,
        }
    }

    fn app() -> (Router, Uuid) {
        let interview_id = Uuid::new_v4();
        let store = Arc::new(MemoryStore::with_interviews(vec![InterviewRow {
            id: interview_id,
            user_id: "user_1".to_string(),
            position: "Backend Engineer".to_string(),
            description: "Distributed systems".to_string(),
            experience: 4,
            tech_stack: "rust,tokio,postgres,redis,kafka".to_string(),
            questions: Json(vec![
                Question {
                    question: "What is a mutex?".to_string(),
                    answer: "A mutual exclusion lock".to_string(),
                },
                Question {
                    question: "What is backpressure?".to_string(),
                    answer: "Slowing producers".to_string(),
                },
            ]),
            created_at: Utc::now(),
        }]));
        let state = AppState {
            interviews: store.clone(),
            answers: store,
            scorer: Arc::new(EchoScorer),
            sessions: SessionRegistry::default(),
            config: test_config(),
        };
        (build_router(state), interview_id)
    }

    async fn send(app: &Router, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
        let request = Request::builder()
            .method(method)
            .uri(uri)
            .header("content-type", "application/json")
            .body(match body {
                Some(b) => Body::from(b.to_string()),
                None => Body::empty(),
            })
            .unwrap();
        let response = app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let value = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, value)
    }

    #[tokio::test]
    async fn test_health() {
        let (app, _) = app();
        let (status, body) = send(&app, "GET", "/health", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "ok");
        assert_eq!(body["active_sessions"], 0);
    }

    #[tokio::test]
    async fn test_list_interviews_returns_cards() {
        let (app, id) = app();
        let (status, body) = send(&app, "GET", "/api/v1/interviews?user_id=user_1", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body[0]["id"], id.to_string());
        assert_eq!(body[0]["tags"].as_array().unwrap().len(), 4);
        assert_eq!(body[0]["hidden_tags"], 1);

        let (_, other) = send(&app, "GET", "/api/v1/interviews?user_id=user_2", None).await;
        assert!(other.as_array().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_other_users_interview_is_not_found() {
        let (app, id) = app();
        let uri = format!("/api/v1/interviews/{id}?user_id=user_2");
        let (status, body) = send(&app, "GET", &uri, None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["error"]["code"], "NOT_FOUND");
    }

    #[tokio::test]
    async fn test_unknown_session_is_not_found() {
        let (app, _) = app();
        let uri = format!("/api/v1/sessions/{}", Uuid::new_v4());
        let (status, _) = send(&app, "GET", &uri, None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_text_answer_flow_end_to_end() {
        let (app, interview_id) = app();

        let (status, started) = send(
            &app,
            "POST",
            "/api/v1/sessions",
            Some(json!({
                "user_id": "user_1",
                "interview_id": interview_id,
                "camera_permission": "granted"
            })),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(started["session"]["camera_on"], true);
        assert_eq!(started["directives"][0]["kind"], "speak");
        assert_eq!(started["directives"][0]["text"], "What is a mutex?");
        let sid = started["session"]["id"].as_str().unwrap().to_string();

        let base = format!("/api/v1/sessions/{sid}");
        send(&app, "POST", &format!("{base}/capture/mode"), Some(json!({"mode": "text"}))).await;
        send(
            &app,
            "POST",
            &format!("{base}/capture/text"),
            Some(json!({"text": "A lock"})),
        )
        .await;

        let (_, scored) = send(&app, "POST", &format!("{base}/capture/score"), None).await;
        assert_eq!(scored["session"]["capture"]["phase"], "reviewing");
        assert_eq!(scored["session"]["capture"]["ai_result"]["feedback"], "Scored: A lock");

        let (_, saved) = send(&app, "POST", &format!("{base}/capture/save"), None).await;
        assert_eq!(saved["notifications"][0]["title"], "Saved");
        assert_eq!(saved["session"]["active_question"], 1);

        let feedback_uri = format!("/api/v1/interviews/{interview_id}/feedback?user_id=user_1");
        let (_, feedback) = send(&app, "GET", &feedback_uri, None).await;
        assert_eq!(feedback["answers"].as_array().unwrap().len(), 1);
        assert_eq!(feedback["overall_rating"], 6.0);

        let (status, _) = send(&app, "DELETE", &base, None).await;
        assert_eq!(status, StatusCode::NO_CONTENT);
    }

    #[tokio::test]
    async fn test_activate_unknown_question_is_not_found() {
        let (app, interview_id) = app();
        let (_, started) = send(
            &app,
            "POST",
            "/api/v1/sessions",
            Some(json!({"user_id": "user_1", "interview_id": interview_id})),
        )
        .await;
        let sid = started["session"]["id"].as_str().unwrap();
        let uri = format!("/api/v1/sessions/{sid}/questions/9/activate");
        let (status, _) = send(&app, "POST", &uri, None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_one_shot_scoring_rejects_short_speech() {
        let (app, _) = app();
        let (status, body) = send(
            &app,
            "POST",
            "/api/v1/answers/score",
            Some(json!({
                "question": "Q",
                "reference_answer": "A",
                "user_answer": "short",
                "mode": "speech"
            })),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"]["code"], "VALIDATION_ERROR");

        let (status, body) = send(
            &app,
            "POST",
            "/api/v1/answers/score",
            Some(json!({
                "question": "Q",
                "reference_answer": "A",
                "user_answer": "short",
                "mode": "text"
            })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["result"]["ratings"], 6);
        assert!(body["notification"].is_null());
    }
}
