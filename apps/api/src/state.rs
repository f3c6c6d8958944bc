use std::sync::Arc;

use crate::config::Config;
use crate::practice::scoring::AnswerScorer;
use crate::practice::session::SessionRegistry;
use crate::store::{AnswerStore, InterviewStore};

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    pub interviews: Arc<dyn InterviewStore>,
    pub answers: Arc<dyn AnswerStore>,
    /// Pluggable answer scorer. Default: LlmAnswerScorer over the Gemini client.
    pub scorer: Arc<dyn AnswerScorer>,
    /// In-memory practice sessions, keyed by session id.
    pub sessions: SessionRegistry,
    pub config: Config,
}
