//! Practice sessions — one question panel plus one answer capture per
//! question, kept in memory for the lifetime of a practice run.
//!
//! Synchronous transitions run under the session lock. The scoring and save
//! drivers release the lock while the external call is in flight and take it
//! again to apply the result, so a slow AI or store call never blocks reads
//! of the session.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use serde::Serialize;
use tokio::sync::{Mutex, RwLock};
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{info, warn};
use uuid::Uuid;

use crate::models::answer::{NewUserAnswer, UserAnswerRow};
use crate::models::interview::InterviewRow;
use crate::practice::capture::{
    AnswerCapture, CapturePhase, InputMode, SaveContext, ScoreRequest,
};
use crate::practice::error::{Operation, WorkflowError};
use crate::practice::notify::Notification;
use crate::practice::panel::{ActiveUtterance, Advance, PanelPhase, QuestionPanel};
use crate::practice::scoring::{score_or_fallback, AiResponse, AnswerScorer};
use crate::practice::speech::{
    CameraProbe, DirectiveQueue, SpeechDirective, UtteranceId,
};
use crate::practice::transcript::RecognitionResult;
use crate::store::AnswerStore;

pub type SessionHandle = Arc<Mutex<PracticeSession>>;

#[derive(Clone, Default)]
pub struct SessionRegistry {
    sessions: Arc<RwLock<HashMap<Uuid, SessionHandle>>>,
}

impl SessionRegistry {
    pub async fn insert(&self, session: PracticeSession) -> SessionHandle {
        let id = session.id;
        let handle = Arc::new(Mutex::new(session));
        self.sessions.write().await.insert(id, handle.clone());
        handle
    }

    pub async fn get(&self, id: Uuid) -> Option<SessionHandle> {
        self.sessions.read().await.get(&id).cloned()
    }

    pub async fn remove(&self, id: Uuid) -> bool {
        self.sessions.write().await.remove(&id).is_some()
    }

    pub async fn len(&self) -> usize {
        self.sessions.read().await.len()
    }

    /// Drops sessions with no activity for `max_idle`. Sessions whose lock
    /// is held are in use and are kept.
    pub async fn evict_idle(&self, max_idle: Duration) -> usize {
        let cutoff = Utc::now() - max_idle;
        let mut sessions = self.sessions.write().await;
        let before = sessions.len();
        sessions.retain(|_, handle| match handle.try_lock() {
            Ok(session) => session.last_activity >= cutoff,
            Err(_) => true,
        });
        let evicted = before - sessions.len();
        if evicted > 0 {
            info!("Evicted {evicted} idle practice sessions");
        }
        evicted
    }

    /// Runs [`Self::evict_idle`] every `every` until the runtime shuts down.
    pub fn spawn_sweeper(&self, max_idle: Duration, every: std::time::Duration) -> JoinHandle<()> {
        let registry = self.clone();
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(every);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                ticker.tick().await;
                registry.evict_idle(max_idle).await;
            }
        })
    }
}

#[derive(Debug, Serialize)]
pub struct QuestionView {
    pub index: usize,
    pub label: String,
    pub question: String,
    pub answered: bool,
}

#[derive(Debug, Serialize)]
pub struct CaptureView {
    pub question_index: usize,
    pub mode: InputMode,
    pub phase: CapturePhase,
    pub answer: String,
    pub interim: Option<String>,
    pub recognized_segments: usize,
    pub ai_result: Option<AiResponse>,
    pub can_save: bool,
}

#[derive(Debug, Serialize)]
pub struct SessionView {
    pub id: Uuid,
    pub interview_id: Uuid,
    pub user_id: String,
    pub questions: Vec<QuestionView>,
    pub active_question: Option<usize>,
    pub panel_phase: PanelPhase,
    pub utterance: Option<ActiveUtterance>,
    pub camera_on: bool,
    pub capture: Option<CaptureView>,
    pub completed: bool,
    pub created_at: DateTime<Utc>,
}

/// Body of every session endpoint: the new state plus whatever the browser
/// must do (speak, cancel) or show (notifications).
#[derive(Debug, Serialize)]
pub struct SessionResponse {
    pub session: SessionView,
    pub directives: Vec<SpeechDirective>,
    pub notifications: Vec<Notification>,
}

#[derive(Debug)]
pub struct PracticeSession {
    pub id: Uuid,
    pub user_id: String,
    pub interview_id: Uuid,
    panel: QuestionPanel,
    captures: Vec<AnswerCapture>,
    answered: Vec<bool>,
    synth: DirectiveQueue,
    notifications: Vec<Notification>,
    created_at: DateTime<Utc>,
    last_activity: DateTime<Utc>,
}

impl PracticeSession {
    /// Mounts the panel for `interview`: probes the camera once and starts
    /// reading the first question.
    pub async fn start(
        user_id: String,
        interview: &InterviewRow,
        probe: &dyn CameraProbe,
        speech_available: bool,
    ) -> Self {
        let questions = interview.questions.0.clone();
        let count = questions.len();
        let now = Utc::now();
        let mut session = Self {
            id: Uuid::new_v4(),
            user_id,
            interview_id: interview.id,
            panel: QuestionPanel::new(questions),
            captures: vec![AnswerCapture::default(); count],
            answered: vec![false; count],
            synth: DirectiveQueue::new(speech_available),
            notifications: Vec::new(),
            created_at: now,
            last_activity: now,
        };
        session.panel.mount(probe, &mut session.synth).await;
        info!(
            "Started practice session {} for interview {} ({} questions)",
            session.id, session.interview_id, count
        );
        session
    }

    pub fn question_count(&self) -> usize {
        self.panel.questions().len()
    }

    /// Marks the session as in use so the idle sweeper keeps it.
    pub fn touch(&mut self) {
        self.last_activity = Utc::now();
    }

    /// Drains pending directives and notifications into a response.
    pub fn respond(&mut self) -> SessionResponse {
        self.touch();
        SessionResponse {
            session: self.view(),
            directives: self.synth.drain(),
            notifications: std::mem::take(&mut self.notifications),
        }
    }

    pub fn view(&self) -> SessionView {
        let questions = self
            .panel
            .questions()
            .iter()
            .enumerate()
            .map(|(index, q)| QuestionView {
                index,
                label: format!("Question #{}", index + 1),
                question: q.question.clone(),
                answered: self.answered[index],
            })
            .collect();

        let capture = self.panel.active().map(|index| {
            let c = &self.captures[index];
            CaptureView {
                question_index: index,
                mode: c.mode(),
                phase: c.phase(),
                answer: c.answer().to_string(),
                interim: c.interim().map(str::to_string),
                recognized_segments: c.results().len(),
                ai_result: c.ai_result().cloned(),
                can_save: c.can_save(),
            }
        });

        SessionView {
            id: self.id,
            interview_id: self.interview_id,
            user_id: self.user_id.clone(),
            questions,
            active_question: self.panel.active(),
            panel_phase: self.panel.phase(),
            utterance: self.panel.utterance(),
            camera_on: self.panel.camera_on(),
            capture,
            completed: !self.answered.is_empty() && self.answered.iter().all(|a| *a),
            created_at: self.created_at,
        }
    }

    fn notify(&mut self, notification: Notification) {
        self.notifications.push(notification);
    }

    fn report(&mut self, error: WorkflowError) {
        warn!("Session {}: {error}", self.id);
        self.notify(error.notification());
    }

    fn report_result(&mut self, result: Result<(), WorkflowError>) {
        if let Err(e) = result {
            self.report(e);
        }
    }

    fn active_index(&self) -> Result<usize, WorkflowError> {
        self.panel.active().ok_or(WorkflowError::InvalidState {
            action: "capture an answer",
            phase: "no question is active".to_string(),
        })
    }

    fn with_active_capture<T>(
        &mut self,
        f: impl FnOnce(&mut AnswerCapture) -> Result<T, WorkflowError>,
    ) -> Result<(usize, T), WorkflowError> {
        let index = self.active_index()?;
        let value = f(&mut self.captures[index])?;
        Ok((index, value))
    }

    pub fn activate(&mut self, index: usize) {
        let result = self.panel.activate(index, &mut self.synth);
        self.report_result(result);
    }

    pub fn toggle_playback(&mut self, index: usize) {
        let result = self.panel.toggle_playback(index, &mut self.synth);
        self.report_result(result);
    }

    pub fn playback_ended(&mut self, utterance_id: UtteranceId) {
        self.panel.playback_ended(utterance_id);
    }

    /// Camera toggle. `error` carries the browser's media-capture failure,
    /// which forces the camera off.
    pub fn set_camera(&mut self, enabled: bool, error: Option<String>) {
        match error {
            Some(e) => {
                self.panel.set_camera(false);
                self.report(WorkflowError::Permission(e));
            }
            None => self.panel.set_camera(enabled),
        }
    }

    pub fn set_mode(&mut self, mode: InputMode) {
        let result = self
            .with_active_capture(|c| {
                c.set_mode(mode);
                Ok(())
            })
            .map(|_| ());
        self.report_result(result);
    }

    pub fn start_recording(&mut self) {
        let result = self.with_active_capture(|c| c.start_recording()).map(|_| ());
        self.report_result(result);
    }

    pub fn restart_recording(&mut self) {
        let result = self
            .with_active_capture(|c| c.restart_recording())
            .map(|_| ());
        self.report_result(result);
    }

    pub fn apply_results(&mut self, results: Vec<RecognitionResult>, interim: Option<String>) {
        let result = self
            .with_active_capture(|c| Ok(c.apply_results(results, interim)))
            .map(|_| ());
        self.report_result(result);
    }

    pub fn set_text(&mut self, text: String) {
        let result = self.with_active_capture(|c| c.set_text(text)).map(|_| ());
        self.report_result(result);
    }

    /// Stops recording and, when the stop qualifies, begins scoring.
    fn stop_and_begin_scoring(&mut self) -> Option<PendingScore> {
        match self.with_active_capture(|c| c.stop_recording()) {
            Ok((index, true)) => self.begin_scoring_at(index),
            Ok((_, false)) => None,
            Err(e) => {
                self.report(e);
                None
            }
        }
    }

    fn begin_scoring_active(&mut self) -> Option<PendingScore> {
        match self.active_index() {
            Ok(index) => self.begin_scoring_at(index),
            Err(e) => {
                self.report(e);
                None
            }
        }
    }

    fn begin_scoring_at(&mut self, index: usize) -> Option<PendingScore> {
        match self.captures[index].begin_scoring() {
            Ok(request) => {
                let q = &self.panel.questions()[index];
                Some(PendingScore {
                    index,
                    question: q.question.clone(),
                    reference_answer: q.answer.clone(),
                    request,
                })
            }
            Err(e) => {
                self.report(e);
                None
            }
        }
    }

    fn complete_scoring(&mut self, pending: &PendingScore, result: AiResponse, error: Option<WorkflowError>) {
        if let Some(e) = error {
            self.report(e);
        }
        let fallback = result.is_sentinel();
        if self.captures[pending.index].complete_scoring(&pending.request, result) && fallback {
            warn!("Question #{} is showing the fallback result", pending.index + 1);
        }
    }

    fn begin_save(&mut self) -> Option<PendingSave> {
        let index = match self.active_index() {
            Ok(index) => index,
            Err(e) => {
                self.report(e);
                return None;
            }
        };
        let q = self.panel.question(index)?;
        let ctx = SaveContext {
            user_id: &self.user_id,
            interview_id: self.interview_id,
            question: &q.question,
            reference_answer: &q.answer,
        };
        match self.captures[index].begin_save(&ctx) {
            Ok(record) => Some(PendingSave { index, record }),
            Err(e) => {
                self.report(e);
                None
            }
        }
    }

    fn complete_save(&mut self, pending: PendingSave, outcome: Result<UserAnswerRow, WorkflowError>) {
        let outcome = outcome.map(|row| {
            info!(
                "Session {} saved answer {} (rating {})",
                self.id, row.id, row.rating
            );
        });
        self.captures[pending.index].complete_save(&outcome);

        match outcome {
            Ok(()) => {
                self.answered[pending.index] = true;
                self.notify(Notification::success("Saved", "Your answer has been saved."));
                if self.panel.active() == Some(pending.index) {
                    if let Advance::Completed = self.panel.advance(&mut self.synth) {
                        self.notify(Notification::info(
                            "Completed",
                            "All questions have been answered!",
                        ));
                    }
                }
            }
            Err(e) => self.report(e),
        }
    }
}

struct PendingScore {
    index: usize,
    question: String,
    reference_answer: String,
    request: ScoreRequest,
}

struct PendingSave {
    index: usize,
    record: NewUserAnswer,
}

/// Read-before-write persistence of one answer.
///
/// An existing record for `(user_id, question)` is reported as `Duplicate`
/// and nothing is written. The store's conditional insert covers the window
/// between the lookup and the write.
pub async fn persist_answer(
    store: &dyn AnswerStore,
    record: &NewUserAnswer,
) -> Result<UserAnswerRow, WorkflowError> {
    let network = |e: crate::store::StoreError| WorkflowError::Network {
        operation: Operation::Saving,
        detail: e.to_string(),
    };

    if store
        .find_answer(&record.user_id, &record.question)
        .await
        .map_err(network)?
        .is_some()
    {
        return Err(WorkflowError::Duplicate);
    }

    store
        .insert_answer(record)
        .await
        .map_err(network)?
        .ok_or(WorkflowError::Duplicate)
}

async fn run_scoring(handle: &SessionHandle, pending: PendingScore, scorer: &dyn AnswerScorer) -> SessionResponse {
    let (result, error) = score_or_fallback(
        scorer,
        &pending.question,
        &pending.reference_answer,
        &pending.request.candidate_answer,
    )
    .await;

    let mut session = handle.lock().await;
    session.complete_scoring(&pending, result, error);
    session.respond()
}

/// Stop button. In speech mode a non-empty transcript is scored right away.
pub async fn stop_recording(handle: &SessionHandle, scorer: &dyn AnswerScorer) -> SessionResponse {
    let pending = {
        let mut session = handle.lock().await;
        match session.stop_and_begin_scoring() {
            Some(pending) => pending,
            None => return session.respond(),
        }
    };
    run_scoring(handle, pending, scorer).await
}

/// Explicit "Submit" / feedback request.
pub async fn request_score(handle: &SessionHandle, scorer: &dyn AnswerScorer) -> SessionResponse {
    let pending = {
        let mut session = handle.lock().await;
        match session.begin_scoring_active() {
            Some(pending) => pending,
            None => return session.respond(),
        }
    };
    run_scoring(handle, pending, scorer).await
}

/// Persists the rated answer of the active question and advances the panel.
pub async fn save(handle: &SessionHandle, store: &dyn AnswerStore) -> SessionResponse {
    let pending = {
        let mut session = handle.lock().await;
        match session.begin_save() {
            Some(pending) => pending,
            None => return session.respond(),
        }
    };

    let outcome = persist_answer(store, &pending.record).await;

    let mut session = handle.lock().await;
    session.complete_save(pending, outcome);
    session.respond()
}
