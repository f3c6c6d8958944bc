//! Answer capture — records one question's answer from speech or typing,
//! holds the AI rating, and produces the record to persist.
//!
//! Only synchronous transitions live here. The session driver performs the
//! scoring and store calls between a `begin_*` and its `complete_*`, so the
//! capture is never borrowed across an await.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::models::answer::NewUserAnswer;
use crate::practice::error::WorkflowError;
use crate::practice::scoring::{AiResponse, MIN_SPEECH_ANSWER_CHARS};
use crate::practice::transcript::{assemble_transcript, RecognitionResult};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InputMode {
    #[default]
    Speech,
    Text,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CapturePhase {
    Recording,
    Stopped,
    Scoring,
    Reviewing,
    Saving,
}

impl std::fmt::Display for CapturePhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            CapturePhase::Recording => "recording",
            CapturePhase::Stopped => "stopped",
            CapturePhase::Scoring => "scoring",
            CapturePhase::Reviewing => "reviewing",
            CapturePhase::Saving => "saving",
        };
        f.write_str(s)
    }
}

/// Snapshot handed to the scorer. `attempt` ties the result back to the
/// capture state it was taken from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScoreRequest {
    pub attempt: u64,
    pub candidate_answer: String,
}

/// What the record must be attributed to.
#[derive(Debug, Clone)]
pub struct SaveContext<'a> {
    pub user_id: &'a str,
    pub interview_id: uuid::Uuid,
    pub question: &'a str,
    pub reference_answer: &'a str,
}

#[derive(Debug, Clone)]
pub struct AnswerCapture {
    mode: InputMode,
    phase: CapturePhase,
    results: Vec<RecognitionResult>,
    interim: Option<String>,
    answer: String,
    ai_result: Option<AiResponse>,
    /// Recording state as of the last transition; a true→false edge in
    /// speech mode is what triggers automatic scoring.
    was_recording: bool,
    attempt: u64,
}

impl Default for AnswerCapture {
    fn default() -> Self {
        Self {
            mode: InputMode::Speech,
            phase: CapturePhase::Stopped,
            results: Vec::new(),
            interim: None,
            answer: String::new(),
            ai_result: None,
            was_recording: false,
            attempt: 0,
        }
    }
}

impl AnswerCapture {
    pub fn mode(&self) -> InputMode {
        self.mode
    }

    pub fn phase(&self) -> CapturePhase {
        self.phase
    }

    pub fn answer(&self) -> &str {
        &self.answer
    }

    pub fn results(&self) -> &[RecognitionResult] {
        &self.results
    }

    pub fn interim(&self) -> Option<&str> {
        self.interim.as_deref()
    }

    pub fn ai_result(&self) -> Option<&AiResponse> {
        self.ai_result.as_ref()
    }

    pub fn can_save(&self) -> bool {
        self.ai_result.is_some() && !self.is_busy()
    }

    fn is_busy(&self) -> bool {
        matches!(self.phase, CapturePhase::Scoring | CapturePhase::Saving)
    }

    fn ensure_idle(&self, action: &'static str) -> Result<(), WorkflowError> {
        if self.is_busy() {
            Err(WorkflowError::InvalidState {
                action,
                phase: self.phase.to_string(),
            })
        } else {
            Ok(())
        }
    }

    fn settled_phase(&self) -> CapturePhase {
        if self.ai_result.is_some() {
            CapturePhase::Reviewing
        } else {
            CapturePhase::Stopped
        }
    }

    /// Switches between speech and text input. Captured text is kept.
    /// Leaving speech mode stops a running recording without scoring it.
    pub fn set_mode(&mut self, mode: InputMode) {
        if self.mode == mode {
            return;
        }
        if self.phase == CapturePhase::Recording {
            self.phase = self.settled_phase();
        }
        self.was_recording = false;
        self.interim = None;
        self.mode = mode;
    }

    fn ensure_speech(&self, action: &'static str) -> Result<(), WorkflowError> {
        if self.mode == InputMode::Speech {
            Ok(())
        } else {
            Err(WorkflowError::InvalidState {
                action,
                phase: "in text mode".to_string(),
            })
        }
    }

    /// Replaces the answer. A rating taken for different text is dropped.
    fn replace_answer(&mut self, answer: String) {
        if answer == self.answer {
            return;
        }
        self.answer = answer;
        if self.ai_result.take().is_some() {
            debug!("Answer changed after scoring; discarding the rating");
            self.attempt += 1;
            if self.phase == CapturePhase::Reviewing {
                self.phase = CapturePhase::Stopped;
            }
        }
    }

    pub fn start_recording(&mut self) -> Result<(), WorkflowError> {
        self.ensure_idle("start recording")?;
        self.ensure_speech("start recording")?;
        self.phase = CapturePhase::Recording;
        self.was_recording = true;
        Ok(())
    }

    /// Stops recording. Returns `true` when the stop should trigger scoring:
    /// speech mode with a non-empty transcript.
    pub fn stop_recording(&mut self) -> Result<bool, WorkflowError> {
        if self.phase != CapturePhase::Recording {
            return Err(WorkflowError::InvalidState {
                action: "stop recording",
                phase: self.phase.to_string(),
            });
        }
        self.phase = self.settled_phase();
        self.interim = None;
        let stopped_edge = std::mem::replace(&mut self.was_recording, false);
        Ok(stopped_edge && self.mode == InputMode::Speech && !self.answer.trim().is_empty())
    }

    /// "Record again": discards the answer and its rating and starts over.
    pub fn restart_recording(&mut self) -> Result<(), WorkflowError> {
        self.ensure_idle("record again")?;
        self.ensure_speech("record again")?;
        self.results.clear();
        self.interim = None;
        self.answer.clear();
        self.ai_result = None;
        self.attempt += 1;
        self.phase = CapturePhase::Stopped;
        self.start_recording()
    }

    /// Replaces the recognition results and recomputes the answer from them.
    /// Ignored in text mode so typed text is never overwritten, and while a
    /// scoring or save call holds the current answer.
    pub fn apply_results(&mut self, results: Vec<RecognitionResult>, interim: Option<String>) -> bool {
        if self.mode != InputMode::Speech {
            debug!("Ignoring recognition results in text mode");
            return false;
        }
        if self.is_busy() {
            debug!("Ignoring recognition results while {}", self.phase);
            return false;
        }
        self.replace_answer(assemble_transcript(&results));
        self.results = results;
        self.interim = interim.filter(|s| !s.is_empty());
        true
    }

    pub fn set_text(&mut self, text: String) -> Result<(), WorkflowError> {
        self.ensure_idle("edit the answer")?;
        if self.mode != InputMode::Text {
            return Err(WorkflowError::InvalidState {
                action: "edit the answer",
                phase: "in speech mode".to_string(),
            });
        }
        self.replace_answer(text);
        Ok(())
    }

    /// Validates the answer and moves to `Scoring`. A running recording is
    /// stopped first. Speech answers under the minimum length are rejected.
    pub fn begin_scoring(&mut self) -> Result<ScoreRequest, WorkflowError> {
        self.ensure_idle("request feedback")?;
        if self.phase == CapturePhase::Recording {
            self.phase = self.settled_phase();
            self.interim = None;
        }
        self.was_recording = false;

        if self.mode == InputMode::Speech && self.answer.chars().count() < MIN_SPEECH_ANSWER_CHARS {
            return Err(WorkflowError::Validation(format!(
                "Your answer should be more than {MIN_SPEECH_ANSWER_CHARS} characters"
            )));
        }

        self.attempt += 1;
        self.phase = CapturePhase::Scoring;
        Ok(ScoreRequest {
            attempt: self.attempt,
            candidate_answer: self.answer.clone(),
        })
    }

    /// Stores the rating for `request`. Returns `false` if the capture moved
    /// on since the request was taken.
    pub fn complete_scoring(&mut self, request: &ScoreRequest, result: AiResponse) -> bool {
        if self.phase != CapturePhase::Scoring || self.attempt != request.attempt {
            debug!("Discarding stale scoring result for attempt {}", request.attempt);
            return false;
        }
        self.ai_result = Some(result);
        self.phase = CapturePhase::Reviewing;
        true
    }

    /// Builds the record to persist and moves to `Saving`.
    pub fn begin_save(&mut self, ctx: &SaveContext<'_>) -> Result<NewUserAnswer, WorkflowError> {
        self.ensure_idle("save")?;
        let result = self.ai_result.as_ref().ok_or(WorkflowError::NoResult)?;
        let record = NewUserAnswer {
            mock_id_ref: ctx.interview_id,
            question: ctx.question.to_string(),
            correct_ans: ctx.reference_answer.to_string(),
            user_ans: self.answer.clone(),
            feedback: result.feedback.clone(),
            rating: result.ratings,
            user_id: ctx.user_id.to_string(),
        };
        self.was_recording = false;
        self.interim = None;
        self.phase = CapturePhase::Saving;
        Ok(record)
    }

    /// Applies the save outcome. Success clears the capture; any failure
    /// leaves the rated answer in place for a manual retry.
    pub fn complete_save(&mut self, outcome: &Result<(), WorkflowError>) {
        if self.phase != CapturePhase::Saving {
            return;
        }
        match outcome {
            Ok(()) => {
                self.results.clear();
                self.answer.clear();
                self.ai_result = None;
                self.attempt += 1;
                self.phase = CapturePhase::Stopped;
            }
            Err(_) => self.phase = CapturePhase::Reviewing,
        }
    }
}
