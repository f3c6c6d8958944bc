//! Question panel — which question is active, what is being spoken, and
//! whether the camera is on.

use serde::Serialize;
use tracing::{info, warn};

use crate::models::interview::Question;
use crate::practice::error::WorkflowError;
use crate::practice::speech::{CameraProbe, PermissionState, SpeechSynthesizer, UtteranceId};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PanelPhase {
    Idle,
    Speaking,
    AwaitingAnswer,
    Advancing,
}

/// The utterance currently playing. At most one exists.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ActiveUtterance {
    pub id: UtteranceId,
    pub question_index: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Advance {
    Moved { to: usize },
    /// The active question was the last one; nothing changed.
    Completed,
}

#[derive(Debug)]
pub struct QuestionPanel {
    questions: Vec<Question>,
    active: Option<usize>,
    phase: PanelPhase,
    utterance: Option<ActiveUtterance>,
    camera_on: bool,
}

impl QuestionPanel {
    pub fn new(questions: Vec<Question>) -> Self {
        Self {
            questions,
            active: None,
            phase: PanelPhase::Idle,
            utterance: None,
            camera_on: false,
        }
    }

    pub fn questions(&self) -> &[Question] {
        &self.questions
    }

    pub fn question(&self, index: usize) -> Option<&Question> {
        self.questions.get(index)
    }

    pub fn active(&self) -> Option<usize> {
        self.active
    }

    pub fn phase(&self) -> PanelPhase {
        self.phase
    }

    pub fn utterance(&self) -> Option<ActiveUtterance> {
        self.utterance
    }

    pub fn camera_on(&self) -> bool {
        self.camera_on
    }

    /// Probes the camera permission once, then activates the first question.
    /// A failed probe leaves the camera off.
    pub async fn mount(&mut self, probe: &dyn CameraProbe, synth: &mut dyn SpeechSynthesizer) {
        self.camera_on = match probe.query().await {
            Ok(state) => state == PermissionState::Granted,
            Err(e) => {
                warn!("Could not check camera permission: {e}");
                false
            }
        };

        if !self.questions.is_empty() {
            // Index 0 exists, so activation cannot fail.
            let _ = self.activate(0, synth);
        }
    }

    pub fn set_camera(&mut self, on: bool) {
        self.camera_on = on;
    }

    /// Makes `index` the active question and reads it aloud.
    /// Re-activating the active question does nothing.
    pub fn activate(
        &mut self,
        index: usize,
        synth: &mut dyn SpeechSynthesizer,
    ) -> Result<(), WorkflowError> {
        self.check_index(index)?;
        if self.active == Some(index) {
            return Ok(());
        }
        self.active = Some(index);
        self.start_playback(index, synth);
        Ok(())
    }

    /// Play/stop button for `index`. Stops playback if `index` is the one
    /// speaking; otherwise cancels whatever is speaking and starts `index`.
    pub fn toggle_playback(
        &mut self,
        index: usize,
        synth: &mut dyn SpeechSynthesizer,
    ) -> Result<(), WorkflowError> {
        self.check_index(index)?;
        match self.utterance {
            Some(u) if u.question_index == index => {
                synth.cancel();
                self.utterance = None;
                self.phase = self.resting_phase();
            }
            _ => self.start_playback(index, synth),
        }
        Ok(())
    }

    /// The browser finished speaking `id`. Stale ids are ignored.
    pub fn playback_ended(&mut self, id: UtteranceId) -> bool {
        match self.utterance {
            Some(u) if u.id == id => {
                self.utterance = None;
                self.phase = self.resting_phase();
                true
            }
            _ => false,
        }
    }

    /// Moves to the next question after a successful save.
    pub fn advance(&mut self, synth: &mut dyn SpeechSynthesizer) -> Advance {
        let Some(current) = self.active else {
            return Advance::Completed;
        };
        self.phase = PanelPhase::Advancing;
        let next = current + 1;
        if next < self.questions.len() {
            self.active = Some(next);
            self.start_playback(next, synth);
            Advance::Moved { to: next }
        } else {
            info!("All questions have been answered!");
            self.phase = self.resting_phase();
            Advance::Completed
        }
    }

    fn start_playback(&mut self, index: usize, synth: &mut dyn SpeechSynthesizer) {
        if self.utterance.take().is_some() {
            synth.cancel();
        }
        let text = self.questions[index].question.clone();
        match synth.speak(&text) {
            Some(id) => {
                self.utterance = Some(ActiveUtterance {
                    id,
                    question_index: index,
                });
                self.phase = PanelPhase::Speaking;
            }
            None => self.phase = self.resting_phase(),
        }
    }

    fn resting_phase(&self) -> PanelPhase {
        if self.utterance.is_some() {
            PanelPhase::Speaking
        } else if self.active.is_some() {
            PanelPhase::AwaitingAnswer
        } else {
            PanelPhase::Idle
        }
    }

    fn check_index(&self, index: usize) -> Result<(), WorkflowError> {
        if index < self.questions.len() {
            Ok(())
        } else {
            Err(WorkflowError::Validation(format!(
                "Question #{} does not exist",
                index + 1
            )))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::practice::speech::{DirectiveQueue, ReportedCameraPermission, SpeechDirective};

    fn questions(n: usize) -> Vec<Question> {
        (1..=n)
            .map(|i| Question {
                question: format!("Question {i}?"),
                answer: format!("Answer {i}"),
            })
            .collect()
    }

    async fn mounted(n: usize) -> (QuestionPanel, DirectiveQueue) {
        let mut panel = QuestionPanel::new(questions(n));
        let mut synth = DirectiveQueue::new(true);
        panel
            .mount(&ReportedCameraPermission(Some(PermissionState::Prompt)), &mut synth)
            .await;
        (panel, synth)
    }

    #[tokio::test]
    async fn test_mount_activates_and_speaks_first_question() {
        let (panel, mut synth) = mounted(3).await;
        assert_eq!(panel.active(), Some(0));
        assert_eq!(panel.phase(), PanelPhase::Speaking);
        assert_eq!(
            synth.drain(),
            vec![SpeechDirective::Speak {
                utterance_id: 1,
                text: "Question 1?".to_string()
            }]
        );
    }

    #[tokio::test]
    async fn test_mount_with_no_questions_stays_idle() {
        let (panel, mut synth) = mounted(0).await;
        assert_eq!(panel.phase(), PanelPhase::Idle);
        assert!(synth.drain().is_empty());
    }

    #[tokio::test]
    async fn test_camera_on_only_when_granted() {
        let mut synth = DirectiveQueue::new(true);

        let mut granted = QuestionPanel::new(questions(1));
        granted
            .mount(&ReportedCameraPermission(Some(PermissionState::Granted)), &mut synth)
            .await;
        assert!(granted.camera_on());

        let mut failed = QuestionPanel::new(questions(1));
        failed.mount(&ReportedCameraPermission(None), &mut synth).await;
        assert!(!failed.camera_on());
    }

    #[tokio::test]
    async fn test_toggle_same_question_stops_playback() {
        let (mut panel, mut synth) = mounted(2).await;
        synth.drain();
        panel.toggle_playback(0, &mut synth).unwrap();
        assert_eq!(panel.utterance(), None);
        assert_eq!(panel.phase(), PanelPhase::AwaitingAnswer);
        assert_eq!(synth.drain(), vec![SpeechDirective::Cancel]);
    }

    #[tokio::test]
    async fn test_toggle_other_question_cancels_before_speaking() {
        let (mut panel, mut synth) = mounted(2).await;
        synth.drain();
        panel.toggle_playback(1, &mut synth).unwrap();
        assert_eq!(
            synth.drain(),
            vec![
                SpeechDirective::Cancel,
                SpeechDirective::Speak {
                    utterance_id: 2,
                    text: "Question 2?".to_string()
                }
            ]
        );
        assert_eq!(panel.utterance().unwrap().question_index, 1);
    }

    #[tokio::test]
    async fn test_toggle_when_silent_starts_without_cancel() {
        let (mut panel, mut synth) = mounted(1).await;
        let id = panel.utterance().unwrap().id;
        assert!(panel.playback_ended(id));
        synth.drain();
        panel.toggle_playback(0, &mut synth).unwrap();
        let directives = synth.drain();
        assert_eq!(directives.len(), 1);
        assert!(matches!(directives[0], SpeechDirective::Speak { .. }));
    }

    #[tokio::test]
    async fn test_stale_playback_end_is_ignored() {
        let (mut panel, mut synth) = mounted(2).await;
        let first = panel.utterance().unwrap().id;
        panel.toggle_playback(1, &mut synth).unwrap();
        assert!(!panel.playback_ended(first));
        assert_eq!(panel.phase(), PanelPhase::Speaking);
    }

    #[tokio::test]
    async fn test_advance_moves_to_next_and_speaks() {
        let (mut panel, mut synth) = mounted(2).await;
        synth.drain();
        assert_eq!(panel.advance(&mut synth), Advance::Moved { to: 1 });
        assert_eq!(panel.active(), Some(1));
        assert_eq!(panel.phase(), PanelPhase::Speaking);
    }

    #[tokio::test]
    async fn test_advance_past_last_question_is_noop() {
        let (mut panel, mut synth) = mounted(3).await;
        panel.advance(&mut synth);
        panel.advance(&mut synth);
        assert_eq!(panel.active(), Some(2));
        synth.drain();

        assert_eq!(panel.advance(&mut synth), Advance::Completed);
        assert_eq!(panel.active(), Some(2));
        assert!(synth.drain().is_empty());
    }

    #[tokio::test]
    async fn test_activate_out_of_range_is_rejected() {
        let (mut panel, mut synth) = mounted(2).await;
        assert!(matches!(
            panel.activate(5, &mut synth),
            Err(WorkflowError::Validation(_))
        ));
        assert_eq!(panel.active(), Some(0));
    }

    #[tokio::test]
    async fn test_reactivating_active_question_does_nothing() {
        let (mut panel, mut synth) = mounted(2).await;
        synth.drain();
        panel.activate(0, &mut synth).unwrap();
        assert!(synth.drain().is_empty());
    }

    #[tokio::test]
    async fn test_without_synthesis_panel_awaits_answer() {
        let mut panel = QuestionPanel::new(questions(2));
        let mut synth = DirectiveQueue::new(false);
        panel
            .mount(&ReportedCameraPermission(Some(PermissionState::Granted)), &mut synth)
            .await;
        assert_eq!(panel.phase(), PanelPhase::AwaitingAnswer);
        assert_eq!(panel.utterance(), None);
    }
}
