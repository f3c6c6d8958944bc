//! Browser capabilities the practice panel depends on.
//!
//! Speech synthesis and camera permission live in the browser. The panel only
//! talks to these traits: the server implementations queue directives for the
//! browser to execute and replay the permission state the browser reported.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::practice::error::WorkflowError;

pub type UtteranceId = u64;

/// An instruction for the browser's speech synthesizer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SpeechDirective {
    Speak { utterance_id: UtteranceId, text: String },
    Cancel,
}

pub trait SpeechSynthesizer: Send {
    /// Queues `text` for playback. Returns `None` when synthesis is unavailable.
    fn speak(&mut self, text: &str) -> Option<UtteranceId>;

    fn cancel(&mut self);
}

/// Synthesizer that records directives until the response is built.
#[derive(Debug)]
pub struct DirectiveQueue {
    available: bool,
    next_id: UtteranceId,
    pending: Vec<SpeechDirective>,
}

impl DirectiveQueue {
    pub fn new(available: bool) -> Self {
        Self {
            available,
            next_id: 1,
            pending: Vec::new(),
        }
    }

    pub fn drain(&mut self) -> Vec<SpeechDirective> {
        std::mem::take(&mut self.pending)
    }
}

impl SpeechSynthesizer for DirectiveQueue {
    fn speak(&mut self, text: &str) -> Option<UtteranceId> {
        if !self.available {
            return None;
        }
        let id = self.next_id;
        self.next_id += 1;
        self.pending.push(SpeechDirective::Speak {
            utterance_id: id,
            text: text.to_string(),
        });
        Some(id)
    }

    fn cancel(&mut self) {
        self.pending.push(SpeechDirective::Cancel);
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PermissionState {
    Granted,
    Denied,
    Prompt,
}

#[async_trait]
pub trait CameraProbe: Send + Sync {
    async fn query(&self) -> Result<PermissionState, WorkflowError>;
}

/// Camera permission as reported by the browser when the session started.
/// `None` means the browser could not query it.
pub struct ReportedCameraPermission(pub Option<PermissionState>);

#[async_trait]
impl CameraProbe for ReportedCameraPermission {
    async fn query(&self) -> Result<PermissionState, WorkflowError> {
        self.0.ok_or_else(|| {
            WorkflowError::Permission("browser did not report camera permission".to_string())
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_queue_assigns_increasing_ids() {
        let mut queue = DirectiveQueue::new(true);
        assert_eq!(queue.speak("one"), Some(1));
        queue.cancel();
        assert_eq!(queue.speak("two"), Some(2));
        assert_eq!(
            queue.drain(),
            vec![
                SpeechDirective::Speak {
                    utterance_id: 1,
                    text: "one".to_string()
                },
                SpeechDirective::Cancel,
                SpeechDirective::Speak {
                    utterance_id: 2,
                    text: "two".to_string()
                },
            ]
        );
        assert!(queue.drain().is_empty());
    }

    #[test]
    fn test_unavailable_synthesis_speaks_nothing() {
        let mut queue = DirectiveQueue::new(false);
        assert_eq!(queue.speak("hello"), None);
        assert!(queue.drain().is_empty());
    }

    #[test]
    fn test_directive_serialization() {
        let value = serde_json::to_value(SpeechDirective::Speak {
            utterance_id: 3,
            text: "Q".to_string(),
        })
        .unwrap();
        assert_eq!(value["kind"], "speak");
        assert_eq!(value["utterance_id"], 3);
    }

    #[tokio::test]
    async fn test_unreported_permission_is_an_error() {
        let probe = ReportedCameraPermission(None);
        assert!(matches!(
            probe.query().await,
            Err(WorkflowError::Permission(_))
        ));
        let granted = ReportedCameraPermission(Some(PermissionState::Granted));
        assert_eq!(granted.query().await.unwrap(), PermissionState::Granted);
    }
}
