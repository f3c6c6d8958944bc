use serde::Serialize;
use thiserror::Error;

use crate::practice::notify::Notification;

/// The external call a network failure happened in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Operation {
    Scoring,
    Saving,
}

/// Failures inside the practice workflow. Every variant is caught where it
/// happens and turned into a [`Notification`]; none reach the HTTP layer.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum WorkflowError {
    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Invalid JSON format: {0}")]
    Parse(String),

    #[error("{operation:?} request failed: {detail}")]
    Network { operation: Operation, detail: String },

    #[error("Answer already exists for this question")]
    Duplicate,

    #[error("Camera permission unavailable: {0}")]
    Permission(String),

    #[error("No feedback available to save")]
    NoResult,

    #[error("Cannot {action} while {phase}")]
    InvalidState { action: &'static str, phase: String },
}

impl WorkflowError {
    pub fn notification(&self) -> Notification {
        match self {
            WorkflowError::Validation(msg) => Notification::error("Error", msg.clone()),
            WorkflowError::Parse(_)
            | WorkflowError::Network {
                operation: Operation::Scoring,
                ..
            } => Notification::error("Error", "An error occurred while generating feedback."),
            WorkflowError::Network {
                operation: Operation::Saving,
                ..
            } => Notification::error("Error", "An error occurred while saving your answer."),
            WorkflowError::Duplicate => Notification::info(
                "Already Answered",
                "You have already answered this question",
            ),
            WorkflowError::Permission(_) => {
                Notification::info("Camera Off", "Camera access is not available.")
            }
            WorkflowError::NoResult => Notification::error(
                "Error",
                "Generate feedback for your answer before saving.",
            ),
            WorkflowError::InvalidState { .. } => Notification::error("Error", self.to_string()),
        }
    }
}
