//! Answer scoring — asks the LLM to rate a candidate answer against the
//! reference answer and extracts the `{ratings, feedback}` object from its
//! free-text reply.
//!
//! `AppState` holds an `Arc<dyn AnswerScorer>`; `LlmAnswerScorer` is the
//! production backend. Failures degrade to [`AiResponse::sentinel`] via
//! [`score_or_fallback`] so the candidate is never blocked.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{info, warn};

use crate::llm_client::prompts::JSON_ONLY_SYSTEM;
use crate::llm_client::{strip_json_fences, LlmClient, LlmError};
use crate::practice::error::{Operation, WorkflowError};
use crate::practice::prompts::SCORING_PROMPT_TEMPLATE;

/// Speech answers shorter than this are rejected before scoring.
pub const MIN_SPEECH_ANSWER_CHARS: usize = 30;
pub const FALLBACK_FEEDBACK: &str = "Unable to generate feedback";
const MIN_RATING: i32 = 1;
const MAX_RATING: i32 = 10;

/// Rating and feedback for one answer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AiResponse {
    pub ratings: i32,
    pub feedback: String,
}

impl AiResponse {
    /// Placeholder result used when scoring fails.
    pub fn sentinel() -> Self {
        Self {
            ratings: 0,
            feedback: FALLBACK_FEEDBACK.to_string(),
        }
    }

    pub fn is_sentinel(&self) -> bool {
        *self == Self::sentinel()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ScoringError {
    #[error("malformed scoring response: {0}")]
    Parse(String),

    #[error("scoring request failed: {0}")]
    Network(String),
}

impl From<ScoringError> for WorkflowError {
    fn from(e: ScoringError) -> Self {
        match e {
            ScoringError::Parse(msg) => WorkflowError::Parse(msg),
            ScoringError::Network(detail) => WorkflowError::Network {
                operation: Operation::Scoring,
                detail,
            },
        }
    }
}

impl From<LlmError> for ScoringError {
    fn from(e: LlmError) -> Self {
        match e {
            LlmError::EmptyContent => ScoringError::Parse(e.to_string()),
            LlmError::Parse(inner) => ScoringError::Parse(inner.to_string()),
            other => ScoringError::Network(other.to_string()),
        }
    }
}

#[async_trait]
pub trait AnswerScorer: Send + Sync {
    async fn score(
        &self,
        question: &str,
        reference_answer: &str,
        candidate_answer: &str,
    ) -> Result<AiResponse, ScoringError>;
}

/// Scores answers with the Gemini client.
pub struct LlmAnswerScorer(pub LlmClient);

#[async_trait]
impl AnswerScorer for LlmAnswerScorer {
    async fn score(
        &self,
        question: &str,
        reference_answer: &str,
        candidate_answer: &str,
    ) -> Result<AiResponse, ScoringError> {
        let prompt = build_scoring_prompt(question, reference_answer, candidate_answer);
        let text = self.0.call_text(&prompt, JSON_ONLY_SYSTEM).await?;
        parse_ai_response(&text)
    }
}

/// Scores an answer, replacing any failure with the sentinel result.
/// The error, if any, is returned alongside so the caller can notify.
pub async fn score_or_fallback(
    scorer: &dyn AnswerScorer,
    question: &str,
    reference_answer: &str,
    candidate_answer: &str,
) -> (AiResponse, Option<WorkflowError>) {
    match scorer
        .score(question, reference_answer, candidate_answer)
        .await
    {
        Ok(result) => {
            info!("Answer scored {}/{}", result.ratings, MAX_RATING);
            (result, None)
        }
        Err(e) => {
            warn!("Scoring failed, using fallback result: {e}");
            (AiResponse::sentinel(), Some(e.into()))
        }
    }
}

pub fn build_scoring_prompt(question: &str, reference_answer: &str, candidate_answer: &str) -> String {
    fill_template(
        SCORING_PROMPT_TEMPLATE,
        &[
            ("question", question),
            ("user_answer", candidate_answer),
            ("correct_answer", reference_answer),
        ],
    )
}

/// Replaces `{key}` placeholders in one pass over `template`. Substituted
/// values are never scanned again, so braces inside them stay literal.
fn fill_template(template: &str, values: &[(&str, &str)]) -> String {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;
    while let Some(start) = rest.find('{') {
        out.push_str(&rest[..start]);
        let tail = &rest[start + 1..];
        let hit = values.iter().find(|(key, _)| {
            tail.strip_prefix(key)
                .is_some_and(|after| after.starts_with('}'))
        });
        match hit {
            Some((key, value)) => {
                out.push_str(value);
                rest = &tail[key.len() + 1..];
            }
            None => {
                out.push('{');
                rest = tail;
            }
        }
    }
    out.push_str(rest);
    out
}

#[derive(Debug, Deserialize)]
struct RawAiResponse {
    #[serde(alias = "rating")]
    ratings: RawRating,
    feedback: String,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum RawRating {
    Number(f64),
    Text(String),
}

/// Parses the model's reply into an [`AiResponse`].
///
/// Code fences are stripped first. If the remainder still is not JSON, the
/// outermost `{ ... }` span is tried before giving up.
pub fn parse_ai_response(text: &str) -> Result<AiResponse, ScoringError> {
    let cleaned = strip_json_fences(text);
    let raw: RawAiResponse = match serde_json::from_str(cleaned) {
        Ok(raw) => raw,
        Err(first_err) => extract_object(cleaned)
            .and_then(|span| serde_json::from_str::<RawAiResponse>(span).ok())
            .ok_or_else(|| ScoringError::Parse(first_err.to_string()))?,
    };

    let ratings = match raw.ratings {
        RawRating::Number(n) => n,
        RawRating::Text(s) => s
            .trim()
            .parse::<f64>()
            .map_err(|_| ScoringError::Parse(format!("rating '{s}' is not a number")))?,
    };
    let ratings = ratings.round();
    if !(MIN_RATING as f64..=MAX_RATING as f64).contains(&ratings) {
        return Err(ScoringError::Parse(format!(
            "rating {ratings} outside {MIN_RATING}-{MAX_RATING}"
        )));
    }

    Ok(AiResponse {
        ratings: ratings as i32,
        feedback: raw.feedback,
    })
}

fn extract_object(text: &str) -> Option<&str> {
    let start = text.find('{')?;
    let end = text.rfind('}')?;
    (start < end).then(|| &text[start..=end])
}
