// Practice runs: question playback, answer capture, AI scoring, and saving.
// All LLM calls go through llm_client via the AnswerScorer trait.

pub mod capture;
pub mod error;
pub mod handlers;
pub mod notify;
pub mod panel;
pub mod prompts;
pub mod scoring;
pub mod session;
pub mod speech;
pub mod transcript;
