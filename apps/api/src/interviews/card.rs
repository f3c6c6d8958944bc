//! Card view-models for the interview listing.

use serde::Serialize;
use uuid::Uuid;

use crate::models::interview::InterviewRow;

/// Tags shown on a card before the rest collapse into a `+N` badge.
pub const VISIBLE_TAGS: usize = 4;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CardAction {
    pub label: &'static str,
    pub href: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct InterviewCard {
    pub id: Uuid,
    pub position: String,
    pub description: String,
    pub tags: Vec<String>,
    /// Number of tags hidden behind the `+N` badge.
    pub hidden_tags: usize,
    pub created_label: String,
    pub actions: Vec<CardAction>,
}

/// Builds the card for one interview. On the mock page itself the
/// navigation actions are omitted.
pub fn build_card(interview: &InterviewRow, on_mock_page: bool) -> InterviewCard {
    let tags = interview.tech_tags();
    let hidden_tags = tags.len().saturating_sub(VISIBLE_TAGS);

    let actions = if on_mock_page {
        Vec::new()
    } else {
        vec![
            CardAction {
                label: "View",
                href: format!("/generate/{}", interview.id),
            },
            CardAction {
                label: "Feedback",
                href: format!("/generate/feedback/{}", interview.id),
            },
            CardAction {
                label: "Start",
                href: format!("/generate/interview/{}", interview.id),
            },
        ]
    };

    InterviewCard {
        id: interview.id,
        position: interview.position.clone(),
        description: interview.description.clone(),
        tags: tags.into_iter().take(VISIBLE_TAGS).map(String::from).collect(),
        hidden_tags,
        created_label: interview.created_at.format("%B %-d, %Y").to_string(),
        actions,
    }
}
