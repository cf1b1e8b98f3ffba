use serde::Serialize;
use utoipa::ToSchema;

use crate::{
    dto::action::DispatchSummary,
    state::{board::ReactionState, projection::DisplayState},
};

/// A post's reaction counter as displayed to one player.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct ReactionView {
    /// Post identifier.
    pub post_id: String,
    /// Whether the player reacted.
    pub reacted: bool,
    /// Reactions on the post.
    pub count: u32,
    /// The values come from an unconfirmed prediction.
    pub pending: bool,
}

impl ReactionView {
    /// View of the displayed reaction state of `post_id`.
    pub fn new(post_id: &str, display: DisplayState<ReactionState>) -> Self {
        let ReactionState { reacted, count } = display.value.unwrap_or_default();
        Self {
            post_id: post_id.to_string(),
            reacted,
            count,
            pending: display.optimistic,
        }
    }
}

/// Answer to a reaction toggle.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct ReactionResponse {
    /// What happened to the request.
    pub dispatch: DispatchSummary,
    /// Reaction as displayed after dispatch.
    pub reaction: ReactionView,
}
