use serde::Serialize;
use utoipa::ToSchema;

use crate::{
    dto::{action::DispatchSummary, format_timestamp},
    state::{
        projection::Projection,
        quest::{Quest, QuestLog, QuestStatus, Reward},
    },
};

/// Quest as displayed to one player.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct QuestView {
    /// Quest identifier.
    pub quest_id: String,
    /// Title shown to the player.
    pub title: String,
    /// Reward granted on claim.
    pub reward: Reward,
    /// Completions needed before the reward can be claimed.
    pub required_repeats: u32,
    /// Completions recorded so far.
    pub repeat_count: u32,
    /// Projected status for the player.
    pub status: QuestStatus,
    /// The status comes from an unconfirmed prediction.
    pub pending: bool,
    /// RFC 3339 time before which the quest cannot be repeated.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub wait_date: Option<String>,
}

impl QuestView {
    /// View of `quest` given the displayed log.
    pub fn new(quest: &Quest, log: Option<&QuestLog>, projection: Projection<QuestStatus>) -> Self {
        Self {
            quest_id: quest.id.clone(),
            title: quest.title.clone(),
            reward: quest.reward.clone(),
            required_repeats: quest.required_repeats(),
            repeat_count: log.map(|log| log.repeat_count).unwrap_or_default(),
            status: projection.status,
            pending: projection.pending,
            wait_date: log.and_then(|log| log.wait_date).map(format_timestamp),
        }
    }
}

/// Answer to a quest action: dispatch outcome plus the quest as now displayed.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct QuestActionResponse {
    /// What happened to the request.
    pub dispatch: DispatchSummary,
    /// Quest as displayed after dispatch.
    pub quest: QuestView,
}
