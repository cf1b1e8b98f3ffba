use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

use crate::{
    dto::{action::DispatchSummary, format_timestamp, validation::validate_entity_id},
    state::{
        poll::{Poll, PollLog, PollStatus},
        projection::Projection,
    },
};

/// Bet submitted by a player. A missing `option_id` is reported back as a toast.
#[derive(Debug, Clone, Deserialize, ToSchema, Validate)]
pub struct PlaceBetRequest {
    /// Chosen option.
    #[serde(default)]
    #[validate(custom(function = "validate_entity_id"))]
    pub option_id: Option<String>,
    /// Points to wager.
    #[validate(range(min = 1))]
    pub amount: u64,
}

/// One answer of a poll.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct PollOptionView {
    /// Option identifier.
    pub id: String,
    /// Text shown to the player.
    pub label: String,
}

/// The player's bet.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct BetView {
    /// Option the bet is on.
    pub option_id: String,
    /// Points wagered.
    pub amount: u64,
}

/// Poll as displayed to one player.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct PollView {
    /// Poll identifier.
    pub poll_id: String,
    /// Question asked.
    pub question: String,
    /// Answers in display order.
    pub options: Vec<PollOptionView>,
    /// Smallest accepted bet.
    pub min_bet: u64,
    /// Largest accepted bet, if capped.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_bet: Option<u64>,
    /// RFC 3339 time betting opens.
    pub opens_at: String,
    /// RFC 3339 time betting closes.
    pub closes_at: String,
    /// Projected status for the player.
    pub status: PollStatus,
    /// The status comes from an unconfirmed prediction.
    pub pending: bool,
    /// The player's bet, confirmed or predicted.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bet: Option<BetView>,
    /// The player's point balance, when known.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub balance: Option<u64>,
}

impl PollView {
    /// View of `poll` for the player owning `log`.
    pub fn new(
        poll: &Poll,
        log: Option<&PollLog>,
        projection: Projection<PollStatus>,
        balance: Option<u64>,
    ) -> Self {
        Self {
            poll_id: poll.id.clone(),
            question: poll.question.clone(),
            options: poll
                .options
                .iter()
                .map(|(id, option)| PollOptionView {
                    id: id.clone(),
                    label: option.label.clone(),
                })
                .collect(),
            min_bet: poll.betting.min_bet,
            max_bet: poll.betting.max_bet,
            opens_at: format_timestamp(poll.opens_at),
            closes_at: format_timestamp(poll.closes_at),
            status: projection.status,
            pending: projection.pending,
            bet: log.map(|log| BetView {
                option_id: log.option_id.clone(),
                amount: log.amount,
            }),
            balance,
        }
    }
}

/// Answer to a bet: dispatch outcome plus the poll as now displayed.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct BetResponse {
    /// What happened to the request.
    pub dispatch: DispatchSummary,
    /// Poll as displayed after dispatch.
    pub poll: PollView,
}
