use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::{
    dto::validation::{validate_entity_id, validate_player_id},
    state::executor::Dispatch,
};

/// Path parameters shared by every player-scoped route: `/players/{player}/.../{entity}`.
#[derive(Debug, Deserialize, Validate)]
pub struct PlayerEntityPath {
    /// Wallet address of the player, in any hex case.
    #[validate(custom(function = "validate_player_id"))]
    pub player: String,
    /// Quest, poll or post identifier.
    #[serde(alias = "quest", alias = "poll", alias = "post")]
    #[validate(custom(function = "validate_entity_id"))]
    pub entity: String,
}

/// Path parameters of routes scoped to a player only: `/players/{player}/...`.
#[derive(Debug, Deserialize, Validate)]
pub struct PlayerPath {
    /// Wallet address of the player, in any hex case.
    #[validate(custom(function = "validate_player_id"))]
    pub player: String,
}

/// What happened to an action request when it was submitted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum DispatchOutcome {
    /// Prediction applied, remote call running. The result arrives on `/players/{player}/sse/feedback`.
    Accepted,
    /// Duplicate or rapid-fire request, nothing happened.
    Ignored,
    /// Refused by local checks, nothing was sent.
    Invalid,
}

/// Immediate answer to an action request.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct DispatchSummary {
    /// Whether the request was accepted, ignored or refused.
    pub outcome: DispatchOutcome,
    /// Correlation id of an accepted request.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub request_id: Option<Uuid>,
    /// Reason an invalid request was refused.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl<O> From<&Dispatch<O>> for DispatchSummary {
    fn from(dispatch: &Dispatch<O>) -> Self {
        match dispatch {
            Dispatch::Accepted(execution) => Self {
                outcome: DispatchOutcome::Accepted,
                request_id: Some(execution.request().id),
                message: None,
            },
            Dispatch::Ignored => Self {
                outcome: DispatchOutcome::Ignored,
                request_id: None,
                message: None,
            },
            Dispatch::Invalid(failure) => Self {
                outcome: DispatchOutcome::Invalid,
                request_id: None,
                message: Some(failure.to_string()),
            },
        }
    }
}
