//! Remote server actions contract, its reply envelope and failures.

use std::{error::Error, time::Duration};

use futures::future::BoxFuture;
use serde::{Deserialize, de::DeserializeOwned};
use serde_json::{Map, Value};
use thiserror::Error;

use crate::{
    dao::models::{
        BetReceipt, ClaimQuestCommand, ClaimReceipt, CompleteQuestCommand, PlaceBetCommand,
        ToggleReactionCommand,
    },
    state::{
        board::{ReactionKey, ReactionState},
        poll::{Poll, PollLog, PollLogKey, Wallet},
        quest::{Quest, QuestLog, QuestLogKey},
    },
};

/// Result alias for transport-level operations against the remote backend.
pub type RemoteResult<T> = Result<T, RemoteError>;

/// Transport failures raised while talking to the remote backend.
#[derive(Debug, Error)]
pub enum RemoteError {
    /// The request could not be sent or its body could not be read.
    #[error("failed to reach remote backend at `{path}`")]
    Send {
        /// Backend path of the failed call.
        path: String,
        /// Underlying client error.
        #[source]
        source: Box<dyn Error + Send + Sync>,
    },
    /// The backend answered with an unexpected status code.
    #[error("unexpected response status {status} for `{path}`")]
    Status {
        /// Backend path of the call.
        path: String,
        /// Status code received.
        status: u16,
    },
    /// The response body did not match the expected shape.
    #[error("failed to decode response for `{path}`")]
    Decode {
        /// Backend path of the call.
        path: String,
        /// JSON decoding error.
        #[source]
        source: serde_json::Error,
    },
}

impl RemoteError {
    /// Wrap any client failure for `path`.
    pub fn send(path: impl Into<String>, source: impl Error + Send + Sync + 'static) -> Self {
        RemoteError::Send {
            path: path.into(),
            source: Box::new(source),
        }
    }
}

/// Outcome of a remote mutation that did not succeed.
#[derive(Debug, Error)]
pub enum RemoteFailure {
    /// The server action answered `success: false`.
    #[error("request rejected: {}", message.as_deref().unwrap_or("no reason given"))]
    Rejected {
        /// Server-provided reason, when present.
        message: Option<String>,
    },
    /// The call failed before a verdict was received.
    #[error(transparent)]
    Transport(#[from] RemoteError),
    /// No answer within the configured limit.
    #[error("request timed out after {0:?}")]
    Timeout(Duration),
}

impl RemoteFailure {
    /// Message suitable for the player, when the server provided one.
    pub fn user_message(&self) -> Option<&str> {
        match self {
            RemoteFailure::Rejected { message } => message.as_deref().filter(|m| !m.is_empty()),
            _ => None,
        }
    }
}

/// Generic `{ success, error?, ...details }` envelope returned by server actions.
#[derive(Debug, Deserialize)]
pub struct ActionReply {
    /// Whether the action succeeded.
    pub success: bool,
    /// Reason given for a failure.
    #[serde(default)]
    pub error: Option<String>,
    /// Action-specific success payload.
    #[serde(flatten)]
    pub details: Map<String, Value>,
}

impl ActionReply {
    /// Turn the envelope into the typed success payload or a rejection.
    pub fn into_result<T>(self, path: &str) -> Result<T, RemoteFailure>
    where
        T: DeserializeOwned,
    {
        if !self.success {
            return Err(RemoteFailure::Rejected {
                message: self.error,
            });
        }

        serde_json::from_value(Value::Object(self.details)).map_err(|source| {
            RemoteFailure::Transport(RemoteError::Decode {
                path: path.to_string(),
                source,
            })
        })
    }
}

/// Server actions and queries the coordinator relies on.
///
/// Mutations resolve to the typed success payload or a [`RemoteFailure`];
/// queries resolve to `Ok(None)` when the entity does not exist.
pub trait ServerActions: Send + Sync {
    /// Record one completion of a quest.
    fn complete_quest(
        &self,
        command: CompleteQuestCommand,
    ) -> BoxFuture<'static, Result<QuestLog, RemoteFailure>>;
    /// Claim the reward of a completed quest.
    fn claim_quest_reward(
        &self,
        command: ClaimQuestCommand,
    ) -> BoxFuture<'static, Result<ClaimReceipt, RemoteFailure>>;
    /// Place a bet on a poll option.
    fn place_bet(&self, command: PlaceBetCommand)
    -> BoxFuture<'static, Result<BetReceipt, RemoteFailure>>;
    /// Flip the player's reaction on a post.
    fn toggle_reaction(
        &self,
        command: ToggleReactionCommand,
    ) -> BoxFuture<'static, Result<ReactionState, RemoteFailure>>;
    /// Quest definition.
    fn fetch_quest(&self, quest_id: &str) -> BoxFuture<'static, RemoteResult<Option<Quest>>>;
    /// Player's log for a quest.
    fn fetch_quest_log(&self, key: &QuestLogKey)
    -> BoxFuture<'static, RemoteResult<Option<QuestLog>>>;
    /// Poll definition.
    fn fetch_poll(&self, poll_id: &str) -> BoxFuture<'static, RemoteResult<Option<Poll>>>;
    /// Player's bet on a poll.
    fn fetch_poll_log(&self, key: &PollLogKey) -> BoxFuture<'static, RemoteResult<Option<PollLog>>>;
    /// Player's point balance.
    fn fetch_wallet(&self, player_id: &str) -> BoxFuture<'static, RemoteResult<Option<Wallet>>>;
    /// Player's reaction on a post, with the post's count.
    fn fetch_reaction(
        &self,
        key: &ReactionKey,
    ) -> BoxFuture<'static, RemoteResult<Option<ReactionState>>>;
    /// Succeeds when the backend is reachable and healthy.
    fn health_check(&self) -> BoxFuture<'static, RemoteResult<()>>;
}

#[cfg(test)]
mod tests {
    use serde::Deserialize;
    use serde_json::json;

    use super::*;

    #[derive(Debug, Deserialize, PartialEq)]
    struct Details {
        balance: u64,
    }

    fn reply(value: Value) -> ActionReply {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn successful_reply_yields_details() {
        let details: Details = reply(json!({ "success": true, "balance": 40 }))
            .into_result("place-bet")
            .unwrap();
        assert_eq!(details, Details { balance: 40 });
    }

    #[test]
    fn failed_reply_carries_server_message() {
        let err = reply(json!({ "success": false, "error": "poll closed" }))
            .into_result::<Details>("place-bet")
            .unwrap_err();
        assert_eq!(err.user_message(), Some("poll closed"));
    }

    #[test]
    fn failed_reply_without_message_has_no_user_message() {
        let err = reply(json!({ "success": false }))
            .into_result::<Details>("place-bet")
            .unwrap_err();
        assert!(matches!(err, RemoteFailure::Rejected { message: None }));
        assert_eq!(err.user_message(), None);
    }

    #[test]
    fn malformed_details_are_a_transport_failure() {
        let err = reply(json!({ "success": true, "balance": "lots" }))
            .into_result::<Details>("place-bet")
            .unwrap_err();
        assert!(matches!(
            err,
            RemoteFailure::Transport(RemoteError::Decode { .. })
        ));
    }
}
