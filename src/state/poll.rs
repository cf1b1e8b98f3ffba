//! Polls with betting: definitions, player bets and the poll status rules.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use utoipa::ToSchema;

use crate::{
    error::ValidationFailure,
    state::quest::{PlayerId, normalize_player_id},
};

/// Identifier of a poll.
pub type PollId = String;
/// Identifier of a poll option.
pub type OptionId = String;

/// One answer a player can bet on.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PollOption {
    /// Text shown to players.
    pub label: String,
}

/// Bet limits for a poll.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BettingRules {
    /// Smallest accepted bet.
    pub min_bet: u64,
    /// Largest accepted bet; uncapped when absent.
    #[serde(default)]
    pub max_bet: Option<u64>,
}

impl Default for BettingRules {
    fn default() -> Self {
        Self {
            min_bet: 1,
            max_bet: None,
        }
    }
}

/// Poll definition as published by the server.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Poll {
    /// Poll identifier.
    pub id: PollId,
    /// Question asked.
    pub question: String,
    /// Options in display order.
    pub options: IndexMap<OptionId, PollOption>,
    /// Bet limits.
    #[serde(default)]
    pub betting: BettingRules,
    /// Start of the betting window.
    #[serde(with = "time::serde::rfc3339")]
    pub opens_at: OffsetDateTime,
    /// End of the betting window.
    #[serde(with = "time::serde::rfc3339")]
    pub closes_at: OffsetDateTime,
}

impl Poll {
    /// Whether bets are accepted at `now`.
    pub fn is_open(&self, now: OffsetDateTime) -> bool {
        self.opens_at <= now && now < self.closes_at
    }
}

/// Cache key of a player's bet on one poll.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PollLogKey {
    /// Normalized wallet address.
    pub player_id: PlayerId,
    /// Poll identifier.
    pub poll_id: PollId,
}

impl PollLogKey {
    /// Key for `player_id` on `poll_id`, normalizing the address.
    pub fn new(player_id: impl Into<PlayerId>, poll_id: impl Into<PollId>) -> Self {
        Self {
            player_id: normalize_player_id(player_id),
            poll_id: poll_id.into(),
        }
    }
}

/// A player's bet on one poll.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PollLog {
    /// Poll the bet is on.
    pub poll_id: PollId,
    /// Player who bet.
    pub player_id: PlayerId,
    /// Option chosen.
    pub option_id: OptionId,
    /// Points wagered.
    pub amount: u64,
    /// Time the server recorded the bet.
    #[serde(with = "time::serde::rfc3339")]
    pub placed_at: OffsetDateTime,
}

/// Spendable balance of a player.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Wallet {
    /// Wallet owner.
    pub player_id: PlayerId,
    /// Spendable points.
    pub balance: u64,
}

/// User-visible poll status for one player.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum PollStatus {
    /// Bets accepted, the player has not bet yet.
    Open,
    /// The player has bet on `option_id`.
    Voted {
        /// Option the bet is on.
        option_id: OptionId,
    },
    /// Betting window is over and the player did not bet.
    Closed,
}

/// Project a poll and the player's bet onto a status.
pub fn project_status(poll: &Poll, log: Option<&PollLog>, now: OffsetDateTime) -> PollStatus {
    match log {
        Some(log) => PollStatus::Voted {
            option_id: log.option_id.clone(),
        },
        None if poll.is_open(now) => PollStatus::Open,
        None => PollStatus::Closed,
    }
}

/// Proposed bet, before any local state changes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BetIntent<'a> {
    /// Selected option, if any.
    pub option_id: Option<&'a str>,
    /// Points to wager.
    pub amount: u64,
    /// Balance available for the bet.
    pub balance: u64,
    /// Submission time.
    pub now: OffsetDateTime,
}

/// Check a bet against the poll rules and the player's balance.
pub fn check_bet(
    poll: &Poll,
    log: Option<&PollLog>,
    intent: &BetIntent<'_>,
) -> Result<(), ValidationFailure> {
    let Some(option_id) = intent.option_id else {
        return Err(ValidationFailure::NoSelection);
    };
    if !poll.options.contains_key(option_id) {
        return Err(ValidationFailure::UnknownOption(option_id.to_string()));
    }
    if log.is_some() {
        return Err(ValidationFailure::NotAllowed(
            "you already placed a bet on this poll".into(),
        ));
    }
    if !poll.is_open(intent.now) {
        return Err(ValidationFailure::OutsideWindow(
            "betting is closed for this poll".into(),
        ));
    }
    if intent.amount < poll.betting.min_bet {
        return Err(ValidationFailure::InvalidAmount(format!(
            "minimum bet is {}",
            poll.betting.min_bet
        )));
    }
    if let Some(max) = poll.betting.max_bet
        && intent.amount > max
    {
        return Err(ValidationFailure::InvalidAmount(format!(
            "maximum bet is {max}"
        )));
    }
    if intent.amount > intent.balance {
        return Err(ValidationFailure::InsufficientBalance {
            available: intent.balance,
            required: intent.amount,
        });
    }

    Ok(())
}

/// Predict the player's bet record once the bet is accepted.
pub fn predict_bet(key: &PollLogKey, option_id: &str, amount: u64, now: OffsetDateTime) -> PollLog {
    PollLog {
        poll_id: key.poll_id.clone(),
        player_id: key.player_id.clone(),
        option_id: option_id.to_string(),
        amount,
        placed_at: now,
    }
}
