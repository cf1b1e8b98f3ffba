//! Quest definitions, per-player quest logs and the quest status rules.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use serde_with::{DurationSeconds, serde_as};
use time::OffsetDateTime;
use utoipa::ToSchema;

use crate::error::ValidationFailure;

/// Identifier of a player (wallet address).
pub type PlayerId = String;
/// Identifier of a quest.
pub type QuestId = String;

/// Canonical form of a wallet address. Hex digits are case-insensitive, so
/// every key built from a player id uses the lowercase form.
pub fn normalize_player_id(player_id: impl Into<PlayerId>) -> PlayerId {
    let mut id = player_id.into();
    id.make_ascii_lowercase();
    id
}

/// How often a quest can be completed before its reward can be claimed.
#[serde_as]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RepeatPolicy {
    /// A single completion unlocks the reward.
    Once,
    /// `required` completions unlock the reward, optionally spaced by `interval`.
    Repeatable {
        /// Completions needed before claiming.
        required: u32,
        /// Minimum spacing between two completions.
        #[serde_as(as = "Option<DurationSeconds<u64>>")]
        #[serde(rename = "interval_secs")]
        interval: Option<Duration>,
    },
}

/// Reward granted when a quest is claimed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Reward {
    /// Platform points credited to the player.
    Points {
        /// Points credited.
        amount: u64,
    },
    /// An on-chain asset (e.g. an NFT from a collection).
    Asset {
        /// Asset or collection identifier.
        asset_id: String,
        /// Units granted.
        quantity: u32,
    },
}

/// Quest definition as published by the server.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Quest {
    /// Quest identifier.
    pub id: QuestId,
    /// Title shown to players.
    pub title: String,
    /// Completions required before claiming.
    pub repeat: RepeatPolicy,
    /// Reward granted on claim.
    pub reward: Reward,
}

impl Quest {
    /// Completions needed before the reward can be claimed.
    pub fn required_repeats(&self) -> u32 {
        match self.repeat {
            RepeatPolicy::Once => 1,
            RepeatPolicy::Repeatable { required, .. } => required.max(1),
        }
    }

    fn interval(&self) -> Option<Duration> {
        match self.repeat {
            RepeatPolicy::Once => None,
            RepeatPolicy::Repeatable { interval, .. } => interval,
        }
    }
}

/// Cache key of a player's progress on one quest.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct QuestLogKey {
    /// Normalized wallet address.
    pub player_id: PlayerId,
    /// Quest identifier.
    pub quest_id: QuestId,
}

impl QuestLogKey {
    /// Key for `player_id` on `quest_id`, normalizing the address.
    pub fn new(player_id: impl Into<PlayerId>, quest_id: impl Into<QuestId>) -> Self {
        Self {
            player_id: normalize_player_id(player_id),
            quest_id: quest_id.into(),
        }
    }
}

/// A player's progress on one quest.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuestLog {
    /// Quest this log tracks.
    pub quest_id: QuestId,
    /// Player owning the log.
    pub player_id: PlayerId,
    /// Completions recorded so far.
    #[serde(default)]
    pub repeat_count: u32,
    /// Whether the repeat target was reached.
    #[serde(default)]
    pub completed: bool,
    /// Whether the reward was collected.
    #[serde(default)]
    pub is_claimed: bool,
    /// Earliest time the next repeat is allowed.
    #[serde(default, with = "time::serde::rfc3339::option")]
    pub wait_date: Option<OffsetDateTime>,
}

impl QuestLog {
    /// Minimal record for a player who never interacted with the quest.
    pub fn placeholder(key: &QuestLogKey) -> Self {
        Self {
            quest_id: key.quest_id.clone(),
            player_id: key.player_id.clone(),
            repeat_count: 0,
            completed: false,
            is_claimed: false,
            wait_date: None,
        }
    }
}

/// User-visible quest status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum QuestStatus {
    /// Not completed yet (or repeat target not reached).
    Default,
    /// Completed, reward not collected.
    Completed,
    /// Reward collected. Terminal.
    Claimed,
}

/// Project a quest log onto its status.
pub fn project_status(log: Option<&QuestLog>) -> QuestStatus {
    match log {
        Some(log) if log.is_claimed => QuestStatus::Claimed,
        Some(log) if log.completed => QuestStatus::Completed,
        _ => QuestStatus::Default,
    }
}

/// Check whether the player may complete `quest` at `now`.
pub fn check_completion(
    quest: &Quest,
    log: Option<&QuestLog>,
    now: OffsetDateTime,
) -> Result<(), ValidationFailure> {
    let Some(log) = log else {
        return Ok(());
    };

    if log.is_claimed {
        return Err(ValidationFailure::NotAllowed(
            "reward already claimed".into(),
        ));
    }
    if log.completed || log.repeat_count >= quest.required_repeats() {
        return Err(ValidationFailure::NotAllowed(
            "quest already completed".into(),
        ));
    }
    if let Some(wait_date) = log.wait_date
        && wait_date > now
    {
        return Err(ValidationFailure::OutsideWindow(format!(
            "quest can be repeated again in {} seconds",
            (wait_date - now).whole_seconds().max(1)
        )));
    }

    Ok(())
}

/// Predict the quest log after one more completion.
///
/// The repeat counter always advances; the quest only becomes completed once
/// the repeat target is met. Below target, a fixed interval sets the cool-down.
pub fn predict_completion(
    quest: &Quest,
    key: &QuestLogKey,
    log: Option<&QuestLog>,
    now: OffsetDateTime,
) -> QuestLog {
    let mut next = log.cloned().unwrap_or_else(|| QuestLog::placeholder(key));
    next.repeat_count = next.repeat_count.saturating_add(1);

    if next.repeat_count >= quest.required_repeats() {
        next.completed = true;
        next.wait_date = None;
    } else {
        next.completed = false;
        next.wait_date = quest.interval().map(|interval| now + interval);
    }

    next
}

/// Check whether the reward of `quest` can be claimed.
///
/// Claiming is gated on cumulative progress, not on the `completed` flag alone.
pub fn check_claim(quest: &Quest, log: Option<&QuestLog>) -> Result<(), ValidationFailure> {
    let required = quest.required_repeats();
    let Some(log) = log else {
        return Err(ValidationFailure::RepeatTargetNotReached {
            required,
            completed: 0,
        });
    };

    if log.is_claimed {
        return Err(ValidationFailure::NotAllowed(
            "reward already claimed".into(),
        ));
    }
    if log.repeat_count < required {
        return Err(ValidationFailure::RepeatTargetNotReached {
            required,
            completed: log.repeat_count,
        });
    }
    if !log.completed {
        return Err(ValidationFailure::NotAllowed(
            "quest is not completed yet".into(),
        ));
    }

    Ok(())
}

/// Predict the quest log after the reward is claimed.
pub fn predict_claim(key: &QuestLogKey, log: Option<&QuestLog>) -> QuestLog {
    let mut next = log.cloned().unwrap_or_else(|| QuestLog::placeholder(key));
    next.is_claimed = true;
    next
}
