//! Wire models exchanged with the remote server actions.

use serde::{Deserialize, Serialize};

use crate::state::{
    board::PostId,
    poll::{OptionId, PollId, PollLog},
    quest::{PlayerId, QuestId, QuestLog, Reward},
};

/// Body of the `complete-quest` action.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CompleteQuestCommand {
    /// Player completing the quest.
    pub player_id: PlayerId,
    /// Quest being completed.
    pub quest_id: QuestId,
}

/// Body of the `claim-quest-reward` action.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ClaimQuestCommand {
    /// Player claiming the reward.
    pub player_id: PlayerId,
    /// Quest whose reward is claimed.
    pub quest_id: QuestId,
}

/// Body of the `place-bet` action.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PlaceBetCommand {
    /// Player placing the bet.
    pub player_id: PlayerId,
    /// Poll the bet is placed on.
    pub poll_id: PollId,
    /// Selected option.
    pub option_id: OptionId,
    /// Points wagered.
    pub amount: u64,
}

/// Body of the `toggle-reaction` action.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ToggleReactionCommand {
    /// Player reacting.
    pub player_id: PlayerId,
    /// Post reacted to.
    pub post_id: PostId,
}

/// Details of a successful `complete-quest` action.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct CompletionReceipt {
    /// Quest log after the completion.
    pub log: QuestLog,
}

/// Details of a successful `claim-quest-reward` action.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ClaimReceipt {
    /// Quest log after the claim.
    pub log: QuestLog,
    /// Reward actually granted.
    pub reward: Reward,
}

/// Details of a successful `place-bet` action.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct BetReceipt {
    /// Recorded bet.
    pub log: PollLog,
    /// Wallet balance after the stake was taken.
    pub balance: u64,
    /// The bet was recorded but arrived after the answer window, so it earns nothing.
    #[serde(default)]
    pub window_missed: bool,
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn bet_receipt_defaults_window_flag() {
        let receipt: BetReceipt = serde_json::from_value(json!({
            "log": {
                "poll_id": "p1",
                "player_id": "0xabc",
                "option_id": "a",
                "amount": 10,
                "placed_at": "2024-05-01T12:00:00Z"
            },
            "balance": 90
        }))
        .unwrap();
        assert!(!receipt.window_missed);
        assert_eq!(receipt.balance, 90);
    }

    #[test]
    fn place_bet_command_serialises_flat() {
        let body = serde_json::to_value(PlaceBetCommand {
            player_id: "0xabc".into(),
            poll_id: "p1".into(),
            option_id: "a".into(),
            amount: 5,
        })
        .unwrap();
        assert_eq!(
            body,
            json!({ "player_id": "0xabc", "poll_id": "p1", "option_id": "a", "amount": 5 })
        );
    }
}
