//! Community board reactions.

use serde::{Deserialize, Serialize};

use crate::state::quest::{PlayerId, normalize_player_id};

/// Identifier of a board post.
pub type PostId = String;

/// Cache key of a player's reaction on one post.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ReactionKey {
    /// Normalized wallet address.
    pub player_id: PlayerId,
    /// Post identifier.
    pub post_id: PostId,
}

impl ReactionKey {
    /// Key for `player_id` on `post_id`, normalizing the address.
    pub fn new(player_id: impl Into<PlayerId>, post_id: impl Into<PostId>) -> Self {
        Self {
            player_id: normalize_player_id(player_id),
            post_id: post_id.into(),
        }
    }
}

/// Reaction counter of a post as seen by one player.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReactionState {
    /// Whether this player reacted.
    pub reacted: bool,
    /// Total reactions on the post.
    pub count: u32,
}

/// Flip the player's reaction, adjusting the counter accordingly.
pub fn toggled(current: Option<&ReactionState>) -> ReactionState {
    let current = current.cloned().unwrap_or_default();
    if current.reacted {
        ReactionState {
            reacted: false,
            count: current.count.saturating_sub(1),
        }
    } else {
        ReactionState {
            reacted: true,
            count: current.count.saturating_add(1),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_reaction_starts_from_zero() {
        assert_eq!(
            toggled(None),
            ReactionState {
                reacted: true,
                count: 1
            }
        );
    }

    #[test]
    fn toggling_twice_restores_state() {
        let start = ReactionState {
            reacted: false,
            count: 12,
        };
        assert_eq!(toggled(Some(&toggled(Some(&start)))), start);
    }

    #[test]
    fn counter_never_underflows() {
        let odd = ReactionState {
            reacted: true,
            count: 0,
        };
        assert_eq!(toggled(Some(&odd)).count, 0);
    }
}
