//! Notification payloads pushed to the view layer.

use serde::Serialize;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::state::quest::{PlayerId, Reward};

#[derive(Clone, Debug)]
/// Dispatched payload carried across SSE channels.
pub struct ServerEvent {
    /// SSE event name.
    pub event: Option<String>,
    /// Serialized payload.
    pub data: String,
    /// Player allowed to see the event; `None` for announcements to everyone.
    pub player_id: Option<PlayerId>,
}

impl ServerEvent {
    /// Build a raw event with a plain-text payload, visible to every subscriber.
    pub fn new(event: Option<String>, data: String) -> Self {
        Self {
            event,
            data,
            player_id: None,
        }
    }

    /// Convenience wrapper that serialises `payload` into the SSE data field.
    pub fn json<E, T>(event: E, payload: &T) -> serde_json::Result<Self>
    where
        E: Into<Option<String>>,
        T: Serialize,
    {
        Ok(Self::new(event.into(), serde_json::to_string(payload)?))
    }

    /// Restrict the event to one player.
    pub fn addressed_to(mut self, player_id: impl Into<PlayerId>) -> Self {
        self.player_id = Some(player_id.into());
        self
    }

    /// Whether a subscriber streaming for `player_id` may receive this event.
    pub fn is_visible_to(&self, player_id: &str) -> bool {
        self.player_id
            .as_deref()
            .is_none_or(|recipient| recipient == player_id)
    }
}

/// Toast or modal payload tagged with the player and the request it settles.
#[derive(Debug, Serialize)]
pub struct FeedbackEnvelope<'a, T> {
    /// Player the notification is addressed to.
    pub player_id: &'a str,
    /// Request id returned in the dispatch summary, when the notification settles one.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub request_id: Option<Uuid>,
    /// Toast or modal body.
    #[serde(flatten)]
    pub body: &'a T,
}

/// Severity of a toast message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum ToastLevel {
    /// The action went through.
    Success,
    /// The action failed or was refused.
    Error,
    /// Neutral information, including caveats on a successful action.
    Info,
}

/// Short-lived message shown to the player.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct Toast {
    /// Severity.
    pub level: ToastLevel,
    /// Text shown to the player.
    pub message: String,
}

impl Toast {
    /// Success toast.
    pub fn success(message: impl Into<String>) -> Self {
        Self {
            level: ToastLevel::Success,
            message: message.into(),
        }
    }

    /// Error toast.
    pub fn error(message: impl Into<String>) -> Self {
        Self {
            level: ToastLevel::Error,
            message: message.into(),
        }
    }

    /// Informational toast.
    pub fn info(message: impl Into<String>) -> Self {
        Self {
            level: ToastLevel::Info,
            message: message.into(),
        }
    }
}

/// Interactive result views opened after a successful action.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Modal {
    /// A quest reward has been collected.
    RewardClaimed {
        /// Quest whose reward was claimed.
        quest_id: String,
        /// Quest title.
        title: String,
        /// What the player received.
        reward: Reward,
    },
    /// A bet was accepted by the server.
    BetConfirmed {
        /// Poll the bet was placed on.
        poll_id: String,
        /// Chosen option.
        option_id: String,
        /// Amount staked.
        amount: u64,
        /// Balance left after the bet.
        balance: u64,
    },
}

/// Terminal notification for one request: either a toast or a modal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Feedback {
    /// Short message.
    Toast(Toast),
    /// Result view.
    Modal(Modal),
}

impl From<Toast> for Feedback {
    fn from(toast: Toast) -> Self {
        Feedback::Toast(toast)
    }
}

impl From<Modal> for Feedback {
    fn from(modal: Modal) -> Self {
        Feedback::Modal(modal)
    }
}
