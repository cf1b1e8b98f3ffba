//! Terminal notifications for accepted and refused requests.

use std::sync::Arc;

use tracing::{debug, warn};
use uuid::Uuid;

use crate::{
    dto::feedback::{Feedback, Modal, Toast, ToastLevel},
    error::ValidationFailure,
    state::quest::PlayerId,
};

/// Player a notification is addressed to, and the request it concludes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Recipient {
    /// Normalized wallet address of the player who issued the request.
    pub player_id: PlayerId,
    /// Accepted request the notification settles; `None` for refusals before dispatch.
    pub request_id: Option<Uuid>,
}

impl Recipient {
    /// Recipient of the outcome of an accepted request.
    pub fn request(player_id: impl Into<PlayerId>, request_id: Uuid) -> Self {
        Self {
            player_id: player_id.into(),
            request_id: Some(request_id),
        }
    }

    /// Recipient of a notification not tied to an accepted request.
    pub fn player(player_id: impl Into<PlayerId>) -> Self {
        Self {
            player_id: player_id.into(),
            request_id: None,
        }
    }
}

/// Destination for user-facing notifications (toasts and modals).
///
/// Every notification names its [`Recipient`]; sinks must only show it to that player.
pub trait NotificationSink: Send + Sync {
    /// Show a success toast.
    fn success(&self, to: &Recipient, message: &str);
    /// Show an error toast.
    fn error(&self, to: &Recipient, message: &str);
    /// Show an informational toast.
    fn info(&self, to: &Recipient, message: &str);
    /// Open an interactive result view.
    fn open_modal(&self, to: &Recipient, modal: &Modal);
}

/// Routes request outcomes to a [`NotificationSink`].
#[derive(Clone)]
pub struct FeedbackDispatcher {
    sink: Arc<dyn NotificationSink>,
}

impl FeedbackDispatcher {
    /// Dispatcher delivering to `sink`.
    pub fn new(sink: Arc<dyn NotificationSink>) -> Self {
        Self { sink }
    }

    /// Issue the single notification slot for an accepted request.
    pub fn ticket(&self, recipient: Recipient) -> FeedbackTicket {
        FeedbackTicket {
            recipient,
            sink: Arc::clone(&self.sink),
            delivered: false,
        }
    }

    /// Report a request refused before any remote call.
    pub fn reject(&self, recipient: &Recipient, failure: &ValidationFailure) {
        show(self.sink.as_ref(), recipient, &Feedback::Toast(failure.toast()));
    }
}

/// Single-use notification slot. Delivering consumes the ticket, so one request
/// produces at most one notification.
pub struct FeedbackTicket {
    recipient: Recipient,
    sink: Arc<dyn NotificationSink>,
    delivered: bool,
}

impl FeedbackTicket {
    /// Player and request this ticket belongs to.
    pub fn recipient(&self) -> &Recipient {
        &self.recipient
    }

    /// Show `feedback` and consume the ticket.
    pub fn deliver(mut self, feedback: Feedback) {
        debug!(request = ?self.recipient.request_id, ?feedback, "delivering feedback");
        show(self.sink.as_ref(), &self.recipient, &feedback);
        self.delivered = true;
    }
}

impl Drop for FeedbackTicket {
    fn drop(&mut self) {
        if !self.delivered {
            warn!(request = ?self.recipient.request_id, "request finished without feedback");
        }
    }
}

fn show(sink: &dyn NotificationSink, to: &Recipient, feedback: &Feedback) {
    match feedback {
        Feedback::Toast(Toast { level, message }) => match level {
            ToastLevel::Success => sink.success(to, message),
            ToastLevel::Error => sink.error(to, message),
            ToastLevel::Info => sink.info(to, message),
        },
        Feedback::Modal(modal) => sink.open_modal(to, modal),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::RecordingSink;

    const PLAYER: &str = "0x52908400098527886e0f7030069857d2e4169ee7";

    #[test]
    fn ticket_delivers_exactly_once_to_its_recipient() {
        let sink = RecordingSink::new();
        let dispatcher = FeedbackDispatcher::new(sink.clone());
        let request = Uuid::new_v4();

        let ticket = dispatcher.ticket(Recipient::request(PLAYER, request));
        ticket.deliver(Toast::success("done").into());

        assert_eq!(sink.toasts(), vec![Toast::success("done")]);
        assert_eq!(sink.recipients(), vec![Recipient::request(PLAYER, request)]);
        assert!(sink.modals().is_empty());
    }

    #[test]
    fn modal_feedback_opens_modal() {
        let sink = RecordingSink::new();
        let dispatcher = FeedbackDispatcher::new(sink.clone());
        let modal = Modal::BetConfirmed {
            poll_id: "p1".into(),
            option_id: "a".into(),
            amount: 10,
            balance: 90,
        };

        dispatcher
            .ticket(Recipient::request(PLAYER, Uuid::new_v4()))
            .deliver(modal.clone().into());

        assert_eq!(sink.modals(), vec![modal]);
        assert!(sink.toasts().is_empty());
    }

    #[test]
    fn validation_failure_surfaces_toast() {
        let sink = RecordingSink::new();
        let dispatcher = FeedbackDispatcher::new(sink.clone());

        dispatcher.reject(&Recipient::player(PLAYER), &ValidationFailure::NoSelection);

        assert_eq!(sink.toasts().len(), 1);
        assert_eq!(sink.toasts()[0].level, ToastLevel::Info);
        assert_eq!(sink.recipients()[0].request_id, None);
    }
}
