use std::sync::Arc;

use serde::Serialize;
use tracing::warn;

use crate::{
    dto::feedback::{FeedbackEnvelope, Modal, ServerEvent, Toast},
    state::{
        SseHub,
        feedback::{NotificationSink, Recipient},
    },
};

const EVENT_TOAST: &str = "toast";
const EVENT_MODAL: &str = "modal";

/// Notification sink publishing toasts and modals on the feedback SSE stream.
///
/// Events are addressed to the requesting player, so only that player's
/// stream forwards them.
#[derive(Clone)]
pub struct SseNotifier {
    hub: Arc<SseHub>,
}

impl SseNotifier {
    /// Notifier broadcasting on `hub`.
    pub fn new(hub: Arc<SseHub>) -> Arc<Self> {
        Arc::new(Self { hub })
    }

    fn send<T: Serialize>(&self, name: &str, to: &Recipient, body: &T) {
        let envelope = FeedbackEnvelope {
            player_id: &to.player_id,
            request_id: to.request_id,
            body,
        };
        match ServerEvent::json(Some(name.to_string()), &envelope) {
            Ok(event) => self.hub.broadcast(event.addressed_to(to.player_id.clone())),
            Err(err) => warn!(event = name, error = %err, "failed to serialise SSE payload"),
        }
    }
}

impl NotificationSink for SseNotifier {
    fn success(&self, to: &Recipient, message: &str) {
        self.send(EVENT_TOAST, to, &Toast::success(message));
    }

    fn error(&self, to: &Recipient, message: &str) {
        self.send(EVENT_TOAST, to, &Toast::error(message));
    }

    fn info(&self, to: &Recipient, message: &str) {
        self.send(EVENT_TOAST, to, &Toast::info(message));
    }

    fn open_modal(&self, to: &Recipient, modal: &Modal) {
        self.send(EVENT_MODAL, to, modal);
    }
}
