pub mod board;
pub mod executor;
pub mod feedback;
pub mod guard;
pub mod overlay;
pub mod poll;
pub mod projection;
pub mod query;
pub mod quest;
mod sse;

use std::sync::Arc;

use tokio::sync::watch;

use crate::{
    config::AppConfig,
    dao::{queries::BackendQueries, remote::ServerActions},
    services::{
        poll_service::PollCoordinator, quest_service::QuestCoordinator,
        reaction_service::ReactionCoordinator, sse_events::SseNotifier,
    },
};

pub use self::sse::SseHub;
use self::{
    executor::ExecutorSettings,
    feedback::{FeedbackDispatcher, NotificationSink},
    guard::DebounceGuard,
};

/// Shared handle on [`AppState`].
pub type SharedState = Arc<AppState>;

/// Collaborators shared by every coordinator.
pub struct Wiring {
    /// Remote server actions.
    pub backend: Arc<dyn ServerActions>,
    /// Query sources over the backend.
    pub queries: Arc<BackendQueries>,
    /// One guard for every action; dedupe keys carry the action name.
    pub guard: Arc<DebounceGuard>,
    /// Feedback dispatcher for every executor.
    pub feedback: FeedbackDispatcher,
    /// Timeouts and fallback messages.
    pub settings: ExecutorSettings,
}

/// Central application state: the remote backend, the feedback stream and one
/// coordinator per entity family.
pub struct AppState {
    config: AppConfig,
    backend: Arc<dyn ServerActions>,
    feedback_hub: Arc<SseHub>,
    degraded: watch::Sender<bool>,
    quests: QuestCoordinator,
    polls: PollCoordinator,
    reactions: ReactionCoordinator,
}

impl AppState {
    /// Build the state, publishing notifications on the feedback SSE stream.
    ///
    /// The application starts in degraded mode until the backend answers a health check.
    pub fn new(config: AppConfig, backend: Arc<dyn ServerActions>) -> SharedState {
        let hub = Arc::new(SseHub::new(config.feedback_capacity));
        let sink = SseNotifier::new(Arc::clone(&hub));
        Self::with_sink(config, backend, hub, sink)
    }

    /// Build the state with an explicit notification sink.
    pub fn with_sink(
        config: AppConfig,
        backend: Arc<dyn ServerActions>,
        feedback_hub: Arc<SseHub>,
        sink: Arc<dyn NotificationSink>,
    ) -> SharedState {
        let wiring = Wiring {
            backend: Arc::clone(&backend),
            queries: BackendQueries::new(Arc::clone(&backend)),
            guard: DebounceGuard::new(config.debounce_delay),
            feedback: FeedbackDispatcher::new(sink),
            settings: config.executor_settings(),
        };
        let (degraded_tx, _rx) = watch::channel(true);

        Arc::new(Self {
            quests: QuestCoordinator::new(&wiring),
            polls: PollCoordinator::new(&wiring),
            reactions: ReactionCoordinator::new(&wiring),
            config,
            backend,
            feedback_hub,
            degraded: degraded_tx,
        })
    }

    /// Loaded configuration.
    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    /// Remote backend serving actions and queries.
    pub fn backend(&self) -> Arc<dyn ServerActions> {
        Arc::clone(&self.backend)
    }

    /// Broadcast hub used for the feedback SSE stream.
    pub fn feedback_sse(&self) -> &SseHub {
        &self.feedback_hub
    }

    /// Quest completion and claim coordinator.
    pub fn quests(&self) -> &QuestCoordinator {
        &self.quests
    }

    /// Bet coordinator.
    pub fn polls(&self) -> &PollCoordinator {
        &self.polls
    }

    /// Reaction coordinator.
    pub fn reactions(&self) -> &ReactionCoordinator {
        &self.reactions
    }

    /// Current degraded flag.
    pub fn is_degraded(&self) -> bool {
        *self.degraded.borrow()
    }

    /// Subscribe to degraded mode updates.
    pub fn degraded_watcher(&self) -> watch::Receiver<bool> {
        self.degraded.subscribe()
    }

    /// Update and broadcast the degraded flag when the value changes.
    pub fn update_degraded(&self, value: bool) {
        self.degraded.send_if_modified(|current| {
            if *current == value {
                return false;
            }
            *current = value;
            true
        });
    }
}
