//! Community board reactions.

use std::sync::Arc;

use futures::future::BoxFuture;

use crate::{
    dao::{
        models::ToggleReactionCommand,
        remote::{RemoteFailure, ServerActions},
    },
    dto::{
        action::DispatchSummary,
        feedback::{Feedback, Toast},
        reaction::{ReactionResponse, ReactionView},
    },
    error::ServiceError,
    state::{
        SharedState, Wiring,
        board::{ReactionKey, ReactionState, toggled},
        executor::{OptimisticAction, OptimisticExecutor, Refresh, Rollback},
        overlay::OverlayTable,
        query::QueryCache,
    },
};

/// Adds or removes the player's reaction on a post.
pub struct ToggleReaction {
    backend: Arc<dyn ServerActions>,
}

impl OptimisticAction for ToggleReaction {
    const NAME: &'static str = "toggle-reaction";

    type Key = ReactionKey;
    type State = ReactionState;
    type Params = ReactionKey;
    type Output = ReactionState;

    fn query_key(&self, params: &ReactionKey) -> ReactionKey {
        params.clone()
    }

    fn dedupe_entity(&self, params: &ReactionKey) -> String {
        format!("{}:{}", params.player_id, params.post_id)
    }

    fn player_id<'a>(&self, params: &'a ReactionKey) -> &'a str {
        &params.player_id
    }

    fn optimistic_update(&self, current: Option<&ReactionState>, _params: &ReactionKey) -> ReactionState {
        toggled(current)
    }

    fn mutate(&self, params: ReactionKey) -> BoxFuture<'static, Result<ReactionState, RemoteFailure>> {
        self.backend.toggle_reaction(ToggleReactionCommand {
            player_id: params.player_id,
            post_id: params.post_id,
        })
    }

    fn refresh(&self, output: &ReactionState) -> Refresh<ReactionState> {
        Refresh::Payload(Some(output.clone()))
    }

    fn on_success(&self, output: &ReactionState, _params: &ReactionKey) -> Feedback {
        if output.reacted {
            Toast::success("Reaction added").into()
        } else {
            Toast::success("Reaction removed").into()
        }
    }

    fn on_error(
        &self,
        error: &RemoteFailure,
        _params: &ReactionKey,
        rollback: &Rollback<ReactionState>,
    ) -> Option<Feedback> {
        let verb = if rollback.discarded().reacted {
            "add"
        } else {
            "remove"
        };
        let message = match error.user_message() {
            Some(reason) => format!("Could not {verb} your reaction: {reason}"),
            None => format!("Could not {verb} your reaction"),
        };
        Some(Toast::error(message).into())
    }
}

/// Reaction cache plus the toggle executor.
pub struct ReactionCoordinator {
    reactions: Arc<QueryCache<ReactionKey, ReactionState>>,
    toggle: OptimisticExecutor<ToggleReaction>,
}

impl ReactionCoordinator {
    /// Cache and executor sharing `wiring`.
    pub fn new(wiring: &Wiring) -> Self {
        let reactions = QueryCache::<ReactionKey, ReactionState>::new(wiring.queries.clone());
        Self {
            toggle: OptimisticExecutor::new(
                ToggleReaction {
                    backend: Arc::clone(&wiring.backend),
                },
                Arc::clone(&wiring.guard),
                Arc::clone(&reactions),
                OverlayTable::new(),
                wiring.feedback.clone(),
                wiring.settings.clone(),
            ),
            reactions,
        }
    }

    /// Executor flipping reactions.
    pub fn toggle(&self) -> &OptimisticExecutor<ToggleReaction> {
        &self.toggle
    }

    fn view(&self, key: &ReactionKey) -> ReactionView {
        ReactionView::new(&key.post_id, self.toggle.display(key))
    }
}

/// The player's reaction on a post.
pub async fn reaction_view(
    state: &SharedState,
    player_id: &str,
    post_id: &str,
) -> Result<ReactionView, ServiceError> {
    let coordinator = state.reactions();
    let key = ReactionKey::new(player_id, post_id);
    coordinator.reactions.ensure(&key).await?;
    Ok(coordinator.view(&key))
}

/// Flip the player's reaction on a post.
pub async fn toggle_reaction(
    state: &SharedState,
    player_id: &str,
    post_id: &str,
) -> Result<ReactionResponse, ServiceError> {
    let coordinator = state.reactions();
    let key = ReactionKey::new(player_id, post_id);
    coordinator.reactions.ensure(&key).await?;

    let dispatch = coordinator.toggle().execute(key.clone());

    Ok(ReactionResponse {
        dispatch: DispatchSummary::from(&dispatch),
        reaction: coordinator.view(&key),
    })
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::{
        config::AppConfig,
        dto::action::DispatchOutcome,
        state::{AppState, SseHub},
        test_support::{RecordingSink, StubServerActions},
    };

    const PLAYER: &str = "0x52908400098527886E0F7030069857D2E4169EE7";

    fn setup() -> (SharedState, Arc<StubServerActions>, Arc<RecordingSink>) {
        let backend = StubServerActions::new();
        let sink = RecordingSink::new();
        let state = AppState::with_sink(
            AppConfig::default(),
            backend.clone(),
            Arc::new(SseHub::new(8)),
            sink.clone(),
        );
        (state, backend, sink)
    }

    #[tokio::test(start_paused = true)]
    async fn first_reaction_is_counted_immediately() {
        let (state, backend, sink) = setup();
        backend.script_toggle(Ok(ReactionState {
            reacted: true,
            count: 8,
        }));
        backend.reactions.insert(
            ReactionKey::new(PLAYER, "post-1"),
            ReactionState {
                reacted: false,
                count: 7,
            },
        );

        let response = toggle_reaction(&state, PLAYER, "post-1").await.unwrap();
        assert_eq!(response.dispatch.outcome, DispatchOutcome::Accepted);
        assert!(response.reaction.reacted);
        assert_eq!(response.reaction.count, 8);
        assert!(response.reaction.pending);

        tokio::time::sleep(Duration::from_millis(1)).await;
        let view = reaction_view(&state, PLAYER, "post-1").await.unwrap();
        assert!(!view.pending);
        assert_eq!(sink.toasts(), vec![Toast::success("Reaction added")]);
    }

    #[tokio::test(start_paused = true)]
    async fn failed_toggle_restores_counter_and_names_the_change() {
        let (state, backend, sink) = setup();
        backend.script_toggle(Err(RemoteFailure::Rejected {
            message: Some("post is locked".into()),
        }));

        toggle_reaction(&state, PLAYER, "post-2").await.unwrap();
        tokio::time::sleep(Duration::from_millis(1)).await;

        let view = reaction_view(&state, PLAYER, "post-2").await.unwrap();
        assert!(!view.reacted);
        assert_eq!(view.count, 0);
        assert_eq!(
            sink.toasts(),
            vec![Toast::error("Could not add your reaction: post is locked")]
        );
    }
}
