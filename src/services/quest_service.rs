//! Quest completion and reward claiming.

use std::sync::Arc;

use futures::future::BoxFuture;
use time::OffsetDateTime;
use tracing::debug;

use crate::{
    dao::{
        models::{ClaimQuestCommand, ClaimReceipt, CompleteQuestCommand},
        remote::{RemoteFailure, ServerActions},
    },
    dto::{
        action::DispatchSummary,
        feedback::{Feedback, Modal, Toast},
        quest::{QuestActionResponse, QuestView},
    },
    error::{ServiceError, ValidationFailure},
    state::{
        SharedState, Wiring,
        executor::{OptimisticAction, OptimisticExecutor, Refresh},
        overlay::OverlayTable,
        projection::DisplayState,
        query::QueryCache,
        quest::{
            self, Quest, QuestId, QuestLog, QuestLogKey, check_claim, check_completion,
            predict_claim, predict_completion,
        },
    },
};

/// Parameters of a quest action: the player's log key plus the quest definition.
#[derive(Debug, Clone)]
pub struct QuestParams {
    /// Player and quest the log belongs to.
    pub key: QuestLogKey,
    /// Quest definition.
    pub quest: Quest,
}

fn quest_entity(params: &QuestParams) -> String {
    format!("{}:{}", params.key.player_id, params.key.quest_id)
}

/// Records one completion of a quest.
pub struct CompleteQuest {
    backend: Arc<dyn ServerActions>,
}

impl OptimisticAction for CompleteQuest {
    const NAME: &'static str = "complete-quest";

    type Key = QuestLogKey;
    type State = QuestLog;
    type Params = QuestParams;
    type Output = QuestLog;

    fn query_key(&self, params: &QuestParams) -> QuestLogKey {
        params.key.clone()
    }

    fn dedupe_entity(&self, params: &QuestParams) -> String {
        quest_entity(params)
    }

    fn player_id<'a>(&self, params: &'a QuestParams) -> &'a str {
        &params.key.player_id
    }

    fn validate(
        &self,
        current: Option<&QuestLog>,
        params: &QuestParams,
    ) -> Result<(), ValidationFailure> {
        check_completion(&params.quest, current, OffsetDateTime::now_utc())
    }

    fn optimistic_update(&self, current: Option<&QuestLog>, params: &QuestParams) -> QuestLog {
        predict_completion(&params.quest, &params.key, current, OffsetDateTime::now_utc())
    }

    fn mutate(&self, params: QuestParams) -> BoxFuture<'static, Result<QuestLog, RemoteFailure>> {
        self.backend.complete_quest(CompleteQuestCommand {
            player_id: params.key.player_id,
            quest_id: params.key.quest_id,
        })
    }

    fn refresh(&self, output: &QuestLog) -> Refresh<QuestLog> {
        Refresh::Payload(Some(output.clone()))
    }

    fn on_success(&self, output: &QuestLog, params: &QuestParams) -> Feedback {
        let required = params.quest.required_repeats();
        if output.completed {
            Toast::success(format!("Quest \"{}\" completed!", params.quest.title)).into()
        } else {
            Toast::success(format!(
                "Progress saved ({}/{required})",
                output.repeat_count
            ))
            .into()
        }
    }
}

/// Collects the reward of a completed quest.
pub struct ClaimQuestReward {
    backend: Arc<dyn ServerActions>,
}

impl OptimisticAction for ClaimQuestReward {
    const NAME: &'static str = "claim-quest-reward";

    type Key = QuestLogKey;
    type State = QuestLog;
    type Params = QuestParams;
    type Output = ClaimReceipt;

    fn query_key(&self, params: &QuestParams) -> QuestLogKey {
        params.key.clone()
    }

    fn dedupe_entity(&self, params: &QuestParams) -> String {
        quest_entity(params)
    }

    fn player_id<'a>(&self, params: &'a QuestParams) -> &'a str {
        &params.key.player_id
    }

    fn validate(
        &self,
        current: Option<&QuestLog>,
        params: &QuestParams,
    ) -> Result<(), ValidationFailure> {
        check_claim(&params.quest, current)
    }

    fn optimistic_update(&self, current: Option<&QuestLog>, params: &QuestParams) -> QuestLog {
        predict_claim(&params.key, current)
    }

    fn mutate(
        &self,
        params: QuestParams,
    ) -> BoxFuture<'static, Result<ClaimReceipt, RemoteFailure>> {
        self.backend.claim_quest_reward(ClaimQuestCommand {
            player_id: params.key.player_id,
            quest_id: params.key.quest_id,
        })
    }

    fn refresh(&self, output: &ClaimReceipt) -> Refresh<QuestLog> {
        Refresh::Payload(Some(output.log.clone()))
    }

    fn on_success(&self, output: &ClaimReceipt, params: &QuestParams) -> Feedback {
        Modal::RewardClaimed {
            quest_id: params.quest.id.clone(),
            title: params.quest.title.clone(),
            reward: output.reward.clone(),
        }
        .into()
    }
}

/// Quest caches plus the executors of both quest actions.
///
/// Both actions patch the same quest log, so they share its cache and overlay table.
pub struct QuestCoordinator {
    quests: Arc<QueryCache<QuestId, Quest>>,
    logs: Arc<QueryCache<QuestLogKey, QuestLog>>,
    complete: OptimisticExecutor<CompleteQuest>,
    claim: OptimisticExecutor<ClaimQuestReward>,
}

impl QuestCoordinator {
    /// Caches and executors sharing `wiring`.
    pub fn new(wiring: &Wiring) -> Self {
        let quests = QueryCache::<QuestId, Quest>::new(wiring.queries.clone());
        let logs = QueryCache::<QuestLogKey, QuestLog>::new(wiring.queries.clone());
        let overlays = OverlayTable::new();

        Self {
            complete: OptimisticExecutor::new(
                CompleteQuest {
                    backend: Arc::clone(&wiring.backend),
                },
                Arc::clone(&wiring.guard),
                Arc::clone(&logs),
                Arc::clone(&overlays),
                wiring.feedback.clone(),
                wiring.settings.clone(),
            ),
            claim: OptimisticExecutor::new(
                ClaimQuestReward {
                    backend: Arc::clone(&wiring.backend),
                },
                Arc::clone(&wiring.guard),
                Arc::clone(&logs),
                overlays,
                wiring.feedback.clone(),
                wiring.settings.clone(),
            ),
            quests,
            logs,
        }
    }

    /// Executor recording completions.
    pub fn complete(&self) -> &OptimisticExecutor<CompleteQuest> {
        &self.complete
    }

    /// Executor claiming rewards.
    pub fn claim(&self) -> &OptimisticExecutor<ClaimQuestReward> {
        &self.claim
    }

    /// Displayed quest log: authoritative value merged with the newest prediction.
    pub fn display(&self, key: &QuestLogKey) -> DisplayState<QuestLog> {
        self.complete.display(key)
    }

    /// Load the quest definition and the player's log, fetching whatever was never loaded.
    async fn load(&self, key: &QuestLogKey) -> Result<Quest, ServiceError> {
        let Some(quest) = self.quests.ensure(&key.quest_id).await? else {
            return Err(ServiceError::NotFound(format!(
                "quest `{}` not found",
                key.quest_id
            )));
        };
        self.logs.ensure(key).await?;
        Ok(quest)
    }

    fn view(&self, quest: &Quest, key: &QuestLogKey) -> QuestView {
        let display = self.display(key);
        let projection = display.project(quest::project_status);
        QuestView::new(quest, display.value.as_ref(), projection)
    }
}

/// Current quest view for a player, including any pending prediction.
pub async fn quest_view(
    state: &SharedState,
    player_id: &str,
    quest_id: &str,
) -> Result<QuestView, ServiceError> {
    let coordinator = state.quests();
    let key = QuestLogKey::new(player_id, quest_id);
    let quest = coordinator.load(&key).await?;
    Ok(coordinator.view(&quest, &key))
}

/// Record one completion of `quest_id` for `player_id`.
pub async fn complete_quest(
    state: &SharedState,
    player_id: &str,
    quest_id: &str,
) -> Result<QuestActionResponse, ServiceError> {
    let coordinator = state.quests();
    let key = QuestLogKey::new(player_id, quest_id);
    let quest = coordinator.load(&key).await?;

    let dispatch = coordinator.complete().execute(QuestParams {
        key: key.clone(),
        quest: quest.clone(),
    });
    let summary = DispatchSummary::from(&dispatch);
    debug!(%player_id, %quest_id, outcome = ?summary.outcome, "quest completion submitted");

    Ok(QuestActionResponse {
        dispatch: summary,
        quest: coordinator.view(&quest, &key),
    })
}

/// Claim the reward of `quest_id` for `player_id`.
pub async fn claim_quest(
    state: &SharedState,
    player_id: &str,
    quest_id: &str,
) -> Result<QuestActionResponse, ServiceError> {
    let coordinator = state.quests();
    let key = QuestLogKey::new(player_id, quest_id);
    let quest = coordinator.load(&key).await?;

    let dispatch = coordinator.claim().execute(QuestParams {
        key: key.clone(),
        quest: quest.clone(),
    });

    Ok(QuestActionResponse {
        dispatch: DispatchSummary::from(&dispatch),
        quest: coordinator.view(&quest, &key),
    })
}
