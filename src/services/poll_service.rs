//! Betting on polls.

use std::sync::Arc;

use futures::future::BoxFuture;
use time::OffsetDateTime;

use crate::{
    dao::{
        models::{BetReceipt, PlaceBetCommand},
        remote::{RemoteFailure, ServerActions},
    },
    dto::{
        action::DispatchSummary,
        feedback::{Feedback, Modal, Toast},
        poll::{BetResponse, PlaceBetRequest, PollView},
    },
    error::{ServiceError, ValidationFailure},
    state::{
        SharedState, Wiring,
        executor::{OptimisticAction, OptimisticExecutor, Refresh},
        overlay::OverlayTable,
        poll::{
            BetIntent, Poll, PollId, PollLog, PollLogKey, Wallet, check_bet, predict_bet,
            project_status,
        },
        quest::PlayerId,
        query::QueryCache,
    },
};

const WINDOW_MISSED_MESSAGE: &str =
    "Your bet was recorded after the answer window closed, so it will not earn a reward";

/// Parameters of a bet, resolved against the poll and wallet at submission time.
#[derive(Debug, Clone)]
pub struct BetParams {
    /// Player and poll the bet belongs to.
    pub key: PollLogKey,
    /// Poll definition.
    pub poll: Poll,
    /// Chosen option, if any.
    pub option_id: Option<String>,
    /// Points to wager.
    pub amount: u64,
    /// Spendable balance when the bet was submitted.
    pub balance: u64,
}

/// Places a bet on one poll option.
pub struct PlaceBet {
    backend: Arc<dyn ServerActions>,
}

impl OptimisticAction for PlaceBet {
    const NAME: &'static str = "place-bet";

    type Key = PollLogKey;
    type State = PollLog;
    type Params = BetParams;
    type Output = BetReceipt;

    fn query_key(&self, params: &BetParams) -> PollLogKey {
        params.key.clone()
    }

    fn dedupe_entity(&self, params: &BetParams) -> String {
        format!("{}:{}", params.key.player_id, params.key.poll_id)
    }

    fn player_id<'a>(&self, params: &'a BetParams) -> &'a str {
        &params.key.player_id
    }

    fn validate(&self, current: Option<&PollLog>, params: &BetParams) -> Result<(), ValidationFailure> {
        check_bet(
            &params.poll,
            current,
            &BetIntent {
                option_id: params.option_id.as_deref(),
                amount: params.amount,
                balance: params.balance,
                now: OffsetDateTime::now_utc(),
            },
        )
    }

    fn optimistic_update(&self, _current: Option<&PollLog>, params: &BetParams) -> PollLog {
        predict_bet(
            &params.key,
            params.option_id.as_deref().unwrap_or_default(),
            params.amount,
            OffsetDateTime::now_utc(),
        )
    }

    fn mutate(&self, params: BetParams) -> BoxFuture<'static, Result<BetReceipt, RemoteFailure>> {
        self.backend.place_bet(PlaceBetCommand {
            player_id: params.key.player_id,
            poll_id: params.key.poll_id,
            option_id: params.option_id.unwrap_or_default(),
            amount: params.amount,
        })
    }

    fn refresh(&self, output: &BetReceipt) -> Refresh<PollLog> {
        Refresh::Payload(Some(output.log.clone()))
    }

    fn caveat(&self, output: &BetReceipt) -> Option<String> {
        output.window_missed.then(|| WINDOW_MISSED_MESSAGE.to_string())
    }

    fn on_success(&self, output: &BetReceipt, _params: &BetParams) -> Feedback {
        match self.caveat(output) {
            Some(caveat) => Toast::info(caveat).into(),
            None => Modal::BetConfirmed {
                poll_id: output.log.poll_id.clone(),
                option_id: output.log.option_id.clone(),
                amount: output.log.amount,
                balance: output.balance,
            }
            .into(),
        }
    }
}

/// Poll, bet and wallet caches plus the bet executor.
pub struct PollCoordinator {
    polls: Arc<QueryCache<PollId, Poll>>,
    bets: Arc<QueryCache<PollLogKey, PollLog>>,
    wallets: Arc<QueryCache<PlayerId, Wallet>>,
    place_bet: OptimisticExecutor<PlaceBet>,
}

impl PollCoordinator {
    /// Caches and executor sharing `wiring`.
    pub fn new(wiring: &Wiring) -> Self {
        let bets = QueryCache::<PollLogKey, PollLog>::new(wiring.queries.clone());

        Self {
            polls: QueryCache::<PollId, Poll>::new(wiring.queries.clone()),
            wallets: QueryCache::<PlayerId, Wallet>::new(wiring.queries.clone()),
            place_bet: OptimisticExecutor::new(
                PlaceBet {
                    backend: Arc::clone(&wiring.backend),
                },
                Arc::clone(&wiring.guard),
                Arc::clone(&bets),
                OverlayTable::new(),
                wiring.feedback.clone(),
                wiring.settings.clone(),
            ),
            bets,
        }
    }

    /// Executor placing bets.
    pub fn place_bet(&self) -> &OptimisticExecutor<PlaceBet> {
        &self.place_bet
    }

    async fn load(&self, key: &PollLogKey) -> Result<Poll, ServiceError> {
        let Some(poll) = self.polls.ensure(&key.poll_id).await? else {
            return Err(ServiceError::NotFound(format!(
                "poll `{}` not found",
                key.poll_id
            )));
        };
        self.bets.ensure(key).await?;
        Ok(poll)
    }

    /// Fetch the player's balance. Always goes back to the backend since bets
    /// settled elsewhere change it.
    async fn balance(&self, player_id: &PlayerId) -> Result<u64, ServiceError> {
        let wallet = self.wallets.refetch(player_id).await?;
        Ok(wallet.map(|wallet| wallet.balance).unwrap_or_default())
    }

    fn view(&self, poll: &Poll, key: &PollLogKey, balance: Option<u64>) -> PollView {
        let display = self.place_bet.display(key);
        let now = OffsetDateTime::now_utc();
        let projection = display.project(|log| project_status(poll, log, now));
        PollView::new(poll, display.value.as_ref(), projection, balance)
    }
}

/// Current poll view for a player, with the player's bet and balance.
pub async fn poll_view(
    state: &SharedState,
    player_id: &str,
    poll_id: &str,
) -> Result<PollView, ServiceError> {
    let coordinator = state.polls();
    let key = PollLogKey::new(player_id, poll_id);
    let poll = coordinator.load(&key).await?;
    let balance = coordinator.balance(&key.player_id).await?;
    Ok(coordinator.view(&poll, &key, Some(balance)))
}

/// Place a bet of `request.amount` on `request.option_id`.
pub async fn place_bet(
    state: &SharedState,
    player_id: &str,
    poll_id: &str,
    request: PlaceBetRequest,
) -> Result<BetResponse, ServiceError> {
    let coordinator = state.polls();
    let key = PollLogKey::new(player_id, poll_id);
    let poll = coordinator.load(&key).await?;
    let balance = coordinator.balance(&key.player_id).await?;

    let dispatch = coordinator.place_bet().execute(BetParams {
        key: key.clone(),
        poll: poll.clone(),
        option_id: request.option_id,
        amount: request.amount,
        balance,
    });

    Ok(BetResponse {
        dispatch: DispatchSummary::from(&dispatch),
        poll: coordinator.view(&poll, &key, Some(balance)),
    })
}
