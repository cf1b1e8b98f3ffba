//! Guarded optimistic execution of remote mutations.
//!
//! `execute` runs synchronously up to the point where the prediction is
//! visible, then hands the remote call to a spawned task that settles or rolls
//! back the prediction and delivers exactly one notification.

use std::{fmt, hash::Hash, sync::Arc, time::Duration};

use futures::future::BoxFuture;
use tokio::{task::JoinHandle, time::Instant};
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::{
    dao::remote::RemoteFailure,
    dto::feedback::{Feedback, Toast},
    error::ValidationFailure,
    state::{
        feedback::{FeedbackDispatcher, FeedbackTicket, Recipient},
        guard::{DebounceGuard, DedupeKey, GuardPermit},
        overlay::{OverlayId, OverlayTable},
        projection::DisplayState,
        query::QueryCache,
    },
};

/// Default bound on a remote mutation before it is treated as failed.
pub const DEFAULT_REMOTE_TIMEOUT: Duration = Duration::from_secs(10);
/// Error toast used when the server gives no reason.
pub const DEFAULT_FALLBACK_ERROR: &str = "Something went wrong, please try again";

/// How the authoritative state is refreshed after a confirmed mutation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Refresh<S> {
    /// The response carries the new authoritative value.
    Payload(Option<S>),
    /// Fetch the entity again from its query source.
    Refetch,
}

/// Everything the executor needs to know about one kind of action.
///
/// `query_key`, `mutate`, `optimistic_update`, `on_success` and `on_error`
/// are the configuration of the flow; the rest have sensible defaults.
pub trait OptimisticAction: Send + Sync + 'static {
    /// Action name, part of every dedupe key.
    const NAME: &'static str;

    /// Query key of the entity the action patches.
    type Key: Clone + Eq + Hash + fmt::Debug + Send + Sync + 'static;
    /// Authoritative entity state.
    type State: Clone + fmt::Debug + Send + Sync + 'static;
    /// Parameters supplied by the caller.
    type Params: Clone + fmt::Debug + Send + Sync + 'static;
    /// Success payload of the remote mutation.
    type Output: fmt::Debug + Send + 'static;

    /// Entity patched by this request.
    fn query_key(&self, params: &Self::Params) -> Self::Key;

    /// Entity part of the dedupe key.
    fn dedupe_entity(&self, params: &Self::Params) -> String;

    /// Player who issued the request; notifications are addressed to them.
    fn player_id<'a>(&self, params: &'a Self::Params) -> &'a str;

    /// Local preconditions, checked against the displayed state.
    fn validate(
        &self,
        _current: Option<&Self::State>,
        _params: &Self::Params,
    ) -> Result<(), ValidationFailure> {
        Ok(())
    }

    /// Predicted state after the action. Must synthesise a placeholder when
    /// `current` is `None`.
    fn optimistic_update(&self, current: Option<&Self::State>, params: &Self::Params)
    -> Self::State;

    /// The remote operation.
    fn mutate(&self, params: Self::Params) -> BoxFuture<'static, Result<Self::Output, RemoteFailure>>;

    /// How to refresh the authoritative state once the mutation is confirmed.
    fn refresh(&self, _output: &Self::Output) -> Refresh<Self::State> {
        Refresh::Refetch
    }

    /// Domain caveat on an otherwise successful outcome. Never triggers a rollback.
    fn caveat(&self, _output: &Self::Output) -> Option<String> {
        None
    }

    /// Notification for a confirmed request.
    fn on_success(&self, output: &Self::Output, params: &Self::Params) -> Feedback;

    /// Notification for a rolled back request. `None` shows the server message,
    /// or the fallback message when the server gave none.
    fn on_error(
        &self,
        _error: &RemoteFailure,
        _params: &Self::Params,
        _rollback: &Rollback<Self::State>,
    ) -> Option<Feedback> {
        None
    }
}

/// State discarded by a rollback, handed to [`OptimisticAction::on_error`].
#[derive(Debug, Clone)]
pub struct Rollback<S> {
    previous: Option<S>,
    discarded: S,
}

impl<S> Rollback<S> {
    /// Authoritative value at the time the request was issued.
    pub fn previous(&self) -> Option<&S> {
        self.previous.as_ref()
    }

    /// Prediction that was withdrawn.
    pub fn discarded(&self) -> &S {
        &self.discarded
    }
}

/// A request accepted by the guard.
#[derive(Debug, Clone)]
pub struct ActionRequest {
    /// Correlation id reported to the client and in logs.
    pub id: Uuid,
    /// Key the guard accepted the request under.
    pub key: DedupeKey,
    /// Time the guard accepted the request.
    pub submitted_at: Instant,
}

/// Final outcome of an accepted request.
#[derive(Debug)]
pub enum Settlement<O> {
    /// The server confirmed the mutation.
    Confirmed {
        /// Success payload returned by the server.
        output: O,
        /// Domain caveat, e.g. a bet recorded after the answer window.
        caveat: Option<String>,
    },
    /// The mutation failed and the prediction was withdrawn.
    RolledBack(RemoteFailure),
}

impl<O> Settlement<O> {
    /// Whether the server confirmed the mutation.
    pub fn is_confirmed(&self) -> bool {
        matches!(self, Settlement::Confirmed { .. })
    }
}

/// Handle on a request whose remote call is in flight.
#[derive(Debug)]
pub struct Execution<O> {
    request: ActionRequest,
    handle: JoinHandle<Settlement<O>>,
}

impl<O> Execution<O> {
    /// The accepted request.
    pub fn request(&self) -> &ActionRequest {
        &self.request
    }

    /// Wait for the request to settle. `None` if the settling task was aborted.
    pub async fn settled(self) -> Option<Settlement<O>> {
        match self.handle.await {
            Ok(settlement) => Some(settlement),
            Err(err) => {
                warn!(request = %self.request.id, error = %err, "settling task did not complete");
                None
            }
        }
    }
}

/// Immediate result of [`OptimisticExecutor::execute`].
#[derive(Debug)]
pub enum Dispatch<O> {
    /// The prediction is visible and the remote call is running.
    Accepted(Execution<O>),
    /// Duplicate or rapid-fire request; nothing happened.
    Ignored,
    /// Local preconditions failed; the player was notified, nothing else happened.
    Invalid(ValidationFailure),
}

/// Tunables shared by every executor.
#[derive(Debug, Clone)]
pub struct ExecutorSettings {
    /// Bound on the remote call; `None` waits forever.
    pub remote_timeout: Option<Duration>,
    /// Error toast shown when the server gives no reason.
    pub fallback_error: Arc<str>,
}

impl Default for ExecutorSettings {
    fn default() -> Self {
        Self {
            remote_timeout: Some(DEFAULT_REMOTE_TIMEOUT),
            fallback_error: Arc::from(DEFAULT_FALLBACK_ERROR),
        }
    }
}

/// Runs one kind of [`OptimisticAction`] behind a debounce guard.
pub struct OptimisticExecutor<A: OptimisticAction> {
    action: Arc<A>,
    guard: Arc<DebounceGuard>,
    cache: Arc<QueryCache<A::Key, A::State>>,
    overlays: Arc<OverlayTable<A::Key, A::State>>,
    feedback: FeedbackDispatcher,
    settings: ExecutorSettings,
}

impl<A: OptimisticAction> OptimisticExecutor<A> {
    /// Executor for `action`, sharing the guard, cache and overlays with other executors.
    pub fn new(
        action: A,
        guard: Arc<DebounceGuard>,
        cache: Arc<QueryCache<A::Key, A::State>>,
        overlays: Arc<OverlayTable<A::Key, A::State>>,
        feedback: FeedbackDispatcher,
        settings: ExecutorSettings,
    ) -> Self {
        Self {
            action: Arc::new(action),
            guard,
            cache,
            overlays,
            feedback,
            settings,
        }
    }

    /// Dedupe key a request with `params` would use.
    pub fn dedupe_key(&self, params: &A::Params) -> DedupeKey {
        DedupeKey::new(A::NAME, self.action.dedupe_entity(params))
    }

    /// Whether a request for `key` is in flight.
    pub fn is_pending(&self, key: &DedupeKey) -> bool {
        self.guard.is_in_flight(key)
    }

    /// Whether a prediction for `key` is displayed.
    pub fn is_optimistic(&self, key: &DedupeKey) -> bool {
        self.overlays.is_active(key)
    }

    /// Authoritative value merged with the newest active prediction.
    pub fn display(&self, query_key: &A::Key) -> DisplayState<A::State> {
        DisplayState::merge(self.cache.data(query_key), self.overlays.current(query_key))
    }

    /// Start the guarded optimistic flow for `params`.
    ///
    /// Returns once the prediction is visible; the remote call settles in a
    /// spawned task. Must be called from within a tokio runtime.
    pub fn execute(&self, params: A::Params) -> Dispatch<A::Output> {
        let key = self.dedupe_key(&params);
        let Some(permit) = self.guard.try_acquire(key.clone()) else {
            debug!(%key, "request ignored by debounce guard");
            return Dispatch::Ignored;
        };

        let query_key = self.action.query_key(&params);
        let player_id = self.action.player_id(&params).to_string();
        let current = self.display(&query_key).value;

        if let Err(failure) = self.action.validate(current.as_ref(), &params) {
            debug!(%key, %failure, "request refused before dispatch");
            self.feedback.reject(&Recipient::player(player_id), &failure);
            return Dispatch::Invalid(failure);
        }

        let predicted = self.action.optimistic_update(current.as_ref(), &params);
        let overlay_id = match self
            .overlays
            .install(query_key.clone(), key.clone(), predicted.clone())
        {
            Ok(id) => id,
            Err(err) => {
                warn!(%key, error = %err, "prediction already displayed; ignoring request");
                return Dispatch::Ignored;
            }
        };

        let request = ActionRequest {
            id: Uuid::new_v4(),
            key: key.clone(),
            submitted_at: Instant::now(),
        };
        debug!(%key, request = %request.id, "prediction installed");

        let task = SettleTask {
            action: Arc::clone(&self.action),
            cache: Arc::clone(&self.cache),
            lease: OverlayLease {
                table: Arc::clone(&self.overlays),
                query_key: query_key.clone(),
                key,
                id: overlay_id,
                armed: true,
            },
            ticket: self.feedback.ticket(Recipient::request(player_id, request.id)),
            permit,
            settings: self.settings.clone(),
            rollback: Rollback {
                previous: self.cache.data(&query_key),
                discarded: predicted,
            },
            query_key,
            params,
        };
        let handle = tokio::spawn(task.run());

        Dispatch::Accepted(Execution { request, handle })
    }
}

/// Owns an installed overlay until it is settled or rolled back. Dropping an
/// armed lease rolls the overlay back.
struct OverlayLease<K, S>
where
    K: Clone + Eq + Hash + fmt::Debug,
    S: Clone,
{
    table: Arc<OverlayTable<K, S>>,
    query_key: K,
    key: DedupeKey,
    id: OverlayId,
    armed: bool,
}

impl<K, S> OverlayLease<K, S>
where
    K: Clone + Eq + Hash + fmt::Debug,
    S: Clone,
{
    fn settle(mut self) {
        self.armed = false;
        if let Err(err) = self.table.settle(&self.query_key, &self.key, self.id) {
            warn!(key = %self.key, error = %err, "failed to settle overlay");
        }
    }

    fn rollback(mut self) {
        self.armed = false;
        if let Err(err) = self.table.rollback(&self.query_key, &self.key, self.id) {
            warn!(key = %self.key, error = %err, "failed to roll back overlay");
        }
    }
}

impl<K, S> Drop for OverlayLease<K, S>
where
    K: Clone + Eq + Hash + fmt::Debug,
    S: Clone,
{
    fn drop(&mut self) {
        if self.armed {
            warn!(key = %self.key, "overlay released without settlement; rolling back");
            let _ = self.table.rollback(&self.query_key, &self.key, self.id);
        }
    }
}

struct SettleTask<A: OptimisticAction> {
    action: Arc<A>,
    cache: Arc<QueryCache<A::Key, A::State>>,
    lease: OverlayLease<A::Key, A::State>,
    ticket: FeedbackTicket,
    permit: GuardPermit,
    settings: ExecutorSettings,
    rollback: Rollback<A::State>,
    query_key: A::Key,
    params: A::Params,
}

impl<A: OptimisticAction> SettleTask<A> {
    async fn run(self) -> Settlement<A::Output> {
        let Self {
            action,
            cache,
            lease,
            ticket,
            permit,
            settings,
            rollback,
            query_key,
            params,
        } = self;
        let key = permit.key().clone();
        let request = ticket.recipient().request_id;

        let remote = action.mutate(params.clone());
        let outcome = match settings.remote_timeout {
            Some(limit) => match tokio::time::timeout(limit, remote).await {
                Ok(result) => result,
                Err(_) => Err(RemoteFailure::Timeout(limit)),
            },
            None => remote.await,
        };

        let settlement = match outcome {
            Ok(output) => {
                match action.refresh(&output) {
                    Refresh::Payload(value) => cache.set(query_key, value),
                    Refresh::Refetch => {
                        if let Err(err) = cache.refetch(&query_key).await {
                            warn!(%key, error = %err, "refresh after confirmed request failed");
                        }
                    }
                }
                lease.settle();

                let caveat = action.caveat(&output);
                info!(%key, ?request, caveat = ?caveat, "request confirmed");
                ticket.deliver(action.on_success(&output, &params));
                Settlement::Confirmed { output, caveat }
            }
            Err(failure) => {
                lease.rollback();
                warn!(%key, ?request, error = %failure, "request rolled back");

                let feedback = action
                    .on_error(&failure, &params, &rollback)
                    .unwrap_or_else(|| {
                        let message = failure
                            .user_message()
                            .unwrap_or(settings.fallback_error.as_ref());
                        Toast::error(message).into()
                    });
                ticket.deliver(feedback);
                Settlement::RolledBack(failure)
            }
        };

        drop(permit);
        settlement
    }
}
