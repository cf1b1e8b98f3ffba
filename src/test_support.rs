//! In-memory collaborators shared by unit tests.

use std::{
    collections::VecDeque,
    sync::{
        Arc, Mutex,
        atomic::{AtomicBool, Ordering},
    },
};

use dashmap::DashMap;
use futures::future::BoxFuture;
use tokio::sync::oneshot;

use crate::{
    dao::{
        models::{
            BetReceipt, ClaimQuestCommand, ClaimReceipt, CompleteQuestCommand, PlaceBetCommand,
            ToggleReactionCommand,
        },
        remote::{RemoteError, RemoteFailure, RemoteResult, ServerActions},
    },
    dto::feedback::{Modal, Toast},
    state::{
        board::{ReactionKey, ReactionState},
        feedback::{NotificationSink, Recipient},
        poll::{Poll, PollId, PollLog, PollLogKey, Wallet},
        quest::{PlayerId, Quest, QuestId, QuestLog, QuestLogKey},
    },
};

/// Sink remembering every notification it was asked to show.
#[derive(Default)]
pub(crate) struct RecordingSink {
    toasts: Mutex<Vec<Toast>>,
    modals: Mutex<Vec<Modal>>,
    recipients: Mutex<Vec<Recipient>>,
}

impl RecordingSink {
    pub(crate) fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub(crate) fn toasts(&self) -> Vec<Toast> {
        self.toasts.lock().unwrap().clone()
    }

    pub(crate) fn modals(&self) -> Vec<Modal> {
        self.modals.lock().unwrap().clone()
    }

    /// Recipients of every notification, toasts and modals alike, in order.
    pub(crate) fn recipients(&self) -> Vec<Recipient> {
        self.recipients.lock().unwrap().clone()
    }

    /// Total notifications shown so far.
    pub(crate) fn count(&self) -> usize {
        self.recipients.lock().unwrap().len()
    }

    fn toast(&self, to: &Recipient, toast: Toast) {
        self.recipients.lock().unwrap().push(to.clone());
        self.toasts.lock().unwrap().push(toast);
    }
}

impl NotificationSink for RecordingSink {
    fn success(&self, to: &Recipient, message: &str) {
        self.toast(to, Toast::success(message));
    }

    fn error(&self, to: &Recipient, message: &str) {
        self.toast(to, Toast::error(message));
    }

    fn info(&self, to: &Recipient, message: &str) {
        self.toast(to, Toast::info(message));
    }

    fn open_modal(&self, to: &Recipient, modal: &Modal) {
        self.recipients.lock().unwrap().push(to.clone());
        self.modals.lock().unwrap().push(modal.clone());
    }
}

type Reply<T> = BoxFuture<'static, Result<T, RemoteFailure>>;
type Replies<T> = Mutex<VecDeque<Reply<T>>>;

fn push_ready<T: Send + 'static>(replies: &Replies<T>, reply: Result<T, RemoteFailure>) {
    replies
        .lock()
        .unwrap()
        .push_back(Box::pin(async move { reply }));
}

/// Queue a reply that resolves once the returned sender is used.
fn push_deferred<T: Send + 'static>(
    replies: &Replies<T>,
) -> oneshot::Sender<Result<T, RemoteFailure>> {
    let (tx, rx) = oneshot::channel();
    replies.lock().unwrap().push_back(Box::pin(async move {
        rx.await.unwrap_or_else(|_| {
            Err(RemoteFailure::Rejected {
                message: Some("deferred reply dropped".into()),
            })
        })
    }));
    tx
}

/// Backend serving entities from maps and answering mutations from scripted replies.
pub(crate) struct StubServerActions {
    pub(crate) quests: DashMap<QuestId, Quest>,
    pub(crate) quest_logs: DashMap<QuestLogKey, QuestLog>,
    pub(crate) polls: DashMap<PollId, Poll>,
    pub(crate) poll_logs: DashMap<PollLogKey, PollLog>,
    pub(crate) wallets: DashMap<PlayerId, Wallet>,
    pub(crate) reactions: DashMap<ReactionKey, ReactionState>,
    completions: Replies<QuestLog>,
    claims: Replies<ClaimReceipt>,
    bets: Replies<BetReceipt>,
    toggles: Replies<ReactionState>,
    calls: Mutex<Vec<&'static str>>,
    healthy: AtomicBool,
}

impl StubServerActions {
    pub(crate) fn new() -> Arc<Self> {
        Arc::new(Self {
            quests: DashMap::new(),
            quest_logs: DashMap::new(),
            polls: DashMap::new(),
            poll_logs: DashMap::new(),
            wallets: DashMap::new(),
            reactions: DashMap::new(),
            completions: Mutex::new(VecDeque::new()),
            claims: Mutex::new(VecDeque::new()),
            bets: Mutex::new(VecDeque::new()),
            toggles: Mutex::new(VecDeque::new()),
            calls: Mutex::new(Vec::new()),
            healthy: AtomicBool::new(true),
        })
    }

    pub(crate) fn script_completion(&self, reply: Result<QuestLog, RemoteFailure>) {
        push_ready(&self.completions, reply);
    }

    pub(crate) fn script_claim(&self, reply: Result<ClaimReceipt, RemoteFailure>) {
        push_ready(&self.claims, reply);
    }

    /// Queue a claim reply held back until the test answers through the sender.
    pub(crate) fn defer_claim(&self) -> oneshot::Sender<Result<ClaimReceipt, RemoteFailure>> {
        push_deferred(&self.claims)
    }

    pub(crate) fn script_bet(&self, reply: Result<BetReceipt, RemoteFailure>) {
        push_ready(&self.bets, reply);
    }

    pub(crate) fn script_toggle(&self, reply: Result<ReactionState, RemoteFailure>) {
        push_ready(&self.toggles, reply);
    }

    pub(crate) fn set_healthy(&self, healthy: bool) {
        self.healthy.store(healthy, Ordering::SeqCst);
    }

    /// Number of mutation calls received for `action`.
    pub(crate) fn calls(&self, action: &str) -> usize {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .filter(|name| **name == action)
            .count()
    }

    fn answer<T: Send + 'static>(
        &self,
        action: &'static str,
        replies: &Replies<T>,
    ) -> BoxFuture<'static, Result<T, RemoteFailure>> {
        self.calls.lock().unwrap().push(action);
        let reply = replies.lock().unwrap().pop_front();
        reply.unwrap_or_else(|| {
            Box::pin(async move {
                Err(RemoteFailure::Rejected {
                    message: Some(format!("no scripted reply for {action}")),
                })
            })
        })
    }
}

fn lookup<K, V>(map: &DashMap<K, V>, key: &K) -> BoxFuture<'static, RemoteResult<Option<V>>>
where
    K: Eq + std::hash::Hash,
    V: Clone + Send + 'static,
{
    let value = map.get(key).map(|entry| entry.clone());
    Box::pin(async move { Ok(value) })
}

impl ServerActions for StubServerActions {
    fn complete_quest(
        &self,
        _command: CompleteQuestCommand,
    ) -> BoxFuture<'static, Result<QuestLog, RemoteFailure>> {
        self.answer("complete-quest", &self.completions)
    }

    fn claim_quest_reward(
        &self,
        _command: ClaimQuestCommand,
    ) -> BoxFuture<'static, Result<ClaimReceipt, RemoteFailure>> {
        self.answer("claim-quest-reward", &self.claims)
    }

    fn place_bet(
        &self,
        _command: PlaceBetCommand,
    ) -> BoxFuture<'static, Result<BetReceipt, RemoteFailure>> {
        self.answer("place-bet", &self.bets)
    }

    fn toggle_reaction(
        &self,
        _command: ToggleReactionCommand,
    ) -> BoxFuture<'static, Result<ReactionState, RemoteFailure>> {
        self.answer("toggle-reaction", &self.toggles)
    }

    fn fetch_quest(&self, quest_id: &str) -> BoxFuture<'static, RemoteResult<Option<Quest>>> {
        lookup(&self.quests, &quest_id.to_string())
    }

    fn fetch_quest_log(
        &self,
        key: &QuestLogKey,
    ) -> BoxFuture<'static, RemoteResult<Option<QuestLog>>> {
        lookup(&self.quest_logs, key)
    }

    fn fetch_poll(&self, poll_id: &str) -> BoxFuture<'static, RemoteResult<Option<Poll>>> {
        lookup(&self.polls, &poll_id.to_string())
    }

    fn fetch_poll_log(
        &self,
        key: &PollLogKey,
    ) -> BoxFuture<'static, RemoteResult<Option<PollLog>>> {
        lookup(&self.poll_logs, key)
    }

    fn fetch_wallet(&self, player_id: &str) -> BoxFuture<'static, RemoteResult<Option<Wallet>>> {
        lookup(&self.wallets, &player_id.to_string())
    }

    fn fetch_reaction(
        &self,
        key: &ReactionKey,
    ) -> BoxFuture<'static, RemoteResult<Option<ReactionState>>> {
        lookup(&self.reactions, key)
    }

    fn health_check(&self) -> BoxFuture<'static, RemoteResult<()>> {
        let healthy = self.healthy.load(Ordering::SeqCst);
        Box::pin(async move {
            if healthy {
                Ok(())
            } else {
                Err(RemoteError::Status {
                    path: "health".into(),
                    status: 503,
                })
            }
        })
    }
}
