//! [`QuerySource`] adapters over the remote queries.

use std::sync::Arc;

use futures::future::BoxFuture;

use crate::{
    dao::remote::{RemoteResult, ServerActions},
    state::{
        board::{ReactionKey, ReactionState},
        poll::{Poll, PollId, PollLog, PollLogKey, Wallet},
        quest::{PlayerId, Quest, QuestId, QuestLog, QuestLogKey},
        query::QuerySource,
    },
};

/// Exposes every remote query of a [`ServerActions`] backend as a query source.
#[derive(Clone)]
pub struct BackendQueries {
    backend: Arc<dyn ServerActions>,
}

impl BackendQueries {
    /// Query sources reading from `backend`.
    pub fn new(backend: Arc<dyn ServerActions>) -> Arc<Self> {
        Arc::new(Self { backend })
    }
}

impl QuerySource<QuestId, Quest> for BackendQueries {
    fn fetch(&self, key: &QuestId) -> BoxFuture<'static, RemoteResult<Option<Quest>>> {
        self.backend.fetch_quest(key)
    }
}

impl QuerySource<QuestLogKey, QuestLog> for BackendQueries {
    fn fetch(&self, key: &QuestLogKey) -> BoxFuture<'static, RemoteResult<Option<QuestLog>>> {
        self.backend.fetch_quest_log(key)
    }
}

impl QuerySource<PollId, Poll> for BackendQueries {
    fn fetch(&self, key: &PollId) -> BoxFuture<'static, RemoteResult<Option<Poll>>> {
        self.backend.fetch_poll(key)
    }
}

impl QuerySource<PollLogKey, PollLog> for BackendQueries {
    fn fetch(&self, key: &PollLogKey) -> BoxFuture<'static, RemoteResult<Option<PollLog>>> {
        self.backend.fetch_poll_log(key)
    }
}

impl QuerySource<PlayerId, Wallet> for BackendQueries {
    fn fetch(&self, key: &PlayerId) -> BoxFuture<'static, RemoteResult<Option<Wallet>>> {
        self.backend.fetch_wallet(key)
    }
}

impl QuerySource<ReactionKey, ReactionState> for BackendQueries {
    fn fetch(&self, key: &ReactionKey) -> BoxFuture<'static, RemoteResult<Option<ReactionState>>> {
        self.backend.fetch_reaction(key)
    }
}
