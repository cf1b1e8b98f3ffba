//! reqwest client for the remote server actions.

use std::sync::Arc;

use futures::future::BoxFuture;
use reqwest::{Client, Method, StatusCode};
use serde::{Serialize, de::DeserializeOwned};

use crate::{
    dao::{
        models::{
            BetReceipt, ClaimQuestCommand, ClaimReceipt, CompleteQuestCommand, CompletionReceipt,
            PlaceBetCommand, ToggleReactionCommand,
        },
        remote::{ActionReply, RemoteError, RemoteFailure, RemoteResult, ServerActions},
    },
    state::{
        board::{ReactionKey, ReactionState},
        poll::{Poll, PollLog, PollLogKey, Wallet},
        quest::{Quest, QuestLog, QuestLogKey},
    },
};

/// JSON-over-HTTP implementation of [`ServerActions`].
#[derive(Clone)]
pub struct HttpServerActions {
    client: Client,
    base_url: Arc<str>,
}

impl HttpServerActions {
    /// Build a client targeting `base_url`.
    pub fn new(base_url: &str) -> RemoteResult<Self> {
        let client = Client::builder()
            .build()
            .map_err(|source| RemoteError::send(base_url, source))?;

        Ok(Self {
            client,
            base_url: Arc::from(base_url.trim_end_matches('/')),
        })
    }

    fn request(&self, method: Method, path: &str) -> reqwest::RequestBuilder {
        let url = format!("{}/{}", self.base_url, path);
        self.client.request(method, url)
    }

    /// Invoke `actions/{name}` and unwrap its `{ success, error?, ...details }` envelope.
    async fn post_action<B, T>(&self, name: &str, body: &B) -> Result<T, RemoteFailure>
    where
        B: ?Sized + Serialize,
        T: DeserializeOwned,
    {
        let path = format!("actions/{name}");
        let response = self
            .request(Method::POST, &path)
            .json(body)
            .send()
            .await
            .map_err(|source| RemoteError::send(path.clone(), source))?;

        let status = response.status();
        let bytes = response
            .bytes()
            .await
            .map_err(|source| RemoteError::send(path.clone(), source))?;

        // Rejections may come with an error status and still carry the envelope.
        match serde_json::from_slice::<ActionReply>(&bytes) {
            Ok(reply) => reply.into_result(&path),
            Err(_) if !status.is_success() => Err(RemoteError::Status {
                path,
                status: status.as_u16(),
            }
            .into()),
            Err(source) => Err(RemoteError::Decode { path, source }.into()),
        }
    }

    async fn get_entity<T>(&self, path: String) -> RemoteResult<Option<T>>
    where
        T: DeserializeOwned,
    {
        let response = self
            .request(Method::GET, &path)
            .send()
            .await
            .map_err(|source| RemoteError::send(path.clone(), source))?;

        match response.status() {
            StatusCode::NOT_FOUND => Ok(None),
            status if status.is_success() => {
                let bytes = response
                    .bytes()
                    .await
                    .map_err(|source| RemoteError::send(path.clone(), source))?;
                serde_json::from_slice::<T>(&bytes)
                    .map(Some)
                    .map_err(|source| RemoteError::Decode { path, source })
            }
            other => Err(RemoteError::Status {
                path,
                status: other.as_u16(),
            }),
        }
    }
}

impl ServerActions for HttpServerActions {
    fn complete_quest(
        &self,
        command: CompleteQuestCommand,
    ) -> BoxFuture<'static, Result<QuestLog, RemoteFailure>> {
        let client = self.clone();
        Box::pin(async move {
            client
                .post_action::<_, CompletionReceipt>("complete-quest", &command)
                .await
                .map(|receipt| receipt.log)
        })
    }

    fn claim_quest_reward(
        &self,
        command: ClaimQuestCommand,
    ) -> BoxFuture<'static, Result<ClaimReceipt, RemoteFailure>> {
        let client = self.clone();
        Box::pin(async move { client.post_action("claim-quest-reward", &command).await })
    }

    fn place_bet(
        &self,
        command: PlaceBetCommand,
    ) -> BoxFuture<'static, Result<BetReceipt, RemoteFailure>> {
        let client = self.clone();
        Box::pin(async move { client.post_action("place-bet", &command).await })
    }

    fn toggle_reaction(
        &self,
        command: ToggleReactionCommand,
    ) -> BoxFuture<'static, Result<ReactionState, RemoteFailure>> {
        let client = self.clone();
        Box::pin(async move { client.post_action("toggle-reaction", &command).await })
    }

    fn fetch_quest(&self, quest_id: &str) -> BoxFuture<'static, RemoteResult<Option<Quest>>> {
        let client = self.clone();
        let path = format!("quests/{quest_id}");
        Box::pin(async move { client.get_entity(path).await })
    }

    fn fetch_quest_log(
        &self,
        key: &QuestLogKey,
    ) -> BoxFuture<'static, RemoteResult<Option<QuestLog>>> {
        let client = self.clone();
        let path = format!("players/{}/quest-logs/{}", key.player_id, key.quest_id);
        Box::pin(async move { client.get_entity(path).await })
    }

    fn fetch_poll(&self, poll_id: &str) -> BoxFuture<'static, RemoteResult<Option<Poll>>> {
        let client = self.clone();
        let path = format!("polls/{poll_id}");
        Box::pin(async move { client.get_entity(path).await })
    }

    fn fetch_poll_log(
        &self,
        key: &PollLogKey,
    ) -> BoxFuture<'static, RemoteResult<Option<PollLog>>> {
        let client = self.clone();
        let path = format!("players/{}/poll-logs/{}", key.player_id, key.poll_id);
        Box::pin(async move { client.get_entity(path).await })
    }

    fn fetch_wallet(&self, player_id: &str) -> BoxFuture<'static, RemoteResult<Option<Wallet>>> {
        let client = self.clone();
        let path = format!("players/{player_id}/wallet");
        Box::pin(async move { client.get_entity(path).await })
    }

    fn fetch_reaction(
        &self,
        key: &ReactionKey,
    ) -> BoxFuture<'static, RemoteResult<Option<ReactionState>>> {
        let client = self.clone();
        let path = format!("players/{}/reactions/{}", key.player_id, key.post_id);
        Box::pin(async move { client.get_entity(path).await })
    }

    fn health_check(&self) -> BoxFuture<'static, RemoteResult<()>> {
        let client = self.clone();
        Box::pin(async move {
            let path = "health".to_string();
            let response = client
                .request(Method::GET, &path)
                .send()
                .await
                .map_err(|source| RemoteError::send(path.clone(), source))?;

            if response.status().is_success() {
                Ok(())
            } else {
                Err(RemoteError::Status {
                    path,
                    status: response.status().as_u16(),
                })
            }
        })
    }
}
