use std::{convert::Infallible, time::Duration};

use axum::response::sse::{Event, KeepAlive, Sse};
use futures::Stream;
use tokio::sync::{
    broadcast::{self, error::RecvError},
    mpsc,
};
use tokio_stream::{StreamExt, wrappers::ReceiverStream};
use tracing::{debug, info};

use crate::{
    dto::feedback::ServerEvent,
    state::{SharedState, SseHub, quest::PlayerId},
};

/// Subscribe to the feedback SSE stream.
pub fn subscribe_feedback(state: &SharedState) -> broadcast::Receiver<ServerEvent> {
    state.feedback_sse().subscribe()
}

/// Send a human-readable info message to every connected player.
pub fn broadcast_info(hub: &SseHub, message: &str) {
    hub.broadcast(ServerEvent::new(
        Some("info".to_string()),
        message.to_string(),
    ));
}

/// Forward the events `player_id` may see from the shared broadcast into a
/// dedicated channel, until the returned receiver is dropped.
pub fn player_feed(
    mut receiver: broadcast::Receiver<ServerEvent>,
    player_id: PlayerId,
) -> mpsc::Receiver<ServerEvent> {
    // small bounded channel between forwarder and response
    let (tx, rx) = mpsc::channel::<ServerEvent>(8);

    tokio::spawn(async move {
        loop {
            tokio::select! {
                _ = tx.closed() => break,
                recv_result = receiver.recv() => {
                    match recv_result {
                        Ok(payload) => {
                            if !payload.is_visible_to(&player_id) {
                                continue;
                            }
                            if tx.send(payload).await.is_err() {
                                break;
                            }
                        }
                        Err(RecvError::Closed) => break,
                        Err(RecvError::Lagged(skipped)) => {
                            debug!(%player_id, skipped, "feedback subscriber lagging; dropping events");
                            continue;
                        }
                    }
                }
            }
        }

        info!(%player_id, "Feedback SSE stream disconnected");
    });

    rx
}

/// Convert a player's feed into an SSE response with keep-alive comments.
pub fn to_sse_stream(
    feed: mpsc::Receiver<ServerEvent>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let stream = ReceiverStream::new(feed).map(|payload| {
        let mut event = Event::default().data(payload.data);
        if let Some(name) = payload.event {
            event = event.event(name);
        }
        Ok(event)
    });

    Sse::new(stream).keep_alive(
        KeepAlive::new()
            .interval(Duration::from_secs(15))
            .text("keep-alive"),
    )
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use tokio::time::timeout;

    use super::*;
    use crate::{
        config::AppConfig,
        dto::action::DispatchOutcome,
        services::quest_service,
        state::{
            AppState,
            quest::{Quest, QuestLog, QuestLogKey, RepeatPolicy, Reward, normalize_player_id},
        },
        test_support::StubServerActions,
    };

    const ALICE: &str = "0x52908400098527886E0F7030069857D2E4169EE7";
    const BOB: &str = "0x00000000000000000000000000000000000000bb";

    #[tokio::test(start_paused = true)]
    async fn settled_request_reaches_only_its_player() {
        let backend = StubServerActions::new();
        let quest = Quest {
            id: "follow".into(),
            title: "Follow".into(),
            repeat: RepeatPolicy::Once,
            reward: Reward::Points { amount: 5 },
        };
        backend.quests.insert(quest.id.clone(), quest.clone());
        backend.script_completion(Ok(QuestLog {
            completed: true,
            repeat_count: 1,
            ..QuestLog::placeholder(&QuestLogKey::new(ALICE, "follow"))
        }));
        let state = AppState::new(AppConfig::default(), backend);

        let mut alice = player_feed(subscribe_feedback(&state), normalize_player_id(ALICE));
        let mut bob = player_feed(subscribe_feedback(&state), normalize_player_id(BOB));

        let response = quest_service::complete_quest(&state, ALICE, "follow")
            .await
            .unwrap();
        assert_eq!(response.dispatch.outcome, DispatchOutcome::Accepted);
        let request_id = response.dispatch.request_id.unwrap();

        let event = timeout(Duration::from_secs(1), alice.recv())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(event.event.as_deref(), Some("toast"));
        assert!(event.data.contains(&request_id.to_string()));
        assert!(event.data.contains(&normalize_player_id(ALICE)));

        assert!(timeout(Duration::from_secs(1), bob.recv()).await.is_err());
    }

    #[tokio::test(start_paused = true)]
    async fn announcements_reach_every_player() {
        let hub = Arc::new(SseHub::new(8));
        let mut bob = player_feed(hub.subscribe(), normalize_player_id(BOB));

        broadcast_info(&hub, "service restored");

        let event = timeout(Duration::from_secs(1), bob.recv())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(event.data, "service restored");
    }
}
