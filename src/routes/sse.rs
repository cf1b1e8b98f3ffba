//! Server-sent feedback stream.

use std::convert::Infallible;

use axum::{
    Router,
    extract::{Path, State},
    response::sse::{Event, Sse},
    routing::get,
};
use axum_valid::Valid;
use futures::Stream;
use tracing::info;

use crate::{
    dto::action::PlayerPath,
    services::sse_service,
    state::{SharedState, quest::normalize_player_id},
};

#[utoipa::path(
    get,
    path = "/players/{player}/sse/feedback",
    tag = "sse",
    params(("player" = String, Path, description = "Wallet address of the player")),
    responses((status = 200, description = "Toasts and modals for the player's settled requests", content_type = "text/event-stream", body = String))
)]
/// Stream the `toast` and `modal` events addressed to one player, plus service announcements.
pub async fn feedback_stream(
    State(state): State<SharedState>,
    Valid(Path(path)): Valid<Path<PlayerPath>>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let player_id = normalize_player_id(path.player);
    let receiver = sse_service::subscribe_feedback(&state);
    info!(
        %player_id,
        subscribers = state.feedback_sse().subscriber_count(),
        "New feedback SSE connection"
    );
    sse_service::to_sse_stream(sse_service::player_feed(receiver, player_id))
}

/// Configure the SSE endpoints.
pub fn router() -> Router<SharedState> {
    Router::<SharedState>::new().route("/players/{player}/sse/feedback", get(feedback_stream))
}
