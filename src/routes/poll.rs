use axum::{
    Json, Router,
    extract::{Path, State},
    routing::{get, post},
};
use axum_valid::Valid;

use crate::{
    dto::{
        action::PlayerEntityPath,
        poll::{BetResponse, PlaceBetRequest, PollView},
    },
    error::AppError,
    services::poll_service,
    state::SharedState,
};

/// Routes for poll views and bets.
pub fn router() -> Router<SharedState> {
    Router::new()
        .route("/players/{player}/polls/{poll}", get(get_poll))
        .route("/players/{player}/polls/{poll}/bets", post(place_bet))
}

/// Poll status for a player with their bet and balance.
#[utoipa::path(
    get,
    path = "/players/{player}/polls/{poll}",
    tag = "polls",
    params(
        ("player" = String, Path, description = "Wallet address of the player"),
        ("poll" = String, Path, description = "Identifier of the poll"),
    ),
    responses(
        (status = 200, description = "Poll view", body = PollView),
        (status = 404, description = "Unknown poll")
    )
)]
pub async fn get_poll(
    State(state): State<SharedState>,
    Valid(Path(path)): Valid<Path<PlayerEntityPath>>,
) -> Result<Json<PollView>, AppError> {
    let view = poll_service::poll_view(&state, &path.player, &path.entity).await?;
    Ok(Json(view))
}

/// Bet on a poll option. The confirmation arrives on `/players/{player}/sse/feedback`.
#[utoipa::path(
    post,
    path = "/players/{player}/polls/{poll}/bets",
    tag = "polls",
    params(
        ("player" = String, Path, description = "Wallet address of the player"),
        ("poll" = String, Path, description = "Identifier of the poll"),
    ),
    request_body = PlaceBetRequest,
    responses(
        (status = 200, description = "Request dispatched", body = BetResponse),
        (status = 400, description = "Malformed bet"),
        (status = 404, description = "Unknown poll")
    )
)]
pub async fn place_bet(
    State(state): State<SharedState>,
    Valid(Path(path)): Valid<Path<PlayerEntityPath>>,
    Valid(Json(request)): Valid<Json<PlaceBetRequest>>,
) -> Result<Json<BetResponse>, AppError> {
    let response = poll_service::place_bet(&state, &path.player, &path.entity, request).await?;
    Ok(Json(response))
}
