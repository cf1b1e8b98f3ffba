use axum::{
    Json, Router,
    extract::{Path, State},
    routing::{get, post},
};
use axum_valid::Valid;

use crate::{
    dto::{
        action::PlayerEntityPath,
        quest::{QuestActionResponse, QuestView},
    },
    error::AppError,
    services::quest_service,
    state::SharedState,
};

/// Routes driving quest completion and reward claiming.
pub fn router() -> Router<SharedState> {
    Router::new()
        .route("/players/{player}/quests/{quest}", get(get_quest))
        .route("/players/{player}/quests/{quest}/complete", post(complete_quest))
        .route("/players/{player}/quests/{quest}/claim", post(claim_quest))
}

/// Quest status for a player, including unconfirmed predictions.
#[utoipa::path(
    get,
    path = "/players/{player}/quests/{quest}",
    tag = "quests",
    params(
        ("player" = String, Path, description = "Wallet address of the player"),
        ("quest" = String, Path, description = "Identifier of the quest"),
    ),
    responses(
        (status = 200, description = "Quest view", body = QuestView),
        (status = 404, description = "Unknown quest")
    )
)]
pub async fn get_quest(
    State(state): State<SharedState>,
    Valid(Path(path)): Valid<Path<PlayerEntityPath>>,
) -> Result<Json<QuestView>, AppError> {
    let view = quest_service::quest_view(&state, &path.player, &path.entity).await?;
    Ok(Json(view))
}

/// Record one completion of a quest. The confirmation arrives on `/players/{player}/sse/feedback`.
#[utoipa::path(
    post,
    path = "/players/{player}/quests/{quest}/complete",
    tag = "quests",
    params(
        ("player" = String, Path, description = "Wallet address of the player"),
        ("quest" = String, Path, description = "Identifier of the quest"),
    ),
    responses(
        (status = 200, description = "Request dispatched", body = QuestActionResponse),
        (status = 404, description = "Unknown quest")
    )
)]
pub async fn complete_quest(
    State(state): State<SharedState>,
    Valid(Path(path)): Valid<Path<PlayerEntityPath>>,
) -> Result<Json<QuestActionResponse>, AppError> {
    let response = quest_service::complete_quest(&state, &path.player, &path.entity).await?;
    Ok(Json(response))
}

/// Claim the reward of a completed quest.
#[utoipa::path(
    post,
    path = "/players/{player}/quests/{quest}/claim",
    tag = "quests",
    params(
        ("player" = String, Path, description = "Wallet address of the player"),
        ("quest" = String, Path, description = "Identifier of the quest"),
    ),
    responses(
        (status = 200, description = "Request dispatched", body = QuestActionResponse),
        (status = 404, description = "Unknown quest")
    )
)]
pub async fn claim_quest(
    State(state): State<SharedState>,
    Valid(Path(path)): Valid<Path<PlayerEntityPath>>,
) -> Result<Json<QuestActionResponse>, AppError> {
    let response = quest_service::claim_quest(&state, &path.player, &path.entity).await?;
    Ok(Json(response))
}
