use axum::{
    Json, Router,
    extract::{Path, State},
    routing::get,
};
use axum_valid::Valid;

use crate::{
    dto::{
        action::PlayerEntityPath,
        reaction::{ReactionResponse, ReactionView},
    },
    error::AppError,
    services::reaction_service,
    state::SharedState,
};

/// Routes for community board reactions.
pub fn router() -> Router<SharedState> {
    Router::new().route(
        "/players/{player}/posts/{post}/reaction",
        get(get_reaction).post(toggle_reaction),
    )
}

#[utoipa::path(
    get,
    path = "/players/{player}/posts/{post}/reaction",
    tag = "board",
    params(
        ("player" = String, Path, description = "Wallet address of the player"),
        ("post" = String, Path, description = "Identifier of the post"),
    ),
    responses((status = 200, description = "Reaction view", body = ReactionView))
)]
/// The player's reaction on a post.
pub async fn get_reaction(
    State(state): State<SharedState>,
    Valid(Path(path)): Valid<Path<PlayerEntityPath>>,
) -> Result<Json<ReactionView>, AppError> {
    let view = reaction_service::reaction_view(&state, &path.player, &path.entity).await?;
    Ok(Json(view))
}

#[utoipa::path(
    post,
    path = "/players/{player}/posts/{post}/reaction",
    tag = "board",
    params(
        ("player" = String, Path, description = "Wallet address of the player"),
        ("post" = String, Path, description = "Identifier of the post"),
    ),
    responses((status = 200, description = "Request dispatched", body = ReactionResponse))
)]
/// Add or remove the player's reaction on a post.
pub async fn toggle_reaction(
    State(state): State<SharedState>,
    Valid(Path(path)): Valid<Path<PlayerEntityPath>>,
) -> Result<Json<ReactionResponse>, AppError> {
    let response = reaction_service::toggle_reaction(&state, &path.player, &path.entity).await?;
    Ok(Json(response))
}
