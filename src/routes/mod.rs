use axum::Router;

use crate::state::SharedState;

/// Swagger UI and OpenAPI document.
pub mod docs;
/// Health check endpoint.
pub mod health;
/// Poll and bet endpoints.
pub mod poll;
/// Quest completion and claim endpoints.
pub mod quest;
/// Board reaction endpoints.
pub mod reaction;
pub mod sse;

/// Compose all route trees, wiring in shared state and documentation routes.
pub fn router(state: SharedState) -> Router<()> {
    let api_router = health::router()
        .merge(sse::router())
        .merge(quest::router())
        .merge(poll::router())
        .merge(reaction::router());

    api_router.merge(docs::router()).with_state(state)
}
