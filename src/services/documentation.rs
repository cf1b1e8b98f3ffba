use utoipa::OpenApi;

#[derive(OpenApi)]
/// Aggregated OpenAPI specification for Fanbase Sync.
#[openapi(
    paths(
        crate::routes::health::healthcheck,
        crate::routes::sse::feedback_stream,
        crate::routes::quest::get_quest,
        crate::routes::quest::complete_quest,
        crate::routes::quest::claim_quest,
        crate::routes::poll::get_poll,
        crate::routes::poll::place_bet,
        crate::routes::reaction::get_reaction,
        crate::routes::reaction::toggle_reaction,
    ),
    components(
        schemas(
            crate::dto::health::HealthResponse,
            crate::dto::action::DispatchSummary,
            crate::dto::action::DispatchOutcome,
            crate::dto::quest::QuestView,
            crate::dto::quest::QuestActionResponse,
            crate::dto::poll::PlaceBetRequest,
            crate::dto::poll::PollView,
            crate::dto::poll::BetResponse,
            crate::dto::reaction::ReactionView,
            crate::dto::reaction::ReactionResponse,
            crate::dto::feedback::Toast,
            crate::dto::feedback::Modal,
        )
    ),
    tags(
        (name = "health", description = "Health check endpoints"),
        (name = "sse", description = "Server-sent events streams"),
        (name = "quests", description = "Quest completion and reward claiming"),
        (name = "polls", description = "Bets on polls"),
        (name = "board", description = "Community board reactions"),
    )
)]
pub struct ApiDoc;
