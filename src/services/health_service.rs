use tracing::warn;

use crate::{dto::health::HealthResponse, state::SharedState};

/// Report the degraded flag, pinging the backend so failures show up in the logs.
pub async fn health_status(state: &SharedState) -> HealthResponse {
    if let Err(err) = state.backend().health_check().await {
        warn!(error = %err, "remote backend health check failed");
    }

    let subscribers = state.feedback_sse().subscriber_count();
    if state.is_degraded() {
        HealthResponse::degraded(subscribers)
    } else {
        HealthResponse::ok(subscribers)
    }
}
