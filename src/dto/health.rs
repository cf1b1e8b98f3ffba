use serde::Serialize;
use utoipa::ToSchema;

/// Payload returned by the `/healthcheck` route.
#[derive(Debug, Serialize, ToSchema)]
pub struct HealthResponse {
    /// Health status ("ok" or "degraded").
    pub status: &'static str,
    /// Clients currently listening on `/players/{player}/sse/feedback`.
    pub feedback_subscribers: usize,
}

impl HealthResponse {
    /// The remote backend answers health checks.
    pub fn ok(feedback_subscribers: usize) -> Self {
        Self {
            status: "ok",
            feedback_subscribers,
        }
    }

    /// The remote backend is unreachable; actions will roll back.
    pub fn degraded(feedback_subscribers: usize) -> Self {
        Self {
            status: "degraded",
            feedback_subscribers,
        }
    }

    /// Whether this response reports degraded mode.
    pub fn is_degraded(&self) -> bool {
        self.status == "degraded"
    }
}
