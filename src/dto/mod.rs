use time::{OffsetDateTime, format_description::well_known::Rfc3339};

/// Dispatch outcomes and path parameters shared by action routes.
pub mod action;
pub mod feedback;
/// Health check responses.
pub mod health;
/// Poll views and bet requests.
pub mod poll;
/// Quest views.
pub mod quest;
/// Reaction views.
pub mod reaction;
pub mod validation;

fn format_timestamp(time: OffsetDateTime) -> String {
    time.format(&Rfc3339)
        .unwrap_or_else(|_| "invalid-timestamp".into())
}
