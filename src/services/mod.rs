/// Remote backend health supervision.
pub mod backend_supervisor;
/// OpenAPI documentation generation.
pub mod documentation;
/// Health check service.
pub mod health_service;
pub mod poll_service;
pub mod quest_service;
pub mod reaction_service;
/// Notification sink publishing on the feedback stream.
pub mod sse_events;
/// Server-Sent Events streaming service.
pub mod sse_service;
