//! Library crate for fanbase-sync, exposing modules for binaries and tests.

pub mod config;
/// Remote backend access.
pub mod dao;
/// Request and response shapes of the HTTP API.
pub mod dto;
/// Error types shared by services and routes.
pub mod error;
/// axum route trees.
pub mod routes;
/// Use cases behind the routes.
pub mod services;
/// Shared in-memory state and the optimistic action machinery.
pub mod state;
#[cfg(test)]
mod test_support;
