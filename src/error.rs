use axum::{Json, http::StatusCode, response::IntoResponse};
use serde::Serialize;
use thiserror::Error;
use validator::ValidationErrors;

use crate::{
    dao::remote::RemoteError,
    dto::feedback::{Toast, ToastLevel},
};

/// Precondition failures detected locally, before any optimistic state is installed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationFailure {
    /// The player did not pick an option.
    #[error("please select an option first")]
    NoSelection,
    /// The selected option does not exist.
    #[error("unknown option `{0}`")]
    UnknownOption(String),
    /// The wallet cannot cover the requested amount.
    #[error("insufficient balance: {available} available, {required} required")]
    InsufficientBalance {
        /// Current balance.
        available: u64,
        /// Amount the action needs.
        required: u64,
    },
    /// Amount outside the accepted range.
    #[error("{0}")]
    InvalidAmount(String),
    /// The action is not available at this time.
    #[error("{0}")]
    OutsideWindow(String),
    /// Claiming requires more completions.
    #[error("you need to complete this quest {required} times before claiming ({completed}/{required})")]
    RepeatTargetNotReached {
        /// Completions required by the quest.
        required: u32,
        /// Completions recorded so far.
        completed: u32,
    },
    /// The entity's current state does not allow the action.
    #[error("{0}")]
    NotAllowed(String),
}

impl ValidationFailure {
    /// Toast presented for this failure.
    pub fn toast(&self) -> Toast {
        let level = match self {
            ValidationFailure::NoSelection => ToastLevel::Info,
            _ => ToastLevel::Error,
        };
        Toast {
            level,
            message: self.to_string(),
        }
    }
}

/// Errors that can occur in service layer operations.
#[derive(Debug, Error)]
pub enum ServiceError {
    /// Remote backend is unavailable.
    #[error("remote backend unavailable")]
    Unavailable(#[source] RemoteError),
    /// Requested resource was not found.
    #[error("not found: {0}")]
    NotFound(String),
}

impl From<RemoteError> for ServiceError {
    fn from(err: RemoteError) -> Self {
        ServiceError::Unavailable(err)
    }
}

impl From<ValidationErrors> for AppError {
    fn from(err: ValidationErrors) -> Self {
        AppError::BadRequest(format!("validation failed: {}", err))
    }
}

/// Application-level errors that are converted to HTTP responses.
#[derive(Debug, Error)]
pub enum AppError {
    /// Bad request with invalid input.
    #[error("bad request: {0}")]
    BadRequest(String),
    /// Requested resource not found.
    #[error("not found: {0}")]
    NotFound(String),
    /// Service unavailable or degraded.
    #[error("service unavailable: {0}")]
    ServiceUnavailable(String),
}

impl From<ServiceError> for AppError {
    fn from(err: ServiceError) -> Self {
        match err {
            ServiceError::Unavailable(source) => AppError::ServiceUnavailable(source.to_string()),
            ServiceError::NotFound(message) => AppError::NotFound(message),
        }
    }
}

#[derive(Serialize)]
struct ErrorBody {
    message: String,
}

impl IntoResponse for AppError {
    fn into_response(self) -> axum::response::Response {
        let status = match &self {
            AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::ServiceUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
        };

        let payload = Json(ErrorBody {
            message: self.to_string(),
        });

        (status, payload).into_response()
    }
}
