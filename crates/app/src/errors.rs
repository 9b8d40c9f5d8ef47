//! Error surface of the order service boundary.

use thiserror::Error;

use storefront_auth::AuthzError;
use storefront_infra::command_dispatcher::DispatchError;

/// Structured failure reported to the service's caller.
///
/// All variants are recoverable: the caller maps them to its own protocol
/// (HTTP status, CLI exit code, ...). Nothing here is fatal to the process,
/// and conflicted commands are never retried automatically.
#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("unauthenticated")]
    Unauthenticated,

    #[error("forbidden")]
    Forbidden,

    #[error("not found")]
    NotFound,

    #[error("validation failed: {0}")]
    Validation(String),

    #[error("invalid state: {0}")]
    InvalidState(String),

    #[error("invalid transition: {0}")]
    InvalidTransition(String),

    #[error("conflict: {0}")]
    Conflict(String),

    #[error("internal error: {0}")]
    Internal(String),
}

impl From<DispatchError> for ServiceError {
    fn from(value: DispatchError) -> Self {
        match value {
            DispatchError::Conflict(msg) => ServiceError::Conflict(msg),
            DispatchError::Validation(msg) => ServiceError::Validation(msg),
            DispatchError::InvalidState(msg) => ServiceError::InvalidState(msg),
            DispatchError::InvalidTransition(msg) => ServiceError::InvalidTransition(msg),
            DispatchError::Forbidden => ServiceError::Forbidden,
            DispatchError::Unauthenticated => ServiceError::Unauthenticated,
            DispatchError::NotFound => ServiceError::NotFound,
            DispatchError::Deserialize(msg) => ServiceError::Internal(msg),
            DispatchError::Store(err) => ServiceError::Internal(err.to_string()),
            DispatchError::Publish(msg) => ServiceError::Internal(msg),
        }
    }
}

impl From<AuthzError> for ServiceError {
    fn from(_: AuthzError) -> Self {
        ServiceError::Forbidden
    }
}
