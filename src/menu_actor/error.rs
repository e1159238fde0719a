use thiserror::Error;

use crate::actor_framework::FrameworkError;
use crate::canteen_actor::CanteenError;

/// Errors that can occur during menu operations.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum MenuError {
    #[error("Menu item not found: {0}")]
    NotFound(String),
    #[error("Menu validation error: {0}")]
    ValidationError(String),
    #[error("Not allowed: {0}")]
    Unauthorized(String),
    #[error("Menu service unavailable: {0}")]
    Unavailable(String),
}

impl From<FrameworkError> for MenuError {
    fn from(err: FrameworkError) -> Self {
        match err {
            FrameworkError::NotFound(id) => MenuError::NotFound(id),
            FrameworkError::Rejected(msg) => MenuError::ValidationError(msg),
            other => MenuError::Unavailable(other.to_string()),
        }
    }
}

impl From<CanteenError> for MenuError {
    fn from(err: CanteenError) -> Self {
        match err {
            CanteenError::NotFound(id) => MenuError::NotFound(format!("canteen {}", id)),
            CanteenError::ValidationError(msg) => MenuError::ValidationError(msg),
            CanteenError::Unauthorized(msg) => MenuError::Unauthorized(msg),
            CanteenError::Unavailable(msg) => MenuError::Unavailable(msg),
        }
    }
}
