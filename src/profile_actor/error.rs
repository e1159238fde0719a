use thiserror::Error;

use crate::actor_framework::FrameworkError;

/// Errors that can occur during profile operations.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum ProfileError {
    #[error("Profile not found: {0}")]
    NotFound(String),
    #[error("Profile validation error: {0}")]
    ValidationError(String),
    #[error("Not allowed: {0}")]
    Unauthorized(String),
    #[error("Profile service unavailable: {0}")]
    Unavailable(String),
}

impl From<FrameworkError> for ProfileError {
    fn from(err: FrameworkError) -> Self {
        match err {
            FrameworkError::NotFound(id) => ProfileError::NotFound(id),
            FrameworkError::Rejected(msg) => ProfileError::ValidationError(msg),
            other => ProfileError::Unavailable(other.to_string()),
        }
    }
}
