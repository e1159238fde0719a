use thiserror::Error;

use crate::actor_framework::FrameworkError;
use crate::profile_actor::ProfileError;

/// Errors that can occur during canteen operations.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum CanteenError {
    #[error("Canteen not found: {0}")]
    NotFound(String),
    #[error("Canteen validation error: {0}")]
    ValidationError(String),
    #[error("Not allowed: {0}")]
    Unauthorized(String),
    #[error("Canteen service unavailable: {0}")]
    Unavailable(String),
}

impl From<FrameworkError> for CanteenError {
    fn from(err: FrameworkError) -> Self {
        match err {
            FrameworkError::NotFound(id) => CanteenError::NotFound(id),
            FrameworkError::Rejected(msg) => CanteenError::ValidationError(msg),
            other => CanteenError::Unavailable(other.to_string()),
        }
    }
}

impl From<ProfileError> for CanteenError {
    fn from(err: ProfileError) -> Self {
        match err {
            ProfileError::NotFound(id) => CanteenError::Unauthorized(format!("Unknown account {}", id)),
            ProfileError::Unavailable(msg) => CanteenError::Unavailable(msg),
            other => CanteenError::ValidationError(other.to_string()),
        }
    }
}
