use std::time::Duration;

use thiserror::Error;

use crate::canteen_actor::CanteenError;
use crate::domain::OrderStatus;
use crate::menu_actor::MenuError;
use crate::profile_actor::ProfileError;

/// Errors that can occur during order operations.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum OrderError {
    #[error("Order not found: {0}")]
    NotFound(String),
    #[error("Order validation error: {0}")]
    ValidationError(String),
    #[error("Not allowed: {0}")]
    Unauthorized(String),
    #[error("Cannot move order from {from} to {to}")]
    InvalidTransition { from: OrderStatus, to: OrderStatus },
    #[error("Order {0} already has an update in flight")]
    Busy(String),
    #[error("Order service unavailable: {0}")]
    Unavailable(String),
    #[error("Request timed out after {0:?}")]
    Timeout(Duration),
}

impl OrderError {
    /// Transient failures; the user may try again.
    pub fn is_retryable(&self) -> bool {
        matches!(self, OrderError::Unavailable(_) | OrderError::Timeout(_) | OrderError::Busy(_))
    }
}

impl From<ProfileError> for OrderError {
    fn from(err: ProfileError) -> Self {
        match err {
            ProfileError::NotFound(id) => OrderError::Unauthorized(format!("Unknown account {}", id)),
            ProfileError::Unauthorized(msg) => OrderError::Unauthorized(msg),
            ProfileError::ValidationError(msg) => OrderError::ValidationError(msg),
            ProfileError::Unavailable(msg) => OrderError::Unavailable(msg),
        }
    }
}

impl From<CanteenError> for OrderError {
    fn from(err: CanteenError) -> Self {
        match err {
            CanteenError::NotFound(id) => OrderError::NotFound(format!("canteen {}", id)),
            CanteenError::Unauthorized(msg) => OrderError::Unauthorized(msg),
            CanteenError::ValidationError(msg) => OrderError::ValidationError(msg),
            CanteenError::Unavailable(msg) => OrderError::Unavailable(msg),
        }
    }
}

impl From<MenuError> for OrderError {
    fn from(err: MenuError) -> Self {
        match err {
            MenuError::NotFound(id) => OrderError::ValidationError(format!("Menu item not found: {}", id)),
            MenuError::Unauthorized(msg) => OrderError::Unauthorized(msg),
            MenuError::ValidationError(msg) => OrderError::ValidationError(msg),
            MenuError::Unavailable(msg) => OrderError::Unavailable(msg),
        }
    }
}
