use thiserror::Error;

use crate::canteen_actor::CanteenError;
use crate::menu_actor::MenuError;
use crate::order_service::OrderError;
use crate::profile_actor::ProfileError;

/// Errors surfaced by system-level operations that span several actors.
#[derive(Debug, Error)]
pub enum SystemError {
    #[error(transparent)]
    Profile(#[from] ProfileError),
    #[error(transparent)]
    Canteen(#[from] CanteenError),
    #[error(transparent)]
    Menu(#[from] MenuError),
    #[error(transparent)]
    Order(#[from] OrderError),
    #[error("Actor task failed: {0}")]
    TaskFailed(String),
}
