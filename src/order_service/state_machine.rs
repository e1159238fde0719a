//! Order status transitions.
//!
//! | From      | To        | Who                          |
//! |-----------|-----------|------------------------------|
//! | (create)  | pending   | the student placing the order|
//! | pending   | ready     | vendor owning the canteen    |
//! | ready     | completed | vendor owning the canteen    |
//!
//! Who may ask is decided in [`crate::authz`]; this module only decides
//! whether the move itself is legal.

use super::error::OrderError;
use crate::domain::OrderStatus;

/// Outcome of a legal transition request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    /// The order moves one step forward.
    Advance { from: OrderStatus, to: OrderStatus },
    /// Already in the requested status; nothing to do.
    Unchanged(OrderStatus),
}

/// Checks a request to move an order from `from` to `to`.
///
/// Same-status requests succeed as [`Transition::Unchanged`] so that retries
/// and double submits are harmless. Skips and backward moves are rejected.
pub fn plan(from: OrderStatus, to: OrderStatus) -> Result<Transition, OrderError> {
    if from == to {
        return Ok(Transition::Unchanged(from));
    }
    if from.next() == Some(to) {
        Ok(Transition::Advance { from, to })
    } else {
        Err(OrderError::InvalidTransition { from, to })
    }
}
