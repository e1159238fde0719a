//! Menu items, including the availability toggle vendors flip during service.

mod actions;
pub mod entity;
pub mod error;

pub use actions::*;
pub use error::*;
