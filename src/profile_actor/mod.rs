//! Profile rows: one per registered account, carrying its role.

pub mod entity;
pub mod error;

pub use error::*;
