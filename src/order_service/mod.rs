//! Order lifecycle: creation with pickup codes, status transitions, and
//! change publication.

pub mod error;
pub mod handle;
pub mod pickup_code;
pub mod service;
pub mod state_machine;

pub use error::*;
pub use handle::*;
pub use pickup_code::*;
pub use service::*;
