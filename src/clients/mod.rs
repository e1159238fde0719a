//! Client handles. Cheap to clone; each wraps an actor mailbox and does the
//! capability checks and orchestration before sending anything.

pub mod macros;
pub mod profile_client;
pub mod canteen_client;
pub mod menu_client;
pub mod order_client;

pub use profile_client::*;
pub use canteen_client::*;
pub use menu_client::*;
pub use order_client::*;
