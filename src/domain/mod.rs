pub mod profile;
pub mod canteen;
pub mod menu_item;
pub mod order;
pub mod cart;
pub mod money;

pub use profile::*;
pub use canteen::*;
pub use menu_item::*;
pub use order::*;
pub use cart::*;

/// Identifier of a registered account (student or vendor).
pub type UserId = String;
pub type CanteenId = String;
pub type MenuItemId = String;
pub type OrderId = String;
