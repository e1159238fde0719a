use chrono::{DateTime, Utc};
use rust_decimal::Decimal;

use super::{CanteenId, MenuItemId};

/// Represents a dish on a canteen's menu.
#[derive(Debug, Clone, PartialEq)]
pub struct MenuItem {
    pub id: MenuItemId,
    pub canteen_id: CanteenId,
    pub name: String,
    pub description: Option<String>,
    /// Current list price. Orders copy it at placement time.
    pub price: Decimal,
    pub is_available: bool,
    pub image_url: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Payload for adding an item to a menu.
#[derive(Debug, Clone)]
pub struct MenuItemCreate {
    pub canteen_id: CanteenId,
    pub name: String,
    pub description: Option<String>,
    pub price: Decimal,
    pub image_url: Option<String>,
}

impl MenuItemCreate {
    pub fn new(canteen_id: impl Into<CanteenId>, name: impl Into<String>, price: Decimal) -> Self {
        Self {
            canteen_id: canteen_id.into(),
            name: name.into(),
            description: None,
            price,
            image_url: None,
        }
    }
}

/// Payload for editing a menu item.
#[derive(Debug, Clone, Default)]
pub struct MenuItemPatch {
    pub name: Option<String>,
    pub description: Option<String>,
    pub price: Option<Decimal>,
    pub image_url: Option<String>,
}
