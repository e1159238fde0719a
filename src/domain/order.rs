use std::fmt;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;

use super::money::checked_total;
use super::{CanteenId, MenuItemId, OrderId, UserId};

/// Order status. Orders only ever move forward through
/// `Pending -> Ready -> Completed`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum OrderStatus {
    Pending,
    Ready,
    Completed,
}

impl OrderStatus {
    /// The status that follows this one, if any.
    pub fn next(self) -> Option<OrderStatus> {
        match self {
            OrderStatus::Pending => Some(OrderStatus::Ready),
            OrderStatus::Ready => Some(OrderStatus::Completed),
            OrderStatus::Completed => None,
        }
    }

    /// Active orders hold their pickup code exclusively.
    pub fn is_active(self) -> bool {
        matches!(self, OrderStatus::Pending | OrderStatus::Ready)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::Pending => "pending",
            OrderStatus::Ready => "ready",
            OrderStatus::Completed => "completed",
        }
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Six-digit, zero-padded code a student reads out at the counter.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PickupCode(String);

impl PickupCode {
    pub const LEN: usize = 6;
    /// Number of distinct codes ("000000" through "999999").
    pub const SPACE: u32 = 1_000_000;

    pub fn from_number(value: u32) -> Self {
        debug_assert!(value < Self::SPACE);
        Self(format!("{:06}", value))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PickupCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Represents one placed purchase.
#[derive(Debug, Clone, PartialEq)]
pub struct Order {
    pub id: OrderId,
    pub student_id: UserId,
    pub canteen_id: CanteenId,
    pub status: OrderStatus,
    pub total_amount: Decimal,
    /// Assigned by the order service on insert. Kept after completion for
    /// display, but no longer reserved.
    pub pickup_code: Option<PickupCode>,
    pub created_at: DateTime<Utc>,
}

impl Order {
    /// Whether this order currently reserves its pickup code.
    pub fn holds_code(&self) -> bool {
        self.status.is_active() && self.pickup_code.is_some()
    }
}

/// One menu item within an order, priced at order time.
#[derive(Debug, Clone, PartialEq)]
pub struct OrderLineItem {
    pub id: String,
    pub order_id: OrderId,
    pub menu_item_id: MenuItemId,
    pub quantity: u32,
    pub price: Decimal,
}

/// A line of an order request: which item and how many.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderLine {
    pub menu_item_id: MenuItemId,
    pub quantity: u32,
}

impl OrderLine {
    pub fn new(menu_item_id: impl Into<MenuItemId>, quantity: u32) -> Self {
        Self {
            menu_item_id: menu_item_id.into(),
            quantity,
        }
    }
}

/// What a student submits. Prices are looked up server-side.
#[derive(Debug, Clone)]
pub struct NewOrder {
    pub student_id: UserId,
    pub canteen_id: CanteenId,
    pub lines: Vec<OrderLine>,
}

impl NewOrder {
    pub fn new(student_id: impl Into<UserId>, canteen_id: impl Into<CanteenId>, lines: Vec<OrderLine>) -> Self {
        Self {
            student_id: student_id.into(),
            canteen_id: canteen_id.into(),
            lines,
        }
    }

    /// Most units of one item a single order line may ask for.
    pub const MAX_QUANTITY: u32 = 100;

    /// Input-only checks, run before any request leaves the client.
    pub fn validate(&self) -> Result<(), String> {
        if self.lines.is_empty() {
            return Err("Cart is empty".to_string());
        }
        if let Some(line) = self.lines.iter().find(|line| line.quantity == 0) {
            return Err(format!("Quantity must be positive for item {}", line.menu_item_id));
        }
        if let Some(line) = self.lines.iter().find(|line| line.quantity > Self::MAX_QUANTITY) {
            return Err(format!(
                "Quantity {} for item {} exceeds the limit of {}",
                line.quantity,
                line.menu_item_id,
                Self::MAX_QUANTITY
            ));
        }
        Ok(())
    }
}

/// A line with its order-time unit price resolved.
#[derive(Debug, Clone, PartialEq)]
pub struct PricedLine {
    pub menu_item_id: MenuItemId,
    pub quantity: u32,
    pub unit_price: Decimal,
}

/// A validated, priced order ready to be persisted.
#[derive(Debug, Clone)]
pub struct OrderCreate {
    pub student_id: UserId,
    pub canteen_id: CanteenId,
    pub lines: Vec<PricedLine>,
}

impl OrderCreate {
    /// Sum of quantity times unit price over all lines. `None` on overflow.
    pub fn total(&self) -> Option<Decimal> {
        checked_total(self.lines.iter().map(|line| (line.unit_price, line.quantity)))
    }
}
