use rust_decimal::Decimal;

use super::money::checked_total;
use super::{CanteenId, MenuItem, MenuItemId, NewOrder, OrderLine, UserId};

#[derive(Debug, Clone, PartialEq)]
pub struct CartLine {
    pub item: MenuItem,
    pub quantity: u32,
}

/// A student's basket. Holds items from a single canteen.
///
/// Prices shown here are the list prices at the time the item was added; the
/// order service re-reads them when the order is placed.
#[derive(Debug, Clone, Default)]
pub struct Cart {
    lines: Vec<CartLine>,
}

impl Cart {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn canteen_id(&self) -> Option<&CanteenId> {
        self.lines.first().map(|line| &line.item.canteen_id)
    }

    pub fn lines(&self) -> &[CartLine] {
        &self.lines
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Adds one unit of `item`.
    ///
    /// # Errors
    /// Fails if the item is unavailable, belongs to another canteen than the
    /// items already in the cart, or is already at the per-line limit.
    pub fn add(&mut self, item: &MenuItem) -> Result<u32, String> {
        if !item.is_available {
            return Err(format!("{} is not available", item.name));
        }
        if let Some(canteen_id) = self.canteen_id() {
            if *canteen_id != item.canteen_id {
                return Err("Cart already holds items from another canteen".to_string());
            }
        }
        match self.lines.iter_mut().find(|line| line.item.id == item.id) {
            Some(line) => {
                if line.quantity >= NewOrder::MAX_QUANTITY {
                    return Err(format!("At most {} of {} per order", NewOrder::MAX_QUANTITY, item.name));
                }
                line.quantity += 1;
                Ok(line.quantity)
            }
            None => {
                self.lines.push(CartLine { item: item.clone(), quantity: 1 });
                Ok(1)
            }
        }
    }

    /// Sets the quantity of an item already in the cart. Zero removes it;
    /// anything above the per-line limit is refused.
    pub fn set_quantity(&mut self, menu_item_id: &str, quantity: u32) -> bool {
        if quantity == 0 {
            return self.remove(menu_item_id);
        }
        if quantity > NewOrder::MAX_QUANTITY {
            return false;
        }
        match self.lines.iter_mut().find(|line| line.item.id == menu_item_id) {
            Some(line) => {
                line.quantity = quantity;
                true
            }
            None => false,
        }
    }

    pub fn remove(&mut self, menu_item_id: &str) -> bool {
        let before = self.lines.len();
        self.lines.retain(|line| line.item.id != menu_item_id);
        before != self.lines.len()
    }

    pub fn clear(&mut self) {
        self.lines.clear();
    }

    pub fn item_count(&self) -> u32 {
        self.lines.iter().map(|line| line.quantity).sum()
    }

    /// List-price total. `None` if it does not fit in a `Decimal`.
    pub fn total(&self) -> Option<Decimal> {
        checked_total(self.lines.iter().map(|line| (line.item.price, line.quantity)))
    }

    pub fn quantity_of(&self, menu_item_id: &MenuItemId) -> u32 {
        self.lines
            .iter()
            .find(|line| &line.item.id == menu_item_id)
            .map(|line| line.quantity)
            .unwrap_or(0)
    }

    /// Builds the order request for checkout.
    pub fn to_new_order(&self, student_id: impl Into<UserId>) -> Result<NewOrder, String> {
        let canteen_id = self.canteen_id().cloned().ok_or_else(|| "Cart is empty".to_string())?;
        let lines = self
            .lines
            .iter()
            .map(|line| OrderLine::new(line.item.id.clone(), line.quantity))
            .collect();
        Ok(NewOrder::new(student_id, canteen_id, lines))
    }
}
