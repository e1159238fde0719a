//! Capability checks.
//!
//! Each mutating operation calls one of these before it sends anything to an
//! actor. They are pure: the caller fetches the rows they need.

use crate::domain::{Canteen, Order, OrderStatus, Principal};

/// A student may only place orders under their own identity.
pub fn can_place_order(principal: &Principal, student_id: &str) -> bool {
    principal.is_student() && principal.user_id == student_id
}

pub fn can_open_canteen(principal: &Principal) -> bool {
    principal.is_vendor()
}

/// Menus, canteen details and the canteen's orders belong to its vendor.
pub fn can_manage_canteen(principal: &Principal, canteen: &Canteen) -> bool {
    principal.is_vendor() && canteen.vendor_id == principal.user_id
}

/// Status changes after creation are the owning vendor's. Nobody moves an
/// order back to pending; creation is the only way in.
pub fn can_transition(principal: &Principal, canteen: &Canteen, target: OrderStatus) -> bool {
    target != OrderStatus::Pending && can_manage_canteen(principal, canteen)
}

/// Students see their own orders, vendors the orders of canteens they own.
pub fn can_view_order(principal: &Principal, order: &Order, canteen: Option<&Canteen>) -> bool {
    if principal.is_student() {
        return order.student_id == principal.user_id;
    }
    canteen.is_some_and(|canteen| canteen.id == order.canteen_id && can_manage_canteen(principal, canteen))
}

pub fn can_edit_profile(principal: &Principal, profile_id: &str) -> bool {
    principal.user_id == profile_id
}
