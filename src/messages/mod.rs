use tokio::sync::oneshot;

use crate::domain::{CanteenId, Order, OrderCreate, OrderId, OrderLineItem, OrderStatus, UserId};
use crate::order_service::OrderError;

/// Generic type aliases for service communication
pub type ServiceResult<T, E> = std::result::Result<T, E>;
pub type ServiceResponse<T, E> = oneshot::Sender<ServiceResult<T, E>>;

/// Which slice of the orders table a request covers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OrderScope {
    Student(UserId),
    Canteen(CanteenId),
}

impl OrderScope {
    pub fn contains(&self, order: &Order) -> bool {
        match self {
            OrderScope::Student(student_id) => order.student_id == *student_id,
            OrderScope::Canteen(canteen_id) => order.canteen_id == *canteen_id,
        }
    }
}

/// Typed messages for the order service. Each variant includes parameters
/// and a oneshot channel for the response.
#[derive(Debug)]
pub enum OrderRequest {
    PlaceOrder {
        order: OrderCreate,
        respond_to: ServiceResponse<Order, OrderError>,
    },
    GetOrder {
        id: OrderId,
        respond_to: ServiceResponse<Option<Order>, OrderError>,
    },
    GetLineItems {
        order_id: OrderId,
        respond_to: ServiceResponse<Vec<OrderLineItem>, OrderError>,
    },
    ListOrders {
        scope: OrderScope,
        respond_to: ServiceResponse<Vec<Order>, OrderError>,
    },
    TransitionOrder {
        id: OrderId,
        target: OrderStatus,
        respond_to: ServiceResponse<Order, OrderError>,
    },
    /// Cascade removal of every order in scope, with its line items.
    PurgeOrders {
        scope: OrderScope,
        respond_to: ServiceResponse<Vec<Order>, OrderError>,
    },
    Shutdown,
    #[cfg(test)]
    ActiveCodes {
        respond_to: ServiceResponse<Vec<crate::domain::PickupCode>, OrderError>,
    },
}
