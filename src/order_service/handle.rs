use std::time::Duration;

use tokio::sync::mpsc;
use tracing::{debug, instrument};

use super::error::OrderError;
use crate::actor_framework::DEFAULT_REQUEST_TIMEOUT;
use crate::client_method;
use crate::domain::{Order, OrderCreate, OrderId, OrderLineItem, OrderStatus};
use crate::messages::{OrderRequest, OrderScope};

/// Raw handle to the [`OrderService`](super::OrderService) mailbox.
///
/// No authorization happens here; callers go through
/// [`OrderClient`](crate::clients::OrderClient).
#[derive(Clone)]
pub struct OrderHandle {
    sender: mpsc::Sender<OrderRequest>,
    timeout: Duration,
}

impl OrderHandle {
    pub fn new(sender: mpsc::Sender<OrderRequest>) -> Self {
        Self {
            sender,
            timeout: DEFAULT_REQUEST_TIMEOUT,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Manual method for the one message that has no reply.
    #[instrument(skip(self))]
    pub async fn shutdown(&self) -> Result<(), OrderError> {
        debug!("Sending shutdown request");
        self.sender
            .send(OrderRequest::Shutdown)
            .await
            .map_err(|_| OrderError::Unavailable("Actor closed".to_string()))
    }
}

client_method!(OrderHandle => fn place(order: OrderCreate) -> Order as OrderRequest::PlaceOrder, Error = OrderError, skip(order));
client_method!(OrderHandle => fn get(id: OrderId) -> Option<Order> as OrderRequest::GetOrder, Error = OrderError);
client_method!(OrderHandle => fn line_items(order_id: OrderId) -> Vec<OrderLineItem> as OrderRequest::GetLineItems, Error = OrderError);
client_method!(OrderHandle => fn list(scope: OrderScope) -> Vec<Order> as OrderRequest::ListOrders, Error = OrderError);
client_method!(OrderHandle => fn transition(id: OrderId, target: OrderStatus) -> Order as OrderRequest::TransitionOrder, Error = OrderError);
client_method!(OrderHandle => fn purge(scope: OrderScope) -> Vec<Order> as OrderRequest::PurgeOrders, Error = OrderError);

// Test-only message for inspecting the reserved code set
#[cfg(test)]
client_method!(OrderHandle => fn active_codes() -> Vec<crate::domain::PickupCode> as OrderRequest::ActiveCodes, Error = OrderError);
