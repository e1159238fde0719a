use std::collections::{HashMap, HashSet};

use chrono::Utc;
use tokio::sync::mpsc;
use tracing::{debug, error, info, instrument, warn};

use super::error::OrderError;
use super::handle::OrderHandle;
use super::pickup_code::PickupCodeGenerator;
use super::state_machine::{self, Transition};
use crate::domain::{Order, OrderCreate, OrderId, OrderLineItem, OrderStatus, PickupCode};
use crate::messages::{OrderRequest, OrderScope, ServiceResponse};
use crate::notifications::{ChangeFeed, OrderChange};

/// Owner of the `orders` and `order_items` tables.
///
/// All order mutations go through this actor's mailbox and are applied one at
/// a time, so the pickup-code check and the insert that claims the code can
/// never interleave with another creation. Every committed mutation is
/// published on the [`ChangeFeed`] before the caller gets its reply.
pub struct OrderService {
    receiver: mpsc::Receiver<OrderRequest>,
    orders: HashMap<OrderId, Order>,
    line_items: HashMap<OrderId, Vec<OrderLineItem>>,
    /// Codes held by orders in pending or ready.
    active_codes: HashSet<PickupCode>,
    codes: PickupCodeGenerator,
    feed: ChangeFeed,
    next_id_fn: Box<dyn Fn() -> String + Send + Sync>,
}

impl OrderService {
    pub fn new(
        buffer_size: usize,
        codes: PickupCodeGenerator,
        feed: ChangeFeed,
        next_id_fn: impl Fn() -> String + Send + Sync + 'static,
    ) -> (Self, OrderHandle) {
        let (sender, receiver) = mpsc::channel(buffer_size);
        let service = Self {
            receiver,
            orders: HashMap::new(),
            line_items: HashMap::new(),
            active_codes: HashSet::new(),
            codes,
            feed,
            next_id_fn: Box::new(next_id_fn),
        };
        (service, OrderHandle::new(sender))
    }

    #[instrument(name = "order_service", skip(self))]
    pub async fn run(mut self) {
        info!("OrderService starting");
        while let Some(msg) = self.receiver.recv().await {
            match msg {
                OrderRequest::PlaceOrder { order, respond_to } => {
                    self.handle_place_order(order, respond_to);
                }
                OrderRequest::GetOrder { id, respond_to } => {
                    self.handle_get_order(id, respond_to);
                }
                OrderRequest::GetLineItems { order_id, respond_to } => {
                    let items = self.line_items.get(&order_id).cloned().unwrap_or_default();
                    let _ = respond_to.send(Ok(items));
                }
                OrderRequest::ListOrders { scope, respond_to } => {
                    self.handle_list_orders(scope, respond_to);
                }
                OrderRequest::TransitionOrder { id, target, respond_to } => {
                    self.handle_transition(id, target, respond_to);
                }
                OrderRequest::PurgeOrders { scope, respond_to } => {
                    self.handle_purge(scope, respond_to);
                }
                OrderRequest::Shutdown => {
                    info!("OrderService shutting down");
                    break;
                }
                #[cfg(test)]
                OrderRequest::ActiveCodes { respond_to } => {
                    let _ = respond_to.send(Ok(self.active_codes.iter().cloned().collect()));
                }
            }
        }
        self.feed.close();
        info!("OrderService stopped");
    }

    /// Persists a priced order. The pickup code is drawn here, against the
    /// live set of active codes, right before the row becomes visible.
    #[instrument(
        fields(student_id = %order.student_id, canteen_id = %order.canteen_id, lines = order.lines.len()),
        skip(self, order, respond_to)
    )]
    fn handle_place_order(&mut self, order: OrderCreate, respond_to: ServiceResponse<Order, OrderError>) {
        debug!("Processing place_order request");

        if order.lines.is_empty() {
            error!("Refusing order without line items");
            let _ = respond_to.send(Err(OrderError::ValidationError("Order has no items".to_string())));
            return;
        }
        let Some(total_amount) = order.total() else {
            error!("Refusing order whose total overflows");
            let _ = respond_to.send(Err(OrderError::ValidationError("Order total too large".to_string())));
            return;
        };

        let id = (self.next_id_fn)();
        let code = self.codes.generate(&self.active_codes);
        let record = Order {
            id: id.clone(),
            student_id: order.student_id.clone(),
            canteen_id: order.canteen_id.clone(),
            status: OrderStatus::Pending,
            total_amount,
            pickup_code: Some(code.clone()),
            created_at: Utc::now(),
        };
        let items: Vec<OrderLineItem> = order
            .lines
            .into_iter()
            .map(|line| OrderLineItem {
                id: (self.next_id_fn)(),
                order_id: id.clone(),
                menu_item_id: line.menu_item_id,
                quantity: line.quantity,
                price: line.unit_price,
            })
            .collect();

        self.active_codes.insert(code);
        self.line_items.insert(id.clone(), items);
        self.orders.insert(id.clone(), record.clone());

        info!(order_id = %id, total = %record.total_amount, "Order created");
        self.feed.publish(OrderChange::insert(record.clone()));
        let _ = respond_to.send(Ok(record));
    }

    #[instrument(fields(order_id = %id), skip(self, respond_to))]
    fn handle_get_order(&self, id: OrderId, respond_to: ServiceResponse<Option<Order>, OrderError>) {
        debug!("Processing get_order request");
        let order = self.orders.get(&id).cloned();
        match &order {
            Some(order) => debug!(status = %order.status, "Order found"),
            None => debug!("Order not found"),
        }
        let _ = respond_to.send(Ok(order));
    }

    /// Newest first.
    #[instrument(skip(self, respond_to))]
    fn handle_list_orders(&self, scope: OrderScope, respond_to: ServiceResponse<Vec<Order>, OrderError>) {
        let mut orders: Vec<Order> = self.orders.values().filter(|order| scope.contains(order)).cloned().collect();
        orders.sort_by(|a, b| b.created_at.cmp(&a.created_at).then_with(|| a.id.cmp(&b.id)));
        debug!(count = orders.len(), "Listed orders");
        let _ = respond_to.send(Ok(orders));
    }

    #[instrument(fields(order_id = %id, target = %target), skip(self, respond_to))]
    fn handle_transition(&mut self, id: OrderId, target: OrderStatus, respond_to: ServiceResponse<Order, OrderError>) {
        debug!("Processing transition request");

        let Some(order) = self.orders.get_mut(&id) else {
            warn!("Order not found for transition");
            let _ = respond_to.send(Err(OrderError::NotFound(id)));
            return;
        };

        let result = match state_machine::plan(order.status, target) {
            Ok(Transition::Unchanged(status)) => {
                debug!(%status, "Order already in requested status");
                Ok(order.clone())
            }
            Ok(Transition::Advance { from, to }) => {
                let before = order.clone();
                order.status = to;
                let after = order.clone();
                if !to.is_active() {
                    if let Some(code) = &after.pickup_code {
                        self.active_codes.remove(code);
                    }
                }
                info!(%from, %to, "Order status changed");
                self.feed.publish(OrderChange::update(before, after.clone()));
                Ok(after)
            }
            Err(e) => {
                warn!(error = %e, "Transition rejected");
                Err(e)
            }
        };
        let _ = respond_to.send(result);
    }

    #[instrument(skip(self, respond_to))]
    fn handle_purge(&mut self, scope: OrderScope, respond_to: ServiceResponse<Vec<Order>, OrderError>) {
        let ids: Vec<OrderId> = self
            .orders
            .values()
            .filter(|order| scope.contains(order))
            .map(|order| order.id.clone())
            .collect();

        let mut removed = Vec::with_capacity(ids.len());
        for id in ids {
            if let Some(order) = self.orders.remove(&id) {
                self.line_items.remove(&id);
                if order.holds_code() {
                    if let Some(code) = &order.pickup_code {
                        self.active_codes.remove(code);
                    }
                }
                self.feed.publish(OrderChange::delete(order.clone()));
                removed.push(order);
            }
        }
        info!(count = removed.len(), "Orders purged");
        let _ = respond_to.send(Ok(removed));
    }
}
