use std::collections::HashSet;
use std::fmt::Display;
use std::sync::Arc;

use parking_lot::Mutex;
use tracing::{debug, error, info, instrument, warn};

use crate::app_system::CanteenSystem;
use crate::clients::{MenuClient, OrderClient};
use crate::domain::money::format_inr;
use crate::domain::{
    Canteen, MenuItem, MenuItemCreate, MenuItemId, MenuItemPatch, Order, OrderId, OrderLineItem, OrderStatus, Principal,
    UserId,
};
use crate::menu_actor::MenuError;
use crate::notifications::{ChangeKind, ChannelSpec, Notifier, OrderChange, Subscription, Toast};
use crate::order_service::OrderError;

#[derive(Debug, Default)]
struct VendorState {
    orders: Vec<Order>,
    /// Fetches still running. Overlapping refreshes each hold one.
    loads: usize,
    /// Orders with a status update on the wire.
    in_flight: HashSet<OrderId>,
}

/// Marks the view as loading until dropped.
struct Loading<'a> {
    state: &'a Mutex<VendorState>,
}

impl<'a> Loading<'a> {
    fn start(state: &'a Mutex<VendorState>) -> Self {
        state.lock().loads += 1;
        Self { state }
    }
}

impl Drop for Loading<'_> {
    fn drop(&mut self) {
        let mut state = self.state.lock();
        state.loads = state.loads.saturating_sub(1);
    }
}

/// Clears an order's in-flight mark when dropped, whatever the outcome.
struct InFlight<'a> {
    state: &'a Mutex<VendorState>,
    order_id: OrderId,
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.state.lock().in_flight.remove(&self.order_id);
    }
}

/// Headless vendor view: the incoming orders of the vendor's canteen and its
/// menu.
///
/// Status updates take `&self` so several can run at once; a second update
/// for an order that already has one in flight is refused with
/// [`OrderError::Busy`].
pub struct VendorDashboard {
    principal: Principal,
    canteen: Canteen,
    order_client: OrderClient,
    menu_client: MenuClient,
    notifier: Arc<dyn Notifier>,
    subscription: Option<Subscription>,
    state: Mutex<VendorState>,
}

impl VendorDashboard {
    #[instrument(skip(system, notifier))]
    pub async fn mount(system: &CanteenSystem, user_id: UserId, notifier: Arc<dyn Notifier>) -> Result<Self, OrderError> {
        let principal = system.profile_client.principal(user_id.clone()).await?;
        if !principal.is_vendor() {
            warn!(role = %principal.role, "Vendor dashboard needs a vendor account");
            return Err(OrderError::Unauthorized("Vendor dashboard needs a vendor account".to_string()));
        }
        let canteen = system.canteen_client.canteen_for_vendor(user_id).await?;

        let subscription = system
            .feed
            .subscribe(format!("vendor-orders:{}", canteen.id), ChannelSpec::new_orders());

        let dashboard = Self {
            principal,
            canteen,
            order_client: system.order_client.clone(),
            menu_client: system.menu_client.clone(),
            notifier,
            subscription: Some(subscription),
            state: Mutex::new(VendorState::default()),
        };
        let _ = dashboard.refresh().await;
        Ok(dashboard)
    }

    pub fn canteen(&self) -> &Canteen {
        &self.canteen
    }

    /// Newest first.
    pub fn orders(&self) -> Vec<Order> {
        self.state.lock().orders.clone()
    }

    pub fn is_loading(&self) -> bool {
        self.state.lock().loads > 0
    }

    pub fn is_in_flight(&self, order_id: &str) -> bool {
        self.state.lock().in_flight.contains(order_id)
    }

    pub fn is_subscribed(&self) -> bool {
        self.subscription.is_some()
    }

    #[instrument(skip(self), fields(canteen_id = %self.canteen.id))]
    pub async fn refresh(&self) -> Result<(), OrderError> {
        let loading = Loading::start(&self.state);
        let result = self
            .order_client
            .canteen_orders(&self.principal, self.canteen.id.clone())
            .await;
        drop(loading);

        let mut state = self.state.lock();
        match result {
            Ok(orders) => {
                debug!(count = orders.len(), "Orders loaded");
                state.orders = orders;
                Ok(())
            }
            Err(e) => {
                drop(state);
                error!(error = %e, "Failed to load orders");
                self.notifier.toast(Toast::error("Failed to load orders", e.to_string()));
                Err(e)
            }
        }
    }

    fn begin(&self, order_id: &OrderId) -> Option<InFlight<'_>> {
        let inserted = self.state.lock().in_flight.insert(order_id.clone());
        inserted.then(|| InFlight {
            state: &self.state,
            order_id: order_id.clone(),
        })
    }

    #[instrument(skip(self), fields(canteen_id = %self.canteen.id))]
    pub async fn update_status(&self, order_id: OrderId, target: OrderStatus) -> Result<Order, OrderError> {
        let Some(_guard) = self.begin(&order_id) else {
            debug!("Update already in flight");
            return Err(OrderError::Busy(order_id));
        };

        match self.order_client.update_status(&self.principal, order_id, target).await {
            Ok(order) => {
                info!(order_id = %order.id, status = %order.status, "Order updated");
                self.notifier.toast(Toast::success(
                    "Order updated",
                    format!("Order marked as {}", order.status),
                ));
                let _ = self.refresh().await;
                Ok(order)
            }
            Err(e) => {
                error!(error = %e, "Failed to update order");
                self.notifier.toast(Toast::error("Failed to update order", e.to_string()));
                Err(e)
            }
        }
    }

    pub async fn mark_ready(&self, order_id: OrderId) -> Result<Order, OrderError> {
        self.update_status(order_id, OrderStatus::Ready).await
    }

    pub async fn mark_completed(&self, order_id: OrderId) -> Result<Order, OrderError> {
        self.update_status(order_id, OrderStatus::Completed).await
    }

    /// An order with its line items.
    pub async fn order_details(&self, order_id: OrderId) -> Result<(Order, Vec<OrderLineItem>), OrderError> {
        let result = async {
            let order = self.order_client.get_order(&self.principal, order_id.clone()).await?;
            let items = self.order_client.line_items(&self.principal, order_id).await?;
            Ok::<_, OrderError>((order, items))
        }
        .await;
        self.report("Failed to load order", result)
    }

    /// Waits for the next change on the subscription and handles it.
    /// Returns `false` once the subscription is gone or the feed closed.
    pub async fn process_next_change(&mut self) -> bool {
        let change = match self.subscription.as_mut() {
            Some(subscription) => subscription.recv().await,
            None => return false,
        };
        match change {
            Some(change) => {
                self.handle_change(&change).await;
                true
            }
            None => false,
        }
    }

    /// Handles every change already queued, without waiting.
    pub async fn process_pending_changes(&mut self) -> usize {
        let mut handled = 0;
        while let Some(change) = self.subscription.as_mut().and_then(Subscription::try_recv) {
            self.handle_change(&change).await;
            handled += 1;
        }
        handled
    }

    /// Inserts arrive for every canteen; only our own get a toast, and the
    /// re-fetch is scoped to our canteen anyway.
    #[instrument(skip(self, change), fields(seq = change.seq, kind = ?change.kind))]
    async fn handle_change(&self, change: &OrderChange) {
        if change.kind == ChangeKind::Insert {
            if let Some(order) = change.new.as_ref().filter(|o| o.canteen_id == self.canteen.id) {
                let code = order.pickup_code.as_ref().map(|c| c.to_string()).unwrap_or_default();
                info!(order_id = %order.id, "New order received");
                self.notifier.toast(Toast::info(
                    "New order received!",
                    format!("Order {} for {}", code, format_inr(order.total_amount)),
                ));
            }
        }
        let _ = self.refresh().await;
    }

    // --- Menu management ---

    pub async fn menu(&self) -> Result<Vec<MenuItem>, MenuError> {
        let result = self.menu_client.list_menu(self.canteen.id.clone(), false).await;
        self.report("Failed to load menu", result)
    }

    /// Adds an item to this dashboard's canteen, whatever canteen the form named.
    pub async fn add_menu_item(&self, mut item: MenuItemCreate) -> Result<MenuItem, MenuError> {
        item.canteen_id = self.canteen.id.clone();
        let result = self.menu_client.add_item(&self.principal, item).await;
        self.report("Failed to add menu item", result)
    }

    pub async fn update_menu_item(&self, id: MenuItemId, patch: MenuItemPatch) -> Result<MenuItem, MenuError> {
        let result = self.menu_client.update_item(&self.principal, id, patch).await;
        self.report("Failed to update menu item", result)
    }

    pub async fn set_item_available(&self, id: MenuItemId, available: bool) -> Result<bool, MenuError> {
        let result = self.menu_client.set_available(&self.principal, id, available).await;
        self.report("Failed to update availability", result)
    }

    pub async fn remove_menu_item(&self, id: MenuItemId) -> Result<(), MenuError> {
        let result = self.menu_client.remove_item(&self.principal, id).await;
        self.report("Failed to remove menu item", result)
    }

    fn report<T, E: Display>(&self, title: &str, result: Result<T, E>) -> Result<T, E> {
        if let Err(e) = &result {
            error!(error = %e, "{}", title);
            self.notifier.toast(Toast::error(title, e.to_string()));
        }
        result
    }

    /// Releases the subscription. Safe to call more than once.
    pub fn teardown(&mut self) {
        if let Some(subscription) = self.subscription.take() {
            debug!(channel = subscription.name(), "Tearing down vendor dashboard");
            subscription.unsubscribe();
        }
    }
}
