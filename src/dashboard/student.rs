use std::sync::Arc;

use tracing::{debug, error, info, instrument, warn};

use crate::app_system::CanteenSystem;
use crate::clients::{CanteenClient, OrderClient};
use crate::domain::money::format_inr;
use crate::domain::{Cart, Order, OrderStatus, Principal, UserId};
use crate::notifications::{ChangeKind, ChannelSpec, NotificationPermission, Notifier, OrderChange, Subscription, Toast};
use crate::order_service::OrderError;

/// Headless student order view: the student's orders, live.
///
/// Push events only wake the view up; the order list always comes from a
/// fresh fetch.
pub struct StudentDashboard {
    principal: Principal,
    order_client: OrderClient,
    canteen_client: CanteenClient,
    notifier: Arc<dyn Notifier>,
    permission: NotificationPermission,
    subscription: Option<Subscription>,
    orders: Vec<Order>,
    loading: bool,
}

impl StudentDashboard {
    /// Resolves the caller, subscribes to updates of their orders and loads
    /// the current list. Subscribing first means nothing committed after the
    /// fetch is missed.
    #[instrument(skip(system, notifier))]
    pub async fn mount(
        system: &CanteenSystem,
        user_id: UserId,
        notifier: Arc<dyn Notifier>,
        permission: NotificationPermission,
    ) -> Result<Self, OrderError> {
        let principal = system.profile_client.principal(user_id.clone()).await?;
        if !principal.is_student() {
            warn!(role = %principal.role, "Student dashboard needs a student account");
            return Err(OrderError::Unauthorized("Student dashboard needs a student account".to_string()));
        }

        let subscription = system
            .feed
            .subscribe(format!("student-orders:{}", user_id), ChannelSpec::student_updates(user_id));

        let mut dashboard = Self {
            principal,
            order_client: system.order_client.clone(),
            canteen_client: system.canteen_client.clone(),
            notifier,
            permission,
            subscription: Some(subscription),
            orders: Vec::new(),
            loading: false,
        };
        // A failed first load is already toasted; the view stays mounted.
        let _ = dashboard.refresh().await;
        Ok(dashboard)
    }

    pub fn principal(&self) -> &Principal {
        &self.principal
    }

    /// Newest first.
    pub fn orders(&self) -> &[Order] {
        &self.orders
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    pub fn is_subscribed(&self) -> bool {
        self.subscription.is_some()
    }

    #[instrument(skip(self), fields(student_id = %self.principal.user_id))]
    pub async fn refresh(&mut self) -> Result<(), OrderError> {
        self.loading = true;
        let result = self.order_client.list_orders(&self.principal).await;
        self.loading = false;

        match result {
            Ok(orders) => {
                debug!(count = orders.len(), "Orders loaded");
                self.orders = orders;
                Ok(())
            }
            Err(e) => {
                error!(error = %e, "Failed to load orders");
                self.notifier.toast(Toast::error("Failed to load orders", e.to_string()));
                Err(e)
            }
        }
    }

    /// Checks out `cart`. The cart is emptied only when the order went through.
    #[instrument(skip(self, cart), fields(student_id = %self.principal.user_id, items = cart.item_count()))]
    pub async fn place_order(&mut self, cart: &mut Cart) -> Result<Order, OrderError> {
        let result = match cart.to_new_order(self.principal.user_id.clone()) {
            Ok(new_order) => self.order_client.place_order(&self.principal, new_order).await,
            Err(msg) => Err(OrderError::ValidationError(msg)),
        };

        match result {
            Ok(order) => {
                let code = order.pickup_code.as_ref().map(|c| c.to_string()).unwrap_or_default();
                info!(order_id = %order.id, "Order placed from cart");
                self.notifier.toast(Toast::success(
                    "Order placed!",
                    format!("Your pickup code is {}", code),
                ));
                cart.clear();
                let _ = self.refresh().await;
                Ok(order)
            }
            Err(e) => {
                error!(error = %e, "Failed to place order");
                self.notifier.toast(Toast::error("Failed to place order", e.to_string()));
                Err(e)
            }
        }
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

    #[instrument(skip(self, change), fields(seq = change.seq, kind = ?change.kind))]
    async fn handle_change(&mut self, change: &OrderChange) {
        if let Some(order) = became_ready(change, &self.principal.user_id) {
            self.announce_ready(order).await;
        }
        let _ = self.refresh().await;
    }

    async fn announce_ready(&self, order: &Order) {
        let canteen_name = match self.canteen_client.find_canteen(order.canteen_id.clone()).await {
            Ok(Some(canteen)) => canteen.name,
            Ok(None) => "the canteen".to_string(),
            Err(e) => {
                warn!(error = %e, "Could not resolve canteen name");
                "the canteen".to_string()
            }
        };
        let body = format!(
            "Your order from {} ({}) is ready for pickup",
            canteen_name,
            format_inr(order.total_amount)
        );
        info!(order_id = %order.id, "Order ready");
        self.notifier.toast(Toast::success("Order ready!", body.clone()));
        if self.permission.is_granted() {
            self.notifier.system("Order ready for pickup", &body);
        }
    }

    /// Releases the subscription. Safe to call more than once.
    pub fn teardown(&mut self) {
        if let Some(subscription) = self.subscription.take() {
            debug!(channel = subscription.name(), "Tearing down student dashboard");
            subscription.unsubscribe();
        }
    }
}

/// The order in `change` when it is `student_id`'s and just moved from
/// pending to ready.
fn became_ready<'a>(change: &'a OrderChange, student_id: &str) -> Option<&'a Order> {
    if change.kind != ChangeKind::Update {
        return None;
    }
    let (old, new) = (change.old.as_ref()?, change.new.as_ref()?);
    let moved = old.status == OrderStatus::Pending && new.status == OrderStatus::Ready;
    (moved && new.student_id == student_id).then_some(new)
}
