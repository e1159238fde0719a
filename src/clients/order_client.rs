use tracing::{debug, error, info, instrument, warn};

use crate::authz;
use crate::clients::{CanteenClient, MenuClient, ProfileClient};
use crate::domain::{
    CanteenId, NewOrder, Order, OrderCreate, OrderId, OrderLineItem, OrderStatus, PricedLine, Principal,
};
use crate::messages::OrderScope;
use crate::order_service::{OrderError, OrderHandle};

/// Client for the order lifecycle.
///
/// This client handles the orchestration around the order service: it
/// checks the caller's capabilities, prices the cart from the live menu and
/// hides orders the caller may not see.
#[derive(Clone)]
pub struct OrderClient {
    inner: OrderHandle,
    profile_client: ProfileClient,
    canteen_client: CanteenClient,
    menu_client: MenuClient,
}

impl OrderClient {
    pub fn new(
        inner: OrderHandle,
        profile_client: ProfileClient,
        canteen_client: CanteenClient,
        menu_client: MenuClient,
    ) -> Self {
        Self {
            inner,
            profile_client,
            canteen_client,
            menu_client,
        }
    }

    /// Places an order for `principal`.
    ///
    /// Unit prices come from the menu as it stands now; the caller never
    /// supplies them. The pickup code is assigned by the order service.
    #[instrument(skip(self, order), fields(caller = %principal.user_id, canteen_id = %order.canteen_id, lines = order.lines.len()))]
    pub async fn place_order(&self, principal: &Principal, order: NewOrder) -> Result<Order, OrderError> {
        info!("Processing place_order request (Client Side)");

        // Step 1: Input checks
        order.validate().map_err(OrderError::ValidationError)?;

        // Step 2: Capability check against the presented identity
        if !authz::can_place_order(principal, &order.student_id) {
            warn!(student_id = %order.student_id, "Caller cannot order under this identity");
            return Err(OrderError::Unauthorized("Orders can only be placed by the student themselves".to_string()));
        }

        // Step 3: Same check against the stored role
        let stored = self.profile_client.principal(order.student_id.clone()).await.map_err(|e| {
            error!(error = %e, "Student validation failed");
            OrderError::from(e)
        })?;
        if !authz::can_place_order(&stored, &order.student_id) {
            warn!(role = %stored.role, "Account is not a student");
            return Err(OrderError::Unauthorized("Only students can place orders".to_string()));
        }

        // Step 4: Canteen must exist
        let canteen = self.canteen_client.get_canteen(order.canteen_id.clone()).await?;
        debug!(canteen_name = %canteen.name, "Canteen validation successful");

        // Step 5: Price every line from the current menu
        let mut lines = Vec::with_capacity(order.lines.len());
        for line in order.lines {
            let item = self.menu_client.get_menu_item(line.menu_item_id.clone()).await?;
            if item.canteen_id != canteen.id {
                error!(menu_item_id = %item.id, "Menu item belongs to another canteen");
                return Err(OrderError::ValidationError(format!("{} is not on this canteen's menu", item.name)));
            }
            if !item.is_available {
                error!(menu_item_id = %item.id, "Menu item unavailable");
                return Err(OrderError::ValidationError(format!("{} is not available", item.name)));
            }
            lines.push(PricedLine {
                menu_item_id: item.id,
                quantity: line.quantity,
                unit_price: item.price,
            });
        }

        // Step 6: Persist
        let payload = OrderCreate {
            student_id: order.student_id,
            canteen_id: canteen.id,
            lines,
        };
        if payload.total().is_none() {
            error!("Order total does not fit");
            return Err(OrderError::ValidationError("Order total too large".to_string()));
        }
        let placed = self.inner.place(payload).await?;
        info!(order_id = %placed.id, "Order placed");
        Ok(placed)
    }

    /// Fetches an order the caller may see. Anything else is not found.
    #[instrument(skip(self), fields(caller = %principal.user_id))]
    pub async fn get_order(&self, principal: &Principal, id: OrderId) -> Result<Order, OrderError> {
        let order = self
            .inner
            .get(id.clone())
            .await?
            .ok_or_else(|| OrderError::NotFound(id.clone()))?;

        let canteen = if principal.is_vendor() {
            self.canteen_client.find_canteen(order.canteen_id.clone()).await?
        } else {
            None
        };
        if !authz::can_view_order(principal, &order, canteen.as_ref()) {
            debug!("Order hidden from caller");
            return Err(OrderError::NotFound(id));
        }
        Ok(order)
    }

    /// Line items inherit their order's visibility.
    #[instrument(skip(self), fields(caller = %principal.user_id))]
    pub async fn line_items(&self, principal: &Principal, order_id: OrderId) -> Result<Vec<OrderLineItem>, OrderError> {
        let order = self.get_order(principal, order_id).await?;
        self.inner.line_items(order.id).await
    }

    /// Newest first. Students get their own orders, vendors the orders of
    /// every canteen they run.
    #[instrument(skip(self), fields(caller = %principal.user_id))]
    pub async fn list_orders(&self, principal: &Principal) -> Result<Vec<Order>, OrderError> {
        if principal.is_student() {
            return self.inner.list(OrderScope::Student(principal.user_id.clone())).await;
        }

        let mut orders = Vec::new();
        for canteen in self.canteen_client.find_by_vendor(principal.user_id.clone()).await? {
            orders.extend(self.inner.list(OrderScope::Canteen(canteen.id)).await?);
        }
        orders.sort_by(|a, b| b.created_at.cmp(&a.created_at).then_with(|| a.id.cmp(&b.id)));
        Ok(orders)
    }

    /// Newest first, for one canteen the caller owns.
    #[instrument(skip(self), fields(caller = %principal.user_id))]
    pub async fn canteen_orders(&self, principal: &Principal, canteen_id: CanteenId) -> Result<Vec<Order>, OrderError> {
        let canteen = self.canteen_client.require_owned(principal, canteen_id).await?;
        self.inner.list(OrderScope::Canteen(canteen.id)).await
    }

    /// Moves an order to `target`.
    ///
    /// Only the vendor running the order's canteen may do this. Skips and
    /// backward moves are refused by the service; repeating the current
    /// status succeeds without publishing anything.
    #[instrument(skip(self), fields(caller = %principal.user_id))]
    pub async fn update_status(&self, principal: &Principal, id: OrderId, target: OrderStatus) -> Result<Order, OrderError> {
        let order = self
            .inner
            .get(id.clone())
            .await?
            .ok_or_else(|| OrderError::NotFound(id.clone()))?;
        let canteen = self.canteen_client.get_canteen(order.canteen_id.clone()).await?;

        if !authz::can_transition(principal, &canteen, target) {
            warn!(canteen_id = %canteen.id, %target, "Caller cannot update this order");
            return Err(OrderError::Unauthorized(format!(
                "Only the vendor of {} can update this order",
                canteen.name
            )));
        }

        let updated = self.inner.transition(id, target).await?;
        debug!(status = %updated.status, "Status update applied");
        Ok(updated)
    }

    pub async fn mark_ready(&self, principal: &Principal, id: OrderId) -> Result<Order, OrderError> {
        self.update_status(principal, id, OrderStatus::Ready).await
    }

    pub async fn mark_completed(&self, principal: &Principal, id: OrderId) -> Result<Order, OrderError> {
        self.update_status(principal, id, OrderStatus::Completed).await
    }

    /// Cascade step; no capability check.
    pub(crate) async fn purge(&self, scope: OrderScope) -> Result<Vec<Order>, OrderError> {
        self.inner.purge(scope).await
    }

    pub(crate) async fn shutdown(&self) -> Result<(), OrderError> {
        self.inner.shutdown().await
    }
}
