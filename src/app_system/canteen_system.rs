use tokio::task::JoinHandle;
use tracing::{error, info, instrument, warn};
use uuid::Uuid;

use super::config::Config;
use super::error::SystemError;
use crate::actor_framework::ResourceActor;
use crate::authz;
use crate::clients::{CanteenClient, MenuClient, OrderClient, ProfileClient};
use crate::domain::{Canteen, CanteenId, MenuItem, Principal, Profile, Role, UserId};
use crate::messages::OrderScope;
use crate::notifications::ChangeFeed;
use crate::order_service::{OrderService, PickupCodeGenerator};
use crate::profile_actor::ProfileError;

fn new_row_id() -> String {
    Uuid::new_v4().to_string()
}

/// What a canteen removal took with it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CascadeReport {
    pub canteens: usize,
    pub menu_items: usize,
    pub orders: usize,
}

/// The main application system that orchestrates all actors.
///
/// Responsible for starting up actors, wiring them together, the cascades
/// that span several tables, and shutdown.
pub struct CanteenSystem {
    pub profile_client: ProfileClient,
    pub canteen_client: CanteenClient,
    pub menu_client: MenuClient,
    pub order_client: OrderClient,
    pub feed: ChangeFeed,
    handles: Vec<JoinHandle<()>>,
}

impl CanteenSystem {
    pub fn new(config: &Config) -> Self {
        Self::with_pickup_codes(config, PickupCodeGenerator::from_entropy())
    }

    /// Starts every actor with the given pickup-code source.
    pub fn with_pickup_codes(config: &Config, codes: PickupCodeGenerator) -> Self {
        let buffer = config.channel_buffer;
        let timeout = config.request_timeout;

        // 1. Profiles
        let (profile_actor, profile_inner) = ResourceActor::<Profile>::new("profiles", buffer, new_row_id);
        let profile_client = ProfileClient::new(profile_inner.with_timeout(timeout));
        let profile_handle = tokio::spawn(profile_actor.run());

        // 2. Canteens
        let (canteen_actor, canteen_inner) = ResourceActor::<Canteen>::new("canteens", buffer, new_row_id);
        let canteen_client = CanteenClient::new(canteen_inner.with_timeout(timeout), profile_client.clone());
        let canteen_handle = tokio::spawn(canteen_actor.run());

        // 3. Menu items
        let (menu_actor, menu_inner) = ResourceActor::<MenuItem>::new("menu_items", buffer, new_row_id);
        let menu_client = MenuClient::new(menu_inner.with_timeout(timeout), canteen_client.clone());
        let menu_handle = tokio::spawn(menu_actor.run());

        // 4. Orders, publishing on the change feed
        let feed = ChangeFeed::new();
        let (order_service, order_handle) = OrderService::new(buffer, codes, feed.clone(), new_row_id);
        let order_client = OrderClient::new(
            order_handle.with_timeout(timeout),
            profile_client.clone(),
            canteen_client.clone(),
            menu_client.clone(),
        );
        let order_task = tokio::spawn(order_service.run());

        info!(buffer, timeout_ms = timeout.as_millis() as u64, "CanteenSystem started");

        Self {
            profile_client,
            canteen_client,
            menu_client,
            order_client,
            feed,
            handles: vec![order_task, menu_handle, canteen_handle, profile_handle],
        }
    }

    /// Removes a canteen with its menu and its orders. Owner only.
    ///
    /// Orders go first so subscribers see their delete events while the
    /// canteen row still exists.
    #[instrument(skip(self), fields(caller = %principal.user_id))]
    pub async fn remove_canteen(&self, principal: &Principal, canteen_id: CanteenId) -> Result<CascadeReport, SystemError> {
        let canteen = self.canteen_client.require_owned(principal, canteen_id).await?;

        let orders = self.order_client.purge(OrderScope::Canteen(canteen.id.clone())).await?;
        let menu_items = self.menu_client.remove_canteen_items(canteen.id.clone()).await?;
        self.canteen_client.remove_canteen_row(canteen.id.clone()).await?;

        let report = CascadeReport {
            canteens: 1,
            menu_items: menu_items.len(),
            orders: orders.len(),
        };
        info!(canteen_id = %canteen.id, ?report, "Canteen removed");
        Ok(report)
    }

    /// Deletes the caller's own account.
    ///
    /// A student's orders go with it. A vendor's canteens are removed with
    /// their menus and orders.
    #[instrument(skip(self), fields(caller = %principal.user_id))]
    pub async fn remove_account(&self, principal: &Principal, user_id: UserId) -> Result<CascadeReport, SystemError> {
        if !authz::can_edit_profile(principal, &user_id) {
            return Err(ProfileError::Unauthorized("Accounts can only be removed by their owner".to_string()).into());
        }
        let profile = self.profile_client.get_profile(user_id.clone()).await?;
        let owner = Principal::from(&profile);

        let mut report = CascadeReport::default();
        match profile.role {
            Role::Student => {
                report.orders = self.order_client.purge(OrderScope::Student(user_id.clone())).await?.len();
            }
            Role::Vendor => {
                for canteen in self.canteen_client.find_by_vendor(user_id.clone()).await? {
                    let removed = self.remove_canteen(&owner, canteen.id).await?;
                    report.canteens += removed.canteens;
                    report.menu_items += removed.menu_items;
                    report.orders += removed.orders;
                }
            }
        }

        self.profile_client.remove_profile(user_id).await?;
        info!(?report, "Account removed");
        Ok(report)
    }

    /// Stops every actor and waits for every task, even when some of them
    /// fail. The first failure is reported.
    pub async fn shutdown(self) -> Result<(), SystemError> {
        info!("Shutting down system...");

        // Orders first: the service closes the change feed on its way out.
        let sent: [Result<(), SystemError>; 4] = [
            self.order_client.shutdown().await.map_err(SystemError::from),
            self.menu_client.shutdown().await.map_err(SystemError::from),
            self.canteen_client.shutdown().await.map_err(SystemError::from),
            self.profile_client.shutdown().await.map_err(SystemError::from),
        ];
        let mut first_error = None;
        for result in sent {
            if let Err(e) = result {
                warn!(error = %e, "Shutdown request not delivered");
                first_error.get_or_insert(e);
            }
        }

        for handle in self.handles {
            if let Err(e) = handle.await {
                error!("Actor task failed: {:?}", e);
                first_error.get_or_insert(SystemError::TaskFailed(e.to_string()));
            }
        }

        if let Some(e) = first_error {
            return Err(e);
        }

        info!("System shutdown complete.");
        Ok(())
    }
}
