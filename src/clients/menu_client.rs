use tracing::{debug, error, info, instrument, warn};

use crate::actor_framework::{ResourceClient, RowFilter};
use crate::clients::CanteenClient;
use crate::domain::money::validate_price;
use crate::domain::{CanteenId, MenuItem, MenuItemCreate, MenuItemId, MenuItemPatch, Principal};
use crate::impl_client_methods;
use crate::menu_actor::{MenuAction, MenuActionResult, MenuError};

/// Client for the menu_items table.
///
/// Every write resolves the item's canteen first and checks the caller owns
/// it.
#[derive(Clone)]
pub struct MenuClient {
    inner: ResourceClient<MenuItem>,
    canteen_client: CanteenClient,
}

impl MenuClient {
    pub fn new(inner: ResourceClient<MenuItem>, canteen_client: CanteenClient) -> Self {
        Self { inner, canteen_client }
    }

    #[instrument(skip(self, item), fields(caller = %principal.user_id, canteen_id = %item.canteen_id, name = %item.name))]
    pub async fn add_item(&self, principal: &Principal, item: MenuItemCreate) -> Result<MenuItem, MenuError> {
        // Cheap input checks go first so bad forms never reach an actor.
        validate_price(item.price).map_err(MenuError::ValidationError)?;
        if item.name.trim().is_empty() {
            return Err(MenuError::ValidationError("Menu item name cannot be blank".to_string()));
        }

        self.canteen_client.require_owned(principal, item.canteen_id.clone()).await?;

        debug!("Sending request");
        let id = self.inner.create(item).await?;
        info!(menu_item_id = %id, "Menu item added");
        self.get_menu_item(id).await
    }

    #[instrument(skip(self, patch), fields(caller = %principal.user_id))]
    pub async fn update_item(
        &self,
        principal: &Principal,
        id: MenuItemId,
        patch: MenuItemPatch,
    ) -> Result<MenuItem, MenuError> {
        if let Some(price) = patch.price {
            validate_price(price).map_err(MenuError::ValidationError)?;
        }
        self.require_owned_item(principal, id.clone()).await?;
        debug!("Sending request");
        self.inner.update(id, patch).await.map_err(MenuError::from)
    }

    /// Marks an item orderable or sold out. Returns whether the flag changed.
    #[instrument(skip(self), fields(caller = %principal.user_id))]
    pub async fn set_available(&self, principal: &Principal, id: MenuItemId, available: bool) -> Result<bool, MenuError> {
        self.require_owned_item(principal, id.clone()).await?;
        debug!("Sending request");
        match self.inner.perform_action(id, MenuAction::SetAvailable(available)).await {
            Ok(MenuActionResult::SetAvailable(changed)) => {
                if changed {
                    info!(available, "Availability changed");
                }
                Ok(changed)
            }
            Err(e) => {
                error!(error = %e, "Availability update failed");
                Err(MenuError::from(e))
            }
        }
    }

    #[instrument(skip(self), fields(caller = %principal.user_id))]
    pub async fn remove_item(&self, principal: &Principal, id: MenuItemId) -> Result<(), MenuError> {
        self.require_owned_item(principal, id.clone()).await?;
        debug!("Sending request");
        self.inner.delete(id).await?;
        info!("Menu item removed");
        Ok(())
    }

    /// A canteen's menu by name. Menus are public.
    #[instrument(skip(self))]
    pub async fn list_menu(&self, canteen_id: CanteenId, available_only: bool) -> Result<Vec<MenuItem>, MenuError> {
        debug!("Sending request");
        let mut items = self
            .inner
            .list(RowFilter::new(move |item: &MenuItem| {
                item.canteen_id == canteen_id && (!available_only || item.is_available)
            }))
            .await?;
        items.sort_by(|a, b| a.name.cmp(&b.name).then_with(|| a.id.cmp(&b.id)));
        Ok(items)
    }

    async fn require_owned_item(&self, principal: &Principal, id: MenuItemId) -> Result<MenuItem, MenuError> {
        let item = self.get_menu_item(id).await?;
        self.canteen_client
            .require_owned(principal, item.canteen_id.clone())
            .await
            .inspect_err(|e| warn!(error = %e, menu_item_id = %item.id, "Menu write refused"))?;
        Ok(item)
    }

    /// Cascade step for canteen removal.
    pub(crate) async fn remove_canteen_items(&self, canteen_id: CanteenId) -> Result<Vec<MenuItem>, MenuError> {
        let removed = self
            .inner
            .delete_where(RowFilter::new(move |item: &MenuItem| item.canteen_id == canteen_id))
            .await?;
        Ok(removed)
    }
}

impl_client_methods!(MenuClient, MenuItem, MenuError, menu_item);
