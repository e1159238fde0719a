use chrono::Utc;

use super::actions::{MenuAction, MenuActionResult};
use crate::actor_framework::Entity;
use crate::domain::money::validate_price;
use crate::domain::{MenuItem, MenuItemCreate, MenuItemId, MenuItemPatch};

impl Entity for MenuItem {
    type Id = MenuItemId;
    type CreateParams = MenuItemCreate;
    type Patch = MenuItemPatch;
    type Action = MenuAction;
    type ActionResult = MenuActionResult;

    fn id(&self) -> &MenuItemId {
        &self.id
    }

    /// New items start out available.
    fn from_create_params(id: MenuItemId, params: MenuItemCreate) -> Result<Self, String> {
        let name = params.name.trim().to_string();
        if name.is_empty() {
            return Err("Menu item name cannot be blank".to_string());
        }
        Ok(Self {
            id,
            canteen_id: params.canteen_id,
            name,
            description: params.description,
            price: validate_price(params.price)?,
            is_available: true,
            image_url: params.image_url,
            created_at: Utc::now(),
        })
    }

    /// Applies an edit. Price changes never touch orders already placed,
    /// which carry their own copy.
    fn on_update(&mut self, patch: MenuItemPatch) -> Result<(), String> {
        // Validate everything before mutating so a bad patch changes nothing.
        let price = patch.price.map(validate_price).transpose()?;
        let name = match patch.name {
            Some(name) if name.trim().is_empty() => return Err("Menu item name cannot be blank".to_string()),
            Some(name) => Some(name.trim().to_string()),
            None => None,
        };

        if let Some(name) = name {
            self.name = name;
        }
        if let Some(price) = price {
            self.price = price;
        }
        if let Some(description) = patch.description {
            self.description = Some(description);
        }
        if let Some(image_url) = patch.image_url {
            self.image_url = Some(image_url);
        }
        Ok(())
    }

    fn handle_action(&mut self, action: MenuAction) -> Result<MenuActionResult, String> {
        match action {
            MenuAction::SetAvailable(available) => {
                let changed = self.is_available != available;
                self.is_available = available;
                Ok(MenuActionResult::SetAvailable(changed))
            }
        }
    }
}
