use chrono::Utc;

use crate::actor_framework::Entity;
use crate::domain::{Canteen, CanteenCreate, CanteenId, CanteenPatch};

fn non_blank(field: &str, value: String) -> Result<String, String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        Err(format!("Canteen {} cannot be blank", field))
    } else {
        Ok(trimmed.to_string())
    }
}

impl Entity for Canteen {
    type Id = CanteenId;
    type CreateParams = CanteenCreate;
    type Patch = CanteenPatch;
    type Action = ();
    type ActionResult = ();

    fn id(&self) -> &CanteenId {
        &self.id
    }

    fn from_create_params(id: CanteenId, params: CanteenCreate) -> Result<Self, String> {
        Ok(Self {
            id,
            name: non_blank("name", params.name)?,
            location: non_blank("location", params.location)?,
            vendor_id: params.vendor_id,
            image_url: params.image_url,
            created_at: Utc::now(),
        })
    }

    /// Ownership (`vendor_id`) is not patchable.
    fn on_update(&mut self, patch: CanteenPatch) -> Result<(), String> {
        let name = patch.name.map(|name| non_blank("name", name)).transpose()?;
        let location = patch.location.map(|location| non_blank("location", location)).transpose()?;

        if let Some(name) = name {
            self.name = name;
        }
        if let Some(location) = location {
            self.location = location;
        }
        if let Some(image_url) = patch.image_url {
            self.image_url = Some(image_url);
        }
        Ok(())
    }

    fn handle_action(&mut self, _action: ()) -> Result<(), String> {
        Ok(())
    }
}
