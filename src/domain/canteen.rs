use chrono::{DateTime, Utc};

use super::{CanteenId, UserId};

/// A canteen run by a single vendor.
#[derive(Debug, Clone, PartialEq)]
pub struct Canteen {
    pub id: CanteenId,
    pub name: String,
    pub location: String,
    pub vendor_id: UserId,
    pub image_url: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// What a vendor fills in when opening a canteen.
#[derive(Debug, Clone)]
pub struct NewCanteen {
    pub name: String,
    pub location: String,
    pub image_url: Option<String>,
}

impl NewCanteen {
    pub fn new(name: impl Into<String>, location: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            location: location.into(),
            image_url: None,
        }
    }
}

/// Payload for creating a canteen row. The owner comes from the caller,
/// never from the form.
#[derive(Debug, Clone)]
pub struct CanteenCreate {
    pub vendor_id: UserId,
    pub name: String,
    pub location: String,
    pub image_url: Option<String>,
}

/// Payload for updating an existing canteen.
#[derive(Debug, Clone, Default)]
pub struct CanteenPatch {
    pub name: Option<String>,
    pub location: Option<String>,
    pub image_url: Option<String>,
}
