use tracing::{debug, info, instrument, warn};

use crate::actor_framework::{ResourceClient, RowFilter};
use crate::authz;
use crate::canteen_actor::CanteenError;
use crate::clients::ProfileClient;
use crate::domain::{Canteen, CanteenCreate, CanteenId, CanteenPatch, NewCanteen, Principal, UserId};
use crate::impl_client_methods;

/// Client for the canteens table.
///
/// Reads are open to everyone. Creation needs a vendor account; edits need
/// the owning vendor.
#[derive(Clone)]
pub struct CanteenClient {
    inner: ResourceClient<Canteen>,
    profile_client: ProfileClient,
}

impl CanteenClient {
    pub fn new(inner: ResourceClient<Canteen>, profile_client: ProfileClient) -> Self {
        Self { inner, profile_client }
    }

    #[instrument(skip(self, canteen), fields(caller = %principal.user_id, name = %canteen.name))]
    pub async fn create_canteen(&self, principal: &Principal, canteen: NewCanteen) -> Result<Canteen, CanteenError> {
        // The stored role decides, not the one the caller presents.
        let stored = self.profile_client.principal(principal.user_id.clone()).await?;
        if !authz::can_open_canteen(principal) || !authz::can_open_canteen(&stored) {
            warn!("Only vendors can open a canteen");
            return Err(CanteenError::Unauthorized("Only vendors can open a canteen".to_string()));
        }

        debug!("Sending request");
        let payload = CanteenCreate {
            vendor_id: stored.user_id,
            name: canteen.name,
            location: canteen.location,
            image_url: canteen.image_url,
        };
        let id = self.inner.create(payload).await?;
        info!(canteen_id = %id, "Canteen created");
        self.get_canteen(id).await
    }

    /// All canteens, by name.
    #[instrument(skip(self))]
    pub async fn list_canteens(&self) -> Result<Vec<Canteen>, CanteenError> {
        debug!("Sending request");
        let mut canteens = self.inner.list(RowFilter::all()).await?;
        canteens.sort_by(|a, b| a.name.cmp(&b.name).then_with(|| a.id.cmp(&b.id)));
        Ok(canteens)
    }

    /// Canteens owned by `vendor_id`, oldest first.
    #[instrument(skip(self))]
    pub async fn find_by_vendor(&self, vendor_id: UserId) -> Result<Vec<Canteen>, CanteenError> {
        debug!("Sending request");
        let mut canteens = self
            .inner
            .list(RowFilter::new(move |c: &Canteen| c.vendor_id == vendor_id))
            .await?;
        canteens.sort_by(|a, b| a.created_at.cmp(&b.created_at).then_with(|| a.id.cmp(&b.id)));
        Ok(canteens)
    }

    /// The canteen a vendor's dashboard runs against.
    pub async fn canteen_for_vendor(&self, vendor_id: UserId) -> Result<Canteen, CanteenError> {
        self.find_by_vendor(vendor_id.clone())
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| CanteenError::NotFound(format!("no canteen for vendor {}", vendor_id)))
    }

    #[instrument(skip(self, patch), fields(caller = %principal.user_id))]
    pub async fn update_canteen(
        &self,
        principal: &Principal,
        id: CanteenId,
        patch: CanteenPatch,
    ) -> Result<Canteen, CanteenError> {
        self.require_owned(principal, id.clone()).await?;
        debug!("Sending request");
        self.inner.update(id, patch).await.map_err(CanteenError::from)
    }

    /// Loads a canteen and checks that `principal` runs it.
    pub async fn require_owned(&self, principal: &Principal, id: CanteenId) -> Result<Canteen, CanteenError> {
        let canteen = self.get_canteen(id).await?;
        if !authz::can_manage_canteen(principal, &canteen) {
            warn!(canteen_id = %canteen.id, caller = %principal.user_id, "Caller does not own canteen");
            return Err(CanteenError::Unauthorized(format!("Canteen {} belongs to another vendor", canteen.id)));
        }
        Ok(canteen)
    }

    pub(crate) async fn remove_canteen_row(&self, id: CanteenId) -> Result<(), CanteenError> {
        self.inner.delete(id).await.map_err(CanteenError::from)
    }
}

impl_client_methods!(CanteenClient, Canteen, CanteenError, canteen);

#[cfg(test)]
mod tests {
    use super::*;
    use crate::actor_framework::ResourceActor;
    use crate::domain::{Profile, Role, SignUp};
    use std::sync::atomic::{AtomicU64, Ordering};
    use std::sync::Arc;

    fn ids(prefix: &'static str) -> impl Fn() -> String + Send + Sync + 'static {
        let counter = Arc::new(AtomicU64::new(1));
        move || format!("{}_{}", prefix, counter.fetch_add(1, Ordering::SeqCst))
    }

    fn start() -> (ProfileClient, CanteenClient) {
        let (profiles, profile_inner) = ResourceActor::<Profile>::new("profiles", 8, ids("user"));
        let (canteens, canteen_inner) = ResourceActor::<Canteen>::new("canteens", 8, ids("canteen"));
        tokio::spawn(profiles.run());
        tokio::spawn(canteens.run());
        let profile_client = ProfileClient::new(profile_inner);
        (profile_client.clone(), CanteenClient::new(canteen_inner, profile_client))
    }

    #[tokio::test]
    async fn test_only_vendors_open_canteens() {
        let (profiles, canteens) = start();
        let vendor = profiles.register(SignUp::new("v@campus.edu", None, Role::Vendor)).await.unwrap();
        let student = profiles.register(SignUp::new("s@campus.edu", None, Role::Student)).await.unwrap();

        let canteen = canteens
            .create_canteen(&Principal::from(&vendor), NewCanteen::new("Main Canteen", "Block A"))
            .await
            .unwrap();
        assert_eq!(canteen.vendor_id, vendor.id);

        let err = canteens
            .create_canteen(&Principal::from(&student), NewCanteen::new("Fake", "Nowhere"))
            .await
            .unwrap_err();
        assert!(matches!(err, CanteenError::Unauthorized(_)));

        // A student claiming the vendor role is still refused.
        let forged = Principal::new(student.id.clone(), Role::Vendor);
        let err = canteens.create_canteen(&forged, NewCanteen::new("Fake", "Nowhere")).await.unwrap_err();
        assert!(matches!(err, CanteenError::Unauthorized(_)));

        assert_eq!(canteens.list_canteens().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_update_requires_owner() {
        let (profiles, canteens) = start();
        let owner = profiles.register(SignUp::new("a@campus.edu", None, Role::Vendor)).await.unwrap();
        let other = profiles.register(SignUp::new("b@campus.edu", None, Role::Vendor)).await.unwrap();
        let canteen = canteens
            .create_canteen(&Principal::from(&owner), NewCanteen::new("Main Canteen", "Block A"))
            .await
            .unwrap();

        let patch = CanteenPatch { name: Some("Hijacked".into()), ..Default::default() };
        let err = canteens.update_canteen(&Principal::from(&other), canteen.id.clone(), patch).await.unwrap_err();
        assert!(matches!(err, CanteenError::Unauthorized(_)));

        let patch = CanteenPatch { location: Some("Block B".into()), ..Default::default() };
        let updated = canteens.update_canteen(&Principal::from(&owner), canteen.id.clone(), patch).await.unwrap();
        assert_eq!(updated.name, "Main Canteen");
        assert_eq!(updated.location, "Block B");

        assert_eq!(canteens.canteen_for_vendor(owner.id).await.unwrap().id, canteen.id);
        assert!(matches!(
            canteens.canteen_for_vendor(other.id).await.unwrap_err(),
            CanteenError::NotFound(_)
        ));
    }
}
