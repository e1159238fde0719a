use tracing::{debug, info, instrument, warn};

use crate::actor_framework::{ResourceClient, RowFilter};
use crate::authz;
use crate::domain::{Principal, Profile, ProfilePatch, SignUp, UserId};
use crate::impl_basic_client;
use crate::profile_actor::ProfileError;

/// Client for the profiles table.
#[derive(Clone)]
pub struct ProfileClient {
    inner: ResourceClient<Profile>,
}

impl_basic_client!(ProfileClient, Profile, ProfileError, profile);

impl ProfileClient {
    /// Creates the account's profile row from its sign-up metadata.
    #[instrument(skip(self, sign_up), fields(email = %sign_up.email, role = %sign_up.role))]
    pub async fn register(&self, sign_up: SignUp) -> Result<Profile, ProfileError> {
        debug!("Sending request");
        self.ensure_email_free(&sign_up.email, None).await?;

        let id = self.inner.create(sign_up).await?;
        info!(user_id = %id, "Account registered");
        self.get_profile(id).await
    }

    /// Resolves who the caller is from the stored role.
    #[instrument(skip(self))]
    pub async fn principal(&self, user_id: UserId) -> Result<Principal, ProfileError> {
        let profile = self.get_profile(user_id).await?;
        Ok(Principal::from(&profile))
    }

    #[instrument(skip(self, patch), fields(caller = %principal.user_id))]
    pub async fn update_profile(
        &self,
        principal: &Principal,
        id: UserId,
        patch: ProfilePatch,
    ) -> Result<Profile, ProfileError> {
        if !authz::can_edit_profile(principal, &id) {
            warn!(profile_id = %id, "Refusing to edit someone else's profile");
            return Err(ProfileError::Unauthorized("Profiles can only be edited by their owner".to_string()));
        }
        if let Some(email) = &patch.email {
            self.ensure_email_free(email, Some(id.clone())).await?;
        }
        debug!("Sending request");
        self.inner.update(id, patch).await.map_err(ProfileError::from)
    }

    /// Emails are unique regardless of case. `owner` is skipped so a user
    /// can re-submit their own address.
    async fn ensure_email_free(&self, email: &str, owner: Option<UserId>) -> Result<(), ProfileError> {
        let email = email.trim().to_lowercase();
        let taken = self
            .inner
            .list(RowFilter::new(move |p: &Profile| {
                p.email.to_lowercase() == email && owner.as_ref() != Some(&p.id)
            }))
            .await?;
        if !taken.is_empty() {
            warn!("Email already registered");
            return Err(ProfileError::ValidationError("Email already registered".to_string()));
        }
        Ok(())
    }

    pub(crate) async fn remove_profile(&self, id: UserId) -> Result<(), ProfileError> {
        self.inner.delete(id).await.map_err(ProfileError::from)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::actor_framework::ResourceActor;
    use crate::domain::Role;
    use std::sync::atomic::{AtomicU64, Ordering};
    use std::sync::Arc;

    fn start() -> ProfileClient {
        let counter = Arc::new(AtomicU64::new(1));
        let next_id = move || format!("user_{}", counter.fetch_add(1, Ordering::SeqCst));
        let (actor, inner) = ResourceActor::<Profile>::new("profiles", 8, next_id);
        tokio::spawn(actor.run());
        ProfileClient::new(inner)
    }

    #[tokio::test]
    async fn test_register_and_resolve_principal() {
        let client = start();
        let profile = client.register(SignUp::new("asha@campus.edu", Some("Asha"), Role::Student)).await.unwrap();

        let principal = client.principal(profile.id.clone()).await.unwrap();
        assert_eq!(principal, Principal::new(profile.id, Role::Student));

        let err = client.register(SignUp::new("ASHA@campus.edu", None, Role::Vendor)).await.unwrap_err();
        assert!(matches!(err, ProfileError::ValidationError(_)));
    }

    #[tokio::test]
    async fn test_update_own_profile_only() {
        let client = start();
        let asha = client.register(SignUp::new("asha@campus.edu", None, Role::Student)).await.unwrap();
        let ravi = client.register(SignUp::new("ravi@campus.edu", None, Role::Student)).await.unwrap();
        let as_asha = Principal::from(&asha);

        let patch = ProfilePatch { name: Some("Asha K".into()), email: None };
        let updated = client.update_profile(&as_asha, asha.id.clone(), patch).await.unwrap();
        assert_eq!(updated.name, "Asha K");

        let patch = ProfilePatch { name: Some("Nope".into()), email: None };
        let err = client.update_profile(&as_asha, ravi.id.clone(), patch).await.unwrap_err();
        assert!(matches!(err, ProfileError::Unauthorized(_)));
        assert_eq!(client.get_profile(ravi.id).await.unwrap().name, "ravi@campus.edu");
    }

    #[tokio::test]
    async fn test_update_cannot_take_another_email() {
        let client = start();
        let asha = client.register(SignUp::new("asha@campus.edu", None, Role::Student)).await.unwrap();
        client.register(SignUp::new("ravi@campus.edu", None, Role::Student)).await.unwrap();
        let as_asha = Principal::from(&asha);

        let patch = ProfilePatch { name: None, email: Some("Ravi@Campus.edu".into()) };
        let err = client.update_profile(&as_asha, asha.id.clone(), patch).await.unwrap_err();
        assert_eq!(err, ProfileError::ValidationError("Email already registered".to_string()));
        assert_eq!(client.get_profile(asha.id.clone()).await.unwrap().email, "asha@campus.edu");

        // Own address, different case, is fine.
        let patch = ProfilePatch { name: None, email: Some("ASHA@campus.edu".into()) };
        let updated = client.update_profile(&as_asha, asha.id.clone(), patch).await.unwrap();
        assert_eq!(updated.email, "ASHA@campus.edu");
    }

    #[tokio::test]
    async fn test_unknown_principal_is_not_found() {
        let client = start();
        let err = client.principal("ghost".into()).await.unwrap_err();
        assert_eq!(err, ProfileError::NotFound("ghost".into()));
    }
}
