use chrono::Utc;

use crate::actor_framework::Entity;
use crate::domain::{Profile, ProfilePatch, SignUp, UserId};

fn validate_email(email: &str) -> Result<String, String> {
    let email = email.trim();
    match email.split_once('@') {
        Some((local, domain)) if !local.is_empty() && !domain.is_empty() => Ok(email.to_string()),
        _ => Err(format!("Invalid email address: {}", email)),
    }
}

impl Entity for Profile {
    type Id = UserId;
    type CreateParams = SignUp;
    type Patch = ProfilePatch;
    type Action = ();
    type ActionResult = ();

    fn id(&self) -> &UserId {
        &self.id
    }

    /// Derives the profile row from sign-up metadata.
    ///
    /// The display name falls back to the email address when the sign-up
    /// form left it blank.
    fn from_create_params(id: UserId, params: SignUp) -> Result<Self, String> {
        let email = validate_email(&params.email)?;
        let name = params
            .name
            .map(|name| name.trim().to_string())
            .filter(|name| !name.is_empty())
            .unwrap_or_else(|| email.clone());
        Ok(Self {
            id,
            name,
            email,
            role: params.role,
            created_at: Utc::now(),
        })
    }

    /// Updates the display name and/or email. The role never changes.
    fn on_update(&mut self, patch: ProfilePatch) -> Result<(), String> {
        let name = match patch.name {
            Some(name) if name.trim().is_empty() => return Err("Name cannot be blank".to_string()),
            Some(name) => Some(name.trim().to_string()),
            None => None,
        };
        let email = patch.email.as_deref().map(validate_email).transpose()?;

        if let Some(name) = name {
            self.name = name;
        }
        if let Some(email) = email {
            self.email = email;
        }
        Ok(())
    }

    fn handle_action(&mut self, _action: ()) -> Result<(), String> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Role;

    #[test]
    fn test_profile_from_signup_defaults_name() {
        let profile = Profile::from_create_params("u1".into(), SignUp::new("asha@campus.edu", None, Role::Student)).unwrap();
        assert_eq!(profile.name, "asha@campus.edu");
        assert_eq!(profile.role, Role::Student);

        let profile = Profile::from_create_params("u2".into(), SignUp::new("ravi@campus.edu", Some(" Ravi "), Role::Vendor)).unwrap();
        assert_eq!(profile.name, "Ravi");
    }

    #[test]
    fn test_profile_rejects_bad_email() {
        assert!(Profile::from_create_params("u1".into(), SignUp::new("nobody", None, Role::Student)).is_err());
        assert!(Profile::from_create_params("u1".into(), SignUp::new("@campus.edu", None, Role::Student)).is_err());
    }

    #[test]
    fn test_bad_patch_changes_nothing() {
        let mut profile = Profile::from_create_params("u1".into(), SignUp::new("asha@campus.edu", Some("Asha"), Role::Student)).unwrap();

        let patch = ProfilePatch { name: Some("Changed".into()), email: Some("bogus".into()) };
        assert_eq!(profile.on_update(patch), Err("Invalid email address: bogus".to_string()));
        assert_eq!(profile.name, "Asha");
        assert_eq!(profile.email, "asha@campus.edu");

        let patch = ProfilePatch { name: Some("  ".into()), email: Some("asha.k@campus.edu".into()) };
        assert!(profile.on_update(patch).is_err());
        assert_eq!(profile.email, "asha@campus.edu");
    }
}
