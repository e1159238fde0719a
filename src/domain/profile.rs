use std::fmt;

use chrono::{DateTime, Utc};

use super::UserId;

/// Account role. Every account holds exactly one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Role {
    Student,
    Vendor,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Student => "student",
            Role::Vendor => "vendor",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Represents a registered account.
#[derive(Debug, Clone, PartialEq)]
pub struct Profile {
    pub id: UserId,
    pub name: String,
    pub email: String,
    pub role: Role,
    pub created_at: DateTime<Utc>,
}

/// Sign-up metadata. A profile row is derived from it on registration.
#[derive(Debug, Clone)]
pub struct SignUp {
    pub email: String,
    /// Display name; the email is used when absent.
    pub name: Option<String>,
    pub role: Role,
}

impl SignUp {
    pub fn new(email: impl Into<String>, name: Option<&str>, role: Role) -> Self {
        Self {
            email: email.into(),
            name: name.map(str::to_string),
            role,
        }
    }
}

/// Payload for updating an existing profile.
#[derive(Debug, Clone, Default)]
pub struct ProfilePatch {
    pub name: Option<String>,
    pub email: Option<String>,
}

/// The authenticated caller, with its role resolved from the profile store.
///
/// Every mutating operation takes a `Principal` and runs the matching
/// capability check from [`crate::authz`] before touching any actor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Principal {
    pub user_id: UserId,
    pub role: Role,
}

impl Principal {
    pub fn new(user_id: impl Into<UserId>, role: Role) -> Self {
        Self {
            user_id: user_id.into(),
            role,
        }
    }

    pub fn is_student(&self) -> bool {
        self.role == Role::Student
    }

    pub fn is_vendor(&self) -> bool {
        self.role == Role::Vendor
    }
}

impl From<&Profile> for Principal {
    fn from(profile: &Profile) -> Self {
        Self {
            user_id: profile.id.clone(),
            role: profile.role,
        }
    }
}
