//! User profile records (`users` collection).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use store_ratings_core::{Email, Role, UserId};

/// Profile record of an identity, keyed by the identity's uid.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub id: UserId,
    pub name: String,
    pub email: Email,
    pub address: String,
    pub role: Role,
    pub created_at: DateTime<Utc>,
}

impl User {
    #[must_use]
    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }

    #[must_use]
    pub fn is_store_owner(&self) -> bool {
        self.role == Role::StoreOwner
    }

    #[must_use]
    pub fn is_normal_user(&self) -> bool {
        self.role == Role::User
    }
}

/// Fields an admin may change on an existing profile. Email is read-only.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserUpdate {
    pub name: String,
    pub address: String,
    pub role: Role,
}
