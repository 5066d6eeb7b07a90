//! Account roles.

use serde::{Deserialize, Serialize};

/// Error returned when a role string is not one of the known roles.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
#[error("invalid role: {0}")]
pub struct RoleParseError(pub String);

/// Role of an account, stored on its profile record.
///
/// Gates which pages a signed-in visitor may open and whether they may rate
/// stores.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[cfg_attr(feature = "postgres", derive(sqlx::Type))]
#[cfg_attr(
    feature = "postgres",
    sqlx(type_name = "user_role", rename_all = "snake_case")
)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    /// Manages users and stores.
    Admin,
    /// Browses and rates stores.
    #[default]
    User,
    /// Sees the feedback left on their own store.
    StoreOwner,
}

impl Role {
    /// Every role, in the order the admin forms list them.
    pub const ALL: [Self; 3] = [Self::User, Self::StoreOwner, Self::Admin];

    /// Stored form (`admin`, `user`, `store_owner`).
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Admin => "admin",
            Self::User => "user",
            Self::StoreOwner => "store_owner",
        }
    }

    /// Human-readable label shown on profile and admin pages.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Admin => "Administrator",
            Self::User => "Normal User",
            Self::StoreOwner => "Store Owner",
        }
    }

    /// Only normal users may submit ratings.
    #[must_use]
    pub const fn can_rate(self) -> bool {
        matches!(self, Self::User)
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Role {
    type Err = RoleParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "admin" => Ok(Self::Admin),
            "user" => Ok(Self::User),
            "store_owner" => Ok(Self::StoreOwner),
            _ => Err(RoleParseError(s.to_owned())),
        }
    }
}
