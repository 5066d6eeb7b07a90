//! Store records (`stores` collection).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use store_ratings_core::{Email, StoreId, UserId};

/// A rateable store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Store {
    pub id: StoreId,
    pub name: String,
    pub email: Email,
    pub address: String,
    /// Profile of the owning store owner. Not checked on write.
    pub owner_id: Option<UserId>,
    pub created_at: DateTime<Utc>,
}

/// Input for creating a store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewStore {
    pub name: String,
    pub email: Email,
    pub address: String,
    pub owner_id: Option<UserId>,
}
