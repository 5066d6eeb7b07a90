//! Rating records (`ratings` collection).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use store_ratings_core::{RatingId, StoreId, UserId};

/// One user's star rating of one store.
///
/// At most one rating exists per (`user_id`, `store_id`); resubmitting
/// updates `value` and `updated_at` in place.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rating {
    pub id: RatingId,
    pub store_id: StoreId,
    pub user_id: UserId,
    pub value: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
}

impl Rating {
    /// A fresh rating, never updated.
    #[must_use]
    pub fn new(user_id: UserId, store_id: StoreId, value: i32, now: DateTime<Utc>) -> Self {
        Self {
            id: RatingId::generate(),
            store_id,
            user_id,
            value,
            created_at: now,
            updated_at: None,
        }
    }

    /// Most recent write time.
    #[must_use]
    pub fn last_changed(&self) -> DateTime<Utc> {
        self.updated_at.unwrap_or(self.created_at)
    }
}

/// Which branch a rating upsert took.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpsertOutcome {
    Created,
    Updated,
}
