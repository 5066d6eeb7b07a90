//! Document store: the `users`, `stores`, and `ratings` collections.
//!
//! Queries are equality lookups only. Ordering, searching, and aggregation
//! happen in memory on the loaded records.
//!
//! # Backends
//!
//! - [`postgres::PgDocumentStore`] - one table per collection
//! - [`memory::MemoryDocumentStore`] - process-local maps for development and tests
//!
//! # Migrations
//!
//! Migrations are stored in `crates/web/migrations/` and run via:
//! ```bash
//! cargo run -p store-ratings-cli -- migrate
//! ```

pub mod memory;
pub mod postgres;

use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use secrecy::ExposeSecret;
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use thiserror::Error;

use store_ratings_core::{RatingId, StoreId, UserId};

use crate::models::{NewStore, Rating, Store, UpsertOutcome, User, UserUpdate};

pub use memory::MemoryDocumentStore;
pub use postgres::PgDocumentStore;

/// Errors that can occur during repository operations.
#[derive(Debug, Error)]
pub enum RepositoryError {
    /// Database error from sqlx.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Data in the database is corrupted or invalid.
    #[error("data corruption: {0}")]
    DataCorruption(String),

    /// Requested entity was not found.
    #[error("not found")]
    NotFound,

    /// Constraint violation (e.g., a second rating for the same store).
    #[error("constraint violation: {0}")]
    Conflict(String),
}

/// Typed access to the three collections.
///
/// Implementations only need equality filters; everything else is done by
/// callers on the returned vectors.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Check the backend is reachable.
    async fn ping(&self) -> Result<(), RepositoryError>;

    // -------------------------------------------------------------------------
    // users
    // -------------------------------------------------------------------------

    async fn get_user(&self, id: UserId) -> Result<Option<User>, RepositoryError>;

    async fn list_users(&self) -> Result<Vec<User>, RepositoryError>;

    /// Write a profile under its identity's uid, replacing any existing one.
    async fn put_user(&self, user: &User) -> Result<(), RepositoryError>;

    /// Change name, address, and role of an existing profile.
    ///
    /// Returns `RepositoryError::NotFound` if no profile has this id.
    async fn update_user(&self, id: UserId, update: &UserUpdate) -> Result<User, RepositoryError>;

    // -------------------------------------------------------------------------
    // stores
    // -------------------------------------------------------------------------

    async fn list_stores(&self) -> Result<Vec<Store>, RepositoryError>;

    async fn get_store(&self, id: StoreId) -> Result<Option<Store>, RepositoryError>;

    /// First store whose owner is `owner_id`.
    async fn find_store_by_owner(&self, owner_id: UserId) -> Result<Option<Store>, RepositoryError>;

    async fn insert_store(&self, store: &NewStore) -> Result<Store, RepositoryError>;

    // -------------------------------------------------------------------------
    // ratings
    // -------------------------------------------------------------------------

    async fn list_ratings(&self) -> Result<Vec<Rating>, RepositoryError>;

    async fn ratings_for_store(&self, store_id: StoreId) -> Result<Vec<Rating>, RepositoryError>;

    /// The rating `user_id` left on `store_id`, if any.
    async fn find_rating(
        &self,
        user_id: UserId,
        store_id: StoreId,
    ) -> Result<Option<Rating>, RepositoryError>;

    /// Returns `RepositoryError::Conflict` if the backend already holds a
    /// rating for the same user and store.
    async fn insert_rating(&self, rating: &Rating) -> Result<(), RepositoryError>;

    async fn update_rating_value(
        &self,
        id: RatingId,
        value: i32,
        updated_at: DateTime<Utc>,
    ) -> Result<(), RepositoryError>;

    /// Insert or update the rating of `user_id` for `store_id`.
    ///
    /// Looks up the existing rating first. If found, its value and
    /// `updated_at` change; otherwise a new rating is inserted. When the
    /// insert loses a race against a concurrent one, the update branch runs
    /// once against the winner.
    async fn upsert_rating(
        &self,
        user_id: UserId,
        store_id: StoreId,
        value: i32,
        now: DateTime<Utc>,
    ) -> Result<UpsertOutcome, RepositoryError> {
        if let Some(existing) = self.find_rating(user_id, store_id).await? {
            self.update_rating_value(existing.id, value, now).await?;
            return Ok(UpsertOutcome::Updated);
        }

        match self
            .insert_rating(&Rating::new(user_id, store_id, value, now))
            .await
        {
            Ok(()) => Ok(UpsertOutcome::Created),
            Err(RepositoryError::Conflict(_)) => {
                let existing = self
                    .find_rating(user_id, store_id)
                    .await?
                    .ok_or(RepositoryError::NotFound)?;
                self.update_rating_value(existing.id, value, now).await?;
                Ok(UpsertOutcome::Updated)
            }
            Err(e) => Err(e),
        }
    }

    // -------------------------------------------------------------------------
    // counts
    // -------------------------------------------------------------------------

    async fn count_users(&self) -> Result<i64, RepositoryError>;

    async fn count_stores(&self) -> Result<i64, RepositoryError>;

    async fn count_ratings(&self) -> Result<i64, RepositoryError>;
}

/// Create a `PostgreSQL` connection pool with sensible defaults.
///
/// # Arguments
///
/// * `database_url` - `PostgreSQL` connection string (wrapped in `SecretString`)
///
/// # Errors
///
/// Returns `sqlx::Error` if the connection cannot be established.
pub async fn create_pool(database_url: &secrecy::SecretString) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(10)
        .min_connections(2)
        .acquire_timeout(Duration::from_secs(10))
        .connect(database_url.expose_secret())
        .await
}

/// Map a unique-index violation to `RepositoryError::Conflict`.
pub(crate) fn map_unique_violation(e: sqlx::Error, what: &str) -> RepositoryError {
    if let sqlx::Error::Database(ref db_err) = e
        && db_err.is_unique_violation()
    {
        return RepositoryError::Conflict(format!("{what} already exists"));
    }
    RepositoryError::Database(e)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::atomic::{AtomicBool, Ordering};

    use super::*;

    /// Delegates to the memory store but hides the existing rating from the
    /// first lookup, the way a concurrent insert would.
    struct LateWriter {
        inner: MemoryDocumentStore,
        hide_next_lookup: AtomicBool,
    }

    #[async_trait]
    impl DocumentStore for LateWriter {
        async fn ping(&self) -> Result<(), RepositoryError> {
            self.inner.ping().await
        }
        async fn get_user(&self, id: UserId) -> Result<Option<User>, RepositoryError> {
            self.inner.get_user(id).await
        }
        async fn list_users(&self) -> Result<Vec<User>, RepositoryError> {
            self.inner.list_users().await
        }
        async fn put_user(&self, user: &User) -> Result<(), RepositoryError> {
            self.inner.put_user(user).await
        }
        async fn update_user(
            &self,
            id: UserId,
            update: &UserUpdate,
        ) -> Result<User, RepositoryError> {
            self.inner.update_user(id, update).await
        }
        async fn list_stores(&self) -> Result<Vec<Store>, RepositoryError> {
            self.inner.list_stores().await
        }
        async fn get_store(&self, id: StoreId) -> Result<Option<Store>, RepositoryError> {
            self.inner.get_store(id).await
        }
        async fn find_store_by_owner(
            &self,
            owner_id: UserId,
        ) -> Result<Option<Store>, RepositoryError> {
            self.inner.find_store_by_owner(owner_id).await
        }
        async fn insert_store(&self, store: &NewStore) -> Result<Store, RepositoryError> {
            self.inner.insert_store(store).await
        }
        async fn list_ratings(&self) -> Result<Vec<Rating>, RepositoryError> {
            self.inner.list_ratings().await
        }
        async fn ratings_for_store(
            &self,
            store_id: StoreId,
        ) -> Result<Vec<Rating>, RepositoryError> {
            self.inner.ratings_for_store(store_id).await
        }
        async fn find_rating(
            &self,
            user_id: UserId,
            store_id: StoreId,
        ) -> Result<Option<Rating>, RepositoryError> {
            if self.hide_next_lookup.swap(false, Ordering::SeqCst) {
                return Ok(None);
            }
            self.inner.find_rating(user_id, store_id).await
        }
        async fn insert_rating(&self, rating: &Rating) -> Result<(), RepositoryError> {
            self.inner.insert_rating(rating).await
        }
        async fn update_rating_value(
            &self,
            id: RatingId,
            value: i32,
            updated_at: DateTime<Utc>,
        ) -> Result<(), RepositoryError> {
            self.inner.update_rating_value(id, value, updated_at).await
        }
        async fn count_users(&self) -> Result<i64, RepositoryError> {
            self.inner.count_users().await
        }
        async fn count_stores(&self) -> Result<i64, RepositoryError> {
            self.inner.count_stores().await
        }
        async fn count_ratings(&self) -> Result<i64, RepositoryError> {
            self.inner.count_ratings().await
        }
    }

    #[tokio::test]
    async fn test_default_upsert_falls_back_to_update_on_conflict() {
        let db = LateWriter {
            inner: MemoryDocumentStore::new(),
            hide_next_lookup: AtomicBool::new(false),
        };
        let user = UserId::generate();
        let store = StoreId::generate();

        assert_eq!(
            db.upsert_rating(user, store, 2, Utc::now()).await.unwrap(),
            UpsertOutcome::Created
        );

        db.hide_next_lookup.store(true, Ordering::SeqCst);
        assert_eq!(
            db.upsert_rating(user, store, 4, Utc::now()).await.unwrap(),
            UpsertOutcome::Updated
        );

        let ratings = db.ratings_for_store(store).await.unwrap();
        assert_eq!(ratings.len(), 1);
        assert_eq!(ratings.first().map(|r| r.value), Some(4));
    }
}
