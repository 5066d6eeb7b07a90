//! In-memory document store for development and tests.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::RwLock;

use store_ratings_core::{RatingId, StoreId, UserId};

use super::{DocumentStore, RepositoryError};
use crate::models::{NewStore, Rating, Store, UpsertOutcome, User, UserUpdate};

#[derive(Default)]
struct Collections {
    users: HashMap<UserId, User>,
    // Vec keeps insertion order so "first store of an owner" is stable.
    stores: Vec<Store>,
    ratings: Vec<Rating>,
}

/// Document store holding every collection behind one `RwLock`.
#[derive(Default)]
pub struct MemoryDocumentStore {
    inner: RwLock<Collections>,
}

impl MemoryDocumentStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

fn count(len: usize) -> i64 {
    i64::try_from(len).unwrap_or(i64::MAX)
}

#[async_trait]
impl DocumentStore for MemoryDocumentStore {
    async fn ping(&self) -> Result<(), RepositoryError> {
        Ok(())
    }

    async fn get_user(&self, id: UserId) -> Result<Option<User>, RepositoryError> {
        Ok(self.inner.read().await.users.get(&id).cloned())
    }

    async fn list_users(&self) -> Result<Vec<User>, RepositoryError> {
        let mut users: Vec<User> = self.inner.read().await.users.values().cloned().collect();
        users.sort_by_key(|u| u.created_at);
        Ok(users)
    }

    async fn put_user(&self, user: &User) -> Result<(), RepositoryError> {
        self.inner
            .write()
            .await
            .users
            .insert(user.id, user.clone());
        Ok(())
    }

    async fn update_user(&self, id: UserId, update: &UserUpdate) -> Result<User, RepositoryError> {
        let mut inner = self.inner.write().await;
        let user = inner.users.get_mut(&id).ok_or(RepositoryError::NotFound)?;
        user.name.clone_from(&update.name);
        user.address.clone_from(&update.address);
        user.role = update.role;
        Ok(user.clone())
    }

    async fn list_stores(&self) -> Result<Vec<Store>, RepositoryError> {
        Ok(self.inner.read().await.stores.clone())
    }

    async fn get_store(&self, id: StoreId) -> Result<Option<Store>, RepositoryError> {
        Ok(self
            .inner
            .read()
            .await
            .stores
            .iter()
            .find(|s| s.id == id)
            .cloned())
    }

    async fn find_store_by_owner(&self, owner_id: UserId) -> Result<Option<Store>, RepositoryError> {
        Ok(self
            .inner
            .read()
            .await
            .stores
            .iter()
            .find(|s| s.owner_id == Some(owner_id))
            .cloned())
    }

    async fn insert_store(&self, store: &NewStore) -> Result<Store, RepositoryError> {
        let created = Store {
            id: StoreId::generate(),
            name: store.name.clone(),
            email: store.email.clone(),
            address: store.address.clone(),
            owner_id: store.owner_id,
            created_at: Utc::now(),
        };
        self.inner.write().await.stores.push(created.clone());
        Ok(created)
    }

    async fn list_ratings(&self) -> Result<Vec<Rating>, RepositoryError> {
        Ok(self.inner.read().await.ratings.clone())
    }

    async fn ratings_for_store(&self, store_id: StoreId) -> Result<Vec<Rating>, RepositoryError> {
        Ok(self
            .inner
            .read()
            .await
            .ratings
            .iter()
            .filter(|r| r.store_id == store_id)
            .cloned()
            .collect())
    }

    async fn find_rating(
        &self,
        user_id: UserId,
        store_id: StoreId,
    ) -> Result<Option<Rating>, RepositoryError> {
        Ok(self
            .inner
            .read()
            .await
            .ratings
            .iter()
            .find(|r| r.user_id == user_id && r.store_id == store_id)
            .cloned())
    }

    async fn insert_rating(&self, rating: &Rating) -> Result<(), RepositoryError> {
        let mut inner = self.inner.write().await;
        if inner
            .ratings
            .iter()
            .any(|r| r.user_id == rating.user_id && r.store_id == rating.store_id)
        {
            return Err(RepositoryError::Conflict(
                "rating for this user and store already exists".to_owned(),
            ));
        }
        inner.ratings.push(rating.clone());
        Ok(())
    }

    async fn update_rating_value(
        &self,
        id: RatingId,
        value: i32,
        updated_at: DateTime<Utc>,
    ) -> Result<(), RepositoryError> {
        let mut inner = self.inner.write().await;
        let rating = inner
            .ratings
            .iter_mut()
            .find(|r| r.id == id)
            .ok_or(RepositoryError::NotFound)?;
        rating.value = value;
        rating.updated_at = Some(updated_at);
        Ok(())
    }

    async fn upsert_rating(
        &self,
        user_id: UserId,
        store_id: StoreId,
        value: i32,
        now: DateTime<Utc>,
    ) -> Result<UpsertOutcome, RepositoryError> {
        // Lookup and write happen under the same write guard.
        let mut inner = self.inner.write().await;
        if let Some(existing) = inner
            .ratings
            .iter_mut()
            .find(|r| r.user_id == user_id && r.store_id == store_id)
        {
            existing.value = value;
            existing.updated_at = Some(now);
            return Ok(UpsertOutcome::Updated);
        }
        inner
            .ratings
            .push(Rating::new(user_id, store_id, value, now));
        Ok(UpsertOutcome::Created)
    }

    async fn count_users(&self) -> Result<i64, RepositoryError> {
        Ok(count(self.inner.read().await.users.len()))
    }

    async fn count_stores(&self) -> Result<i64, RepositoryError> {
        Ok(count(self.inner.read().await.stores.len()))
    }

    async fn count_ratings(&self) -> Result<i64, RepositoryError> {
        Ok(count(self.inner.read().await.ratings.len()))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use store_ratings_core::{Email, Role};

    use super::*;

    fn profile(name: &str, role: Role) -> User {
        User {
            id: UserId::generate(),
            name: name.to_owned(),
            email: Email::parse("someone@example.com").unwrap(),
            address: "1 Main St".to_owned(),
            role,
            created_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn test_upsert_creates_then_updates_one_rating() {
        let db = MemoryDocumentStore::new();
        let user = UserId::generate();
        let store = StoreId::generate();

        let first = db.upsert_rating(user, store, 3, Utc::now()).await.unwrap();
        assert_eq!(first, UpsertOutcome::Created);
        let created = db.find_rating(user, store).await.unwrap().unwrap();
        assert_eq!(created.updated_at, None);

        let second = db.upsert_rating(user, store, 5, Utc::now()).await.unwrap();
        assert_eq!(second, UpsertOutcome::Updated);

        let ratings = db.ratings_for_store(store).await.unwrap();
        assert_eq!(ratings.len(), 1);
        let rating = ratings.first().unwrap();
        assert_eq!(rating.value, 5);
        assert!(rating.updated_at.is_some());
        assert_eq!(rating.created_at, created.created_at);
        assert_eq!(rating.id, created.id);
    }

    #[tokio::test]
    async fn test_insert_rating_rejects_duplicate_pair() {
        let db = MemoryDocumentStore::new();
        let user = UserId::generate();
        let store = StoreId::generate();

        db.insert_rating(&Rating::new(user, store, 2, Utc::now()))
            .await
            .unwrap();
        let err = db
            .insert_rating(&Rating::new(user, store, 4, Utc::now()))
            .await
            .unwrap_err();
        assert!(matches!(err, RepositoryError::Conflict(_)));
    }

    #[tokio::test]
    async fn test_update_user_changes_only_editable_fields() {
        let db = MemoryDocumentStore::new();
        let user = profile("Original Name For The Test", Role::User);
        db.put_user(&user).await.unwrap();

        let updated = db
            .update_user(
                user.id,
                &UserUpdate {
                    name: "Renamed Person For The Test".to_owned(),
                    address: "2 Side St".to_owned(),
                    role: Role::StoreOwner,
                },
            )
            .await
            .unwrap();

        assert_eq!(updated.email, user.email);
        assert_eq!(updated.role, Role::StoreOwner);
        assert_eq!(updated.address, "2 Side St");
    }

    #[tokio::test]
    async fn test_update_missing_user_is_not_found() {
        let db = MemoryDocumentStore::new();
        let err = db
            .update_user(
                UserId::generate(),
                &UserUpdate {
                    name: String::new(),
                    address: String::new(),
                    role: Role::User,
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(err, RepositoryError::NotFound));
    }

    #[tokio::test]
    async fn test_find_store_by_owner_returns_first_match() {
        let db = MemoryDocumentStore::new();
        let owner = UserId::generate();
        let email = Email::parse("shop@example.com").unwrap();
        let first = db
            .insert_store(&NewStore {
                name: "First".to_owned(),
                email: email.clone(),
                address: "A".to_owned(),
                owner_id: Some(owner),
            })
            .await
            .unwrap();
        db.insert_store(&NewStore {
            name: "Second".to_owned(),
            email,
            address: "B".to_owned(),
            owner_id: Some(owner),
        })
        .await
        .unwrap();

        let found = db.find_store_by_owner(owner).await.unwrap().unwrap();
        assert_eq!(found.id, first.id);
        assert!(db.find_store_by_owner(UserId::generate()).await.unwrap().is_none());
        assert_eq!(db.count_stores().await.unwrap(), 2);
    }
}
