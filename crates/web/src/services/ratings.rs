//! Rating submission and aggregation.
//!
//! The document store only answers equality queries, so every summary here
//! loads the relevant ratings and aggregates them in memory.

use std::collections::{HashMap, HashSet};

use chrono::Utc;

use store_ratings_core::{
    StarBucket, StoreId, UserId, calculate_average_rating, rating_distribution,
};

use crate::db::{DocumentStore, RepositoryError};
use crate::models::{Rating, Store, UpsertOutcome, User};

/// A store with its aggregated rating.
#[derive(Debug, Clone)]
pub struct StoreSummary {
    pub store: Store,
    /// Mean rating rounded to one decimal, 0 without ratings.
    pub average: f64,
    pub rating_count: usize,
}

/// Everything the store detail page shows.
#[derive(Debug, Clone)]
pub struct StoreDetail {
    pub summary: StoreSummary,
    /// Newest first by creation time.
    pub ratings: Vec<Rating>,
    /// The visitor's own rating value, if they rated this store.
    pub own_rating: Option<i32>,
}

/// One row of the store owner's rater table.
#[derive(Debug, Clone)]
pub struct RaterRow {
    pub user_id: UserId,
    pub name: String,
    pub email: String,
    pub value: i32,
    pub rating: Rating,
}

/// The store owner's view of their store.
#[derive(Debug, Clone)]
pub struct OwnerDashboard {
    pub summary: StoreSummary,
    pub unique_raters: usize,
    pub distribution: Vec<StarBucket>,
    pub raters: Vec<RaterRow>,
}

/// Shown in place of a missing rater name.
pub const ANONYMOUS_RATER: &str = "Anonymous";
/// Shown in place of a missing rater email.
pub const MISSING_FIELD: &str = "\u{2014}";

/// Rating operations over a document store.
pub struct RatingService<'a> {
    store: &'a dyn DocumentStore,
}

impl<'a> RatingService<'a> {
    #[must_use]
    pub const fn new(store: &'a dyn DocumentStore) -> Self {
        Self { store }
    }

    /// Record `user_id`'s rating of `store_id`, replacing an earlier one.
    ///
    /// `value` is not range-checked here; callers validate form input first.
    ///
    /// # Errors
    ///
    /// Returns the store's error unchanged.
    pub async fn submit(
        &self,
        user_id: UserId,
        store_id: StoreId,
        value: i32,
    ) -> Result<UpsertOutcome, RepositoryError> {
        let outcome = self
            .store
            .upsert_rating(user_id, store_id, value, Utc::now())
            .await?;
        tracing::info!(
            user_id = %user_id,
            store_id = %store_id,
            value,
            outcome = ?outcome,
            "Rating saved"
        );
        Ok(outcome)
    }

    /// Every store with its average and rating count, in store order.
    ///
    /// # Errors
    ///
    /// Returns an error if stores or ratings cannot be loaded.
    pub async fn store_summaries(&self) -> Result<Vec<StoreSummary>, RepositoryError> {
        let stores = self.store.list_stores().await?;
        let ratings = self.store.list_ratings().await?;

        let mut by_store: HashMap<StoreId, Vec<i32>> = HashMap::new();
        for rating in &ratings {
            by_store.entry(rating.store_id).or_default().push(rating.value);
        }

        Ok(stores
            .into_iter()
            .map(|store| {
                let values = by_store.get(&store.id).map_or(&[][..], Vec::as_slice);
                summarize(store, values)
            })
            .collect())
    }

    /// Store detail for one store, or `None` when it does not exist.
    ///
    /// # Errors
    ///
    /// Returns an error if the store or its ratings cannot be loaded.
    pub async fn store_detail(
        &self,
        store_id: StoreId,
        viewer: Option<UserId>,
    ) -> Result<Option<StoreDetail>, RepositoryError> {
        let Some(store) = self.store.get_store(store_id).await? else {
            return Ok(None);
        };
        let ratings = newest_first(self.store.ratings_for_store(store_id).await?);

        let own_rating = match viewer {
            Some(uid) => self
                .store
                .find_rating(uid, store_id)
                .await?
                .map(|r| r.value),
            None => None,
        };

        let values: Vec<i32> = ratings.iter().map(|r| r.value).collect();
        Ok(Some(StoreDetail {
            summary: summarize(store, &values),
            ratings,
            own_rating,
        }))
    }

    /// Dashboard of the store owned by `owner_id`, or `None` when they have
    /// no store yet.
    ///
    /// # Errors
    ///
    /// Returns an error if the store, ratings, or rater profiles cannot be
    /// loaded.
    pub async fn owner_dashboard(
        &self,
        owner_id: UserId,
    ) -> Result<Option<OwnerDashboard>, RepositoryError> {
        let Some(store) = self.store.find_store_by_owner(owner_id).await? else {
            return Ok(None);
        };
        let ratings = newest_first(self.store.ratings_for_store(store.id).await?);

        let rater_ids: HashSet<UserId> = ratings.iter().map(|r| r.user_id).collect();
        let mut profiles: HashMap<UserId, User> = HashMap::with_capacity(rater_ids.len());
        for uid in &rater_ids {
            if let Some(user) = self.store.get_user(*uid).await? {
                profiles.insert(*uid, user);
            }
        }

        let values: Vec<i32> = ratings.iter().map(|r| r.value).collect();
        let raters = ratings
            .into_iter()
            .map(|rating| {
                let profile = profiles.get(&rating.user_id);
                RaterRow {
                    user_id: rating.user_id,
                    name: profile.map_or_else(|| ANONYMOUS_RATER.to_string(), |u| u.name.clone()),
                    email: profile
                        .map_or_else(|| MISSING_FIELD.to_string(), |u| u.email.to_string()),
                    value: rating.value,
                    rating,
                }
            })
            .collect();

        Ok(Some(OwnerDashboard {
            summary: summarize(store, &values),
            unique_raters: rater_ids.len(),
            distribution: rating_distribution(&values),
            raters,
        }))
    }
}

fn summarize(store: Store, values: &[i32]) -> StoreSummary {
    StoreSummary {
        store,
        average: calculate_average_rating(values),
        rating_count: values.len(),
    }
}

fn newest_first(mut ratings: Vec<Rating>) -> Vec<Rating> {
    ratings.sort_by(|a, b| b.created_at.cmp(&a.created_at));
    ratings
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use chrono::Duration;
    use store_ratings_core::{Email, Role};

    use super::*;
    use crate::db::MemoryDocumentStore;
    use crate::models::NewStore;

    async fn seed_store(db: &MemoryDocumentStore, owner: Option<UserId>) -> Store {
        db.insert_store(&NewStore {
            name: "Springfield General Store".to_string(),
            email: Email::parse("shop@example.com").unwrap(),
            address: "12 Evergreen Terrace".to_string(),
            owner_id: owner,
        })
        .await
        .unwrap()
    }

    async fn seed_user(db: &MemoryDocumentStore, name: &str) -> User {
        let user = User {
            id: UserId::generate(),
            name: name.to_string(),
            email: Email::parse(&format!("{}@example.com", name.to_lowercase().replace(' ', "")))
                .unwrap(),
            address: "1 Main St".to_string(),
            role: Role::User,
            created_at: Utc::now(),
        };
        db.put_user(&user).await.unwrap();
        user
    }

    #[tokio::test]
    async fn test_submit_twice_keeps_one_rating() {
        let db = MemoryDocumentStore::new();
        let store = seed_store(&db, None).await;
        let uid = UserId::generate();
        let service = RatingService::new(&db);

        assert_eq!(
            service.submit(uid, store.id, 3).await.unwrap(),
            UpsertOutcome::Created
        );
        let first = db.find_rating(uid, store.id).await.unwrap().unwrap();
        assert_eq!(
            service.submit(uid, store.id, 5).await.unwrap(),
            UpsertOutcome::Updated
        );

        let ratings = db.ratings_for_store(store.id).await.unwrap();
        assert_eq!(ratings.len(), 1);
        let rating = ratings.first().unwrap();
        assert_eq!(rating.value, 5);
        assert_eq!(rating.created_at, first.created_at);
        assert!(rating.updated_at.is_some());
    }

    #[tokio::test]
    async fn test_store_summaries_average_per_store() {
        let db = MemoryDocumentStore::new();
        let rated = seed_store(&db, None).await;
        let unrated = seed_store(&db, None).await;
        let service = RatingService::new(&db);

        for value in [5, 4, 3] {
            service
                .submit(UserId::generate(), rated.id, value)
                .await
                .unwrap();
        }

        let summaries = service.store_summaries().await.unwrap();
        let rated_summary = summaries.iter().find(|s| s.store.id == rated.id).unwrap();
        let unrated_summary = summaries.iter().find(|s| s.store.id == unrated.id).unwrap();

        assert!((rated_summary.average - 4.0).abs() < f64::EPSILON);
        assert_eq!(rated_summary.rating_count, 3);
        assert!(unrated_summary.average.abs() < f64::EPSILON);
        assert_eq!(unrated_summary.rating_count, 0);
    }

    #[tokio::test]
    async fn test_store_detail_orders_newest_first_and_finds_own_rating() {
        let db = MemoryDocumentStore::new();
        let store = seed_store(&db, None).await;
        let viewer = UserId::generate();
        let now = Utc::now();

        db.insert_rating(&Rating::new(UserId::generate(), store.id, 2, now - Duration::days(2)))
            .await
            .unwrap();
        db.insert_rating(&Rating::new(viewer, store.id, 4, now))
            .await
            .unwrap();

        let service = RatingService::new(&db);
        let detail = service
            .store_detail(store.id, Some(viewer))
            .await
            .unwrap()
            .unwrap();

        assert_eq!(detail.own_rating, Some(4));
        assert_eq!(detail.ratings.first().map(|r| r.value), Some(4));
        assert!((detail.summary.average - 3.0).abs() < f64::EPSILON);

        assert!(
            service
                .store_detail(StoreId::generate(), None)
                .await
                .unwrap()
                .is_none()
        );
    }

    #[tokio::test]
    async fn test_owner_dashboard_without_store() {
        let db = MemoryDocumentStore::new();
        let service = RatingService::new(&db);
        assert!(
            service
                .owner_dashboard(UserId::generate())
                .await
                .unwrap()
                .is_none()
        );
    }

    #[tokio::test]
    async fn test_owner_dashboard_merges_raters() {
        let db = MemoryDocumentStore::new();
        let owner = UserId::generate();
        let store = seed_store(&db, Some(owner)).await;
        let rater = seed_user(&db, "Margaret Eleanor Thompson").await;
        let service = RatingService::new(&db);

        service.submit(rater.id, store.id, 5).await.unwrap();
        service
            .submit(UserId::generate(), store.id, 2)
            .await
            .unwrap();

        let dashboard = service.owner_dashboard(owner).await.unwrap().unwrap();
        assert_eq!(dashboard.unique_raters, 2);
        assert_eq!(dashboard.raters.len(), 2);
        assert!((dashboard.summary.average - 3.5).abs() < f64::EPSILON);

        let known = dashboard
            .raters
            .iter()
            .find(|r| r.user_id == rater.id)
            .unwrap();
        assert_eq!(known.name, "Margaret Eleanor Thompson");

        let unknown = dashboard
            .raters
            .iter()
            .find(|r| r.user_id != rater.id)
            .unwrap();
        assert_eq!(unknown.name, ANONYMOUS_RATER);
        assert_eq!(unknown.email, MISSING_FIELD);

        let five = dashboard
            .distribution
            .iter()
            .find(|b| b.stars == 5)
            .unwrap();
        assert_eq!(five.count, 1);
    }
}
