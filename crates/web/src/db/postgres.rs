//! `PostgreSQL` document store.
//!
//! Each collection is a table of the same name. Relations between them are
//! plain UUID columns without foreign keys, so a store may point at a
//! profile that does not exist.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;

use store_ratings_core::{Email, RatingId, Role, StoreId, UserId};

use super::{DocumentStore, RepositoryError, map_unique_violation};
use crate::models::{NewStore, Rating, Store, User, UserUpdate};

/// Document store backed by a `PostgreSQL` pool.
#[derive(Clone)]
pub struct PgDocumentStore {
    pool: PgPool,
}

impl PgDocumentStore {
    /// Create a new store over `pool`.
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(sqlx::FromRow)]
struct UserRow {
    id: UserId,
    name: String,
    email: String,
    address: String,
    role: Role,
    created_at: DateTime<Utc>,
}

impl TryFrom<UserRow> for User {
    type Error = RepositoryError;

    fn try_from(r: UserRow) -> Result<Self, Self::Error> {
        let email = Email::parse(&r.email).map_err(|e| {
            RepositoryError::DataCorruption(format!("invalid email in database: {e}"))
        })?;
        Ok(Self {
            id: r.id,
            name: r.name,
            email,
            address: r.address,
            role: r.role,
            created_at: r.created_at,
        })
    }
}

#[derive(sqlx::FromRow)]
struct StoreRow {
    id: StoreId,
    name: String,
    email: String,
    address: String,
    owner_id: Option<UserId>,
    created_at: DateTime<Utc>,
}

impl TryFrom<StoreRow> for Store {
    type Error = RepositoryError;

    fn try_from(r: StoreRow) -> Result<Self, Self::Error> {
        let email = Email::parse(&r.email).map_err(|e| {
            RepositoryError::DataCorruption(format!("invalid email in database: {e}"))
        })?;
        Ok(Self {
            id: r.id,
            name: r.name,
            email,
            address: r.address,
            owner_id: r.owner_id,
            created_at: r.created_at,
        })
    }
}

#[derive(sqlx::FromRow)]
struct RatingRow {
    id: RatingId,
    store_id: StoreId,
    user_id: UserId,
    value: i32,
    created_at: DateTime<Utc>,
    updated_at: Option<DateTime<Utc>>,
}

impl From<RatingRow> for Rating {
    fn from(r: RatingRow) -> Self {
        Self {
            id: r.id,
            store_id: r.store_id,
            user_id: r.user_id,
            value: r.value,
            created_at: r.created_at,
            updated_at: r.updated_at,
        }
    }
}

fn collect_users(rows: Vec<UserRow>) -> Result<Vec<User>, RepositoryError> {
    rows.into_iter().map(User::try_from).collect()
}

fn collect_stores(rows: Vec<StoreRow>) -> Result<Vec<Store>, RepositoryError> {
    rows.into_iter().map(Store::try_from).collect()
}

const USER_COLUMNS: &str = "id, name, email, address, role, created_at";
const STORE_COLUMNS: &str = "id, name, email, address, owner_id, created_at";
const RATING_COLUMNS: &str = "id, store_id, user_id, value, created_at, updated_at";

#[async_trait]
impl DocumentStore for PgDocumentStore {
    async fn ping(&self) -> Result<(), RepositoryError> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }

    async fn get_user(&self, id: UserId) -> Result<Option<User>, RepositoryError> {
        let row: Option<UserRow> =
            sqlx::query_as(&format!("SELECT {USER_COLUMNS} FROM users WHERE id = $1"))
                .bind(id)
                .fetch_optional(&self.pool)
                .await?;
        row.map(User::try_from).transpose()
    }

    async fn list_users(&self) -> Result<Vec<User>, RepositoryError> {
        let rows: Vec<UserRow> = sqlx::query_as(&format!("SELECT {USER_COLUMNS} FROM users"))
            .fetch_all(&self.pool)
            .await?;
        collect_users(rows)
    }

    async fn put_user(&self, user: &User) -> Result<(), RepositoryError> {
        sqlx::query(
            r"
            INSERT INTO users (id, name, email, address, role, created_at)
            VALUES ($1, $2, $3, $4, $5, $6)
            ON CONFLICT (id) DO UPDATE
            SET name = EXCLUDED.name,
                email = EXCLUDED.email,
                address = EXCLUDED.address,
                role = EXCLUDED.role
            ",
        )
        .bind(user.id)
        .bind(&user.name)
        .bind(user.email.as_str())
        .bind(&user.address)
        .bind(user.role)
        .bind(user.created_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn update_user(&self, id: UserId, update: &UserUpdate) -> Result<User, RepositoryError> {
        let row: Option<UserRow> = sqlx::query_as(&format!(
            "UPDATE users SET name = $2, address = $3, role = $4 WHERE id = $1 RETURNING {USER_COLUMNS}"
        ))
        .bind(id)
        .bind(&update.name)
        .bind(&update.address)
        .bind(update.role)
        .fetch_optional(&self.pool)
        .await?;
        row.ok_or(RepositoryError::NotFound)?.try_into()
    }

    async fn list_stores(&self) -> Result<Vec<Store>, RepositoryError> {
        let rows: Vec<StoreRow> = sqlx::query_as(&format!("SELECT {STORE_COLUMNS} FROM stores"))
            .fetch_all(&self.pool)
            .await?;
        collect_stores(rows)
    }

    async fn get_store(&self, id: StoreId) -> Result<Option<Store>, RepositoryError> {
        let row: Option<StoreRow> =
            sqlx::query_as(&format!("SELECT {STORE_COLUMNS} FROM stores WHERE id = $1"))
                .bind(id)
                .fetch_optional(&self.pool)
                .await?;
        row.map(Store::try_from).transpose()
    }

    async fn find_store_by_owner(&self, owner_id: UserId) -> Result<Option<Store>, RepositoryError> {
        let row: Option<StoreRow> = sqlx::query_as(&format!(
            "SELECT {STORE_COLUMNS} FROM stores WHERE owner_id = $1 LIMIT 1"
        ))
        .bind(owner_id)
        .fetch_optional(&self.pool)
        .await?;
        row.map(Store::try_from).transpose()
    }

    async fn insert_store(&self, store: &NewStore) -> Result<Store, RepositoryError> {
        let row: StoreRow = sqlx::query_as(&format!(
            "INSERT INTO stores (id, name, email, address, owner_id, created_at)
             VALUES ($1, $2, $3, $4, $5, NOW())
             RETURNING {STORE_COLUMNS}"
        ))
        .bind(StoreId::generate())
        .bind(&store.name)
        .bind(store.email.as_str())
        .bind(&store.address)
        .bind(store.owner_id)
        .fetch_one(&self.pool)
        .await?;
        row.try_into()
    }

    async fn list_ratings(&self) -> Result<Vec<Rating>, RepositoryError> {
        let rows: Vec<RatingRow> =
            sqlx::query_as(&format!("SELECT {RATING_COLUMNS} FROM ratings"))
                .fetch_all(&self.pool)
                .await?;
        Ok(rows.into_iter().map(Rating::from).collect())
    }

    async fn ratings_for_store(&self, store_id: StoreId) -> Result<Vec<Rating>, RepositoryError> {
        let rows: Vec<RatingRow> = sqlx::query_as(&format!(
            "SELECT {RATING_COLUMNS} FROM ratings WHERE store_id = $1"
        ))
        .bind(store_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.into_iter().map(Rating::from).collect())
    }

    async fn find_rating(
        &self,
        user_id: UserId,
        store_id: StoreId,
    ) -> Result<Option<Rating>, RepositoryError> {
        let row: Option<RatingRow> = sqlx::query_as(&format!(
            "SELECT {RATING_COLUMNS} FROM ratings WHERE user_id = $1 AND store_id = $2 LIMIT 1"
        ))
        .bind(user_id)
        .bind(store_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.map(Rating::from))
    }

    async fn insert_rating(&self, rating: &Rating) -> Result<(), RepositoryError> {
        sqlx::query(
            r"
            INSERT INTO ratings (id, store_id, user_id, value, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6)
            ",
        )
        .bind(rating.id)
        .bind(rating.store_id)
        .bind(rating.user_id)
        .bind(rating.value)
        .bind(rating.created_at)
        .bind(rating.updated_at)
        .execute(&self.pool)
        .await
        .map_err(|e| map_unique_violation(e, "rating for this user and store"))?;
        Ok(())
    }

    async fn update_rating_value(
        &self,
        id: RatingId,
        value: i32,
        updated_at: DateTime<Utc>,
    ) -> Result<(), RepositoryError> {
        let result = sqlx::query("UPDATE ratings SET value = $2, updated_at = $3 WHERE id = $1")
            .bind(id)
            .bind(value)
            .bind(updated_at)
            .execute(&self.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }

    async fn count_users(&self) -> Result<i64, RepositoryError> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM users")
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }

    async fn count_stores(&self) -> Result<i64, RepositoryError> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM stores")
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }

    async fn count_ratings(&self) -> Result<i64, RepositoryError> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM ratings")
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }
}
