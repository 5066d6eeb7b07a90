//! `PostgreSQL` identity provider (`identities` table).

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;

use store_ratings_core::{Email, UserId};

use super::{
    Identity, IdentityError, IdentityProvider, check_password_strength, hash_password, is_recent,
    verify_password,
};

/// Identity provider storing Argon2 hashes in `PostgreSQL`.
#[derive(Clone)]
pub struct PgIdentityProvider {
    pool: PgPool,
}

impl PgIdentityProvider {
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn fetch_by_uid(&self, uid: UserId) -> Result<IdentityRow, IdentityError> {
        let row: Option<IdentityRow> = sqlx::query_as(
            "SELECT uid, email, password_hash, authenticated_at FROM identities WHERE uid = $1",
        )
        .bind(uid)
        .fetch_optional(&self.pool)
        .await?;
        row.ok_or(IdentityError::UserNotFound)
    }

    async fn fetch_by_email(&self, email: &Email) -> Result<Option<IdentityRow>, IdentityError> {
        let row: Option<IdentityRow> = sqlx::query_as(
            "SELECT uid, email, password_hash, authenticated_at FROM identities WHERE LOWER(email) = $1",
        )
        .bind(email.normalized())
        .fetch_optional(&self.pool)
        .await?;
        Ok(row)
    }

    async fn touch(&self, uid: UserId, at: Option<DateTime<Utc>>) -> Result<(), IdentityError> {
        sqlx::query("UPDATE identities SET authenticated_at = $2 WHERE uid = $1")
            .bind(uid)
            .bind(at)
            .execute(&self.pool)
            .await?;
        Ok(())
    }
}

#[derive(sqlx::FromRow)]
struct IdentityRow {
    uid: UserId,
    email: String,
    password_hash: String,
    authenticated_at: Option<DateTime<Utc>>,
}

impl IdentityRow {
    fn identity(&self) -> Result<Identity, IdentityError> {
        let email = Email::parse(&self.email).map_err(|e| {
            IdentityError::DataCorruption(format!("invalid email in database: {e}"))
        })?;
        Ok(Identity {
            uid: self.uid,
            email,
        })
    }
}

#[async_trait]
impl IdentityProvider for PgIdentityProvider {
    async fn create_account(
        &self,
        email: &Email,
        password: &str,
    ) -> Result<Identity, IdentityError> {
        check_password_strength(password)?;
        let password_hash = hash_password(password)?;
        let uid = UserId::generate();

        sqlx::query(
            r"
            INSERT INTO identities (uid, email, password_hash, authenticated_at)
            VALUES ($1, $2, $3, NOW())
            ",
        )
        .bind(uid)
        .bind(email.as_str())
        .bind(&password_hash)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            if let sqlx::Error::Database(ref db_err) = e
                && db_err.is_unique_violation()
            {
                return IdentityError::EmailAlreadyInUse;
            }
            IdentityError::Database(e)
        })?;

        Ok(Identity {
            uid,
            email: email.clone(),
        })
    }

    async fn sign_in(&self, email: &Email, password: &str) -> Result<Identity, IdentityError> {
        let row = self
            .fetch_by_email(email)
            .await?
            .ok_or(IdentityError::UserNotFound)?;

        if !verify_password(password, &row.password_hash) {
            return Err(IdentityError::InvalidCredential);
        }
        self.touch(row.uid, Some(Utc::now())).await?;
        row.identity()
    }

    async fn sign_out(&self, uid: UserId) -> Result<(), IdentityError> {
        self.touch(uid, None).await
    }

    async fn reauthenticate(&self, uid: UserId, password: &str) -> Result<(), IdentityError> {
        let row = self.fetch_by_uid(uid).await?;
        if !verify_password(password, &row.password_hash) {
            return Err(IdentityError::WrongPassword);
        }
        self.touch(uid, Some(Utc::now())).await
    }

    async fn change_password(&self, uid: UserId, new_password: &str) -> Result<(), IdentityError> {
        let row = self.fetch_by_uid(uid).await?;
        if !is_recent(row.authenticated_at, Utc::now()) {
            return Err(IdentityError::RequiresRecentLogin);
        }
        check_password_strength(new_password)?;
        let password_hash = hash_password(new_password)?;

        sqlx::query("UPDATE identities SET password_hash = $2 WHERE uid = $1")
            .bind(uid)
            .bind(&password_hash)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn find_by_email(&self, email: &Email) -> Result<Option<Identity>, IdentityError> {
        self.fetch_by_email(email)
            .await?
            .map(|row| row.identity())
            .transpose()
    }
}
