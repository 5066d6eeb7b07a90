//! In-memory identity provider for development and tests.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::RwLock;

use store_ratings_core::{Email, UserId};

use super::{
    Identity, IdentityError, IdentityProvider, check_password_strength, hash_password, is_recent,
    verify_password,
};

struct Account {
    email: Email,
    password_hash: String,
    authenticated_at: Option<DateTime<Utc>>,
}

#[derive(Default)]
struct Accounts {
    by_uid: HashMap<UserId, Account>,
    // normalized email -> uid
    by_email: HashMap<String, UserId>,
}

/// Identity provider keeping accounts in process memory.
#[derive(Default)]
pub struct MemoryIdentityProvider {
    inner: RwLock<Accounts>,
}

impl MemoryIdentityProvider {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Pretend the last sign-in of `uid` happened at `at`.
    #[cfg(test)]
    pub(crate) async fn set_authenticated_at(&self, uid: UserId, at: Option<DateTime<Utc>>) {
        if let Some(account) = self.inner.write().await.by_uid.get_mut(&uid) {
            account.authenticated_at = at;
        }
    }
}

#[async_trait]
impl IdentityProvider for MemoryIdentityProvider {
    async fn create_account(
        &self,
        email: &Email,
        password: &str,
    ) -> Result<Identity, IdentityError> {
        check_password_strength(password)?;
        let password_hash = hash_password(password)?;

        let mut inner = self.inner.write().await;
        let key = email.normalized();
        if inner.by_email.contains_key(&key) {
            return Err(IdentityError::EmailAlreadyInUse);
        }

        let uid = UserId::generate();
        inner.by_email.insert(key, uid);
        inner.by_uid.insert(
            uid,
            Account {
                email: email.clone(),
                password_hash,
                authenticated_at: Some(Utc::now()),
            },
        );

        Ok(Identity {
            uid,
            email: email.clone(),
        })
    }

    async fn sign_in(&self, email: &Email, password: &str) -> Result<Identity, IdentityError> {
        let mut inner = self.inner.write().await;
        let uid = *inner
            .by_email
            .get(&email.normalized())
            .ok_or(IdentityError::UserNotFound)?;
        let account = inner
            .by_uid
            .get_mut(&uid)
            .ok_or(IdentityError::UserNotFound)?;

        if !verify_password(password, &account.password_hash) {
            return Err(IdentityError::InvalidCredential);
        }
        account.authenticated_at = Some(Utc::now());

        Ok(Identity {
            uid,
            email: account.email.clone(),
        })
    }

    async fn sign_out(&self, uid: UserId) -> Result<(), IdentityError> {
        if let Some(account) = self.inner.write().await.by_uid.get_mut(&uid) {
            account.authenticated_at = None;
        }
        Ok(())
    }

    async fn reauthenticate(&self, uid: UserId, password: &str) -> Result<(), IdentityError> {
        let mut inner = self.inner.write().await;
        let account = inner
            .by_uid
            .get_mut(&uid)
            .ok_or(IdentityError::UserNotFound)?;

        if !verify_password(password, &account.password_hash) {
            return Err(IdentityError::WrongPassword);
        }
        account.authenticated_at = Some(Utc::now());
        Ok(())
    }

    async fn change_password(&self, uid: UserId, new_password: &str) -> Result<(), IdentityError> {
        let mut inner = self.inner.write().await;
        let account = inner
            .by_uid
            .get_mut(&uid)
            .ok_or(IdentityError::UserNotFound)?;

        if !is_recent(account.authenticated_at, Utc::now()) {
            return Err(IdentityError::RequiresRecentLogin);
        }
        check_password_strength(new_password)?;
        account.password_hash = hash_password(new_password)?;
        Ok(())
    }

    async fn find_by_email(&self, email: &Email) -> Result<Option<Identity>, IdentityError> {
        let inner = self.inner.read().await;
        Ok(inner.by_email.get(&email.normalized()).and_then(|uid| {
            inner.by_uid.get(uid).map(|account| Identity {
                uid: *uid,
                email: account.email.clone(),
            })
        }))
    }
}
