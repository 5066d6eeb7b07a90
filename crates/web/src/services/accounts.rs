//! Account flows: registration, sign-in, password change.
//!
//! Sessions are not touched here; route handlers store the returned
//! [`CurrentUser`] themselves.

use chrono::Utc;
use thiserror::Error;

use store_ratings_core::{
    Role, ValidationError, validate_address, validate_email, validate_name, validate_new_password,
};

use crate::db::{DocumentStore, RepositoryError};
use crate::identity::{IdentityError, IdentityProvider};
use crate::middleware::SignInThrottle;
use crate::models::{CurrentUser, User};

/// Errors from account flows.
#[derive(Debug, Error)]
pub enum AccountError {
    /// A form field failed validation.
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// The identity provider refused the operation.
    #[error("identity provider: {0}")]
    Identity(#[from] IdentityError),

    /// The profile could not be written or read.
    #[error("document store: {0}")]
    Repository(#[from] RepositoryError),
}

impl AccountError {
    /// Stable code for `?error=` query strings.
    #[must_use]
    pub const fn code(&self) -> &'static str {
        match self {
            Self::Validation(e) => e.code(),
            Self::Identity(e) => e.code(),
            Self::Repository(_) => "internal",
        }
    }
}

/// Registration form input.
#[derive(Debug, Clone)]
pub struct Registration<'f> {
    pub name: &'f str,
    pub email: &'f str,
    pub address: &'f str,
    pub password: &'f str,
    pub confirm_password: &'f str,
}

/// Account operations over the identity provider and the document store.
pub struct AccountService<'a> {
    identity: &'a dyn IdentityProvider,
    store: &'a dyn DocumentStore,
}

impl<'a> AccountService<'a> {
    #[must_use]
    pub const fn new(identity: &'a dyn IdentityProvider, store: &'a dyn DocumentStore) -> Self {
        Self { identity, store }
    }

    /// Create an identity and a `user` profile, returning the signed-in user.
    ///
    /// # Errors
    ///
    /// Returns the first validation failure, or the provider/store error.
    pub async fn register(&self, form: &Registration<'_>) -> Result<CurrentUser, AccountError> {
        let name = form.name.trim();
        let address = form.address.trim();
        validate_name(name)?;
        let email = validate_email(form.email.trim())?;
        validate_address(address)?;
        validate_new_password(form.password, form.confirm_password)?;

        let identity = self.identity.create_account(&email, form.password).await?;
        let profile = User {
            id: identity.uid,
            name: name.to_string(),
            email: identity.email.clone(),
            address: address.to_string(),
            role: Role::User,
            created_at: Utc::now(),
        };
        if let Err(e) = self.store.put_user(&profile).await {
            tracing::warn!(
                uid = %identity.uid,
                error = %e,
                "Identity created but profile write failed"
            );
            return Err(e.into());
        }

        tracing::info!(uid = %identity.uid, "Account registered");
        Ok(CurrentUser {
            uid: identity.uid,
            email: identity.email,
        })
    }

    /// Check credentials, subject to the per-email throttle.
    ///
    /// # Errors
    ///
    /// Returns `TooManyRequests` when throttled, otherwise the provider error.
    pub async fn sign_in(
        &self,
        throttle: &SignInThrottle,
        email: &str,
        password: &str,
    ) -> Result<CurrentUser, AccountError> {
        let email = validate_email(email.trim())?;
        if !throttle.try_attempt(&email.normalized()) {
            return Err(IdentityError::TooManyRequests.into());
        }

        let identity = self.identity.sign_in(&email, password).await?;
        tracing::info!(uid = %identity.uid, "Signed in");
        Ok(CurrentUser {
            uid: identity.uid,
            email: identity.email,
        })
    }

    /// End the provider-side session of `user`.
    ///
    /// # Errors
    ///
    /// Returns the provider error.
    pub async fn sign_out(&self, user: &CurrentUser) -> Result<(), AccountError> {
        self.identity.sign_out(user.uid).await?;
        tracing::info!(uid = %user.uid, "Signed out");
        Ok(())
    }

    /// Re-authenticate with `current` and switch to `new`.
    ///
    /// # Errors
    ///
    /// Returns the first validation failure of the new password, `WrongPassword`
    /// when `current` is wrong, or another provider error.
    pub async fn change_password(
        &self,
        user: &CurrentUser,
        current: &str,
        new: &str,
        confirm: &str,
    ) -> Result<(), AccountError> {
        validate_new_password(new, confirm)?;
        self.identity.reauthenticate(user.uid, current).await?;
        self.identity.change_password(user.uid, new).await?;
        tracing::info!(uid = %user.uid, "Password changed");
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::db::MemoryDocumentStore;
    use crate::identity::MemoryIdentityProvider;
    use crate::middleware::rate_limit::SIGN_IN_ATTEMPTS_PER_MINUTE;

    fn registration<'f>(email: &'f str, password: &'f str) -> Registration<'f> {
        Registration {
            name: "Jane Quincy Adams-Doe",
            email,
            address: "1 Main St, Springfield",
            password,
            confirm_password: password,
        }
    }

    #[tokio::test]
    async fn test_register_creates_user_profile() {
        let idp = MemoryIdentityProvider::new();
        let db = MemoryDocumentStore::new();
        let service = AccountService::new(&idp, &db);

        let user = service
            .register(&registration("jane@example.com", "Abcdef1!"))
            .await
            .unwrap();

        let profile = db.get_user(user.uid).await.unwrap().unwrap();
        assert_eq!(profile.role, Role::User);
        assert_eq!(profile.name, "Jane Quincy Adams-Doe");
    }

    #[tokio::test]
    async fn test_register_validates_before_creating_identity() {
        let idp = MemoryIdentityProvider::new();
        let db = MemoryDocumentStore::new();
        let service = AccountService::new(&idp, &db);

        let mut form = registration("jane@example.com", "Abcdef1!");
        form.name = "John Doe";
        let err = service.register(&form).await.unwrap_err();
        assert_eq!(err.code(), "name-too-short");

        let mut form = registration("jane@example.com", "Abcdef1!");
        form.confirm_password = "Abcdef1?";
        let err = service.register(&form).await.unwrap_err();
        assert_eq!(err.code(), "password-mismatch");

        let email = store_ratings_core::Email::parse("jane@example.com").unwrap();
        assert!(idp.find_by_email(&email).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_register_duplicate_email() {
        let idp = MemoryIdentityProvider::new();
        let db = MemoryDocumentStore::new();
        let service = AccountService::new(&idp, &db);

        service
            .register(&registration("jane@example.com", "Abcdef1!"))
            .await
            .unwrap();
        let err = service
            .register(&registration("jane@example.com", "Abcdef1!"))
            .await
            .unwrap_err();
        assert_eq!(err.code(), "email-already-in-use");
    }

    #[tokio::test]
    async fn test_sign_in_is_throttled_per_email() {
        let idp = MemoryIdentityProvider::new();
        let db = MemoryDocumentStore::new();
        let service = AccountService::new(&idp, &db);
        let throttle = SignInThrottle::new();

        for _ in 0..SIGN_IN_ATTEMPTS_PER_MINUTE {
            let err = service
                .sign_in(&throttle, "ghost@example.com", "Abcdef1!")
                .await
                .unwrap_err();
            assert_eq!(err.code(), "user-not-found");
        }
        let err = service
            .sign_in(&throttle, "ghost@example.com", "Abcdef1!")
            .await
            .unwrap_err();
        assert_eq!(err.code(), "too-many-requests");
    }

    #[tokio::test]
    async fn test_change_password() {
        let idp = MemoryIdentityProvider::new();
        let db = MemoryDocumentStore::new();
        let service = AccountService::new(&idp, &db);
        let throttle = SignInThrottle::new();

        let user = service
            .register(&registration("jane@example.com", "Abcdef1!"))
            .await
            .unwrap();

        let err = service
            .change_password(&user, "Wrong1!!", "Zyxwvu9#", "Zyxwvu9#")
            .await
            .unwrap_err();
        assert_eq!(err.code(), "wrong-password");

        let err = service
            .change_password(&user, "Abcdef1!", "weakpass", "weakpass")
            .await
            .unwrap_err();
        assert_eq!(err.code(), "password-missing-uppercase");

        service
            .change_password(&user, "Abcdef1!", "Zyxwvu9#", "Zyxwvu9#")
            .await
            .unwrap();
        assert!(
            service
                .sign_in(&throttle, "jane@example.com", "Zyxwvu9#")
                .await
                .is_ok()
        );
    }
}
