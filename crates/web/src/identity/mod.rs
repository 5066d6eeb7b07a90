//! Identity provider: email/password accounts.
//!
//! An identity is only the credential half of an account. The profile (name,
//! address, role) lives in the `users` collection under the identity's uid.
//!
//! Provider errors carry a stable [`IdentityError::code`] that form handlers
//! put in the redirect query string and pages turn into friendly text.

pub mod memory;
pub mod postgres;

use argon2::{
    Argon2,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};
use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use thiserror::Error;

use store_ratings_core::{Email, EmailError, UserId};

pub use memory::MemoryIdentityProvider;
pub use postgres::PgIdentityProvider;

/// Shortest password the provider itself accepts. Forms enforce stricter rules.
pub const MIN_PROVIDER_PASSWORD_LENGTH: usize = 6;

/// How long after signing in a password change is still allowed.
pub const RECENT_LOGIN_WINDOW_MINUTES: i64 = 5;

/// A signed-in (or freshly created) identity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    pub uid: UserId,
    pub email: Email,
}

/// Errors reported by the identity provider.
#[derive(Debug, Error)]
pub enum IdentityError {
    /// Wrong password on sign-in.
    #[error("invalid credential")]
    InvalidCredential,

    /// No identity has this email or uid.
    #[error("user not found")]
    UserNotFound,

    /// Sign-in attempts for this email are being throttled.
    #[error("too many requests")]
    TooManyRequests,

    /// Another identity already uses this email.
    #[error("email already in use")]
    EmailAlreadyInUse,

    /// Password shorter than the provider minimum.
    #[error("weak password")]
    WeakPassword,

    /// Wrong current password on re-authentication.
    #[error("wrong password")]
    WrongPassword,

    /// The last sign-in is too old for a sensitive change.
    #[error("requires recent login")]
    RequiresRecentLogin,

    /// Email is not shaped like an address.
    #[error("invalid email: {0}")]
    InvalidEmail(#[from] EmailError),

    /// Password hashing failed.
    #[error("password hashing error")]
    PasswordHash,

    /// Stored identity data could not be read back.
    #[error("data corruption: {0}")]
    DataCorruption(String),

    /// Backend failure.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

impl IdentityError {
    /// Stable code used in redirect query strings.
    #[must_use]
    pub const fn code(&self) -> &'static str {
        match self {
            Self::InvalidCredential => "invalid-credential",
            Self::UserNotFound => "user-not-found",
            Self::TooManyRequests => "too-many-requests",
            Self::EmailAlreadyInUse => "email-already-in-use",
            Self::WeakPassword => "weak-password",
            Self::WrongPassword => "wrong-password",
            Self::RequiresRecentLogin => "requires-recent-login",
            Self::InvalidEmail(_) => "invalid-email",
            Self::PasswordHash | Self::DataCorruption(_) | Self::Database(_) => "internal",
        }
    }
}

/// Email/password identity operations.
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    /// Create an identity and mark it as just signed in.
    async fn create_account(&self, email: &Email, password: &str)
    -> Result<Identity, IdentityError>;

    /// Check credentials and record the sign-in time.
    async fn sign_in(&self, email: &Email, password: &str) -> Result<Identity, IdentityError>;

    /// Forget the last sign-in so sensitive changes need a fresh one.
    async fn sign_out(&self, uid: UserId) -> Result<(), IdentityError>;

    /// Confirm the current password of a signed-in identity.
    ///
    /// Fails with `IdentityError::WrongPassword` on mismatch.
    async fn reauthenticate(&self, uid: UserId, password: &str) -> Result<(), IdentityError>;

    /// Replace the password. Requires a sign-in or re-authentication within
    /// [`RECENT_LOGIN_WINDOW_MINUTES`].
    async fn change_password(&self, uid: UserId, new_password: &str)
    -> Result<(), IdentityError>;

    /// Look up an identity without signing in.
    async fn find_by_email(&self, email: &Email) -> Result<Option<Identity>, IdentityError>;
}

// =============================================================================
// Helpers shared by the backends
// =============================================================================

/// Hash a password with Argon2id and a random salt.
pub(crate) fn hash_password(password: &str) -> Result<String, IdentityError> {
    let salt = SaltString::generate(&mut OsRng);
    let argon2 = Argon2::default();

    argon2
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|_| IdentityError::PasswordHash)
}

/// Verify a password against a stored hash.
pub(crate) fn verify_password(password: &str, hash: &str) -> bool {
    let Ok(parsed_hash) = PasswordHash::new(hash) else {
        return false;
    };
    Argon2::default()
        .verify_password(password.as_bytes(), &parsed_hash)
        .is_ok()
}

pub(crate) fn check_password_strength(password: &str) -> Result<(), IdentityError> {
    if password.chars().count() < MIN_PROVIDER_PASSWORD_LENGTH {
        return Err(IdentityError::WeakPassword);
    }
    Ok(())
}

pub(crate) fn is_recent(authenticated_at: Option<DateTime<Utc>>, now: DateTime<Utc>) -> bool {
    authenticated_at
        .is_some_and(|at| now - at <= Duration::minutes(RECENT_LOGIN_WINDOW_MINUTES))
}
