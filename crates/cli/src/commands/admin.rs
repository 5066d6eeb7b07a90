//! Admin account commands.
//!
//! # Usage
//!
//! ```bash
//! RATINGS_ADMIN_PASSWORD='Sup3r!pass' \
//!   sr-cli admin create -e admin@example.com -n "Store Ratings Administrator" -a "1 Main St"
//! ```
//!
//! The same validation as the admin user form applies.

use secrecy::SecretString;
use thiserror::Error;

use store_ratings_web::db::{self, PgDocumentStore};
use store_ratings_web::identity::PgIdentityProvider;
use store_ratings_web::services::{AdminError, AdminService};

/// Errors that can occur during admin operations.
#[derive(Debug, Error)]
pub enum AdminCommandError {
    /// Database connection error.
    #[error("Database connection error: {0}")]
    Database(#[from] sqlx::Error),

    /// Validation, identity, or document store failure.
    #[error("{0}")]
    Admin(#[from] AdminError),

    /// An identity already uses this email.
    #[error("An account already exists with email: {0}")]
    UserExists(String),
}

/// Create an admin identity and profile.
///
/// # Errors
///
/// Returns `UserExists` when the email is taken, or the validation,
/// provider, or database error.
pub async fn create_admin(
    database_url: &SecretString,
    email: &str,
    name: &str,
    address: &str,
    password: &str,
) -> Result<(), AdminCommandError> {
    tracing::info!("Connecting to database...");
    let pool = db::create_pool(database_url).await?;

    let identity = PgIdentityProvider::new(pool.clone());
    let store = PgDocumentStore::new(pool);
    let service = AdminService::new(&identity, &store);

    tracing::info!("Creating admin account: {}", email);
    if !service.ensure_admin(name, email, address, password).await? {
        return Err(AdminCommandError::UserExists(email.to_owned()));
    }

    tracing::info!("Admin account created successfully: {}", email);
    Ok(())
}
