//! HTTP route handlers.
//!
//! # Route Structure
//!
//! ```text
//! GET  /                        - Home page
//! GET  /health                  - Liveness probe
//! GET  /health/ready            - Readiness probe (document store ping)
//!
//! # Auth (signed-out visitors only, except logout)
//! GET  /login                   - Login page
//! POST /login                   - Login action
//! GET  /register                - Register page
//! POST /register                - Register action
//! POST /logout                  - Logout action
//!
//! # Stores
//! GET  /stores                  - Store listing with search
//! GET  /stores/{id}             - Store detail and ratings
//! POST /stores/{id}/rating      - Submit or update own rating (normal users)
//!
//! # Account (requires auth)
//! GET  /profile                 - Profile overview
//! GET  /update-password         - Password form
//! POST /update-password         - Password change action
//!
//! # Admin (role admin)
//! GET  /admin/dashboard         - Collection totals
//! GET  /admin/users             - User list with search, role filter, sort
//! GET  /admin/users/new         - New user form
//! POST /admin/users/new         - Create user (and store for store owners)
//! GET  /admin/users/{id}        - Edit user form
//! POST /admin/users/{id}        - Update user
//! GET  /admin/stores            - Store list with search, rating band, sort
//!
//! # Store owner (role store_owner)
//! GET  /store-owner/dashboard   - Own store statistics and raters
//! ```
//!
//! Form handlers redirect back with `?error=<code>` or `?success=<code>`;
//! each page turns the code into a message.

pub mod account;
pub mod admin;
pub mod auth;
pub mod health;
pub mod home;
pub mod owner;
pub mod stores;

use axum::{
    Router,
    routing::{get, post},
};
use serde::Deserialize;

use store_ratings_core::ValidationError;

use crate::middleware::AuthContext;
use crate::state::AppState;

/// Query parameters for error/success display.
#[derive(Debug, Default, Deserialize)]
pub struct MessageQuery {
    pub error: Option<String>,
    pub success: Option<String>,
}

/// Navigation bar state shared by every page.
#[derive(Debug, Clone, Default)]
pub struct Nav {
    pub signed_in: bool,
    /// First word of the profile name, "User" without a profile.
    pub display_name: String,
    pub email: String,
    pub is_admin: bool,
    pub is_store_owner: bool,
}

impl From<&AuthContext> for Nav {
    fn from(ctx: &AuthContext) -> Self {
        let display_name = ctx
            .profile
            .as_ref()
            .and_then(|p| p.name.split_whitespace().next())
            .unwrap_or("User")
            .to_string();
        Self {
            signed_in: ctx.is_authenticated(),
            display_name,
            email: ctx
                .identity
                .as_ref()
                .map(|i| i.email.to_string())
                .unwrap_or_default(),
            is_admin: ctx.is_admin(),
            is_store_owner: ctx.is_store_owner(),
        }
    }
}

/// Turn a redirect code into display text.
///
/// Codes listed in `known` win, then validation codes, then `fallback`.
/// No code means no message.
#[must_use]
pub fn message_for(code: Option<&str>, known: &[(&str, &str)], fallback: &str) -> Option<String> {
    let code = code?;
    let text = known
        .iter()
        .find(|(k, _)| *k == code)
        .map(|(_, text)| (*text).to_string())
        .or_else(|| ValidationError::from_code(code).map(|e| e.to_string()))
        .unwrap_or_else(|| fallback.to_string());
    Some(text)
}

/// Create the auth routes router.
pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/login", get(auth::login_page).post(auth::login))
        .route("/register", get(auth::register_page).post(auth::register))
        .route("/logout", post(auth::logout))
}

/// Create the store routes router.
pub fn store_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(stores::index))
        .route("/{id}", get(stores::show))
        .route("/{id}/rating", post(stores::rate))
}

/// Create the account routes router.
pub fn account_routes() -> Router<AppState> {
    Router::new()
        .route("/profile", get(account::profile))
        .route(
            "/update-password",
            get(account::update_password_page).post(account::update_password),
        )
}

/// Create the admin routes router.
pub fn admin_routes() -> Router<AppState> {
    Router::new()
        .route("/dashboard", get(admin::dashboard))
        .route("/users", get(admin::users))
        .route("/users/new", get(admin::new_user).post(admin::create_user))
        .route("/users/{id}", get(admin::edit_user).post(admin::update_user))
        .route("/stores", get(admin::stores))
}

/// Create all page routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/", get(home::home))
        .route("/health", get(health::health))
        .route("/health/ready", get(health::readiness))
        .merge(auth_routes())
        .merge(account_routes())
        .nest("/stores", store_routes())
        .nest("/admin", admin_routes())
        .route("/store-owner/dashboard", get(owner::dashboard))
}

#[cfg(test)]
mod tests {
    use super::*;

    const KNOWN: &[(&str, &str)] = &[("email-already-in-use", "This email is already in use.")];

    #[test]
    fn test_message_for() {
        assert_eq!(message_for(None, KNOWN, "Failed."), None);
        assert_eq!(
            message_for(Some("email-already-in-use"), KNOWN, "Failed.").as_deref(),
            Some("This email is already in use.")
        );
        assert_eq!(
            message_for(Some("password-mismatch"), KNOWN, "Failed.").as_deref(),
            Some("Passwords do not match")
        );
        assert_eq!(
            message_for(Some("<script>"), KNOWN, "Failed.").as_deref(),
            Some("Failed.")
        );
    }

    #[test]
    fn test_nav_for_anonymous() {
        let nav = Nav::from(&AuthContext::default());
        assert!(!nav.signed_in);
        assert_eq!(nav.display_name, "User");
    }
}
