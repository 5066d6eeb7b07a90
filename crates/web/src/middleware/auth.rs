//! Authentication context and route guards.
//!
//! The session stores only the signed-in identity. Every request derives an
//! [`AuthContext`] from it by loading the profile from the document store, so
//! role changes made by an admin take effect on the next request.
//!
//! Route guards are extractors:
//!
//! - [`RequireAuth`] - any signed-in identity
//! - [`RequireAdmin`] - profile role `admin`
//! - [`RequireStoreOwner`] - profile role `store_owner`
//! - [`GuestOnly`] - signed-out visitors only (login and register pages)
//!
//! Unauthenticated requests are redirected to `/login`; signed-in requests
//! with the wrong role are redirected to `/`.

use std::convert::Infallible;

use axum::{
    extract::FromRequestParts,
    http::request::Parts,
    response::{IntoResponse, Redirect, Response},
};
use tower_sessions::Session;

use store_ratings_core::Role;

use crate::models::{CurrentUser, User, session_keys};
use crate::state::AppState;

/// Who is making the request.
///
/// `identity` without `profile` happens when the profile record is missing
/// or could not be loaded. Such a request is authenticated but holds no role.
#[derive(Debug, Clone, Default)]
pub struct AuthContext {
    pub identity: Option<CurrentUser>,
    pub profile: Option<User>,
}

impl AuthContext {
    #[must_use]
    pub const fn is_authenticated(&self) -> bool {
        self.identity.is_some()
    }

    #[must_use]
    pub fn role(&self) -> Option<Role> {
        self.profile.as_ref().map(|p| p.role)
    }

    #[must_use]
    pub fn is_admin(&self) -> bool {
        self.role() == Some(Role::Admin)
    }

    #[must_use]
    pub fn is_store_owner(&self) -> bool {
        self.role() == Some(Role::StoreOwner)
    }

    #[must_use]
    pub fn is_normal_user(&self) -> bool {
        self.role() == Some(Role::User)
    }

    async fn derive(session: Option<&Session>, state: &AppState) -> Self {
        let Some(session) = session else {
            return Self::default();
        };

        let identity = match session.get::<CurrentUser>(session_keys::CURRENT_USER).await {
            Ok(identity) => identity,
            Err(e) => {
                tracing::warn!(error = %e, "Failed to read session");
                None
            }
        };
        let Some(identity) = identity else {
            return Self::default();
        };

        let profile = match state.store().get_user(identity.uid).await {
            Ok(profile) => profile,
            Err(e) => {
                tracing::warn!(uid = %identity.uid, error = %e, "Failed to load user profile");
                None
            }
        };

        Self {
            identity: Some(identity),
            profile,
        }
    }
}

impl FromRequestParts<AppState> for AuthContext {
    type Rejection = Infallible;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        // Several extractors on one handler share a single derivation.
        if let Some(ctx) = parts.extensions.get::<Self>() {
            return Ok(ctx.clone());
        }

        let session = parts.extensions.get::<Session>().cloned();
        let ctx = Self::derive(session.as_ref(), state).await;
        parts.extensions.insert(ctx.clone());
        Ok(ctx)
    }
}

/// Outcome of checking a request against a route's role restriction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Access {
    Granted,
    RedirectToLogin,
    RedirectHome,
}

/// Decide whether `ctx` may open a route restricted to `allowed` roles.
///
/// An empty `allowed` slice means "any signed-in identity".
#[must_use]
pub fn check_access(ctx: &AuthContext, allowed: &[Role]) -> Access {
    if !ctx.is_authenticated() {
        return Access::RedirectToLogin;
    }
    if allowed.is_empty() {
        return Access::Granted;
    }
    match ctx.role() {
        Some(role) if allowed.contains(&role) => Access::Granted,
        _ => Access::RedirectHome,
    }
}

/// Error returned by the route guards.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthRejection {
    /// Not signed in.
    RedirectToLogin,
    /// Signed in, but not allowed here.
    RedirectHome,
}

impl IntoResponse for AuthRejection {
    fn into_response(self) -> Response {
        match self {
            Self::RedirectToLogin => Redirect::to("/login").into_response(),
            Self::RedirectHome => Redirect::to("/").into_response(),
        }
    }
}

async fn guard(
    parts: &mut Parts,
    state: &AppState,
    allowed: &[Role],
) -> Result<AuthContext, AuthRejection> {
    let Ok(ctx) = AuthContext::from_request_parts(parts, state).await;
    match check_access(&ctx, allowed) {
        Access::Granted => Ok(ctx),
        Access::RedirectToLogin => Err(AuthRejection::RedirectToLogin),
        Access::RedirectHome => Err(AuthRejection::RedirectHome),
    }
}

/// A signed-in request. The profile may be missing.
#[derive(Debug, Clone)]
pub struct SignedIn {
    pub identity: CurrentUser,
    pub profile: Option<User>,
}

/// Extractor that requires a signed-in identity.
///
/// # Example
///
/// ```rust,ignore
/// async fn profile(RequireAuth(user): RequireAuth) -> impl IntoResponse {
///     format!("Hello, {}!", user.identity.email)
/// }
/// ```
pub struct RequireAuth(pub SignedIn);

impl FromRequestParts<AppState> for RequireAuth {
    type Rejection = AuthRejection;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let ctx = guard(parts, state, &[]).await?;
        let identity = ctx.identity.ok_or(AuthRejection::RedirectToLogin)?;
        Ok(Self(SignedIn {
            identity,
            profile: ctx.profile,
        }))
    }
}

/// Extractor that requires the `admin` role.
pub struct RequireAdmin(pub User);

impl FromRequestParts<AppState> for RequireAdmin {
    type Rejection = AuthRejection;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let ctx = guard(parts, state, &[Role::Admin]).await?;
        ctx.profile.map(Self).ok_or(AuthRejection::RedirectHome)
    }
}

/// Extractor that requires the `store_owner` role.
pub struct RequireStoreOwner(pub User);

impl FromRequestParts<AppState> for RequireStoreOwner {
    type Rejection = AuthRejection;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let ctx = guard(parts, state, &[Role::StoreOwner]).await?;
        ctx.profile.map(Self).ok_or(AuthRejection::RedirectHome)
    }
}

/// Extractor for pages only signed-out visitors should see.
pub struct GuestOnly;

impl FromRequestParts<AppState> for GuestOnly {
    type Rejection = AuthRejection;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let Ok(ctx) = AuthContext::from_request_parts(parts, state).await;
        if ctx.is_authenticated() {
            Err(AuthRejection::RedirectHome)
        } else {
            Ok(Self)
        }
    }
}

/// Helper to set the current user in the session.
///
/// The session id is rotated first so a pre-login id cannot be reused.
///
/// # Errors
///
/// Returns an error if the session cannot be modified.
pub async fn set_current_user(
    session: &Session,
    user: &CurrentUser,
) -> Result<(), tower_sessions::session::Error> {
    session.cycle_id().await?;
    session.insert(session_keys::CURRENT_USER, user).await
}

/// Helper to end the session entirely (logout).
///
/// # Errors
///
/// Returns an error if the session cannot be modified.
pub async fn clear_current_user(session: &Session) -> Result<(), tower_sessions::session::Error> {
    session.flush().await
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use chrono::Utc;
    use store_ratings_core::{Email, UserId};

    use super::*;

    fn ctx(role: Option<Role>) -> AuthContext {
        let uid = UserId::generate();
        let email = Email::parse("jane@example.com").unwrap();
        AuthContext {
            identity: Some(CurrentUser {
                uid,
                email: email.clone(),
            }),
            profile: role.map(|role| User {
                id: uid,
                name: "Jane Quincy Adams-Doe".to_string(),
                email,
                address: "1 Main St".to_string(),
                role,
                created_at: Utc::now(),
            }),
        }
    }

    #[test]
    fn test_anonymous_is_sent_to_login() {
        let anon = AuthContext::default();
        assert_eq!(check_access(&anon, &[]), Access::RedirectToLogin);
        assert_eq!(check_access(&anon, &[Role::Admin]), Access::RedirectToLogin);
    }

    #[test]
    fn test_wrong_role_is_sent_home() {
        assert_eq!(
            check_access(&ctx(Some(Role::User)), &[Role::Admin]),
            Access::RedirectHome
        );
        assert_eq!(
            check_access(&ctx(Some(Role::Admin)), &[Role::StoreOwner]),
            Access::RedirectHome
        );
    }

    #[test]
    fn test_allowed_role_is_granted() {
        assert_eq!(
            check_access(&ctx(Some(Role::Admin)), &[Role::Admin]),
            Access::Granted
        );
        assert_eq!(
            check_access(&ctx(Some(Role::StoreOwner)), &[Role::Admin, Role::StoreOwner]),
            Access::Granted
        );
        assert_eq!(check_access(&ctx(Some(Role::User)), &[]), Access::Granted);
    }

    #[test]
    fn test_missing_profile_has_no_role() {
        let no_profile = ctx(None);
        assert_eq!(check_access(&no_profile, &[]), Access::Granted);
        assert_eq!(check_access(&no_profile, &[Role::User]), Access::RedirectHome);
        assert!(!no_profile.is_admin());
        assert!(!no_profile.is_normal_user());
    }

    #[test]
    fn test_role_flags_are_exclusive() {
        let owner = ctx(Some(Role::StoreOwner));
        assert!(owner.is_store_owner());
        assert!(!owner.is_admin());
        assert!(!owner.is_normal_user());
    }
}
