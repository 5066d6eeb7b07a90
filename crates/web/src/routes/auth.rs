//! Authentication route handlers: login, registration, logout.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::{Query, State},
    response::{IntoResponse, Redirect, Response},
};
use serde::Deserialize;
use tower_sessions::Session;

use crate::error::{clear_sentry_user, set_sentry_user};
use crate::filters;
use crate::middleware::{AuthContext, GuestOnly, clear_current_user, set_current_user};
use crate::models::CurrentUser;
use crate::routes::{MessageQuery, Nav, message_for};
use crate::services::{AccountService, Registration};
use crate::state::AppState;

const LOGIN_ERRORS: &[(&str, &str)] = &[
    ("invalid-credential", "Invalid email or password. Please try again."),
    ("user-not-found", "No account found with this email."),
    ("too-many-requests", "Too many attempts. Please try again later."),
];
const LOGIN_FALLBACK: &str = "Failed to log in. Please try again.";

const REGISTER_ERRORS: &[(&str, &str)] = &[
    ("email-already-in-use", "This email is already in use."),
    ("weak-password", "Password is too weak."),
];
const REGISTER_FALLBACK: &str = "Registration failed. Please try again.";

// =============================================================================
// Form Types
// =============================================================================

/// Login form data.
#[derive(Debug, Deserialize)]
pub struct LoginForm {
    pub email: String,
    pub password: String,
}

/// Registration form data.
#[derive(Debug, Deserialize)]
pub struct RegisterForm {
    pub name: String,
    pub email: String,
    pub address: String,
    pub password: String,
    pub confirm_password: String,
}

// =============================================================================
// Templates
// =============================================================================

/// Login page template.
#[derive(Template, WebTemplate)]
#[template(path = "auth/login.html")]
pub struct LoginTemplate {
    pub nav: Nav,
    pub error: Option<String>,
}

/// Register page template.
#[derive(Template, WebTemplate)]
#[template(path = "auth/register.html")]
pub struct RegisterTemplate {
    pub nav: Nav,
    pub error: Option<String>,
}

// =============================================================================
// Login Routes
// =============================================================================

/// Display the login page.
pub async fn login_page(_guest: GuestOnly, Query(query): Query<MessageQuery>) -> impl IntoResponse {
    LoginTemplate {
        nav: Nav::default(),
        error: message_for(query.error.as_deref(), LOGIN_ERRORS, LOGIN_FALLBACK),
    }
}

/// Handle login form submission.
pub async fn login(
    _guest: GuestOnly,
    State(state): State<AppState>,
    session: Session,
    Form(form): Form<LoginForm>,
) -> Response {
    let service = AccountService::new(state.identity(), state.store());
    match service
        .sign_in(state.sign_in_throttle(), &form.email, &form.password)
        .await
    {
        Ok(user) => start_session(&session, &user, "/?success=signed-in", "/login").await,
        Err(e) => {
            tracing::warn!(error = %e, "Login failed");
            Redirect::to(&format!("/login?error={}", e.code())).into_response()
        }
    }
}

// =============================================================================
// Registration Routes
// =============================================================================

/// Display the registration page.
pub async fn register_page(
    _guest: GuestOnly,
    Query(query): Query<MessageQuery>,
) -> impl IntoResponse {
    RegisterTemplate {
        nav: Nav::default(),
        error: message_for(query.error.as_deref(), REGISTER_ERRORS, REGISTER_FALLBACK),
    }
}

/// Handle registration form submission.
///
/// New accounts always get the `user` role and are signed in right away.
pub async fn register(
    _guest: GuestOnly,
    State(state): State<AppState>,
    session: Session,
    Form(form): Form<RegisterForm>,
) -> Response {
    let service = AccountService::new(state.identity(), state.store());
    let registration = Registration {
        name: &form.name,
        email: &form.email,
        address: &form.address,
        password: &form.password,
        confirm_password: &form.confirm_password,
    };

    match service.register(&registration).await {
        Ok(user) => start_session(&session, &user, "/?success=registered", "/register").await,
        Err(e) => {
            tracing::warn!(error = %e, "Registration failed");
            Redirect::to(&format!("/register?error={}", e.code())).into_response()
        }
    }
}

// =============================================================================
// Logout
// =============================================================================

/// Handle logout.
///
/// The session is always cleared, even if the provider sign-out fails.
pub async fn logout(
    State(state): State<AppState>,
    ctx: AuthContext,
    session: Session,
) -> Redirect {
    if let Some(user) = &ctx.identity {
        let service = AccountService::new(state.identity(), state.store());
        if let Err(e) = service.sign_out(user).await {
            tracing::warn!(error = %e, "Provider sign-out failed");
        }
    }

    if let Err(e) = clear_current_user(&session).await {
        tracing::error!(error = %e, "Failed to clear session");
    }
    clear_sentry_user();

    Redirect::to("/")
}

async fn start_session(
    session: &Session,
    user: &CurrentUser,
    success_to: &str,
    failure_to: &str,
) -> Response {
    if let Err(e) = set_current_user(session, user).await {
        tracing::error!(error = %e, "Failed to set session");
        return Redirect::to(&format!("{failure_to}?error=session")).into_response();
    }
    set_sentry_user(&user.uid, Some(user.email.as_str()));
    Redirect::to(success_to).into_response()
}
