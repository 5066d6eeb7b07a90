//! Account route handlers: profile and password change.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::{Query, State},
    response::{IntoResponse, Redirect},
};
use serde::Deserialize;

use store_ratings_core::format_date;

use crate::filters;
use crate::middleware::{AuthContext, RequireAuth};
use crate::routes::{MessageQuery, Nav, message_for};
use crate::services::AccountService;
use crate::state::AppState;

const PASSWORD_ERRORS: &[(&str, &str)] = &[
    ("wrong-password", "Current password is incorrect."),
    ("weak-password", "New password is too weak."),
    (
        "requires-recent-login",
        "Please log out and log back in before changing your password.",
    ),
];
const PASSWORD_FALLBACK: &str = "Failed to update password. Please try again.";
const PASSWORD_SUCCESS: &[(&str, &str)] = &[("updated", "Password updated successfully!")];

/// Password change form data.
#[derive(Debug, Deserialize)]
pub struct UpdatePasswordForm {
    pub current_password: String,
    pub new_password: String,
    pub confirm_password: String,
}

/// Profile fields as displayed.
pub struct ProfileView {
    pub name: String,
    pub email: String,
    pub address: String,
    pub role_label: String,
    pub member_since: String,
}

/// Profile page template.
#[derive(Template, WebTemplate)]
#[template(path = "account/profile.html")]
pub struct ProfileTemplate {
    pub nav: Nav,
    pub profile: ProfileView,
}

/// Password change page template.
#[derive(Template, WebTemplate)]
#[template(path = "account/update_password.html")]
pub struct UpdatePasswordTemplate {
    pub nav: Nav,
    pub error: Option<String>,
    pub success: Option<String>,
}

/// Display the signed-in user's profile.
pub async fn profile(RequireAuth(user): RequireAuth, ctx: AuthContext) -> impl IntoResponse {
    let missing = || "\u{2014}".to_string();
    let profile = user.profile.as_ref().map_or_else(
        || ProfileView {
            name: missing(),
            email: user.identity.email.to_string(),
            address: missing(),
            role_label: missing(),
            member_since: missing(),
        },
        |p| ProfileView {
            name: p.name.clone(),
            email: p.email.to_string(),
            address: p.address.clone(),
            role_label: p.role.label().to_string(),
            member_since: format_date(p.created_at),
        },
    );

    ProfileTemplate {
        nav: Nav::from(&ctx),
        profile,
    }
}

/// Display the password change form.
pub async fn update_password_page(
    RequireAuth(_user): RequireAuth,
    ctx: AuthContext,
    Query(query): Query<MessageQuery>,
) -> impl IntoResponse {
    UpdatePasswordTemplate {
        nav: Nav::from(&ctx),
        error: message_for(query.error.as_deref(), PASSWORD_ERRORS, PASSWORD_FALLBACK),
        success: message_for(query.success.as_deref(), PASSWORD_SUCCESS, "Done."),
    }
}

/// Handle password change form submission.
pub async fn update_password(
    RequireAuth(user): RequireAuth,
    State(state): State<AppState>,
    Form(form): Form<UpdatePasswordForm>,
) -> Redirect {
    let service = AccountService::new(state.identity(), state.store());
    match service
        .change_password(
            &user.identity,
            &form.current_password,
            &form.new_password,
            &form.confirm_password,
        )
        .await
    {
        Ok(()) => Redirect::to("/update-password?success=updated"),
        Err(e) => {
            tracing::warn!(uid = %user.identity.uid, error = %e, "Password change failed");
            Redirect::to(&format!("/update-password?error={}", e.code()))
        }
    }
}
