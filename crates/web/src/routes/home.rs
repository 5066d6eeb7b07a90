//! Home page and the catch-all 404.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    extract::Query,
    http::StatusCode,
    response::{IntoResponse, Response},
};

use crate::filters;
use crate::middleware::AuthContext;
use crate::routes::{MessageQuery, Nav, message_for};

const SUCCESS_MESSAGES: &[(&str, &str)] = &[
    ("signed-in", "Successfully logged in!"),
    ("registered", "Account created successfully!"),
];

/// Home page template.
#[derive(Template, WebTemplate)]
#[template(path = "home.html")]
pub struct HomeTemplate {
    pub nav: Nav,
    pub success: Option<String>,
}

/// Not found page template.
#[derive(Template, WebTemplate)]
#[template(path = "errors/not_found.html")]
pub struct NotFoundTemplate {
    pub nav: Nav,
}

/// Display the home page.
pub async fn home(ctx: AuthContext, Query(query): Query<MessageQuery>) -> impl IntoResponse {
    HomeTemplate {
        nav: Nav::from(&ctx),
        success: message_for(query.success.as_deref(), SUCCESS_MESSAGES, "Done."),
    }
}

/// Fallback for unknown paths.
pub async fn not_found(ctx: AuthContext) -> Response {
    (
        StatusCode::NOT_FOUND,
        NotFoundTemplate {
            nav: Nav::from(&ctx),
        },
    )
        .into_response()
}
