//! Store owner dashboard.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
};

use store_ratings_core::{StarBucket, format_date};

use crate::filters;
use crate::middleware::{AuthContext, RequireStoreOwner};
use crate::routes::Nav;
use crate::services::RatingService;
use crate::state::AppState;

/// One rater row.
pub struct RaterView {
    pub name: String,
    pub email: String,
    pub value: i32,
    pub date: String,
}

/// Store owner dashboard template.
#[derive(Template, WebTemplate)]
#[template(path = "owner/dashboard.html")]
pub struct OwnerDashboardTemplate {
    pub nav: Nav,
    pub store_name: String,
    pub store_address: String,
    pub average: f64,
    pub rating_count: usize,
    pub unique_raters: usize,
    pub distribution: Vec<StarBucket>,
    pub raters: Vec<RaterView>,
}

/// Message page shown instead of the dashboard.
#[derive(Template, WebTemplate)]
#[template(path = "owner/no_store.html")]
pub struct OwnerMessageTemplate {
    pub nav: Nav,
    pub message: String,
    pub retry: bool,
}

/// Display the dashboard of the store owned by the signed-in store owner.
pub async fn dashboard(
    RequireStoreOwner(owner): RequireStoreOwner,
    State(state): State<AppState>,
    ctx: AuthContext,
) -> Response {
    let nav = Nav::from(&ctx);

    let dashboard = match RatingService::new(state.store())
        .owner_dashboard(owner.id)
        .await
    {
        Ok(Some(dashboard)) => dashboard,
        Ok(None) => {
            return OwnerMessageTemplate {
                nav,
                message: "You don\u{2019}t have a store yet. Please ask an admin to create one."
                    .to_string(),
                retry: false,
            }
            .into_response();
        }
        Err(e) => {
            tracing::error!(owner_id = %owner.id, error = %e, "Failed to load owner dashboard");
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                OwnerMessageTemplate {
                    nav,
                    message: "Failed to load store data. Please try again later.".to_string(),
                    retry: true,
                },
            )
                .into_response();
        }
    };

    OwnerDashboardTemplate {
        nav,
        store_name: dashboard.summary.store.name.clone(),
        store_address: dashboard.summary.store.address.clone(),
        average: dashboard.summary.average,
        rating_count: dashboard.summary.rating_count,
        unique_raters: dashboard.unique_raters,
        distribution: dashboard.distribution,
        raters: dashboard
            .raters
            .into_iter()
            .map(|r| RaterView {
                name: r.name,
                email: r.email,
                value: r.value,
                date: format_date(r.rating.created_at),
            })
            .collect(),
    }
    .into_response()
}
