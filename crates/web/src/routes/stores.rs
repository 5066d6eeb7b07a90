//! Store listing, store detail, and rating submission.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Redirect, Response},
};
use serde::Deserialize;

use store_ratings_core::{
    StoreId, filter_by_search_term, format_date, truncate_text, validate_rating,
};

use crate::error::AppError;
use crate::filters;
use crate::middleware::{AuthContext, RequireAuth};
use crate::models::UpsertOutcome;
use crate::routes::{Nav, message_for};
use crate::services::{RatingService, StoreSummary};
use crate::state::AppState;

const RATING_ERRORS: &[(&str, &str)] = &[
    ("role-forbidden", "Admins and store owners cannot rate stores"),
    ("profile-missing", "You must be logged in to submit a rating"),
];
const RATING_FALLBACK: &str = "Failed to submit rating. Please try again.";
const RATING_SUCCESS: &[(&str, &str)] = &[
    ("created", "Rating submitted successfully!"),
    ("updated", "Rating updated successfully!"),
];

/// Addresses longer than this are shortened on store cards.
const CARD_ADDRESS_LEN: usize = 80;

// =============================================================================
// Query and Form Types
// =============================================================================

/// Store list query parameters.
#[derive(Debug, Default, Deserialize)]
pub struct StoreListQuery {
    pub q: Option<String>,
}

/// Store detail query parameters.
#[derive(Debug, Default, Deserialize)]
pub struct StoreDetailQuery {
    pub error: Option<String>,
    pub success: Option<String>,
}

/// Rating form data. The value is parsed by hand so a missing or garbled
/// value yields a message instead of a 422.
#[derive(Debug, Deserialize)]
pub struct RatingForm {
    #[serde(default)]
    pub value: String,
}

// =============================================================================
// View Types
// =============================================================================

/// One store card on the listing.
pub struct StoreCard {
    pub id: String,
    pub name: String,
    pub address: String,
    pub average: f64,
    pub rating_count: usize,
}

impl From<&StoreSummary> for StoreCard {
    fn from(summary: &StoreSummary) -> Self {
        Self {
            id: summary.store.id.to_string(),
            name: summary.store.name.clone(),
            address: truncate_text(&summary.store.address, CARD_ADDRESS_LEN),
            average: summary.average,
            rating_count: summary.rating_count,
        }
    }
}

/// One rating on the store detail page.
pub struct RatingRow {
    pub value: i32,
    /// "Rated on Jan 5, 2025" or "Updated on Jan 6, 2025".
    pub when: String,
}

/// A star option of the rating form.
pub struct StarOption {
    pub value: i32,
    pub checked: bool,
}

// =============================================================================
// Templates
// =============================================================================

/// Store list template.
#[derive(Template, WebTemplate)]
#[template(path = "stores/list.html")]
pub struct StoreListTemplate {
    pub nav: Nav,
    pub stores: Vec<StoreCard>,
    pub total: usize,
    pub search: String,
    pub load_error: bool,
}

/// Store detail template.
#[derive(Template, WebTemplate)]
#[template(path = "stores/detail.html")]
pub struct StoreDetailTemplate {
    pub nav: Nav,
    pub id: String,
    pub name: String,
    pub email: String,
    pub address: String,
    pub average: f64,
    pub rating_count: usize,
    pub ratings: Vec<RatingRow>,
    pub can_rate: bool,
    pub has_own_rating: bool,
    pub star_options: Vec<StarOption>,
    pub error: Option<String>,
    pub success: Option<String>,
}

/// Store-not-found template.
#[derive(Template, WebTemplate)]
#[template(path = "stores/missing.html")]
pub struct StoreMissingTemplate {
    pub nav: Nav,
    pub message: String,
}

// =============================================================================
// Handlers
// =============================================================================

/// Display all stores, optionally filtered by `q` over name and address.
pub async fn index(
    State(state): State<AppState>,
    ctx: AuthContext,
    Query(query): Query<StoreListQuery>,
) -> impl IntoResponse {
    let search = query.q.unwrap_or_default();
    let nav = Nav::from(&ctx);

    match RatingService::new(state.store()).store_summaries().await {
        Ok(summaries) => {
            let total = summaries.len();
            let found = filter_by_search_term(summaries, &search, |s| {
                [s.store.name.as_str(), s.store.address.as_str()]
            });
            StoreListTemplate {
                nav,
                stores: found.iter().map(StoreCard::from).collect(),
                total,
                search,
                load_error: false,
            }
        }
        Err(e) => {
            tracing::error!(error = %e, "Failed to load stores");
            StoreListTemplate {
                nav,
                stores: Vec::new(),
                total: 0,
                search,
                load_error: true,
            }
        }
    }
}

/// Display one store with its ratings.
pub async fn show(
    State(state): State<AppState>,
    ctx: AuthContext,
    Path(id): Path<String>,
    Query(query): Query<StoreDetailQuery>,
) -> Response {
    let nav = Nav::from(&ctx);
    let Ok(store_id) = id.parse::<StoreId>() else {
        return store_missing(nav, StatusCode::NOT_FOUND, "Store not found");
    };

    let viewer = ctx.identity.as_ref().map(|i| i.uid);
    let detail = match RatingService::new(state.store())
        .store_detail(store_id, viewer)
        .await
    {
        Ok(Some(detail)) => detail,
        Ok(None) => return store_missing(nav, StatusCode::NOT_FOUND, "Store not found"),
        Err(e) => {
            tracing::error!(store_id = %store_id, error = %e, "Failed to load store");
            return store_missing(
                nav,
                StatusCode::INTERNAL_SERVER_ERROR,
                "Failed to load store data. Please try again later.",
            );
        }
    };

    let own = detail.own_rating.unwrap_or(0);
    let store = &detail.summary.store;
    StoreDetailTemplate {
        id: store.id.to_string(),
        name: store.name.clone(),
        email: store.email.to_string(),
        address: store.address.clone(),
        average: detail.summary.average,
        rating_count: detail.summary.rating_count,
        ratings: detail
            .ratings
            .iter()
            .map(|r| RatingRow {
                value: r.value,
                when: r.updated_at.map_or_else(
                    || format!("Rated on {}", format_date(r.created_at)),
                    |at| format!("Updated on {}", format_date(at)),
                ),
            })
            .collect(),
        can_rate: ctx.is_normal_user(),
        has_own_rating: detail.own_rating.is_some(),
        star_options: (1..=5)
            .map(|value| StarOption {
                value,
                checked: value == own,
            })
            .collect(),
        error: message_for(query.error.as_deref(), RATING_ERRORS, RATING_FALLBACK),
        success: message_for(query.success.as_deref(), RATING_SUCCESS, "Done."),
        nav,
    }
    .into_response()
}

/// Submit or update the signed-in user's rating of a store.
///
/// Admins and store owners are refused, as are identities without a profile.
pub async fn rate(
    RequireAuth(user): RequireAuth,
    State(state): State<AppState>,
    Path(id): Path<String>,
    Form(form): Form<RatingForm>,
) -> Result<Redirect, AppError> {
    let store_id: StoreId = id
        .parse()
        .map_err(|_| AppError::NotFound(format!("store {id}")))?;
    let back = |query: &str| Redirect::to(&format!("/stores/{store_id}?{query}"));

    let Some(profile) = &user.profile else {
        return Ok(back("error=profile-missing"));
    };
    if !profile.role.can_rate() {
        tracing::warn!(uid = %profile.id, role = %profile.role, "Rating refused for role");
        return Ok(back("error=role-forbidden"));
    }

    let value: i32 = form.value.trim().parse().unwrap_or(0);
    if let Err(e) = validate_rating(value) {
        return Ok(back(&format!("error={}", e.code())));
    }

    if state.store().get_store(store_id).await?.is_none() {
        return Err(AppError::NotFound(format!("store {store_id}")));
    }

    match RatingService::new(state.store()).submit(profile.id, store_id, value).await {
        Ok(UpsertOutcome::Created) => Ok(back("success=created")),
        Ok(UpsertOutcome::Updated) => Ok(back("success=updated")),
        Err(e) => {
            tracing::error!(store_id = %store_id, error = %e, "Failed to save rating");
            Ok(back("error=save-failed"))
        }
    }
}

fn store_missing(nav: Nav, status: StatusCode, message: &str) -> Response {
    (
        status,
        StoreMissingTemplate {
            nav,
            message: message.to_string(),
        },
    )
        .into_response()
}
