//! Admin route handlers.
//!
//! Every handler requires the `admin` role via [`RequireAdmin`].

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Redirect, Response},
};
use serde::Deserialize;

use store_ratings_core::{Role, SortOrder, UserId, format_date};

use crate::filters;
use crate::middleware::{AuthContext, RequireAdmin};
use crate::routes::{Nav, message_for};
use crate::services::{
    AdminService, DashboardCounts, RoleCounts, StoreFilter, StoreSortField, UserFilter, UserForm,
    UserSortField,
};
use crate::state::AppState;

const USER_FORM_ERRORS: &[(&str, &str)] = &[
    ("email-already-in-use", "This email is already in use."),
    ("invalid-email", "Invalid email format."),
    ("email-invalid", "Invalid email format."),
    ("weak-password", "Password is too weak."),
    ("role-required", "Role is required"),
    ("user-not-found", "User not found"),
];
const USER_FORM_FALLBACK: &str = "Failed to save user. Please try again.";
const USER_LIST_SUCCESS: &[(&str, &str)] = &[
    ("user-created", "User created successfully"),
    ("store-owner-created", "Store owner and store created successfully"),
    ("user-updated", "User updated successfully"),
];

// =============================================================================
// Query and Form Types
// =============================================================================

/// User list query parameters.
#[derive(Debug, Default, Deserialize)]
pub struct UsersQuery {
    pub q: Option<String>,
    pub role: Option<String>,
    pub sort: Option<String>,
    pub order: Option<String>,
    pub success: Option<String>,
}

impl UsersQuery {
    fn filter(&self) -> UserFilter {
        UserFilter {
            search: self.q.clone().unwrap_or_default(),
            role: self.role.as_deref().and_then(|r| r.parse().ok()),
            sort: parse_or_default(self.sort.as_deref()),
            order: parse_or_default(self.order.as_deref()),
        }
    }
}

/// Store list query parameters.
#[derive(Debug, Default, Deserialize)]
pub struct StoresQuery {
    pub q: Option<String>,
    pub band: Option<String>,
    pub sort: Option<String>,
    pub order: Option<String>,
}

impl StoresQuery {
    fn filter(&self) -> StoreFilter {
        StoreFilter {
            search: self.q.clone().unwrap_or_default(),
            band: self
                .band
                .as_deref()
                .and_then(|b| b.parse::<u8>().ok())
                .filter(|b| (1..=5).contains(b)),
            sort: parse_or_default(self.sort.as_deref()),
            order: parse_or_default(self.order.as_deref()),
        }
    }
}

/// Form error query parameters.
#[derive(Debug, Default, Deserialize)]
pub struct FormQuery {
    pub error: Option<String>,
}

/// User create/edit form data.
#[derive(Debug, Deserialize)]
pub struct UserFormData {
    pub name: String,
    #[serde(default)]
    pub email: String,
    pub address: String,
    #[serde(default)]
    pub password: String,
    #[serde(default)]
    pub confirm_password: String,
    #[serde(default)]
    pub role: String,
    pub store_name: Option<String>,
}

impl UserFormData {
    fn as_form(&self, role: Role) -> UserForm<'_> {
        UserForm {
            name: &self.name,
            email: &self.email,
            address: &self.address,
            password: &self.password,
            confirm_password: &self.confirm_password,
            role,
            store_name: self.store_name.as_deref(),
        }
    }
}

// =============================================================================
// View Types
// =============================================================================

/// Clickable column header.
pub struct SortLink {
    pub label: &'static str,
    pub href: String,
    /// Arrow for the active column, empty otherwise.
    pub indicator: &'static str,
}

/// Option of a `<select>`.
pub struct SelectOption {
    pub value: String,
    pub label: String,
    pub selected: bool,
}

/// One row of the user table.
pub struct UserRow {
    pub id: String,
    pub name: String,
    pub email: String,
    pub address: String,
    pub role: &'static str,
    pub role_label: &'static str,
    pub joined: String,
}

/// One row of the store table.
pub struct StoreRow {
    pub id: String,
    pub name: String,
    pub email: String,
    pub address: String,
    pub average: f64,
    pub rating_count: usize,
}

// =============================================================================
// Templates
// =============================================================================

/// Admin dashboard template.
#[derive(Template, WebTemplate)]
#[template(path = "admin/dashboard.html")]
pub struct DashboardTemplate {
    pub nav: Nav,
    pub counts: Option<DashboardCounts>,
    pub ratings_per_store: f64,
}

/// User list template.
#[derive(Template, WebTemplate)]
#[template(path = "admin/users.html")]
pub struct UsersTemplate {
    pub nav: Nav,
    pub users: Vec<UserRow>,
    pub total: usize,
    pub role_counts: RoleCounts,
    pub search: String,
    pub role_options: Vec<SelectOption>,
    pub sort_order: String,
    pub sort_field: String,
    pub columns: Vec<SortLink>,
    pub success: Option<String>,
    pub load_error: bool,
}

/// Store list template.
#[derive(Template, WebTemplate)]
#[template(path = "admin/stores.html")]
pub struct StoresTemplate {
    pub nav: Nav,
    pub stores: Vec<StoreRow>,
    pub total: usize,
    pub search: String,
    pub band_options: Vec<SelectOption>,
    pub sort_order: String,
    pub sort_field: String,
    pub columns: Vec<SortLink>,
    pub load_error: bool,
}

/// User create/edit form template.
#[derive(Template, WebTemplate)]
#[template(path = "admin/user_form.html")]
pub struct UserFormTemplate {
    pub nav: Nav,
    pub is_edit: bool,
    pub action: String,
    pub name: String,
    pub email: String,
    pub address: String,
    pub role_options: Vec<SelectOption>,
    pub error: Option<String>,
}

/// Admin message page (missing user, load failure).
#[derive(Template, WebTemplate)]
#[template(path = "admin/message.html")]
pub struct AdminMessageTemplate {
    pub nav: Nav,
    pub message: String,
    pub back_href: &'static str,
    pub back_label: &'static str,
}

// =============================================================================
// Dashboard
// =============================================================================

/// Display collection totals.
pub async fn dashboard(
    RequireAdmin(_admin): RequireAdmin,
    State(state): State<AppState>,
    ctx: AuthContext,
) -> impl IntoResponse {
    let counts = match AdminService::new(state.identity(), state.store())
        .dashboard()
        .await
    {
        Ok(counts) => Some(counts),
        Err(e) => {
            tracing::error!(error = %e, "Failed to load dashboard counts");
            None
        }
    };

    DashboardTemplate {
        nav: Nav::from(&ctx),
        ratings_per_store: counts.map_or(0.0, |c| c.ratings_per_store()),
        counts,
    }
}

// =============================================================================
// Users
// =============================================================================

/// Display the user list.
pub async fn users(
    RequireAdmin(_admin): RequireAdmin,
    State(state): State<AppState>,
    ctx: AuthContext,
    Query(query): Query<UsersQuery>,
) -> impl IntoResponse {
    let filter = query.filter();
    let role_param = filter.role.map_or("all", Role::as_str);
    let base = format!(
        "/admin/users?q={}&role={role_param}",
        urlencoding::encode(&filter.search)
    );

    let columns = [
        ("Name", UserSortField::Name),
        ("Email", UserSortField::Email),
        ("Address", UserSortField::Address),
        ("Role", UserSortField::Role),
    ]
    .into_iter()
    .map(|(label, field)| {
        sort_link(&base, label, field.as_str(), field == filter.sort, filter.order)
    })
    .collect();

    let mut role_options = vec![SelectOption {
        value: "all".to_string(),
        label: "All Roles".to_string(),
        selected: filter.role.is_none(),
    }];
    role_options.extend(Role::ALL.into_iter().map(|role| SelectOption {
        value: role.as_str().to_string(),
        label: role.label().to_string(),
        selected: filter.role == Some(role),
    }));

    let listing = AdminService::new(state.identity(), state.store())
        .list_users(&filter)
        .await;
    let (users, total, role_counts, load_error) = match listing {
        Ok(listing) => (
            listing
                .users
                .iter()
                .map(|u| UserRow {
                    id: u.id.to_string(),
                    name: u.name.clone(),
                    email: u.email.to_string(),
                    address: u.address.clone(),
                    role: u.role.as_str(),
                    role_label: u.role.label(),
                    joined: format_date(u.created_at),
                })
                .collect(),
            listing.total,
            listing.role_counts,
            false,
        ),
        Err(e) => {
            tracing::error!(error = %e, "Failed to load users");
            (Vec::new(), 0, RoleCounts::default(), true)
        }
    };

    UsersTemplate {
        nav: Nav::from(&ctx),
        users,
        total,
        role_counts,
        search: filter.search,
        role_options,
        sort_order: filter.order.as_str().to_string(),
        sort_field: filter.sort.as_str().to_string(),
        columns,
        success: message_for(query.success.as_deref(), USER_LIST_SUCCESS, "Saved."),
        load_error,
    }
}

/// Display the new user form.
pub async fn new_user(
    RequireAdmin(_admin): RequireAdmin,
    ctx: AuthContext,
    Query(query): Query<FormQuery>,
) -> impl IntoResponse {
    UserFormTemplate {
        nav: Nav::from(&ctx),
        is_edit: false,
        action: "/admin/users/new".to_string(),
        name: String::new(),
        email: String::new(),
        address: String::new(),
        role_options: role_select(Role::User),
        error: message_for(query.error.as_deref(), USER_FORM_ERRORS, USER_FORM_FALLBACK),
    }
}

/// Handle new user form submission.
pub async fn create_user(
    RequireAdmin(admin): RequireAdmin,
    State(state): State<AppState>,
    Form(form): Form<UserFormData>,
) -> Redirect {
    let Ok(role) = form.role.parse::<Role>() else {
        return Redirect::to("/admin/users/new?error=role-required");
    };

    match AdminService::new(state.identity(), state.store())
        .create_user(&form.as_form(role))
        .await
    {
        Ok(saved) => Redirect::to(&format!("/admin/users?success={}", saved.code())),
        Err(e) => {
            tracing::warn!(admin = %admin.id, error = %e, "Admin user creation failed");
            Redirect::to(&format!("/admin/users/new?error={}", e.code()))
        }
    }
}

/// Display the edit form of one user.
pub async fn edit_user(
    RequireAdmin(_admin): RequireAdmin,
    State(state): State<AppState>,
    ctx: AuthContext,
    Path(id): Path<String>,
    Query(query): Query<FormQuery>,
) -> Response {
    let nav = Nav::from(&ctx);
    let Ok(user_id) = id.parse::<UserId>() else {
        return user_message(nav, StatusCode::NOT_FOUND, "User not found");
    };

    let user = match AdminService::new(state.identity(), state.store())
        .get_user(user_id)
        .await
    {
        Ok(Some(user)) => user,
        Ok(None) => return user_message(nav, StatusCode::NOT_FOUND, "User not found"),
        Err(e) => {
            tracing::error!(uid = %user_id, error = %e, "Failed to load user");
            return user_message(
                nav,
                StatusCode::INTERNAL_SERVER_ERROR,
                "Failed to load user data. Please try again later.",
            );
        }
    };

    UserFormTemplate {
        nav,
        is_edit: true,
        action: format!("/admin/users/{}", user.id),
        name: user.name,
        email: user.email.into_inner(),
        address: user.address,
        role_options: role_select(user.role),
        error: message_for(query.error.as_deref(), USER_FORM_ERRORS, USER_FORM_FALLBACK),
    }
    .into_response()
}

/// Handle edit form submission.
pub async fn update_user(
    RequireAdmin(admin): RequireAdmin,
    State(state): State<AppState>,
    Path(id): Path<String>,
    Form(form): Form<UserFormData>,
) -> Redirect {
    let Ok(user_id) = id.parse::<UserId>() else {
        return Redirect::to("/admin/users");
    };
    let Ok(role) = form.role.parse::<Role>() else {
        return Redirect::to(&format!("/admin/users/{user_id}?error=role-required"));
    };

    match AdminService::new(state.identity(), state.store())
        .update_user(user_id, &form.as_form(role))
        .await
    {
        Ok(saved) => Redirect::to(&format!("/admin/users?success={}", saved.code())),
        Err(e) => {
            tracing::warn!(admin = %admin.id, uid = %user_id, error = %e, "Admin user update failed");
            Redirect::to(&format!("/admin/users/{user_id}?error={}", e.code()))
        }
    }
}

// =============================================================================
// Stores
// =============================================================================

/// Display the store list.
pub async fn stores(
    RequireAdmin(_admin): RequireAdmin,
    State(state): State<AppState>,
    ctx: AuthContext,
    Query(query): Query<StoresQuery>,
) -> impl IntoResponse {
    let filter = query.filter();
    let band_param = filter.band.map(|b| b.to_string()).unwrap_or_default();
    let base = format!(
        "/admin/stores?q={}&band={band_param}",
        urlencoding::encode(&filter.search)
    );

    let columns = [
        ("Name", StoreSortField::Name),
        ("Email", StoreSortField::Email),
        ("Address", StoreSortField::Address),
        ("Rating", StoreSortField::Rating),
    ]
    .into_iter()
    .map(|(label, field)| {
        sort_link(&base, label, field.as_str(), field == filter.sort, filter.order)
    })
    .collect();

    let mut band_options = vec![SelectOption {
        value: String::new(),
        label: "All Ratings".to_string(),
        selected: filter.band.is_none(),
    }];
    band_options.extend((1..=5u8).rev().map(|band| SelectOption {
        value: band.to_string(),
        label: if band == 5 {
            "5 stars".to_string()
        } else {
            format!("{band}+ stars (below {})", band + 1)
        },
        selected: filter.band == Some(band),
    }));

    let listing = AdminService::new(state.identity(), state.store())
        .list_stores(&filter)
        .await;
    let (stores, total, load_error) = match listing {
        Ok(listing) => (
            listing
                .stores
                .iter()
                .map(|s| StoreRow {
                    id: s.store.id.to_string(),
                    name: s.store.name.clone(),
                    email: s.store.email.to_string(),
                    address: s.store.address.clone(),
                    average: s.average,
                    rating_count: s.rating_count,
                })
                .collect(),
            listing.total,
            false,
        ),
        Err(e) => {
            tracing::error!(error = %e, "Failed to load stores");
            (Vec::new(), 0, true)
        }
    };

    StoresTemplate {
        nav: Nav::from(&ctx),
        stores,
        total,
        search: filter.search,
        band_options,
        sort_order: filter.order.as_str().to_string(),
        sort_field: filter.sort.as_str().to_string(),
        columns,
        load_error,
    }
}

// =============================================================================
// Helpers
// =============================================================================

fn parse_or_default<T: std::str::FromStr + Default>(value: Option<&str>) -> T {
    value.and_then(|v| v.parse().ok()).unwrap_or_default()
}

/// Header link: the active column toggles its order, others start ascending.
fn sort_link(
    base: &str,
    label: &'static str,
    field: &str,
    active: bool,
    order: SortOrder,
) -> SortLink {
    let (next, indicator) = if active {
        let arrow = match order {
            SortOrder::Asc => "\u{2191}",
            SortOrder::Desc => "\u{2193}",
        };
        (order.toggled(), arrow)
    } else {
        (SortOrder::Asc, "")
    };
    SortLink {
        label,
        href: format!("{base}&sort={field}&order={next}"),
        indicator,
    }
}

fn role_select(current: Role) -> Vec<SelectOption> {
    Role::ALL
        .into_iter()
        .map(|role| SelectOption {
            value: role.as_str().to_string(),
            label: role.label().to_string(),
            selected: role == current,
        })
        .collect()
}

fn user_message(nav: Nav, status: StatusCode, message: &str) -> Response {
    (
        status,
        AdminMessageTemplate {
            nav,
            message: message.to_string(),
            back_href: "/admin/users",
            back_label: "Back to Users",
        },
    )
        .into_response()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sort_link_toggles_active_column() {
        let active = sort_link("/admin/users?q=", "Name", "name", true, SortOrder::Asc);
        assert_eq!(active.href, "/admin/users?q=&sort=name&order=desc");
        assert_eq!(active.indicator, "\u{2191}");

        let inactive = sort_link("/admin/users?q=", "Email", "email", false, SortOrder::Desc);
        assert_eq!(inactive.href, "/admin/users?q=&sort=email&order=asc");
        assert_eq!(inactive.indicator, "");
    }

    #[test]
    fn test_users_query_parsing_is_lenient() {
        let query = UsersQuery {
            role: Some("all".to_string()),
            sort: Some("bogus".to_string()),
            order: Some("desc".to_string()),
            ..UsersQuery::default()
        };
        let filter = query.filter();
        assert_eq!(filter.role, None);
        assert_eq!(filter.sort, UserSortField::Name);
        assert_eq!(filter.order, SortOrder::Desc);
    }

    #[test]
    fn test_stores_query_band_bounds() {
        let query = StoresQuery {
            band: Some("9".to_string()),
            ..StoresQuery::default()
        };
        assert_eq!(query.filter().band, None);
        let query = StoresQuery {
            band: Some("4".to_string()),
            ..StoresQuery::default()
        };
        assert_eq!(query.filter().band, Some(4));
    }
}
