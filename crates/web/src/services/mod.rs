//! Business logic services.
//!
//! # Services
//!
//! - [`ratings`] - Rating upsert and store aggregation
//! - [`accounts`] - Registration, sign-in, sign-out, password change
//! - [`admin`] - Dashboard counts, user/store listings, user creation and edits
//!
//! Services borrow the backends from [`crate::state::AppState`] for the
//! duration of one request and never touch the session.

pub mod accounts;
pub mod admin;
pub mod ratings;

pub use accounts::{AccountError, AccountService, Registration};
pub use admin::{
    AdminError, AdminService, DashboardCounts, RoleCounts, StoreFilter, StoreListing,
    StoreSortField, UserFilter, UserForm, UserListing, UserSaved, UserSortField,
};
pub use ratings::{OwnerDashboard, RaterRow, RatingService, StoreDetail, StoreSummary};
