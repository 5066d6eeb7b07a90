//! Store Ratings Core - Shared types library.
//!
//! This crate provides the pieces of Store Ratings that have no I/O:
//! - `web` - Public site, store owner dashboard, and admin pages
//! - `cli` - Command-line tools for migrations and bootstrap accounts
//!
//! # Architecture
//!
//! The core crate contains only types and pure functions - no database
//! access, no HTTP. Everything here is deterministic and cheap to test.
//!
//! # Modules
//!
//! - [`types`] - Newtype wrappers for document keys, emails, and roles
//! - [`validate`] - Form field validation (name, address, email, password, rating)
//! - [`aggregate`] - Average rating and star distribution
//! - [`listing`] - In-memory search, sort, and text helpers for list pages

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod aggregate;
pub mod listing;
pub mod types;
pub mod validate;

pub use aggregate::{StarBucket, calculate_average_rating, in_rating_band, rating_distribution};
pub use listing::{SortOrder, filter_by_search_term, format_date, sort_by_key, truncate_text};
pub use types::*;
pub use validate::{
    ValidationError, validate_address, validate_email, validate_name, validate_new_password,
    validate_password, validate_rating,
};
