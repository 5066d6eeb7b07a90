//! Store Ratings web application library.
//!
//! Public store browsing and rating, the store owner dashboard, and the
//! admin pages, served from one binary. The library form lets integration
//! tests drive the full router against the in-memory backends.

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod config;
pub mod db;
pub mod error;
pub mod filters;
pub mod identity;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;
pub mod state;

use axum::Router;

use crate::state::AppState;

/// Build the page router with its state applied.
///
/// The caller adds the session layer, since its store depends on the
/// backend, plus tracing and static files.
pub fn app(state: AppState) -> Router {
    routes::routes()
        .fallback(routes::home::not_found)
        .layer(axum::middleware::from_fn(
            middleware::security_headers_middleware,
        ))
        .with_state(state)
}
