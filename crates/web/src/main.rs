//! Store Ratings - Store browsing, ratings, and dashboards.
//!
//! This binary serves the whole site on port 3000 by default.
//!
//! # Architecture
//!
//! - Axum web framework
//! - Askama templates for server-side rendering (no client scripts)
//! - Identity provider and document store behind traits, backed by
//!   `PostgreSQL` or by process memory (`RATINGS_BACKEND=memory`)
//! - Server-side sessions via tower-sessions

#![cfg_attr(not(test), forbid(unsafe_code))]

use secrecy::ExposeSecret;
use tower_http::services::ServeDir;
use tower_http::trace::{DefaultOnResponse, OnResponse, TraceLayer};
use tracing::Span;

use sentry::integrations::tracing as sentry_tracing;
use store_ratings_web::config::{Backend, BootstrapAdmin, WebConfig};
use store_ratings_web::services::AdminService;
use store_ratings_web::state::AppState;
use store_ratings_web::{app, db, middleware};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Initialize Sentry error tracking and return guard that must be kept alive.
fn init_sentry(config: &WebConfig) -> Option<sentry::ClientInitGuard> {
    let dsn = config.sentry_dsn.as_ref()?;

    let guard = sentry::init((
        dsn.as_str(),
        sentry::ClientOptions {
            release: sentry::release_name!(),
            environment: config
                .sentry_environment
                .clone()
                .map(std::borrow::Cow::Owned),
            attach_stacktrace: true,
            ..Default::default()
        },
    ));

    tracing::info!("Sentry initialized");
    Some(guard)
}

/// Filter tracing events to Sentry event types.
fn sentry_event_filter(metadata: &tracing::Metadata<'_>) -> sentry_tracing::EventFilter {
    match *metadata.level() {
        tracing::Level::ERROR | tracing::Level::WARN => sentry_tracing::EventFilter::Event,
        tracing::Level::INFO | tracing::Level::DEBUG => sentry_tracing::EventFilter::Breadcrumb,
        _ => sentry_tracing::EventFilter::Ignore,
    }
}

/// Create the configured admin account if its email is unused.
async fn bootstrap_admin(state: &AppState, admin: &BootstrapAdmin) {
    let service = AdminService::new(state.identity(), state.store());
    match service
        .ensure_admin(
            &admin.name,
            &admin.email,
            &admin.address,
            admin.password.expose_secret(),
        )
        .await
    {
        Ok(true) => tracing::info!(email = %admin.email, "Bootstrap admin created"),
        Ok(false) => {}
        Err(e) => tracing::error!(email = %admin.email, error = %e, "Bootstrap admin failed"),
    }
}

#[tokio::main]
async fn main() {
    // Load configuration from environment (needed for Sentry init)
    let config = WebConfig::from_env().expect("Failed to load configuration");

    // Initialize Sentry (must be done before tracing subscriber)
    let _sentry_guard = init_sentry(&config);

    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "store_ratings_web=info,tower_http=debug".into());

    // JSON logs when RATINGS_LOG_JSON is set, text otherwise
    let json_logs = std::env::var("RATINGS_LOG_JSON").is_ok();
    let json_layer = json_logs.then(|| tracing_subscriber::fmt::layer().json().flatten_event(true));
    let text_layer = (!json_logs).then(tracing_subscriber::fmt::layer);

    tracing_subscriber::registry()
        .with(env_filter)
        .with(json_layer)
        .with(text_layer)
        .with(sentry_tracing::layer().event_filter(sentry_event_filter))
        .init();

    // NOTE: Migrations are NOT run automatically on startup.
    // Run them explicitly via: cargo run -p store-ratings-cli -- migrate
    let (state, router) = match config.backend {
        Backend::Postgres => {
            let database_url = config
                .database_url
                .as_ref()
                .expect("postgres backend requires a database URL");
            let pool = db::create_pool(database_url)
                .await
                .expect("Failed to create database pool");
            tracing::info!("Database pool created");

            let session_layer = middleware::create_session_layer(&pool, &config);
            let state = AppState::postgres(config.clone(), pool);
            (state.clone(), app(state).layer(session_layer))
        }
        Backend::Memory => {
            tracing::warn!("Using in-memory backend; data is lost on restart");
            let session_layer = middleware::create_memory_session_layer(&config);
            let state = AppState::in_memory(config.clone());
            (state.clone(), app(state).layer(session_layer))
        }
    };

    if let Some(admin) = &config.bootstrap_admin {
        bootstrap_admin(&state, admin).await;
    }

    let router = router
        .nest_service("/static", ServeDir::new("crates/web/static"))
        .layer(axum::middleware::from_fn(middleware::request_id_middleware))
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(|request: &axum::http::Request<_>| {
                    tracing::info_span!(
                        "http_request",
                        method = %request.method(),
                        uri = %request.uri().path(),
                        request_id = tracing::field::Empty,
                        status = tracing::field::Empty,
                        latency_ms = tracing::field::Empty,
                    )
                })
                .on_response(
                    |response: &axum::http::Response<_>,
                     latency: std::time::Duration,
                     span: &Span| {
                        span.record("status", response.status().as_u16());
                        span.record(
                            "latency_ms",
                            u64::try_from(latency.as_millis()).unwrap_or(u64::MAX),
                        );
                        DefaultOnResponse::default().on_response(response, latency, span);
                    },
                ),
        )
        // Sentry layers (outermost for full request coverage)
        .layer(sentry_tower::NewSentryLayer::new_from_top())
        .layer(sentry_tower::SentryHttpLayer::new().enable_transaction());

    // Start server
    let addr = config.socket_addr();
    tracing::info!("store ratings listening on http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .expect("Failed to bind to address");

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .expect("Server error");
}

/// Wait for shutdown signal (Ctrl+C or SIGTERM).
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("Failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }

    tracing::info!("Shutdown signal received, starting graceful shutdown");
}
