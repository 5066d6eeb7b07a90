//! Application state shared across handlers.

use std::sync::Arc;

use sqlx::PgPool;

use crate::config::WebConfig;
use crate::db::{DocumentStore, MemoryDocumentStore, PgDocumentStore};
use crate::identity::{IdentityProvider, MemoryIdentityProvider, PgIdentityProvider};
use crate::middleware::SignInThrottle;

/// Application state shared across all handlers.
///
/// This struct is cheaply cloneable via `Arc` and provides access to the
/// identity provider, the document store, and configuration.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: WebConfig,
    identity: Arc<dyn IdentityProvider>,
    store: Arc<dyn DocumentStore>,
    sign_in_throttle: SignInThrottle,
}

impl AppState {
    /// Create a new application state from explicit backends.
    #[must_use]
    pub fn new(
        config: WebConfig,
        identity: Arc<dyn IdentityProvider>,
        store: Arc<dyn DocumentStore>,
    ) -> Self {
        Self {
            inner: Arc::new(AppStateInner {
                config,
                identity,
                store,
                sign_in_throttle: SignInThrottle::new(),
            }),
        }
    }

    /// State backed by `PostgreSQL` tables.
    #[must_use]
    pub fn postgres(config: WebConfig, pool: PgPool) -> Self {
        Self::new(
            config,
            Arc::new(PgIdentityProvider::new(pool.clone())),
            Arc::new(PgDocumentStore::new(pool)),
        )
    }

    /// State backed by process memory. Nothing survives a restart.
    #[must_use]
    pub fn in_memory(config: WebConfig) -> Self {
        Self::new(
            config,
            Arc::new(MemoryIdentityProvider::new()),
            Arc::new(MemoryDocumentStore::new()),
        )
    }

    /// Get a reference to the web configuration.
    #[must_use]
    pub fn config(&self) -> &WebConfig {
        &self.inner.config
    }

    /// Get the identity provider.
    #[must_use]
    pub fn identity(&self) -> &dyn IdentityProvider {
        self.inner.identity.as_ref()
    }

    /// Get the document store.
    #[must_use]
    pub fn store(&self) -> &dyn DocumentStore {
        self.inner.store.as_ref()
    }

    /// Get the per-email sign-in throttle.
    #[must_use]
    pub fn sign_in_throttle(&self) -> &SignInThrottle {
        &self.inner.sign_in_throttle
    }
}
