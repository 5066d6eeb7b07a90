//! HTTP middleware stack.
//!
//! # Middleware Order (bottom to top in Router)
//!
//! 1. Sentry layers (hub per request, transaction)
//! 2. `TraceLayer` (request tracing)
//! 3. Request ID (add unique ID to each request)
//! 4. Session layer (tower-sessions, `PostgreSQL` or in-memory store)
//! 5. Security headers (CSP, frame denial, etc.)
//!
//! Sign-in throttling is not a layer: the account service asks the
//! [`SignInThrottle`] per submitted email.

pub mod auth;
pub mod rate_limit;
pub mod request_id;
pub mod security_headers;
pub mod session;

pub use auth::{
    Access, AuthContext, AuthRejection, GuestOnly, RequireAdmin, RequireAuth, RequireStoreOwner,
    SignedIn, check_access, clear_current_user, set_current_user,
};
pub use rate_limit::SignInThrottle;
pub use request_id::{RequestId, request_id_middleware};
pub use security_headers::security_headers_middleware;
pub use session::{SESSION_COOKIE_NAME, create_memory_session_layer, create_session_layer};
