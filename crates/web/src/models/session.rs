//! Session-related types.
//!
//! Types stored in the session for authentication state.

use serde::{Deserialize, Serialize};

use store_ratings_core::{Email, UserId};

/// Session-stored identity.
///
/// Only the identity is kept in the session. The profile is read from the
/// document store on every request so role changes apply immediately.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CurrentUser {
    /// Identity uid, also the key of the profile record.
    pub uid: UserId,
    /// Email the identity signed in with.
    pub email: Email,
}

/// Session keys for authentication data.
pub mod keys {
    /// Key for storing the signed-in identity.
    pub const CURRENT_USER: &str = "current_user";
}
