//! Domain models for the three document collections and the session.

pub mod rating;
pub mod session;
pub mod store;
pub mod user;

pub use rating::{Rating, UpsertOutcome};
pub use session::{CurrentUser, keys as session_keys};
pub use store::{NewStore, Store};
pub use user::{User, UserUpdate};
