//! Integration tests for Store Ratings.
//!
//! Each test spawns the full router with the in-memory backends on an
//! ephemeral port and drives it over HTTP with a cookie-keeping client.
//!
//! # Running Tests
//!
//! ```bash
//! cargo test -p store-ratings-integration-tests
//! ```
//!
//! No database or external service is needed.

use chrono::Utc;
use reqwest::{Client, Response, redirect::Policy};

use store_ratings_core::{Email, Role};
use store_ratings_web::app;
use store_ratings_web::config::WebConfig;
use store_ratings_web::middleware::create_memory_session_layer;
use store_ratings_web::models::{NewStore, Store, User};
use store_ratings_web::state::AppState;

/// Password accepted by every form rule.
pub const PASSWORD: &str = "Abcdef1!";

/// A running application instance.
pub struct TestApp {
    pub base_url: String,
    pub state: AppState,
}

impl TestApp {
    /// Start the app on `127.0.0.1` with a random port.
    ///
    /// # Panics
    ///
    /// Panics if the listener cannot be bound.
    pub async fn spawn() -> Self {
        let config = WebConfig::for_memory("http://127.0.0.1");
        let state = AppState::in_memory(config.clone());
        let router = app(state.clone()).layer(create_memory_session_layer(&config));

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind test listener");
        let addr = listener.local_addr().expect("Failed to read local address");
        tokio::spawn(async move {
            axum::serve(listener, router)
                .await
                .expect("Test server error");
        });

        Self {
            base_url: format!("http://{addr}"),
            state,
        }
    }

    /// Absolute URL of `path`.
    #[must_use]
    pub fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }

    /// A client that keeps cookies and does not follow redirects.
    ///
    /// # Panics
    ///
    /// Panics if the client cannot be built.
    #[must_use]
    pub fn client() -> Client {
        Client::builder()
            .cookie_store(true)
            .redirect(Policy::none())
            .build()
            .expect("Failed to create HTTP client")
    }

    /// Create an identity with [`PASSWORD`] and a profile with `role`.
    ///
    /// # Panics
    ///
    /// Panics if the backends refuse the records.
    pub async fn seed_user(&self, name: &str, email: &str, role: Role) -> User {
        let email = Email::parse(email).expect("Invalid seed email");
        let identity = self
            .state
            .identity()
            .create_account(&email, PASSWORD)
            .await
            .expect("Failed to create identity");
        let user = User {
            id: identity.uid,
            name: name.to_string(),
            email,
            address: "742 Evergreen Terrace, Springfield".to_string(),
            role,
            created_at: Utc::now(),
        };
        self.state
            .store()
            .put_user(&user)
            .await
            .expect("Failed to write profile");
        user
    }

    /// Insert a store, optionally owned by `owner`.
    ///
    /// # Panics
    ///
    /// Panics if the store cannot be written.
    pub async fn seed_store(&self, name: &str, owner: Option<&User>) -> Store {
        self.state
            .store()
            .insert_store(&NewStore {
                name: name.to_string(),
                email: owner.map_or_else(
                    || Email::parse("store@example.com").expect("Invalid seed email"),
                    |o| o.email.clone(),
                ),
                address: "1 Market Street, Springfield".to_string(),
                owner_id: owner.map(|o| o.id),
            })
            .await
            .expect("Failed to insert store")
    }

    /// Submit the login form.
    ///
    /// # Panics
    ///
    /// Panics on transport errors.
    pub async fn login(&self, client: &Client, email: &str, password: &str) -> Response {
        client
            .post(self.url("/login"))
            .form(&[("email", email), ("password", password)])
            .send()
            .await
            .expect("Failed to post login")
    }

    /// GET `path` with `client`.
    ///
    /// # Panics
    ///
    /// Panics on transport errors.
    pub async fn get(&self, client: &Client, path: &str) -> Response {
        client
            .get(self.url(path))
            .send()
            .await
            .expect("Failed to send request")
    }

    /// POST a form to `path` with `client`.
    ///
    /// # Panics
    ///
    /// Panics on transport errors.
    pub async fn post_form(&self, client: &Client, path: &str, form: &[(&str, &str)]) -> Response {
        client
            .post(self.url(path))
            .form(form)
            .send()
            .await
            .expect("Failed to post form")
    }
}

/// The `Location` header of a redirect, if any.
#[must_use]
pub fn location(response: &Response) -> Option<String> {
    response
        .headers()
        .get(reqwest::header::LOCATION)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string)
}
