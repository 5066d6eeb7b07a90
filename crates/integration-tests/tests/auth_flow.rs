//! Integration tests for registration, login, logout, and password change.

use reqwest::StatusCode;
use store_ratings_core::Role;
use store_ratings_integration_tests::{PASSWORD, TestApp, location};

const NAME: &str = "Alexandra Testington Smith";

fn registration<'a>(email: &'a str, password: &'a str, confirm: &'a str) -> [(&'static str, &'a str); 5] {
    [
        ("name", NAME),
        ("email", email),
        ("address", "12 Baker Street, London"),
        ("password", password),
        ("confirm_password", confirm),
    ]
}

#[tokio::test]
async fn test_register_signs_in_and_shows_profile() {
    let app = TestApp::spawn().await;
    let client = TestApp::client();

    let resp = app
        .post_form(&client, "/register", &registration("alex@example.com", PASSWORD, PASSWORD))
        .await;
    assert_eq!(resp.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&resp).as_deref(), Some("/?success=registered"));

    let home = app.get(&client, "/?success=registered").await;
    let body = home.text().await.expect("Failed to read body");
    assert!(body.contains("Account created successfully!"));
    assert!(body.contains("Hi, Alexandra"));

    let profile = app.get(&client, "/profile").await;
    assert_eq!(profile.status(), StatusCode::OK);
    let body = profile.text().await.expect("Failed to read body");
    assert!(body.contains(NAME));
    assert!(body.contains("Normal User"));
}

#[tokio::test]
async fn test_register_rejects_mismatched_passwords() {
    let app = TestApp::spawn().await;
    let client = TestApp::client();

    let resp = app
        .post_form(&client, "/register", &registration("alex@example.com", PASSWORD, "Abcdef1?"))
        .await;
    assert_eq!(
        location(&resp).as_deref(),
        Some("/register?error=password-mismatch")
    );

    let page = app.get(&client, "/register?error=password-mismatch").await;
    let body = page.text().await.expect("Failed to read body");
    assert!(body.contains("Passwords do not match"));

    // No session was started.
    let profile = app.get(&client, "/profile").await;
    assert_eq!(location(&profile).as_deref(), Some("/login"));
}

#[tokio::test]
async fn test_register_duplicate_email() {
    let app = TestApp::spawn().await;
    app.seed_user(NAME, "taken@example.com", Role::User).await;
    let client = TestApp::client();

    let resp = app
        .post_form(&client, "/register", &registration("Taken@Example.com", PASSWORD, PASSWORD))
        .await;
    assert_eq!(
        location(&resp).as_deref(),
        Some("/register?error=email-already-in-use")
    );
}

#[tokio::test]
async fn test_login_and_logout() {
    let app = TestApp::spawn().await;
    app.seed_user(NAME, "alex@example.com", Role::User).await;
    let client = TestApp::client();

    let resp = app.login(&client, "alex@example.com", PASSWORD).await;
    assert_eq!(location(&resp).as_deref(), Some("/?success=signed-in"));
    assert_eq!(app.get(&client, "/profile").await.status(), StatusCode::OK);

    // Signed-in visitors are sent away from the login page.
    let login_page = app.get(&client, "/login").await;
    assert_eq!(location(&login_page).as_deref(), Some("/"));

    let logout = app.post_form(&client, "/logout", &[]).await;
    assert_eq!(location(&logout).as_deref(), Some("/"));

    let profile = app.get(&client, "/profile").await;
    assert_eq!(location(&profile).as_deref(), Some("/login"));
}

#[tokio::test]
async fn test_login_wrong_password() {
    let app = TestApp::spawn().await;
    app.seed_user(NAME, "alex@example.com", Role::User).await;
    let client = TestApp::client();

    let resp = app.login(&client, "alex@example.com", "Wrong1!pw").await;
    assert_eq!(
        location(&resp).as_deref(),
        Some("/login?error=invalid-credential")
    );
}

#[tokio::test]
async fn test_login_is_throttled_per_email() {
    let app = TestApp::spawn().await;
    app.seed_user(NAME, "alex@example.com", Role::User).await;
    let client = TestApp::client();

    for _ in 0..5 {
        let resp = app.login(&client, "alex@example.com", "Wrong1!pw").await;
        assert_eq!(
            location(&resp).as_deref(),
            Some("/login?error=invalid-credential")
        );
    }

    let resp = app.login(&client, "alex@example.com", PASSWORD).await;
    assert_eq!(
        location(&resp).as_deref(),
        Some("/login?error=too-many-requests")
    );
}

#[tokio::test]
async fn test_change_password() {
    let app = TestApp::spawn().await;
    app.seed_user(NAME, "alex@example.com", Role::User).await;
    let client = TestApp::client();
    app.login(&client, "alex@example.com", PASSWORD).await;

    let wrong = app
        .post_form(
            &client,
            "/update-password",
            &[
                ("current_password", "Nope1!nope"),
                ("new_password", "Newpass1!"),
                ("confirm_password", "Newpass1!"),
            ],
        )
        .await;
    assert_eq!(
        location(&wrong).as_deref(),
        Some("/update-password?error=wrong-password")
    );

    let ok = app
        .post_form(
            &client,
            "/update-password",
            &[
                ("current_password", PASSWORD),
                ("new_password", "Newpass1!"),
                ("confirm_password", "Newpass1!"),
            ],
        )
        .await;
    assert_eq!(
        location(&ok).as_deref(),
        Some("/update-password?success=updated")
    );

    let fresh = TestApp::client();
    let resp = app.login(&fresh, "alex@example.com", "Newpass1!").await;
    assert_eq!(location(&resp).as_deref(), Some("/?success=signed-in"));
}
