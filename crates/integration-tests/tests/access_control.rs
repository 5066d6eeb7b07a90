//! Integration tests for role-restricted routes.

use reqwest::StatusCode;
use store_ratings_core::Role;
use store_ratings_integration_tests::{PASSWORD, TestApp, location};

const ADMIN_ONLY: &[&str] = &["/admin/dashboard", "/admin/users", "/admin/users/new", "/admin/stores"];

#[tokio::test]
async fn test_anonymous_is_sent_to_login() {
    let app = TestApp::spawn().await;
    let client = TestApp::client();

    for path in ADMIN_ONLY
        .iter()
        .chain(&["/profile", "/update-password", "/store-owner/dashboard"])
    {
        let resp = app.get(&client, path).await;
        assert_eq!(resp.status(), StatusCode::SEE_OTHER, "{path}");
        assert_eq!(location(&resp).as_deref(), Some("/login"), "{path}");
    }
}

#[tokio::test]
async fn test_public_pages_are_open() {
    let app = TestApp::spawn().await;
    let client = TestApp::client();

    for path in ["/", "/stores", "/login", "/register", "/health"] {
        let resp = app.get(&client, path).await;
        assert_eq!(resp.status(), StatusCode::OK, "{path}");
    }
}

#[tokio::test]
async fn test_normal_user_cannot_open_admin_or_owner_pages() {
    let app = TestApp::spawn().await;
    app.seed_user("Homer Jay Simpson Senior", "homer@example.com", Role::User)
        .await;
    let client = TestApp::client();
    app.login(&client, "homer@example.com", PASSWORD).await;

    for path in ADMIN_ONLY.iter().chain(&["/store-owner/dashboard"]) {
        let resp = app.get(&client, path).await;
        assert_eq!(location(&resp).as_deref(), Some("/"), "{path}");
    }
}

#[tokio::test]
async fn test_store_owner_cannot_open_admin_pages() {
    let app = TestApp::spawn().await;
    app.seed_user("Apu Nahasapeemapetilon", "apu@example.com", Role::StoreOwner)
        .await;
    let client = TestApp::client();
    app.login(&client, "apu@example.com", PASSWORD).await;

    for path in ADMIN_ONLY {
        let resp = app.get(&client, path).await;
        assert_eq!(location(&resp).as_deref(), Some("/"), "{path}");
    }
    let own = app.get(&client, "/store-owner/dashboard").await;
    assert_eq!(own.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_admin_cannot_open_owner_dashboard() {
    let app = TestApp::spawn().await;
    app.seed_user("Charles Montgomery Burns", "burns@example.com", Role::Admin)
        .await;
    let client = TestApp::client();
    app.login(&client, "burns@example.com", PASSWORD).await;

    for path in ADMIN_ONLY {
        let resp = app.get(&client, path).await;
        assert_eq!(resp.status(), StatusCode::OK, "{path}");
    }
    let owner = app.get(&client, "/store-owner/dashboard").await;
    assert_eq!(location(&owner).as_deref(), Some("/"));
}

#[tokio::test]
async fn test_unknown_path_renders_not_found() {
    let app = TestApp::spawn().await;
    let client = TestApp::client();

    let resp = app.get(&client, "/no/such/page").await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    assert!(resp.headers().contains_key("content-security-policy"));
}
