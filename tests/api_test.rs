//! Integration tests for API endpoints.
//!
//! The router runs on the real services over in-memory persistence and
//! flash storage, so no database or Redis connection is needed.

mod common;

use std::sync::Arc;

use axum::{
    body::{to_bytes, Body},
    http::{
        header::{AUTHORIZATION, CONTENT_TYPE, LOCATION},
        Request, StatusCode,
    },
    response::Response,
    Router,
};
use serde_json::Value;
use tower::ServiceExt;

use common::{support, MemoryFlash, MemoryStore, ADMIN_GROUP, USER_GROUP};
use vacation_accounts::api::{create_router, AppState};
use vacation_accounts::config::Config;
use vacation_accounts::domain::{User, UserRole};
use vacation_accounts::services::{AccountManager, AccountService, AuthService, Authenticator};

const FORM: &str = "application/x-www-form-urlencoded";

struct TestApp {
    router: Router,
    store: Arc<MemoryStore>,
    auth: Arc<dyn AuthService>,
    admin: User,
    user: User,
}

impl TestApp {
    fn new() -> Self {
        let store = MemoryStore::seeded();
        let admin = store.add_user("root", UserRole::Admin, "RootSecret1", &[ADMIN_GROUP]);
        let user = store.add_user("jdoe", UserRole::User, "UserSecret1", &[USER_GROUP]);

        let accounts: Arc<dyn AccountService> = Arc::new(AccountManager::new(support(&store, None)));
        let config = Config::new("test-secret-key-for-testing-only-32chars");
        let auth: Arc<dyn AuthService> = Arc::new(Authenticator::new(accounts.clone(), config));
        let state = AppState::new(auth.clone(), accounts, Arc::new(MemoryFlash::default()));

        Self {
            router: create_router(state),
            store,
            auth,
            admin,
            user,
        }
    }

    async fn token(&self, login: &str, password: &str) -> String {
        self.auth
            .login(login.to_string(), password.to_string())
            .await
            .expect("login should succeed")
            .access_token
    }

    async fn admin_token(&self) -> String {
        self.token("root", "RootSecret1").await
    }

    async fn user_token(&self) -> String {
        self.token("jdoe", "UserSecret1").await
    }

    async fn send(&self, request: Request<Body>) -> Response {
        self.router.clone().oneshot(request).await.unwrap()
    }
}

fn get(uri: &str, token: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder().method("GET").uri(uri);
    if let Some(token) = token {
        builder = builder.header(AUTHORIZATION, format!("Bearer {}", token));
    }
    builder.body(Body::empty()).unwrap()
}

fn post_form(uri: &str, token: &str, body: &str) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header(AUTHORIZATION, format!("Bearer {}", token))
        .header(CONTENT_TYPE, FORM)
        .body(Body::from(body.to_string()))
        .unwrap()
}

async fn json_body(response: Response) -> Value {
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

fn location(response: &Response) -> &str {
    response.headers().get(LOCATION).unwrap().to_str().unwrap()
}

// =============================================================================
// Authentication
// =============================================================================

#[tokio::test]
async fn test_login_returns_bearer_token() {
    let app = TestApp::new();
    let request = Request::builder()
        .method("POST")
        .uri("/auth/login")
        .header(CONTENT_TYPE, "application/json")
        .body(Body::from(r#"{"login":"jdoe","password":"UserSecret1"}"#))
        .unwrap();

    let response = app.send(request).await;
    assert_eq!(response.status(), StatusCode::OK);

    let body = json_body(response).await;
    assert_eq!(body["token_type"], "Bearer");
    assert!(body["access_token"].as_str().is_some_and(|t| !t.is_empty()));
}

#[tokio::test]
async fn test_login_with_wrong_password_is_unauthorized() {
    let app = TestApp::new();
    let request = Request::builder()
        .method("POST")
        .uri("/auth/login")
        .header(CONTENT_TYPE, "application/json")
        .body(Body::from(r#"{"login":"jdoe","password":"nope-nope"}"#))
        .unwrap();

    let response = app.send(request).await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_accounts_require_token() {
    let app = TestApp::new();

    let response = app.send(get("/accounts", None)).await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let response = app.send(get("/accounts", Some("not-a-jwt"))).await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

// =============================================================================
// Listing
// =============================================================================

#[tokio::test]
async fn test_list_is_admin_only() {
    let app = TestApp::new();

    let response = app.send(get("/accounts", Some(&app.user_token().await))).await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    let response = app.send(get("/accounts", Some(&app.admin_token().await))).await;
    assert_eq!(response.status(), StatusCode::OK);

    let body = json_body(response).await;
    assert_eq!(body["user_count"], 2);
    assert_eq!(body["users"][0]["login"], "jdoe");
    assert_eq!(body["users"][1]["login"], "root");
    assert!(body["users"][0].get("password_hash").is_none());
}

// =============================================================================
// Create
// =============================================================================

#[tokio::test]
async fn test_create_form_data_needs_manager() {
    let app = TestApp::new();

    let response = app.send(get("/accounts/new", Some(&app.user_token().await))).await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    let response = app.send(get("/accounts/new", Some(&app.admin_token().await))).await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    assert_eq!(body["groups"].as_array().map(Vec::len), Some(3));
}

#[tokio::test]
async fn test_create_redirects_and_keeps_every_submitted_group() {
    let app = TestApp::new();
    let body = "user.login=alice&user.password=Secret123&confirm_password=Secret123&groups=1&groups=3";

    let response = app
        .send(post_form("/accounts/new", &app.admin_token().await, body))
        .await;

    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), "/accounts");

    let alice = app.store.user_by_login("alice").unwrap();
    assert_eq!(app.store.memberships_of(alice.id), vec![ADMIN_GROUP, USER_GROUP]);
}

#[tokio::test]
async fn test_create_mismatch_answers_with_errors() {
    let app = TestApp::new();
    let body = "user.login=alice&user.password=Secret123&confirm_password=Secret999";

    let response = app
        .send(post_form("/accounts/new", &app.admin_token().await, body))
        .await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = json_body(response).await;
    assert_eq!(body["errors"][0], "passwords do not match");
    assert!(app.store.user_by_login("alice").is_none());
}

#[tokio::test]
async fn test_create_with_non_numeric_group_is_bad_request() {
    let app = TestApp::new();
    let body = "user.login=alice&groups=admins";

    let response = app
        .send(post_form("/accounts/new", &app.admin_token().await, body))
        .await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert!(app.store.user_by_login("alice").is_none());
}

// =============================================================================
// Edit
// =============================================================================

#[tokio::test]
async fn test_user_cannot_edit_someone_else() {
    let app = TestApp::new();
    let uri = format!("/accounts/{}", app.admin.id);

    let response = app
        .send(post_form(&uri, &app.user_token().await, "user.firstname=Mallory"))
        .await;

    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_self_edit_redirects_to_requests() {
    let app = TestApp::new();
    let uri = format!("/accounts/{}", app.user.id);

    let response = app
        .send(post_form(&uri, &app.user_token().await, "user.firstname=John"))
        .await;

    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), "/requests");
    assert_eq!(app.store.user(app.user.id).unwrap().firstname, "John");
}

#[tokio::test]
async fn test_failed_password_change_is_flashed() {
    let app = TestApp::new();
    let token = app.user_token().await;
    let uri = format!("/accounts/{}", app.user.id);
    let body = "current_password=WrongSecret&user.password=NewSecret1&confirm_password=NewSecret1";

    let response = app.send(post_form(&uri, &token, body)).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let response = app.send(get("/flash", Some(&token))).await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    assert_eq!(body["messages"][0], "error;current password is not correct");

    // Popped once
    let body = json_body(app.send(get("/flash", Some(&token))).await).await;
    assert_eq!(body["messages"].as_array().map(Vec::len), Some(0));
}

#[tokio::test]
async fn test_edit_form_data_for_own_account() {
    let app = TestApp::new();
    let uri = format!("/accounts/{}", app.user.id);

    let response = app.send(get(&uri, Some(&app.user_token().await))).await;

    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    assert_eq!(body["account"]["login"], "jdoe");
    assert_eq!(body["account"]["groups"][0], "user");
}

// =============================================================================
// Delete
// =============================================================================

#[tokio::test]
async fn test_delete_is_admin_only() {
    let app = TestApp::new();
    let uri = format!("/accounts/{}/delete", app.user.id);

    let response = app.send(post_form(&uri, &app.user_token().await, "")).await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    let response = app.send(post_form(&uri, &app.admin_token().await, "")).await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), "/accounts");
    assert!(app.store.user(app.user.id).is_none());
}

#[tokio::test]
async fn test_unknown_account_is_not_found() {
    let app = TestApp::new();
    let uri = format!("/accounts/{}/delete", uuid::Uuid::new_v4());

    let response = app.send(get(&uri, Some(&app.admin_token().await))).await;

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

// =============================================================================
// Health
// =============================================================================

#[tokio::test]
async fn test_health_reports_every_dependency() {
    let app = TestApp::new();

    let response = app.send(get("/health", None)).await;

    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    assert_eq!(body["status"], "healthy");
    assert_eq!(body["services"]["database"]["status"], "healthy");
    assert_eq!(body["services"]["redis"]["status"], "healthy");
}
