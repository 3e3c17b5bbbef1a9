//! Integration tests for registration, login, and user details.

use axum::body::Body;
use axum::http::{Method, Request, StatusCode};
use axum::Router;
use http_body_util::BodyExt;
use serde_json::{json, Value};
use tempfile::TempDir;
use tower::ServiceExt;

use blog_post_api::auth::TokenService;
use blog_post_api::config::Config;
use blog_post_api::db::Database;
use blog_post_api::web::{create_app, AppState};

const TEST_SECRET: &str = "test-secret";

async fn setup_test_app() -> (Router, Database, TempDir) {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let db_path = temp_dir.path().join("test.db");
    let db = Database::new(&db_path)
        .await
        .expect("Failed to create database");

    let config = Config {
        database_path: db_path,
        web_host: "127.0.0.1".to_string(),
        web_port: 0,
        jwt_secret: TEST_SECRET.to_string(),
        cors_allowed_origins: vec![],
    };

    let app = create_app(AppState::new(config, db.clone()));
    (app, db, temp_dir)
}

async fn send_json(
    app: &Router,
    method: Method,
    uri: &str,
    token: Option<&str>,
    body: Option<Value>,
) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header("authorization", format!("Bearer {token}"));
    }
    let request = match body {
        Some(body) => builder
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let json = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, json)
}

async fn register(app: &Router, email: &str, username: &str, password: &str) -> (StatusCode, Value) {
    send_json(
        app,
        Method::POST,
        "/users/register",
        None,
        Some(json!({ "email": email, "username": username, "password": password })),
    )
    .await
}

async fn login(app: &Router, email: &str, password: &str) -> (StatusCode, Value) {
    send_json(
        app,
        Method::POST,
        "/users/login",
        None,
        Some(json!({ "email": email, "password": password })),
    )
    .await
}

#[tokio::test]
async fn test_register_then_login_issues_claims() {
    let (app, _db, _tmp) = setup_test_app().await;

    let (status, body) = register(&app, "a@example.com", "alice", "hunter2hunter2").await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["message"], "Registered Successfully");

    let (status, body) = login(&app, "a@example.com", "hunter2hunter2").await;
    assert_eq!(status, StatusCode::OK);
    let access = body["access"].as_str().expect("token in response");

    let claims = TokenService::new(TEST_SECRET)
        .verify(Some(access))
        .expect("token verifies");
    assert_eq!(claims.email, "a@example.com");
    assert_eq!(claims.username, "alice");
    assert!(!claims.is_admin);
    assert!(claims.id > 0);
}

#[tokio::test]
async fn test_register_missing_fields() {
    let (app, _db, _tmp) = setup_test_app().await;

    let (status, body) = send_json(
        &app,
        Method::POST,
        "/users/register",
        None,
        Some(json!({ "email": "a@example.com" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Email, password, and username are required");
}

#[tokio::test]
async fn test_duplicate_email_conflict_creates_no_second_user() {
    let (app, db, _tmp) = setup_test_app().await;

    let (status, _) = register(&app, "a@example.com", "alice", "pw1pw1pw1pw1").await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, body) = register(&app, "a@example.com", "other", "pw2pw2pw2pw2").await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"], "Email already registered");

    let count: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM users")
        .fetch_one(db.pool())
        .await
        .unwrap();
    assert_eq!(count.0, 1);
}

#[tokio::test]
async fn test_duplicate_username_conflict() {
    let (app, _db, _tmp) = setup_test_app().await;

    register(&app, "a@example.com", "alice", "pw1pw1pw1pw1").await;

    let (status, body) = register(&app, "b@example.com", "alice", "pw2pw2pw2pw2").await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"], "Username already taken");
}

#[tokio::test]
async fn test_login_validation_and_failures() {
    let (app, _db, _tmp) = setup_test_app().await;

    register(&app, "a@example.com", "alice", "correct-password").await;

    // Malformed email fails before any lookup
    let (status, body) = login(&app, "not-an-email", "whatever").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Invalid Email");

    // Unknown email
    let (status, body) = login(&app, "b@example.com", "whatever").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "No Email Found");

    // Wrong password
    let (status, body) = login(&app, "a@example.com", "wrong-password").await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "Email and password do not match");
}

#[tokio::test]
async fn test_details_requires_token() {
    let (app, _db, _tmp) = setup_test_app().await;

    let (status, body) = send_json(&app, Method::GET, "/users/details", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["auth"], "Failed");
    assert_eq!(body["message"], "No token provided");

    let (status, body) =
        send_json(&app, Method::GET, "/users/details", Some("garbage"), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["auth"], "Failed");
    assert_eq!(body["message"], "Invalid token");
}

#[tokio::test]
async fn test_details_returns_current_user() {
    let (app, _db, _tmp) = setup_test_app().await;

    register(&app, "a@example.com", "alice", "hunter2hunter2").await;
    let (_, body) = login(&app, "a@example.com", "hunter2hunter2").await;
    let token = body["access"].as_str().unwrap().to_string();

    let (status, body) = send_json(&app, Method::GET, "/users/details", Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["user"]["email"], "a@example.com");
    assert_eq!(body["user"]["username"], "alice");
    assert!(body["user"]["id"].is_i64());
    // The password hash never leaves the server
    assert!(body["user"].get("passwordHash").is_none());
    assert!(body["user"].get("password_hash").is_none());
}

#[tokio::test]
async fn test_health_endpoint() {
    let (app, _db, _tmp) = setup_test_app().await;

    let (status, body) = send_json(&app, Method::GET, "/health", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["database"], "connected");
    assert!(body["uptime"].is_number());
    assert!(body["timestamp"].is_string());
    assert!(body["status"].is_string());
}
