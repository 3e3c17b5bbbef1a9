//! End-to-end walk through the whole comment/reply lifecycle.

use axum::body::Body;
use axum::http::{Method, Request, StatusCode};
use axum::Router;
use http_body_util::BodyExt;
use serde_json::{json, Value};
use tempfile::TempDir;
use tower::ServiceExt;

use blog_post_api::config::Config;
use blog_post_api::db::Database;
use blog_post_api::web::{create_app, AppState};

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
        jwt_secret: "test-secret".to_string(),
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

async fn register_and_login(app: &Router, email: &str, username: &str) -> String {
    send_json(
        app,
        Method::POST,
        "/users/register",
        None,
        Some(json!({ "email": email, "username": username, "password": "test-password" })),
    )
    .await;

    let (_, body) = send_json(
        app,
        Method::POST,
        "/users/login",
        None,
        Some(json!({ "email": email, "password": "test-password" })),
    )
    .await;
    body["access"].as_str().unwrap().to_string()
}

#[tokio::test]
async fn test_full_comment_reply_lifecycle() {
    let (app, db, _tmp) = setup_test_app().await;

    // User A registers, logs in, creates post P
    let a = register_and_login(&app, "a@example.com", "usera").await;
    let (status, body) = send_json(
        &app,
        Method::POST,
        "/posts/createPost",
        Some(&a),
        Some(json!({ "title": "P", "content": "post body" })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    let post_id = body["post"]["id"].as_i64().unwrap();

    // User B registers, logs in, adds comment C
    let b = register_and_login(&app, "b@example.com", "userb").await;
    let (status, body) = send_json(
        &app,
        Method::POST,
        &format!("/comments/addComment/{post_id}"),
        Some(&b),
        Some(json!({ "text": "first!" })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    let comment_id = body["comment"]["id"].as_str().unwrap().to_string();

    // B edits C
    let (status, body) = send_json(
        &app,
        Method::PATCH,
        &format!("/comments/updateComment/{post_id}/{comment_id}"),
        Some(&b),
        Some(json!({ "text": "first, edited" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["comment"]["text"], "first, edited");

    // A, as post author (not comment owner), replies to C
    let (status, body) = send_json(
        &app,
        Method::POST,
        &format!("/comments/replyComment/{post_id}/{comment_id}"),
        Some(&a),
        Some(json!({ "text": "thanks for reading" })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    let reply_id = body["reply"]["id"].as_str().unwrap().to_string();

    // B attempts to edit R: 403
    let (status, _) = send_json(
        &app,
        Method::PATCH,
        &format!("/comments/updateReply/{post_id}/{comment_id}/{reply_id}"),
        Some(&b),
        Some(json!({ "text": "no" })),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    // A edits R successfully
    let (status, body) = send_json(
        &app,
        Method::PATCH,
        &format!("/comments/updateReply/{post_id}/{comment_id}/{reply_id}"),
        Some(&a),
        Some(json!({ "text": "thanks for reading!" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["reply"]["id"], reply_id.as_str());

    // An admin deletes C
    register_and_login(&app, "root@example.com", "root").await;
    sqlx::query("UPDATE users SET is_admin = 1 WHERE email = 'root@example.com'")
        .execute(db.pool())
        .await
        .unwrap();
    let (_, body) = send_json(
        &app,
        Method::POST,
        "/users/login",
        None,
        Some(json!({ "email": "root@example.com", "password": "test-password" })),
    )
    .await;
    let admin = body["access"].as_str().unwrap().to_string();

    let (status, body) = send_json(
        &app,
        Method::DELETE,
        &format!("/comments/deleteComment/{post_id}/{comment_id}"),
        Some(&admin),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Comment deleted");

    // Re-fetching P shows C gone, and R with it
    let (status, body) = send_json(
        &app,
        Method::GET,
        &format!("/posts/getPost/{post_id}"),
        None,
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert!(body["post"]["comments"].as_array().unwrap().is_empty());
}
