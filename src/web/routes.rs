use axum::extract::State;
use axum::response::{IntoResponse, Response};
use axum::routing::{delete, get, patch, post};
use axum::{Json, Router};
use serde_json::json;

use super::{comments, posts, users, AppState};
use crate::db::now_rfc3339;

/// Create the router with all routes.
pub fn router() -> Router<AppState> {
    Router::new()
        // Users
        .route("/users/register", post(users::register))
        .route("/users/login", post(users::login))
        .route("/users/details", get(users::details))
        // Posts
        .route("/posts/createPost", post(posts::create_post))
        .route("/posts/getPosts", get(posts::get_posts))
        .route("/posts/getPost/:id", get(posts::get_post))
        .route("/posts/myPosts", get(posts::my_posts))
        .route("/posts/updatePost/:id", patch(posts::update_post))
        .route("/posts/deletePost/:id", delete(posts::delete_post))
        // Comments
        .route("/comments/addComment/:post_id", post(comments::add_comment))
        .route(
            "/comments/updateComment/:post_id/:comment_id",
            patch(comments::update_comment),
        )
        .route(
            "/comments/deleteComment/:post_id/:comment_id",
            delete(comments::delete_comment),
        )
        // Replies
        .route(
            "/comments/replyComment/:post_id/:comment_id",
            post(comments::reply_to_comment),
        )
        .route(
            "/comments/updateReply/:post_id/:comment_id/:reply_id",
            patch(comments::update_reply),
        )
        .route(
            "/comments/deleteReply/:post_id/:comment_id/:reply_id",
            delete(comments::delete_reply),
        )
        // Health
        .route("/health", get(health))
}

async fn health(State(state): State<AppState>) -> Response {
    let database = if state.db.is_connected().await {
        "connected"
    } else {
        "disconnected"
    };

    Json(json!({
        "status": "this is the blog-post api",
        "uptime": state.started_at.elapsed().as_secs_f64(),
        "timestamp": now_rfc3339(),
        "database": database,
    }))
    .into_response()
}
