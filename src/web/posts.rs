use std::collections::HashMap;

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::{Deserialize, Serialize};
use serde_json::json;
use sqlx::SqlitePool;

use crate::auth::AuthUser;
use crate::authz::{self, Action};
use crate::db as queries;
use crate::db::{Post, User};
use crate::web::error::ApiError;
use crate::web::AppState;

/// Maximum post title length in characters.
pub const MAX_TITLE_CHARS: usize = 200;

/// A resolved author reference embedded in post responses.
#[derive(Debug, Clone, Serialize)]
pub struct UserRef {
    pub id: i64,
    pub username: String,
    pub email: String,
}

impl UserRef {
    fn from_user(user: &User) -> Self {
        Self {
            id: user.id,
            username: user.username.clone(),
            email: user.email.clone(),
        }
    }
}

/// Post shape returned by create/update, with the author as a bare id.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct PostBody {
    id: i64,
    title: String,
    content: String,
    author: i64,
    created_at: String,
    updated_at: String,
}

impl PostBody {
    fn from_post(post: &Post) -> Self {
        Self {
            id: post.id,
            title: post.title.clone(),
            content: post.content.clone(),
            author: post.author_id,
            created_at: post.created_at.clone(),
            updated_at: post.updated_at.clone(),
        }
    }
}

/// Listing shape: resolved author plus a comment count, no comment bodies.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct PostSummary {
    id: i64,
    title: String,
    content: String,
    author: Option<UserRef>,
    comments_count: usize,
    created_at: String,
    updated_at: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ReplyView {
    id: uuid::Uuid,
    text: String,
    user: Option<UserRef>,
    created_at: String,
    updated_at: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct CommentView {
    id: uuid::Uuid,
    text: String,
    user: Option<UserRef>,
    created_at: String,
    updated_at: String,
    replies: Vec<ReplyView>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct PostDetail {
    id: i64,
    title: String,
    content: String,
    author: Option<UserRef>,
    comments: Vec<CommentView>,
    created_at: String,
    updated_at: String,
}

#[derive(Debug, Deserialize)]
pub struct CreatePostRequest {
    #[serde(default)]
    title: String,
    #[serde(default)]
    content: String,
}

/// POST /posts/createPost
pub async fn create_post(
    State(state): State<AppState>,
    AuthUser(claims): AuthUser,
    Json(body): Json<CreatePostRequest>,
) -> Result<Response, ApiError> {
    let title = body.title.trim();
    let content = body.content.trim();

    if title.is_empty() || content.is_empty() {
        return Err(ApiError::bad_request("Title and content are required"));
    }
    if title.chars().count() > MAX_TITLE_CHARS {
        return Err(ApiError::bad_request(
            "Title must be at most 200 characters",
        ));
    }

    let post = queries::insert_post(state.db.pool(), title, content, claims.id).await?;

    Ok((
        StatusCode::CREATED,
        Json(json!({
            "message": "Post created",
            "post": PostBody::from_post(&post),
        })),
    )
        .into_response())
}

/// GET /posts/getPosts
pub async fn get_posts(State(state): State<AppState>) -> Result<Response, ApiError> {
    let posts = queries::list_posts(state.db.pool()).await?;
    let summaries = summarize(state.db.pool(), posts).await?;

    Ok(Json(json!({ "posts": summaries })).into_response())
}

/// GET /posts/myPosts
pub async fn my_posts(
    State(state): State<AppState>,
    AuthUser(claims): AuthUser,
) -> Result<Response, ApiError> {
    let posts = queries::list_posts_by_author(state.db.pool(), claims.id).await?;
    let summaries = summarize(state.db.pool(), posts).await?;

    Ok(Json(json!({ "posts": summaries })).into_response())
}

/// GET /posts/getPost/:id
///
/// Full nested detail with every comment and reply author resolved.
pub async fn get_post(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Response, ApiError> {
    let post = queries::get_post(state.db.pool(), id)
        .await?
        .ok_or_else(|| ApiError::not_found("Post not found"))?;

    // One lookup for every user referenced anywhere in the aggregate
    let mut user_ids = vec![post.author_id];
    for comment in &post.comments {
        user_ids.push(comment.user_id);
        user_ids.extend(comment.replies.iter().map(|r| r.user_id));
    }
    let users = user_map(state.db.pool(), user_ids).await?;

    let comments = post
        .comments
        .iter()
        .map(|comment| CommentView {
            id: comment.id,
            text: comment.text.clone(),
            user: users.get(&comment.user_id).map(UserRef::from_user),
            created_at: comment.created_at.clone(),
            updated_at: comment.updated_at.clone(),
            replies: comment
                .replies
                .iter()
                .map(|reply| ReplyView {
                    id: reply.id,
                    text: reply.text.clone(),
                    user: users.get(&reply.user_id).map(UserRef::from_user),
                    created_at: reply.created_at.clone(),
                    updated_at: reply.updated_at.clone(),
                })
                .collect(),
        })
        .collect();

    let detail = PostDetail {
        id: post.id,
        title: post.title.clone(),
        content: post.content.clone(),
        author: users.get(&post.author_id).map(UserRef::from_user),
        comments,
        created_at: post.created_at.clone(),
        updated_at: post.updated_at.clone(),
    };

    Ok(Json(json!({ "post": detail })).into_response())
}

#[derive(Debug, Deserialize)]
pub struct UpdatePostRequest {
    title: Option<String>,
    content: Option<String>,
}

/// PATCH /posts/updatePost/:id
///
/// Title and content are each optional; a provided non-empty value is
/// trimmed and applied, anything else is ignored. Owner only - admins get
/// no override on edits.
pub async fn update_post(
    State(state): State<AppState>,
    AuthUser(claims): AuthUser,
    Path(id): Path<i64>,
    Json(body): Json<UpdatePostRequest>,
) -> Result<Response, ApiError> {
    let title = body.title.as_deref().map(str::trim).filter(|t| !t.is_empty());
    let content = body
        .content
        .as_deref()
        .map(str::trim)
        .filter(|c| !c.is_empty());

    if let Some(title) = title {
        if title.chars().count() > MAX_TITLE_CHARS {
            return Err(ApiError::bad_request(
                "Title must be at most 200 characters",
            ));
        }
    }

    let mut post = queries::get_post(state.db.pool(), id)
        .await?
        .ok_or_else(|| ApiError::not_found("Post not found"))?;

    if !authz::is_allowed(&claims, Action::EditPost { post_author: post.author_id }) {
        return Err(ApiError::forbidden("Forbidden"));
    }

    if let Some(title) = title {
        post.title = title.to_string();
    }
    if let Some(content) = content {
        post.content = content.to_string();
    }
    post.touch();
    queries::save_post(state.db.pool(), &post).await?;

    Ok(Json(json!({
        "message": "Post updated",
        "post": PostBody::from_post(&post),
    }))
    .into_response())
}

/// DELETE /posts/deletePost/:id
pub async fn delete_post(
    State(state): State<AppState>,
    AuthUser(claims): AuthUser,
    Path(id): Path<i64>,
) -> Result<Response, ApiError> {
    let post = queries::get_post(state.db.pool(), id)
        .await?
        .ok_or_else(|| ApiError::not_found("Post not found"))?;

    if !authz::is_allowed(&claims, Action::DeletePost { post_author: post.author_id }) {
        return Err(ApiError::forbidden("Forbidden"));
    }

    queries::delete_post(state.db.pool(), post.id).await?;

    Ok(Json(json!({ "message": "Post deleted" })).into_response())
}

/// Shape posts into listing summaries, resolving authors in one query.
async fn summarize(pool: &SqlitePool, posts: Vec<Post>) -> Result<Vec<PostSummary>, ApiError> {
    let authors = user_map(pool, posts.iter().map(|p| p.author_id).collect()).await?;

    Ok(posts
        .into_iter()
        .map(|post| PostSummary {
            id: post.id,
            title: post.title,
            content: post.content,
            author: authors.get(&post.author_id).map(UserRef::from_user),
            comments_count: post.comments.len(),
            created_at: post.created_at,
            updated_at: post.updated_at,
        })
        .collect())
}

async fn user_map(pool: &SqlitePool, mut ids: Vec<i64>) -> Result<HashMap<i64, User>, ApiError> {
    ids.sort_unstable();
    ids.dedup();
    let users = queries::get_users_by_ids(pool, &ids).await?;
    Ok(users.into_iter().map(|u| (u.id, u)).collect())
}
