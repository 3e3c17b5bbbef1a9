use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::{Deserialize, Serialize};
use serde_json::json;
use uuid::Uuid;

use crate::auth::AuthUser;
use crate::authz::{self, Action};
use crate::db as queries;
use crate::db::{Comment, Reply};
use crate::web::error::ApiError;
use crate::web::AppState;

/// Maximum comment/reply text length in characters.
pub const MAX_TEXT_CHARS: usize = 2000;

/// Comment shape returned by the mutation endpoints; `user` is the raw
/// author id (resolution happens only on post detail).
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct CommentBody {
    id: Uuid,
    user: i64,
    text: String,
    created_at: String,
    updated_at: String,
}

impl CommentBody {
    fn from_comment(comment: &Comment) -> Self {
        Self {
            id: comment.id,
            user: comment.user_id,
            text: comment.text.clone(),
            created_at: comment.created_at.clone(),
            updated_at: comment.updated_at.clone(),
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ReplyBody {
    id: Uuid,
    user: i64,
    text: String,
    created_at: String,
    updated_at: String,
}

impl ReplyBody {
    fn from_reply(reply: &Reply) -> Self {
        Self {
            id: reply.id,
            user: reply.user_id,
            text: reply.text.clone(),
            created_at: reply.created_at.clone(),
            updated_at: reply.updated_at.clone(),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct TextRequest {
    #[serde(default)]
    text: String,
}

/// Trim and bound-check a comment/reply text field.
fn validate_text(raw: &str, label: &str) -> Result<String, ApiError> {
    let text = raw.trim();
    if text.is_empty() {
        return Err(ApiError::bad_request(format!("{label} text is required")));
    }
    if text.chars().count() > MAX_TEXT_CHARS {
        return Err(ApiError::bad_request(format!(
            "{label} text must be at most {MAX_TEXT_CHARS} characters"
        )));
    }
    Ok(text.to_string())
}

/// POST /comments/addComment/:postId
pub async fn add_comment(
    State(state): State<AppState>,
    AuthUser(claims): AuthUser,
    Path(post_id): Path<i64>,
    Json(body): Json<TextRequest>,
) -> Result<Response, ApiError> {
    let text = validate_text(&body.text, "Comment")?;

    let mut post = queries::get_post(state.db.pool(), post_id)
        .await?
        .ok_or_else(|| ApiError::not_found("Post not found"))?;

    if !authz::is_allowed(&claims, Action::CreateComment) {
        return Err(ApiError::forbidden("Admins cannot post comments"));
    }

    let comment = post.add_comment(claims.id, text);
    post.touch();
    queries::save_post(state.db.pool(), &post).await?;

    Ok((
        StatusCode::CREATED,
        Json(json!({
            "message": "Comment added",
            "comment": CommentBody::from_comment(&comment),
        })),
    )
        .into_response())
}

/// PATCH /comments/updateComment/:postId/:commentId
pub async fn update_comment(
    State(state): State<AppState>,
    AuthUser(claims): AuthUser,
    Path((post_id, comment_id)): Path<(i64, Uuid)>,
    Json(body): Json<TextRequest>,
) -> Result<Response, ApiError> {
    let text = validate_text(&body.text, "Comment")?;

    let mut post = queries::get_post(state.db.pool(), post_id)
        .await?
        .ok_or_else(|| ApiError::not_found("Post not found"))?;

    let comment = post
        .comment_mut(comment_id)
        .ok_or_else(|| ApiError::not_found("Comment not found"))?;

    if !authz::is_allowed(&claims, Action::EditComment { comment_author: comment.user_id }) {
        let message = if claims.is_admin {
            "Admins cannot edit comments"
        } else {
            "Forbidden"
        };
        return Err(ApiError::forbidden(message));
    }

    comment.edit(text);
    let shaped = CommentBody::from_comment(comment);

    post.touch();
    queries::save_post(state.db.pool(), &post).await?;

    Ok(Json(json!({
        "message": "Comment updated",
        "comment": shaped,
    }))
    .into_response())
}

/// DELETE /comments/deleteComment/:postId/:commentId
///
/// Removes the comment and every reply under it.
pub async fn delete_comment(
    State(state): State<AppState>,
    AuthUser(claims): AuthUser,
    Path((post_id, comment_id)): Path<(i64, Uuid)>,
) -> Result<Response, ApiError> {
    let mut post = queries::get_post(state.db.pool(), post_id)
        .await?
        .ok_or_else(|| ApiError::not_found("Post not found"))?;

    let comment_author = post
        .comment(comment_id)
        .ok_or_else(|| ApiError::not_found("Comment not found"))?
        .user_id;

    if !authz::is_allowed(&claims, Action::DeleteComment { comment_author }) {
        return Err(ApiError::forbidden("Forbidden"));
    }

    post.remove_comment(comment_id);
    post.touch();
    queries::save_post(state.db.pool(), &post).await?;

    Ok(Json(json!({ "message": "Comment deleted" })).into_response())
}

/// POST /comments/replyComment/:postId/:commentId
pub async fn reply_to_comment(
    State(state): State<AppState>,
    AuthUser(claims): AuthUser,
    Path((post_id, comment_id)): Path<(i64, Uuid)>,
    Json(body): Json<TextRequest>,
) -> Result<Response, ApiError> {
    let text = validate_text(&body.text, "Reply")?;

    let mut post = queries::get_post(state.db.pool(), post_id)
        .await?
        .ok_or_else(|| ApiError::not_found("Post not found"))?;

    let post_author = post.author_id;
    let comment = post
        .comment_mut(comment_id)
        .ok_or_else(|| ApiError::not_found("Comment not found"))?;

    if !authz::is_allowed(&claims, Action::CreateReply { post_author }) {
        return Err(ApiError::forbidden(
            "Only the post author can reply to comments",
        ));
    }

    let reply = comment.add_reply(claims.id, text);
    post.touch();
    queries::save_post(state.db.pool(), &post).await?;

    Ok((
        StatusCode::CREATED,
        Json(json!({
            "message": "Reply added",
            "reply": ReplyBody::from_reply(&reply),
        })),
    )
        .into_response())
}

/// PATCH /comments/updateReply/:postId/:commentId/:replyId
pub async fn update_reply(
    State(state): State<AppState>,
    AuthUser(claims): AuthUser,
    Path((post_id, comment_id, reply_id)): Path<(i64, Uuid, Uuid)>,
    Json(body): Json<TextRequest>,
) -> Result<Response, ApiError> {
    let text = validate_text(&body.text, "Reply")?;

    let mut post = queries::get_post(state.db.pool(), post_id)
        .await?
        .ok_or_else(|| ApiError::not_found("Post not found"))?;

    let post_author = post.author_id;
    let comment = post
        .comment_mut(comment_id)
        .ok_or_else(|| ApiError::not_found("Comment not found"))?;

    let reply = comment
        .reply_mut(reply_id)
        .ok_or_else(|| ApiError::not_found("Reply not found"))?;

    let allowed = authz::is_allowed(
        &claims,
        Action::EditReply {
            post_author,
            reply_author: reply.user_id,
        },
    );
    if !allowed {
        let message = if claims.id == post_author {
            "Forbidden"
        } else {
            "Only the post author can edit replies"
        };
        return Err(ApiError::forbidden(message));
    }

    reply.edit(text);
    let shaped = ReplyBody::from_reply(reply);

    post.touch();
    queries::save_post(state.db.pool(), &post).await?;

    Ok(Json(json!({
        "message": "Reply updated",
        "reply": shaped,
    }))
    .into_response())
}

/// DELETE /comments/deleteReply/:postId/:commentId/:replyId
pub async fn delete_reply(
    State(state): State<AppState>,
    AuthUser(claims): AuthUser,
    Path((post_id, comment_id, reply_id)): Path<(i64, Uuid, Uuid)>,
) -> Result<Response, ApiError> {
    let mut post = queries::get_post(state.db.pool(), post_id)
        .await?
        .ok_or_else(|| ApiError::not_found("Post not found"))?;

    let comment = post
        .comment_mut(comment_id)
        .ok_or_else(|| ApiError::not_found("Comment not found"))?;

    let reply_author = comment
        .reply(reply_id)
        .ok_or_else(|| ApiError::not_found("Reply not found"))?
        .user_id;

    if !authz::is_allowed(&claims, Action::DeleteReply { reply_author }) {
        return Err(ApiError::forbidden("Forbidden"));
    }

    comment.remove_reply(reply_id);
    post.touch();
    queries::save_post(state.db.pool(), &post).await?;

    Ok(Json(json!({ "message": "Reply deleted" })).into_response())
}
