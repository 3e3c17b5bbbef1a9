use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Deserialize;
use serde_json::json;

use crate::auth::{hash_password, verify_password, AuthUser};
use crate::db as queries;
use crate::web::error::ApiError;
use crate::web::AppState;

#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    #[serde(default)]
    email: String,
    #[serde(default)]
    password: String,
    #[serde(default)]
    username: String,
}

/// POST /users/register
pub async fn register(
    State(state): State<AppState>,
    Json(body): Json<RegisterRequest>,
) -> Result<Response, ApiError> {
    if body.email.is_empty() || body.password.is_empty() || body.username.is_empty() {
        return Err(ApiError::bad_request(
            "Email, password, and username are required",
        ));
    }

    // Duplicate email and username are distinct conflicts; email wins when
    // both collide.
    if queries::email_exists(state.db.pool(), &body.email).await? {
        return Err(ApiError::conflict("Email already registered"));
    }
    if queries::username_exists(state.db.pool(), &body.username).await? {
        return Err(ApiError::conflict("Username already taken"));
    }

    let password_hash = hash_password(&body.password)?;
    queries::create_user(state.db.pool(), &body.email, &body.username, &password_hash).await?;

    Ok((
        StatusCode::CREATED,
        Json(json!({ "message": "Registered Successfully" })),
    )
        .into_response())
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    #[serde(default)]
    email: String,
    #[serde(default)]
    password: String,
}

/// POST /users/login
pub async fn login(
    State(state): State<AppState>,
    Json(body): Json<LoginRequest>,
) -> Result<Response, ApiError> {
    // Rejected before any storage round trip
    if !body.email.contains('@') {
        return Err(ApiError::bad_request("Invalid Email"));
    }

    let user = queries::get_user_by_email(state.db.pool(), &body.email)
        .await?
        .ok_or_else(|| ApiError::not_found("No Email Found"))?;

    if !verify_password(&body.password, &user.password_hash)? {
        return Err(ApiError::unauthorized("Email and password do not match"));
    }

    let access = state.tokens.issue(&user)?;

    Ok(Json(json!({ "access": access })).into_response())
}

/// GET /users/details
///
/// Resolves the caller by claims id, falling back to claims email.
pub async fn details(
    State(state): State<AppState>,
    AuthUser(claims): AuthUser,
) -> Result<Response, ApiError> {
    let user = match queries::get_user_by_id(state.db.pool(), claims.id).await? {
        Some(u) => Some(u),
        None => queries::get_user_by_email(state.db.pool(), &claims.email).await?,
    };

    let user = user.ok_or_else(|| ApiError::not_found("User not found"))?;

    Ok(Json(json!({
        "user": {
            "id": user.id,
            "email": user.email,
            "username": user.username,
        }
    }))
    .into_response())
}
