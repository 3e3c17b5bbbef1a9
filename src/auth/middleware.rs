use axum::{
    async_trait,
    extract::{FromRef, FromRequestParts},
    http::{header, request::Parts, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;

use super::token::{AuthError, Claims, TokenService};

/// Verified caller identity, extracted from the `Authorization` header.
/// Use this extractor on every route that requires authentication; it
/// rejects with 401 before the handler runs.
#[derive(Debug, Clone)]
pub struct AuthUser(pub Claims);

#[async_trait]
impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
    TokenService: FromRef<S>,
{
    type Rejection = Response;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let tokens = TokenService::from_ref(state);

        let header = parts
            .headers
            .get(header::AUTHORIZATION)
            .and_then(|h| h.to_str().ok());

        match tokens.verify(header) {
            Ok(claims) => Ok(AuthUser(claims)),
            Err(e) => Err(auth_failure(&e)),
        }
    }
}

/// The 401 body token verification failures produce, in the shape API
/// clients already parse: `{"auth":"Failed","message":...}`.
fn auth_failure(err: &AuthError) -> Response {
    (
        StatusCode::UNAUTHORIZED,
        Json(json!({ "auth": "Failed", "message": err.to_string() })),
    )
        .into_response()
}
