use std::collections::HashSet;

use anyhow::{Context, Result};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::db::User;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum AuthError {
    #[error("No token provided")]
    MissingToken,
    #[error("Invalid token")]
    InvalidToken,
}

/// Identity claims carried inside a signed token. Field names are camelCase
/// on the wire (`isAdmin`), matching what API clients already decode.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Claims {
    pub id: i64,
    pub email: String,
    pub username: String,
    pub is_admin: bool,
}

/// Issues and verifies HS256 bearer tokens with the process-wide secret.
///
/// Tokens carry no expiry claim; once issued they stay valid for the
/// lifetime of the secret. That mirrors the deployed behavior this service
/// replaces and is flagged as a known weakness in DESIGN.md.
#[derive(Clone)]
pub struct TokenService {
    encoding: EncodingKey,
    decoding: DecodingKey,
    validation: Validation,
}

impl TokenService {
    #[must_use]
    pub fn new(secret: &str) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        // No exp claim is issued, so none can be required or validated.
        validation.required_spec_claims = HashSet::new();
        validation.validate_exp = false;

        Self {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
            validation,
        }
    }

    /// Sign a token for the given user.
    pub fn issue(&self, user: &User) -> Result<String> {
        let claims = Claims {
            id: user.id,
            email: user.email.clone(),
            username: user.username.clone(),
            is_admin: user.is_admin,
        };

        encode(&Header::default(), &claims, &self.encoding).context("Failed to sign token")
    }

    /// Verify an `Authorization` header value and return its claims.
    ///
    /// Accepts either the raw token or a `Bearer <token>` form; the prefix
    /// is stripped before decoding.
    ///
    /// # Errors
    ///
    /// `AuthError::MissingToken` when no header was sent,
    /// `AuthError::InvalidToken` when the signature or format is bad.
    pub fn verify(&self, header: Option<&str>) -> Result<Claims, AuthError> {
        let header = header.ok_or(AuthError::MissingToken)?;
        let token = header.strip_prefix("Bearer ").unwrap_or(header);

        decode::<Claims>(token, &self.decoding, &self.validation)
            .map(|data| data.claims)
            .map_err(|_| AuthError::InvalidToken)
    }
}
