//! Bearer-token authentication.
//!
//! Tokens are HS256 JWTs whose `sub` claim is the numeric user id.

use std::sync::Arc;

use axum::extract::{FromRef, FromRequestParts};
use axum::http::HeaderMap;
use axum::http::header::AUTHORIZATION;
use axum::http::request::Parts;
use chrono::Utc;
use gameshelf_core::{User, UserId};
use gameshelf_lib::ServiceError;
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};

use crate::error::ApiError;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// User id, as a string per RFC 7519.
    pub sub: String,
    pub username: String,
    pub iat: i64,
    pub exp: i64,
}

/// Signing and verification keys plus the token lifetime.
pub struct JwtKeys {
    encoding: EncodingKey,
    decoding: DecodingKey,
    ttl: chrono::Duration,
}

impl JwtKeys {
    pub fn new(secret: &[u8], ttl_hours: i64) -> Self {
        Self {
            encoding: EncodingKey::from_secret(secret),
            decoding: DecodingKey::from_secret(secret),
            ttl: chrono::Duration::try_hours(ttl_hours).unwrap_or(chrono::Duration::MAX),
        }
    }

    /// Lifetime of issued tokens, in seconds.
    pub fn ttl_secs(&self) -> i64 {
        self.ttl.num_seconds()
    }

    pub fn issue(&self, user: &User) -> Result<String, ApiError> {
        let now = Utc::now();
        let expires = now.checked_add_signed(self.ttl).ok_or_else(|| {
            ApiError::from(ServiceError::internal("Token lifetime out of range"))
        })?;
        let claims = Claims {
            sub: user.id.to_string(),
            username: user.username.clone(),
            iat: now.timestamp(),
            exp: expires.timestamp(),
        };
        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding).map_err(|e| {
            ApiError::from(ServiceError::internal(format!("Token creation failed: {e}")))
        })
    }

    /// Verify a token and return the user id it was issued for.
    pub fn verify(&self, token: &str) -> Result<UserId, ApiError> {
        let data = decode::<Claims>(token, &self.decoding, &Validation::new(Algorithm::HS256))
            .map_err(|e| {
                log::debug!("Rejected token: {}", e);
                ApiError::Unauthorized("Invalid or expired token".to_string())
            })?;
        data.claims
            .sub
            .parse()
            .map_err(|_| ApiError::Unauthorized("Invalid or expired token".to_string()))
    }
}

fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    let value = headers.get(AUTHORIZATION)?.to_str().ok()?;
    let (scheme, token) = value.split_once(' ')?;
    (scheme.eq_ignore_ascii_case("bearer") && !token.trim().is_empty()).then(|| token.trim())
}

/// The verified caller. Rejects with 401 when the token is missing or bad.
#[derive(Debug, Clone, Copy)]
pub struct AuthUser(pub UserId);

#[axum::async_trait]
impl<S> FromRequestParts<S> for AuthUser
where
    Arc<JwtKeys>: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let keys = Arc::<JwtKeys>::from_ref(state);
        let token = bearer_token(&parts.headers)
            .ok_or_else(|| ApiError::Unauthorized("Access token required".to_string()))?;
        keys.verify(token).map(AuthUser)
    }
}

/// The caller if a valid token was sent; anonymous otherwise.
#[derive(Debug, Clone, Copy)]
pub struct MaybeAuthUser(pub Option<UserId>);

#[axum::async_trait]
impl<S> FromRequestParts<S> for MaybeAuthUser
where
    Arc<JwtKeys>: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let keys = Arc::<JwtKeys>::from_ref(state);
        Ok(MaybeAuthUser(
            bearer_token(&parts.headers).and_then(|token| keys.verify(token).ok()),
        ))
    }
}

impl AuthUser {
    /// Only the owner may change their own library, profile, or follows.
    pub fn require(self, owner: UserId) -> Result<(), ApiError> {
        if self.0 == owner {
            Ok(())
        } else {
            Err(ApiError::Forbidden(
                "You can only modify your own account".to_string(),
            ))
        }
    }
}
