//! Request identity.
//!
//! Form owners authenticate with an HS256 bearer token whose claims carry
//! their numeric id (`id`, `userId`, `UserId` or `Id`). End-users filling in
//! forms are identified by the email or phone number in the `userid` header.

use axum::async_trait;
use axum::extract::FromRequestParts;
use axum::http::header;
use axum::http::request::Parts;
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::warn;

use crate::server::app::AppState;
use crate::server::error::ApiError;

pub const SUBMITTER_HEADER: &str = "userid";

#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    #[serde(default, alias = "userId", alias = "UserId", alias = "Id")]
    pub id: Option<Value>,
    pub exp: usize,
}

impl Claims {
    /// Owner id as a 32-bit integer, whether the token carries it as a number or a string.
    pub fn owner_id(&self) -> Option<i32> {
        match self.id.as_ref()? {
            Value::Number(n) => n.as_i64().and_then(|v| i32::try_from(v).ok()),
            Value::String(s) => s.trim().parse().ok(),
            _ => None,
        }
    }
}

pub fn create_token(
    secret: &str,
    owner_id: i32,
    ttl: Duration,
) -> Result<String, jsonwebtoken::errors::Error> {
    let claims = Claims {
        id: Some(Value::from(owner_id)),
        exp: (Utc::now() + ttl).timestamp().max(0) as usize,
    };
    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
}

pub fn verify_token(secret: &str, token: &str) -> Result<Claims, jsonwebtoken::errors::Error> {
    let data = decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &Validation::default(),
    )?;
    Ok(data.claims)
}

/// Authenticated form owner.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Owner(pub i32);

#[async_trait]
impl FromRequestParts<AppState> for Owner {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let token = parts
            .headers
            .get(header::AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.strip_prefix("Bearer "))
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .ok_or_else(|| ApiError::unauthorized("Access denied. No token provided."))?;

        let claims = verify_token(&state.jwt_secret, token).map_err(|e| {
            warn!("Token verification failed: {}", e);
            ApiError::forbidden("Invalid or expired token.")
        })?;

        claims
            .owner_id()
            .map(Owner)
            .ok_or_else(|| ApiError::unauthorized("Invalid token: user id is not a valid integer"))
    }
}

/// End-user identifier taken from the `userid` header.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Submitter(pub String);

#[async_trait]
impl<S: Send + Sync> FromRequestParts<S> for Submitter {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .headers
            .get(SUBMITTER_HEADER)
            .and_then(|v| v.to_str().ok())
            .map(str::trim)
            .filter(|v| !v.is_empty())
            .map(|v| Submitter(v.to_string()))
            .ok_or_else(|| ApiError::unauthorized("Missing userid header"))
    }
}
