//! Caller identity.
//!
//! Every handler receives an explicit [`AuthToken`] instead of reading ambient
//! state. Tokens are HS256 JWTs signed with the server secret.

use std::collections::HashMap;

use axum::{
    extract::{FromRequestParts, Query},
    http::request::Parts,
};
use axum_extra::{
    TypedHeader,
    headers::{Authorization, authorization::Bearer},
};
use chrono::Utc;
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::AppState;

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("missing auth token")]
    Missing,
    #[error("invalid auth token: {0}")]
    Invalid(#[from] jsonwebtoken::errors::Error),
}

/// Claims carried by a session token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthToken {
    /// User id.
    pub sub: String,
    /// Teams the user belonged to when the token was issued.
    #[serde(default)]
    pub tms: Vec<String>,
    /// Expiry, seconds since the epoch.
    pub exp: i64,
}

impl AuthToken {
    pub fn new(user_id: impl Into<String>, tms: Vec<String>, ttl: chrono::Duration) -> Self {
        Self {
            sub: user_id.into(),
            tms,
            exp: (Utc::now() + ttl).timestamp(),
        }
    }

    pub fn user_id(&self) -> &str {
        &self.sub
    }
}

pub fn get_user_id(auth_token: &AuthToken) -> &str {
    auth_token.user_id()
}

pub fn is_team_member(auth_token: &AuthToken, team_id: &str) -> bool {
    auth_token.tms.iter().any(|id| id == team_id)
}

/// Signing and verification keys derived from the server secret.
pub struct AuthKeys {
    encoding: EncodingKey,
    decoding: DecodingKey,
    validation: Validation,
}

impl AuthKeys {
    pub fn from_secret(secret: &SecretString) -> Self {
        let bytes = secret.expose_secret().as_bytes();
        Self {
            encoding: EncodingKey::from_secret(bytes),
            decoding: DecodingKey::from_secret(bytes),
            validation: Validation::new(Algorithm::HS256),
        }
    }

    pub fn sign(&self, auth_token: &AuthToken) -> Result<String, AuthError> {
        Ok(encode(
            &Header::new(Algorithm::HS256),
            auth_token,
            &self.encoding,
        )?)
    }

    pub fn verify(&self, token: &str) -> Result<AuthToken, AuthError> {
        Ok(decode::<AuthToken>(token, &self.decoding, &self.validation)?.claims)
    }
}

impl std::fmt::Debug for AuthKeys {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthKeys").finish_non_exhaustive()
    }
}

/// Reads the bearer token from the `Authorization` header, falling back to a
/// `token` query parameter for websocket upgrades where browsers cannot set
/// headers.
impl FromRequestParts<AppState> for AuthToken {
    type Rejection = crate::error::ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let header = TypedHeader::<Authorization<Bearer>>::from_request_parts(parts, state)
            .await
            .ok()
            .map(|TypedHeader(Authorization(bearer))| bearer.token().to_string());

        let raw = match header {
            Some(token) => token,
            None => Query::<HashMap<String, String>>::from_request_parts(parts, state)
                .await
                .ok()
                .and_then(|Query(mut params)| params.remove("token"))
                .ok_or(AuthError::Missing)?,
        };

        Ok(state.auth.verify(&raw)?)
    }
}

/// Socket id of the client issuing a mutation, from `x-mutator-id`. Echoed
/// into published events so that client can drop its own update.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MutatorId(pub Option<String>);

pub const MUTATOR_ID_HEADER: &str = "x-mutator-id";

impl<S: Send + Sync> FromRequestParts<S> for MutatorId {
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(MutatorId(
            parts
                .headers
                .get(MUTATOR_ID_HEADER)
                .and_then(|value| value.to_str().ok())
                .filter(|value| !value.is_empty())
                .map(str::to_string),
        ))
    }
}
