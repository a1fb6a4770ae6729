use std::collections::BTreeMap;
use std::sync::Arc;

use axum::async_trait;
use axum::extract::FromRequestParts;
use axum::http::header::AUTHORIZATION;
use axum::http::request::Parts;

use super::tokens::{Claims, TokenKind, PUBLISH_PURPOSE};
use crate::accounts::domain::UserId;
use crate::context::AppContext;
use crate::error::ApiError;

/// Caller authenticated with a session token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthUser(pub UserId);

/// Session user when a valid token is present, anonymous otherwise.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OptionalUser(pub Option<UserId>);

/// Whoever is allowed to publish a listing: a signed-in user or the holder of
/// a publish token minted after a successful payment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Publisher {
    User(UserId),
    Payment {
        payment_id: String,
        metadata: BTreeMap<String, String>,
    },
}

impl Publisher {
    fn from_claims(claims: Claims) -> Option<Self> {
        match claims.kind {
            TokenKind::Session => claims.user().map(Publisher::User),
            TokenKind::Temp if claims.purpose.as_deref() == Some(PUBLISH_PURPOSE) => {
                Some(Publisher::Payment {
                    payment_id: claims.payment_id?,
                    metadata: claims.metadata,
                })
            }
            _ => None,
        }
    }
}

fn bearer_token(parts: &Parts) -> Option<&str> {
    parts
        .headers
        .get(AUTHORIZATION)?
        .to_str()
        .ok()?
        .strip_prefix("Bearer ")
        .map(str::trim)
        .filter(|token| !token.is_empty())
}

fn missing_token() -> ApiError {
    ApiError::Unauthorized("authentication required".to_string())
}

fn invalid_token() -> ApiError {
    ApiError::Unauthorized("invalid or expired token".to_string())
}

#[async_trait]
impl FromRequestParts<Arc<AppContext>> for AuthUser {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        ctx: &Arc<AppContext>,
    ) -> Result<Self, Self::Rejection> {
        let token = bearer_token(parts).ok_or_else(missing_token)?;
        ctx.tokens
            .verify_kind(token, TokenKind::Session)
            .ok()
            .and_then(|claims| claims.user())
            .map(AuthUser)
            .ok_or_else(invalid_token)
    }
}

#[async_trait]
impl FromRequestParts<Arc<AppContext>> for OptionalUser {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        ctx: &Arc<AppContext>,
    ) -> Result<Self, Self::Rejection> {
        let user = bearer_token(parts)
            .and_then(|token| ctx.tokens.verify_kind(token, TokenKind::Session).ok())
            .and_then(|claims| claims.user());
        Ok(OptionalUser(user))
    }
}

#[async_trait]
impl FromRequestParts<Arc<AppContext>> for Publisher {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        ctx: &Arc<AppContext>,
    ) -> Result<Self, Self::Rejection> {
        let token = bearer_token(parts).ok_or_else(missing_token)?;
        ctx.tokens
            .verify(token)
            .ok()
            .and_then(Publisher::from_claims)
            .ok_or_else(invalid_token)
    }
}
