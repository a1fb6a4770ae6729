use std::collections::BTreeMap;

use chrono::{Duration, Utc};
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

use super::password::hash_fingerprint;
use crate::accounts::domain::UserId;

pub const PUBLISH_PURPOSE: &str = "publish";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TokenKind {
    /// Tokens minted before the discriminator existed are session tokens.
    #[default]
    Session,
    /// Short-lived publish token minted after a verified payment.
    Temp,
    VerifyEmail,
    ResetPassword,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    #[serde(rename = "type", default)]
    pub kind: TokenKind,
    #[serde(rename = "userId", default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,
    #[serde(rename = "paymentId", default, skip_serializing_if = "Option::is_none")]
    pub payment_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub purpose: Option<String>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub metadata: BTreeMap<String, String>,
    #[serde(rename = "pwd", default, skip_serializing_if = "Option::is_none")]
    pub fingerprint: Option<String>,
    pub iat: i64,
    pub exp: i64,
}

impl Claims {
    fn new(kind: TokenKind, ttl: Duration) -> Self {
        let now = Utc::now();
        Self {
            kind,
            user_id: None,
            payment_id: None,
            purpose: None,
            metadata: BTreeMap::new(),
            fingerprint: None,
            iat: now.timestamp(),
            exp: (now + ttl).timestamp(),
        }
    }

    pub fn user(&self) -> Option<UserId> {
        self.user_id.clone().map(UserId)
    }
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum TokenError {
    #[error("token expired")]
    Expired,
    #[error("token invalid")]
    Invalid,
    #[error("token has the wrong type")]
    WrongKind,
    #[error("token signing failed: {0}")]
    Signing(String),
}

/// Signs and verifies the HS256 bearer tokens used across the API.
pub struct TokenIssuer {
    encoding: EncodingKey,
    decoding: DecodingKey,
    validation: Validation,
    session_ttl: Duration,
}

impl TokenIssuer {
    pub const PUBLISH_TTL_HOURS: i64 = 1;
    pub const VERIFY_EMAIL_TTL_HOURS: i64 = 24;
    pub const RESET_PASSWORD_TTL_HOURS: i64 = 1;

    pub fn new(secret: &str, session_ttl_hours: i64) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;
        Self {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
            validation,
            session_ttl: Duration::hours(session_ttl_hours),
        }
    }

    fn sign(&self, claims: &Claims) -> Result<String, TokenError> {
        encode(&Header::new(Algorithm::HS256), claims, &self.encoding)
            .map_err(|err| TokenError::Signing(err.to_string()))
    }

    pub fn issue_session(&self, user: &UserId) -> Result<String, TokenError> {
        let mut claims = Claims::new(TokenKind::Session, self.session_ttl);
        claims.user_id = Some(user.0.clone());
        self.sign(&claims)
    }

    pub fn issue_publish(
        &self,
        payment_id: &str,
        metadata: BTreeMap<String, String>,
    ) -> Result<String, TokenError> {
        let mut claims = Claims::new(TokenKind::Temp, Duration::hours(Self::PUBLISH_TTL_HOURS));
        claims.payment_id = Some(payment_id.to_string());
        claims.purpose = Some(PUBLISH_PURPOSE.to_string());
        claims.metadata = metadata;
        self.sign(&claims)
    }

    pub fn issue_email_verification(&self, user: &UserId) -> Result<String, TokenError> {
        let mut claims = Claims::new(
            TokenKind::VerifyEmail,
            Duration::hours(Self::VERIFY_EMAIL_TTL_HOURS),
        );
        claims.user_id = Some(user.0.clone());
        self.sign(&claims)
    }

    pub fn issue_password_reset(
        &self,
        user: &UserId,
        password_hash: &str,
    ) -> Result<String, TokenError> {
        let mut claims = Claims::new(
            TokenKind::ResetPassword,
            Duration::hours(Self::RESET_PASSWORD_TTL_HOURS),
        );
        claims.user_id = Some(user.0.clone());
        claims.fingerprint = Some(hash_fingerprint(password_hash));
        self.sign(&claims)
    }

    pub fn verify(&self, token: &str) -> Result<Claims, TokenError> {
        decode::<Claims>(token, &self.decoding, &self.validation)
            .map(|data| data.claims)
            .map_err(|err| match err.kind() {
                ErrorKind::ExpiredSignature => TokenError::Expired,
                _ => TokenError::Invalid,
            })
    }

    pub fn verify_kind(&self, token: &str, kind: TokenKind) -> Result<Claims, TokenError> {
        let claims = self.verify(token)?;
        if claims.kind != kind {
            return Err(TokenError::WrongKind);
        }
        Ok(claims)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn issuer() -> TokenIssuer {
        TokenIssuer::new("test-secret", 24)
    }

    #[test]
    fn session_tokens_round_trip_the_user() {
        let issuer = issuer();
        let user = UserId::generate();
        let token = issuer.issue_session(&user).expect("sign");
        let claims = issuer.verify_kind(&token, TokenKind::Session).expect("verify");
        assert_eq!(claims.user(), Some(user));
        assert_eq!(claims.exp - claims.iat, 24 * 3600);
    }

    #[test]
    fn publish_tokens_carry_payment_metadata() {
        let issuer = issuer();
        let metadata = BTreeMap::from([
            ("type".to_string(), "suche-einen-job".to_string()),
            ("userId".to_string(), "64b7f0c2a1b2c3d4e5f60718".to_string()),
        ]);
        let token = issuer.issue_publish("pi_123", metadata.clone()).expect("sign");
        let claims = issuer.verify(&token).expect("verify");
        assert_eq!(claims.kind, TokenKind::Temp);
        assert_eq!(claims.payment_id.as_deref(), Some("pi_123"));
        assert_eq!(claims.purpose.as_deref(), Some(PUBLISH_PURPOSE));
        assert_eq!(claims.metadata, metadata);
        assert_eq!(
            issuer.verify_kind(&token, TokenKind::Session),
            Err(TokenError::WrongKind)
        );
    }

    #[test]
    fn foreign_signatures_and_expired_tokens_are_rejected() {
        let token = TokenIssuer::new("other-secret", 24)
            .issue_session(&UserId::generate())
            .expect("sign");
        assert_eq!(issuer().verify(&token), Err(TokenError::Invalid));

        let expired = TokenIssuer::new("test-secret", -1)
            .issue_session(&UserId::generate())
            .expect("sign");
        assert_eq!(issuer().verify(&expired), Err(TokenError::Expired));
        assert_eq!(issuer().verify("garbage"), Err(TokenError::Invalid));
    }

    #[test]
    fn claims_without_type_default_to_session() {
        let claims: Claims = serde_json::from_value(serde_json::json!({
            "userId": "abc",
            "iat": 1,
            "exp": 2
        }))
        .expect("parses");
        assert_eq!(claims.kind, TokenKind::Session);
    }
}
